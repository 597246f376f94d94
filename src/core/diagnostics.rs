use crate::utils::error::ProviderError;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    Error,
    Warning,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Diagnostic {
    pub severity: Severity,
    pub summary: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub detail: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub attribute: Option<String>,
}

/// Errors and warnings returned to Terraform with a response.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Diagnostics(Vec<Diagnostic>);

impl Diagnostics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn error(&mut self, summary: impl Into<String>, attribute: Option<String>) {
        self.0.push(Diagnostic {
            severity: Severity::Error,
            summary: summary.into(),
            detail: String::new(),
            attribute,
        });
    }

    pub fn warning(&mut self, summary: impl Into<String>, detail: impl Into<String>) {
        self.0.push(Diagnostic {
            severity: Severity::Warning,
            summary: summary.into(),
            detail: detail.into(),
            attribute: None,
        });
    }

    pub fn from_error(err: &ProviderError) -> Self {
        let mut diags = Self::new();
        diags.0.push(Diagnostic {
            severity: Severity::Error,
            summary: err.to_string(),
            detail: err.recovery_suggestion(),
            attribute: None,
        });
        diags
    }

    pub fn has_errors(&self) -> bool {
        self.0.iter().any(|d| d.severity == Severity::Error)
    }

    pub fn extend(&mut self, other: Diagnostics) {
        self.0.extend(other.0);
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Diagnostic> {
        self.0.iter()
    }

    /// Collapses error diagnostics into a single validation error.
    pub fn into_result(self) -> crate::utils::error::Result<()> {
        if !self.has_errors() {
            return Ok(());
        }
        let message = self
            .0
            .iter()
            .filter(|d| d.severity == Severity::Error)
            .map(|d| match &d.attribute {
                Some(attr) => format!("{}: {}", attr, d.summary),
                None => d.summary.clone(),
            })
            .collect::<Vec<_>>()
            .join("; ");
        Err(ProviderError::validation(message))
    }
}
