use crate::utils::error::{ProviderError, Result};
use serde_json::Value;

/// Declared type of a strategy parameter in its strategy definition.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParameterType {
    String,
    Percentage,
    Number,
    Boolean,
    List,
}

impl ParameterType {
    pub fn from_definition(kind: &str) -> Self {
        match kind {
            "percentage" => ParameterType::Percentage,
            "number" => ParameterType::Number,
            "boolean" => ParameterType::Boolean,
            "list" => ParameterType::List,
            _ => ParameterType::String,
        }
    }
}

fn parse_bool(raw: &str) -> Option<bool> {
    match raw {
        "1" | "t" | "T" | "TRUE" | "true" | "True" => Some(true),
        "0" | "f" | "F" | "FALSE" | "false" | "False" => Some(false),
        _ => None,
    }
}

/// Converts the Terraform string form of a parameter into its typed value.
pub fn parse_parameter(kind: ParameterType, raw: &str) -> Result<Value> {
    match kind {
        ParameterType::String => Ok(Value::String(raw.to_string())),
        ParameterType::Percentage => raw
            .parse::<f64>()
            .ok()
            .and_then(serde_json::Number::from_f64)
            .map(Value::Number)
            .ok_or(ProviderError::PercentageConversion),
        ParameterType::Number => raw
            .parse::<i64>()
            .map(Value::from)
            .map_err(|_| ProviderError::NumberConversion),
        ParameterType::Boolean => parse_bool(raw)
            .map(Value::Bool)
            .ok_or(ProviderError::BooleanConversion),
        ParameterType::List => Ok(Value::Array(
            raw.trim()
                .split(',')
                .map(|item| Value::String(item.to_string()))
                .collect(),
        )),
    }
}

/// Turns a value read back from Unleash into the string Terraform stores.
pub fn format_parameter(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(s) => s.clone(),
        Value::Bool(b) => b.to_string(),
        Value::Number(n) => match (n.as_i64(), n.as_f64()) {
            (Some(i), _) => i.to_string(),
            (None, Some(f)) => f.to_string(),
            _ => n.to_string(),
        },
        Value::Array(items) => items
            .iter()
            .map(format_parameter)
            .collect::<Vec<_>>()
            .join(","),
        Value::Object(_) => value.to_string(),
    }
}
