use crate::core::diagnostics::Diagnostics;
use crate::core::provider::{Provider, State};
use crate::utils::error::{ProviderError, Result};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt};

/// One provider call, tagged by its `operation` field.
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "operation", rename_all = "snake_case")]
pub enum Request {
    GetSchema,
    Configure {
        #[serde(default)]
        config: Value,
    },
    ValidateResourceConfig {
        type_name: String,
        #[serde(default)]
        config: Value,
    },
    ValidateDataSourceConfig {
        type_name: String,
        #[serde(default)]
        config: Value,
    },
    PlanResourceChange {
        type_name: String,
        #[serde(default)]
        prior_state: Option<State>,
        #[serde(default)]
        proposed_new_state: Option<State>,
    },
    ApplyResourceChange {
        type_name: String,
        #[serde(default)]
        prior_state: Option<State>,
        #[serde(default)]
        planned_state: Option<State>,
    },
    ReadResource {
        type_name: String,
        current_state: State,
    },
    ReadDataSource {
        type_name: String,
        #[serde(default)]
        config: State,
    },
}

impl Request {
    pub fn operation(&self) -> &'static str {
        match self {
            Request::GetSchema => "get_schema",
            Request::Configure { .. } => "configure",
            Request::ValidateResourceConfig { .. } => "validate_resource_config",
            Request::ValidateDataSourceConfig { .. } => "validate_data_source_config",
            Request::PlanResourceChange { .. } => "plan_resource_change",
            Request::ApplyResourceChange { .. } => "apply_resource_change",
            Request::ReadResource { .. } => "read_resource",
            Request::ReadDataSource { .. } => "read_data_source",
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Response {
    pub result: Value,
    pub diagnostics: Diagnostics,
}

impl Response {
    fn ok(result: impl Serialize) -> Self {
        match serde_json::to_value(result) {
            Ok(result) => Self {
                result,
                diagnostics: Diagnostics::new(),
            },
            Err(e) => Self::with_diagnostics(Diagnostics::from_error(&ProviderError::from(e))),
        }
    }

    fn with_diagnostics(diagnostics: Diagnostics) -> Self {
        Self {
            result: Value::Null,
            diagnostics,
        }
    }

    fn from_result<T: Serialize>(result: Result<T>) -> Self {
        match result {
            Ok(value) => Self::ok(value),
            Err(e) => {
                tracing::error!("{}", e.user_friendly_message());
                Self::with_diagnostics(Diagnostics::from_error(&e))
            }
        }
    }

    pub fn has_errors(&self) -> bool {
        self.diagnostics.has_errors()
    }
}

/// Drives a [`Provider`] from JSON requests.
pub struct ProviderEngine {
    provider: Provider,
}

impl ProviderEngine {
    pub fn new(provider: Provider) -> Self {
        Self { provider }
    }

    pub fn provider(&self) -> &Provider {
        &self.provider
    }

    pub async fn handle(&mut self, request: Request) -> Response {
        tracing::debug!("Handling {}", request.operation());
        let provider = &mut self.provider;

        match request {
            Request::GetSchema => Response::ok(provider.schema()),
            Request::Configure { config } => Response::with_diagnostics(provider.configure(config)),
            Request::ValidateResourceConfig { type_name, config } => {
                Response::with_diagnostics(provider.validate_resource_config(&type_name, config))
            }
            Request::ValidateDataSourceConfig { type_name, config } => {
                Response::with_diagnostics(provider.validate_data_source_config(&type_name, config))
            }
            Request::PlanResourceChange {
                type_name,
                prior_state,
                proposed_new_state,
            } => Response::from_result(provider.plan_resource_change(
                &type_name,
                prior_state,
                proposed_new_state,
            )),
            Request::ApplyResourceChange {
                type_name,
                prior_state,
                planned_state,
            } => Response::from_result(
                provider
                    .apply_resource_change(&type_name, prior_state, planned_state)
                    .await,
            ),
            Request::ReadResource {
                type_name,
                current_state,
            } => Response::from_result(provider.read_resource(&type_name, current_state).await),
            Request::ReadDataSource { type_name, config } => {
                Response::from_result(provider.read_data_source(&type_name, config).await)
            }
        }
    }

    /// Parses and handles one JSON request line.
    pub async fn handle_line(&mut self, line: &str) -> Response {
        match serde_json::from_str::<Request>(line) {
            Ok(request) => self.handle(request).await,
            Err(e) => {
                tracing::warn!("Malformed request: {}", e);
                let mut diags = Diagnostics::new();
                diags.error(format!("Malformed request: {}", e), None);
                Response::with_diagnostics(diags)
            }
        }
    }

    /// Answers newline-delimited JSON requests until EOF, one response line
    /// each. Returns the number of requests handled.
    pub async fn serve<R, W>(&mut self, reader: R, mut writer: W) -> Result<usize>
    where
        R: AsyncBufRead + Unpin,
        W: AsyncWrite + Unpin,
    {
        let mut lines = reader.lines();
        let mut handled = 0;

        while let Some(line) = lines.next_line().await? {
            if line.trim().is_empty() {
                continue;
            }
            let response = self.handle_line(&line).await;
            let mut out = serde_json::to_vec(&response)?;
            out.push(b'\n');
            writer.write_all(&out).await?;
            writer.flush().await?;
            handled += 1;
        }

        tracing::info!("Input closed after {} requests", handled);
        Ok(handled)
    }
}
