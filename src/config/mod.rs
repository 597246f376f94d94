pub mod toml_config;

use crate::utils::error::{ProviderError, Result};
use crate::utils::validation::{validate_non_empty_string, validate_url, Validate};
use serde_json::{Map, Value};
use std::fmt;
use std::time::Duration;

pub const DEFAULT_TIMEOUT_SECONDS: u64 = 30;

/// Connection settings for the Unleash admin API.
#[derive(Clone)]
pub struct ProviderConfig {
    pub api_url: String,
    pub auth_token: String,
    pub timeout: Duration,
}

impl fmt::Debug for ProviderConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProviderConfig")
            .field("api_url", &self.api_url)
            .field("auth_token", &"(sensitive)")
            .field("timeout", &self.timeout)
            .finish()
    }
}

impl ProviderConfig {
    pub fn new(api_url: impl Into<String>, auth_token: impl Into<String>) -> Self {
        Self {
            api_url: api_url.into(),
            auth_token: auth_token.into(),
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECONDS),
        }
    }

    /// Reads the provider block after schema defaults were applied.
    pub fn from_attributes(attrs: &Map<String, Value>, timeout: Duration) -> Result<Self> {
        let read = |field: &str| -> Result<String> {
            attrs
                .get(field)
                .and_then(Value::as_str)
                .map(str::to_string)
                .ok_or_else(|| ProviderError::MissingConfigError {
                    field: field.to_string(),
                })
        };

        let config = Self {
            api_url: read("api_url")?,
            auth_token: read("auth_token")?,
            timeout,
        };
        config.validate()?;
        Ok(config)
    }
}

impl Validate for ProviderConfig {
    fn validate(&self) -> Result<()> {
        validate_url("api_url", &self.api_url)?;
        validate_non_empty_string("auth_token", &self.auth_token)?;
        Ok(())
    }
}

#[cfg(feature = "cli")]
pub use cli::CliConfig;

#[cfg(feature = "cli")]
mod cli {
    use super::toml_config::TomlConfig;
    use super::{ProviderConfig, DEFAULT_TIMEOUT_SECONDS};
    use crate::utils::error::{ProviderError, Result};
    use crate::utils::validation::Validate;
    use clap::Parser;
    use std::path::PathBuf;
    use std::time::Duration;

    #[derive(Debug, Clone, Parser)]
    #[command(name = "terraform-provider-unleash")]
    #[command(about = "Terraform provider for the Unleash feature flag service")]
    pub struct CliConfig {
        /// URL of the unleash API
        #[arg(long, env = "UNLEASH_API_URL")]
        pub api_url: Option<String>,

        /// Authentication token to authenticate to the Unleash API
        #[arg(long, env = "UNLEASH_AUTH_TOKEN", hide_env_values = true)]
        pub auth_token: Option<String>,

        /// Path to a TOML configuration file
        #[arg(short, long)]
        pub config: Option<PathBuf>,

        /// Handle a single JSON request from this file instead of serving stdin
        #[arg(long)]
        pub request: Option<PathBuf>,

        /// Print the provider schema and exit
        #[arg(long)]
        pub schema: bool,

        #[arg(long)]
        pub timeout_seconds: Option<u64>,

        #[arg(short, long, help = "Enable verbose output")]
        pub verbose: bool,

        #[arg(long, help = "Emit logs as JSON")]
        pub json_logs: bool,
    }

    impl CliConfig {
        pub fn load_file(&self) -> Result<TomlConfig> {
            match &self.config {
                Some(path) => {
                    let file = TomlConfig::from_file(path)?;
                    file.validate()?;
                    Ok(file)
                }
                None => Ok(TomlConfig::default()),
            }
        }

        pub fn timeout(&self, file: &TomlConfig) -> Duration {
            let seconds = self
                .timeout_seconds
                .or(file.timeout_seconds())
                .unwrap_or(DEFAULT_TIMEOUT_SECONDS);
            Duration::from_secs(seconds)
        }

        /// Flags and env vars win over the file. None when neither names a
        /// server, so the provider waits for a `configure` request.
        pub fn provider_config(&self, file: &TomlConfig) -> Result<Option<ProviderConfig>> {
            let api_url = self.api_url.as_deref().or(file.api_url());
            let auth_token = self.auth_token.as_deref().or(file.auth_token());

            match (api_url, auth_token) {
                (None, None) => Ok(None),
                (Some(_), None) => Err(ProviderError::MissingConfigError {
                    field: "auth_token".to_string(),
                }),
                (None, Some(_)) => Err(ProviderError::MissingConfigError {
                    field: "api_url".to_string(),
                }),
                (Some(api_url), Some(auth_token)) => {
                    let config = ProviderConfig {
                        api_url: api_url.to_string(),
                        auth_token: auth_token.to_string(),
                        timeout: self.timeout(file),
                    };
                    config.validate()?;
                    Ok(Some(config))
                }
            }
        }
    }

}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_from_attributes() {
        let attrs = json!({"api_url": "http://localhost:4242/api", "auth_token": "*:*.abc"});
        let config =
            ProviderConfig::from_attributes(attrs.as_object().unwrap(), Duration::from_secs(3))
                .unwrap();
        assert_eq!(config.api_url, "http://localhost:4242/api");
        assert!(!format!("{:?}", config).contains("*:*.abc"));

        let missing = json!({"api_url": "http://localhost:4242/api"});
        assert!(ProviderConfig::from_attributes(
            missing.as_object().unwrap(),
            Duration::from_secs(3)
        )
        .is_err());
    }
}
