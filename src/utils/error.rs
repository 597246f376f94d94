use thiserror::Error;

#[derive(Error, Debug)]
pub enum ProviderError {
    #[error("API request failed: {0}")]
    ApiError(#[from] reqwest::Error),

    #[error("{method} {url} returned {status}: {body}")]
    ApiStatusError {
        method: String,
        url: String,
        status: u16,
        body: String,
    },

    #[error("{resource} not found")]
    NotFound { resource: String },

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("Invalid date: {0}")]
    DateError(#[from] chrono::ParseError),

    #[error("Configuration error: {message}")]
    ConfigError { message: String },

    #[error("Missing configuration: {field}")]
    MissingConfigError { field: String },

    #[error("Invalid value '{value}' for {field}: {reason}")]
    InvalidConfigValueError {
        field: String,
        value: String,
        reason: String,
    },

    #[error("Configuration validation failed for {field}: {message}")]
    ConfigValidationError { field: String, message: String },

    #[error("Validation error: {message}")]
    ValidationError { message: String },

    #[error("all the strategy parameters values need to be informed")]
    StrategyParametersRequired,

    #[error("the parameter of type percentage could not be converted, please make sure its a number in string format without %")]
    PercentageConversion,

    #[error("the parameter of type number could not be converted, please make sure its a number in string format")]
    NumberConversion,

    #[error("the parameter of type boolean could not be converted, please make sure its true or false in string format")]
    BooleanConversion,

    #[error("more than one api token matches the given filters, please refine them")]
    MoreThanOneApiToken,

    #[error("unknown {kind} type: {name}")]
    UnknownTypeError { kind: String, name: String },

    #[error("provider is not configured")]
    NotConfigured,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    Network,
    Api,
    Configuration,
    Validation,
    Data,
    System,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ErrorSeverity {
    Low,
    Medium,
    High,
    Critical,
}

impl ProviderError {
    pub fn not_found(resource: impl Into<String>) -> Self {
        ProviderError::NotFound {
            resource: resource.into(),
        }
    }

    pub fn validation(message: impl Into<String>) -> Self {
        ProviderError::ValidationError {
            message: message.into(),
        }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, ProviderError::NotFound { .. })
    }

    pub fn category(&self) -> ErrorCategory {
        match self {
            ProviderError::ApiError(_) => ErrorCategory::Network,
            ProviderError::ApiStatusError { .. } | ProviderError::NotFound { .. } => {
                ErrorCategory::Api
            }
            ProviderError::ConfigError { .. }
            | ProviderError::MissingConfigError { .. }
            | ProviderError::InvalidConfigValueError { .. }
            | ProviderError::ConfigValidationError { .. }
            | ProviderError::NotConfigured => ErrorCategory::Configuration,
            ProviderError::ValidationError { .. }
            | ProviderError::StrategyParametersRequired
            | ProviderError::PercentageConversion
            | ProviderError::NumberConversion
            | ProviderError::BooleanConversion
            | ProviderError::MoreThanOneApiToken
            | ProviderError::UnknownTypeError { .. } => ErrorCategory::Validation,
            ProviderError::SerializationError(_) | ProviderError::DateError(_) => {
                ErrorCategory::Data
            }
            ProviderError::IoError(_) => ErrorCategory::System,
        }
    }

    pub fn severity(&self) -> ErrorSeverity {
        match self {
            ProviderError::NotFound { .. } => ErrorSeverity::Low,
            ProviderError::ApiError(_) => ErrorSeverity::Medium,
            ProviderError::ApiStatusError { status, .. } if *status >= 500 => {
                ErrorSeverity::Medium
            }
            ProviderError::IoError(_) => ErrorSeverity::Critical,
            _ => ErrorSeverity::High,
        }
    }

    pub fn recovery_suggestion(&self) -> String {
        match self {
            ProviderError::ApiError(_) => {
                "Check that the Unleash server is reachable from this machine".to_string()
            }
            ProviderError::ApiStatusError { status: 401, .. }
            | ProviderError::ApiStatusError { status: 403, .. } => {
                "Check that auth_token is a valid admin token".to_string()
            }
            ProviderError::ApiStatusError { status, .. } if *status >= 500 => {
                "The Unleash server failed; retry the operation later".to_string()
            }
            ProviderError::ApiStatusError { .. } => {
                "Check the request attributes against the Unleash API documentation".to_string()
            }
            ProviderError::NotFound { .. } => {
                "Make sure the referenced object exists in Unleash".to_string()
            }
            ProviderError::MissingConfigError { field } => {
                format!("Set '{}' in the provider block or its environment variable", field)
            }
            ProviderError::InvalidConfigValueError { field, .. }
            | ProviderError::ConfigValidationError { field, .. } => {
                format!("Fix the value of '{}'", field)
            }
            ProviderError::ConfigError { .. } | ProviderError::NotConfigured => {
                "Configure the provider with api_url and auth_token".to_string()
            }
            ProviderError::StrategyParametersRequired => {
                "Provide every required parameter of the strategy definition".to_string()
            }
            ProviderError::PercentageConversion
            | ProviderError::NumberConversion
            | ProviderError::BooleanConversion => {
                "Strategy parameters are strings; use the literal form of the declared type"
                    .to_string()
            }
            ProviderError::MoreThanOneApiToken => {
                "Add project filters or use the unleash_api_tokens data source".to_string()
            }
            ProviderError::UnknownTypeError { .. } => {
                "Check the resource or data source name for typos".to_string()
            }
            ProviderError::DateError(_) => {
                "Use an RFC 3339 timestamp such as 2030-01-01T00:00:00Z".to_string()
            }
            ProviderError::ValidationError { .. } => "Fix the attributes listed above".to_string(),
            ProviderError::SerializationError(_) => {
                "The server answered with an unexpected payload".to_string()
            }
            ProviderError::IoError(_) => "Check file permissions and paths".to_string(),
        }
    }

    pub fn user_friendly_message(&self) -> String {
        match self.category() {
            ErrorCategory::Network => format!("Could not reach Unleash: {}", self),
            ErrorCategory::Api => format!("Unleash rejected the request: {}", self),
            ErrorCategory::Configuration => format!("Provider configuration problem: {}", self),
            ErrorCategory::Validation => format!("Invalid attributes: {}", self),
            ErrorCategory::Data => format!("Unexpected data: {}", self),
            ErrorCategory::System => format!("System error: {}", self),
        }
    }
}

pub type Result<T> = std::result::Result<T, ProviderError>;
