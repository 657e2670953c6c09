use thiserror::Error;

#[derive(Error, Debug)]
pub enum TaxRegError {
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Invalid tax settings in {path}: {source}")]
    InvalidSettingsError {
        path: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("Configuration error: {message}")]
    ConfigError { message: String },

    #[error("Invalid value for {field} ({value}): {reason}")]
    InvalidConfigValueError {
        field: String,
        value: String,
        reason: String,
    },

    #[error("Failed to assume role {role_arn}: {message}")]
    AssumeRoleError { role_arn: String, message: String },

    #[error("Failed to open billing session: {message}")]
    SessionError { message: String },

    #[error("HTTP request failed: {0}")]
    HttpError(#[from] reqwest::Error),

    #[error("Billing API returned {status}: {body}")]
    BillingError { status: u16, body: String },

    #[error("Tax registration has no address object")]
    MissingAddressError,

    #[error("No tax registration matches registrationId {registration_id}")]
    NoMatchingRegistrationError { registration_id: String },

    #[error("Expected exactly one tax registration, found {count}")]
    AmbiguousRegistrationsError { count: usize },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    Input,
    Configuration,
    Remote,
    Data,
}

impl TaxRegError {
    pub fn category(&self) -> ErrorCategory {
        match self {
            Self::IoError(_) | Self::InvalidSettingsError { .. } => ErrorCategory::Input,
            Self::ConfigError { .. } | Self::InvalidConfigValueError { .. } => {
                ErrorCategory::Configuration
            }
            Self::AssumeRoleError { .. }
            | Self::SessionError { .. }
            | Self::HttpError(_)
            | Self::BillingError { .. } => ErrorCategory::Remote,
            Self::SerializationError(_)
            | Self::MissingAddressError
            | Self::NoMatchingRegistrationError { .. }
            | Self::AmbiguousRegistrationsError { .. } => ErrorCategory::Data,
        }
    }

    /// Process exit code for this failure: 1 for local problems, 2 once the
    /// provider has been contacted.
    pub fn exit_code(&self) -> i32 {
        match self.category() {
            ErrorCategory::Input | ErrorCategory::Configuration => 1,
            ErrorCategory::Remote | ErrorCategory::Data => 2,
        }
    }

    /// Network failures and 5xx responses. Everything else fails the same way
    /// on a second attempt.
    pub fn is_transient(&self) -> bool {
        match self {
            Self::HttpError(e) => {
                e.is_timeout()
                    || e.is_connect()
                    || e.status().is_some_and(|s| s.is_server_error())
            }
            Self::BillingError { status, .. } => *status >= 500,
            _ => false,
        }
    }

    pub fn user_friendly_message(&self) -> String {
        match self {
            Self::IoError(e) => format!("Could not read input file: {}", e),
            Self::InvalidSettingsError { path, source } => format!(
                "Tax settings file '{}' is invalid: {}. Every field must be present and a string.",
                path, source
            ),
            Self::AssumeRoleError { role_arn, .. } => format!(
                "Could not assume role '{}'. Check the ARN and the trust policy.",
                role_arn
            ),
            Self::SessionError { .. } => {
                "Could not sign in to the billing console with the assumed role.".to_string()
            }
            Self::BillingError { status, .. } => {
                format!("The billing API rejected the request (HTTP {}).", status)
            }
            other => other.to_string(),
        }
    }
}

pub type Result<T> = std::result::Result<T, TaxRegError>;
