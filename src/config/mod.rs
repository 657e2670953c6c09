pub mod cli;
pub mod toml_config;

use crate::config::cli::CliArgs;
use crate::config::toml_config::FileConfig;
use crate::core::updater::SelectionStrategy;
use crate::utils::error::Result;
use crate::utils::retry::RetryPolicy;
use crate::utils::validation::{
    validate_aws_region, validate_non_empty_string, validate_range, validate_url, Validate,
};
use std::time::Duration;

pub const DEFAULT_REGION: &str = "us-east-1";
pub const DEFAULT_SESSION_NAME: &str = "AssumeRoleSession";
pub const DEFAULT_SESSION_DURATION_SECONDS: i32 = 3600;
pub const DEFAULT_FEDERATION_ENDPOINT: &str = "https://signin.aws.amazon.com/federation";
pub const DEFAULT_BILLING_ENDPOINT: &str = "https://console.aws.amazon.com/billing";
pub const DEFAULT_REQUEST_TIMEOUT_SECONDS: u64 = 60;
pub const DEFAULT_RETRY_DELAY_SECONDS: u64 = 2;

/// Effective settings for one run: defaults, then the TOML file, then
/// command-line options.
#[derive(Debug, Clone, PartialEq)]
pub struct AppConfig {
    pub region: String,
    pub session_name: String,
    pub session_duration_seconds: i32,
    pub federation_endpoint: String,
    pub billing_endpoint: String,
    pub request_timeout_seconds: u64,
    pub selection: SelectionStrategy,
    pub max_retries: u32,
    pub retry_delay_seconds: u64,
    pub dry_run: bool,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            region: DEFAULT_REGION.to_string(),
            session_name: DEFAULT_SESSION_NAME.to_string(),
            session_duration_seconds: DEFAULT_SESSION_DURATION_SECONDS,
            federation_endpoint: DEFAULT_FEDERATION_ENDPOINT.to_string(),
            billing_endpoint: DEFAULT_BILLING_ENDPOINT.to_string(),
            request_timeout_seconds: DEFAULT_REQUEST_TIMEOUT_SECONDS,
            selection: SelectionStrategy::default(),
            max_retries: 0,
            retry_delay_seconds: DEFAULT_RETRY_DELAY_SECONDS,
            dry_run: false,
        }
    }
}

impl AppConfig {
    /// Loads the config file named on the command line, if any, and merges it.
    pub fn load(args: &CliArgs) -> Result<Self> {
        let file = match &args.config {
            Some(path) => {
                tracing::debug!("Loading configuration from {}", path.display());
                FileConfig::from_file(path)?
            }
            None => FileConfig::default(),
        };
        Ok(Self::merge(file, args))
    }

    pub fn merge(file: FileConfig, args: &CliArgs) -> Self {
        let defaults = Self::default();
        Self {
            region: args
                .region
                .clone()
                .or(file.aws.region)
                .unwrap_or(defaults.region),
            session_name: file.aws.session_name.unwrap_or(defaults.session_name),
            session_duration_seconds: file
                .aws
                .session_duration_seconds
                .unwrap_or(defaults.session_duration_seconds),
            federation_endpoint: file
                .billing
                .federation_endpoint
                .unwrap_or(defaults.federation_endpoint),
            billing_endpoint: file
                .billing
                .billing_endpoint
                .unwrap_or(defaults.billing_endpoint),
            request_timeout_seconds: file
                .billing
                .request_timeout_seconds
                .unwrap_or(defaults.request_timeout_seconds),
            selection: args
                .select
                .or(file.update.selection)
                .unwrap_or(defaults.selection),
            max_retries: args
                .max_retries
                .or(file.update.max_retries)
                .unwrap_or(defaults.max_retries),
            retry_delay_seconds: file
                .update
                .retry_delay_seconds
                .unwrap_or(defaults.retry_delay_seconds),
            dry_run: args.dry_run,
        }
    }

    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy {
            max_retries: self.max_retries,
            delay: Duration::from_secs(self.retry_delay_seconds),
        }
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_seconds)
    }
}

impl Validate for AppConfig {
    fn validate(&self) -> Result<()> {
        validate_aws_region("region", &self.region)?;
        validate_non_empty_string("session_name", &self.session_name)?;
        validate_range(
            "session_duration_seconds",
            self.session_duration_seconds,
            900,
            43200,
        )?;
        validate_url("federation_endpoint", &self.federation_endpoint)?;
        validate_url("billing_endpoint", &self.billing_endpoint)?;
        validate_range(
            "request_timeout_seconds",
            self.request_timeout_seconds,
            1,
            3600,
        )?;
        validate_range("max_retries", self.max_retries, 0, 10)?;

        tracing::debug!("✅ Configuration validation passed");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    fn args(extra: &[&str]) -> CliArgs {
        let base = ["taxreg", "arn:aws:iam::1:role/r", "settings.json"];
        CliArgs::try_parse_from(base.iter().chain(extra.iter())).unwrap()
    }

    #[test]
    fn test_defaults_match_single_attempt_first_record() {
        let config = AppConfig::merge(FileConfig::default(), &args(&[]));
        assert_eq!(config, AppConfig::default());
        assert_eq!(config.selection, SelectionStrategy::First);
        assert_eq!(
            config.retry_policy(),
            RetryPolicy {
                max_retries: 0,
                delay: Duration::from_secs(2),
            }
        );
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_cli_overrides_file() {
        let file = FileConfig::from_toml_str(
            r#"
[aws]
region = "eu-west-1"

[update]
selection = "single"
max_retries = 1
"#,
        )
        .unwrap();

        let config = AppConfig::merge(
            file,
            &args(&["--region", "ap-southeast-2", "--max-retries", "4"]),
        );

        assert_eq!(config.region, "ap-southeast-2");
        assert_eq!(config.max_retries, 4);
        assert_eq!(config.selection, SelectionStrategy::RequireSingle);
    }

    #[test]
    fn test_validation_rejects_bad_values() {
        let mut config = AppConfig::default();
        config.billing_endpoint = "console".to_string();
        assert!(config.validate().is_err());

        let mut config = AppConfig::default();
        config.session_duration_seconds = 60;
        assert!(config.validate().is_err());

        let mut config = AppConfig::default();
        config.max_retries = 50;
        assert!(config.validate().is_err());
    }
}
