use crate::core::updater::SelectionStrategy;
use crate::utils::error::{Result, TaxRegError};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Optional TOML configuration file. Every key may be omitted.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct FileConfig {
    pub aws: AwsSection,
    pub billing: BillingSection,
    pub update: UpdateSection,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct AwsSection {
    pub region: Option<String>,
    pub session_name: Option<String>,
    pub session_duration_seconds: Option<i32>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct BillingSection {
    pub federation_endpoint: Option<String>,
    pub billing_endpoint: Option<String>,
    pub request_timeout_seconds: Option<u64>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct UpdateSection {
    pub selection: Option<SelectionStrategy>,
    pub max_retries: Option<u32>,
    pub retry_delay_seconds: Option<u64>,
}

impl FileConfig {
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| TaxRegError::ConfigError {
            message: format!("Failed to read config file {}: {}", path.display(), e),
        })?;

        Self::from_toml_str(&content).map_err(|e| TaxRegError::ConfigError {
            message: format!("Failed to parse config file {}: {}", path.display(), e),
        })
    }

    pub fn from_toml_str(content: &str) -> std::result::Result<Self, toml::de::Error> {
        toml::from_str(content)
    }
}
