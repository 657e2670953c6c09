use crate::domain::model::TaxSettings;
use crate::utils::error::{Result, TaxRegError};
use std::path::Path;

/// Reads the tax settings JSON file. A missing key or a non-string value is an
/// error; nothing is coerced or trimmed.
pub fn load_settings<P: AsRef<Path>>(path: P) -> Result<TaxSettings> {
    let path = path.as_ref();
    tracing::debug!("Loading tax settings from {}", path.display());

    let content = std::fs::read_to_string(path)?;
    serde_json::from_str(&content).map_err(|source| TaxRegError::InvalidSettingsError {
        path: path.display().to_string(),
        source,
    })
}
