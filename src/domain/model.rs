use crate::utils::error::{Result, TaxRegError};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Legal and tax settings read from the user's JSON file. Every key is
/// required and must be a string.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaxSettings {
    pub registration_id: String,
    pub legal_name: String,
    pub address_line1: String,
    pub address_line2: String,
    pub city: String,
    pub country_code: String,
    pub postal_code: String,
    pub state: String,
}

impl TaxSettings {
    fn address_fields(&self) -> [(&'static str, &str); 6] {
        [
            ("addressLine1", self.address_line1.as_str()),
            ("addressLine2", self.address_line2.as_str()),
            ("city", self.city.as_str()),
            ("countryCode", self.country_code.as_str()),
            ("postalCode", self.postal_code.as_str()),
            ("state", self.state.as_str()),
        ]
    }
}

/// A tax registration as returned by the billing provider. The record is kept
/// as raw JSON so fields this tool does not touch are sent back unchanged.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TaxRegistration(Map<String, Value>);

impl TaxRegistration {
    pub fn new(fields: Map<String, Value>) -> Self {
        Self(fields)
    }

    pub fn registration_id(&self) -> Option<&str> {
        self.0.get("registrationId").and_then(Value::as_str)
    }

    pub fn legal_name(&self) -> Option<&str> {
        self.0.get("legalName").and_then(Value::as_str)
    }

    pub fn address(&self) -> Option<&Map<String, Value>> {
        self.0.get("address").and_then(Value::as_object)
    }

    pub fn fields(&self) -> &Map<String, Value> {
        &self.0
    }

    /// Overwrites the registration id, legal name and the six address fields
    /// with the values from `settings`.
    pub fn apply_settings(&mut self, settings: &TaxSettings) -> Result<()> {
        let address = self
            .0
            .get_mut("address")
            .and_then(Value::as_object_mut)
            .ok_or(TaxRegError::MissingAddressError)?;

        for (key, value) in settings.address_fields() {
            address.insert(key.to_string(), Value::String(value.to_string()));
        }

        self.0.insert(
            "registrationId".to_string(),
            Value::String(settings.registration_id.clone()),
        );
        self.0.insert(
            "legalName".to_string(),
            Value::String(settings.legal_name.clone()),
        );
        Ok(())
    }
}

impl TryFrom<Value> for TaxRegistration {
    type Error = TaxRegError;

    fn try_from(value: Value) -> Result<Self> {
        let fields: Map<String, Value> = serde_json::from_value(value)?;
        Ok(Self(fields))
    }
}

/// Short-lived credentials obtained by assuming a role.
#[derive(Clone)]
pub struct TemporaryCredentials {
    pub access_key_id: String,
    pub secret_access_key: String,
    pub session_token: String,
    pub expiration: Option<DateTime<Utc>>,
}

impl std::fmt::Debug for TemporaryCredentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TemporaryCredentials")
            .field("access_key_id", &self.access_key_id)
            .field("secret_access_key", &"** redacted **")
            .field("session_token", &"** redacted **")
            .field("expiration", &self.expiration)
            .finish()
    }
}
