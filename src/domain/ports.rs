use crate::domain::model::{TaxRegistration, TemporaryCredentials};
use crate::utils::error::Result;
use async_trait::async_trait;

/// Exchanges the caller's identity for credentials of another role.
#[async_trait]
pub trait RoleAssumer: Send + Sync {
    async fn assume_role(&self, role_arn: &str, session_name: &str)
        -> Result<TemporaryCredentials>;
}

/// The two billing operations the updater needs.
#[async_trait]
pub trait BillingApi: Send + Sync {
    async fn list_tax_registrations(&self) -> Result<Vec<TaxRegistration>>;
    async fn set_tax_registration(&self, registration: &TaxRegistration) -> Result<()>;
}

/// Opens an authenticated billing session from temporary credentials.
#[async_trait]
pub trait BillingSessionFactory: Send + Sync {
    async fn open(&self, credentials: &TemporaryCredentials) -> Result<Box<dyn BillingApi>>;
}
