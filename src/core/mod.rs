pub mod settings;
pub mod updater;

pub use crate::domain::model::{TaxRegistration, TaxSettings, TemporaryCredentials};
pub use crate::domain::ports::{BillingApi, BillingSessionFactory, RoleAssumer};
pub use crate::utils::error::Result;
