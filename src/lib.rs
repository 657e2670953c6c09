pub mod adapters;
pub mod config;
pub mod core;
pub mod domain;
pub mod utils;

pub use adapters::{ConsoleSessionFactory, StsRoleAssumer};
pub use config::{cli::CliArgs, AppConfig};
pub use core::settings::load_settings;
pub use core::updater::{SelectionStrategy, TaxRegistrationUpdater, UpdateOptions, UpdateOutcome};
pub use utils::error::{Result, TaxRegError};
