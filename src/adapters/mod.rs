// Adapters layer: the AWS-facing implementations of the domain ports.

pub mod console;
pub mod sts;

pub use console::{ConsoleBillingClient, ConsoleSessionFactory};
pub use sts::StsRoleAssumer;
