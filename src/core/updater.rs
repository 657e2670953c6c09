use crate::config::AppConfig;
use crate::domain::model::{TaxRegistration, TaxSettings};
use crate::domain::ports::{BillingSessionFactory, RoleAssumer};
use crate::utils::error::{Result, TaxRegError};
use crate::utils::retry::{with_retry, RetryPolicy};
use serde::{Deserialize, Serialize};

pub const NO_REGISTRATIONS_MESSAGE: &str = "No TaxRegistrations are present.";

/// How the registration to overwrite is chosen from the provider's listing.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum,
)]
pub enum SelectionStrategy {
    /// Whatever the provider lists first.
    #[default]
    #[serde(rename = "first")]
    #[value(name = "first")]
    First,
    /// The registration whose current id equals the settings' `registrationId`.
    #[serde(rename = "match-id")]
    #[value(name = "match-id")]
    MatchRegistrationId,
    /// The only registration; more than one is an error.
    #[serde(rename = "single")]
    #[value(name = "single")]
    RequireSingle,
}

impl SelectionStrategy {
    /// `registrations` must be non-empty.
    fn select(
        self,
        mut registrations: Vec<TaxRegistration>,
        settings: &TaxSettings,
    ) -> Result<TaxRegistration> {
        match self {
            Self::First => Ok(registrations.swap_remove(0)),
            Self::MatchRegistrationId => registrations
                .into_iter()
                .find(|r| r.registration_id() == Some(settings.registration_id.as_str()))
                .ok_or_else(|| TaxRegError::NoMatchingRegistrationError {
                    registration_id: settings.registration_id.clone(),
                }),
            Self::RequireSingle if registrations.len() == 1 => Ok(registrations.swap_remove(0)),
            Self::RequireSingle => Err(TaxRegError::AmbiguousRegistrationsError {
                count: registrations.len(),
            }),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum UpdateOutcome {
    /// The modified registration was written.
    Updated(TaxRegistration),
    /// The modified registration was built but not written.
    DryRun(TaxRegistration),
    NoRegistrations,
}

#[derive(Debug, Clone)]
pub struct UpdateOptions {
    pub session_name: String,
    pub selection: SelectionStrategy,
    pub retry: RetryPolicy,
    pub dry_run: bool,
}

impl From<&AppConfig> for UpdateOptions {
    fn from(config: &AppConfig) -> Self {
        Self {
            session_name: config.session_name.clone(),
            selection: config.selection,
            retry: config.retry_policy(),
            dry_run: config.dry_run,
        }
    }
}

pub struct TaxRegistrationUpdater<R: RoleAssumer, F: BillingSessionFactory> {
    role_assumer: R,
    session_factory: F,
    options: UpdateOptions,
}

impl<R: RoleAssumer, F: BillingSessionFactory> TaxRegistrationUpdater<R, F> {
    pub fn new(role_assumer: R, session_factory: F, options: UpdateOptions) -> Self {
        Self {
            role_assumer,
            session_factory,
            options,
        }
    }

    /// Assumes `role_arn`, then copies `settings` onto one existing tax
    /// registration and writes it back.
    pub async fn update(&self, role_arn: &str, settings: &TaxSettings) -> Result<UpdateOutcome> {
        tracing::info!("🔑 Assuming role {}", role_arn);
        let credentials = self
            .role_assumer
            .assume_role(role_arn, &self.options.session_name)
            .await?;
        tracing::debug!("Assumed role credentials: {:?}", credentials);

        let billing = self.session_factory.open(&credentials).await?;
        let billing = billing.as_ref();

        let registrations = with_retry(self.options.retry, "list tax registrations", move || {
            billing.list_tax_registrations()
        })
        .await?;
        tracing::info!("Found {} tax registration(s)", registrations.len());

        if registrations.is_empty() {
            println!("{}", NO_REGISTRATIONS_MESSAGE);
            return Ok(UpdateOutcome::NoRegistrations);
        }

        let mut registration = self.options.selection.select(registrations, settings)?;
        tracing::debug!(
            "Selected registration {:?}",
            registration.registration_id().unwrap_or("<none>")
        );
        registration.apply_settings(settings)?;

        if self.options.dry_run {
            tracing::info!("🧪 Dry run, not writing the tax registration");
            return Ok(UpdateOutcome::DryRun(registration));
        }

        let payload = &registration;
        with_retry(self.options.retry, "set tax registration", move || {
            billing.set_tax_registration(payload)
        })
        .await?;
        tracing::info!(
            "✅ Tax registration {} updated",
            settings.registration_id
        );

        Ok(UpdateOutcome::Updated(registration))
    }
}
