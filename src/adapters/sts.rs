use crate::config::AppConfig;
use crate::domain::model::TemporaryCredentials;
use crate::domain::ports::RoleAssumer;
use crate::utils::error::{Result, TaxRegError};
use async_trait::async_trait;
use aws_config::BehaviorVersion;
use aws_sdk_sts::config::Region;
use aws_sdk_sts::error::DisplayErrorContext;
use aws_sdk_sts::Client as StsClient;
use chrono::{DateTime, Utc};

#[derive(Debug, Clone)]
pub struct StsRoleAssumer {
    client: StsClient,
    duration_seconds: i32,
}

impl StsRoleAssumer {
    pub fn new(client: StsClient, duration_seconds: i32) -> Self {
        Self {
            client,
            duration_seconds,
        }
    }

    /// Builds an STS client from the default credential chain. STS is
    /// region-agnostic, but the SDK still needs one to sign with.
    pub async fn from_config(config: &AppConfig) -> Self {
        let sdk_config = aws_config::defaults(BehaviorVersion::latest())
            .region(Region::new(config.region.clone()))
            .load()
            .await;
        Self::new(
            StsClient::new(&sdk_config),
            config.session_duration_seconds,
        )
    }
}

#[async_trait]
impl RoleAssumer for StsRoleAssumer {
    async fn assume_role(
        &self,
        role_arn: &str,
        session_name: &str,
    ) -> Result<TemporaryCredentials> {
        let output = self
            .client
            .assume_role()
            .role_arn(role_arn)
            .role_session_name(session_name)
            .duration_seconds(self.duration_seconds)
            .send()
            .await
            .map_err(|e| TaxRegError::AssumeRoleError {
                role_arn: role_arn.to_string(),
                message: DisplayErrorContext(&e).to_string(),
            })?;

        let credentials = output
            .credentials()
            .ok_or_else(|| TaxRegError::AssumeRoleError {
                role_arn: role_arn.to_string(),
                message: "response contained no credentials".to_string(),
            })?;

        let expiration = credentials.expiration();
        let expiration: Option<DateTime<Utc>> =
            DateTime::from_timestamp(expiration.secs(), expiration.subsec_nanos());
        if let Some(expiration) = expiration {
            tracing::debug!("Temporary credentials expire at {}", expiration);
        }

        Ok(TemporaryCredentials {
            access_key_id: credentials.access_key_id().to_string(),
            secret_access_key: credentials.secret_access_key().to_string(),
            session_token: credentials.session_token().to_string(),
            expiration,
        })
    }
}
