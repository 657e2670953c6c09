//! Billing access through the AWS console.
//!
//! Temporary credentials are exchanged for a console sign-in token at the
//! federation endpoint, the login request sets the session cookies, and the
//! billing home page carries the CSRF token every REST call must echo back.

use crate::config::AppConfig;
use crate::domain::model::{TaxRegistration, TemporaryCredentials};
use crate::domain::ports::{BillingApi, BillingSessionFactory};
use crate::utils::error::{Result, TaxRegError};
use async_trait::async_trait;
use regex::Regex;
use reqwest::{Client, Response};
use serde::Deserialize;
use std::sync::LazyLock;
use std::time::Duration;

pub const ISSUER: &str = "taxreg";
pub const XSRF_HEADER: &str = "x-awsbc-xsrf-token";
pub const TAX_REGISTRATION_PATH: &str = "rest/v1.0/taxexemption/taxregistration";

static CSRF_TOKEN_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"<meta\s+name="awsbc-csrf-token"\s+content="([^"]+)""#)
        .expect("CSRF token pattern is valid")
});

#[derive(Deserialize)]
struct SigninTokenResponse {
    #[serde(rename = "SigninToken")]
    signin_token: String,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum ListResponse {
    Bare(Vec<TaxRegistration>),
    Wrapped {
        #[serde(rename = "taxRegistrations")]
        tax_registrations: Vec<TaxRegistration>,
    },
}

impl From<ListResponse> for Vec<TaxRegistration> {
    fn from(response: ListResponse) -> Self {
        match response {
            ListResponse::Bare(registrations) => registrations,
            ListResponse::Wrapped { tax_registrations } => tax_registrations,
        }
    }
}

#[derive(Debug, Clone)]
pub struct ConsoleSessionFactory {
    client_timeout: Duration,
    federation_endpoint: String,
    billing_endpoint: String,
}

impl ConsoleSessionFactory {
    pub fn new(federation_endpoint: &str, billing_endpoint: &str, timeout: Duration) -> Self {
        Self {
            client_timeout: timeout,
            federation_endpoint: federation_endpoint.to_string(),
            billing_endpoint: billing_endpoint.trim_end_matches('/').to_string(),
        }
    }

    pub fn from_config(config: &AppConfig) -> Self {
        Self::new(
            &config.federation_endpoint,
            &config.billing_endpoint,
            config.request_timeout(),
        )
    }

    async fn signin_token(
        &self,
        client: &Client,
        credentials: &TemporaryCredentials,
    ) -> Result<String> {
        let session = serde_json::json!({
            "sessionId": credentials.access_key_id,
            "sessionKey": credentials.secret_access_key,
            "sessionToken": credentials.session_token,
        })
        .to_string();

        let response = client
            .get(&self.federation_endpoint)
            .query(&[("Action", "getSigninToken"), ("Session", session.as_str())])
            .send()
            .await
            .map_err(federation_error)?;
        let response = session_step(response, "getSigninToken").await?;
        let text = response.text().await.map_err(federation_error)?;

        let body: SigninTokenResponse =
            serde_json::from_str(&text).map_err(|e| {
                TaxRegError::SessionError {
                    message: format!("unexpected getSigninToken response: {}", e),
                }
            })?;
        Ok(body.signin_token)
    }

    async fn login(&self, client: &Client, signin_token: &str) -> Result<()> {
        let destination = format!("{}/home", self.billing_endpoint);
        let response = client
            .get(&self.federation_endpoint)
            .query(&[
                ("Action", "login"),
                ("Issuer", ISSUER),
                ("Destination", destination.as_str()),
                ("SigninToken", signin_token),
            ])
            .send()
            .await
            .map_err(federation_error)?;
        session_step(response, "login").await?;
        Ok(())
    }

    async fn csrf_token(&self, client: &Client) -> Result<String> {
        let response = client
            .get(format!("{}/home", self.billing_endpoint))
            .send()
            .await?;
        let page = session_step(response, "billing home").await?.text().await?;

        extract_csrf_token(&page).ok_or_else(|| TaxRegError::SessionError {
            message: "billing home page did not contain a CSRF token".to_string(),
        })
    }
}

#[async_trait]
impl BillingSessionFactory for ConsoleSessionFactory {
    async fn open(&self, credentials: &TemporaryCredentials) -> Result<Box<dyn BillingApi>> {
        let client = Client::builder()
            .cookie_store(true)
            .timeout(self.client_timeout)
            .build()?;

        tracing::debug!("Requesting console sign-in token");
        let signin_token = self.signin_token(&client, credentials).await?;
        self.login(&client, &signin_token).await?;
        let csrf_token = self.csrf_token(&client).await?;
        tracing::info!("🔓 Billing console session established");

        Ok(Box::new(ConsoleBillingClient {
            client,
            billing_endpoint: self.billing_endpoint.clone(),
            csrf_token,
        }))
    }
}

pub fn extract_csrf_token(page: &str) -> Option<String> {
    CSRF_TOKEN_PATTERN
        .captures(page)
        .and_then(|captures| captures.get(1))
        .map(|token| token.as_str().to_string())
}

// Federation URLs carry the session credentials and the sign-in token in the
// query string, so they must not reach error messages.
fn federation_error(error: reqwest::Error) -> TaxRegError {
    TaxRegError::HttpError(error.without_url())
}

async fn session_step(response: Response, step: &str) -> Result<Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.text().await.unwrap_or_default();
    Err(TaxRegError::SessionError {
        message: format!("{} returned HTTP {}: {}", step, status.as_u16(), body),
    })
}

async fn billing_response(response: Response) -> Result<Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.text().await.unwrap_or_default();
    Err(TaxRegError::BillingError {
        status: status.as_u16(),
        body,
    })
}

pub struct ConsoleBillingClient {
    client: Client,
    billing_endpoint: String,
    csrf_token: String,
}

impl ConsoleBillingClient {
    fn tax_registration_url(&self) -> String {
        format!("{}/{}", self.billing_endpoint, TAX_REGISTRATION_PATH)
    }
}

#[async_trait]
impl BillingApi for ConsoleBillingClient {
    async fn list_tax_registrations(&self) -> Result<Vec<TaxRegistration>> {
        let response = self
            .client
            .get(self.tax_registration_url())
            .header(XSRF_HEADER, &self.csrf_token)
            .send()
            .await?;
        let body = billing_response(response).await?.text().await?;

        let registrations: ListResponse = serde_json::from_str(&body)?;
        Ok(registrations.into())
    }

    async fn set_tax_registration(&self, registration: &TaxRegistration) -> Result<()> {
        tracing::debug!(
            "Sending tax registration: {}",
            serde_json::to_string(registration)?
        );
        let response = self
            .client
            .put(self.tax_registration_url())
            .header(XSRF_HEADER, &self.csrf_token)
            .json(registration)
            .send()
            .await?;
        billing_response(response).await?;
        Ok(())
    }
}
