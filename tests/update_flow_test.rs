use anyhow::Result;
use async_trait::async_trait;
use httpmock::prelude::*;
use serde_json::json;
use std::time::Duration;
use taxreg::adapters::console::XSRF_HEADER;
use taxreg::domain::model::TemporaryCredentials;
use taxreg::domain::ports::RoleAssumer;
use taxreg::utils::retry::RetryPolicy;
use taxreg::{
    load_settings, ConsoleSessionFactory, SelectionStrategy, TaxRegError, TaxRegistrationUpdater,
    UpdateOptions, UpdateOutcome,
};
use tempfile::TempDir;

const REGISTRATION_PATH: &str = "/billing/rest/v1.0/taxexemption/taxregistration";

const SETTINGS_JSON: &str = r#"{"registrationId":"T123","legalName":"Acme Inc","addressLine1":"1 Main St","addressLine2":"","city":"Springfield","countryCode":"US","postalCode":"90210","state":"CA"}"#;

struct StaticRoleAssumer;

#[async_trait]
impl RoleAssumer for StaticRoleAssumer {
    async fn assume_role(
        &self,
        _role_arn: &str,
        _session_name: &str,
    ) -> taxreg::Result<TemporaryCredentials> {
        Ok(TemporaryCredentials {
            access_key_id: "ASIATEST".to_string(),
            secret_access_key: "secret".to_string(),
            session_token: "token".to_string(),
            expiration: None,
        })
    }
}

async fn mock_sign_in(server: &MockServer) {
    server
        .mock_async(|when, then| {
            when.method(GET)
                .path("/federation")
                .query_param("Action", "getSigninToken");
            then.status(200)
                .json_body(json!({ "SigninToken": "signin-abc" }));
        })
        .await;
    server
        .mock_async(|when, then| {
            when.method(GET)
                .path("/federation")
                .query_param("Action", "login");
            then.status(200).body("ok");
        })
        .await;
    server
        .mock_async(|when, then| {
            when.method(GET).path("/billing/home");
            then.status(200)
                .body(r#"<meta name="awsbc-csrf-token" content="csrf-123">"#);
        })
        .await;
}

fn updater(
    server: &MockServer,
    options: UpdateOptions,
) -> TaxRegistrationUpdater<StaticRoleAssumer, ConsoleSessionFactory> {
    let factory = ConsoleSessionFactory::new(
        &server.url("/federation"),
        &server.url("/billing"),
        Duration::from_secs(5),
    );
    TaxRegistrationUpdater::new(StaticRoleAssumer, factory, options)
}

fn options() -> UpdateOptions {
    UpdateOptions {
        session_name: "AssumeRoleSession".to_string(),
        selection: SelectionStrategy::First,
        retry: RetryPolicy::none(),
        dry_run: false,
    }
}

fn write_settings(dir: &TempDir, content: &str) -> Result<std::path::PathBuf> {
    let path = dir.path().join("taxsettings.json");
    std::fs::write(&path, content)?;
    Ok(path)
}

#[tokio::test]
async fn test_first_registration_is_updated_and_other_fields_kept() -> Result<()> {
    let temp_dir = TempDir::new()?;
    let settings = load_settings(write_settings(&temp_dir, SETTINGS_JSON)?)?;

    let server = MockServer::start_async().await;
    mock_sign_in(&server).await;

    server
        .mock_async(|when, then| {
            when.method(GET).path(REGISTRATION_PATH);
            then.status(200).json_body(json!([
                {
                    "registrationId": "OLD",
                    "legalName": "Old Co",
                    "address": {
                        "addressLine1": "x",
                        "addressLine2": "y",
                        "city": "z",
                        "countryCode": "zz",
                        "postalCode": "0",
                        "state": "w"
                    },
                    "otherField": "keep-me"
                },
                {
                    "registrationId": "UNTOUCHED",
                    "legalName": "Second Co",
                    "address": {}
                }
            ]));
        })
        .await;

    let set = server
        .mock_async(|when, then| {
            when.method(PUT)
                .path(REGISTRATION_PATH)
                .header(XSRF_HEADER, "csrf-123")
                .json_body(json!({
                    "registrationId": "T123",
                    "legalName": "Acme Inc",
                    "address": {
                        "addressLine1": "1 Main St",
                        "addressLine2": "",
                        "city": "Springfield",
                        "countryCode": "US",
                        "postalCode": "90210",
                        "state": "CA"
                    },
                    "otherField": "keep-me"
                }));
            then.status(200);
        })
        .await;

    let outcome = updater(&server, options())
        .update("arn:aws:iam::999999999999:role/role-with-billing-permissions", &settings)
        .await?;

    set.assert_async().await;
    assert!(matches!(outcome, UpdateOutcome::Updated(_)));
    Ok(())
}

#[tokio::test]
async fn test_no_registrations_performs_no_write() -> Result<()> {
    let temp_dir = TempDir::new()?;
    let settings = load_settings(write_settings(&temp_dir, SETTINGS_JSON)?)?;

    let server = MockServer::start_async().await;
    mock_sign_in(&server).await;

    server
        .mock_async(|when, then| {
            when.method(GET).path(REGISTRATION_PATH);
            then.status(200).json_body(json!([]));
        })
        .await;
    let set = server
        .mock_async(|when, then| {
            when.method(PUT).path(REGISTRATION_PATH);
            then.status(200);
        })
        .await;

    let outcome = updater(&server, options())
        .update("arn:aws:iam::1:role/r", &settings)
        .await?;

    assert_eq!(outcome, UpdateOutcome::NoRegistrations);
    assert_eq!(set.hits_async().await, 0);
    Ok(())
}

#[tokio::test]
async fn test_incomplete_settings_fail_before_any_request() -> Result<()> {
    let temp_dir = TempDir::new()?;
    let path = write_settings(
        &temp_dir,
        r#"{"registrationId":"T123","legalName":"Acme Inc","city":"Springfield"}"#,
    )?;

    let result = load_settings(&path);

    assert!(matches!(
        result,
        Err(TaxRegError::InvalidSettingsError { .. })
    ));
    Ok(())
}

#[tokio::test]
async fn test_transient_list_failure_is_retried_then_reported() -> Result<()> {
    let temp_dir = TempDir::new()?;
    let settings = load_settings(write_settings(&temp_dir, SETTINGS_JSON)?)?;

    let server = MockServer::start_async().await;
    mock_sign_in(&server).await;

    let list = server
        .mock_async(|when, then| {
            when.method(GET).path(REGISTRATION_PATH);
            then.status(503).body("Service Unavailable");
        })
        .await;

    let mut opts = options();
    opts.retry = RetryPolicy {
        max_retries: 2,
        delay: Duration::from_millis(10),
    };

    let result = updater(&server, opts)
        .update("arn:aws:iam::1:role/r", &settings)
        .await;

    assert!(matches!(
        result,
        Err(TaxRegError::BillingError { status: 503, .. })
    ));
    assert_eq!(list.hits_async().await, 3);
    Ok(())
}

#[tokio::test]
async fn test_dry_run_never_writes() -> Result<()> {
    let temp_dir = TempDir::new()?;
    let settings = load_settings(write_settings(&temp_dir, SETTINGS_JSON)?)?;

    let server = MockServer::start_async().await;
    mock_sign_in(&server).await;

    server
        .mock_async(|when, then| {
            when.method(GET).path(REGISTRATION_PATH);
            then.status(200).json_body(json!([
                { "registrationId": "OLD", "address": {}, "otherField": 7 }
            ]));
        })
        .await;
    let set = server
        .mock_async(|when, then| {
            when.method(PUT).path(REGISTRATION_PATH);
            then.status(200);
        })
        .await;

    let mut opts = options();
    opts.dry_run = true;

    let outcome = updater(&server, opts)
        .update("arn:aws:iam::1:role/r", &settings)
        .await?;

    match outcome {
        UpdateOutcome::DryRun(record) => {
            assert_eq!(record.registration_id(), Some("T123"));
            assert_eq!(record.fields()["otherField"], 7);
        }
        other => panic!("unexpected outcome: {:?}", other),
    }
    assert_eq!(set.hits_async().await, 0);
    Ok(())
}
