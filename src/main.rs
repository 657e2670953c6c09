use taxreg::config::cli::{ArgsError, USAGE_MESSAGE};
use taxreg::utils::{logger, validation::Validate};
use taxreg::{
    load_settings, AppConfig, CliArgs, ConsoleSessionFactory, StsRoleAssumer, TaxRegError,
    TaxRegistrationUpdater, UpdateOptions, UpdateOutcome,
};

#[tokio::main]
async fn main() {
    let (args, request) = match CliArgs::parse_request_from(std::env::args_os()) {
        Ok(parsed) => parsed,
        Err(ArgsError::Display(e)) => e.exit(),
        Err(ArgsError::Usage) => {
            println!("{}", USAGE_MESSAGE);
            std::process::exit(1);
        }
    };

    logger::init_cli_logger(args.verbose);
    tracing::info!("Starting taxreg");
    tracing::debug!("CLI args: {:?}", args);

    if let Err(e) = run(&args, &request.role_arn, &request.settings_path).await {
        tracing::error!(
            "❌ Tax registration update failed: {} (Category: {:?})",
            e,
            e.category()
        );
        eprintln!("❌ {}", e.user_friendly_message());
        std::process::exit(e.exit_code());
    }
}

async fn run(
    args: &CliArgs,
    role_arn: &str,
    settings_path: &std::path::Path,
) -> Result<(), TaxRegError> {
    let config = AppConfig::load(args)?;
    config.validate()?;

    // Settings are checked before any remote call is made.
    let settings = load_settings(settings_path)?;

    let role_assumer = StsRoleAssumer::from_config(&config).await;
    let session_factory = ConsoleSessionFactory::from_config(&config);
    let updater =
        TaxRegistrationUpdater::new(role_assumer, session_factory, UpdateOptions::from(&config));

    match updater.update(role_arn, &settings).await? {
        UpdateOutcome::DryRun(registration) => {
            println!("{}", serde_json::to_string_pretty(&registration)?);
        }
        UpdateOutcome::Updated(_) | UpdateOutcome::NoRegistrations => {}
    }

    Ok(())
}
