use crate::core::updater::SelectionStrategy;
use clap::error::ErrorKind;
use clap::Parser;
use std::ffi::OsString;
use std::path::PathBuf;

pub const USAGE_MESSAGE: &str =
    "Please provide exactly 2 parameters. RoleARN and Path to json-payload";

#[derive(Debug, Clone, Parser)]
#[command(name = "taxreg", version)]
#[command(about = "Sets legal and tax settings on the first tax registration of an AWS account")]
pub struct CliArgs {
    /// <ROLE_ARN> <SETTINGS_JSON>
    #[arg(value_name = "ARGS", num_args = 0..)]
    pub positional: Vec<String>,

    /// Path to an optional TOML configuration file
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// AWS region used for the STS call
    #[arg(long)]
    pub region: Option<String>,

    /// Which existing registration to update
    #[arg(long, value_enum)]
    pub select: Option<SelectionStrategy>,

    /// Retries for transient failures of the billing calls
    #[arg(long)]
    pub max_retries: Option<u32>,

    /// Build and print the payload without writing it
    #[arg(long)]
    pub dry_run: bool,

    /// Enable verbose output
    #[arg(short, long)]
    pub verbose: bool,
}

/// The two positional inputs, once their count has been checked.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UpdateRequest {
    pub role_arn: String,
    pub settings_path: PathBuf,
}

#[derive(Debug)]
pub enum ArgsError {
    /// Anything the tool rejects: print `USAGE_MESSAGE` and exit 1.
    Usage,
    /// `--help` or `--version`, left to clap to render.
    Display(clap::Error),
}

impl CliArgs {
    /// Parses the command line and checks the positional count. Unknown flags
    /// and bad option values are usage errors like a wrong count.
    pub fn parse_request_from<I, T>(itr: I) -> Result<(Self, UpdateRequest), ArgsError>
    where
        I: IntoIterator<Item = T>,
        T: Into<OsString> + Clone,
    {
        let args = Self::try_parse_from(itr).map_err(|e| match e.kind() {
            ErrorKind::DisplayHelp
            | ErrorKind::DisplayVersion
            | ErrorKind::DisplayHelpOnMissingArgumentOrSubcommand => ArgsError::Display(e),
            _ => ArgsError::Usage,
        })?;
        let request = args.update_request().ok_or(ArgsError::Usage)?;
        Ok((args, request))
    }

    /// `None` unless exactly two positional arguments were given.
    pub fn update_request(&self) -> Option<UpdateRequest> {
        match self.positional.as_slice() {
            [role_arn, settings_path] => Some(UpdateRequest {
                role_arn: role_arn.clone(),
                settings_path: PathBuf::from(settings_path),
            }),
            _ => None,
        }
    }
}
