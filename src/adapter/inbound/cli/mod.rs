//! CLI module graph and dispatch.

pub mod command;
pub mod config;
pub mod diagnostic;
pub mod down;
pub mod env;
pub mod keys;
pub mod output;
pub mod paths;
pub mod progress;
pub mod status;
pub mod up;

use command::{Cli, Commands, ConfigArgs, ConfigCommand};

use crate::error::Result;
use crate::infrastructure::config::settings::Config;

/// Load the configuration file, apply flag overrides and start logging.
///
/// `-v` raises the log level to `info`, `-vv` to `debug`, unless a level was
/// given explicitly.
///
/// # Errors
///
/// Returns an error if the file is unreadable or the result is invalid.
pub fn prepare(args: &ConfigArgs) -> Result<Config> {
    let mut overrides = args.overrides();
    if overrides.log_level.is_none() {
        overrides.log_level = match output::verbosity() {
            0 => None,
            1 => Some("info".to_string()),
            _ => Some("debug".to_string()),
        };
    }
    let config = Config::load_or_default(&args.config)?.apply(overrides)?;
    config.init_logging();
    Ok(config)
}

/// Run the parsed command line.
///
/// # Errors
///
/// Returns the command's error; `up` failures carry the failed stage.
pub async fn run(cli: Cli) -> Result<()> {
    output::configure(
        output::OutputConfig::new(cli.json, cli.quiet, cli.verbose),
        &cli.color,
    );

    match &cli.command {
        Commands::Up(args) => {
            let config = prepare(&args.config)?;
            up::execute(args, &config).await
        }
        Commands::Down(args) => {
            let config = prepare(&args.config)?;
            down::execute(args, &config).await
        }
        Commands::Keys(args) => {
            let config = prepare(&args.config)?;
            keys::execute(args, &config).await
        }
        Commands::Status(args) => {
            let config = prepare(args)?;
            status::execute(&config).await
        }
        Commands::Env(args) => env::execute(args),
        Commands::Config(ConfigCommand::Show(args)) => {
            let config = prepare(args)?;
            config::execute_show(&args.config, &config)
        }
        Commands::Config(ConfigCommand::Validate(args)) => config::execute_validate(&args.config),
    }
}
