//! Command-line interface definitions.
//!
//! Defines the CLI structure for stackup using `clap`. Global flags control
//! output; each subcommand takes the shared configuration arguments.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

use super::paths;
use crate::infrastructure::config::settings::ConfigOverrides;

/// Local search and inference environment bootstrapper
#[derive(Parser, Debug)]
#[command(name = "stackup")]
#[command(version)]
pub struct Cli {
    /// Color output mode [auto, always, never]
    #[arg(
        long,
        global = true,
        default_value = "auto",
        hide_possible_values = true
    )]
    pub color: ColorChoice,

    /// JSON output for scripting
    #[arg(long, global = true)]
    pub json: bool,

    /// Decrease output verbosity
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Increase output verbosity
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Commands,
}

/// Color output mode for terminal rendering.
#[derive(Clone, Debug, Default, clap::ValueEnum)]
pub enum ColorChoice {
    /// Detect automatically
    #[default]
    Auto,
    /// Always use colors
    Always,
    /// Never use colors
    Never,
}

/// Top-level subcommands.
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Deploy the stack, wait for it and write the environment bundle
    Up(UpArgs),

    /// Remove the release and its leftover jobs and secrets
    Down(DownArgs),

    /// Extract API keys from a running deployment
    Keys(KeysArgs),

    /// Show what is running
    Status(ConfigArgs),

    /// Print the current environment bundle with secrets masked
    Env(EnvArgs),

    /// Inspect configuration
    #[command(subcommand)]
    Config(ConfigCommand),
}

/// Subcommands for `stackup config`.
#[derive(Subcommand, Debug)]
pub enum ConfigCommand {
    /// Display the effective configuration with defaults applied.
    Show(ConfigArgs),
    /// Validate a configuration file for correctness.
    Validate(ConfigPathArg),
}

/// Configuration file path only.
#[derive(Args, Debug)]
pub struct ConfigPathArg {
    /// Path to the configuration file.
    #[arg(short, long, default_value_os_t = paths::default_config())]
    pub config: PathBuf,
}

/// Configuration file plus the values that may be overridden per run.
#[derive(Args, Debug)]
pub struct ConfigArgs {
    /// Path to the configuration file.
    #[arg(short, long, default_value_os_t = paths::default_config())]
    pub config: PathBuf,

    /// Kubernetes namespace.
    #[arg(short, long)]
    pub namespace: Option<String>,

    /// Helm release name.
    #[arg(long)]
    pub release: Option<String>,

    /// Helm chart path or reference.
    #[arg(long)]
    pub chart: Option<String>,

    /// Chat model to pull and advertise.
    #[arg(long)]
    pub model: Option<String>,

    /// Where to write the environment bundle.
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Log level (trace, debug, info, warn, error).
    #[arg(long)]
    pub log_level: Option<String>,

    /// Emit logs as JSON.
    #[arg(long)]
    pub json_logs: bool,
}

impl ConfigArgs {
    #[must_use]
    pub fn overrides(&self) -> ConfigOverrides {
        ConfigOverrides {
            namespace: self.namespace.clone(),
            release: self.release.clone(),
            chart: self.chart.clone(),
            model: self.model.clone(),
            bundle_path: self.output.clone(),
            log_level: self.log_level.clone(),
            json_logs: self.json_logs,
        }
    }
}

/// Arguments for `stackup up`.
#[derive(Args, Debug)]
pub struct UpArgs {
    #[command(flatten)]
    pub config: ConfigArgs,

    /// Keep an existing release instead of reinstalling it.
    #[arg(long)]
    pub keep_existing: bool,

    /// Do not install, start or pull anything for the local inference runtime.
    #[arg(long)]
    pub skip_inference: bool,
}

/// Arguments for `stackup down`.
#[derive(Args, Debug)]
pub struct DownArgs {
    #[command(flatten)]
    pub config: ConfigArgs,

    /// Skip the confirmation prompt.
    #[arg(short, long)]
    pub yes: bool,
}

/// Arguments for `stackup keys`.
#[derive(Args, Debug)]
pub struct KeysArgs {
    #[command(flatten)]
    pub config: ConfigArgs,

    /// Print keys unmasked.
    #[arg(long)]
    pub reveal: bool,

    /// Also write the environment bundle.
    #[arg(short, long)]
    pub write: bool,
}

/// Arguments for `stackup env`.
#[derive(Args, Debug)]
pub struct EnvArgs {
    /// Bundle file to read.
    #[arg(default_value = ".env")]
    pub path: PathBuf,

    /// Print secrets unmasked.
    #[arg(long)]
    pub reveal: bool,
}
