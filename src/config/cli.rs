use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueHint, builder::BoolishValueParser};

/// Command-line arguments for the persistence-cache binary.
#[derive(Debug, Parser)]
#[command(
    name = "persistence-cache",
    version,
    about = "Inspect persistence cache keys, tags and settings"
)]
pub struct CliArgs {
    /// Optional path to a configuration file.
    #[arg(
        long = "config-file",
        env = "PCACHE_CONFIG_FILE",
        value_name = "PATH",
        value_hint = ValueHint::FilePath,
        global = true
    )]
    pub config_file: Option<PathBuf>,

    #[command(flatten)]
    pub overrides: GlobalOverrides,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand, Clone)]
pub enum Command {
    /// Print the cache key generated for a pattern.
    Key(IdentifierArgs),
    /// Print the tag generated for a pattern.
    Tag(IdentifierArgs),
    /// List every known pattern with its tag and key shape.
    Patterns,
    /// Load and validate settings, then print a summary.
    #[command(name = "check-config")]
    CheckConfig,
}

#[derive(Debug, Args, Clone)]
pub struct IdentifierArgs {
    /// Pattern name, e.g. `content_version` or `location_path`.
    #[arg(value_name = "PATTERN")]
    pub pattern: String,

    /// Placeholder values in order; `-` leaves a placeholder empty.
    #[arg(value_name = "ARGS")]
    pub args: Vec<String>,
}

#[derive(Debug, Args, Default, Clone)]
pub struct GlobalOverrides {
    /// Override the base log level (trace|debug|info|warn|error).
    #[arg(long = "log-level", value_name = "LEVEL", global = true)]
    pub log_level: Option<String>,

    /// Toggle JSON logging.
    #[arg(
        long = "log-json",
        value_name = "BOOL",
        value_parser = BoolishValueParser::new(),
        global = true
    )]
    pub log_json: Option<bool>,

    /// Override the cache key prefix.
    #[arg(long = "key-prefix", value_name = "PREFIX", global = true)]
    pub key_prefix: Option<String>,
}
