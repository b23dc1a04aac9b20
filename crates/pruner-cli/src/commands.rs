//! CLI command definitions using clap

use clap::{Parser, Subcommand, ValueEnum};

/// Pruner: run only the tests your change can affect
#[derive(Parser, Debug)]
#[command(name = "pruner")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Verbosity level (-v, -vv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Quiet mode (suppress non-error output)
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Color output (auto, always, never)
    #[arg(long, default_value = "auto", global = true)]
    pub color: ColorArg,

    /// Subcommand to run
    #[command(subcommand)]
    pub command: Commands,
}

/// CLI subcommands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Initialize pruner in the current git repository
    Init(InitArgs),

    /// Run the tests affected by uncommitted changes
    Run(RunArgs),

    /// List supported test providers
    Providers,
}

/// Arguments for the init command
#[derive(Parser, Debug, Default)]
pub struct InitArgs {
    /// Provider whose settings to record
    #[arg(short, long)]
    pub provider: Option<String>,

    /// Answer to a provider question (key=value, repeatable)
    #[arg(short, long = "answer", value_name = "KEY=VALUE", requires = "provider")]
    pub answers: Vec<String>,

    /// Overwrite existing settings
    #[arg(short, long)]
    pub force: bool,
}

/// Arguments for the run command
#[derive(Parser, Debug)]
pub struct RunArgs {
    /// Test provider to run (see `pruner providers`)
    pub provider: String,

    /// Show which tests would run without running them
    #[arg(long)]
    pub dry_run: bool,
}

/// Color argument for CLI
#[derive(ValueEnum, Clone, Debug, Default)]
pub enum ColorArg {
    /// Automatic color detection
    #[default]
    Auto,
    /// Always use colors
    Always,
    /// Never use colors
    Never,
}

impl From<ColorArg> for crate::config::ColorChoice {
    fn from(arg: ColorArg) -> Self {
        match arg {
            ColorArg::Auto => Self::Auto,
            ColorArg::Always => Self::Always,
            ColorArg::Never => Self::Never,
        }
    }
}
