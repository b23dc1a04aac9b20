//! Pruner CLI: run only the tests your change can affect
//!
//! ## Usage
//!
//! ```bash
//! pruner init                                   # Create .pruner/settings.json
//! pruner init -p dotnet -a workingDirectory=src # Record provider settings
//! pruner run dotnet                             # Run affected tests
//! pruner run dotnet --dry-run                   # Show the plan only
//! pruner providers                              # List providers
//! ```

use clap::Parser;
use pruner_cli::{
    handlers::{execute_init, execute_providers, execute_run},
    init_logging, Cli, CliConfig, CliResult, ColorChoice, Commands, Verbosity,
};
use std::process::ExitCode;

fn main() -> ExitCode {
    match run() {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {e}");
            ExitCode::FAILURE
        }
    }
}

fn run() -> CliResult<()> {
    let cli = Cli::parse();

    // Build configuration from CLI args
    let config = build_config(&cli);
    init_logging(&config);

    let runtime = tokio::runtime::Builder::new_multi_thread().enable_all().build()?;
    runtime.block_on(dispatch(&config, cli.command))
}

async fn dispatch(config: &CliConfig, command: Commands) -> CliResult<()> {
    match command {
        Commands::Init(args) => {
            let cwd = std::env::current_dir()?;
            execute_init(config, &args, &cwd).await?;
            Ok(())
        }
        Commands::Run(args) => {
            let cwd = std::env::current_dir()?;
            execute_run(config, &args, &cwd).await
        }
        Commands::Providers => {
            execute_providers();
            Ok(())
        }
    }
}

fn build_config(cli: &Cli) -> CliConfig {
    let verbosity = if cli.quiet {
        Verbosity::Quiet
    } else {
        match cli.verbose {
            0 => Verbosity::Normal,
            1 => Verbosity::Verbose,
            _ => Verbosity::Debug,
        }
    };

    let color: ColorChoice = cli.color.clone().into();

    CliConfig::new().with_verbosity(verbosity).with_color(color)
}
