//! curtain - reveal gate runner
//!
//! Runs a reveal gate against a local asset directory or an HTTP origin and
//! reports how the intro would have been dismissed.

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

mod commands;
mod exit_codes;

/// curtain - intro reveal gate runner
#[derive(Parser, Debug)]
#[command(name = "curtain")]
#[command(version, about, long_about = None)]
struct Cli {
    /// Path to the configuration file (default: ./curtain.toml if present)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, default_value = "warn")]
    log_level: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Run one reveal gate and print its report
    Run(commands::run::RunArgs),

    /// Validate the configuration and print the effective settings
    CheckConfig(commands::config::CheckConfigArgs),

    /// Print the default configuration as TOML
    DefaultConfig,
}

fn main() {
    let cli = Cli::parse();

    let filter = EnvFilter::try_new(&cli.log_level).unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::registry()
        .with(filter)
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(false)
                .with_writer(std::io::stderr),
        )
        .init();

    let exit_code = match cli.command {
        Commands::Run(args) => commands::run::run(cli.config.as_deref(), &args),
        Commands::CheckConfig(args) => commands::config::check(cli.config.as_deref(), &args),
        Commands::DefaultConfig => commands::config::print_default(),
    };
    std::process::exit(i32::from(exit_code));
}
