//! kr - Knowledge Resolver CLI
//!
//! Resolve scored knowledge-module candidates into tiered load plans under a
//! per-session context budget.

use std::process::ExitCode;

use clap::Parser;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

use kr::Result;
use kr::app::AppContext;
use kr::cli::{Cli, Commands};

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(&cli);

    match run(&cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            if cli.robot {
                // Robot mode: JSON error output to stdout
                let code = match &e {
                    kr::KrError::ModuleNotFound(_) => "module_not_found",
                    kr::KrError::TierNotFound { .. } => "tier_not_found",
                    kr::KrError::CyclicDependency { .. } => "cyclic_dependency",
                    kr::KrError::UnknownDependency { .. } => "unknown_dependency",
                    kr::KrError::InvalidManifest { .. } => "invalid_manifest",
                    _ => "error",
                };
                let error_json = serde_json::json!({
                    "error": true,
                    "code": code,
                    "message": e.to_string(),
                });
                println!("{}", serde_json::to_string(&error_json).unwrap_or_default());
            } else {
                eprintln!("Error: {e}");
            }
            ExitCode::FAILURE
        }
    }
}

fn run(cli: &Cli) -> Result<()> {
    // Init and validate must work without an openable store.
    match &cli.command {
        Commands::Init(args) => {
            return kr::cli::commands::init::run_without_context(cli.output_format(), args);
        }
        Commands::Validate(args) => {
            return kr::cli::commands::validate::run_without_context(cli.output_format(), args);
        }
        _ => {}
    }
    let ctx = AppContext::from_cli(cli)?;
    kr::cli::commands::run(&ctx, &cli.command)
}

fn init_tracing(cli: &Cli) {
    if cli.quiet {
        return;
    }

    let filter = match cli.verbose {
        0 => "warn,kr=info",
        1 => "info,kr=debug",
        2 => "debug,kr=trace",
        _ => "trace",
    };

    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter));

    if cli.robot {
        // JSON logging for robot mode
        tracing_subscriber::registry()
            .with(env_filter)
            .with(fmt::layer().json().with_writer(std::io::stderr))
            .init();
    } else {
        // Human-readable logging
        tracing_subscriber::registry()
            .with(env_filter)
            .with(fmt::layer().with_writer(std::io::stderr))
            .init();
    }
}
