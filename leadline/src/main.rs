mod config;
mod logging;
mod metrics;

use clap::{Args, Parser, Subcommand};
use config::Config;
use intake::env::{Credentials, ProcessEnv};
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

#[derive(Parser)]
#[command(name = "leadline", version, about = "Intake service for marketing site form posts")]
struct Cli {
    #[command(subcommand)]
    command: CliCommand,
}

#[derive(Subcommand)]
enum CliCommand {
    /// Run the submission API and admin probes
    Serve(ServeArgs),
    /// Report which credentials the environment provides, masked
    CheckEnv,
}

#[derive(Args)]
struct ServeArgs {
    /// YAML config file; built-in defaults when omitted
    #[arg(long, short)]
    config: Option<PathBuf>,
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    match cli.command {
        CliCommand::Serve(args) => serve(args),
        CliCommand::CheckEnv => {
            check_env();
            ExitCode::SUCCESS
        }
    }
}

fn serve(args: ServeArgs) -> ExitCode {
    let config = match args.config {
        Some(path) => match Config::from_file(&path) {
            Ok(config) => config,
            Err(e) => {
                eprintln!("{}: {e}", path.display());
                return ExitCode::FAILURE;
            }
        },
        None => Config::default(),
    };

    let _sentry = logging::init(config.common.logging.as_ref());

    if let Some(metrics_config) = &config.common.metrics {
        if let Err(e) = metrics::init(metrics_config) {
            tracing::error!(error = %e, "could not start metrics exporter");
            return ExitCode::FAILURE;
        }
    }

    let runtime = match tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
    {
        Ok(runtime) => runtime,
        Err(e) => {
            tracing::error!(error = %e, "could not start tokio runtime");
            return ExitCode::FAILURE;
        }
    };

    match runtime.block_on(intake::run(config.intake, Arc::new(ProcessEnv))) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!(error = %e, "intake stopped");
            ExitCode::FAILURE
        }
    }
}

fn check_env() {
    let credentials = Credentials::load(&ProcessEnv);

    println!("leadline environment:");
    for (key, value) in credentials.summary() {
        println!("  {key:<16} {value}");
    }
}
