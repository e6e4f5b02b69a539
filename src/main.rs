//! MailHands - send email through web mail providers by driving a browser.
//!
//! Main entry point for the CLI and the HTTP task API.

mod cli;
mod cmd_info;
mod cmd_run;
mod cmd_serve;
mod engine;

use std::path::PathBuf;
use std::sync::OnceLock;

use clap::Parser;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

use cli::{Cli, Commands};

fn mailhands_dir() -> PathBuf {
    dirs::home_dir()
        .map(|h| h.join(".mailhands"))
        .unwrap_or_else(|| PathBuf::from(".mailhands"))
}

/// Console plus daily-rolling files under ~/.mailhands/logs/.
fn init_tracing() -> Result<(), Box<dyn std::error::Error>> {
    let log_dir = mailhands_dir().join("logs");
    std::fs::create_dir_all(&log_dir)?;

    let file_appender = RollingFileAppender::builder()
        .rotation(Rotation::DAILY)
        .filename_prefix("mailhands")
        .filename_suffix("log")
        .max_log_files(30)
        .build(&log_dir)?;
    let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);

    static GUARD: OnceLock<WorkerGuard> = OnceLock::new();
    let _ = GUARD.set(guard);

    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    // stdout carries command output.
    tracing_subscriber::registry()
        .with(env_filter)
        .with(
            fmt::layer()
                .with_target(true)
                .with_ansi(true)
                .with_writer(std::io::stderr),
        )
        .with(fmt::layer().with_writer(non_blocking).with_ansi(false))
        .init();

    Ok(())
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    init_tracing()?;

    let cli = Cli::parse();
    let config = engine::load_config(&cli.config)?;

    match cli.command {
        Commands::Run(args) => {
            if !cmd_run::handle_run(config, args).await? {
                std::process::exit(1);
            }
        }
        Commands::Serve { host, port } => cmd_serve::handle_serve(config, host, port).await?,
        Commands::Providers => cmd_info::handle_providers(&config)?,
        Commands::Config => cmd_info::handle_config(&config)?,
    }

    Ok(())
}
