//! CLI definitions for MailHands.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

/// MailHands CLI.
#[derive(Parser)]
#[command(name = "mailhands")]
#[command(about = "Send email through web mail providers by driving a live browser")]
#[command(version)]
pub(crate) struct Cli {
    /// Configuration file path
    #[arg(short, long, default_value = "config/default.toml", global = true)]
    pub config: PathBuf,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub(crate) enum Commands {
    /// Send an email described in plain language
    Run(RunArgs),

    /// Run the HTTP task API
    Serve {
        /// Server host (overrides config)
        #[arg(long)]
        host: Option<String>,

        /// Server port (overrides config)
        #[arg(long)]
        port: Option<u16>,
    },

    /// List supported providers
    Providers,

    /// Print the effective configuration
    Config,
}

#[derive(clap::Args, Debug, Clone)]
pub(crate) struct RunArgs {
    /// Instruction, e.g. "Send an email to john@example.com about lunch saying 'noon works'"
    pub instruction: String,

    /// Providers to send through
    #[arg(long, num_args = 1.., default_values = ["gmail", "outlook"])]
    pub providers: Vec<String>,

    /// Run the browser without a window
    #[arg(long)]
    pub headless: bool,

    /// Dump each provider's DOM structure instead of sending
    #[arg(long)]
    pub analyze: bool,

    /// Fill the compose form but never click send
    #[arg(long)]
    pub dry_run: bool,

    /// Seconds to wait for a manual login
    #[arg(long)]
    pub auth_timeout: Option<u64>,
}
