use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Debug, Clone, Parser)]
#[command(name = "sigep-batch")]
#[command(about = "Prepare, close and document carrier posting lists")]
pub struct Cli {
    #[arg(long, short, default_value = "sigep.toml", help = "Session configuration file")]
    pub config: PathBuf,

    #[arg(long, help = "Enable verbose output")]
    pub verbose: bool,

    #[arg(long, help = "Emit logs as JSON lines")]
    pub json_logs: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Clone, Subcommand)]
pub enum Command {
    /// Close a batch file with the registrar and write its documents.
    Close {
        /// Batch file (TOML, or JSON when the extension is `.json`)
        #[arg(long)]
        batch: PathBuf,

        #[arg(long, default_value = "./output")]
        output_dir: PathBuf,

        /// Posting-list id to use instead of a generated one
        #[arg(long)]
        custom_id: Option<u32>,

        /// Query delivery times, freights and availability for every label
        #[arg(long)]
        metrics: bool,

        /// Validate the batch file without contacting the registrar
        #[arg(long)]
        dry_run: bool,
    },

    /// Request tracking codes outside of a close.
    TrackingCodes {
        /// Service code or mnemonic (e.g. 4162 or sedex)
        #[arg(long)]
        service: String,

        #[arg(long, default_value = "1")]
        quantity: u32,
    },

    /// Show whether the configured posting card is active.
    CardStatus,
}
