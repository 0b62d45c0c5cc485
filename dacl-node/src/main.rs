//! # DACL Node CLI
//!
//! Command-line interface for the device access control list.

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use dacl_core::ConfigLoader;
use tracing::debug;

mod commands;

use commands::acl::{AclContext, MessageAction};

/// CLI structure
#[derive(Parser, Debug)]
#[command(name = "dacl")]
#[command(about = "Device access control list")]
#[command(version)]
struct Cli {
    /// Path to config file (default: $DACL_CONFIG or ./dacl.toml)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Device root directory holding acl.data (overrides config)
    #[arg(long, global = true)]
    root: Option<PathBuf>,

    /// Output JSON format
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Commands,
}

/// Main commands
#[derive(Subcommand, Debug)]
enum Commands {
    /// Show whether an ACL is provisioned
    Status,

    /// Print the stored ACL
    Show,

    /// Print the message a manager must sign
    Message {
        #[command(subcommand)]
        action: MessageAction,
    },

    /// Store a signed ACL
    Store {
        /// Candidate ACL (JSON)
        #[arg(long, short)]
        file: PathBuf,
        /// Base58 signature by one of the candidate's managers
        #[arg(long, short)]
        signature: String,
    },

    /// Remove the ACL
    Clear {
        /// Base58 signature over the clear message (not needed for legacy ACLs)
        #[arg(long, short, default_value = "")]
        signature: String,
    },
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let loader = match &cli.config {
        Some(path) => ConfigLoader::with_path(path),
        None => ConfigLoader::new(),
    };
    let mut config = loader.load()?;
    if let Some(root) = &cli.root {
        config.storage.root = root.clone();
    }

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&config.logging.filter)),
        )
        .with_writer(std::io::stderr)
        .init();

    debug!("Running command: {:?}", cli.command);

    let ctx = AclContext::new(config.storage.root, cli.json);
    match cli.command {
        Commands::Status => ctx.status(),
        Commands::Show => ctx.show(),
        Commands::Message { action } => ctx.message(action),
        Commands::Store { file, signature } => ctx.store(&file, &signature),
        Commands::Clear { signature } => ctx.clear(&signature),
    }
}
