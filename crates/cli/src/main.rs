//! memclaw CLI: the main entry point.
//!
//! Commands:
//! - `chat`    : Interactive chat or single-message mode (the default)
//! - `onboard` : Write a starter config file
//! - `config`  : Show the effective configuration

use clap::{Parser, Subcommand};

mod commands;

#[derive(Parser)]
#[command(
    name = "memclaw",
    about = "memclaw — a chat agent that remembers",
    version,
    author
)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Chat with the agent
    Chat {
        /// Send a single message instead of entering interactive mode
        #[arg(short, long)]
        message: Option<String>,

        /// Keep memory in process instead of using the memory service
        #[arg(long)]
        offline: bool,
    },

    /// Initialize configuration
    Onboard,

    /// Show the effective configuration (secrets redacted)
    Config,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenv::dotenv().ok();
    let cli = Cli::parse();

    // Logs go to stderr so the conversation on stdout stays readable
    let filter = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(filter)),
        )
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();

    match cli.command.unwrap_or(Commands::Chat {
        message: None,
        offline: false,
    }) {
        Commands::Chat { message, offline } => commands::chat::run(message, offline).await?,
        Commands::Onboard => commands::onboard::run().await?,
        Commands::Config => commands::config_cmd::show().await?,
    }

    Ok(())
}
