//! badgegate - badge + PIN access appliance
//!
//! `badgegate run` starts the appliance; card and key input can be typed on
//! stdin as `card <id>` / `key <symbol>` lines. The admin subcommands work on
//! the same database.

use anyhow::Result;
use badgegate_appliance::{AppConfig, app};
use clap::{Parser, Subcommand};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "badgegate")]
#[command(about = "Badge + PIN access appliance", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the appliance
    Run,

    /// Enroll a card with its PIN
    AddUser {
        /// Card id as reported by the reader
        #[arg(long)]
        card: String,

        /// PIN digits (at least 4)
        #[arg(long)]
        pin: String,
    },

    /// Show recent access attempts, newest first
    Logs {
        /// Number of entries to show
        #[arg(short = 'n', long, default_value_t = 50)]
        limit: u32,

        /// Only attempts with this card
        #[arg(long)]
        card: Option<String>,

        /// Print entries as JSON lines
        #[arg(long)]
        json: bool,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    // Logs go to stderr; stdout carries receipts and command output.
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "badgegate=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();
    let config = AppConfig::from_env()?;

    match cli.command {
        Commands::Run => {
            info!(
                version = env!("CARGO_PKG_VERSION"),
                database = %config.database_path,
                "Starting badgegate"
            );
            app::run(&config, tokio::io::stdin()).await?;
        }
        Commands::AddUser { card, pin } => {
            app::add_user(&config, &card, &pin).await?;
            println!("User added: {card}");
        }
        Commands::Logs { limit, card, json } => {
            for log in app::recent_logs(&config, limit, card.as_deref()).await? {
                if json {
                    println!("{}", serde_json::to_string(&log)?);
                } else {
                    println!("{}", app::format_log_line(&log));
                }
            }
        }
    }

    Ok(())
}
