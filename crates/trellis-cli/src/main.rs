//! Trellis command-line driver.
//!
//! # Usage
//!
//! ```bash
//! # Restrict a room to members of its parent space and save
//! trellis --config trellis.toml join-rules --room '!room:example.org' \
//!     --select restricted --toggle '!space:example.org' --save
//!
//! # Sign out another device, answering re-auth with a password
//! trellis --config trellis.toml sign-out --device LAPTOP --password hunter2
//!
//! # Deliver a push payload
//! trellis --config trellis.toml push --endpoint https://push.example.org/up \
//!     '{"notification":{"event_id":"$e","room_id":"!room:example.org"}}'
//! ```

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use trellis_cli::{
    AppConfig,
    commands::{self, JoinRulesScript, SignoutScript},
};
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

/// Trellis screen driver
#[derive(Parser, Debug)]
#[command(name = "trellis")]
#[command(about = "Drive Trellis screens against a configured session")]
#[command(version)]
struct Args {
    /// Path to the TOML config file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, default_value = "info")]
    log_level: String,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Edit a room's join rules
    JoinRules(JoinRulesScript),

    /// Sign out a device
    SignOut(SignoutScript),

    /// Pause the own voice broadcast in a room
    PauseBroadcast {
        /// Room with the broadcast
        #[arg(long)]
        room: String,
    },

    /// Deliver push payloads
    Push {
        /// Register this endpoint first
        #[arg(long)]
        endpoint: Option<String>,

        /// Raw JSON payloads
        payloads: Vec<String>,
    },
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&args.log_level));

    tracing_subscriber::registry().with(fmt::layer()).with(filter).init();

    let config = match &args.config {
        Some(path) => {
            tracing::info!("Loading config from {}", path.display());
            AppConfig::load(path)?
        },
        None => {
            tracing::warn!("No config file given - using an empty session");
            AppConfig::default()
        },
    };

    match args.command {
        Command::JoinRules(script) => {
            let report = commands::run_join_rules(&config, &script).await?;
            let allowed: Vec<&str> =
                report.state.updated_allow_list.iter().map(|item| item.id.as_str()).collect();
            let unknown: Vec<&str> =
                report.state.unknown_restricted.iter().map(|item| item.id.as_str()).collect();
            tracing::info!(
                rule = %report.state.current_join_rule,
                ?allowed,
                ?unknown,
                unsaved = report.state.has_unsaved_changes,
                "join rules"
            );
            for event in report.events {
                tracing::info!(?event, "view event");
            }
        },
        Command::SignOut(script) => {
            let report = commands::run_session_overview(&config, &script).await?;
            tracing::info!(device = ?report.state.device, "session");
            for event in report.events {
                tracing::info!(?event, "view event");
            }
        },
        Command::PauseBroadcast { room } => {
            let outcome = commands::run_pause_broadcast(&config, &room).await?;
            tracing::info!(?outcome, "voice broadcast");
        },
        Command::Push { endpoint, payloads } => {
            let received = commands::run_push(&config, endpoint.as_deref(), &payloads).await;
            tracing::info!("{} of {} payloads delivered", received.len(), payloads.len());
            for data in received {
                tracing::info!(event_id = %data.event_id, room_id = %data.room_id, unread = ?data.unread, "notification");
            }
        },
    }

    Ok(())
}
