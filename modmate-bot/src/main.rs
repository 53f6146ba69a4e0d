//! ModMate - main entry point
//!
//! Wires the command resolution engine to the local JSONL platform
//! adapter: events come from a JSONL file, actions are echoed to stdout.
//! The live platform transport plugs in through the same traits.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use tokio::signal;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use modmate_bot::commands::sanitize::Sanitizer;
use modmate_bot::dispatch::{
    load_moderator_snapshot, Dispatcher, DispatcherConfig, REQUIRED_TEMPLATE_KEYS,
};
use modmate_bot::platform::local::{JsonlFeed, LocalPlatform, LocalState};
use modmate_bot::reference::AliasSnapshot;
use modmate_common::config::{resolve_config_path, BotConfig};
use modmate_common::Templates;

/// Command-line arguments for modmate-bot
#[derive(Parser, Debug)]
#[command(name = "modmate-bot")]
#[command(about = "Rule-driven moderation assistant for discussion threads")]
#[command(version)]
struct Args {
    /// Path to the TOML configuration file
    #[arg(short, long, env = "MODMATE_CONFIG")]
    config: Option<PathBuf>,

    /// JSONL file of comment events to process
    #[arg(short, long, default_value = "events.jsonl")]
    events: PathBuf,

    /// JSON file seeding local platform state (documents, trees, moderators)
    #[arg(short, long)]
    state: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "modmate_bot=debug,modmate_common=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let args = Args::parse();

    let config_path = resolve_config_path(args.config.as_deref())
        .context("Failed to resolve configuration path")?;
    info!("Loading configuration from {}", config_path.display());
    let config = BotConfig::load(&config_path).context("Failed to load configuration")?;

    // A mistyped template key must abort here, not mid-reply.
    let templates = Templates::new(config.responses.clone());
    templates
        .validate(REQUIRED_TEMPLATE_KEYS)
        .context("Response template validation failed")?;

    let sanitizer = Sanitizer::new(templates.stop_words().context("Failed to read stop words")?);

    let aliases = AliasSnapshot::load(&config.bot.aliases_path)
        .context("Failed to load alias dataset")?;
    info!("Loaded {} alias entries", aliases.index().len());

    let state = match &args.state {
        Some(path) => LocalState::load(path).context("Failed to load local platform state")?,
        None => LocalState::default(),
    };
    let platform = LocalPlatform::with_echo(state);
    let feed = JsonlFeed::open(&args.events)
        .await
        .with_context(|| format!("Failed to open event feed {}", args.events.display()))?;

    let moderators = load_moderator_snapshot(&platform, &config.bot.subreddits)
        .await
        .context("Failed to load moderator sets")?;

    let mut dispatcher = Dispatcher::new(
        feed,
        platform,
        DispatcherConfig::from(&config.bot),
        templates,
        sanitizer,
        aliases,
        moderators,
    );

    tokio::select! {
        result = dispatcher.run() => {
            result.context("Dispatcher failed")?;
        }
        _ = shutdown_signal() => {
            info!("Shutdown signal received");
        }
    }

    info!("Shutdown complete");
    Ok(())
}

/// Graceful shutdown signal handler
async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("Failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C, shutting down");
        },
        _ = terminate => {
            info!("Received terminate signal, shutting down");
        },
    }
}
