//! lectern-attend - Attention tracking microservice
//!
//! Receives per-frame detector output for each face in a classroom webcam
//! feed, keeps a smoothed attentive/distracted verdict per student and
//! produces attendance summaries when a session ends.

use std::net::SocketAddr;
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use lectern_attend::config::AttentionConfig;
use lectern_attend::AppState;
use lectern_common::config::{RootFolderInitializer, RootFolderResolver, TomlConfig};
use lectern_common::events::EventBus;
use tokio::signal;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Command-line arguments for lectern-attend
#[derive(Parser, Debug)]
#[command(name = "lectern-attend")]
#[command(about = "Attention tracking microservice for Lectern")]
#[command(version)]
struct Args {
    /// Port to listen on
    #[arg(short, long, default_value = "5810", env = "LECTERN_ATTEND_PORT")]
    port: u16,

    /// Root folder holding lectern.db
    #[arg(short, long)]
    root_folder: Option<PathBuf>,

    /// Bootstrap TOML configuration file
    #[arg(short, long, env = "LECTERN_CONFIG")]
    config: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let config_path = args
        .config
        .clone()
        .or_else(lectern_common::config::default_config_path);
    let toml_config = TomlConfig::load_or_default(config_path.as_deref());

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| toml_config.logging.level.clone().into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting lectern-attend on port {}", args.port);
    info!("Version: {}", env!("CARGO_PKG_VERSION"));

    let attention_config = AttentionConfig::load(config_path.as_deref())
        .context("Invalid [attention] configuration")?;
    info!(
        history_length = attention_config.history_length,
        required = attention_config.consecutive_frames_required,
        confidence_threshold = attention_config.confidence_threshold,
        "Attention classifier configured"
    );

    let root_folder = RootFolderResolver::new("lectern-attend")
        .with_cli_arg(args.root_folder.clone())
        .with_config_file(config_path.clone())
        .resolve();
    let initializer = RootFolderInitializer::new(root_folder);
    initializer
        .ensure_directory_exists()
        .context("Failed to initialize root folder")?;

    let db_path = initializer.database_path();
    info!("Database: {}", db_path.display());
    let db_pool = lectern_attend::db::init_database_pool(&db_path)
        .await
        .context("Failed to open database")?;

    let event_bus = EventBus::new(attention_config.event_capacity);
    let state = AppState::new(db_pool, event_bus, attention_config);
    let app = lectern_attend::build_router(state);

    let addr = SocketAddr::from(([0, 0, 0, 0], args.port));
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .context("Failed to bind to address")?;
    info!("Listening on http://{}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    info!("Server shutdown complete");
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
