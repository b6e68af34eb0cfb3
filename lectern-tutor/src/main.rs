//! lectern-tutor - Autonomous lecture microservice
//!
//! Teaches a document unit by unit: each lesson is generated by an ordered
//! chain of providers (or read from the lecture cache) while the previous
//! one is being delivered.

use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use lectern_common::config::{RootFolderInitializer, RootFolderResolver, TomlConfig};
use lectern_common::events::EventBus;
use lectern_tutor::cache::LectureCache;
use lectern_tutor::config::TutorConfig;
use lectern_tutor::delivery::PacedEventDeliverer;
use lectern_tutor::providers::{OfflineGenerator, OllamaGenerator, ProviderChain};
use lectern_tutor::AppState;
use tokio::signal;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Command-line arguments for lectern-tutor
#[derive(Parser, Debug)]
#[command(name = "lectern-tutor")]
#[command(about = "Autonomous lecture delivery microservice for Lectern")]
#[command(version)]
struct Args {
    /// Port to listen on
    #[arg(short, long, default_value = "5811", env = "LECTERN_TUTOR_PORT")]
    port: u16,

    /// Root folder holding the lecture cache
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

    info!("Starting lectern-tutor on port {}", args.port);
    info!("Version: {}", env!("CARGO_PKG_VERSION"));

    let tutor_config =
        TutorConfig::load(config_path.as_deref()).context("Invalid [tutor] configuration")?;

    let root_folder = RootFolderResolver::new("lectern-tutor")
        .with_cli_arg(args.root_folder.clone())
        .with_config_file(config_path.clone())
        .resolve();
    let initializer = RootFolderInitializer::new(root_folder);
    initializer
        .ensure_directory_exists()
        .context("Failed to initialize root folder")?;

    let cache_path = initializer.lecture_cache_path();
    info!("Lecture cache: {}", cache_path.display());
    let cache = LectureCache::file(cache_path);

    let ollama = OllamaGenerator::new(
        &tutor_config.ollama_url,
        &tutor_config.ollama_model,
        tutor_config.generation_timeout(),
    )
    .context("Failed to create Ollama client")?;
    let mut chain = ProviderChain::new(tutor_config.generation_timeout(), tutor_config.max_retries)
        .with_offline_only(tutor_config.offline_only)
        .with_provider(Arc::new(ollama));
    if tutor_config.offline_fallback {
        chain = chain.with_provider(Arc::new(OfflineGenerator));
    }
    info!(
        providers = ?chain.capabilities(),
        offline_only = tutor_config.offline_only,
        timeout_secs = tutor_config.generation_timeout_secs,
        max_retries = tutor_config.max_retries,
        "Generation providers configured"
    );

    let event_bus = EventBus::new(tutor_config.event_capacity);
    let deliverer = Arc::new(PacedEventDeliverer::new(
        event_bus.clone(),
        tutor_config.words_per_minute,
    ));
    let state = AppState::new(tutor_config, event_bus, cache, chain, deliverer);
    let teaching = Arc::clone(&state.teaching);
    let app = lectern_tutor::build_router(state);

    let addr = SocketAddr::from(([0, 0, 0, 0], args.port));
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .context("Failed to bind to address")?;
    info!("Listening on http://{}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    teaching.stop_all().await;
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
