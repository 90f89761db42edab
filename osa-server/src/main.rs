//! Open Stream Alerts Server
//!
//! A headless aggregator for audience events (follows, subscriptions,
//! hosts, live-status updates) across multiple streaming channels.

mod api;
mod config;
mod server;
mod shutdown;
mod state;

use clap::Parser;
use config::ConfigLoader;
use osa_core::events::{channel_event_channel, outbound_channel};
use osa_core::processors::EventRouter;
use osa_core::registry::{ChannelRegistry, SourceFactory};
use osa_core::source::live::LivePoller;
use osa_core::source::polling::PollingSourceFactory;
use server::{build_router, run_server};
use shutdown::spawn_config_reload_handler;
use state::AppState;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::watch;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

/// Open Stream Alerts - headless audience alert aggregator
#[derive(Parser, Debug)]
#[command(name = "osa-server")]
#[command(version, about, long_about = None)]
struct Args {
    /// Path to the configuration file
    #[arg(short, long, default_value = "./osa-config.toml")]
    config: PathBuf,

    /// Override the listen address (e.g., 0.0.0.0:3000)
    #[arg(short, long)]
    listen: Option<SocketAddr>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    init_tracing();

    // Parse command line arguments
    let args = Args::parse();

    tracing::info!("Starting osa-server v{}", env!("CARGO_PKG_VERSION"));

    // Load configuration; an absent file or an absent/empty channel list
    // refuses startup.
    let config_loader = Arc::new(ConfigLoader::new(&args.config, args.listen));
    let loaded_config = config_loader.load().map_err(|e| {
        tracing::error!("Failed to load configuration: {}", e);
        e
    })?;

    let listen_addr = loaded_config.listen;
    tracing::info!("Configuration loaded from {:?}", args.config);

    // Wire the event system: sources -> router -> outbound bus.
    let (events_tx, events_rx) = channel_event_channel();
    let outbound_tx = outbound_channel();
    let (shutdown_tx, shutdown_rx) = watch::channel(false);

    let live = Arc::new(LivePoller::new(loaded_config.platform.clone()));
    let factory: Arc<dyn SourceFactory> = Arc::new(PollingSourceFactory::new(
        loaded_config.platform.clone(),
        events_tx,
        Arc::clone(&live),
        shutdown_rx.clone(),
    ));

    let router_task = tokio::spawn(
        EventRouter::new(outbound_tx.clone()).run(shutdown_rx.clone(), events_rx),
    );

    // Register every configured channel before accepting queries. One bad
    // channel does not block the rest.
    let registry = Arc::new(ChannelRegistry::new());
    let report = registry
        .ensure(&loaded_config.channels, factory.as_ref())
        .await;
    for (name, error) in &report.failures {
        tracing::error!(channel = %name, %error, "channel failed to register");
    }
    tracing::info!(
        channels = registry.len().await,
        "channel registration complete"
    );

    // Create application state
    let state = AppState::new(registry, outbound_tx);

    // Spawn config reload handler (listens for SIGHUP)
    let shutdown_notify = spawn_config_reload_handler(state.clone(), config_loader, factory);

    // Build the router
    let router = build_router(state);

    // Run the server
    tracing::info!("Starting HTTP server on {}", listen_addr);
    let result = run_server(router, listen_addr).await;

    // Signal the config reload handler and the event tasks to stop
    shutdown_notify.notify_one();
    let _ = shutdown_tx.send(true);
    let _ = router_task.await;

    tracing::info!("Server shutdown complete");

    result.map_err(Into::into)
}

/// Initialize the tracing subscriber with environment-based filtering.
fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,reqwest=warn,hyper=warn"));

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer())
        .init();
}
