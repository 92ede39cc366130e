use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, Result};
use log::{info, warn};
use tallybridge::TallyState;
use tallybridge_daemon::config::Config;
use tallybridge_daemon::refresh;
use tallybridge_daemon::server::{self, BridgeState};
use tallybridge_daemon::state::StateStore;
use tallybridge_daemon::transport::TallyTransport;
use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;
use tokio_util::task::TaskTracker;

#[tokio::main]
async fn main() -> Result<()> {
    tallybridge::init_logging(log::LevelFilter::Info);

    let config = match std::env::args().nth(1) {
        Some(path) => Config::load(Path::new(&path))?,
        None => {
            info!("no config file given, using built-in defaults");
            Config::default()
        }
    };

    info!("tallybridge {} starting", env!("CARGO_PKG_VERSION"));
    info!(
        "request format: /?state=rouge&band=1&id=2 (states: {})",
        TallyState::ALL.map(TallyState::name).join(", ")
    );
    info!(
        "refresh interval {:.1}s, udp destination port {}",
        config.refresh_interval_secs, config.udp_dest_port
    );
    if config.bandeaux.is_empty() {
        warn!("no bandeaux configured, every tally request will be rejected");
    }

    let transport =
        Arc::new(TallyTransport::bind(&config).context("failed to set up udp transport")?);
    let store = Arc::new(StateStore::new(transport.bands()));

    let shutdown_token = CancellationToken::new();
    let task_tracker = TaskTracker::new();
    refresh::run_refresh_loop(
        &task_tracker,
        shutdown_token.clone(),
        store.clone(),
        transport.clone(),
        config.refresh_interval(),
    );

    let listener = TcpListener::bind((config.http_host.as_str(), config.http_port))
        .await
        .with_context(|| {
            format!(
                "failed to bind http listener on {}:{}",
                config.http_host, config.http_port
            )
        })?;
    info!(
        "listening on http://{}:{}",
        config.http_host, config.http_port
    );

    let bridge = BridgeState {
        store: store.clone(),
        transport: transport.clone(),
    };
    axum::serve(listener, server::router(bridge))
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("http server error")?;

    // The refresh loop must be fully stopped before blanking, so nothing
    // can re-light a panel afterwards.
    shutdown_token.cancel();
    task_tracker.close();
    task_tracker.wait().await;
    info!("blanking all tallies");
    refresh::blank_all(&store, &transport).await;
    info!("bridge stopped");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("failed to install ctrl-c handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("failed to install sigterm handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {}
        _ = terminate => {}
    }
    info!("shutdown signal received");
}
