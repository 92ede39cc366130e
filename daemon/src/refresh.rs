//! Keepalive loop. The panels quietly revert to idle when they stop
//! hearing from us, so every non-off state is re-sent on a fixed period.
//! The same module owns the shutdown sweep that blanks every pair.

use std::sync::Arc;
use std::time::Duration;

use log::{error, info, warn};
use tallybridge::TallyState;
use tokio::time::sleep;
use tokio_util::sync::CancellationToken;
use tokio_util::task::TaskTracker;

use crate::state::StateStore;
use crate::transport::TallyTransport;

/// Spawn the refresh task on the tracker. It runs until `shutdown_token`
/// is cancelled; a failed send is logged and the loop carries on.
pub fn run_refresh_loop(
    task_tracker: &TaskTracker,
    shutdown_token: CancellationToken,
    store: Arc<StateStore>,
    transport: Arc<TallyTransport>,
    interval: Duration,
) {
    task_tracker.spawn(async move {
        info!(
            "refresh loop started, interval {:.1}s",
            interval.as_secs_f64()
        );
        loop {
            tokio::select! {
                _ = shutdown_token.cancelled() => {
                    info!("refresh loop stopped");
                    return;
                }
                _ = sleep(interval) => {
                    refresh_cycle(&store, &transport).await;
                }
            }
        }
    });
}

/// One keepalive pass over a consistent snapshot. Off entries are skipped:
/// idle panels stay idle without any traffic.
async fn refresh_cycle(store: &StateStore, transport: &TallyTransport) {
    let snapshot = store.snapshot().await;
    for ((band, screen), state) in snapshot {
        if state.is_off() {
            continue;
        }
        if let Err(e) = transport.send(band, screen, state).await {
            error!("refresh send to bandeau {band} screen {screen} failed: {e}");
        }
    }
}

/// Set every configured pair to off and transmit the off state once per
/// pair, whether or not it was already off. Best-effort, one attempt each.
/// Runs during shutdown once the refresh loop has stopped, so nothing can
/// re-light a panel afterwards.
pub async fn blank_all(store: &StateStore, transport: &TallyTransport) {
    for (band, screen) in store.snapshot().await.into_keys() {
        store.set(band, screen, TallyState::Off).await;
        match transport.send(band, screen, TallyState::Off).await {
            Ok(()) => info!("bandeau {band} screen {screen} blanked"),
            Err(e) => warn!("failed to blank bandeau {band} screen {screen}: {e}"),
        }
    }
}
