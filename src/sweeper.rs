use std::sync::Arc;
use std::time::Instant;
use tokio::time::{Duration, interval};
use tracing::{debug, info};

use crate::metrics::TRACKED_CLIENTS;
use crate::state::AppState;

// Background eviction loop - drops client windows with no admission in
// the trailing hour so the registry doesn't grow without bound.
pub async fn window_sweeper(state: Arc<AppState>, sweep_interval: Duration) {
    let mut interval = interval(sweep_interval);

    info!(interval = ?sweep_interval, "window sweeper started");

    loop {
        interval.tick().await;

        let evicted = state.limiter.sweep(Instant::now());
        let tracked = state.limiter.tracked_clients();

        TRACKED_CLIENTS.set(tracked as f64);
        if evicted > 0 {
            debug!(evicted, tracked, "idle client windows evicted");
        }
    }
}
