//! Background sweep of expired shared reports.

use std::sync::Arc;
use std::time::Duration;

use speedtest_core::ServerClock;
use speedtest_services::ShareStore;

pub async fn purge_loop(store: Arc<dyn ShareStore>, clock: ServerClock, every: Duration) {
    let mut interval = tokio::time::interval(every);

    loop {
        interval.tick().await;

        match store.purge_expired(clock.now_ms()) {
            Ok(0) => {}
            Ok(removed) => tracing::debug!(removed, "expired shared reports purged"),
            Err(e) => tracing::warn!(error = %e, "shared report purge failed"),
        }
    }
}
