//! Periodic removal of replenished rate-limit clients.

use std::sync::Arc;
use std::time::Duration;

use manta_core::rate_limit::RateLimiter;
use tokio_util::sync::CancellationToken;

/// How often replenished clients are dropped.
pub const PURGE_INTERVAL: Duration = Duration::from_secs(300);

/// Run the purge loop until `cancel` is triggered.
pub async fn run(limiter: Arc<RateLimiter>, interval: Duration, cancel: CancellationToken) {
    tracing::info!(interval_secs = interval.as_secs(), "Rate-limit purge job started");

    let mut ticker = tokio::time::interval(interval);
    // The first tick completes immediately.
    ticker.tick().await;

    loop {
        tokio::select! {
            _ = cancel.cancelled() => {
                tracing::info!("Rate-limit purge job stopping");
                break;
            }
            _ = ticker.tick() => {
                let removed = limiter.purge_expired();
                if removed > 0 {
                    tracing::debug!(
                        removed,
                        tracked = limiter.tracked_clients(),
                        "Rate-limit purge: dropped replenished clients"
                    );
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn purges_on_each_tick_and_stops_on_cancel() {
        // A zero-length window replenishes almost immediately.
        let limiter = Arc::new(RateLimiter::new(5, Duration::ZERO, 100));
        limiter.check("a");
        limiter.check("b");
        assert_eq!(limiter.tracked_clients(), 2);

        let cancel = CancellationToken::new();
        let handle = tokio::spawn(run(
            Arc::clone(&limiter),
            Duration::from_millis(20),
            cancel.clone(),
        ));

        tokio::time::sleep(Duration::from_millis(100)).await;
        assert_eq!(limiter.tracked_clients(), 0);

        cancel.cancel();
        handle.await.unwrap();
    }
}
