//! Keep-alive ping
//!
//! Hosting platforms put idle services to sleep. In production the relay
//! pings its own `/health` endpoint on a fixed interval. The task shares
//! nothing with request handling; failures are logged and the loop goes on.

use std::time::Duration;
use tokio::task::JoinHandle;
use tracing::{info, warn};

const PING_TIMEOUT: Duration = Duration::from_secs(30);

/// Send one ping; returns whether the endpoint answered with a success status
pub async fn ping(client: &reqwest::Client, url: &str) -> bool {
    match client.get(url).send().await.and_then(|r| r.error_for_status()) {
        Ok(_) => {
            info!("Keep-alive ping sent");
            true
        }
        Err(e) => {
            warn!("Keep-alive ping failed: {}", e);
            false
        }
    }
}

/// Spawn the periodic ping task
///
/// The first ping goes out one full `interval` after spawning. Abort the
/// returned handle to stop it.
pub fn spawn_keepalive(url: String, interval: Duration) -> JoinHandle<()> {
    tokio::spawn(async move {
        let client = match reqwest::Client::builder().timeout(PING_TIMEOUT).build() {
            Ok(client) => client,
            Err(e) => {
                warn!("Keep-alive disabled, HTTP client unavailable: {}", e);
                return;
            }
        };

        info!("Keep-alive enabled: {} every {:?}", url, interval);

        let start = tokio::time::Instant::now() + interval;
        let mut ticker = tokio::time::interval_at(start, interval);
        loop {
            ticker.tick().await;
            ping(&client, &url).await;
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_ping_unreachable_is_logged_not_raised() {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_millis(500))
            .build()
            .unwrap();
        // Port 9 (discard) on localhost is not expected to run an HTTP server
        assert!(!ping(&client, "http://127.0.0.1:9/health").await);
    }
}
