//! Periodic self-ping that keeps idle hosts from suspending the service.

use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::interval;
use tracing::debug;

pub const PING_INTERVAL: Duration = Duration::from_secs(60);

fn health_url(base_url: &str) -> String {
    format!("{}/health", base_url.trim_end_matches('/'))
}

/// Ping `<base_url>/health` every [`PING_INTERVAL`] until the task is aborted.
pub fn spawn(base_url: &str) -> JoinHandle<()> {
    spawn_with_interval(base_url, PING_INTERVAL)
}

pub fn spawn_with_interval(base_url: &str, period: Duration) -> JoinHandle<()> {
    let url = health_url(base_url);
    let client = reqwest::Client::new();

    tokio::spawn(async move {
        let mut ticker = interval(period);
        // The first tick completes immediately; the service is not up yet.
        ticker.tick().await;
        loop {
            ticker.tick().await;
            match client.get(&url).send().await {
                Ok(response) => debug!(%url, status = %response.status(), "keep-alive ping"),
                Err(e) => debug!(%url, error = %e, "keep-alive ping failed"),
            }
        }
    })
}
