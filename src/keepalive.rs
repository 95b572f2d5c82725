/// 無料ホスティングのスリープを防ぐ外向きpingループ。コア状態には
/// 一切触れない薄いラッパー。
use std::time::Duration;

use tokio::{task::JoinHandle, time::sleep};
use tracing::{debug, warn};

const KEEPALIVE_TIMEOUT: Duration = Duration::from_secs(10);

pub fn spawn_keepalive_pinger(url: String, interval: Duration) -> JoinHandle<()> {
    tokio::spawn(async move {
        let client = match reqwest::Client::builder().timeout(KEEPALIVE_TIMEOUT).build() {
            Ok(client) => client,
            Err(error) => {
                warn!(%error, "failed to build keepalive client, pinger disabled");
                return;
            }
        };

        loop {
            sleep(interval).await;
            match client.get(&url).send().await {
                Ok(response) => debug!(status = %response.status(), "keepalive ping sent"),
                Err(error) => warn!(%error, "keepalive ping failed"),
            }
        }
    })
}
