use std::time::Duration;

use anyhow::Result;
use reqwest::Client;
use tokio::select;
use tokio::sync::mpsc::{Receiver, Sender};
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use crate::events::{FetchImage, FetchOutcome};

/// Image-loading collaborator: pulls each requested URL with the configured
/// per-fetch timeout and reports the outcome. One fetch in flight at a time;
/// the slideshow paces requests far slower than that anyway. Failures are
/// reported, never retried here.
pub async fn run(
    mut fetch_rx: Receiver<FetchImage>,
    outcome_tx: Sender<FetchOutcome>,
    timeout: Duration,
    cancel: CancellationToken,
) -> Result<()> {
    let client = Client::builder().timeout(timeout).build()?;

    loop {
        select! {
            _ = cancel.cancelled() => break,

            maybe = fetch_rx.recv() => {
                let Some(FetchImage { index, url }) = maybe else { break };
                match fetch_len(&client, &url).await {
                    Ok(bytes) => {
                        debug!(index, bytes, "image fetched");
                        let _ = outcome_tx.send(FetchOutcome::Loaded { index, bytes }).await;
                    }
                    Err(err) => {
                        warn!(index, url = %url, error = %err, "image fetch failed");
                        let _ = outcome_tx.send(FetchOutcome::Failed { index, url }).await;
                    }
                }
            }
        }
    }
    Ok(())
}

async fn fetch_len(client: &Client, url: &str) -> Result<usize> {
    let response = client.get(url).send().await?.error_for_status()?;
    let body = response.bytes().await?;
    Ok(body.len())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::sync::mpsc;

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn unreachable_url_reports_failure() {
        let (fetch_tx, fetch_rx) = mpsc::channel(2);
        let (outcome_tx, mut outcome_rx) = mpsc::channel(2);
        let cancel = CancellationToken::new();

        let handle = tokio::spawn(run(
            fetch_rx,
            outcome_tx,
            Duration::from_secs(2),
            cancel.clone(),
        ));

        // Port 1 on loopback: connection refused without touching the network.
        let url = "http://127.0.0.1:1/cat".to_string();
        fetch_tx
            .send(FetchImage {
                index: 0,
                url: url.clone(),
            })
            .await
            .unwrap();

        let outcome = tokio::time::timeout(Duration::from_secs(5), outcome_rx.recv())
            .await
            .expect("timeout waiting for fetch outcome")
            .expect("fetcher channel closed");
        assert_eq!(outcome, FetchOutcome::Failed { index: 0, url });

        cancel.cancel();
        let _ = handle.await;
    }

    #[tokio::test]
    async fn exits_when_request_channel_closes() {
        let (fetch_tx, fetch_rx) = mpsc::channel::<FetchImage>(1);
        let (outcome_tx, _outcome_rx) = mpsc::channel(1);
        let cancel = CancellationToken::new();

        drop(fetch_tx);
        run(fetch_rx, outcome_tx, Duration::from_secs(1), cancel)
            .await
            .unwrap();
    }
}
