use anyhow::Result;
use tokio::select;
use tokio::sync::mpsc::{Receiver, Sender};
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use crate::events::{FetchImage, FetchOutcome, LoadReport, SlideshowEvent};

/// Consumer side of the slideshow: prints the countdown, forwards each new
/// image to the fetcher, and relays load outcomes back to the session
/// driver. Returns whether the session reached Finished, so the caller can
/// gate the history append on it.
pub async fn run(
    mut events_rx: Receiver<SlideshowEvent>,
    to_fetcher: Sender<FetchImage>,
    reports_tx: Sender<LoadReport>,
    mut outcome_rx: Receiver<FetchOutcome>,
    cancel: CancellationToken,
) -> Result<bool> {
    let mut finished = false;

    loop {
        select! {
            _ = cancel.cancelled() => break,

            maybe = events_rx.recv() => {
                let Some(event) = maybe else { break };
                match event {
                    SlideshowEvent::TimeUpdate(remaining) => {
                        println!("  {:02}:{:02}", remaining / 60, remaining % 60);
                    }
                    SlideshowEvent::ImageChanged { index, url } => {
                        println!("showing image {}: {url}", index + 1);
                        let _ = to_fetcher.send(FetchImage { index, url }).await;
                    }
                    SlideshowEvent::NextActionEnabled(true) => {
                        finished = true;
                        break;
                    }
                    SlideshowEvent::NextActionEnabled(false) => {}
                    SlideshowEvent::LoadError(message) => {
                        println!("{message}");
                    }
                }
            }

            Some(outcome) = outcome_rx.recv() => {
                match outcome {
                    FetchOutcome::Loaded { index, bytes } => {
                        debug!(index, bytes, "image rendered");
                        let _ = reports_tx.send(LoadReport::Success { index }).await;
                    }
                    FetchOutcome::Failed { index, url } => {
                        warn!(index, url = %url, "image failed to render");
                        let _ = reports_tx.send(LoadReport::Failure { index }).await;
                    }
                }
            }
        }
    }
    Ok(finished)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::sync::mpsc;

    #[tokio::test]
    async fn forwards_images_and_reports_finish() {
        let (events_tx, events_rx) = mpsc::channel(8);
        let (fetch_tx, mut fetch_rx) = mpsc::channel(8);
        let (reports_tx, _reports_rx) = mpsc::channel(8);
        let (_outcome_tx, outcome_rx) = mpsc::channel(8);
        let cancel = CancellationToken::new();

        let handle = tokio::spawn(run(events_rx, fetch_tx, reports_tx, outcome_rx, cancel));

        events_tx
            .send(SlideshowEvent::ImageChanged {
                index: 0,
                url: "https://cataas.com/cat?r=1".to_string(),
            })
            .await
            .unwrap();
        events_tx.send(SlideshowEvent::TimeUpdate(3)).await.unwrap();
        events_tx
            .send(SlideshowEvent::NextActionEnabled(true))
            .await
            .unwrap();

        let request = fetch_rx.recv().await.unwrap();
        assert_eq!(request.index, 0);

        let finished = handle.await.unwrap().unwrap();
        assert!(finished);
    }

    #[tokio::test]
    async fn relays_fetch_failures_as_load_reports() {
        let (_events_tx, events_rx) = mpsc::channel(8);
        let (fetch_tx, _fetch_rx) = mpsc::channel(8);
        let (reports_tx, mut reports_rx) = mpsc::channel(8);
        let (outcome_tx, outcome_rx) = mpsc::channel(8);
        let cancel = CancellationToken::new();

        let handle = tokio::spawn(run(
            events_rx,
            fetch_tx,
            reports_tx,
            outcome_rx,
            cancel.clone(),
        ));

        outcome_tx
            .send(FetchOutcome::Failed {
                index: 2,
                url: "https://cataas.com/cat?r=9".to_string(),
            })
            .await
            .unwrap();

        let report = reports_rx.recv().await.unwrap();
        assert_eq!(report, LoadReport::Failure { index: 2 });

        cancel.cancel();
        let finished = handle.await.unwrap().unwrap();
        assert!(!finished);
    }

    #[tokio::test]
    async fn interrupted_session_is_not_finished() {
        let (events_tx, events_rx) = mpsc::channel(8);
        let (fetch_tx, _fetch_rx) = mpsc::channel(8);
        let (reports_tx, _reports_rx) = mpsc::channel(8);
        let (_outcome_tx, outcome_rx) = mpsc::channel(8);
        let cancel = CancellationToken::new();

        let handle = tokio::spawn(run(events_rx, fetch_tx, reports_tx, outcome_rx, cancel));

        events_tx.send(SlideshowEvent::TimeUpdate(5)).await.unwrap();
        drop(events_tx);

        let finished = handle.await.unwrap().unwrap();
        assert!(!finished);
    }
}
