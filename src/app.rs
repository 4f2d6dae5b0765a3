use anyhow::{Context, Result};
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use crate::config::Configuration;
use crate::events::{FetchImage, FetchOutcome, LoadReport, SlideshowEvent};
use crate::form::FormData;
use crate::history::HistoryStore;
use crate::playlist::{TokenSource, UrlPlan};
use crate::tasks::{fetcher, slideshow, viewer};

/// Runs one slideshow session end to end: builds the URL plan from the form
/// snapshot, wires the session driver, fetcher, and viewer together, and
/// records the interaction once the countdown finishes. The session and its
/// scheduler live here, at application scope; ctrl-c is the only teardown
/// path besides normal completion.
pub async fn run(cfg: &Configuration, data: &FormData, store: &HistoryStore) -> Result<()> {
    let count = data
        .image_count()
        .context("form data does not carry a valid image count")?;
    let mut tokens = TokenSource::new();
    let plan = UrlPlan::build(
        &cfg.endpoint,
        cfg.image_width,
        cfg.image_height,
        count,
        data.caption(),
        &mut tokens,
    );

    // Channels (small/bounded)
    let (events_tx, events_rx) = mpsc::channel::<SlideshowEvent>(16); // driver -> viewer
    let (fetch_tx, fetch_rx) = mpsc::channel::<FetchImage>(4); // viewer -> fetcher
    let (outcome_tx, outcome_rx) = mpsc::channel::<FetchOutcome>(4); // fetcher -> viewer
    let (reports_tx, reports_rx) = mpsc::channel::<LoadReport>(4); // viewer -> driver

    let cancel = CancellationToken::new();

    {
        let cancel = cancel.clone();
        tokio::spawn(async move {
            if let Err(err) = tokio::signal::ctrl_c().await {
                warn!("ctrl-c handler failed: {err}");
                return;
            }
            info!("ctrl-c received; tearing down slideshow");
            cancel.cancel();
        });
    }

    let session = slideshow::SlideshowSession::new();
    let driver_task = tokio::spawn(slideshow::run(
        session,
        plan,
        reports_rx,
        events_tx,
        cancel.clone(),
    ));
    let fetch_task = tokio::spawn(fetcher::run(
        fetch_rx,
        outcome_tx,
        cfg.fetch_timeout,
        cancel.clone(),
    ));
    let view_task = tokio::spawn(viewer::run(
        events_rx,
        fetch_tx,
        reports_tx,
        outcome_rx,
        cancel.clone(),
    ));

    let finished = view_task
        .await
        .context("viewer task panicked")?
        .context("viewer task failed")?;

    cancel.cancel();
    let _ = driver_task.await;
    let _ = fetch_task.await;

    if finished {
        let entry = store
            .append(data.caption(), count)
            .context("recording the interaction")?;
        info!(
            interaction = entry.interaction_number,
            images = entry.quantity,
            "interaction recorded"
        );
        println!(
            "recorded interaction #{} ({})",
            entry.interaction_number,
            entry.quantity_text()
        );
    } else {
        warn!("slideshow interrupted before finishing; nothing recorded");
    }
    Ok(())
}
