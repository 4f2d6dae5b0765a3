use telecat::events::{LoadReport, SlideshowEvent};
use telecat::playlist::{TokenSource, UrlPlan};
use telecat::tasks::slideshow::{self, SlideshowSession};
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

fn plan(total: u32, caption: &str) -> UrlPlan {
    UrlPlan::build(
        "https://cataas.com",
        400,
        400,
        total,
        caption,
        &mut TokenSource::with_seed(42),
    )
}

#[tokio::test(start_paused = true)]
async fn driver_emits_full_session_and_stops() {
    let (events_tx, mut events_rx) = mpsc::channel::<SlideshowEvent>(64);
    let (_reports_tx, reports_rx) = mpsc::channel::<LoadReport>(4);
    let cancel = CancellationToken::new();

    let handle = tokio::spawn(slideshow::run(
        SlideshowSession::new(),
        plan(3, "hi"),
        reports_rx,
        events_tx,
        cancel,
    ));

    let mut events = Vec::new();
    while let Some(event) = events_rx.recv().await {
        events.push(event);
    }
    handle.await.unwrap().unwrap();

    let times: Vec<u32> = events
        .iter()
        .filter_map(|event| match event {
            SlideshowEvent::TimeUpdate(t) => Some(*t),
            _ => None,
        })
        .collect();
    assert_eq!(times, (0..=12).rev().collect::<Vec<u32>>());

    let indices: Vec<usize> = events
        .iter()
        .filter_map(|event| match event {
            SlideshowEvent::ImageChanged { index, .. } => Some(*index),
            _ => None,
        })
        .collect();
    assert_eq!(indices, vec![0, 1, 2]);

    assert_eq!(
        events.last(),
        Some(&SlideshowEvent::NextActionEnabled(true))
    );
}

#[tokio::test(start_paused = true)]
async fn teardown_stops_the_countdown_without_finishing() {
    let (events_tx, mut events_rx) = mpsc::channel::<SlideshowEvent>(64);
    let (_reports_tx, reports_rx) = mpsc::channel::<LoadReport>(4);
    let cancel = CancellationToken::new();

    let handle = tokio::spawn(slideshow::run(
        SlideshowSession::new(),
        plan(5, ""),
        reports_rx,
        events_tx,
        cancel.clone(),
    ));

    // Let a few ticks through, then tear down.
    let mut events = Vec::new();
    while events
        .iter()
        .filter(|e| matches!(e, SlideshowEvent::TimeUpdate(_)))
        .count()
        < 4
    {
        events.push(events_rx.recv().await.expect("driver closed early"));
    }
    cancel.cancel();
    // Teardown must be safe to repeat.
    cancel.cancel();

    while let Some(event) = events_rx.recv().await {
        events.push(event);
    }
    handle.await.unwrap().unwrap();

    assert!(
        !events.contains(&SlideshowEvent::NextActionEnabled(true)),
        "torn-down session must not report completion"
    );
}

#[tokio::test(start_paused = true)]
async fn load_failures_surface_without_altering_the_countdown() {
    let (events_tx, mut events_rx) = mpsc::channel::<SlideshowEvent>(64);
    let (reports_tx, reports_rx) = mpsc::channel::<LoadReport>(4);
    let cancel = CancellationToken::new();

    let handle = tokio::spawn(slideshow::run(
        SlideshowSession::new(),
        plan(2, ""),
        reports_rx,
        events_tx,
        cancel,
    ));

    reports_tx
        .send(LoadReport::Failure { index: 0 })
        .await
        .unwrap();

    let mut events = Vec::new();
    while let Some(event) = events_rx.recv().await {
        events.push(event);
    }
    handle.await.unwrap().unwrap();

    assert!(
        events
            .iter()
            .any(|e| matches!(e, SlideshowEvent::LoadError(_))),
        "load failure must surface a generic error event"
    );

    // The countdown ran to completion regardless of the failure.
    let times: Vec<u32> = events
        .iter()
        .filter_map(|event| match event {
            SlideshowEvent::TimeUpdate(t) => Some(*t),
            _ => None,
        })
        .collect();
    assert_eq!(times, (0..=8).rev().collect::<Vec<u32>>());
    assert_eq!(
        events.last(),
        Some(&SlideshowEvent::NextActionEnabled(true))
    );
}

#[tokio::test(start_paused = true)]
async fn successful_load_reports_are_acknowledged_silently() {
    let (events_tx, mut events_rx) = mpsc::channel::<SlideshowEvent>(64);
    let (reports_tx, reports_rx) = mpsc::channel::<LoadReport>(4);
    let cancel = CancellationToken::new();

    let handle = tokio::spawn(slideshow::run(
        SlideshowSession::new(),
        plan(1, ""),
        reports_rx,
        events_tx,
        cancel,
    ));

    reports_tx
        .send(LoadReport::Success { index: 0 })
        .await
        .unwrap();

    let mut events = Vec::new();
    while let Some(event) = events_rx.recv().await {
        events.push(event);
    }
    handle.await.unwrap().unwrap();

    assert!(
        !events
            .iter()
            .any(|e| matches!(e, SlideshowEvent::LoadError(_)))
    );
}
