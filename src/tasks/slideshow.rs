use anyhow::Result;
use tokio::select;
use tokio::sync::mpsc::{Receiver, Sender};
use tokio::time::{Duration, Instant, MissedTickBehavior, interval_at};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use crate::events::{LoadReport, SlideshowEvent};
use crate::playlist::UrlPlan;

/// Every image gets this many seconds of screen time.
pub const SECONDS_PER_IMAGE: u32 = 4;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Idle,
    Running,
    /// Terminal; the countdown never restarts once it reaches zero.
    Finished,
}

/// One run of the timed image-display flow, from initialize to Finished.
///
/// The session is pure state: `initialize` and `tick` return the events the
/// transition produced and the async driver in [`run`] is the only thing
/// that touches the clock. The session outlives any view of it; only
/// explicit teardown of the driver releases the tick scheduler.
#[derive(Debug)]
pub struct SlideshowSession {
    total_images: u32,
    total_seconds: u32,
    remaining_seconds: u32,
    current_index: usize,
    caption: String,
    urls: Vec<String>,
    phase: Phase,
}

impl SlideshowSession {
    pub fn new() -> Self {
        Self {
            total_images: 0,
            total_seconds: 0,
            remaining_seconds: 0,
            current_index: 0,
            caption: String::new(),
            urls: Vec::new(),
            phase: Phase::Idle,
        }
    }

    /// Idle -> Running. Adopts the URL plan, computes the countdown length,
    /// and returns the initial snapshot events: the full time remaining and
    /// the first image. Ignored unless the session is Idle.
    pub fn initialize(&mut self, plan: UrlPlan) -> Vec<SlideshowEvent> {
        if self.phase != Phase::Idle || plan.urls.is_empty() {
            return Vec::new();
        }
        self.total_images = plan.urls.len() as u32;
        self.total_seconds = self.total_images * SECONDS_PER_IMAGE;
        self.remaining_seconds = self.total_seconds;
        self.current_index = 0;
        self.caption = plan.caption;
        self.urls = plan.urls;
        self.phase = Phase::Running;
        vec![
            SlideshowEvent::TimeUpdate(self.total_seconds),
            SlideshowEvent::ImageChanged {
                index: 0,
                url: self.urls[0].clone(),
            },
        ]
    }

    /// Advances the countdown by one second and returns the events that
    /// second produced. The image index is derived from elapsed time, never
    /// counted independently, so a tick can only advance it forward and only
    /// while it stays inside the plan. The tick that reaches zero makes the
    /// Finished transition and enables the next action.
    pub fn tick(&mut self) -> Vec<SlideshowEvent> {
        if self.phase != Phase::Running {
            return Vec::new();
        }
        self.remaining_seconds -= 1;
        let mut events = vec![SlideshowEvent::TimeUpdate(self.remaining_seconds)];

        let elapsed = self.total_seconds - self.remaining_seconds;
        let expected = (elapsed / SECONDS_PER_IMAGE) as usize;
        if expected > self.current_index && expected < self.total_images as usize {
            self.current_index = expected;
            events.push(SlideshowEvent::ImageChanged {
                index: expected,
                url: self.urls[expected].clone(),
            });
        }

        if self.remaining_seconds == 0 {
            self.phase = Phase::Finished;
            events.push(SlideshowEvent::NextActionEnabled(true));
        }
        events
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    /// True only in the Finished state; the proceed-to-history action is
    /// gated on this.
    pub fn is_finished(&self) -> bool {
        self.phase == Phase::Finished
    }

    pub fn remaining_seconds(&self) -> u32 {
        self.remaining_seconds
    }

    pub fn total_seconds(&self) -> u32 {
        self.total_seconds
    }

    pub fn total_images(&self) -> u32 {
        self.total_images
    }

    pub fn current_index(&self) -> usize {
        self.current_index
    }

    pub fn caption(&self) -> &str {
        &self.caption
    }

    pub fn current_image_url(&self) -> Option<&str> {
        self.urls.get(self.current_index).map(String::as_str)
    }

    /// Remaining time as `MM:SS`.
    pub fn formatted_time(&self) -> String {
        format!(
            "{:02}:{:02}",
            self.remaining_seconds / 60,
            self.remaining_seconds % 60
        )
    }

    /// The countdown keeps running while the owning view is backgrounded, so
    /// pausing is deliberately a no-op.
    pub fn pause(&self) {}

    /// True when a stopped driver should be restarted: the session is still
    /// mid-countdown. Normal completion and teardown both return false.
    pub fn resume_needed(&self) -> bool {
        self.phase == Phase::Running && self.remaining_seconds > 0
    }

    /// A failed image load surfaces a generic notice; the countdown state is
    /// untouched and the slideshow continues regardless.
    pub fn on_image_load_error(&self) -> SlideshowEvent {
        SlideshowEvent::LoadError("cat image failed to load".to_string())
    }

    pub fn on_image_load_success(&self) {
        // Nothing to update; the countdown owns all visible state.
    }
}

impl Default for SlideshowSession {
    fn default() -> Self {
        Self::new()
    }
}

/// Drives the session at one tick per second until it finishes or is torn
/// down. Load reports from the viewer are folded in between ticks; ticks are
/// never re-entered, so event ordering per session is exactly the order the
/// session produced.
pub async fn run(
    mut session: SlideshowSession,
    plan: UrlPlan,
    mut reports_rx: Receiver<LoadReport>,
    events_tx: Sender<SlideshowEvent>,
    cancel: CancellationToken,
) -> Result<()> {
    for event in session.initialize(plan) {
        if events_tx.send(event).await.is_err() {
            return Ok(());
        }
    }
    info!(
        images = session.total_images(),
        seconds = session.total_seconds(),
        "slideshow started"
    );

    let mut ticker = interval_at(
        Instant::now() + Duration::from_secs(1),
        Duration::from_secs(1),
    );
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        select! {
            _ = cancel.cancelled() => {
                debug!("teardown requested; releasing tick scheduler");
                break;
            }

            _ = ticker.tick() => {
                for event in session.tick() {
                    if events_tx.send(event).await.is_err() {
                        return Ok(());
                    }
                }
                if session.is_finished() {
                    info!("slideshow finished");
                    break;
                }
            }

            Some(report) = reports_rx.recv() => {
                match report {
                    LoadReport::Success { index } => {
                        debug!(index, "image load confirmed");
                        session.on_image_load_success();
                    }
                    LoadReport::Failure { index } => {
                        debug!(index, "image load failed");
                        let _ = events_tx.send(session.on_image_load_error()).await;
                    }
                }
            }
        }
    }
    Ok(())
}
