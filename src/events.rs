/// Notifications from the form to whoever renders it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FormEvent {
    BeginEnabled(bool),
    CaptionFieldEnabled(bool),
    ConnectivityStatus(bool),
    Notice(String),
}

/// Notifications from the slideshow session to its consumer.
///
/// Per session, `TimeUpdate` values strictly decrease and `ImageChanged`
/// indices strictly increase with at most one event per index.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SlideshowEvent {
    TimeUpdate(u32),
    ImageChanged { index: usize, url: String },
    NextActionEnabled(bool),
    LoadError(String),
}

/// Request from the viewer to the fetcher: pull this slot's image.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchImage {
    pub index: usize,
    pub url: String,
}

/// Result of one image fetch, reported back to the viewer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FetchOutcome {
    Loaded { index: usize, bytes: usize },
    Failed { index: usize, url: String },
}

/// Load success/failure relayed from the viewer into the session driver.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadReport {
    Success { index: usize },
    Failure { index: usize },
}
