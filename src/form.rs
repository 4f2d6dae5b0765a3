use tokio::sync::mpsc::UnboundedSender;

use crate::events::FormEvent;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CaptionChoice {
    /// Nothing chosen yet; the form is never valid in this state.
    #[default]
    Unset,
    Yes,
    No,
}

/// Snapshot of the form fields taken when the user begins a slideshow.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FormData {
    pub count: String,
    pub caption_choice: CaptionChoice,
    pub caption_text: String,
}

impl FormData {
    /// The image count, when the raw field parses as a positive integer.
    pub fn image_count(&self) -> Option<u32> {
        self.count.trim().parse::<u32>().ok().filter(|n| *n >= 1)
    }

    /// Caption to embed in image URLs; empty unless captions were enabled.
    pub fn caption(&self) -> &str {
        match self.caption_choice {
            CaptionChoice::Yes => &self.caption_text,
            _ => "",
        }
    }
}

/// Holds and validates the user-entered fields plus the verified-connectivity
/// flag, and derives whether the begin action is enabled.
///
/// Purely synchronous; every mutation re-runs validation and pushes the
/// derived enablement over the event channel so the consumer never has to
/// poll.
#[derive(Debug)]
pub struct FormState {
    count: String,
    caption_choice: CaptionChoice,
    caption_text: String,
    connectivity_verified: bool,
    events: UnboundedSender<FormEvent>,
}

impl FormState {
    pub fn new(events: UnboundedSender<FormEvent>) -> Self {
        Self {
            count: String::new(),
            caption_choice: CaptionChoice::Unset,
            caption_text: String::new(),
            connectivity_verified: false,
            events,
        }
    }

    pub fn set_count(&mut self, text: impl Into<String>) {
        self.count = text.into();
        self.revalidate();
    }

    pub fn set_caption_choice(&mut self, choice: CaptionChoice) {
        self.caption_choice = choice;
        let enabled = choice == CaptionChoice::Yes;
        if !enabled {
            self.caption_text.clear();
        }
        let _ = self.events.send(FormEvent::CaptionFieldEnabled(enabled));
        self.revalidate();
    }

    pub fn set_caption_text(&mut self, text: impl Into<String>) {
        self.caption_text = text.into();
        self.revalidate();
    }

    /// Records whether the user has explicitly run the connectivity check.
    pub fn set_connectivity_verified(&mut self, verified: bool) {
        self.connectivity_verified = verified;
        let _ = self.events.send(FormEvent::ConnectivityStatus(verified));
        self.revalidate();
    }

    pub fn is_valid(&self) -> bool {
        if self.parsed_count().is_none() {
            return false;
        }
        match self.caption_choice {
            CaptionChoice::Unset => false,
            CaptionChoice::Yes => !self.caption_text.trim().is_empty(),
            CaptionChoice::No => true,
        }
    }

    pub fn begin_enabled(&self) -> bool {
        self.is_valid() && self.connectivity_verified
    }

    pub fn connectivity_verified(&self) -> bool {
        self.connectivity_verified
    }

    pub fn form_data(&self) -> FormData {
        FormData {
            count: self.count.clone(),
            caption_choice: self.caption_choice,
            caption_text: self.caption_text.clone(),
        }
    }

    /// Emits the single highest-priority user-facing validation message, or
    /// nothing when the form is ready to begin.
    pub fn report_validation_error(&self) -> Option<String> {
        let message = if self.parsed_count().is_none() {
            "image count must be a positive whole number"
        } else if self.caption_choice == CaptionChoice::Unset {
            "choose whether the images should carry a caption"
        } else if self.caption_choice == CaptionChoice::Yes && self.caption_text.trim().is_empty()
        {
            "caption text is required when captions are enabled"
        } else if !self.connectivity_verified {
            "verify connectivity before beginning"
        } else {
            return None;
        };
        let _ = self.events.send(FormEvent::Notice(message.to_string()));
        Some(message.to_string())
    }

    fn parsed_count(&self) -> Option<u32> {
        self.count.trim().parse::<u32>().ok().filter(|n| *n >= 1)
    }

    fn revalidate(&self) {
        let _ = self
            .events
            .send(FormEvent::BeginEnabled(self.begin_enabled()));
    }
}
