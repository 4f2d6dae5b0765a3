use std::path::{Path, PathBuf};
use std::sync::Mutex;

use anyhow::Result;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::error::Error;

/// Shown in place of a caption when a session ran without one.
pub const NO_CAPTION: &str = "no caption";

/// One persisted record of a completed slideshow session. Immutable once
/// appended. Field names match the wire format of the history slot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistoryEntry {
    pub text: String,
    pub quantity: u32,
    /// Epoch milliseconds at append time.
    pub timestamp: i64,
    #[serde(rename = "interactionNumber")]
    pub interaction_number: u32,
}

impl HistoryEntry {
    pub fn display_text(&self) -> &str {
        if self.text.is_empty() {
            NO_CAPTION
        } else {
            &self.text
        }
    }

    pub fn quantity_text(&self) -> String {
        let plural = if self.quantity == 1 { "" } else { "s" };
        format!("{} image{plural}", self.quantity)
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        DateTime::from_timestamp_millis(self.timestamp).unwrap_or(DateTime::UNIX_EPOCH)
    }
}

/// A single named slot of opaque string storage backing the history list.
pub trait HistorySlot: Send + Sync {
    /// `Ok(None)` when the slot has never been written.
    fn read(&self) -> Result<Option<String>>;
    fn write(&self, payload: &str) -> Result<()>;
    fn clear(&self) -> Result<()>;
}

/// Production backend: one file on local disk.
#[derive(Debug)]
pub struct FileSlot {
    path: PathBuf,
}

impl FileSlot {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl HistorySlot for FileSlot {
    fn read(&self) -> Result<Option<String>> {
        match std::fs::read_to_string(&self.path) {
            Ok(raw) => Ok(Some(raw)),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(err) => Err(Error::Io(err).into()),
        }
    }

    fn write(&self, payload: &str) -> Result<()> {
        if let Some(parent) = self.path.parent()
            && !parent.as_os_str().is_empty()
        {
            std::fs::create_dir_all(parent).map_err(Error::Io)?;
        }
        std::fs::write(&self.path, payload).map_err(Error::Io)?;
        Ok(())
    }

    fn clear(&self) -> Result<()> {
        match std::fs::remove_file(&self.path) {
            Ok(()) => Ok(()),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(err) => Err(Error::Io(err).into()),
        }
    }
}

/// Append-only, load-all log of past sessions, persisted as one serialized
/// array in the injected slot.
///
/// Appends are read-modify-write over the whole slot, so the store serializes
/// them behind a mutex; concurrent appenders never lose an entry and
/// sequence numbers stay dense.
pub struct HistoryStore {
    slot: Box<dyn HistorySlot>,
    lock: Mutex<()>,
}

impl HistoryStore {
    pub fn new(slot: Box<dyn HistorySlot>) -> Self {
        Self {
            slot,
            lock: Mutex::new(()),
        }
    }

    pub fn at_path(path: impl AsRef<Path>) -> Self {
        Self::new(Box::new(FileSlot::new(path.as_ref())))
    }

    /// Appends an immutable entry stamped with the current time and the next
    /// 1-based sequence number, then rewrites the whole slot.
    pub fn append(&self, caption: &str, image_count: u32) -> Result<HistoryEntry> {
        let _guard = self.lock.lock().unwrap_or_else(|poison| poison.into_inner());
        let mut entries = self.decode();
        let entry = HistoryEntry {
            text: caption.to_string(),
            quantity: image_count,
            timestamp: Utc::now().timestamp_millis(),
            interaction_number: entries.len() as u32 + 1,
        };
        entries.push(entry.clone());
        let payload = serde_json::to_string(&entries).map_err(Error::History)?;
        self.slot.write(&payload)?;
        debug!(
            interaction = entry.interaction_number,
            images = entry.quantity,
            "history entry appended"
        );
        Ok(entry)
    }

    /// All entries in insertion order. An unreadable or corrupt slot is
    /// treated as empty history, never as an error.
    pub fn get_all(&self) -> Vec<HistoryEntry> {
        let _guard = self.lock.lock().unwrap_or_else(|poison| poison.into_inner());
        self.decode()
    }

    pub fn clear(&self) -> Result<()> {
        let _guard = self.lock.lock().unwrap_or_else(|poison| poison.into_inner());
        self.slot.clear()
    }

    pub fn has_history(&self) -> bool {
        !self.get_all().is_empty()
    }

    pub fn total_interactions(&self) -> usize {
        self.get_all().len()
    }

    pub fn total_images_viewed(&self) -> u64 {
        self.get_all()
            .iter()
            .map(|entry| u64::from(entry.quantity))
            .sum()
    }

    fn decode(&self) -> Vec<HistoryEntry> {
        match self.slot.read() {
            Ok(Some(raw)) => serde_json::from_str(&raw).unwrap_or_else(|err| {
                warn!(error = %err, "history slot is corrupt; treating as empty");
                Vec::new()
            }),
            Ok(None) => Vec::new(),
            Err(err) => {
                warn!(error = %err, "history slot is unreadable; treating as empty");
                Vec::new()
            }
        }
    }
}
