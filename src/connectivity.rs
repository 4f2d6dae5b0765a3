use std::path::{Path, PathBuf};
use std::time::Duration;

use tokio::sync::mpsc::UnboundedSender;
use tokio::time::sleep;
use tracing::debug;

use crate::events::FormEvent;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transport {
    Wifi,
    Cellular,
    Ethernet,
}

/// Supplies the set of currently active network transports.
pub trait TransportSource: Send + Sync {
    fn active_transports(&self) -> Vec<Transport>;
}

/// Reads interface state from the kernel's `/sys/class/net` tree: an
/// interface counts when its `operstate` is `up` and its name maps to a
/// known transport. Loopback is ignored.
#[derive(Debug)]
pub struct SysClassNet {
    root: PathBuf,
}

impl SysClassNet {
    pub fn new() -> Self {
        Self::with_root("/sys/class/net")
    }

    pub fn with_root(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }
}

impl Default for SysClassNet {
    fn default() -> Self {
        Self::new()
    }
}

impl TransportSource for SysClassNet {
    fn active_transports(&self) -> Vec<Transport> {
        let Ok(entries) = std::fs::read_dir(&self.root) else {
            return Vec::new();
        };
        let mut transports = Vec::new();
        for entry in entries.filter_map(Result::ok) {
            let name = entry.file_name().to_string_lossy().into_owned();
            let Some(transport) = classify_interface(&name) else {
                continue;
            };
            if operstate_is_up(&entry.path()) {
                debug!(interface = %name, ?transport, "active transport");
                transports.push(transport);
            }
        }
        transports
    }
}

fn operstate_is_up(iface_dir: &Path) -> bool {
    std::fs::read_to_string(iface_dir.join("operstate"))
        .map(|state| state.trim() == "up")
        .unwrap_or(false)
}

fn classify_interface(name: &str) -> Option<Transport> {
    if name == "lo" {
        return None;
    }
    if name.starts_with("wl") {
        Some(Transport::Wifi)
    } else if name.starts_with("ww") {
        Some(Transport::Cellular)
    } else if name.starts_with("en") || name.starts_with("eth") {
        Some(Transport::Ethernet)
    } else {
        None
    }
}

/// Answers whether the host has an active network path over wifi, cellular,
/// or wired. Synchronous and retry-free; callers may re-invoke it.
pub struct ConnectivityProbe {
    source: Box<dyn TransportSource>,
}

impl ConnectivityProbe {
    pub fn new(source: Box<dyn TransportSource>) -> Self {
        Self { source }
    }

    pub fn system() -> Self {
        Self::new(Box::new(SysClassNet::new()))
    }

    pub fn is_online(&self) -> bool {
        !self.source.active_transports().is_empty()
    }
}

/// Connectivity verification worker: waits out the configured delay, probes,
/// and emits a user-facing notice. The caller records the result on the form.
pub async fn verify(
    probe: &ConnectivityProbe,
    delay: Duration,
    events: &UnboundedSender<FormEvent>,
) -> bool {
    sleep(delay).await;
    let online = probe.is_online();
    let notice = if online {
        "connection verified"
    } else {
        "no internet connection"
    };
    let _ = events.send(FormEvent::Notice(notice.to_string()));
    online
}
