use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};

use tracing::{debug, warn};

/// Cancellation shared by the download loop, the fetch body reader and the interrupt handler.
///
/// Besides the flag it tracks the `.part` file currently being written, so an
/// interrupt can remove it even while the fetching thread is blocked on a read.
#[derive(Debug, Clone, Default)]
pub struct CancelToken {
    flag: Arc<AtomicBool>,
    in_flight: Arc<Mutex<Option<PathBuf>>>,
}

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.flag.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.flag.load(Ordering::SeqCst)
    }

    /// Path of the temp file being written, if any.
    pub fn in_flight(&self) -> Option<PathBuf> {
        self.slot().clone()
    }

    /// Sets the flag and removes the in-flight temp file.
    ///
    /// Returns the removed path. Holds the slot lock while removing, so a
    /// concurrent commit either finishes first or observes the cancellation.
    pub fn interrupt(&self) -> Option<PathBuf> {
        let mut slot = self.slot();
        self.cancel();
        let path = slot.take()?;
        match std::fs::remove_file(&path) {
            Ok(()) => {
                debug!(path = %path.display(), "removed partial download");
                Some(path)
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => None,
            Err(e) => {
                warn!(path = %path.display(), error = %e, "failed to remove partial download");
                None
            }
        }
    }

    pub(crate) fn slot(&self) -> MutexGuard<'_, Option<PathBuf>> {
        self.in_flight.lock().unwrap_or_else(|e| e.into_inner())
    }

    pub(crate) fn register(&self, path: &Path) {
        *self.slot() = Some(path.to_path_buf());
    }

    pub(crate) fn release(&self, path: &Path) {
        let mut slot = self.slot();
        if slot.as_deref() == Some(path) {
            *slot = None;
        }
    }
}
