//! Scoped handle for the `.part` file a tile is streamed into.

use std::fs::File;
use std::io;
use std::path::{Path, PathBuf};

use tracing::{debug, warn};

use crate::cancel::CancelToken;
use crate::error::FetchError;
use crate::util::part_path;

/// Temp file beside a destination path.
///
/// While alive the path is registered with the cancel token, so an interrupt
/// can remove it. Dropping the handle removes the temp file unless it was
/// committed or kept.
#[derive(Debug)]
pub struct PartFile {
    path: PathBuf,
    dest: PathBuf,
    cancel: CancelToken,
    armed: bool,
}

impl PartFile {
    /// Creates (or truncates) `<dest>.part` and registers it as in flight.
    pub fn create(dest: &Path, cancel: &CancelToken) -> io::Result<(Self, File)> {
        let path = part_path(dest);
        let file = File::create(&path)?;
        cancel.register(&path);
        let part = Self {
            path,
            dest: dest.to_path_buf(),
            cancel: cancel.clone(),
            armed: true,
        };
        Ok((part, file))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Moves the temp file onto the destination, replacing any existing file.
    ///
    /// Fails with [`FetchError::Cancelled`] once an interrupt has been seen.
    pub fn commit(mut self) -> Result<PathBuf, FetchError> {
        let mut slot = self.cancel.slot();
        if self.cancel.is_cancelled() {
            return Err(FetchError::Cancelled);
        }
        std::fs::rename(&self.path, &self.dest).map_err(|source| FetchError::Io {
            path: self.dest.clone(),
            source,
        })?;
        *slot = None;
        drop(slot);
        self.armed = false;
        Ok(std::mem::take(&mut self.dest))
    }

    /// Leaves the temp file on disk.
    pub fn keep(mut self) -> PathBuf {
        self.armed = false;
        self.cancel.release(&self.path);
        warn!(path = %self.path.display(), "leaving partial download on disk");
        std::mem::take(&mut self.path)
    }
}

impl Drop for PartFile {
    fn drop(&mut self) {
        if !self.armed {
            return;
        }
        self.cancel.release(&self.path);
        if !self.path.exists() {
            return;
        }
        match std::fs::remove_file(&self.path) {
            Ok(()) => debug!(path = %self.path.display(), "removed partial download"),
            Err(e) => {
                warn!(path = %self.path.display(), error = %e, "failed to remove partial download")
            }
        }
    }
}
