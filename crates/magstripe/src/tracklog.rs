use std::fs::OpenOptions;
use std::io::Write;
use std::path::{Path, PathBuf};

use magstripe_frame::Frame;
use tracing::warn;

/// Append-only log of raw frame payloads, one line per frame.
#[derive(Debug, Clone)]
pub struct TrackLog {
    path: PathBuf,
}

impl TrackLog {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Append `text` plus a newline. The file is opened per call so an
    /// external rotation takes effect on the next frame.
    pub fn append_line(&self, text: &str) -> std::io::Result<()> {
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)?;
        writeln!(file, "{text}")
    }

    /// Log a frame's payload; failures are reported and otherwise ignored.
    pub fn record(&self, frame: &Frame) {
        if let Err(err) = self.append_line(&frame.text()) {
            warn!(path = ?self.path(), %err, "failed to append to track log");
        }
    }
}
