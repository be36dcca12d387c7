//! Debug artifact sink for raw model responses
//!
//! Every generation call saves the raw response before parsing, so that a
//! malformed payload can be inspected after the fact. Saving is
//! fire-and-forget: a sink failure is logged and never reaches the caller.

use std::fs;
use std::path::{Path, PathBuf};

use tracing::{debug, warn};

use crate::llm::pretty_or_verbatim;

/// Destination for raw model responses
pub trait DebugSink: Send + Sync {
    /// Record one raw response for the given operation kind and provider
    fn save(&self, kind: &str, provider: &str, content: &str);
}

/// Writes responses as timestamped files under a debug directory
pub struct FileDebugSink {
    dir: PathBuf,
}

impl FileDebugSink {
    /// Create a sink writing into the given directory
    ///
    /// The directory is created lazily on first save, so constructing a
    /// sink for a read-only location is harmless until it is used.
    pub fn new(dir: impl AsRef<Path>) -> Self {
        Self {
            dir: dir.as_ref().to_path_buf(),
        }
    }
}

impl DebugSink for FileDebugSink {
    fn save(&self, kind: &str, provider: &str, content: &str) {
        if let Err(e) = fs::create_dir_all(&self.dir) {
            warn!(error = %e, "Failed to create debug directory");
            return;
        }

        let timestamp = chrono::Local::now().format("%Y%m%d_%H%M%S");
        let filename = format!("{}_{}_{}.json", kind, provider.to_lowercase(), timestamp);
        let path = self.dir.join(filename);

        // Pretty-print when the payload parses, verbatim otherwise
        let body = pretty_or_verbatim(content);

        match fs::write(&path, body) {
            Ok(()) => debug!(path = %path.display(), "Saved debug response"),
            Err(e) => warn!(path = %path.display(), error = %e, "Failed to save debug response"),
        }
    }
}

/// Sink that discards everything; used in tests
pub struct NullDebugSink;

impl DebugSink for NullDebugSink {
    fn save(&self, _kind: &str, _provider: &str, _content: &str) {}
}
