use crate::air::ResourceLocator;
use std::path::PathBuf;

/// Lifecycle of one pipeline item, as seen by a progress display.
#[derive(Debug, Clone)]
pub enum DownloadEvent {
    /// Taken off the channel by the orchestrator
    Received(ResourceLocator),
    /// Version and model metadata resolved, destination chosen
    Resolved {
        model: String,
        version: String,
        directory: PathBuf,
    },
    /// Starting a file transfer; `total_bytes` is the advisory declared size
    FileStarted { name: String, total_bytes: u64 },
    /// Bytes written since the last progress event
    Progress(u64),
    /// A file transfer completed
    FileFinished { name: String },
    /// Primary file and all images downloaded
    Complete {
        locator: ResourceLocator,
        directory: PathBuf,
    },
    /// The item was abandoned
    Failed {
        locator: ResourceLocator,
        reason: String,
    },
}
