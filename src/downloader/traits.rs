// Seams between the orchestrator, the extraction tool and the session

use async_trait::async_trait;
use std::sync::mpsc::Sender;

use super::errors::DownloadError;
use super::models::{DownloadOptions, DownloadRequest, ProgressEvent, VideoInfo};

/// Interface to the external video-extraction tool.
///
/// `probe` fetches metadata without downloading; `download` runs one
/// attempt with a single format selector expression, streaming its progress
/// lines to the worker's stdout as a side effect.
#[async_trait]
pub trait MediaExtractor: Send + Sync {
    /// Name of the tool (for logging)
    fn name(&self) -> &'static str;

    async fn probe(&self, url: &str) -> Result<VideoInfo, DownloadError>;

    fn download(
        &self,
        url: &str,
        selector: &str,
        options: &DownloadOptions,
    ) -> Result<(), DownloadError>;
}

/// Spawns the background worker for one job and wires its classified
/// output into the given event channel. The session only knows this seam,
/// so tests can drive the state machine with a scripted spawner.
pub trait JobSpawner {
    fn spawn(
        &self,
        request: &DownloadRequest,
        events: Sender<ProgressEvent>,
    ) -> Result<(), DownloadError>;
}
