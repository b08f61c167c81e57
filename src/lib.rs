pub mod downloader;

pub use downloader::errors::DownloadError;
pub use downloader::models::{
    DownloadOptions, DownloadRequest, JobState, ProgressEvent, QualityPreset, VideoInfo,
};
pub use downloader::orchestrator::Downloader;
pub use downloader::session::{DownloadSession, SessionConfig};
