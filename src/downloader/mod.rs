// Downloader module - extraction driver, progress relay and session state

pub mod errors;
pub mod format_selector;
pub mod models;
pub mod orchestrator;
pub mod progress;
pub mod relay;
pub mod session;
pub mod traits;
pub mod utils;
pub mod ytdlp;

pub use errors::DownloadError;
pub use models::{DownloadOptions, DownloadRequest, JobState, ProgressEvent, QualityPreset, VideoInfo};
pub use orchestrator::Downloader;
pub use relay::WorkerRelay;
pub use session::{DownloadSession, SessionConfig};
pub use traits::{JobSpawner, MediaExtractor};
