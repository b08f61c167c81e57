// Common data models for the downloader

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// User-facing coarse quality selector
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum QualityPreset {
    Best,
    Worst,
    P720,
    P480,
    Audio,
}

impl QualityPreset {
    /// Parse a CLI quality token. Unknown tokens fall back to Best,
    /// matching how the worker treats an absent argument.
    pub fn from_token(token: &str) -> Self {
        match token {
            "best" => Self::Best,
            "worst" => Self::Worst,
            "720p" => Self::P720,
            "480p" => Self::P480,
            "audio" => Self::Audio,
            _ => Self::Best,
        }
    }

    pub fn as_token(&self) -> &'static str {
        match self {
            Self::Best => "best",
            Self::Worst => "worst",
            Self::P720 => "720p",
            Self::P480 => "480p",
            Self::Audio => "audio",
        }
    }

    pub fn is_audio(&self) -> bool {
        matches!(self, Self::Audio)
    }
}

impl Default for QualityPreset {
    fn default() -> Self {
        Self::Best
    }
}

/// One download job: lives for a single worker invocation
#[derive(Debug, Clone)]
pub struct DownloadRequest {
    pub url: String,
    pub output_dir: PathBuf,
    pub quality: QualityPreset,
}

/// Options handed to the extraction tool for one attempt
#[derive(Debug, Clone)]
pub struct DownloadOptions {
    pub output_dir: PathBuf,
    pub quality: QualityPreset,
    /// Extract audio track to mp3 (Audio preset)
    pub extract_audio: bool,
    /// Container for merged video+audio output
    pub merge_format: Option<String>,
}

impl DownloadOptions {
    pub fn for_request(request: &DownloadRequest) -> Self {
        let audio = request.quality.is_audio();
        Self {
            output_dir: request.output_dir.clone(),
            quality: request.quality,
            extract_audio: audio,
            merge_format: if audio { None } else { Some("mp4".to_string()) },
        }
    }
}

impl Default for DownloadOptions {
    fn default() -> Self {
        Self {
            output_dir: default_videos_dir(),
            quality: QualityPreset::Best,
            extract_audio: false,
            merge_format: Some("mp4".to_string()),
        }
    }
}

/// Platform-standard videos folder, falling back to the current directory
pub fn default_videos_dir() -> PathBuf {
    dirs::video_dir()
        .or_else(dirs::home_dir)
        .unwrap_or_else(|| PathBuf::from("."))
}

/// Metadata from the pre-download probe
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VideoInfo {
    pub title: String,
    /// Formatted mm:ss, empty when unknown
    pub duration: String,
    pub uploader: String,
}

/// Typed event produced by the progress relay, consumed by the presentation
/// layer. Single-producer, single-consumer, transient.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ProgressEvent {
    Percentage {
        percent: f32,
        /// Total size as reported, e.g. "10.00MiB"
        total: Option<String>,
        /// Transfer speed as reported, e.g. "1.20MiB/s"
        speed: Option<String>,
    },
    /// Milestone line forwarded verbatim (title, duration, banners)
    Status(String),
    Completed,
    Failed(String),
}

/// Presentation-side job lifecycle
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum JobState {
    Idle,
    Submitting,
    Running,
    Completed,
    Failed,
}

impl JobState {
    pub fn is_active(&self) -> bool {
        matches!(self, Self::Submitting | Self::Running)
    }
}
