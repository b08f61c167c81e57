// Error types for the download driver

use std::fmt;

#[derive(Debug, Clone)]
pub enum DownloadError {
    /// Empty URL or URL without an http(s) scheme - rejected before spawning anything
    InvalidUrl(String),

    /// The requested format selector does not resolve for this video.
    /// Triggers the fallback sequence; only fatal once all fallbacks fail.
    FormatUnavailable(String),

    /// yt-dlp (or ffmpeg) could not be located
    ToolNotFound(String),

    /// Extraction or network failure - surfaced immediately, no fallback
    ExtractionFailed(String),

    /// Every format selector in the fallback plan was tried and failed.
    /// Carries the attempted expressions in order.
    ExhaustedFallbacks(Vec<String>),

    /// The worker subprocess died or its output could not be supervised
    WorkerCrash(String),
}

impl fmt::Display for DownloadError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidUrl(url) => write!(f, "Invalid URL: {}", url),
            Self::FormatUnavailable(selector) => {
                write!(f, "Requested format is not available: {}", selector)
            }
            Self::ToolNotFound(tool) => write!(f, "Tool not found: {}", tool),
            Self::ExtractionFailed(msg) => write!(f, "Extraction failed: {}", msg),
            Self::ExhaustedFallbacks(attempted) => write!(
                f,
                "All fallback formats failed. This video may be restricted or unavailable. \
                 Attempted: {}",
                attempted.join(", ")
            ),
            Self::WorkerCrash(msg) => write!(f, "Worker failed: {}", msg),
        }
    }
}

impl std::error::Error for DownloadError {}

impl DownloadError {
    /// Whether this failure class should trigger the format fallback sequence
    pub fn is_format_unavailable(&self) -> bool {
        matches!(self, Self::FormatUnavailable(_))
    }
}

/// Classify raw yt-dlp stderr into the error taxonomy.
///
/// The one load-bearing rule: "Requested format is not available" marks the
/// attempt as retryable with a looser selector. Everything else is terminal.
pub fn classify_stderr(stderr: &str, selector: &str) -> DownloadError {
    if stderr.contains("Requested format is not available") {
        return DownloadError::FormatUnavailable(selector.to_string());
    }

    if stderr.contains("No such file")
        || stderr.contains("command not found")
        || stderr.contains("ffmpeg not found")
    {
        return DownloadError::ToolNotFound(first_meaningful_line(stderr));
    }

    DownloadError::ExtractionFailed(first_meaningful_line(stderr))
}

/// Pick the most useful line out of a stderr dump: prefer explicit ERROR:
/// lines, otherwise the last non-empty one.
pub fn first_meaningful_line(stderr: &str) -> String {
    stderr
        .lines()
        .map(str::trim)
        .find(|l| l.starts_with("ERROR:"))
        .or_else(|| stderr.lines().map(str::trim).rev().find(|l| !l.is_empty()))
        .unwrap_or("unknown error")
        .to_string()
}
