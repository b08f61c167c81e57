// yt-dlp backed MediaExtractor
//
// Probes metadata with --dump-json and runs one download attempt per
// format selector, streaming the tool's stdout straight through to our own
// stdout so the supervising relay can classify it line by line.

use async_trait::async_trait;
use std::io::{BufRead, BufReader};
use std::process::{Command as StdCommand, Stdio};

use super::errors::{classify_stderr, DownloadError};
use super::models::{DownloadOptions, VideoInfo};
use super::traits::MediaExtractor;
use super::utils::{bundled_ffmpeg_dir, find_binary, format_duration, run_output_with_timeout};

const PROBE_TIMEOUT_SECS: u64 = 30;

pub struct YtDlpExtractor {
    ytdlp_path: String,
}

impl YtDlpExtractor {
    pub fn new() -> Result<Self, DownloadError> {
        let ytdlp_path = find_binary("yt-dlp")
            .ok_or_else(|| DownloadError::ToolNotFound("yt-dlp".to_string()))?;
        Ok(Self { ytdlp_path })
    }

    #[cfg(test)]
    pub fn with_path(path: &str) -> Self {
        Self {
            ytdlp_path: path.to_string(),
        }
    }

    fn build_download_args(&self, url: &str, selector: &str, options: &DownloadOptions) -> Vec<String> {
        let mut args = vec![
            "-f".to_string(),
            selector.to_string(),
            "--no-playlist".to_string(),
            "--newline".to_string(),
            "--no-update".to_string(),
            "--socket-timeout".to_string(),
            "30".to_string(),
            "--retries".to_string(),
            "5".to_string(),
            "-P".to_string(),
            options.output_dir.to_string_lossy().to_string(),
            "-o".to_string(),
            "%(title)s.%(ext)s".to_string(),
        ];

        if let Some(container) = &options.merge_format {
            args.push("--merge-output-format".to_string());
            args.push(container.clone());
        }

        if options.extract_audio {
            args.extend([
                "-x".to_string(),
                "--audio-format".to_string(),
                "mp3".to_string(),
                "--audio-quality".to_string(),
                "192K".to_string(),
            ]);
        }

        // ffmpeg shipped next to the app wins over whatever is on PATH
        if let Some(dir) = bundled_ffmpeg_dir() {
            args.push("--ffmpeg-location".to_string());
            args.push(dir.to_string_lossy().to_string());
        }

        args.push(url.to_string());
        args
    }
}

#[async_trait]
impl MediaExtractor for YtDlpExtractor {
    fn name(&self) -> &'static str {
        "yt-dlp"
    }

    async fn probe(&self, url: &str) -> Result<VideoInfo, DownloadError> {
        let args = vec![
            "--dump-json".to_string(),
            "--no-playlist".to_string(),
            "--no-warnings".to_string(),
            "--socket-timeout".to_string(),
            "15".to_string(),
            "--retries".to_string(),
            "2".to_string(),
            url.to_string(),
        ];

        let output = run_output_with_timeout(&self.ytdlp_path, args, PROBE_TIMEOUT_SECS)
            .await
            .map_err(DownloadError::ExtractionFailed)?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(classify_stderr(&stderr, "probe"));
        }

        parse_video_info(&output.stdout)
    }

    fn download(
        &self,
        url: &str,
        selector: &str,
        options: &DownloadOptions,
    ) -> Result<(), DownloadError> {
        let args = self.build_download_args(url, selector, options);
        eprintln!("[yt-dlp] Starting attempt with format '{}'", selector);

        let mut child = StdCommand::new(&self.ytdlp_path)
            .args(&args)
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|e| DownloadError::ExtractionFailed(format!("Failed to start yt-dlp: {}", e)))?;

        let stdout = child
            .stdout
            .take()
            .ok_or_else(|| DownloadError::ExtractionFailed("Failed to capture stdout".to_string()))?;
        let stderr = child
            .stderr
            .take()
            .ok_or_else(|| DownloadError::ExtractionFailed("Failed to capture stderr".to_string()))?;

        let stderr_handle = std::thread::spawn(move || {
            let reader = BufReader::new(stderr);
            let mut lines = Vec::new();
            for line in reader.lines().map_while(Result::ok) {
                lines.push(line);
            }
            lines.join("\n")
        });

        // Relay the tool's progress lines onto our own stdout contract
        let reader = BufReader::new(stdout);
        for line in reader.lines().map_while(Result::ok) {
            println!("{}", line);
        }

        let status = child
            .wait()
            .map_err(|e| DownloadError::ExtractionFailed(format!("Process error: {}", e)))?;
        let stderr_output = stderr_handle.join().unwrap_or_default();

        if status.success() {
            return Ok(());
        }

        Err(classify_stderr(&stderr_output, selector))
    }
}

fn parse_video_info(stdout: &[u8]) -> Result<VideoInfo, DownloadError> {
    let json_str = String::from_utf8_lossy(stdout);
    let json: serde_json::Value = serde_json::from_str(&json_str)
        .map_err(|e| DownloadError::ExtractionFailed(format!("Failed to parse JSON: {}", e)))?;

    let duration_secs = json["duration"].as_f64().unwrap_or(0.0) as i64;
    let duration = if duration_secs > 0 {
        format_duration(duration_secs)
    } else {
        String::new()
    };

    Ok(VideoInfo {
        title: json["title"].as_str().unwrap_or("Unknown Title").to_string(),
        duration,
        uploader: json["uploader"].as_str().unwrap_or("Unknown").to_string(),
    })
}
