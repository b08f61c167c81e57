// Download driver with format fallback
//
// Probes metadata first, then walks the selector plan: the preset's primary
// expression, then progressively looser fallbacks when a selector does not
// resolve. Milestone lines go to stdout for the supervising relay; anything
// diagnostic goes to stderr.

use super::errors::DownloadError;
use super::format_selector::FallbackPlan;
use super::models::{DownloadOptions, DownloadRequest};
use super::traits::MediaExtractor;

pub struct Downloader {
    extractor: Box<dyn MediaExtractor>,
}

impl Downloader {
    pub fn new(extractor: Box<dyn MediaExtractor>) -> Self {
        Self { extractor }
    }

    /// Run one download job to completion.
    ///
    /// Only a "format not available" failure on the primary selector opens
    /// the fallback sequence; extraction and network errors surface
    /// immediately. Inside the fallback walk every failure moves on to the
    /// next expression until the plan is exhausted.
    pub async fn run(&self, request: &DownloadRequest) -> Result<(), DownloadError> {
        std::fs::create_dir_all(&request.output_dir).map_err(|e| {
            DownloadError::ExtractionFailed(format!(
                "Cannot create output folder {}: {}",
                request.output_dir.display(),
                e
            ))
        })?;

        let info = self.extractor.probe(&request.url).await?;

        println!("🎬 Starting download...");
        println!("📂 Output folder: {}", request.output_dir.display());
        println!("🎯 Quality: {}", request.quality.as_token());
        println!("📺 Title: {}", info.title);
        if !info.duration.is_empty() {
            println!("⏱️ Duration: {}", info.duration);
        }

        let options = DownloadOptions::for_request(request);
        let mut plan = FallbackPlan::new(request.quality);

        let primary = match plan.next() {
            Some(selector) => selector,
            None => return Err(DownloadError::ExhaustedFallbacks(Vec::new())),
        };

        match self.extractor.download(&request.url, primary, &options) {
            Ok(()) => {
                self.print_success(&request.output_dir);
                return Ok(());
            }
            Err(err) if err.is_format_unavailable() => {
                eprintln!("[driver] {}", err);
                eprintln!("[driver] Retrying with progressive fallback formats...");
            }
            Err(err) => return Err(err),
        }

        let total = plan.remaining();
        let mut tried = Vec::with_capacity(total);
        for selector in plan {
            tried.push(selector.to_string());
            eprintln!(
                "[driver] Attempt {}/{}: trying format '{}'",
                tried.len(),
                total,
                selector
            );
            match self.extractor.download(&request.url, selector, &options) {
                Ok(()) => {
                    println!("✅ Download completed successfully with format '{}'!", selector);
                    println!("📁 Files saved to: {}", request.output_dir.display());
                    return Ok(());
                }
                Err(err) => {
                    eprintln!("[driver] Format '{}' failed: {}", selector, err);
                }
            }
        }

        Err(DownloadError::ExhaustedFallbacks(tried))
    }

    fn print_success(&self, output_dir: &std::path::Path) {
        println!("✅ Download completed successfully!");
        println!("📁 Files saved to: {}", output_dir.display());
    }
}
