// Progress line classifier
//
// Turns one line of worker stdout into at most one typed event. Pure and
// panic-free: malformed progress lines degrade to status text instead of
// failing the relay.
//
// Expected shapes:
//   [download]  42.5% of 10.00MiB at 1.20MiB/s
//   [download]   6.2% of ~ 343.72MiB at  420.30KiB/s ETA 12:32
//   📺 Title: Some Video
//   ✅ Download completed successfully!

use lazy_static::lazy_static;
use regex::Regex;

use super::models::ProgressEvent;

/// Token marking an extraction-tool progress line
const PROGRESS_MARKER: &str = "[download]";

/// Phrases that promote an ordinary line to a forwarded milestone
const MILESTONE_PHRASES: [&str; 4] = [
    "Starting download",
    "Title:",
    "Duration:",
    "completed successfully",
];

lazy_static! {
    // First float immediately preceding a percent sign
    static ref PERCENT_RE: Regex = Regex::new(r"(\d+(?:\.\d+)?)%").unwrap();
    static ref SIZE_RE: Regex = Regex::new(r"of\s+~?\s*(\d+(?:\.\d+)?\s*\w+)").unwrap();
    static ref SPEED_RE: Regex = Regex::new(r"at\s+(\d+(?:\.\d+)?\s*\w+/s)").unwrap();
}

/// Classify one line of worker output.
///
/// Returns `None` for lines that are debug output and must not reach the
/// presentation layer.
pub fn classify_line(line: &str) -> Option<ProgressEvent> {
    let line = line.trim();
    if line.is_empty() {
        return None;
    }

    if line.contains(PROGRESS_MARKER) && line.contains('%') {
        if let Some(percent) = extract_percent(line) {
            return Some(ProgressEvent::Percentage {
                percent,
                total: capture(&SIZE_RE, line),
                speed: capture(&SPEED_RE, line),
            });
        }
        // Marker present but the number is garbage: keep the line visible
        // as a status instead of crashing or dropping it.
        return Some(ProgressEvent::Status(line.to_string()));
    }

    if MILESTONE_PHRASES.iter().any(|phrase| line.contains(phrase)) {
        return Some(ProgressEvent::Status(line.to_string()));
    }

    None
}

fn extract_percent(line: &str) -> Option<f32> {
    let caps = PERCENT_RE.captures(line)?;
    let percent: f32 = caps.get(1)?.as_str().parse().ok()?;
    // yt-dlp never reports outside 0-100; out-of-range means we matched
    // something that is not a progress figure
    if (0.0..=100.0).contains(&percent) {
        Some(percent)
    } else {
        None
    }
}

fn capture(re: &Regex, line: &str) -> Option<String> {
    re.captures(line)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().trim().to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn percentage_line_is_extracted() {
        let event = classify_line("[download]  42.5% of 10.00MiB at 1.20MiB/s").unwrap();
        assert_eq!(
            event,
            ProgressEvent::Percentage {
                percent: 42.5,
                total: Some("10.00MiB".to_string()),
                speed: Some("1.20MiB/s".to_string()),
            }
        );
    }

    #[test]
    fn estimated_size_is_accepted() {
        let event =
            classify_line("[download]   6.2% of ~ 343.72MiB at  420.30KiB/s ETA 12:32").unwrap();
        match event {
            ProgressEvent::Percentage { percent, total, speed } => {
                assert_eq!(percent, 6.2);
                assert_eq!(total.as_deref(), Some("343.72MiB"));
                assert_eq!(speed.as_deref(), Some("420.30KiB/s"));
            }
            other => panic!("expected percentage, got {:?}", other),
        }
    }

    #[test]
    fn percentage_without_size_or_speed() {
        let event = classify_line("[download] 100% Download complete, now post-processing...");
        match event {
            Some(ProgressEvent::Percentage { percent, .. }) => assert_eq!(percent, 100.0),
            other => panic!("expected percentage, got {:?}", other),
        }
    }

    #[test]
    fn milestone_lines_are_forwarded_verbatim() {
        for line in [
            "Starting download",
            "📺 Title: Never Gonna Give You Up",
            "⏱️ Duration: 03:32",
            "✅ Download completed successfully!",
        ] {
            assert_eq!(
                classify_line(line),
                Some(ProgressEvent::Status(line.to_string())),
                "line: {}",
                line
            );
        }
    }

    #[test]
    fn informational_lines_are_dropped() {
        assert_eq!(classify_line("some random ffmpeg log line"), None);
        assert_eq!(classify_line("[youtube] abc: Downloading webpage"), None);
        assert_eq!(classify_line(""), None);
        assert_eq!(classify_line("   "), None);
    }

    #[test]
    fn malformed_percent_degrades_to_status() {
        let event = classify_line("[download] ???% of ???");
        assert_eq!(
            event,
            Some(ProgressEvent::Status("[download] ???% of ???".to_string()))
        );
    }

    #[test]
    fn classifier_is_pure() {
        let line = "[download]  42.5% of 10.00MiB at 1.20MiB/s";
        assert_eq!(classify_line(line), classify_line(line));
    }
}
