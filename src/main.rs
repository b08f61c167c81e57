// light-downloader entry point
//
// Two modes:
//   light-downloader invoke <url> [destination] [quality]   worker mode
//   light-downloader                                        interactive mode
//
// Worker mode runs the extraction driver in-process and speaks the
// line-oriented progress protocol on stdout (exit 0 on success, 1 on any
// failure). Interactive mode is a REPL that re-spawns this binary in worker
// mode per submission and renders relayed progress in the terminal.

use std::io::{self, BufRead, Write};
use std::path::PathBuf;
use std::process::ExitCode;

use light_downloader::downloader::models::default_videos_dir;
use light_downloader::downloader::ytdlp::YtDlpExtractor;
use light_downloader::downloader::{
    DownloadRequest, DownloadSession, Downloader, JobState, QualityPreset, SessionConfig,
};

const BAR_WIDTH: usize = 30;

fn main() -> ExitCode {
    let mut args: Vec<String> = std::env::args().skip(1).collect();

    if args.first().map(String::as_str) == Some("invoke") {
        args.remove(0);
    }

    if !args.is_empty() {
        return worker_mode(&args);
    }

    interactive_mode()
}

fn print_banner() {
    println!(
        "\n\
         ========================================================================\n\
         \u{20}                    LIGHT VIDEO DOWNLOADER\n\
         \u{20}                       Video & Audio\n\
         ========================================================================"
    );
}

/// Non-interactive driver: download one URL and exit 0/1
fn worker_mode(args: &[String]) -> ExitCode {
    let url = args[0].trim();
    if url.is_empty() || url.eq_ignore_ascii_case("none") {
        eprintln!("Error: No URL provided");
        return ExitCode::FAILURE;
    }

    let output_dir = args
        .get(1)
        .filter(|s| !s.trim().is_empty())
        .map(PathBuf::from)
        .unwrap_or_else(default_videos_dir);
    let quality = args
        .get(2)
        .map(|s| QualityPreset::from_token(s))
        .unwrap_or_default();

    let request = DownloadRequest {
        url: url.to_string(),
        output_dir,
        quality,
    };

    let extractor = match YtDlpExtractor::new() {
        Ok(extractor) => extractor,
        Err(e) => {
            eprintln!("❌ {}", e);
            return ExitCode::FAILURE;
        }
    };

    let runtime = match tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
    {
        Ok(runtime) => runtime,
        Err(e) => {
            eprintln!("❌ Failed to start runtime: {}", e);
            return ExitCode::FAILURE;
        }
    };

    let downloader = Downloader::new(Box::new(extractor));
    match runtime.block_on(downloader.run(&request)) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("❌ Download error: {}", e);
            ExitCode::FAILURE
        }
    }
}

/// REPL: paste a URL, pick a quality, watch progress, repeat
fn interactive_mode() -> ExitCode {
    print_banner();

    let config = SessionConfig::default();
    let mut session = match DownloadSession::new(config) {
        Ok(session) => session,
        Err(e) => {
            eprintln!("❌ {}", e);
            return ExitCode::FAILURE;
        }
    };

    loop {
        let Some(link) = prompt("\n📎 Paste video URL here (or type 'exit'): ") else {
            break;
        };
        let link = link.trim().to_string();

        if link.eq_ignore_ascii_case("exit") {
            println!("👋 Exiting Light Video Downloader. Goodbye!");
            return ExitCode::SUCCESS;
        }
        if link.is_empty() {
            println!("⚠️ Please enter a valid URL");
            continue;
        }

        let quality = match ask_quality() {
            Some(quality) => quality,
            None => break,
        };

        if let Err(e) = session.submit(&link, quality) {
            println!("⚠️ {}", e);
            continue;
        }

        supervise(&mut session);

        let Some(again) = prompt("\n🔄 Download another video? (y/n): ") else {
            break;
        };
        if !matches!(again.trim().to_lowercase().as_str(), "y" | "yes") {
            println!("👋 Thanks for using Light Video Downloader!");
            return ExitCode::SUCCESS;
        }
    }

    ExitCode::SUCCESS
}

/// Drain the session's event queue on a fixed tick until the job ends
fn supervise(session: &mut DownloadSession) {
    let tick = session.config().poll_interval;
    while session.is_active() {
        std::thread::sleep(tick);
        if session.poll() {
            render_progress(session);
        }
    }
    println!();
    match session.state() {
        JobState::Completed => {
            println!("✅ Download completed successfully!");
            println!("📁 Files saved to: {}", session.config().download_dir.display());
        }
        JobState::Failed => println!("{}", session.status()),
        _ => {}
    }
}

fn render_progress(session: &DownloadSession) {
    let percent = session.progress().clamp(0.0, 100.0);
    let filled = (percent / 100.0 * BAR_WIDTH as f32).round() as usize;
    let bar: String = "▌".repeat(filled);

    // Keep the status short enough to fit on one redrawn line
    let status: String = session.status().chars().take(50).collect();
    print!(
        "\r📊 [{:<width$}] {:5.1}% {:<50}",
        bar,
        percent,
        status,
        width = BAR_WIDTH
    );
    let _ = io::stdout().flush();
}

fn ask_quality() -> Option<QualityPreset> {
    println!("\n🎯 Quality options:");
    println!("1. Best quality (default)");
    println!("2. 720p");
    println!("3. 480p");
    println!("4. Audio only");

    let choice = prompt("\nEnter choice (1-4, or press Enter for best): ")?;
    let quality = match choice.trim() {
        "2" => QualityPreset::P720,
        "3" => QualityPreset::P480,
        "4" => QualityPreset::Audio,
        _ => QualityPreset::Best,
    };
    Some(quality)
}

/// Print a prompt and read one line; None on EOF
fn prompt(text: &str) -> Option<String> {
    print!("{}", text);
    let _ = io::stdout().flush();

    let mut line = String::new();
    match io::stdin().lock().read_line(&mut line) {
        Ok(0) | Err(_) => None,
        Ok(_) => Some(line),
    }
}
