// Progress relay
//
// Spawns the worker subprocess for one job and supervises it from a
// dedicated thread: stdout lines are classified and forwarded as typed
// events over an mpsc channel, stderr is collected for the failure
// message, and the exit status becomes the terminal event. Every exit
// path sends a terminal event so the consumer can never hang on a dead
// worker.

use std::io::{BufRead, BufReader};
use std::path::PathBuf;
use std::process::{Child, ChildStderr, ChildStdout, Command as StdCommand, Stdio};
use std::sync::mpsc::Sender;

use super::errors::{first_meaningful_line, DownloadError};
use super::models::{DownloadRequest, ProgressEvent};
use super::progress::classify_line;
use super::traits::JobSpawner;

pub struct WorkerRelay {
    worker_exe: PathBuf,
}

impl WorkerRelay {
    /// Relay that re-invokes the current binary in worker mode
    pub fn new() -> Result<Self, DownloadError> {
        let worker_exe = std::env::current_exe()
            .map_err(|e| DownloadError::WorkerCrash(format!("Cannot locate own binary: {}", e)))?;
        Ok(Self { worker_exe })
    }

    pub fn with_command(worker_exe: PathBuf) -> Self {
        Self { worker_exe }
    }
}

impl JobSpawner for WorkerRelay {
    fn spawn(
        &self,
        request: &DownloadRequest,
        events: Sender<ProgressEvent>,
    ) -> Result<(), DownloadError> {
        let mut child = StdCommand::new(&self.worker_exe)
            .arg("invoke")
            .arg(&request.url)
            .arg(request.output_dir.as_os_str())
            .arg(request.quality.as_token())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|e| DownloadError::WorkerCrash(format!("Failed to start worker: {}", e)))?;

        let stdout = child
            .stdout
            .take()
            .ok_or_else(|| DownloadError::WorkerCrash("Failed to capture worker stdout".to_string()))?;
        let stderr = child
            .stderr
            .take()
            .ok_or_else(|| DownloadError::WorkerCrash("Failed to capture worker stderr".to_string()))?;

        std::thread::spawn(move || supervise(child, stdout, stderr, events));
        Ok(())
    }
}

/// Runs on the relay thread until the worker exits
fn supervise(mut child: Child, stdout: ChildStdout, stderr: ChildStderr, events: Sender<ProgressEvent>) {
    let stderr_handle = std::thread::spawn(move || {
        let reader = BufReader::new(stderr);
        let mut lines = Vec::new();
        for line in reader.lines().map_while(Result::ok) {
            lines.push(line);
        }
        lines.join("\n")
    });

    let reader = BufReader::new(stdout);
    for line in reader.lines() {
        let line = match line {
            Ok(line) => line,
            Err(e) => {
                eprintln!("[relay] Lost worker output: {}", e);
                break;
            }
        };
        match classify_line(&line) {
            Some(event) => {
                // Receiver gone means the session was dropped; stop relaying
                // but still reap the child below.
                if events.send(event).is_err() {
                    break;
                }
            }
            None => eprintln!("[worker] {}", line),
        }
    }

    let stderr_output = stderr_handle.join().unwrap_or_default();

    let terminal = match child.wait() {
        Ok(status) if status.success() => ProgressEvent::Completed,
        Ok(_) => {
            let message = if stderr_output.trim().is_empty() {
                "Download failed. Please check the URL and try again.".to_string()
            } else {
                first_meaningful_line(&stderr_output)
            };
            ProgressEvent::Failed(message)
        }
        Err(e) => ProgressEvent::Failed(format!("Worker crashed: {}", e)),
    };

    let _ = events.send(terminal);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::downloader::models::QualityPreset;
    use std::sync::mpsc;
    use std::time::Duration;

    fn request() -> DownloadRequest {
        DownloadRequest {
            url: "https://example.com/video".to_string(),
            output_dir: std::env::temp_dir(),
            quality: QualityPreset::Best,
        }
    }

    #[cfg(unix)]
    #[test]
    fn successful_worker_yields_completed() {
        // `true` prints nothing and exits 0
        let relay = WorkerRelay::with_command(PathBuf::from("/bin/true"));
        let (tx, rx) = mpsc::channel();
        relay.spawn(&request(), tx).unwrap();

        let event = rx.recv_timeout(Duration::from_secs(5)).unwrap();
        assert_eq!(event, ProgressEvent::Completed);
    }

    #[cfg(unix)]
    #[test]
    fn failing_worker_yields_failed_with_generic_message() {
        let relay = WorkerRelay::with_command(PathBuf::from("/bin/false"));
        let (tx, rx) = mpsc::channel();
        relay.spawn(&request(), tx).unwrap();

        match rx.recv_timeout(Duration::from_secs(5)).unwrap() {
            ProgressEvent::Failed(message) => {
                assert!(message.contains("Download failed"));
            }
            other => panic!("expected Failed, got {:?}", other),
        }
    }

    #[test]
    fn missing_worker_binary_is_reported_synchronously() {
        let relay = WorkerRelay::with_command(PathBuf::from("/nonexistent/worker"));
        let (tx, _rx) = mpsc::channel();
        let result = relay.spawn(&request(), tx);
        assert!(matches!(result, Err(DownloadError::WorkerCrash(_))));
    }
}
