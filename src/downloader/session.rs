// Download session state machine
//
// Owns the Idle -> Submitting -> Running -> {Completed, Failed} lifecycle
// on the presentation side. One job in flight at most: submission is a
// no-op while a worker runs, and URL validation happens before anything is
// spawned. Events arrive over an mpsc channel filled by the relay thread
// and are drained here without blocking, once per poll tick.

use std::path::PathBuf;
use std::sync::mpsc::{channel, Receiver, TryRecvError};
use std::time::Duration;

use super::errors::DownloadError;
use super::models::{default_videos_dir, DownloadRequest, JobState, ProgressEvent, QualityPreset};
use super::relay::WorkerRelay;
use super::traits::JobSpawner;

/// Explicit presentation-layer configuration, passed in at construction
#[derive(Debug, Clone)]
pub struct SessionConfig {
    pub download_dir: PathBuf,
    /// How often the event queue is drained
    pub poll_interval: Duration,
    pub default_quality: QualityPreset,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            download_dir: default_videos_dir(),
            poll_interval: Duration::from_millis(100),
            default_quality: QualityPreset::Best,
        }
    }
}

pub struct DownloadSession {
    config: SessionConfig,
    spawner: Box<dyn JobSpawner>,
    state: JobState,
    progress: f32,
    status: String,
    events: Option<Receiver<ProgressEvent>>,
}

impl DownloadSession {
    pub fn new(config: SessionConfig) -> Result<Self, DownloadError> {
        let relay = WorkerRelay::new()?;
        Ok(Self::with_spawner(config, Box::new(relay)))
    }

    /// Construct with a custom worker spawner (tests use a scripted one)
    pub fn with_spawner(config: SessionConfig, spawner: Box<dyn JobSpawner>) -> Self {
        Self {
            config,
            spawner,
            state: JobState::Idle,
            progress: 0.0,
            status: "Ready to download".to_string(),
            events: None,
        }
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    pub fn state(&self) -> &JobState {
        &self.state
    }

    pub fn is_active(&self) -> bool {
        self.state.is_active()
    }

    /// Displayed progress, 0-100
    pub fn progress(&self) -> f32 {
        self.progress
    }

    pub fn status(&self) -> &str {
        &self.status
    }

    /// Submit a new job. Rejects malformed URLs before any worker is
    /// spawned; silently ignores the submission while a job is running.
    pub fn submit(&mut self, url: &str, quality: QualityPreset) -> Result<(), DownloadError> {
        if self.state.is_active() {
            return Ok(());
        }

        let url = url.trim();
        if url.is_empty() {
            return Err(DownloadError::InvalidUrl("URL is empty".to_string()));
        }
        if !url.starts_with("http://") && !url.starts_with("https://") {
            return Err(DownloadError::InvalidUrl(url.to_string()));
        }

        // Terminal state of the previous job resets implicitly here
        self.state = JobState::Submitting;
        self.progress = 0.0;
        self.status = "Initializing download...".to_string();

        let request = DownloadRequest {
            url: url.to_string(),
            output_dir: self.config.download_dir.clone(),
            quality,
        };

        let (tx, rx) = channel();
        match self.spawner.spawn(&request, tx) {
            Ok(()) => {
                self.events = Some(rx);
                self.state = JobState::Running;
                Ok(())
            }
            Err(err) => {
                self.state = JobState::Idle;
                self.status = "Ready to download".to_string();
                Err(err)
            }
        }
    }

    /// Drain pending events without blocking. Returns true when the
    /// displayed state changed this tick.
    pub fn poll(&mut self) -> bool {
        let Some(events) = self.events.as_ref() else {
            return false;
        };

        let mut pending = Vec::new();
        let mut disconnected = false;
        loop {
            match events.try_recv() {
                Ok(event) => pending.push(event),
                Err(TryRecvError::Empty) => break,
                Err(TryRecvError::Disconnected) => {
                    disconnected = true;
                    break;
                }
            }
        }

        let mut changed = false;
        for event in pending {
            self.apply(event);
            changed = true;
            if !self.state.is_active() {
                break;
            }
        }

        // Relay thread died without sending a terminal event
        if disconnected && self.state.is_active() {
            self.apply(ProgressEvent::Failed(
                "Worker stopped responding".to_string(),
            ));
            changed = true;
        }

        if !self.state.is_active() {
            self.events = None;
        }
        changed
    }

    fn apply(&mut self, event: ProgressEvent) {
        match event {
            ProgressEvent::Percentage {
                percent,
                total,
                speed,
            } => {
                self.progress = percent;
                self.status = match (total, speed) {
                    (Some(total), Some(speed)) => {
                        format!("{:.1}% of {} at {}", percent, total, speed)
                    }
                    (Some(total), None) => format!("{:.1}% of {}", percent, total),
                    _ => format!("{:.1}%", percent),
                };
            }
            ProgressEvent::Status(text) => {
                self.status = text;
            }
            ProgressEvent::Completed => {
                self.progress = 100.0;
                self.state = JobState::Completed;
                self.status = "✅ Download completed successfully!".to_string();
            }
            ProgressEvent::Failed(message) => {
                self.state = JobState::Failed;
                self.status = format!("❌ Error: {}", message);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::mpsc::Sender;
    use std::sync::{Arc, Mutex};

    /// Spawner that records requests and immediately emits a scripted
    /// event sequence instead of running a subprocess.
    struct ScriptedSpawner {
        script: Mutex<Vec<ProgressEvent>>,
        requests: Mutex<Vec<DownloadRequest>>,
        // Held like the real relay holds its sender until the job ends,
        // so draining the script doesn't read as a relay crash.
        senders: Mutex<Vec<Sender<ProgressEvent>>>,
    }

    impl ScriptedSpawner {
        fn new(script: Vec<ProgressEvent>) -> Arc<Self> {
            Arc::new(Self {
                script: Mutex::new(script),
                requests: Mutex::new(Vec::new()),
                senders: Mutex::new(Vec::new()),
            })
        }

        fn spawn_count(&self) -> usize {
            self.requests.lock().unwrap().len()
        }
    }

    struct SharedSpawner(Arc<ScriptedSpawner>);

    impl JobSpawner for SharedSpawner {
        fn spawn(
            &self,
            request: &DownloadRequest,
            events: Sender<ProgressEvent>,
        ) -> Result<(), DownloadError> {
            self.0.requests.lock().unwrap().push(request.clone());
            for event in self.0.script.lock().unwrap().drain(..) {
                let _ = events.send(event);
            }
            self.0.senders.lock().unwrap().push(events);
            Ok(())
        }
    }

    fn session_with(script: Vec<ProgressEvent>) -> (DownloadSession, Arc<ScriptedSpawner>) {
        let spawner = ScriptedSpawner::new(script);
        let session = DownloadSession::with_spawner(
            SessionConfig::default(),
            Box::new(SharedSpawner(spawner.clone())),
        );
        (session, spawner)
    }

    #[test]
    fn empty_url_is_rejected_before_spawn() {
        let (mut session, spawner) = session_with(Vec::new());
        let result = session.submit("   ", QualityPreset::Best);
        assert!(matches!(result, Err(DownloadError::InvalidUrl(_))));
        assert_eq!(spawner.spawn_count(), 0);
        assert_eq!(*session.state(), JobState::Idle);
    }

    #[test]
    fn schemeless_url_is_rejected_before_spawn() {
        let (mut session, spawner) = session_with(Vec::new());
        for url in ["example.com/video", "ftp://example.com/video"] {
            let result = session.submit(url, QualityPreset::Best);
            assert!(matches!(result, Err(DownloadError::InvalidUrl(_))), "{}", url);
        }
        assert_eq!(spawner.spawn_count(), 0);
    }

    #[test]
    fn submission_starts_running_with_zero_progress() {
        let (mut session, spawner) = session_with(Vec::new());
        session
            .submit("https://example.com/video", QualityPreset::P720)
            .unwrap();
        assert_eq!(*session.state(), JobState::Running);
        assert_eq!(session.progress(), 0.0);
        assert_eq!(spawner.spawn_count(), 1);

        let request = spawner.requests.lock().unwrap()[0].clone();
        assert_eq!(request.quality, QualityPreset::P720);
    }

    #[test]
    fn resubmission_while_running_is_a_noop() {
        let (mut session, spawner) = session_with(Vec::new());
        session
            .submit("https://example.com/video", QualityPreset::Best)
            .unwrap();
        session
            .submit("https://example.com/other", QualityPreset::Best)
            .unwrap();
        assert_eq!(spawner.spawn_count(), 1);
    }

    #[test]
    fn completion_forces_progress_to_hundred() {
        let (mut session, _) = session_with(vec![
            ProgressEvent::Percentage {
                percent: 42.5,
                total: Some("10.00MiB".to_string()),
                speed: Some("1.20MiB/s".to_string()),
            },
            ProgressEvent::Completed,
        ]);
        session
            .submit("https://example.com/video", QualityPreset::Audio)
            .unwrap();

        assert!(session.poll());
        assert_eq!(*session.state(), JobState::Completed);
        assert_eq!(session.progress(), 100.0);
    }

    #[test]
    fn failure_surfaces_message_and_reenables_submission() {
        let (mut session, spawner) = session_with(vec![ProgressEvent::Failed(
            "Requested format is not available".to_string(),
        )]);
        session
            .submit("https://example.com/video", QualityPreset::Best)
            .unwrap();

        assert!(session.poll());
        assert_eq!(*session.state(), JobState::Failed);
        assert!(session.status().contains("Requested format is not available"));

        // Terminal state re-enables submission
        session
            .submit("https://example.com/video", QualityPreset::Best)
            .unwrap();
        assert_eq!(spawner.spawn_count(), 2);
        assert_eq!(*session.state(), JobState::Running);
    }

    #[test]
    fn poll_on_idle_session_reports_no_change() {
        let (mut session, _) = session_with(Vec::new());
        assert!(!session.poll());
    }

    #[test]
    fn status_lines_are_displayed_verbatim() {
        let (mut session, _) = session_with(vec![ProgressEvent::Status(
            "📺 Title: Some Video".to_string(),
        )]);
        session
            .submit("https://example.com/video", QualityPreset::Best)
            .unwrap();
        session.poll();
        assert_eq!(session.status(), "📺 Title: Some Video");
    }
}
