// Session controller - Single source of truth for one trim session

use std::path::PathBuf;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use chrono::{DateTime, Utc};
use tracing::{debug, error, info, instrument, warn};

use crate::app::engine_adapter::MediaEngineAdapter;
use crate::domain::errors::DomainError;
use crate::domain::model::*;
use crate::domain::rules::{BoundsRules, MediaTypeRules, OutputNaming};
use crate::ports::*;
use crate::utils::object_url::ObjectUrlRegistry;

/// Owns the session state and drives the trim lifecycle:
/// `Empty -> FileSelected -> MetadataReady -> (Trimming) -> MetadataReady | Empty`.
///
/// Every method takes `&self`. The session lock is never held across an
/// await, so UI events keep flowing while a trim is in flight.
pub struct SessionController {
    session: Mutex<Session>,
    artifacts: Mutex<Vec<HeldArtifact>>,
    engine: Arc<MediaEngineAdapter>,
    preview: Arc<dyn PreviewPort>,
    delivery: Arc<dyn DeliveryPort>,
    notices: Arc<dyn NoticePort>,
    urls: Arc<ObjectUrlRegistry>,
    artifact_ttl: chrono::Duration,
}

/// An issued artifact plus the staged copy a share receiver may still read
struct HeldArtifact {
    artifact: OutputArtifact,
    shared: Option<SharedCopy>,
}

impl HeldArtifact {
    fn release(self) {
        if let Some(copy) = &self.shared {
            debug!(path = %copy.path().display(), "Removing shared copy");
        }
        self.artifact.url.revoke();
    }
}

/// Clears `is_processing` when the trim action ends, however it ends
struct ProcessingGuard<'a> {
    session: &'a Mutex<Session>,
}

impl Drop for ProcessingGuard<'_> {
    fn drop(&mut self) {
        self.session
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .is_processing = false;
    }
}

impl SessionController {
    pub fn new(
        engine: Arc<MediaEngineAdapter>,
        preview: Arc<dyn PreviewPort>,
        delivery: Arc<dyn DeliveryPort>,
        notices: Arc<dyn NoticePort>,
        urls: Arc<ObjectUrlRegistry>,
        artifact_ttl: chrono::Duration,
    ) -> Self {
        Self {
            session: Mutex::new(Session::new()),
            artifacts: Mutex::new(Vec::new()),
            engine,
            preview,
            delivery,
            notices,
            urls,
            artifact_ttl,
        }
    }

    fn lock(&self) -> MutexGuard<'_, Session> {
        self.session.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn artifacts(&self) -> MutexGuard<'_, Vec<HeldArtifact>> {
        self.artifacts.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Copy of the current state for rendering
    pub fn snapshot(&self) -> SessionSnapshot {
        self.lock().snapshot()
    }

    /// Absolute window for the current bounds
    pub fn trim_window(&self) -> TrimWindow {
        self.lock().trim_window()
    }

    pub fn is_processing(&self) -> bool {
        self.lock().is_processing
    }

    /// Output artifacts whose addresses are still held
    pub fn pending_artifacts(&self) -> usize {
        self.artifacts().len()
    }

    /// Accept a new source file. Non-video files are rejected before any
    /// state changes.
    #[instrument(skip(self, file), fields(name = %file.name, mime = %file.mime))]
    pub fn select_file(&self, file: SourceFile) -> Result<(), DomainError> {
        if !MediaTypeRules::is_video_mime(&file.mime) {
            let err = DomainError::UnsupportedMediaType {
                mime: file.mime.clone(),
            };
            warn!("Rejected file selection: {}", err);
            self.notices.notify(Notice::warning(err.to_string()));
            return Err(err);
        }

        let url = self.urls.create(Arc::clone(&file.bytes), &file.mime);
        self.preview.attach(&file);

        let replaced = {
            let mut session = self.lock();
            let replaced = session.preview_reference.replace(url);
            session.input_value = Some(file.name.clone());
            session.source_file = Some(file);
            session.duration_seconds = 0.0;
            session.bounds = TrimBounds::default();
            session.controls_visible = false;
            session.actions_visible = true;
            replaced
        };

        if let Some(previous) = replaced {
            debug!(url = %previous, "Releasing previous preview reference");
            previous.revoke();
        }

        info!("Video selected");
        Ok(())
    }

    /// The preview surface reported the media duration. Only the first
    /// report per selected file counts.
    pub fn on_metadata_loaded(&self, duration_seconds: f64) -> Result<(), DomainError> {
        let mut session = self.lock();
        if session.source_file.is_none() {
            return Err(DomainError::NoSourceFile);
        }
        if session.controls_visible {
            debug!(
                duration_seconds,
                kept = session.duration_seconds,
                "Ignoring repeated metadata report"
            );
            return Ok(());
        }

        let duration = if duration_seconds.is_finite() && duration_seconds > 0.0 {
            duration_seconds
        } else {
            warn!(duration_seconds, "Unusable duration reported; trims will be empty");
            0.0
        };

        session.duration_seconds = duration;
        session.bounds.reset_end();
        session.controls_visible = true;
        info!(duration, "Metadata loaded");
        Ok(())
    }

    /// Move the start handle and seek the preview to it
    pub fn set_start_fraction(&self, value: f64) -> f64 {
        let (stored, seek_to) = {
            let mut session = self.lock();
            let stored = session.bounds.set_start(value);
            let seek_to = session
                .source_file
                .as_ref()
                .map(|_| BoundsRules::fraction_to_seconds(stored, session.duration_seconds));
            (stored, seek_to)
        };

        if let Some(seconds) = seek_to {
            self.preview.seek(seconds);
        }
        debug!(requested = value, stored, "Start handle moved");
        stored
    }

    /// Move the end handle and seek the preview to it
    pub fn set_end_fraction(&self, value: f64) -> f64 {
        let (stored, seek_to) = {
            let mut session = self.lock();
            let stored = session.bounds.set_end(value);
            let seek_to = session
                .source_file
                .as_ref()
                .map(|_| BoundsRules::fraction_to_seconds(stored, session.duration_seconds));
            (stored, seek_to)
        };

        if let Some(seconds) = seek_to {
            self.preview.seek(seconds);
        }
        debug!(requested = value, stored, "End handle moved");
        stored
    }

    /// Play the preview from the start handle
    pub fn preview_trim(&self) -> Result<(), DomainError> {
        let start = {
            let session = self.lock();
            if session.source_file.is_none() {
                return Err(DomainError::NoSourceFile);
            }
            session.trim_window().start
        };

        self.preview.seek(start.seconds);
        self.preview.play().map_err(|e| {
            self.notices.notify(Notice::warning(e.to_string()));
            e
        })
    }

    /// Trim the source to the selected window and deliver the result.
    ///
    /// Rejected with [`DomainError::Busy`] while another trim is running.
    pub async fn trim_and_deliver(&self, mode: DeliveryMode) -> Result<TrimReport, DomainError> {
        // Previous artifacts are released when the next operation starts
        self.release_artifacts();

        let (source, window) = {
            let mut session = self.lock();
            let Some(source) = session.source_file.clone() else {
                drop(session);
                self.notices.notify(Notice::warning("Select a video first"));
                return Err(DomainError::NoSourceFile);
            };
            if session.is_processing {
                drop(session);
                info!("Ignoring trim request while another trim is running");
                self.notices
                    .notify(Notice::info("A trim is already in progress"));
                return Err(DomainError::Busy);
            }
            session.is_processing = true;
            (source, session.trim_window())
        };
        let _processing = ProcessingGuard {
            session: &self.session,
        };

        info!(
            %mode,
            start = %window.start,
            duration = %window.clip_duration,
            "Trimming {}",
            source.name
        );

        let result = self.run_trim(&source, window, mode).await;
        match &result {
            Ok(report) => {
                let message = match &report.delivery {
                    DeliveryOutcome::Saved { path } => format!("Saved {}", path.display()),
                    DeliveryOutcome::Shared => format!("Shared {}", report.filename),
                    DeliveryOutcome::SavedAfterShare { path, .. } => {
                        format!("Saved {}", path.display())
                    }
                };
                self.notices.notify(Notice::info(message));
            }
            Err(e) => {
                error!("Trim failed: {}", e);
                let message = if e.is_processing_failure() {
                    format!("Could not trim the video: {}", e)
                } else {
                    e.to_string()
                };
                self.notices.notify(Notice::error(message));
            }
        }
        result
    }

    async fn run_trim(
        &self,
        source: &SourceFile,
        window: TrimWindow,
        mode: DeliveryMode,
    ) -> Result<TrimReport, DomainError> {
        let bytes = self
            .engine
            .trim(&source.bytes, window.start, window.clip_duration)
            .await?;

        let artifact = OutputArtifact::new(
            &self.urls,
            bytes,
            OutputNaming::trimmed_filename(&source.name),
        );
        let (report, shared) = match self.deliver(&artifact, mode).await {
            Ok((delivery, shared)) => {
                let report = TrimReport {
                    window,
                    filename: artifact.filename.clone(),
                    output_bytes: artifact.size,
                    delivery,
                };
                (Ok(report), shared)
            }
            Err(e) => (Err(e), None),
        };
        self.artifacts().push(HeldArtifact { artifact, shared });
        report
    }

    async fn deliver(
        &self,
        artifact: &OutputArtifact,
        mode: DeliveryMode,
    ) -> Result<(DeliveryOutcome, Option<SharedCopy>), DomainError> {
        let (Some(bytes), Some(mime)) = (artifact.url.resolve(), artifact.url.mime()) else {
            return Err(DomainError::Delivery(
                "artifact address was released".to_string(),
            ));
        };

        if mode == DeliveryMode::Download {
            let path = self.delivery.save(&bytes, &artifact.filename).await?;
            return Ok((DeliveryOutcome::Saved { path }, None));
        }

        let reason = if self.delivery.can_share() {
            match self.delivery.share(&bytes, &artifact.filename, &mime).await {
                Ok(copy) => return Ok((DeliveryOutcome::Shared, Some(copy))),
                Err(e) => {
                    warn!("Share failed, saving instead: {}", e);
                    e.to_string()
                }
            }
        } else {
            "sharing files is not supported here".to_string()
        };

        self.notices
            .notify(Notice::info(format!("Could not share ({}); saving instead", reason)));
        let path = self.delivery.save(&bytes, &artifact.filename).await?;
        Ok((DeliveryOutcome::SavedAfterShare { path, reason }, None))
    }

    /// Save the untouched source under its original name
    pub async fn download_original(&self) -> Result<PathBuf, DomainError> {
        let (name, bytes) = {
            let session = self.lock();
            match (&session.source_file, &session.preview_reference) {
                (Some(file), Some(url)) => (file.name.clone(), url.resolve()),
                _ => (String::new(), None),
            }
        };

        let Some(bytes) = bytes else {
            self.notices.notify(Notice::warning("Select a video first"));
            return Err(DomainError::NoSourceFile);
        };

        match self.delivery.save(&bytes, &name).await {
            Ok(path) => {
                self.notices
                    .notify(Notice::info(format!("Saved {}", path.display())));
                Ok(path)
            }
            Err(e) => {
                self.notices.notify(Notice::error(e.to_string()));
                Err(e)
            }
        }
    }

    /// Return to the empty state, releasing every held address
    pub fn clear(&self) {
        let previous = {
            let mut session = self.lock();
            // A running trim still owns the processing flag
            let in_flight = session.is_processing;
            let previous = std::mem::take(&mut *session);
            session.is_processing = in_flight;
            previous
        };
        if let Some(url) = previous.preview_reference {
            debug!(url = %url, "Releasing preview reference");
            url.revoke();
        }
        self.preview.detach();
        self.release_artifacts();
        info!("Session cleared");
    }

    /// Release artifacts, and any shared copies of them, older than the
    /// configured time-to-live
    pub fn reap_artifacts(&self, now: DateTime<Utc>) -> usize {
        let expired: Vec<HeldArtifact> = {
            let mut artifacts = self.artifacts();
            let (expired, live): (Vec<HeldArtifact>, Vec<HeldArtifact>) = artifacts
                .drain(..)
                .partition(|held| held.artifact.is_expired(now, self.artifact_ttl));
            *artifacts = live;
            expired
        };
        let reaped = expired.len();
        for held in expired {
            held.release();
        }
        if reaped > 0 {
            debug!(reaped, "Released expired output artifacts");
        }
        reaped
    }

    fn release_artifacts(&self) {
        let released: Vec<HeldArtifact> = self.artifacts().drain(..).collect();
        for held in released {
            held.release();
        }
    }
}
