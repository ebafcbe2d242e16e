// In-memory port doubles shared by the application-layer unit tests

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use tokio::sync::Notify;

use crate::app::engine_adapter::{MediaEngineAdapter, OUTPUT_NAME};
use crate::app::session_controller::SessionController;
use crate::domain::errors::DomainError;
use crate::domain::model::SourceFile;
use crate::ports::*;
use crate::utils::object_url::ObjectUrlRegistry;

#[derive(Default)]
pub struct MockEngine {
    pub files: Mutex<HashMap<String, Vec<u8>>>,
    pub exec_calls: Mutex<Vec<Vec<String>>>,
    pub exit_code: Mutex<i32>,
    pub output: Mutex<Vec<u8>>,
    pub exec_error: Mutex<Option<DomainError>>,
    pub gate: Option<Arc<Notify>>,
}

impl MockEngine {
    pub fn producing(output: &[u8]) -> Self {
        Self {
            output: Mutex::new(output.to_vec()),
            ..Default::default()
        }
    }

    pub fn gated(output: &[u8], gate: Arc<Notify>) -> Self {
        Self {
            output: Mutex::new(output.to_vec()),
            gate: Some(gate),
            ..Default::default()
        }
    }

    pub fn set_exit_code(&self, code: i32) {
        *self.exit_code.lock().unwrap() = code;
    }

    pub fn exec_count(&self) -> usize {
        self.exec_calls.lock().unwrap().len()
    }
}

#[async_trait]
impl MediaEnginePort for MockEngine {
    async fn write_file(&self, name: &str, data: &[u8]) -> Result<(), DomainError> {
        self.files.lock().unwrap().insert(name.to_string(), data.to_vec());
        Ok(())
    }

    async fn exec(&self, args: &[String]) -> Result<i32, DomainError> {
        self.exec_calls.lock().unwrap().push(args.to_vec());
        if let Some(gate) = &self.gate {
            gate.notified().await;
        }
        if let Some(err) = self.exec_error.lock().unwrap().clone() {
            return Err(err);
        }
        let code = *self.exit_code.lock().unwrap();
        let output = self.output.lock().unwrap().clone();
        if code == 0 && !output.is_empty() {
            self.files.lock().unwrap().insert(OUTPUT_NAME.to_string(), output);
        }
        Ok(code)
    }

    async fn read_file(&self, name: &str) -> Result<Vec<u8>, DomainError> {
        Ok(self.files.lock().unwrap().get(name).cloned().unwrap_or_default())
    }

    async fn delete_file(&self, name: &str) -> Result<(), DomainError> {
        self.files.lock().unwrap().remove(name);
        Ok(())
    }
}

pub struct MockLoader {
    pub engine: Arc<MockEngine>,
    pub loads: AtomicUsize,
    pub failures_left: AtomicUsize,
}

impl MockLoader {
    pub fn new(engine: Arc<MockEngine>) -> Self {
        Self {
            engine,
            loads: AtomicUsize::new(0),
            failures_left: AtomicUsize::new(0),
        }
    }

    pub fn failing(engine: Arc<MockEngine>, failures: usize) -> Self {
        let loader = Self::new(engine);
        loader.failures_left.store(failures, Ordering::SeqCst);
        loader
    }
}

#[async_trait]
impl EngineLoaderPort for MockLoader {
    async fn load(
        &self,
        _observer: Arc<dyn EngineObserver>,
    ) -> Result<Arc<dyn MediaEnginePort>, DomainError> {
        self.loads.fetch_add(1, Ordering::SeqCst);
        let remaining = self.failures_left.load(Ordering::SeqCst);
        if remaining > 0 {
            self.failures_left.store(remaining - 1, Ordering::SeqCst);
            return Err(DomainError::EngineLoad("runtime not found".to_string()));
        }
        Ok(Arc::clone(&self.engine) as Arc<dyn MediaEnginePort>)
    }
}

pub struct NullObserver;

impl EngineObserver for NullObserver {
    fn on_log(&self, _line: &str) {}
    fn on_progress(&self, _ratio: f64) {}
}

#[derive(Default)]
pub struct MockPreview {
    pub attached: Mutex<Option<String>>,
    pub seeks: Mutex<Vec<f64>>,
    pub plays: AtomicUsize,
    pub fail_play: AtomicBool,
}

impl MockPreview {
    pub fn last_seek(&self) -> Option<f64> {
        self.seeks.lock().unwrap().last().copied()
    }
}

impl PreviewPort for MockPreview {
    fn attach(&self, source: &SourceFile) {
        *self.attached.lock().unwrap() = Some(source.name.clone());
    }

    fn detach(&self) {
        *self.attached.lock().unwrap() = None;
    }

    fn seek(&self, seconds: f64) {
        self.seeks.lock().unwrap().push(seconds);
    }

    fn play(&self) -> Result<(), DomainError> {
        if self.fail_play.load(Ordering::SeqCst) {
            return Err(DomainError::Preview("no player".to_string()));
        }
        self.plays.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    fn position(&self) -> f64 {
        self.last_seek().unwrap_or(0.0)
    }
}

/// Counts how many shared copies have been dropped
pub struct ShareRelease(Arc<AtomicUsize>);

impl Drop for ShareRelease {
    fn drop(&mut self) {
        self.0.fetch_add(1, Ordering::SeqCst);
    }
}

#[derive(Default)]
pub struct MockDelivery {
    pub saved: Mutex<Vec<(String, Vec<u8>)>>,
    pub shared: Mutex<Vec<(String, String)>>,
    pub shares_released: Arc<AtomicUsize>,
    pub share_supported: AtomicBool,
    pub share_rejects: AtomicBool,
    pub save_fails: AtomicBool,
}

impl MockDelivery {
    pub fn saved_names(&self) -> Vec<String> {
        self.saved.lock().unwrap().iter().map(|(n, _)| n.clone()).collect()
    }
}

#[async_trait]
impl DeliveryPort for MockDelivery {
    async fn save(&self, bytes: &[u8], filename: &str) -> Result<PathBuf, DomainError> {
        if self.save_fails.load(Ordering::SeqCst) {
            return Err(DomainError::Delivery("disk full".to_string()));
        }
        self.saved
            .lock()
            .unwrap()
            .push((filename.to_string(), bytes.to_vec()));
        Ok(Path::new("/downloads").join(filename))
    }

    fn can_share(&self) -> bool {
        self.share_supported.load(Ordering::SeqCst)
    }

    async fn share(
        &self,
        _bytes: &[u8],
        filename: &str,
        mime: &str,
    ) -> Result<SharedCopy, DomainError> {
        if self.share_rejects.load(Ordering::SeqCst) {
            return Err(DomainError::Delivery("share cancelled".to_string()));
        }
        self.shared
            .lock()
            .unwrap()
            .push((filename.to_string(), mime.to_string()));
        Ok(SharedCopy::new(
            Path::new("/shared").join(filename),
            ShareRelease(Arc::clone(&self.shares_released)),
        ))
    }
}

#[derive(Default)]
pub struct RecordingNotices {
    pub notices: Mutex<Vec<Notice>>,
}

impl RecordingNotices {
    pub fn count(&self, level: NoticeLevel) -> usize {
        self.notices
            .lock()
            .unwrap()
            .iter()
            .filter(|n| n.level == level)
            .count()
    }

    pub fn last(&self) -> Option<Notice> {
        self.notices.lock().unwrap().last().cloned()
    }
}

impl NoticePort for RecordingNotices {
    fn notify(&self, notice: Notice) {
        self.notices.lock().unwrap().push(notice);
    }
}

/// A controller wired to in-memory doubles
pub struct Harness {
    pub engine: Arc<MockEngine>,
    pub loader: Arc<MockLoader>,
    pub preview: Arc<MockPreview>,
    pub delivery: Arc<MockDelivery>,
    pub notices: Arc<RecordingNotices>,
    pub urls: Arc<ObjectUrlRegistry>,
    pub controller: Arc<SessionController>,
}

impl Harness {
    pub fn new() -> Self {
        Self::with_engine(MockEngine::producing(b"trimmed-bytes"))
    }

    pub fn with_engine(engine: MockEngine) -> Self {
        let engine = Arc::new(engine);
        Self::with_loader(MockLoader::new(Arc::clone(&engine)), engine)
    }

    pub fn with_loader(loader: MockLoader, engine: Arc<MockEngine>) -> Self {
        let loader = Arc::new(loader);
        let preview = Arc::new(MockPreview::default());
        let delivery = Arc::new(MockDelivery::default());
        let notices = Arc::new(RecordingNotices::default());
        let urls = ObjectUrlRegistry::new();

        let adapter = Arc::new(MediaEngineAdapter::new(
            Arc::clone(&loader) as Arc<dyn EngineLoaderPort>,
            Arc::new(NullObserver),
        ));
        let controller = Arc::new(SessionController::new(
            adapter,
            Arc::clone(&preview) as Arc<dyn PreviewPort>,
            Arc::clone(&delivery) as Arc<dyn DeliveryPort>,
            Arc::clone(&notices) as Arc<dyn NoticePort>,
            Arc::clone(&urls),
            chrono::Duration::seconds(30),
        ));

        Self {
            engine,
            loader,
            preview,
            delivery,
            notices,
            urls,
            controller,
        }
    }

    /// Select a video and report the given duration
    pub fn load_video(&self, name: &str, duration: f64) {
        self.controller
            .select_file(video(name))
            .expect("video accepted");
        self.controller
            .on_metadata_loaded(duration)
            .expect("metadata accepted");
    }
}

pub fn video(name: &str) -> SourceFile {
    SourceFile::new(name, "video/mp4", b"source-bytes".to_vec())
}
