use std::collections::HashMap;
use std::path::Path;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use tempfile::TempDir;

use reeltrim::adapters::{EngineLocation, FfmpegLoader, FfprobeAdapter, FsHostAdapter};
use reeltrim::ports::*;
use reeltrim::utils::object_url::ObjectUrlRegistry;
use reeltrim::*;

/// Test doubles for the engine and the preview surface
mod test_utils {
    use super::*;

    /// Engine that copies `input.mp4` to the last argument, or fails with a
    /// fixed exit code
    #[derive(Default)]
    pub struct CopyEngine {
        pub files: Mutex<HashMap<String, Vec<u8>>>,
        pub exit_code: i32,
        pub runs: Mutex<Vec<Vec<String>>>,
    }

    #[async_trait]
    impl MediaEnginePort for CopyEngine {
        async fn write_file(&self, name: &str, data: &[u8]) -> Result<(), DomainError> {
            self.files.lock().unwrap().insert(name.to_string(), data.to_vec());
            Ok(())
        }

        async fn exec(&self, args: &[String]) -> Result<i32, DomainError> {
            self.runs.lock().unwrap().push(args.to_vec());
            if self.exit_code == 0 {
                let mut files = self.files.lock().unwrap();
                let input = files.get("input.mp4").cloned().unwrap_or_default();
                if let Some(out) = args.last() {
                    files.insert(out.clone(), input);
                }
            }
            Ok(self.exit_code)
        }

        async fn read_file(&self, name: &str) -> Result<Vec<u8>, DomainError> {
            Ok(self.files.lock().unwrap().get(name).cloned().unwrap_or_default())
        }

        async fn delete_file(&self, name: &str) -> Result<(), DomainError> {
            self.files.lock().unwrap().remove(name);
            Ok(())
        }
    }

    pub struct StaticLoader(pub Arc<CopyEngine>);

    #[async_trait]
    impl EngineLoaderPort for StaticLoader {
        async fn load(
            &self,
            _observer: Arc<dyn EngineObserver>,
        ) -> Result<Arc<dyn MediaEnginePort>, DomainError> {
            Ok(Arc::clone(&self.0) as Arc<dyn MediaEnginePort>)
        }
    }

    pub struct QuietObserver;

    impl EngineObserver for QuietObserver {
        fn on_log(&self, _line: &str) {}
        fn on_progress(&self, _ratio: f64) {}
    }

    #[derive(Default)]
    pub struct StillPreview;

    impl PreviewPort for StillPreview {
        fn attach(&self, _source: &SourceFile) {}
        fn detach(&self) {}
        fn seek(&self, _seconds: f64) {}
        fn play(&self) -> Result<(), DomainError> {
            Ok(())
        }
        fn position(&self) -> f64 {
            0.0
        }
    }

    #[derive(Default)]
    pub struct Notices(pub Mutex<Vec<Notice>>);

    impl NoticePort for Notices {
        fn notify(&self, notice: Notice) {
            self.0.lock().unwrap().push(notice);
        }
    }

    pub struct Flow {
        pub controller: SessionController,
        pub host: Arc<FsHostAdapter>,
        pub urls: Arc<ObjectUrlRegistry>,
        pub engine: Arc<CopyEngine>,
        pub notices: Arc<Notices>,
        pub out: TempDir,
    }

    pub fn flow(engine: CopyEngine) -> Flow {
        let out = TempDir::new().unwrap();
        let engine = Arc::new(engine);
        let host = Arc::new(FsHostAdapter::new(out.path()));
        let urls = ObjectUrlRegistry::new();
        let notices = Arc::new(Notices::default());
        let adapter = Arc::new(MediaEngineAdapter::new(
            Arc::new(StaticLoader(Arc::clone(&engine))),
            Arc::new(QuietObserver),
        ));
        let controller = SessionController::new(
            adapter,
            Arc::new(StillPreview),
            Arc::clone(&host) as Arc<dyn DeliveryPort>,
            Arc::clone(&notices) as Arc<dyn NoticePort>,
            Arc::clone(&urls),
            chrono::Duration::seconds(60),
        );
        Flow {
            controller,
            host,
            urls,
            engine,
            notices,
            out,
        }
    }

    pub fn tool_available(name: &str) -> bool {
        std::process::Command::new(name)
            .arg("-version")
            .output()
            .map(|o| o.status.success())
            .unwrap_or(false)
    }

    /// Create a short test video using FFmpeg
    pub fn create_test_video(path: &Path, seconds: u32) -> bool {
        std::process::Command::new("ffmpeg")
            .args(["-v", "error", "-f", "lavfi", "-i"])
            .arg(format!("testsrc=duration={}:size=160x120:rate=25", seconds))
            .args(["-c:v", "mpeg4", "-g", "25", "-y"])
            .arg(path)
            .output()
            .map(|o| o.status.success())
            .unwrap_or(false)
    }
}

use test_utils::*;

#[tokio::test]
async fn test_open_trim_and_save_to_disk() {
    let f = flow(CopyEngine::default());
    let src_dir = TempDir::new().unwrap();
    let path = src_dir.path().join("holiday.mp4");
    std::fs::write(&path, b"holiday-bytes").unwrap();

    let source = f.host.open(&path).await.unwrap();
    f.controller.select_file(source).unwrap();
    f.controller.on_metadata_loaded(120.0).unwrap();
    f.controller.set_end_fraction(75.0);
    f.controller.set_start_fraction(25.0);

    let report = f.controller.trim_and_deliver(DeliveryMode::Download).await.unwrap();

    assert_eq!(report.window.start.seconds, 30.0);
    assert_eq!(report.window.clip_duration.seconds, 60.0);
    let saved = f.out.path().join("trimmed_holiday.mp4");
    assert_eq!(report.delivery, DeliveryOutcome::Saved { path: saved.clone() });
    assert_eq!(std::fs::read(&saved).unwrap(), b"holiday-bytes");

    let args = f.engine.runs.lock().unwrap()[0].clone();
    assert_eq!(
        args,
        vec![
            "-ss", "30.000", "-i", "input.mp4", "-t", "60.000", "-c", "copy",
            "-avoid_negative_ts", "make_zero", "output.mp4"
        ]
    );
    assert!(!f.controller.is_processing());
}

#[tokio::test]
async fn test_share_without_handler_saves_instead() {
    let f = flow(CopyEngine::default());
    f.controller
        .select_file(SourceFile::new("clip.mp4", "video/mp4", b"clip".to_vec()))
        .unwrap();
    f.controller.on_metadata_loaded(10.0).unwrap();

    let report = f.controller.trim_and_deliver(DeliveryMode::Share).await.unwrap();
    match report.delivery {
        DeliveryOutcome::SavedAfterShare { path, .. } => {
            assert_eq!(path, f.out.path().join("trimmed_clip.mp4"));
        }
        other => panic!("unexpected outcome: {:?}", other),
    }
    assert!(f
        .notices
        .0
        .lock()
        .unwrap()
        .iter()
        .any(|n| n.message.contains("saving instead")));
}

#[tokio::test]
async fn test_engine_failure_leaves_session_usable() {
    let f = flow(CopyEngine {
        exit_code: 1,
        ..CopyEngine::default()
    });
    f.controller
        .select_file(SourceFile::new("clip.mp4", "video/mp4", b"clip".to_vec()))
        .unwrap();
    f.controller.on_metadata_loaded(10.0).unwrap();

    let err = f
        .controller
        .trim_and_deliver(DeliveryMode::Download)
        .await
        .unwrap_err();

    assert_eq!(err, DomainError::EngineExit { code: 1 });
    assert!(!f.controller.is_processing());
    assert_eq!(f.controller.snapshot().phase, SessionPhase::MetadataReady);
    assert_eq!(std::fs::read_dir(f.out.path()).unwrap().count(), 0);
}

#[tokio::test]
async fn test_download_original_and_clear() {
    let f = flow(CopyEngine::default());
    f.controller
        .select_file(SourceFile::new("raw.mov", "video/quicktime", b"raw".to_vec()))
        .unwrap();

    let path = f.controller.download_original().await.unwrap();
    assert_eq!(path, f.out.path().join("raw.mov"));
    assert_eq!(std::fs::read(&path).unwrap(), b"raw");

    f.controller.clear();
    assert_eq!(f.controller.snapshot().phase, SessionPhase::Empty);
    assert_eq!(f.urls.live_count(), 0);
}

#[tokio::test]
async fn test_real_ffmpeg_trim() {
    if !tool_available("ffmpeg") || !tool_available("ffprobe") {
        eprintln!("ffmpeg/ffprobe not available, skipping");
        return;
    }
    let src_dir = TempDir::new().unwrap();
    let path = src_dir.path().join("sample.mp4");
    if !create_test_video(&path, 4) {
        eprintln!("could not create a test video, skipping");
        return;
    }

    let out = TempDir::new().unwrap();
    let config = AppConfig {
        output_dir: out.path().to_path_buf(),
        ..AppConfig::default()
    };
    let container = DefaultAppContainer::new(&config, false).unwrap();
    let controller = container.session_controller();

    let source = container.source().open(&path).await.unwrap();
    let duration = container.probe().probe_duration(&source).await.unwrap();
    assert!(duration > 3.0);

    controller.select_file(source).unwrap();
    controller.on_metadata_loaded(duration).unwrap();
    controller.set_start_fraction(25.0);
    let report = controller.trim_and_deliver(DeliveryMode::Download).await.unwrap();

    assert!(report.output_bytes > 0);
    let saved = out.path().join("trimmed_sample.mp4");
    assert!(saved.is_file());
    let trimmed = FfprobeAdapter::new("ffprobe")
        .probe_duration(&SourceFile::new("t.mp4", "video/mp4", Vec::new()).with_origin(saved))
        .await
        .unwrap();
    assert!(trimmed > 0.0 && trimmed < duration);
}

#[tokio::test]
async fn test_missing_engine_is_reported() {
    let loader = FfmpegLoader::new(vec![EngineLocation::Bundled(
        Path::new("/definitely/not/here").to_path_buf(),
    )]);
    let adapter = MediaEngineAdapter::new(Arc::new(loader), Arc::new(QuietObserver));

    let err = adapter.ensure_loaded().await.err().unwrap();
    assert!(matches!(err, DomainError::EngineLoad(_)));
    assert!(!adapter.is_loaded());
}
