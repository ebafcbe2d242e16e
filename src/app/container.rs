use std::sync::Arc;

use crate::adapters::{
    FfmpegLoader, FfprobeAdapter, FsHostAdapter, PlayerPreview, TracingNoticeAdapter,
};
use crate::app::engine_adapter::MediaEngineAdapter;
use crate::app::session_controller::SessionController;
use crate::config::AppConfig;
use crate::domain::errors::DomainError;
use crate::ports::{
    DeliveryPort, EngineLoaderPort, EngineObserver, NoticePort, PreviewPort, ProbePort, SourcePort,
};
use crate::ui::ProgressIndicator;
use crate::utils::object_url::ObjectUrlRegistry;

pub trait AppContainer: Send + Sync {
    fn session_controller(&self) -> Arc<SessionController>;
    fn source(&self) -> Arc<dyn SourcePort>;
    fn probe(&self) -> Arc<dyn ProbePort>;
    fn urls(&self) -> Arc<ObjectUrlRegistry>;
}

pub struct DefaultAppContainer {
    session_controller: Arc<SessionController>,
    source: Arc<dyn SourcePort>,
    probe: Arc<dyn ProbePort>,
    urls: Arc<ObjectUrlRegistry>,
}

impl DefaultAppContainer {
    /// Wire the production adapters. `interactive` turns on the stderr
    /// progress bar and notice echo.
    pub fn new(config: &AppConfig, interactive: bool) -> Result<Self, DomainError> {
        config.validate()?;

        let urls = ObjectUrlRegistry::new();
        let loader = Arc::new(FfmpegLoader::new(config.engine_locations()));
        let observer = Arc::new(ProgressIndicator::new(interactive));
        let engine = Arc::new(MediaEngineAdapter::new(
            loader as Arc<dyn EngineLoaderPort>,
            observer as Arc<dyn EngineObserver>,
        ));

        let mut host = FsHostAdapter::new(config.output_dir.clone());
        if let Some(command) = &config.share_command {
            host = host.with_share_command(command);
        }
        let host = Arc::new(host);
        let preview = Arc::new(PlayerPreview::new(config.player_command.as_deref()));
        let notices = Arc::new(TracingNoticeAdapter::new(interactive));
        let probe = Arc::new(FfprobeAdapter::new(config.probe_binary.clone()));

        let session_controller = Arc::new(SessionController::new(
            engine,
            preview as Arc<dyn PreviewPort>,
            Arc::clone(&host) as Arc<dyn DeliveryPort>,
            notices as Arc<dyn NoticePort>,
            Arc::clone(&urls),
            config.artifact_ttl(),
        ));

        Ok(Self {
            session_controller,
            source: host as Arc<dyn SourcePort>,
            probe: probe as Arc<dyn ProbePort>,
            urls,
        })
    }
}

impl AppContainer for DefaultAppContainer {
    fn session_controller(&self) -> Arc<SessionController> {
        Arc::clone(&self.session_controller)
    }

    fn source(&self) -> Arc<dyn SourcePort> {
        Arc::clone(&self.source)
    }

    fn probe(&self) -> Arc<dyn ProbePort> {
        Arc::clone(&self.probe)
    }

    fn urls(&self) -> Arc<ObjectUrlRegistry> {
        Arc::clone(&self.urls)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::model::SessionPhase;

    #[test]
    fn test_container_starts_with_empty_session() {
        let dir = tempfile::tempdir().unwrap();
        let config = AppConfig {
            output_dir: dir.path().to_path_buf(),
            ..AppConfig::default()
        };
        let container = DefaultAppContainer::new(&config, false).unwrap();

        assert_eq!(
            container.session_controller().snapshot().phase,
            SessionPhase::Empty
        );
        assert_eq!(container.urls().live_count(), 0);
    }

    #[test]
    fn test_container_rejects_invalid_config() {
        let config = AppConfig {
            log_level: "chatty".to_string(),
            ..AppConfig::default()
        };
        assert!(DefaultAppContainer::new(&config, false).is_err());
    }
}
