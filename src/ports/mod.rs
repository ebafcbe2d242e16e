// Ports - Interface definitions (contracts)

use std::any::Any;
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::domain::errors::*;
use crate::domain::model::*;

/// A loaded media engine instance.
///
/// The engine owns a private virtual filesystem; callers stage inputs with
/// [`MediaEnginePort::write_file`], run a command line, and collect outputs
/// with [`MediaEnginePort::read_file`].
#[async_trait]
pub trait MediaEnginePort: Send + Sync {
    /// Write a file into the engine's virtual filesystem
    async fn write_file(&self, name: &str, data: &[u8]) -> Result<(), DomainError>;

    /// Run one command and return its exit code
    async fn exec(&self, args: &[String]) -> Result<i32, DomainError>;

    /// Read a file back; a missing file reads as empty
    async fn read_file(&self, name: &str) -> Result<Vec<u8>, DomainError>;

    /// Remove a file from the virtual filesystem; missing files are ignored
    async fn delete_file(&self, name: &str) -> Result<(), DomainError>;
}

/// Port for bootstrapping a media engine runtime
#[async_trait]
pub trait EngineLoaderPort: Send + Sync {
    /// Locate and start a fresh engine, wiring in the given observer
    async fn load(
        &self,
        observer: Arc<dyn EngineObserver>,
    ) -> Result<Arc<dyn MediaEnginePort>, DomainError>;
}

/// Receives engine diagnostics while a command runs
pub trait EngineObserver: Send + Sync {
    /// One diagnostic line emitted by the engine
    fn on_log(&self, line: &str);

    /// Completion ratio in `[0, 1]` of the running command
    fn on_progress(&self, ratio: f64);
}

/// Port for media metadata probing
#[async_trait]
pub trait ProbePort: Send + Sync {
    /// Total duration of the source in seconds
    async fn probe_duration(&self, source: &SourceFile) -> Result<f64, DomainError>;

    /// Container and stream summary of the source
    async fn probe_summary(&self, source: &SourceFile) -> Result<MediaSummary, DomainError>;
}

/// Container and stream overview reported by a probe
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MediaSummary {
    pub format_name: String,
    pub duration_seconds: f64,
    pub bit_rate: Option<u64>,
    pub streams: Vec<StreamSummary>,
}

/// One stream inside a probed container
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StreamSummary {
    pub index: usize,
    pub codec_type: String,
    pub codec_name: String,
    pub width: Option<u32>,
    pub height: Option<u32>,
}

/// Port for the preview surface
pub trait PreviewPort: Send + Sync {
    /// Point the preview at a newly selected source
    fn attach(&self, source: &SourceFile);

    /// Forget the current source
    fn detach(&self);

    /// Move the playback position
    fn seek(&self, seconds: f64);

    /// Start playback from the current position
    fn play(&self) -> Result<(), DomainError>;

    /// Current playback position
    fn position(&self) -> f64;
}

/// Port for handing artifacts to the host (save and share)
#[async_trait]
pub trait DeliveryPort: Send + Sync {
    /// Save bytes under a suggested filename, returning where they landed
    async fn save(&self, bytes: &[u8], filename: &str) -> Result<PathBuf, DomainError>;

    /// Whether the host can share file payloads at all
    fn can_share(&self) -> bool;

    /// Hand bytes to the host's share action.
    ///
    /// The receiver may read the file after this returns, so the staged copy
    /// lives as long as the returned [`SharedCopy`].
    async fn share(&self, bytes: &[u8], filename: &str, mime: &str)
        -> Result<SharedCopy, DomainError>;
}

/// A staged file handed to a share receiver. Dropping it removes the file.
pub struct SharedCopy {
    path: PathBuf,
    _hold: Box<dyn Any + Send + Sync>,
}

impl SharedCopy {
    /// `hold` owns whatever keeps `path` on disk
    pub fn new(path: PathBuf, hold: impl Any + Send + Sync) -> Self {
        Self {
            path,
            _hold: Box::new(hold),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl fmt::Debug for SharedCopy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("SharedCopy").field(&self.path).finish()
    }
}

/// Port for reading user-chosen files
#[async_trait]
pub trait SourcePort: Send + Sync {
    /// Read a file from disk into a [`SourceFile`] with its declared type
    async fn open(&self, path: &Path) -> Result<SourceFile, DomainError>;
}

/// Severity of a user-visible notice
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NoticeLevel {
    Info,
    Warning,
    Error,
}

/// Human-readable message surfaced to the user
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Notice {
    pub level: NoticeLevel,
    pub message: String,
}

impl Notice {
    pub fn info(message: impl Into<String>) -> Self {
        Self {
            level: NoticeLevel::Info,
            message: message.into(),
        }
    }

    pub fn warning(message: impl Into<String>) -> Self {
        Self {
            level: NoticeLevel::Warning,
            message: message.into(),
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            level: NoticeLevel::Error,
            message: message.into(),
        }
    }
}

/// Port for user-visible notifications
pub trait NoticePort: Send + Sync {
    fn notify(&self, notice: Notice);
}
