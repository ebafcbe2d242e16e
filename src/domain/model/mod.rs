// Domain models - Core types and data structures

use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::errors::DomainError;
use crate::domain::rules::BoundsRules;
use crate::utils::object_url::{ObjectUrl, ObjectUrlRegistry};

/// Time specification - represents time in seconds with fractional precision
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Serialize, Deserialize)]
pub struct TimeSpec {
    pub seconds: f64,
}

impl TimeSpec {
    /// Create a new TimeSpec from seconds
    pub fn from_seconds(seconds: f64) -> Self {
        Self { seconds }
    }

    /// Format as HH:MM:SS.mmm, or MM:SS.mmm below one hour
    pub fn format_hms(&self) -> String {
        let total_ms = (self.seconds.max(0.0) * 1000.0).round() as u64;
        let hours = total_ms / 3_600_000;
        let minutes = (total_ms % 3_600_000) / 60_000;
        let seconds = (total_ms % 60_000) / 1000;
        let milliseconds = total_ms % 1000;

        if hours > 0 {
            format!("{:02}:{:02}:{:02}.{:03}", hours, minutes, seconds, milliseconds)
        } else {
            format!("{:02}:{:02}.{:03}", minutes, seconds, milliseconds)
        }
    }

    /// Render as a plain seconds argument for the engine command line
    pub fn to_engine_arg(&self) -> String {
        format!("{:.3}", self.seconds.max(0.0))
    }
}

impl fmt::Display for TimeSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.format_hms())
    }
}

/// A user-chosen input file held in memory
#[derive(Clone, PartialEq)]
pub struct SourceFile {
    pub name: String,
    pub size: u64,
    pub mime: String,
    pub bytes: Arc<[u8]>,
    /// Where the bytes were read from, when they came from disk
    pub origin: Option<PathBuf>,
}

impl SourceFile {
    pub fn new(name: impl Into<String>, mime: impl Into<String>, bytes: Vec<u8>) -> Self {
        let bytes: Arc<[u8]> = Arc::from(bytes);
        Self {
            name: name.into(),
            size: bytes.len() as u64,
            mime: mime.into(),
            bytes,
            origin: None,
        }
    }

    pub fn with_origin(mut self, origin: PathBuf) -> Self {
        self.origin = Some(origin);
        self
    }
}

impl fmt::Debug for SourceFile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SourceFile")
            .field("name", &self.name)
            .field("size", &self.size)
            .field("mime", &self.mime)
            .field("origin", &self.origin)
            .finish()
    }
}

/// Trim bounds as percentages of the total duration.
///
/// Always satisfies `0 <= start < end <= 100`; the only way to change the
/// values is through [`TrimBounds::set_start`] and [`TrimBounds::set_end`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TrimBounds {
    start: f64,
    end: f64,
}

impl TrimBounds {
    pub fn start(&self) -> f64 {
        self.start
    }

    pub fn end(&self) -> f64 {
        self.end
    }

    /// Move the start handle, returning the stored value
    pub fn set_start(&mut self, value: f64) -> f64 {
        self.start = BoundsRules::coerce_start(value, self.end);
        self.start
    }

    /// Move the end handle, returning the stored value
    pub fn set_end(&mut self, value: f64) -> f64 {
        self.end = BoundsRules::coerce_end(value, self.start);
        self.end
    }

    /// Reset the end handle to the full duration
    pub fn reset_end(&mut self) {
        self.end = BoundsRules::FRACTION_MAX;
    }
}

impl Default for TrimBounds {
    fn default() -> Self {
        Self {
            start: BoundsRules::FRACTION_MIN,
            end: BoundsRules::FRACTION_MAX,
        }
    }
}

/// Absolute window handed to the media engine
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TrimWindow {
    pub start: TimeSpec,
    pub clip_duration: TimeSpec,
}

impl TrimWindow {
    /// Convert percentage bounds into absolute seconds
    pub fn from_bounds(bounds: &TrimBounds, duration_seconds: f64) -> Self {
        let duration = if duration_seconds.is_finite() && duration_seconds > 0.0 {
            duration_seconds
        } else {
            0.0
        };
        Self {
            start: TimeSpec::from_seconds(bounds.start() / 100.0 * duration),
            clip_duration: TimeSpec::from_seconds((bounds.end() - bounds.start()) / 100.0 * duration),
        }
    }

    pub fn end(&self) -> TimeSpec {
        TimeSpec::from_seconds(self.start.seconds + self.clip_duration.seconds)
    }
}

/// How a trimmed artifact leaves the application
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DeliveryMode {
    Download,
    Share,
}

impl DeliveryMode {
    /// Parse delivery mode from string
    pub fn parse(mode_str: &str) -> Result<Self, DomainError> {
        match mode_str.to_lowercase().as_str() {
            "download" | "save" => Ok(DeliveryMode::Download),
            "share" => Ok(DeliveryMode::Share),
            _ => Err(DomainError::BadArgs(format!(
                "Invalid delivery mode: {}. Valid modes: download, share",
                mode_str
            ))),
        }
    }
}

impl fmt::Display for DeliveryMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DeliveryMode::Download => write!(f, "download"),
            DeliveryMode::Share => write!(f, "share"),
        }
    }
}

/// Where the session currently sits in its lifecycle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionPhase {
    Empty,
    FileSelected,
    MetadataReady,
    Trimming,
}

/// The single mutable aggregate for one editing session
#[derive(Debug, Default, PartialEq)]
pub struct Session {
    pub source_file: Option<SourceFile>,
    pub preview_reference: Option<ObjectUrl>,
    /// Value shown by the file picker
    pub input_value: Option<String>,
    pub duration_seconds: f64,
    pub bounds: TrimBounds,
    pub is_processing: bool,
    pub controls_visible: bool,
    pub actions_visible: bool,
}

impl Session {
    /// Create an empty session
    pub fn new() -> Self {
        Self::default()
    }

    pub fn phase(&self) -> SessionPhase {
        if self.source_file.is_none() {
            SessionPhase::Empty
        } else if self.is_processing {
            SessionPhase::Trimming
        } else if self.controls_visible {
            SessionPhase::MetadataReady
        } else {
            SessionPhase::FileSelected
        }
    }

    pub fn trim_window(&self) -> TrimWindow {
        TrimWindow::from_bounds(&self.bounds, self.duration_seconds)
    }

    pub fn snapshot(&self) -> SessionSnapshot {
        SessionSnapshot {
            phase: self.phase(),
            file_name: self.source_file.as_ref().map(|f| f.name.clone()),
            file_size: self.source_file.as_ref().map(|f| f.size),
            mime: self.source_file.as_ref().map(|f| f.mime.clone()),
            preview_reference: self.preview_reference.as_ref().map(|u| u.as_str().to_string()),
            duration_seconds: self.duration_seconds,
            start_fraction: self.bounds.start(),
            end_fraction: self.bounds.end(),
            window: self.trim_window(),
            is_processing: self.is_processing,
            controls_visible: self.controls_visible,
            actions_visible: self.actions_visible,
        }
    }
}

/// Read-only copy of the session used for rendering and status output
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionSnapshot {
    pub phase: SessionPhase,
    pub file_name: Option<String>,
    pub file_size: Option<u64>,
    pub mime: Option<String>,
    pub preview_reference: Option<String>,
    pub duration_seconds: f64,
    pub start_fraction: f64,
    pub end_fraction: f64,
    pub window: TrimWindow,
    pub is_processing: bool,
    pub controls_visible: bool,
    pub actions_visible: bool,
}

/// Trimmed bytes wrapped for delivery
pub struct OutputArtifact {
    pub filename: String,
    pub url: ObjectUrl,
    pub size: usize,
    pub issued_at: DateTime<Utc>,
}

impl OutputArtifact {
    pub const MIME: &'static str = "video/mp4";

    /// Wrap engine output into a deliverable artifact with its own address
    pub fn new(registry: &Arc<ObjectUrlRegistry>, bytes: Vec<u8>, filename: String) -> Self {
        let size = bytes.len();
        let url = registry.create(Arc::from(bytes), Self::MIME);
        Self {
            filename,
            url,
            size,
            issued_at: Utc::now(),
        }
    }

    /// Whether this artifact has outlived its time-to-live
    pub fn is_expired(&self, now: DateTime<Utc>, ttl: chrono::Duration) -> bool {
        now - self.issued_at >= ttl
    }
}

impl fmt::Debug for OutputArtifact {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OutputArtifact")
            .field("filename", &self.filename)
            .field("url", &self.url)
            .field("size", &self.size)
            .field("issued_at", &self.issued_at)
            .finish()
    }
}

/// Where a delivered artifact ended up
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum DeliveryOutcome {
    Saved { path: PathBuf },
    Shared,
    /// Share was unsupported or rejected; the artifact was saved instead
    SavedAfterShare { path: PathBuf, reason: String },
}

/// Result of one trim-and-deliver action
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrimReport {
    pub window: TrimWindow,
    pub filename: String,
    pub output_bytes: usize,
    pub delivery: DeliveryOutcome,
}
