//! ReelTrim video trimmer library
//!
//! Session state, trim orchestration and host adapters for cutting a window
//! out of a local video by stream copy through an external media engine.
//!
//! The crate follows a ports-and-adapters layout: `domain` holds the session
//! model and its rules, `ports` the contracts to the outside world, `app` the
//! session controller and engine adapter, `adapters` the ffmpeg, filesystem,
//! preview and notice implementations, and `cli`/`ui` the terminal surface.

pub mod adapters;
pub mod app;
pub mod cli;
pub mod config;
pub mod domain;
pub mod ports;
pub mod ui;
pub mod utils;

// Re-export commonly used types
pub use app::{AppContainer, DefaultAppContainer, MediaEngineAdapter, SessionController};
pub use config::{AppConfig, ConfigOverrides};
pub use domain::errors::DomainError;
pub use domain::model::{
    DeliveryMode, DeliveryOutcome, SessionPhase, SessionSnapshot, SourceFile, TimeSpec, TrimReport,
    TrimWindow,
};
