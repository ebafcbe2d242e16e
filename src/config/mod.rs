//! Configuration loading and hierarchy management
//!
//! Precedence, highest first: command line, `REELTRIM_*` environment
//! variables, configuration file (`reeltrim.toml` or `reeltrim.yaml`),
//! built-in defaults.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::adapters::exec_ffmpeg::{EngineLocation, FfmpegLoader};
use crate::domain::errors::DomainError;

/// Prefix of every environment override
pub const ENV_PREFIX: &str = "REELTRIM_";

/// Files looked up in the working directory when no `--config` is given
pub const DEFAULT_CONFIG_FILES: &[&str] = &["reeltrim.toml", "reeltrim.yaml", "reeltrim.yml"];

// One year
const MAX_TTL_SECS: u64 = 365 * 24 * 60 * 60;

const LOG_LEVELS: &[&str] = &["trace", "debug", "info", "warn", "error", "off"];

/// Application configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct AppConfig {
    /// Self-hosted engine directories, searched before the defaults
    pub engine_dirs: Vec<PathBuf>,
    /// Exact ffmpeg executable, searched first
    pub engine_binary: Option<PathBuf>,
    pub probe_binary: PathBuf,
    /// Player used by the preview action, e.g. `ffplay -autoexit`
    pub player_command: Option<String>,
    /// Share handler; the staged file path is appended
    pub share_command: Option<String>,
    /// Where saved files land
    pub output_dir: PathBuf,
    /// How long an output artifact's address stays live
    pub artifact_ttl_secs: u64,
    pub log_level: String,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            engine_dirs: Vec::new(),
            engine_binary: None,
            probe_binary: PathBuf::from("ffprobe"),
            player_command: None,
            share_command: None,
            output_dir: PathBuf::from("."),
            artifact_ttl_secs: 60,
            log_level: "info".to_string(),
        }
    }
}

/// Values given on the command line
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ConfigOverrides {
    pub log_level: Option<String>,
    pub output_dir: Option<PathBuf>,
}

impl AppConfig {
    /// Full hierarchy: defaults, file, process environment, CLI
    pub fn load(
        explicit_file: Option<&Path>,
        overrides: &ConfigOverrides,
    ) -> Result<Self, DomainError> {
        let mut config = match explicit_file {
            Some(path) => Self::from_file(path)?,
            None => match Self::discover(Path::new(".")) {
                Some(path) => Self::from_file(&path)?,
                None => {
                    debug!("No configuration file found, using defaults");
                    Self::default()
                }
            },
        };

        config.apply_env(std::env::vars())?;
        config.apply_overrides(overrides);
        config.validate()?;
        Ok(config)
    }

    /// First default configuration file present in `dir`
    pub fn discover(dir: &Path) -> Option<PathBuf> {
        DEFAULT_CONFIG_FILES
            .iter()
            .map(|name| dir.join(name))
            .find(|path| path.is_file())
    }

    /// Parse a TOML or YAML file, chosen by extension
    pub fn from_file(path: &Path) -> Result<Self, DomainError> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            DomainError::Config(format!("Failed to read {}: {}", path.display(), e))
        })?;

        let is_yaml = path
            .extension()
            .map(|e| e.eq_ignore_ascii_case("yaml") || e.eq_ignore_ascii_case("yml"))
            .unwrap_or(false);

        let config = if is_yaml {
            serde_yaml::from_str(&content).map_err(|e| {
                DomainError::Config(format!("Failed to parse {}: {}", path.display(), e))
            })?
        } else {
            toml::from_str(&content).map_err(|e| {
                DomainError::Config(format!("Failed to parse {}: {}", path.display(), e))
            })?
        };
        info!("Loaded configuration from {}", path.display());
        Ok(config)
    }

    /// Apply `REELTRIM_*` overrides from an environment listing
    pub fn apply_env<I>(&mut self, vars: I) -> Result<(), DomainError>
    where
        I: IntoIterator<Item = (String, String)>,
    {
        for (key, value) in vars {
            let Some(name) = key.strip_prefix(ENV_PREFIX) else {
                continue;
            };
            match name {
                "ENGINE_DIRS" => {
                    self.engine_dirs = std::env::split_paths(&value).collect();
                }
                "ENGINE_BINARY" => self.engine_binary = non_empty(&value).map(PathBuf::from),
                "PROBE_BINARY" => self.probe_binary = PathBuf::from(value.trim()),
                "PLAYER_COMMAND" => self.player_command = non_empty(&value),
                "SHARE_COMMAND" => self.share_command = non_empty(&value),
                "OUTPUT_DIR" => self.output_dir = PathBuf::from(value.trim()),
                "ARTIFACT_TTL_SECS" => {
                    self.artifact_ttl_secs = value.trim().parse().map_err(|_| {
                        DomainError::Config(format!("{} must be a whole number of seconds", key))
                    })?;
                }
                "LOG_LEVEL" => self.log_level = value.trim().to_ascii_lowercase(),
                _ => continue,
            }
            debug!("Environment override {}", key);
        }
        Ok(())
    }

    pub fn apply_overrides(&mut self, overrides: &ConfigOverrides) {
        if let Some(level) = &overrides.log_level {
            self.log_level = level.to_ascii_lowercase();
        }
        if let Some(dir) = &overrides.output_dir {
            self.output_dir = dir.clone();
        }
    }

    pub fn validate(&self) -> Result<(), DomainError> {
        if !LOG_LEVELS.contains(&self.log_level.as_str()) {
            return Err(DomainError::Config(format!(
                "Unknown log level '{}', expected one of {}",
                self.log_level,
                LOG_LEVELS.join(", ")
            )));
        }
        if self.artifact_ttl_secs == 0 {
            return Err(DomainError::Config(
                "artifact_ttl_secs must be greater than zero".to_string(),
            ));
        }
        if self.probe_binary.as_os_str().is_empty() {
            return Err(DomainError::Config("probe_binary must not be empty".to_string()));
        }
        Ok(())
    }

    /// Engine search order: explicit binary, configured directories, then
    /// the built-in self-hosted directories and `PATH`
    pub fn engine_locations(&self) -> Vec<EngineLocation> {
        let mut locations = Vec::new();
        if let Some(binary) = &self.engine_binary {
            locations.push(EngineLocation::Binary(binary.clone()));
        }
        locations.extend(self.engine_dirs.iter().cloned().map(EngineLocation::Bundled));
        locations.extend(FfmpegLoader::default_locations());
        locations
    }

    pub fn artifact_ttl(&self) -> chrono::Duration {
        let secs = self.artifact_ttl_secs.min(MAX_TTL_SECS);
        chrono::Duration::seconds(secs as i64)
    }
}

fn non_empty(value: &str) -> Option<String> {
    let value = value.trim();
    if value.is_empty() {
        None
    } else {
        Some(value.to_string())
    }
}
