//! FFprobe adapter for media file probing
//!
//! Runs `ffprobe` with JSON output and maps the result onto
//! [`MediaSummary`]. Sources that were never on disk are staged into a
//! temporary file first.

use std::path::{Path, PathBuf};
use std::process::Stdio;

use async_trait::async_trait;
use serde::Deserialize;
use tokio::process::Command;
use tracing::{debug, instrument};

use crate::domain::errors::*;
use crate::domain::model::*;
use crate::ports::*;

/// FFprobe-based probe adapter
pub struct FfprobeAdapter {
    binary: PathBuf,
}

#[derive(Debug, Deserialize)]
struct ProbeOutput {
    #[serde(default)]
    format: Option<ProbeFormat>,
    #[serde(default)]
    streams: Vec<ProbeStream>,
}

#[derive(Debug, Deserialize)]
struct ProbeFormat {
    #[serde(default)]
    format_name: String,
    duration: Option<String>,
    bit_rate: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ProbeStream {
    index: usize,
    #[serde(default)]
    codec_type: String,
    #[serde(default)]
    codec_name: String,
    width: Option<u32>,
    height: Option<u32>,
}

impl FfprobeAdapter {
    pub fn new(binary: impl Into<PathBuf>) -> Self {
        Self {
            binary: binary.into(),
        }
    }

    pub fn binary(&self) -> &Path {
        &self.binary
    }

    async fn run(&self, path: &Path) -> Result<Vec<u8>, DomainError> {
        let output = Command::new(&self.binary)
            .args(["-v", "error", "-show_format", "-show_streams", "-of", "json"])
            .arg(path)
            .stdin(Stdio::null())
            .output()
            .await
            .map_err(|e| DomainError::Probe(format!("{}: {}", self.binary.display(), e)))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(DomainError::Probe(format!(
                "ffprobe exited with {}: {}",
                output.status,
                stderr.trim()
            )));
        }
        Ok(output.stdout)
    }
}

/// Map ffprobe's JSON document onto a summary
pub fn parse_probe_json(json: &[u8]) -> Result<MediaSummary, DomainError> {
    let parsed: ProbeOutput = serde_json::from_slice(json)
        .map_err(|e| DomainError::Probe(format!("unreadable ffprobe output: {}", e)))?;

    let format = parsed
        .format
        .ok_or_else(|| DomainError::Probe("no container information".to_string()))?;
    let duration_seconds = format
        .duration
        .as_deref()
        .and_then(|d| d.parse::<f64>().ok())
        .filter(|d| d.is_finite() && *d >= 0.0)
        .unwrap_or(0.0);

    Ok(MediaSummary {
        format_name: format.format_name,
        duration_seconds,
        bit_rate: format.bit_rate.as_deref().and_then(|b| b.parse().ok()),
        streams: parsed
            .streams
            .into_iter()
            .map(|s| StreamSummary {
                index: s.index,
                codec_type: s.codec_type,
                codec_name: s.codec_name,
                width: s.width,
                height: s.height,
            })
            .collect(),
    })
}

#[async_trait]
impl ProbePort for FfprobeAdapter {
    async fn probe_duration(&self, source: &SourceFile) -> Result<f64, DomainError> {
        Ok(self.probe_summary(source).await?.duration_seconds)
    }

    #[instrument(skip(self, source), fields(name = %source.name))]
    async fn probe_summary(&self, source: &SourceFile) -> Result<MediaSummary, DomainError> {
        let json = match &source.origin {
            Some(path) => self.run(path).await?,
            None => {
                let staged = tempfile::Builder::new()
                    .prefix("reeltrim-probe-")
                    .tempfile()
                    .map_err(|e| DomainError::Probe(format!("staging source: {}", e)))?;
                tokio::fs::write(staged.path(), &source.bytes)
                    .await
                    .map_err(|e| DomainError::Probe(format!("staging source: {}", e)))?;
                self.run(staged.path()).await?
            }
        };

        let summary = parse_probe_json(&json)?;
        debug!(
            format = %summary.format_name,
            duration = summary.duration_seconds,
            streams = summary.streams.len(),
            "Probed source"
        );
        Ok(summary)
    }
}
