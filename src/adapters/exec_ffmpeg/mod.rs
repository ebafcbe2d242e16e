//! FFmpeg execution adapter
//!
//! Runs the `ffmpeg` executable as a child process. Each engine instance owns
//! a private temporary directory that serves as its virtual filesystem, so
//! command lines only ever reference bare file names.

use std::path::{Component, Path, PathBuf};
use std::process::Stdio;
use std::sync::Arc;

use async_trait::async_trait;
use tempfile::TempDir;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::process::Command;
use tracing::{debug, info, warn};
use walkdir::WalkDir;

use crate::domain::errors::DomainError;
use crate::ports::{EngineLoaderPort, EngineObserver, MediaEnginePort};

/// Where to look for the engine runtime, tried in order
#[derive(Debug, Clone, PartialEq)]
pub enum EngineLocation {
    /// An exact executable path
    Binary(PathBuf),
    /// A self-hosted directory searched for the executable
    Bundled(PathBuf),
    /// Directories on the `PATH` environment variable
    SystemPath,
}

/// Loads an ffmpeg runtime from the configured locations
pub struct FfmpegLoader {
    locations: Vec<EngineLocation>,
    binary_name: String,
}

impl FfmpegLoader {
    /// Name of the self-hosted engine directory
    pub const BUNDLE_DIR: &'static str = "engine";
    const SEARCH_DEPTH: usize = 3;

    pub fn new(locations: Vec<EngineLocation>) -> Self {
        let binary_name = if cfg!(windows) { "ffmpeg.exe" } else { "ffmpeg" };
        Self {
            locations,
            binary_name: binary_name.to_string(),
        }
    }

    /// Default search order: bundle next to the executable, bundle in the
    /// working directory, then `PATH`
    pub fn default_locations() -> Vec<EngineLocation> {
        let mut locations = Vec::new();
        if let Some(exe_dir) = std::env::current_exe()
            .ok()
            .and_then(|exe| exe.parent().map(Path::to_path_buf))
        {
            locations.push(EngineLocation::Bundled(exe_dir.join(Self::BUNDLE_DIR)));
        }
        locations.push(EngineLocation::Bundled(PathBuf::from(Self::BUNDLE_DIR)));
        locations.push(EngineLocation::SystemPath);
        locations
    }

    pub fn locations(&self) -> &[EngineLocation] {
        &self.locations
    }

    /// Candidate executables in search order
    pub fn candidates(&self) -> Vec<PathBuf> {
        let mut found = Vec::new();
        for location in &self.locations {
            match location {
                EngineLocation::Binary(path) => {
                    if path.is_file() {
                        found.push(path.clone());
                    }
                }
                EngineLocation::Bundled(dir) => {
                    if !dir.is_dir() {
                        continue;
                    }
                    let hits = WalkDir::new(dir)
                        .max_depth(Self::SEARCH_DEPTH)
                        .into_iter()
                        .filter_map(Result::ok)
                        .filter(|entry| entry.file_type().is_file())
                        .filter(|entry| entry.file_name().to_string_lossy() == self.binary_name)
                        .map(|entry| entry.into_path());
                    found.extend(hits);
                }
                EngineLocation::SystemPath => {
                    if let Some(path_var) = std::env::var_os("PATH") {
                        found.extend(
                            std::env::split_paths(&path_var)
                                .map(|dir| dir.join(&self.binary_name))
                                .filter(|candidate| candidate.is_file()),
                        );
                    }
                }
            }
        }
        found
    }

    /// Check that a candidate actually runs
    async fn verify(binary: &Path) -> Result<(), DomainError> {
        let status = Command::new(binary)
            .arg("-version")
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .status()
            .await
            .map_err(|e| DomainError::EngineLoad(format!("{}: {}", binary.display(), e)))?;

        if status.success() {
            Ok(())
        } else {
            Err(DomainError::EngineLoad(format!(
                "{} -version exited with {}",
                binary.display(),
                status
            )))
        }
    }
}

#[async_trait]
impl EngineLoaderPort for FfmpegLoader {
    async fn load(
        &self,
        observer: Arc<dyn EngineObserver>,
    ) -> Result<Arc<dyn MediaEnginePort>, DomainError> {
        let mut attempts = Vec::new();
        for binary in self.candidates() {
            match Self::verify(&binary).await {
                Ok(()) => {
                    info!("Using media engine at {}", binary.display());
                    let engine = FfmpegProcessEngine::new(binary, observer)?;
                    return Ok(Arc::new(engine));
                }
                Err(e) => {
                    warn!("Skipping engine candidate: {}", e);
                    attempts.push(e.to_string());
                }
            }
        }

        let searched: Vec<String> = self
            .locations
            .iter()
            .map(|l| match l {
                EngineLocation::Binary(p) | EngineLocation::Bundled(p) => p.display().to_string(),
                EngineLocation::SystemPath => "$PATH".to_string(),
            })
            .collect();
        let mut message = format!("{} not found in {}", self.binary_name, searched.join(", "));
        if !attempts.is_empty() {
            message.push_str(&format!(" ({})", attempts.join("; ")));
        }
        Err(DomainError::EngineLoad(message))
    }
}

/// One running ffmpeg runtime with its own scratch directory
pub struct FfmpegProcessEngine {
    binary: PathBuf,
    workspace: TempDir,
    observer: Arc<dyn EngineObserver>,
}

impl FfmpegProcessEngine {
    pub fn new(binary: PathBuf, observer: Arc<dyn EngineObserver>) -> Result<Self, DomainError> {
        let workspace = tempfile::Builder::new()
            .prefix("reeltrim-engine-")
            .tempdir()
            .map_err(|e| DomainError::EngineLoad(format!("Failed to create workspace: {}", e)))?;
        debug!("Engine workspace at {}", workspace.path().display());
        Ok(Self {
            binary,
            workspace,
            observer,
        })
    }

    pub fn binary(&self) -> &Path {
        &self.binary
    }

    /// Map a virtual file name into the workspace, refusing anything that
    /// could escape it
    fn resolve(&self, name: &str) -> Result<PathBuf, DomainError> {
        let mut components = Path::new(name).components();
        match (components.next(), components.next()) {
            (Some(Component::Normal(file)), None) => Ok(self.workspace.path().join(file)),
            _ => Err(DomainError::EngineFs(format!("invalid virtual file name: {}", name))),
        }
    }
}

#[async_trait]
impl MediaEnginePort for FfmpegProcessEngine {
    async fn write_file(&self, name: &str, data: &[u8]) -> Result<(), DomainError> {
        let path = self.resolve(name)?;
        tokio::fs::write(&path, data)
            .await
            .map_err(|e| DomainError::EngineFs(format!("write {}: {}", name, e)))
    }

    async fn exec(&self, args: &[String]) -> Result<i32, DomainError> {
        let clip_duration = clip_duration_arg(args);

        let mut child = Command::new(&self.binary)
            .args(["-hide_banner", "-nostdin", "-y"])
            .args(args)
            .current_dir(self.workspace.path())
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| DomainError::EngineLoad(format!("failed to start engine: {}", e)))?;

        if let Some(stderr) = child.stderr.take() {
            // ffmpeg rewrites its progress line with '\r'
            let mut reader = BufReader::new(stderr);
            let mut buf = Vec::new();
            loop {
                buf.clear();
                let read = reader
                    .read_until(b'\r', &mut buf)
                    .await
                    .map_err(|e| DomainError::EngineFs(format!("engine output: {}", e)))?;
                if read == 0 {
                    break;
                }
                let chunk = String::from_utf8_lossy(&buf);
                for line in chunk.split(|c| c == '\r' || c == '\n').filter(|l| !l.trim().is_empty()) {
                    self.observer.on_log(line);
                    if let (Some(elapsed), Some(total)) = (parse_progress_time(line), clip_duration) {
                        if total > 0.0 {
                            self.observer.on_progress((elapsed / total).clamp(0.0, 1.0));
                        }
                    }
                }
            }
        }

        let status = child
            .wait()
            .await
            .map_err(|e| DomainError::EngineFs(format!("waiting for engine: {}", e)))?;
        if status.success() {
            self.observer.on_progress(1.0);
        }
        // Killed by a signal leaves no code
        Ok(status.code().unwrap_or(-1))
    }

    async fn read_file(&self, name: &str) -> Result<Vec<u8>, DomainError> {
        let path = self.resolve(name)?;
        match tokio::fs::read(&path).await {
            Ok(bytes) => Ok(bytes),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(Vec::new()),
            Err(e) => Err(DomainError::EngineFs(format!("read {}: {}", name, e))),
        }
    }

    async fn delete_file(&self, name: &str) -> Result<(), DomainError> {
        let path = self.resolve(name)?;
        match tokio::fs::remove_file(&path).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(DomainError::EngineFs(format!("delete {}: {}", name, e))),
        }
    }
}

/// Value following `-t` in an argument vector
fn clip_duration_arg(args: &[String]) -> Option<f64> {
    args.windows(2)
        .find(|pair| pair[0] == "-t")
        .and_then(|pair| pair[1].parse().ok())
}

/// Extract the `time=HH:MM:SS.ms` field of an ffmpeg progress line
pub fn parse_progress_time(line: &str) -> Option<f64> {
    let rest = &line[line.find("time=")? + "time=".len()..];
    let stamp = rest.split_whitespace().next()?;

    let mut seconds = 0.0;
    for part in stamp.split(':') {
        let value: f64 = part.parse().ok()?;
        seconds = seconds * 60.0 + value;
    }
    if seconds.is_finite() && seconds >= 0.0 {
        Some(seconds)
    } else {
        None
    }
}
