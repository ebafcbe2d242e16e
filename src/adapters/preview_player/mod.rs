// Preview adapter - Tracks the preview position and launches an external player

use std::path::PathBuf;
use std::process::{Child, Command, ExitStatus, Stdio};
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::thread::JoinHandle;

use tracing::{debug, info, warn};

use crate::domain::errors::*;
use crate::domain::model::*;
use crate::ports::*;

#[derive(Debug, Default)]
struct PreviewState {
    source: Option<PathBuf>,
    position: f64,
}

/// Preview surface for a terminal session.
///
/// Seeks only move the recorded position. `play` starts the configured
/// player at that position as `<command> -ss <seconds> <path>`.
pub struct PlayerPreview {
    command: Option<Vec<String>>,
    state: Mutex<PreviewState>,
}

impl PlayerPreview {
    pub fn new(command_line: Option<&str>) -> Self {
        let command = command_line
            .map(|c| c.split_whitespace().map(String::from).collect::<Vec<_>>())
            .filter(|parts| !parts.is_empty());
        Self {
            command,
            state: Mutex::new(PreviewState::default()),
        }
    }

    fn state(&self) -> MutexGuard<'_, PreviewState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Argument vector handed to the player, without the program name
    pub fn player_args(&self) -> Option<Vec<String>> {
        let state = self.state();
        let source = state.source.as_ref()?;
        let mut args: Vec<String> = self
            .command
            .as_ref()
            .map(|c| c[1..].to_vec())
            .unwrap_or_default();
        args.push("-ss".to_string());
        args.push(TimeSpec::from_seconds(state.position).to_engine_arg());
        args.push(source.display().to_string());
        Some(args)
    }

    /// Wait for a detached player in the background so it never lingers
    /// as a zombie
    fn reap(mut child: Child) -> std::io::Result<JoinHandle<std::io::Result<ExitStatus>>> {
        std::thread::Builder::new()
            .name("preview-player".to_string())
            .spawn(move || {
                let status = child.wait();
                debug!(?status, "Preview player exited");
                status
            })
    }
}

impl PreviewPort for PlayerPreview {
    fn attach(&self, source: &SourceFile) {
        let mut state = self.state();
        state.source = source.origin.clone();
        state.position = 0.0;
    }

    fn detach(&self) {
        *self.state() = PreviewState::default();
    }

    fn seek(&self, seconds: f64) {
        let seconds = if seconds.is_finite() { seconds.max(0.0) } else { 0.0 };
        self.state().position = seconds;
        debug!(position = seconds, "Preview seek");
    }

    fn play(&self) -> Result<(), DomainError> {
        let Some(program) = self.command.as_ref().and_then(|c| c.first()) else {
            return Err(DomainError::Preview("no player configured".to_string()));
        };
        let args = self
            .player_args()
            .ok_or_else(|| DomainError::Preview("source is not on disk".to_string()))?;

        let child = Command::new(program)
            .args(&args)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .spawn()
            .map_err(|e| DomainError::Preview(format!("{}: {}", program, e)))?;
        if let Err(e) = Self::reap(child) {
            warn!("Could not watch the preview player: {}", e);
        }
        info!("Preview started at {}", TimeSpec::from_seconds(self.position()));
        Ok(())
    }

    fn position(&self) -> f64 {
        self.state().position
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn on_disk(name: &str) -> SourceFile {
        SourceFile::new(name, "video/mp4", b"v".to_vec()).with_origin(PathBuf::from("/videos").join(name))
    }

    #[test]
    fn test_seek_moves_position() {
        let preview = PlayerPreview::new(None);
        preview.attach(&on_disk("a.mp4"));
        preview.seek(12.5);
        assert_eq!(preview.position(), 12.5);
        preview.seek(-3.0);
        assert_eq!(preview.position(), 0.0);
        preview.seek(f64::NAN);
        assert_eq!(preview.position(), 0.0);
    }

    #[test]
    fn test_player_args() {
        let preview = PlayerPreview::new(Some("ffplay -autoexit"));
        assert_eq!(preview.player_args(), None);

        preview.attach(&on_disk("a.mp4"));
        preview.seek(30.0);
        assert_eq!(
            preview.player_args().unwrap(),
            vec!["-autoexit", "-ss", "30.000", "/videos/a.mp4"]
        );

        preview.detach();
        assert_eq!(preview.player_args(), None);
        assert_eq!(preview.position(), 0.0);
    }

    #[test]
    fn test_play_without_player_fails() {
        let preview = PlayerPreview::new(Some("  "));
        preview.attach(&on_disk("a.mp4"));
        assert!(matches!(preview.play(), Err(DomainError::Preview(_))));
    }

    #[cfg(unix)]
    #[test]
    fn test_finished_player_is_reaped() {
        let child = Command::new("true").spawn().unwrap();
        let status = PlayerPreview::reap(child).unwrap().join().unwrap().unwrap();
        assert!(status.success());
    }

    #[cfg(unix)]
    #[test]
    fn test_play_launches_player() {
        let preview = PlayerPreview::new(Some("true"));
        preview.attach(&on_disk("a.mp4"));
        preview.seek(4.0);
        assert!(preview.play().is_ok());
    }

    #[test]
    fn test_play_needs_a_file_on_disk() {
        let preview = PlayerPreview::new(Some("ffplay"));
        preview.attach(&SourceFile::new("mem.mp4", "video/mp4", b"v".to_vec()));
        assert!(matches!(preview.play(), Err(DomainError::Preview(_))));
    }
}
