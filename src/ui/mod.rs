//! Terminal presentation of a trim session
//!
//! Everything here is a pure function of a [`SessionSnapshot`] except the
//! progress indicator, which writes to stderr while the engine runs.

use std::io::Write;
use std::sync::atomic::{AtomicBool, Ordering};

use tracing::debug;

use crate::domain::errors::DomainError;
use crate::domain::model::{SessionPhase, SessionSnapshot, TimeSpec};
use crate::domain::rules::BoundsRules;
use crate::ports::EngineObserver;
use crate::utils::Utils;

/// Text rendering of the session state
pub struct SessionView;

impl SessionView {
    pub const BAR_WIDTH: usize = 40;

    pub fn render(snapshot: &SessionSnapshot) -> String {
        let mut out = String::new();

        match (&snapshot.file_name, snapshot.file_size) {
            (Some(name), Some(size)) => out.push_str(&format!(
                "File:     {} ({}, {})\n",
                name,
                Utils::format_file_size(size),
                snapshot.mime.as_deref().unwrap_or("unknown type")
            )),
            _ => out.push_str("File:     none selected\n"),
        }

        if snapshot.controls_visible {
            out.push_str(&format!(
                "Range:    {}\n",
                Self::range_bar(snapshot.start_fraction, snapshot.end_fraction)
            ));
            out.push_str(&format!(
                "Handles:  {:.1}% .. {:.1}%\n",
                snapshot.start_fraction, snapshot.end_fraction
            ));
            out.push_str(&format!(
                "Window:   {} -> {} ({} of {})\n",
                snapshot.window.start,
                snapshot.window.end(),
                snapshot.window.clip_duration,
                TimeSpec::from_seconds(snapshot.duration_seconds)
            ));
        } else if snapshot.phase == SessionPhase::FileSelected {
            out.push_str("Range:    waiting for metadata\n");
        }

        if snapshot.actions_visible {
            out.push_str("Actions:  preview, trim, share, download, clear\n");
        }
        if snapshot.is_processing {
            out.push_str("Status:   trimming...\n");
        }
        out
    }

    /// Dual-handle bar such as `[----|=======|-----]`
    pub fn range_bar(start: f64, end: f64) -> String {
        let width = Self::BAR_WIDTH;
        let to_cell = |fraction: f64| {
            let cell = (BoundsRules::clamp_fraction(fraction) / 100.0 * (width - 1) as f64).round();
            cell as usize
        };
        let (lo, hi) = (to_cell(start), to_cell(end));

        let cells: String = (0..width)
            .map(|i| {
                if i == lo || i == hi {
                    '|'
                } else if i > lo && i < hi {
                    '='
                } else {
                    '-'
                }
            })
            .collect();
        format!("[{}]", cells)
    }
}

/// Parsing of typed slider positions
pub struct SliderInput;

impl SliderInput {
    /// Parse `25`, `25.34` or `25%`, snapped to the slider step and
    /// clamped into range
    pub fn parse(input: &str) -> Result<f64, DomainError> {
        let trimmed = input.trim();
        let number = trimmed.strip_suffix('%').unwrap_or(trimmed).trim();
        let value: f64 = number
            .parse()
            .map_err(|_| DomainError::BadArgs(format!("'{}' is not a percentage", input.trim())))?;
        if !value.is_finite() {
            return Err(DomainError::BadArgs(format!(
                "'{}' is not a percentage",
                input.trim()
            )));
        }
        Ok(BoundsRules::quantize(BoundsRules::clamp_fraction(value)))
    }
}

/// Engine observer that mirrors diagnostics into the log and draws a
/// progress bar on stderr
pub struct ProgressIndicator {
    draw: bool,
    drawing: AtomicBool,
}

impl ProgressIndicator {
    const WIDTH: usize = 30;

    pub fn new(draw: bool) -> Self {
        Self {
            draw,
            drawing: AtomicBool::new(false),
        }
    }

    pub fn render_bar(ratio: f64) -> String {
        let ratio = if ratio.is_finite() { ratio.clamp(0.0, 1.0) } else { 0.0 };
        let filled = (ratio * Self::WIDTH as f64).round() as usize;
        format!(
            "[{}{}] {}",
            "#".repeat(filled),
            ".".repeat(Self::WIDTH - filled),
            Utils::format_ratio(ratio)
        )
    }
}

impl EngineObserver for ProgressIndicator {
    fn on_log(&self, line: &str) {
        debug!(target: "reeltrim::engine", "{}", line);
    }

    fn on_progress(&self, ratio: f64) {
        if !self.draw {
            return;
        }
        let mut stderr = std::io::stderr().lock();
        let _ = write!(stderr, "\rTrimming {}", Self::render_bar(ratio));
        if ratio >= 1.0 {
            if self.drawing.swap(false, Ordering::SeqCst) {
                let _ = writeln!(stderr);
            }
        } else {
            self.drawing.store(true, Ordering::SeqCst);
        }
        let _ = stderr.flush();
    }
}
