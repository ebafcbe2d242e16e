//! Interactive line-command session

use std::path::Path;
use std::sync::Arc;

use chrono::Utc;
use tokio::io::{AsyncBufRead, AsyncBufReadExt};
use tracing::debug;

use crate::app::SessionController;
use crate::cli::commands::{describe_report, load_source};
use crate::domain::errors::DomainError;
use crate::domain::model::DeliveryMode;
use crate::ports::{ProbePort, SourcePort};
use crate::ui::{SessionView, SliderInput};

pub const HELP: &str = "\
Commands:
  open <path>     select a video
  start <pct>     move the start handle (0-100, step 0.1)
  end <pct>       move the end handle
  preview         play the selected window
  trim            trim and save
  share           trim and share, saving if sharing is unavailable
  download        save the untouched source
  clear           reset the session
  status          show the session
  help            show this list
  quit            leave";

/// What the loop does after one line
#[derive(Debug, Clone, PartialEq)]
pub enum ShellFlow {
    Continue(String),
    Quit,
}

impl ShellFlow {
    /// Text to print, if any
    pub fn output(&self) -> Option<&str> {
        match self {
            ShellFlow::Continue(text) if !text.is_empty() => Some(text),
            _ => None,
        }
    }
}

pub struct Shell {
    controller: Arc<SessionController>,
    source: Arc<dyn SourcePort>,
    probe: Arc<dyn ProbePort>,
}

impl Shell {
    pub fn new(
        controller: Arc<SessionController>,
        source: Arc<dyn SourcePort>,
        probe: Arc<dyn ProbePort>,
    ) -> Self {
        Self {
            controller,
            source,
            probe,
        }
    }

    /// Read commands until `quit` or end of input
    pub async fn run<R>(&self, input: R) -> std::io::Result<()>
    where
        R: AsyncBufRead + Unpin,
    {
        println!("{}", HELP);
        let mut lines = input.lines();
        while let Some(line) = lines.next_line().await? {
            match self.handle_line(&line).await {
                ShellFlow::Quit => break,
                flow => {
                    if let Some(text) = flow.output() {
                        println!("{}", text);
                    }
                }
            }
        }
        self.controller.clear();
        Ok(())
    }

    /// Run one command line.
    ///
    /// Failures of session actions are already reported through notices, so
    /// only argument problems are echoed back here.
    pub async fn handle_line(&self, line: &str) -> ShellFlow {
        self.controller.reap_artifacts(Utc::now());

        let line = line.trim();
        let (command, rest) = line
            .split_once(char::is_whitespace)
            .map(|(c, r)| (c, r.trim()))
            .unwrap_or((line, ""));
        debug!(command, "Shell command");

        let text = match command.to_ascii_lowercase().as_str() {
            "" => String::new(),
            "open" => self.open(rest).await,
            "start" | "end" => match SliderInput::parse(rest) {
                Ok(value) => {
                    let stored = if command.eq_ignore_ascii_case("start") {
                        self.controller.set_start_fraction(value)
                    } else {
                        self.controller.set_end_fraction(value)
                    };
                    format!("{} set to {:.1}%\n{}", command, stored, self.status())
                }
                Err(e) => e.to_string(),
            },
            "preview" => match self.controller.preview_trim() {
                Ok(()) => format!("Previewing from {}", self.controller.trim_window().start),
                Err(DomainError::NoSourceFile) => "Select a video first".to_string(),
                Err(_) => String::new(),
            },
            "trim" => self.trim(DeliveryMode::Download).await,
            "share" => self.trim(DeliveryMode::Share).await,
            "download" => match self.controller.download_original().await {
                Ok(path) => format!("Saved original to {}", path.display()),
                Err(_) => String::new(),
            },
            "clear" => {
                self.controller.clear();
                self.status()
            }
            "status" => self.status(),
            "help" | "?" => HELP.to_string(),
            "quit" | "exit" => return ShellFlow::Quit,
            other => format!("Unknown command '{}', try 'help'", other),
        };
        ShellFlow::Continue(text)
    }

    async fn open(&self, path: &str) -> String {
        if path.is_empty() {
            return "Usage: open <path>".to_string();
        }
        match load_source(
            &self.controller,
            self.source.as_ref(),
            self.probe.as_ref(),
            Path::new(path),
        )
        .await
        {
            Ok(_) => self.status(),
            // Rejected selections were already reported
            Err(DomainError::UnsupportedMediaType { .. }) => String::new(),
            Err(e) => format!("{}\n{}", e, self.status()),
        }
    }

    async fn trim(&self, mode: DeliveryMode) -> String {
        match self.controller.trim_and_deliver(mode).await {
            Ok(report) => describe_report(&report),
            Err(_) => String::new(),
        }
    }

    fn status(&self) -> String {
        SessionView::render(&self.controller.snapshot())
            .trim_end()
            .to_string()
    }
}
