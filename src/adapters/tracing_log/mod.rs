// Tracing notice adapter - User-visible notices on stderr, mirrored into the log

use tracing::{error, info, warn};

use crate::ports::*;

/// Notice adapter that logs through `tracing` and optionally echoes to stderr
pub struct TracingNoticeAdapter {
    echo: bool,
}

impl TracingNoticeAdapter {
    pub fn new(echo: bool) -> Self {
        Self { echo }
    }

    /// Text shown to the user for one notice
    pub fn render(notice: &Notice) -> String {
        let prefix = match notice.level {
            NoticeLevel::Info => "info",
            NoticeLevel::Warning => "warning",
            NoticeLevel::Error => "error",
        };
        format!("[{}] {}", prefix, notice.message)
    }
}

impl NoticePort for TracingNoticeAdapter {
    fn notify(&self, notice: Notice) {
        match notice.level {
            NoticeLevel::Info => info!(notice = %notice.message),
            NoticeLevel::Warning => warn!(notice = %notice.message),
            NoticeLevel::Error => error!(notice = %notice.message),
        }
        if self.echo {
            eprintln!("{}", Self::render(&notice));
        }
    }
}
