// Adapters - External system implementations

pub mod exec_ffmpeg;
pub mod fs_host;
pub mod preview_player;
pub mod probe_ffprobe;
pub mod tracing_log;

// Re-export adapters
pub use exec_ffmpeg::{EngineLocation, FfmpegLoader, FfmpegProcessEngine};
pub use fs_host::FsHostAdapter;
pub use preview_player::PlayerPreview;
pub use probe_ffprobe::FfprobeAdapter;
pub use tracing_log::TracingNoticeAdapter;
