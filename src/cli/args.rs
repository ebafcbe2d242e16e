//! Command-line argument definitions

use std::path::PathBuf;

use clap::Args;

/// Arguments for the trim command
#[derive(Args, Debug)]
pub struct TrimArgs {
    /// Input video file path
    #[arg(short, long)]
    pub input: PathBuf,

    /// Start handle as a percentage of the duration
    #[arg(short, long, default_value_t = 0.0)]
    pub start: f64,

    /// End handle as a percentage of the duration
    #[arg(short, long, default_value_t = 100.0)]
    pub end: f64,

    /// Share the result instead of saving it; falls back to saving
    #[arg(long)]
    pub share: bool,

    /// Directory for saved files
    #[arg(short, long)]
    pub output_dir: Option<PathBuf>,
}

/// Arguments for the info command
#[derive(Args, Debug)]
pub struct InfoArgs {
    /// Input video file path
    #[arg(short, long)]
    pub input: PathBuf,

    /// Output in JSON format
    #[arg(long)]
    pub json: bool,
}

/// Arguments for the shell command
#[derive(Args, Debug)]
pub struct ShellArgs {
    /// Video to open when the session starts
    #[arg(short, long)]
    pub input: Option<PathBuf>,

    /// Directory for saved files
    #[arg(short, long)]
    pub output_dir: Option<PathBuf>,
}
