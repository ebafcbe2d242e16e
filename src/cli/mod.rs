//! CLI module for ReelTrim
//!
//! This module handles command-line argument parsing and command execution.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

pub mod args;
pub mod commands;
pub mod shell;

pub use args::{InfoArgs, ShellArgs, TrimArgs};

/// ReelTrim video trimmer
///
/// Pick a local video, choose a window with a dual-handle range and save or
/// share a stream-copied trim.
#[derive(Parser, Debug)]
#[command(name = "reeltrim")]
#[command(about = "ReelTrim - Trim a video to a window without re-encoding")]
#[command(version)]
#[command(long_about = None)]
pub struct Cli {
    /// Logging level (trace, debug, info, warn, error, off)
    #[arg(long, global = true)]
    pub log_level: Option<String>,

    /// Configuration file (TOML or YAML)
    #[arg(long, global = true, env = "REELTRIM_CONFIG")]
    pub config: Option<PathBuf>,

    /// Emit logs as JSON lines
    #[arg(long, global = true)]
    pub json_logs: bool,

    /// The command to execute
    #[command(subcommand)]
    pub command: Commands,
}

/// Available commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Trim a video in one go and save or share the result
    Trim(TrimArgs),
    /// Show container and stream information
    Info(InfoArgs),
    /// Interactive trimming session
    Shell(ShellArgs),
}

impl Cli {
    /// Output directory given on the command line, if any
    pub fn output_dir(&self) -> Option<PathBuf> {
        match &self.command {
            Commands::Trim(args) => args.output_dir.clone(),
            Commands::Shell(args) => args.output_dir.clone(),
            Commands::Info(_) => None,
        }
    }
}
