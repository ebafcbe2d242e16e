//! Command implementations

use std::path::Path;

use anyhow::{bail, Context, Result};
use tracing::{info, warn};

use crate::app::{AppContainer, SessionController};
use crate::cli::args::{InfoArgs, ShellArgs, TrimArgs};
use crate::cli::shell::Shell;
use crate::domain::errors::DomainError;
use crate::domain::model::{DeliveryMode, DeliveryOutcome, TimeSpec, TrimReport};
use crate::domain::rules::BoundsRules;
use crate::ports::{MediaSummary, ProbePort, SourcePort};
use crate::utils::Utils;

/// Read a file, hand it to the session and report its duration.
///
/// A failed probe leaves the session with the file selected but no
/// metadata, as a preview that never loads would.
pub async fn load_source(
    controller: &SessionController,
    source: &dyn SourcePort,
    probe: &dyn ProbePort,
    path: &Path,
) -> Result<f64, DomainError> {
    let file = source.open(path).await?;
    let probe_copy = file.clone();
    controller.select_file(file)?;

    let duration = probe.probe_duration(&probe_copy).await?;
    controller.on_metadata_loaded(duration)?;
    Ok(duration)
}

/// Execute the trim command
pub async fn trim(container: &dyn AppContainer, args: TrimArgs) -> Result<()> {
    info!("Starting trim of {}", args.input.display());
    let (start, end) = requested_handles(args.start, args.end)?;

    let controller = container.session_controller();
    let duration = load_source(
        &controller,
        container.source().as_ref(),
        container.probe().as_ref(),
        &args.input,
    )
    .await
    .with_context(|| format!("Failed to load {}", args.input.display()))?;
    info!(duration, "Source ready");

    let stored_start = controller.set_start_fraction(start);
    let stored_end = controller.set_end_fraction(end);
    if stored_start != args.start || stored_end != args.end {
        warn!(
            start = stored_start,
            end = stored_end,
            "Handles were adjusted to the slider range and step"
        );
    }

    let mode = if args.share {
        DeliveryMode::Share
    } else {
        DeliveryMode::Download
    };
    let report = controller
        .trim_and_deliver(mode)
        .await
        .context("Trim failed")?;

    println!("{}", describe_report(&report));
    controller.clear();
    Ok(())
}

/// Snap `--start`/`--end` to the slider step, rejecting an empty window
pub fn requested_handles(start: f64, end: f64) -> Result<(f64, f64)> {
    if start.is_nan() || end.is_nan() {
        bail!("--start and --end must be numbers");
    }
    let snap = |value: f64| BoundsRules::quantize(BoundsRules::clamp_fraction(value));
    let (snapped_start, snapped_end) = (snap(start), snap(end));
    if snapped_start >= snapped_end {
        bail!("--start ({}) must be below --end ({})", start, end);
    }
    Ok((snapped_start, snapped_end))
}

/// Execute the info command
pub async fn info(container: &dyn AppContainer, args: InfoArgs) -> Result<()> {
    let file = container
        .source()
        .open(&args.input)
        .await
        .with_context(|| format!("Failed to open {}", args.input.display()))?;
    let summary = container
        .probe()
        .probe_summary(&file)
        .await
        .with_context(|| format!("Failed to probe {}", args.input.display()))?;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&summary)?);
    } else {
        print!("{}", describe_summary(&file.name, file.size, &summary));
    }
    Ok(())
}

/// Execute the shell command
pub async fn shell(container: &dyn AppContainer, args: ShellArgs) -> Result<()> {
    let shell = Shell::new(
        container.session_controller(),
        container.source(),
        container.probe(),
    );
    if let Some(input) = &args.input {
        let flow = shell.handle_line(&format!("open {}", input.display())).await;
        if let Some(text) = flow.output() {
            println!("{}", text);
        }
    }
    shell
        .run(tokio::io::BufReader::new(tokio::io::stdin()))
        .await
        .context("Shell input failed")
}

/// One-line summary of a finished trim
pub fn describe_report(report: &TrimReport) -> String {
    let window = format!(
        "{} -> {} ({}, {})",
        report.window.start,
        report.window.end(),
        report.window.clip_duration,
        Utils::format_file_size(report.output_bytes as u64)
    );
    match &report.delivery {
        DeliveryOutcome::Saved { path } => {
            format!("Saved {} {}", path.display(), window)
        }
        DeliveryOutcome::Shared => format!("Shared {} {}", report.filename, window),
        DeliveryOutcome::SavedAfterShare { path, reason } => format!(
            "Saved {} {} (share unavailable: {})",
            path.display(),
            window,
            reason
        ),
    }
}

/// Human-readable probe report
pub fn describe_summary(name: &str, size: u64, summary: &MediaSummary) -> String {
    let mut out = format!(
        "File:      {}\nSize:      {}\nContainer: {}\nDuration:  {}\n",
        name,
        Utils::format_file_size(size),
        summary.format_name,
        TimeSpec::from_seconds(summary.duration_seconds)
    );
    if let Some(bit_rate) = summary.bit_rate {
        out.push_str(&format!("Bit rate:  {} kb/s\n", bit_rate / 1000));
    }
    for stream in &summary.streams {
        out.push_str(&format!(
            "Stream #{}: {} ({})",
            stream.index, stream.codec_type, stream.codec_name
        ));
        if let (Some(w), Some(h)) = (stream.width, stream.height) {
            out.push_str(&format!(" {}x{}", w, h));
        }
        out.push('\n');
    }
    out
}
