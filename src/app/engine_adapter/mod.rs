// Media engine adapter - Lazy engine bootstrap and the trim command

use std::sync::Arc;

use tokio::sync::OnceCell;
use tracing::{debug, info, instrument, warn};

use crate::domain::errors::DomainError;
use crate::domain::model::TimeSpec;
use crate::ports::{EngineLoaderPort, EngineObserver, MediaEnginePort};

/// Name the source is staged under in the engine filesystem
pub const INPUT_NAME: &str = "input.mp4";
/// Name the engine writes the trimmed copy to
pub const OUTPUT_NAME: &str = "output.mp4";

/// Hides engine bootstrap cost and exposes a narrow trim operation.
///
/// The engine handle is created on first use and then reused for the
/// lifetime of the adapter. A failed load is not memoized.
pub struct MediaEngineAdapter {
    loader: Arc<dyn EngineLoaderPort>,
    observer: Arc<dyn EngineObserver>,
    handle: OnceCell<Arc<dyn MediaEnginePort>>,
}

impl MediaEngineAdapter {
    pub fn new(loader: Arc<dyn EngineLoaderPort>, observer: Arc<dyn EngineObserver>) -> Self {
        Self {
            loader,
            observer,
            handle: OnceCell::new(),
        }
    }

    /// Whether an engine handle has been created
    pub fn is_loaded(&self) -> bool {
        self.handle.initialized()
    }

    /// Return the cached engine, loading it first if needed
    pub async fn ensure_loaded(&self) -> Result<Arc<dyn MediaEnginePort>, DomainError> {
        let engine = self
            .handle
            .get_or_try_init(|| async {
                info!("Loading media engine");
                let engine = self.loader.load(Arc::clone(&self.observer)).await;
                match &engine {
                    Ok(_) => info!("Media engine ready"),
                    Err(e) => warn!("Media engine failed to load: {}", e),
                }
                engine
            })
            .await?;

        Ok(Arc::clone(engine))
    }

    /// Argument vector for a stream-copy trim.
    ///
    /// `-ss` before `-i` seeks on the demuxer, so the cut lands on the
    /// keyframe at or before `start`.
    pub fn trim_args(start: TimeSpec, clip_duration: TimeSpec) -> Vec<String> {
        vec![
            "-ss".to_string(),
            start.to_engine_arg(),
            "-i".to_string(),
            INPUT_NAME.to_string(),
            "-t".to_string(),
            clip_duration.to_engine_arg(),
            "-c".to_string(),
            "copy".to_string(),
            "-avoid_negative_ts".to_string(),
            "make_zero".to_string(),
            OUTPUT_NAME.to_string(),
        ]
    }

    /// Trim `input` to `[start, start + clip_duration)` without re-encoding
    #[instrument(skip(self, input), fields(input_len = input.len()))]
    pub async fn trim(
        &self,
        input: &[u8],
        start: TimeSpec,
        clip_duration: TimeSpec,
    ) -> Result<Vec<u8>, DomainError> {
        let engine = self.ensure_loaded().await?;

        engine.delete_file(OUTPUT_NAME).await?;
        engine.write_file(INPUT_NAME, input).await?;

        let args = Self::trim_args(start, clip_duration);
        debug!("Running engine: {}", args.join(" "));
        let output = match engine.exec(&args).await {
            Ok(0) => engine.read_file(OUTPUT_NAME).await,
            Ok(code) => Err(DomainError::EngineExit { code }),
            Err(e) => Err(e),
        };

        // Free the staged copies before reporting
        if let Err(e) = engine.delete_file(INPUT_NAME).await {
            warn!("Failed to remove staged input: {}", e);
        }
        if let Err(e) = engine.delete_file(OUTPUT_NAME).await {
            warn!("Failed to remove engine output: {}", e);
        }

        let output = output?;
        if output.is_empty() {
            return Err(DomainError::EmptyOutput);
        }

        info!(output_len = output.len(), "Engine trim finished");
        Ok(output)
    }
}
