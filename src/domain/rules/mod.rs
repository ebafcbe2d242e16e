// Domain rules - Business rules and validation logic

use std::path::Path;

/// Business rules for the dual-handle trim range
pub struct BoundsRules;

impl BoundsRules {
    pub const FRACTION_MIN: f64 = 0.0;
    pub const FRACTION_MAX: f64 = 100.0;
    /// Separation forced between the handles when one is pushed onto the other
    pub const MIN_GAP: f64 = 1.0;
    /// Granularity of the range inputs
    pub const SLIDER_STEP: f64 = 0.1;

    /// Clamp a raw handle value into `[0, 100]`. NaN maps to 0.
    pub fn clamp_fraction(value: f64) -> f64 {
        if value.is_nan() {
            return Self::FRACTION_MIN;
        }
        value.clamp(Self::FRACTION_MIN, Self::FRACTION_MAX)
    }

    /// New start value given the current end handle
    pub fn coerce_start(value: f64, end: f64) -> f64 {
        let value = Self::clamp_fraction(value);
        if value >= end {
            Self::clamp_fraction(end - Self::MIN_GAP)
        } else {
            value
        }
    }

    /// New end value given the current start handle
    pub fn coerce_end(value: f64, start: f64) -> f64 {
        let value = Self::clamp_fraction(value);
        if value <= start {
            Self::clamp_fraction(start + Self::MIN_GAP)
        } else {
            value
        }
    }

    /// Snap a value onto the slider step grid
    pub fn quantize(value: f64) -> f64 {
        // Divide by the step count per unit so 12.3 does not come out as 12.300000000000001
        (value / Self::SLIDER_STEP).round() / (1.0 / Self::SLIDER_STEP)
    }

    /// Absolute time for a handle position
    pub fn fraction_to_seconds(fraction: f64, duration_seconds: f64) -> f64 {
        if !duration_seconds.is_finite() || duration_seconds <= 0.0 {
            return 0.0;
        }
        fraction / 100.0 * duration_seconds
    }
}

/// Business rules for accepted input media
pub struct MediaTypeRules;

impl MediaTypeRules {
    /// Only files that declare a video type are accepted
    pub fn is_video_mime(mime: &str) -> bool {
        mime.trim().to_ascii_lowercase().starts_with("video/")
    }

    /// Declared type for a file on disk, from its extension
    pub fn mime_from_path(path: &Path) -> String {
        let ext = path
            .extension()
            .map(|e| e.to_string_lossy().to_ascii_lowercase())
            .unwrap_or_default();

        let mime = match ext.as_str() {
            "mp4" | "m4v" => "video/mp4",
            "mov" | "qt" => "video/quicktime",
            "webm" => "video/webm",
            "mkv" => "video/x-matroska",
            "avi" => "video/x-msvideo",
            "ts" | "mts" | "m2ts" => "video/mp2t",
            "mpg" | "mpeg" => "video/mpeg",
            "ogv" => "video/ogg",
            "3gp" => "video/3gpp",
            "flv" => "video/x-flv",
            "wmv" => "video/x-ms-wmv",
            "png" => "image/png",
            "jpg" | "jpeg" => "image/jpeg",
            "gif" => "image/gif",
            "webp" => "image/webp",
            "mp3" => "audio/mpeg",
            "wav" => "audio/wav",
            "m4a" => "audio/mp4",
            "ogg" => "audio/ogg",
            "txt" => "text/plain",
            "json" => "application/json",
            _ => "application/octet-stream",
        };
        mime.to_string()
    }
}

/// Business rules for naming outputs
pub struct OutputNaming;

impl OutputNaming {
    pub const TRIMMED_PREFIX: &'static str = "trimmed_";

    /// Extension of the container the engine writes
    pub const OUTPUT_EXTENSION: &'static str = "mp4";

    /// Suggested filename for a trimmed copy of `source_name`.
    ///
    /// The stem is kept and the extension names the engine's MP4 output.
    pub fn trimmed_filename(source_name: &str) -> String {
        let stem = Path::new(source_name)
            .file_stem()
            .map(|n| n.to_string_lossy().to_string())
            .filter(|n| !n.is_empty())
            .unwrap_or_else(|| "video".to_string());
        format!("{}{}.{}", Self::TRIMMED_PREFIX, stem, Self::OUTPUT_EXTENSION)
    }
}
