//! Path helpers for saving deliverables

use std::path::{Path, PathBuf};

/// Path utilities for naming saved files
pub struct PathUtils;

impl PathUtils {
    /// Reduce a suggested filename to a bare, portable file name.
    ///
    /// Directory components are dropped and characters that are invalid on
    /// common filesystems are replaced with `_`.
    pub fn safe_file_name(suggested: &str) -> String {
        let base = suggested
            .rsplit(|c| c == '/' || c == '\\')
            .next()
            .unwrap_or_default()
            .trim();

        let cleaned: String = base
            .chars()
            .map(|c| match c {
                '<' | '>' | ':' | '"' | '|' | '?' | '*' => '_',
                c if c.is_control() => '_',
                c => c,
            })
            .collect();

        match cleaned.as_str() {
            "" | "." | ".." => "download".to_string(),
            _ => cleaned,
        }
    }

    /// `name.ext` for the first attempt, then `name (n).ext`
    pub fn numbered_candidate(dir: &Path, file_name: &str, attempt: usize) -> PathBuf {
        if attempt == 0 {
            return dir.join(file_name);
        }

        let path = Path::new(file_name);
        let stem = path
            .file_stem()
            .map(|s| s.to_string_lossy().to_string())
            .unwrap_or_else(|| file_name.to_string());
        match path.extension() {
            Some(ext) => dir.join(format!("{} ({}).{}", stem, attempt, ext.to_string_lossy())),
            None => dir.join(format!("{} ({})", stem, attempt)),
        }
    }
}
