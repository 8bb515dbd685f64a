//! Entry filtering: which archive entries are treated as images.

use crate::core::config::DedupConfig;
use std::collections::HashSet;
use std::path::Path;

/// Resource-fork directory added by the macOS archiver
const MACOS_METADATA_DIR: &str = "__MACOSX";

/// Decides from an entry's archive path whether it is an image
#[derive(Debug, Clone)]
pub struct EntryFilter {
    /// Lowercase extensions without the leading dot
    extensions: HashSet<String>,
    /// Whether dot-named entries are processed
    include_hidden: bool,
}

impl EntryFilter {
    /// Create a new filter with default supported extensions
    pub fn new() -> Self {
        Self::from_config(&DedupConfig::default())
    }

    pub fn from_config(config: &DedupConfig) -> Self {
        Self {
            extensions: config
                .valid_extensions
                .iter()
                .map(|e| DedupConfig::normalize_extension(e))
                .collect(),
            include_hidden: config.include_hidden,
        }
    }

    /// Process dot-named entries or skip them
    pub fn with_hidden(mut self, include: bool) -> Self {
        self.include_hidden = include;
        self
    }

    /// Whether the entry should be ignored as hidden.
    ///
    /// `__MACOSX` resource forks are always hidden; a component starting
    /// with `.` only when hidden entries are excluded.
    pub fn is_hidden(&self, path: &str) -> bool {
        let mut components = path.split('/').filter(|c| !c.is_empty());
        if self.include_hidden {
            components.any(|c| c == MACOS_METADATA_DIR)
        } else {
            components.any(|c| c == MACOS_METADATA_DIR || c.starts_with('.'))
        }
    }

    /// Whether the entry's extension is in the allow-list (case-insensitive)
    pub fn is_image(&self, path: &str) -> bool {
        let name = path.rsplit('/').next().unwrap_or(path);
        Path::new(name)
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| self.extensions.contains(&e.to_lowercase()))
            .unwrap_or(false)
    }
}

impl Default for EntryFilter {
    fn default() -> Self {
        Self::new()
    }
}
