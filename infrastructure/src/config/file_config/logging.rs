//! Log file settings from TOML (`[logging]` section)

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// # Example
///
/// ```toml
/// [logging]
/// usage_log = "~/.local/share/appforge/usage.jsonl"
/// file = "/tmp/appforge.log"
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FileLoggingConfig {
    /// JSONL file receiving one record per provider call
    pub usage_log: Option<PathBuf>,
    /// Diagnostic log file (in addition to stderr)
    pub file: Option<PathBuf>,
}

impl FileLoggingConfig {
    pub fn usage_log_path(&self) -> Option<PathBuf> {
        self.usage_log.as_deref().map(expand_home)
    }

    pub fn file_path(&self) -> Option<PathBuf> {
        self.file.as_deref().map(expand_home)
    }
}

/// Expand a leading `~/` to the home directory
fn expand_home(path: &std::path::Path) -> PathBuf {
    match path.strip_prefix("~") {
        Ok(rest) => dirs::home_dir()
            .map(|home| home.join(rest))
            .unwrap_or_else(|| path.to_path_buf()),
        Err(_) => path.to_path_buf(),
    }
}
