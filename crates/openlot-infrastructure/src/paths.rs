//! Profile directory resolution.

use std::path::PathBuf;

/// Default root directory for persisted profile state.
///
/// Falls back to the current directory when the platform reports no data
/// directory (headless test environments).
pub fn default_profile_root() -> PathBuf {
    dirs::data_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("openlot")
}
