use directories::ProjectDirs;
use std::path::PathBuf;

/// Centralized application directory resolution
pub struct AppDirs;

impl AppDirs {
    pub fn config_path() -> Option<PathBuf> {
        ProjectDirs::from("", "", "cuedrill").map(|pd| pd.config_dir().join("config.json"))
    }

    /// Log file under `$HOME/.local/state/cuedrill`, since the TUI owns stderr.
    pub fn log_path() -> Option<PathBuf> {
        Self::state_dir().map(|dir| dir.join("cuedrill.log"))
    }

    fn state_dir() -> Option<PathBuf> {
        if let Ok(home) = std::env::var("HOME") {
            Some(PathBuf::from(home).join(".local").join("state").join("cuedrill"))
        } else {
            ProjectDirs::from("", "", "cuedrill").map(|pd| pd.data_local_dir().to_path_buf())
        }
    }
}
