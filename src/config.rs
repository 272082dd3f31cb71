use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use crate::app::is_reserved_key;
use crate::app_dirs::AppDirs;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct Config {
    /// Key that answers a cue.
    pub cue_key: char,
    /// Ring the terminal bell when a cue is due.
    pub sound: bool,
    pub poll_interval_ms: u64,
    pub log_level: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            cue_key: 'e',
            sound: true,
            poll_interval_ms: 5,
            log_level: "info".to_string(),
        }
    }
}

impl Config {
    /// A cue key that collides with a session control falls back to the default.
    pub fn with_usable_cue_key(mut self) -> Self {
        if is_reserved_key(self.cue_key) {
            let fallback = Config::default().cue_key;
            log::warn!(
                "cue key {:?} is bound to a session control, using {:?}",
                self.cue_key,
                fallback
            );
            self.cue_key = fallback;
        }
        self
    }

    /// Unknown level names fall back to `info`.
    pub fn log_level_filter(&self) -> log::LevelFilter {
        log::LevelFilter::from_str(&self.log_level).unwrap_or(log::LevelFilter::Info)
    }
}

pub trait ConfigStore {
    fn load(&self) -> Config;
    fn save(&self, cfg: &Config) -> std::io::Result<()>;
}

#[derive(Debug, Clone)]
pub struct FileConfigStore {
    path: PathBuf,
}

impl FileConfigStore {
    #[allow(clippy::new_without_default)]
    pub fn new() -> Self {
        let path = AppDirs::config_path().unwrap_or_else(|| PathBuf::from("cuedrill_config.json"));
        Self { path }
    }

    pub fn with_path<P: AsRef<Path>>(p: P) -> Self {
        Self {
            path: p.as_ref().to_path_buf(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Default for FileConfigStore {
    fn default() -> Self {
        Self::new()
    }
}

impl ConfigStore for FileConfigStore {
    fn load(&self) -> Config {
        if let Ok(bytes) = fs::read(&self.path) {
            match serde_json::from_slice::<Config>(&bytes) {
                Ok(cfg) => return cfg.with_usable_cue_key(),
                Err(e) => log::warn!("ignoring bad config {}: {e}", self.path.display()),
            }
        }
        Config::default()
    }

    fn save(&self, cfg: &Config) -> std::io::Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        let data = serde_json::to_vec_pretty(cfg).unwrap_or_default();
        fs::write(&self.path, data)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn roundtrip_default_config() {
        let dir = tempdir().unwrap();
        let store = FileConfigStore::with_path(dir.path().join("config.json"));
        let cfg = Config::default();
        store.save(&cfg).unwrap();
        assert_eq!(cfg, store.load());
    }

    #[test]
    fn missing_fields_take_defaults() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.json");
        fs::write(&path, br#"{"cue_key":"k"}"#).unwrap();

        let cfg = FileConfigStore::with_path(&path).load();
        assert_eq!(cfg.cue_key, 'k');
        assert!(cfg.sound);
        assert_eq!(cfg.poll_interval_ms, 5);
    }

    #[test]
    fn corrupt_file_falls_back_to_defaults() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("nested").join("config.json");
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(&path, b"{ not json").unwrap();

        assert_eq!(FileConfigStore::with_path(&path).load(), Config::default());
    }

    #[test]
    fn reserved_cue_key_falls_back() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.json");
        fs::write(&path, br#"{"cue_key":"s","sound":false}"#).unwrap();

        let cfg = FileConfigStore::with_path(&path).load();
        assert_eq!(cfg.cue_key, 'e');
        assert!(!cfg.sound);

        let kept = Config {
            cue_key: 'j',
            ..Config::default()
        };
        assert_eq!(kept.clone().with_usable_cue_key(), kept);
    }

    #[test]
    fn log_level_parsing() {
        let mut cfg = Config::default();
        assert_eq!(cfg.log_level_filter(), log::LevelFilter::Info);
        cfg.log_level = "debug".into();
        assert_eq!(cfg.log_level_filter(), log::LevelFilter::Debug);
        cfg.log_level = "loud".into();
        assert_eq!(cfg.log_level_filter(), log::LevelFilter::Info);
    }
}
