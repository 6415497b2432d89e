use std::path::{Path, PathBuf};

use anyhow::Context;
use serde::Deserialize;
use tracing::info;

/// Optional config file read from the working directory; the pipeline takes
/// no CLI flags.
pub const CONFIG_FILE: &str = "toolkit-import.json";

/// Fixed run configuration. Everything else (the per-table directory
/// layout) is derived from `source_root`, matching the legacy export:
/// members and notes at the root, diary tables under `diary/`, event tables
/// and ideas under `events/`, event roles under `events/roles/`, volunteer
/// roles under `roles/`.
#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    pub source_root: PathBuf,
    pub database_path: PathBuf,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            source_root: PathBuf::from("source_data"),
            database_path: PathBuf::from("toolkit.sqlite3"),
        }
    }
}

impl Config {
    pub fn load() -> anyhow::Result<Config> {
        Self::load_from(Path::new(CONFIG_FILE))
    }

    pub fn load_from(path: &Path) -> anyhow::Result<Config> {
        if !path.exists() {
            return Ok(Config::default());
        }
        info!("reading configuration from {}", path.display());
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("reading {}", path.display()))?;
        let config: Config = serde_json::from_str(&text)
            .with_context(|| format!("parsing {}", path.display()))?;
        Ok(config)
    }

    pub fn member_path(&self) -> PathBuf {
        self.source_root.clone()
    }

    pub fn diary_path(&self) -> PathBuf {
        self.source_root.join("diary")
    }

    pub fn events_path(&self) -> PathBuf {
        self.source_root.join("events")
    }

    pub fn event_roles_path(&self) -> PathBuf {
        self.source_root.join("events").join("roles")
    }

    pub fn vol_roles_path(&self) -> PathBuf {
        self.source_root.join("roles")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_file_yields_defaults() {
        let config = Config::load_from(Path::new("/nonexistent/toolkit-import.json"))
            .expect("defaults");
        assert_eq!(config.source_root, PathBuf::from("source_data"));
        assert_eq!(config.database_path, PathBuf::from("toolkit.sqlite3"));
    }

    #[test]
    fn derived_paths_follow_the_legacy_layout() {
        let config = Config {
            source_root: PathBuf::from("/data"),
            database_path: PathBuf::from("/tmp/out.sqlite3"),
        };
        assert_eq!(config.member_path(), PathBuf::from("/data"));
        assert_eq!(config.diary_path(), PathBuf::from("/data/diary"));
        assert_eq!(config.events_path(), PathBuf::from("/data/events"));
        assert_eq!(config.event_roles_path(), PathBuf::from("/data/events/roles"));
        assert_eq!(config.vol_roles_path(), PathBuf::from("/data/roles"));
    }
}
