//! CLI settings
//!
//! Stored in `{config_dir}/golf-script/settings.json`. A missing or
//! unreadable file falls back to defaults.

use anyhow::{Context, Result, bail};
use golf_script::Scoping;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Let called functions see their caller's locals
    pub dynamic_scoping: bool,
    /// Debounce window for `watch`, in milliseconds
    pub watch_debounce_ms: u64,
    /// Maximum number of REPL history entries kept
    pub history_size: usize,
    /// Used when `RUST_LOG` is unset
    pub log_filter: String,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            dynamic_scoping: false,
            watch_debounce_ms: 100,
            history_size: 1000,
            log_filter: "warn".to_string(),
        }
    }
}

impl Settings {
    pub fn scoping(&self) -> Scoping {
        if self.dynamic_scoping {
            Scoping::Dynamic
        } else {
            Scoping::Lexical
        }
    }
}

pub fn settings_path() -> Option<PathBuf> {
    dirs::config_dir().map(|p| p.join("golf-script").join("settings.json"))
}

pub fn load_settings() -> Settings {
    settings_path().map_or_else(Settings::default, |path| load_settings_from(&path))
}

fn load_settings_from(path: &Path) -> Settings {
    match fs::read_to_string(path) {
        Ok(contents) => serde_json::from_str(&contents).unwrap_or_default(),
        Err(_) => Settings::default(),
    }
}

pub fn save_settings(settings: &Settings) -> Result<PathBuf> {
    let Some(path) = settings_path() else {
        bail!("Could not determine config directory");
    };
    save_settings_to(settings, &path)?;
    Ok(path)
}

fn save_settings_to(settings: &Settings, path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).context("Failed to create config directory")?;
    }
    let json = serde_json::to_string_pretty(settings).context("Failed to serialize settings")?;
    fs::write(path, json).context("Failed to write settings file")
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn temp_file(name: &str) -> PathBuf {
        std::env::temp_dir()
            .join(format!("golf-settings-{}", std::process::id()))
            .join(name)
    }

    #[test]
    fn missing_file_gives_defaults() {
        assert_eq!(
            load_settings_from(Path::new("/nonexistent/golf/settings.json")),
            Settings::default()
        );
    }

    #[test]
    fn partial_file_fills_in_defaults() {
        let path = temp_file("partial.json");
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(&path, r#"{ "dynamic_scoping": true }"#).unwrap();

        let settings = load_settings_from(&path);
        assert!(settings.dynamic_scoping);
        assert_eq!(settings.scoping(), Scoping::Dynamic);
        assert_eq!(settings.watch_debounce_ms, 100);
    }

    #[test]
    fn invalid_json_gives_defaults() {
        let path = temp_file("invalid.json");
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(&path, "not json").unwrap();
        assert_eq!(load_settings_from(&path), Settings::default());
    }

    #[test]
    fn saved_settings_load_back() {
        let path = temp_file("nested/saved.json");
        let settings = Settings {
            history_size: 5,
            log_filter: "golf_script=debug".to_string(),
            ..Settings::default()
        };
        save_settings_to(&settings, &path).unwrap();
        assert_eq!(load_settings_from(&path), settings);
    }
}
