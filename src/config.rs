// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::analytics::{SeriesWindow, DEFAULT_WINDOW_DAYS};
use crate::db;

pub const LOG_ENV: &str = "SPENDTRACE_LOG";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Slots in each daily series; days past it fold into the last slot.
    pub series_days: u32,
    /// Cache database, relative to the data dir unless absolute.
    pub cache_file: String,
    /// Key prefix separating installations that share a cache file.
    pub namespace: String,
    pub log_filter: String,
    pub log_json: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            series_days: DEFAULT_WINDOW_DAYS,
            cache_file: "spendtrace.sqlite".to_string(),
            namespace: "default".to_string(),
            log_filter: "warn".to_string(),
            log_json: false,
        }
    }
}

impl Config {
    pub fn window(&self) -> SeriesWindow {
        SeriesWindow::new(self.series_days)
    }

    pub fn cache_path(&self) -> Result<PathBuf> {
        let p = PathBuf::from(&self.cache_file);
        if p.is_absolute() {
            return Ok(p);
        }
        Ok(db::data_dir()?.join(p))
    }

    /// `$SPENDTRACE_LOG` wins over the configured filter.
    pub fn effective_log_filter(&self) -> String {
        std::env::var(LOG_ENV)
            .ok()
            .filter(|s| !s.trim().is_empty())
            .unwrap_or_else(|| self.log_filter.clone())
    }
}

pub fn config_path() -> Result<PathBuf> {
    Ok(db::data_dir()?.join("config.toml"))
}

pub fn load_config() -> Result<Config> {
    load_config_from(&config_path()?)
}

pub fn load_config_from(p: &Path) -> Result<Config> {
    if !p.exists() {
        return Ok(Config::default());
    }
    let s = fs::read_to_string(p).with_context(|| format!("read {}", p.display()))?;
    toml::from_str(&s).with_context(|| format!("parse {}", p.display()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn missing_file_gives_defaults() {
        let dir = tempdir().unwrap();
        let cfg = load_config_from(&dir.path().join("absent.toml")).unwrap();
        assert_eq!(cfg, Config::default());
        assert_eq!(cfg.window().days(), 30);
    }

    #[test]
    fn partial_file_keeps_other_defaults() {
        let dir = tempdir().unwrap();
        let p = dir.path().join("config.toml");
        fs::write(&p, "series_days = 31\nlog_json = true\n").unwrap();
        let cfg = load_config_from(&p).unwrap();
        assert_eq!(cfg.series_days, 31);
        assert!(cfg.log_json);
        assert_eq!(cfg.cache_file, "spendtrace.sqlite");
    }

    #[test]
    fn bad_toml_is_an_error() {
        let dir = tempdir().unwrap();
        let p = dir.path().join("config.toml");
        fs::write(&p, "series_days = \"many\"").unwrap();
        assert!(load_config_from(&p).is_err());
    }

    #[test]
    fn absolute_cache_file_is_used_as_is() {
        let dir = tempdir().unwrap();
        let abs = dir.path().join("c.sqlite");
        let cfg = Config {
            cache_file: abs.display().to_string(),
            ..Config::default()
        };
        assert_eq!(cfg.cache_path().unwrap(), abs);
    }
}
