//! Driver settings: JSON file, then environment, then command line.
//! Stored under XDG config dir: $XDG_CONFIG_HOME/hostmon/config.json (fallback ~/.config/hostmon/config.json)

use anyhow::Context;
use serde::{Deserialize, Serialize};
use std::{fs, io, path::Path, path::PathBuf};

pub const MIN_INTERVAL_MS: u64 = 100;
pub const MAX_PRECISION: usize = 6;
pub const INTERVAL_ENV: &str = "HOSTMON_INTERVAL_MS";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MonitorToggles {
    pub cpu: bool,
    pub ram: bool,
    pub disk: bool,
    pub network: bool,
}

impl Default for MonitorToggles {
    fn default() -> Self {
        Self {
            cpu: true,
            ram: true,
            disk: true,
            network: true,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub interval_ms: u64,
    pub byte_precision: usize,
    pub percent_precision: usize,
    pub monitors: MonitorToggles,
    pub log_level: String,
    pub json: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            interval_ms: 1000,
            byte_precision: hostmon_core::format::DEFAULT_BYTE_PRECISION,
            percent_precision: hostmon_core::format::DEFAULT_PERCENT_PRECISION,
            monitors: MonitorToggles::default(),
            log_level: "warn".into(),
            json: false,
        }
    }
}

pub fn config_dir() -> PathBuf {
    if let Some(xdg) = std::env::var_os("XDG_CONFIG_HOME") {
        PathBuf::from(xdg).join("hostmon")
    } else {
        dirs_next::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("hostmon")
    }
}

pub fn config_path() -> PathBuf {
    config_dir().join("config.json")
}

impl Config {
    /// A missing file is not an error; an unreadable or malformed one is.
    pub fn load_from(path: &Path) -> anyhow::Result<Self> {
        match fs::read_to_string(path) {
            Ok(s) => serde_json::from_str(&s)
                .with_context(|| format!("parsing {}", path.display())),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(Self::default()),
            Err(e) => Err(e).with_context(|| format!("reading {}", path.display())),
        }
    }

    pub fn save_to(&self, path: &Path) -> anyhow::Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        let data = serde_json::to_vec_pretty(self)?;
        fs::write(path, data).with_context(|| format!("writing {}", path.display()))
    }

    /// Returns the raw value when the variable is set but not a number.
    pub fn apply_env(&mut self) -> Result<(), String> {
        match std::env::var(INTERVAL_ENV) {
            Ok(v) => match v.trim().parse::<u64>() {
                Ok(ms) => {
                    self.interval_ms = ms;
                    Ok(())
                }
                Err(_) => Err(v),
            },
            Err(_) => Ok(()),
        }
    }

    pub fn validate(&mut self) {
        self.interval_ms = self.interval_ms.max(MIN_INTERVAL_MS);
        self.byte_precision = self.byte_precision.min(MAX_PRECISION);
        self.percent_precision = self.percent_precision.min(MAX_PRECISION);
        if self.log_level.trim().is_empty() {
            self.log_level = "warn".into();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_file_fills_defaults() {
        let cfg: Config = serde_json::from_str(r#"{"interval_ms": 250, "monitors": {"disk": false}}"#).unwrap();
        assert_eq!(cfg.interval_ms, 250);
        assert_eq!(cfg.byte_precision, 2);
        assert!(cfg.monitors.cpu && cfg.monitors.ram && cfg.monitors.network);
        assert!(!cfg.monitors.disk);
        assert_eq!(cfg.log_level, "warn");
    }

    #[test]
    fn validate_clamps() {
        let mut cfg = Config {
            interval_ms: 5,
            byte_precision: 40,
            percent_precision: 9,
            log_level: " ".into(),
            ..Config::default()
        };
        cfg.validate();
        assert_eq!(cfg.interval_ms, MIN_INTERVAL_MS);
        assert_eq!(cfg.byte_precision, MAX_PRECISION);
        assert_eq!(cfg.percent_precision, MAX_PRECISION);
        assert_eq!(cfg.log_level, "warn");
    }
}
