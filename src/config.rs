//! Grid options and their sources.
//!
//! Options come from built-in defaults, then the user config file, then the
//! format options of a scene, then the command line. Each later source only
//! overrides the keys it names.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::error::GridError;

pub const DEFAULT_RESOLUTION: u32 = 4;

/// Which value identifies "the same feature" when duplicates are collapsed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DedupBy {
    /// The layer's item field; falls back to the payload when the layer has none.
    #[default]
    Item,
    /// The full evaluated attribute payload.
    Payload,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GridOptions {
    #[serde(default = "default_resolution")]
    pub resolution: u32,
    /// `true` keeps one record per submitted shape; `false` collapses shapes
    /// with the same identity into one record.
    #[serde(default = "default_true")]
    pub duplicates: bool,
    #[serde(default)]
    pub dedup_by: DedupBy,
}

fn default_resolution() -> u32 {
    DEFAULT_RESOLUTION
}

fn default_true() -> bool {
    true
}

impl Default for GridOptions {
    fn default() -> Self {
        GridOptions {
            resolution: default_resolution(),
            duplicates: default_true(),
            dedup_by: DedupBy::default(),
        }
    }
}

impl GridOptions {
    /// Apply a single `KEY=VALUE` format option. Keys are case-insensitive;
    /// unknown keys are ignored.
    pub fn apply(&mut self, key: &str, value: &str) -> Result<(), GridError> {
        let invalid = || GridError::InvalidOption {
            key: key.to_string(),
            value: value.to_string(),
        };
        match key.to_ascii_uppercase().as_str() {
            "UTFRESOLUTION" => {
                let resolution: u32 = value.trim().parse().map_err(|_| invalid())?;
                if resolution == 0 {
                    return Err(GridError::InvalidResolution(resolution));
                }
                self.resolution = resolution;
            }
            "DUPLICATES" => {
                self.duplicates = parse_bool(value).ok_or_else(invalid)?;
            }
            "UTFDEDUP" => {
                self.dedup_by = match value.trim().to_ascii_lowercase().as_str() {
                    "item" => DedupBy::Item,
                    "payload" => DedupBy::Payload,
                    _ => return Err(invalid()),
                };
            }
            _ => log::debug!("ignoring unknown format option {key}={value}"),
        }
        Ok(())
    }

    /// Apply a sequence of options in order.
    pub fn apply_all<'a, I>(&mut self, options: I) -> Result<(), GridError>
    where
        I: IntoIterator<Item = (&'a str, &'a str)>,
    {
        for (key, value) in options {
            self.apply(key, value)?;
        }
        Ok(())
    }

    /// Apply a `KEY=VALUE` string, as given on the command line.
    pub fn apply_pair(&mut self, pair: &str) -> Result<(), GridError> {
        let (key, value) = pair.split_once('=').ok_or_else(|| GridError::InvalidOption {
            key: pair.to_string(),
            value: String::new(),
        })?;
        self.apply(key.trim(), value)
    }
}

fn parse_bool(value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "true" | "yes" | "on" | "1" => Some(true),
        "false" | "no" | "off" | "0" => Some(false),
        _ => None,
    }
}

/// Per-user defaults, read from `~/.config/utfgrid/config.json`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UserConfig {
    #[serde(default)]
    pub grid: GridOptions,
}

impl UserConfig {
    pub fn load() -> Self {
        let config_path = Self::config_path();
        match std::fs::read_to_string(&config_path) {
            Ok(json) => Self::from_json(&json).unwrap_or_else(|e| {
                log::warn!(
                    "invalid config {} ({e}), using defaults",
                    config_path.display()
                );
                Self::default()
            }),
            Err(_) => Self::default(),
        }
    }

    pub fn from_json(json: &str) -> Result<Self, GridError> {
        let config: UserConfig = serde_json::from_str(json)?;
        if config.grid.resolution == 0 {
            return Err(GridError::InvalidResolution(0));
        }
        Ok(config)
    }

    fn config_path() -> PathBuf {
        let home = std::env::var("HOME").unwrap_or_else(|_| ".".into());
        let mut path = PathBuf::from(home);
        path.push(".config");
        path.push("utfgrid");
        path.push("config.json");
        path
    }
}
