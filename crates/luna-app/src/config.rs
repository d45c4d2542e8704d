//! Configuration management for Luna.
//!
//! Loads configuration from `~/.config/luna/config.json`. Every key is
//! optional; missing keys take their defaults.

use std::fs;
use std::net::{IpAddr, Ipv4Addr};
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::Context;
use luna_core::{FontSelector, ServerConfig};
use luna_vt::CursorStyle;
use serde::{Deserialize, Serialize};

/// Fonts cycled through with the `cycle` command, in order.
pub const DEFAULT_FONTS: [&str; 9] = [
    "AnonymicePowerline Nerd Font 9",
    "Anonymous Pro 9",
    "FuraCode Nerd Font 9",
    "SpaceMono Nerd Font 9",
    "SauceCodePro Nerd Font 9",
    "ProFontIIx Nerd Font 9",
    "mononoki Nerd Font 9",
    "3270Medium Nerd Font 9",
    "AurulentSansMono Nerd Font 9",
];

pub const DEFAULT_SCROLLBACK: usize = 100_000;

/// Control server settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ControlConfig {
    /// Address to listen on. Anything but loopback exposes an
    /// unauthenticated control channel.
    pub bind: IpAddr,
    /// 0 picks an ephemeral port.
    pub port: u16,
    /// Drop control connections that send no complete line in this many seconds.
    pub idle_timeout_secs: Option<u64>,
}

impl Default for ControlConfig {
    fn default() -> Self {
        Self {
            bind: IpAddr::V4(Ipv4Addr::LOCALHOST),
            port: 0,
            idle_timeout_secs: None,
        }
    }
}

impl ControlConfig {
    pub fn server_config(&self) -> ServerConfig {
        ServerConfig {
            bind: self.bind,
            port: self.port,
            idle_timeout: self.idle_timeout_secs.map(Duration::from_secs),
        }
    }
}

/// Main configuration structure for Luna.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub fonts: Vec<String>,
    pub scrollback_lines: usize,
    pub cursor: CursorStyle,
    /// Shell for new windows. Falls back to `$SHELL`, then `/bin/sh`.
    pub shell: Option<String>,
    pub columns: u16,
    pub rows: u16,
    pub control: ControlConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            fonts: DEFAULT_FONTS.iter().map(|f| f.to_string()).collect(),
            scrollback_lines: DEFAULT_SCROLLBACK,
            cursor: CursorStyle::default(),
            shell: None,
            columns: 80,
            rows: 24,
            control: ControlConfig::default(),
        }
    }
}

impl Config {
    /// Returns the path to the config file.
    pub fn config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|p| p.join("luna").join("config.json"))
    }

    /// Loads configuration from the default config file, or defaults when
    /// there is none.
    pub fn load() -> Self {
        match Self::config_path() {
            Some(path) => Self::load_from(&path),
            None => {
                log::warn!("Could not determine config directory, using defaults");
                Self::default()
            }
        }
    }

    /// Loads configuration from `path`. Falls back to defaults, with a log
    /// message, when the file is missing or broken.
    pub fn load_from(path: &Path) -> Self {
        if !path.exists() {
            log::info!("No config file at {path:?}, using defaults");
            return Self::default();
        }

        match fs::read_to_string(path) {
            Ok(contents) => match serde_json::from_str(&contents) {
                Ok(config) => {
                    log::info!("Loaded config from {path:?}");
                    config
                }
                Err(e) => {
                    log::error!("Failed to parse config file {path:?}: {e}");
                    Self::default()
                }
            },
            Err(e) => {
                log::error!("Failed to read config file {path:?}: {e}");
                Self::default()
            }
        }
    }

    /// The configured font list, or the default list if it is empty.
    pub fn font_selector(&self) -> anyhow::Result<FontSelector> {
        let fonts = if self.fonts.is_empty() {
            log::warn!("Config lists no fonts, using the default list");
            DEFAULT_FONTS.iter().map(|f| f.to_string()).collect()
        } else {
            self.fonts.clone()
        };
        FontSelector::new(fonts).context("no fonts to choose from")
    }
}
