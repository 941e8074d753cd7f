// Global configuration management

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::engine::validate::GridBounds;
use crate::engine::widget::{GridPosition, PanelColors, WidgetSettings};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub app: AppConfig,

    #[serde(default)]
    pub grid: GridConfig,

    /// Widgets in declared order; focus cycling follows this order
    #[serde(default)]
    pub widgets: Vec<WidgetConfig>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Command (and leading args) used to open URLs from widgets
    #[serde(default = "default_open_url_util")]
    pub open_url_util: Vec<String>,

    /// Log filter used when RUST_LOG is not set
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GridConfig {
    /// Column widths in characters; 0 takes an equal share of what is left
    #[serde(default = "default_track")]
    pub columns: Vec<u16>,

    /// Row heights in lines; 0 takes an equal share of what is left
    #[serde(default = "default_track")]
    pub rows: Vec<u16>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WidgetConfig {
    pub name: String,

    /// Panel title; defaults to the name
    #[serde(default)]
    pub title: Option<String>,

    #[serde(default = "default_true_config")]
    pub enabled: bool,

    /// Single character that focuses this widget
    #[serde(default)]
    pub focus_char: Option<char>,

    /// Reachable with Tab even without a focus key
    #[serde(default)]
    pub focusable: bool,

    /// Seconds between refreshes; 0 refreshes once at startup only
    #[serde(default)]
    pub refresh_interval: u64,

    pub position: GridPosition,

    #[serde(default)]
    pub colors: PanelColors,

    #[serde(flatten)]
    pub kind: WidgetKind,
}

/// Variant-specific settings, selected by `type = "..."`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum WidgetKind {
    Clock {
        #[serde(default = "default_clock_format")]
        format: String,
    },
    Text {
        #[serde(default)]
        text: Option<String>,
        #[serde(default)]
        path: Option<PathBuf>,
    },
    Command {
        command: String,
    },
    Resources,
    Gitlab {
        #[serde(default = "default_gitlab_domain")]
        domain: String,
        /// Falls back to the GITLAB_TOKEN environment variable
        #[serde(default)]
        api_key: Option<String>,
        projects: Vec<String>,
    },
}

fn default_open_url_util() -> Vec<String> {
    if cfg!(target_os = "macos") {
        vec!["open".to_string()]
    } else {
        vec!["xdg-open".to_string()]
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_track() -> Vec<u16> {
    vec![0, 0]
}

fn default_true_config() -> bool {
    true
}

fn default_clock_format() -> String {
    "%Y-%m-%d %H:%M:%S".to_string()
}

fn default_gitlab_domain() -> String {
    "https://gitlab.com".to_string()
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            open_url_util: default_open_url_util(),
            log_level: default_log_level(),
        }
    }
}

impl Default for GridConfig {
    fn default() -> Self {
        Self {
            columns: default_track(),
            rows: default_track(),
        }
    }
}

impl GridConfig {
    pub fn bounds(&self) -> GridBounds {
        GridBounds {
            columns: self.columns.len(),
            rows: self.rows.len(),
        }
    }
}

impl WidgetConfig {
    pub fn settings(&self) -> WidgetSettings {
        WidgetSettings {
            name: self.name.clone(),
            title: self.title.clone().unwrap_or_else(|| self.name.clone()),
            focus_char: self.focus_char,
            focusable: self.focusable,
            refresh_interval: Duration::from_secs(self.refresh_interval),
            enabled: self.enabled,
            position: self.position,
            colors: self.colors.clone(),
        }
    }
}

impl Default for Config {
    /// A small working dashboard: a clock, system resources and a help panel.
    fn default() -> Self {
        let widget = |name: &str, focus_char, refresh_interval, position, kind| WidgetConfig {
            name: name.to_string(),
            title: None,
            enabled: true,
            focus_char,
            focusable: false,
            refresh_interval,
            position,
            colors: PanelColors::default(),
            kind,
        };

        Self {
            app: AppConfig::default(),
            grid: GridConfig::default(),
            widgets: vec![
                widget(
                    "clock",
                    Some('c'),
                    1,
                    GridPosition::new(0, 0, 1, 1),
                    WidgetKind::Clock {
                        format: default_clock_format(),
                    },
                ),
                widget(
                    "resources",
                    Some('s'),
                    2,
                    GridPosition::new(0, 1, 1, 1),
                    WidgetKind::Resources,
                ),
                widget(
                    "help",
                    Some('h'),
                    0,
                    GridPosition::new(1, 0, 2, 1),
                    WidgetKind::Text {
                        text: Some(
                            "Tab/Shift-Tab: cycle focus   Esc: unfocus   Ctrl-R: refresh all\n\
                             q: quit   Edit the config file to reload the dashboard live"
                                .to_string(),
                        ),
                        path: None,
                    },
                ),
            ],
        }
    }
}

impl Config {
    /// Get the path to the default config file
    pub fn config_path() -> Result<PathBuf> {
        let config_dir = if cfg!(target_os = "macos") {
            dirs::home_dir()
                .context("Could not determine home directory")?
                .join(".config")
                .join("paneldash")
        } else {
            dirs::config_dir()
                .context("Could not determine config directory")?
                .join("paneldash")
        };

        Ok(config_dir.join("config.toml"))
    }

    /// Parse a config from TOML text
    pub fn parse(contents: &str) -> Result<Self> {
        toml::from_str(contents).context("Failed to parse config")
    }

    /// Load config from an explicit path. A missing file is an error.
    pub fn load_from(path: &Path) -> Result<Self> {
        let contents = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        toml::from_str(&contents)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))
    }

    /// Save config to an explicit path
    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent).with_context(|| {
                    format!("Failed to create config directory: {}", parent.display())
                })?;
            }
        }

        let contents = toml::to_string_pretty(self).context("Failed to serialize config")?;

        fs::write(path, contents)
            .with_context(|| format!("Failed to write config file: {}", path.display()))?;

        Ok(())
    }

    /// Write the default config to `path` if nothing is there yet
    pub fn ensure_default(path: &Path) -> Result<bool> {
        if path.exists() {
            return Ok(false);
        }
        Config::default().save_to(path)?;
        Ok(true)
    }
}
