//! Configuration loading and parsing.
//!
//! Parses `textcore.toml` (or an override path provided by the binary) into
//! [`ConfigFile`]. Every field is optional; missing sections fall back to
//! defaults and unknown fields are ignored so older binaries tolerate newer
//! files.
//!
//! The parsed file is never consulted ambiently. [`Config::settings`] produces
//! an [`EditorSettings`] value that callers pass into the display at
//! construction and again through `apply_settings` when it changes.
//! `overscan_lines` depends on the viewport: [`Config::apply_context`] clamps
//! it to the visible row count and keeps the raw value so a later resize can
//! re-clamp.

use anyhow::Result;
use serde::Deserialize;
use std::{fs, path::PathBuf};
use tracing::{info, warn};

pub const CONFIG_FILE_NAME: &str = "textcore.toml";

/// How a paragraph that does not fit the layout width is broken.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WrapMode {
    /// Never wrap; lines only end at hard breaks.
    None,
    /// Wrap at the first character that overflows.
    Character,
    /// Wrap between words, splitting words longer than the line.
    #[default]
    Word,
}

#[derive(Debug, Deserialize, Clone)]
pub struct LayoutConfig {
    #[serde(default)]
    pub wrap: WrapMode,
    #[serde(default = "LayoutConfig::default_tab_width")]
    pub tab_width: u16,
    /// Lines cached above and below the viewport.
    #[serde(default = "LayoutConfig::default_overscan")]
    pub overscan_lines: u16,
}

impl Default for LayoutConfig {
    fn default() -> Self {
        Self {
            wrap: WrapMode::default(),
            tab_width: Self::default_tab_width(),
            overscan_lines: Self::default_overscan(),
        }
    }
}

impl LayoutConfig {
    const fn default_tab_width() -> u16 {
        4
    }
    const fn default_overscan() -> u16 {
        8
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct FontConfig {
    #[serde(default = "FontConfig::default_cell_width")]
    pub cell_width: f32,
    #[serde(default = "FontConfig::default_line_height")]
    pub line_height: f32,
}

impl Default for FontConfig {
    fn default() -> Self {
        Self {
            cell_width: Self::default_cell_width(),
            line_height: Self::default_line_height(),
        }
    }
}

impl FontConfig {
    const fn default_cell_width() -> f32 {
        8.0
    }
    const fn default_line_height() -> f32 {
        16.0
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct ClipboardConfig {
    #[serde(default = "ClipboardConfig::default_capacity")]
    pub ring_capacity: usize,
}

impl Default for ClipboardConfig {
    fn default() -> Self {
        Self {
            ring_capacity: Self::default_capacity(),
        }
    }
}

impl ClipboardConfig {
    const fn default_capacity() -> usize {
        10
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct ScrollConfig {
    /// Lines walked by the scroll estimator between progress reports and
    /// cancellation checks.
    #[serde(default = "ScrollConfig::default_interval")]
    pub estimate_update_interval: usize,
}

impl Default for ScrollConfig {
    fn default() -> Self {
        Self {
            estimate_update_interval: Self::default_interval(),
        }
    }
}

impl ScrollConfig {
    const fn default_interval() -> usize {
        100
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct LineNumberConfig {
    #[serde(default)]
    pub show: bool,
    #[serde(default = "LineNumberConfig::default_min_digits")]
    pub min_digits: u8,
}

impl Default for LineNumberConfig {
    fn default() -> Self {
        Self {
            show: false,
            min_digits: Self::default_min_digits(),
        }
    }
}

impl LineNumberConfig {
    const fn default_min_digits() -> u8 {
        3
    }
}

#[derive(Debug, Deserialize, Default, Clone)]
pub struct ConfigFile {
    #[serde(default)]
    pub layout: LayoutConfig,
    #[serde(default)]
    pub font: FontConfig,
    #[serde(default)]
    pub clipboard: ClipboardConfig,
    #[serde(default)]
    pub scroll: ScrollConfig,
    #[serde(default)]
    pub line_numbers: LineNumberConfig,
}

#[derive(Debug, Clone, Default)]
pub struct Config {
    pub raw: Option<String>, // original file string (optional)
    pub file: ConfigFile,    // parsed (or default) data
    /// `overscan_lines` after clamping to the viewport; `None` until a context
    /// has been applied.
    pub effective_overscan: Option<u16>,
}

/// Explicit settings value consumed by layout and the display.
#[derive(Debug, Clone, PartialEq)]
pub struct EditorSettings {
    pub wrap: WrapMode,
    pub tab_width: u16,
    pub overscan_lines: usize,
    pub cell_width: f32,
    pub line_height: f32,
    pub clipboard_capacity: usize,
    pub estimate_update_interval: usize,
    pub show_line_numbers: bool,
    pub min_line_number_digits: u8,
}

impl Default for EditorSettings {
    fn default() -> Self {
        Config::default().settings()
    }
}

/// Best-effort config path following platform conventions (XDG / AppData Roaming).
pub fn discover() -> PathBuf {
    let local = PathBuf::from(CONFIG_FILE_NAME);
    if local.exists() {
        return local;
    }
    if let Some(dir) = dirs::config_dir() {
        return dir.join("textcore").join(CONFIG_FILE_NAME);
    }
    PathBuf::from(CONFIG_FILE_NAME)
}

pub fn load_from(path: Option<PathBuf>) -> Result<Config> {
    let path = path.unwrap_or_else(discover);
    if let Ok(content) = fs::read_to_string(&path) {
        match toml::from_str::<ConfigFile>(&content) {
            Ok(file) => Ok(Config {
                raw: Some(content),
                file,
                effective_overscan: None,
            }),
            Err(e) => {
                warn!(target: "config", path = %path.display(), error = %e, "config_parse_failed_using_defaults");
                Ok(Config::default())
            }
        }
    } else {
        Ok(Config::default())
    }
}

impl Config {
    /// Clamp overscan to the visible row count. Returns the effective value.
    pub fn apply_context(&mut self, viewport_rows: u16) -> u16 {
        let raw = self.file.layout.overscan_lines;
        let clamped = raw.min(viewport_rows.max(1));
        if clamped != raw {
            info!(
                target: "config",
                raw,
                clamped,
                viewport_rows,
                "overscan_lines_clamped"
            );
        }
        self.effective_overscan = Some(clamped);
        clamped
    }

    /// Re-clamp after a resize. `Some(new)` when the effective value changed.
    pub fn recompute_after_resize(&mut self, viewport_rows: u16) -> Option<u16> {
        let prev = self.effective_overscan;
        let current = self.apply_context(viewport_rows);
        if Some(current) != prev { Some(current) } else { None }
    }

    pub fn settings(&self) -> EditorSettings {
        let f = &self.file;
        EditorSettings {
            wrap: f.layout.wrap,
            tab_width: f.layout.tab_width.max(1),
            overscan_lines: self.effective_overscan.unwrap_or(f.layout.overscan_lines) as usize,
            cell_width: f.font.cell_width,
            line_height: f.font.line_height,
            clipboard_capacity: f.clipboard.ring_capacity.max(1),
            estimate_update_interval: f.scroll.estimate_update_interval.max(1),
            show_line_numbers: f.line_numbers.show,
            min_line_number_digits: f.line_numbers.min_digits,
        }
    }
}
