//! Editor configuration.
//!
//! The editor's only persistence: one JSON document under the platform
//! config directory holding panel geometry, theme overrides, and grid
//! settings (the browser original kept these in local storage under
//! editor-defined keys).

use crate::error::TesseraResult;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};

/// Editor configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EditorConfig {
    /// User data directory
    pub data_dir: PathBuf,

    /// Panel layout settings
    pub panels: PanelLayoutConfig,

    /// Theme settings
    pub theme: ThemeConfig,

    /// Grid settings
    pub grid: GridConfig,
}

/// Persisted geometry for one panel.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct PanelGeometry {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
    pub collapsed: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PanelLayoutConfig {
    /// Geometry per panel, keyed by panel name ("asset-browser", ...).
    pub geometry: HashMap<String, PanelGeometry>,

    /// Width of the left dock column in pixels.
    pub left_dock_width: f64,

    /// Width of the right dock column in pixels.
    pub right_dock_width: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ThemeConfig {
    /// Named theme ("dark", "light").
    pub name: String,

    /// Custom-property overrides applied on top of the stylesheet
    /// (e.g. "menu-margin" -> "24px").
    pub overrides: HashMap<String, String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GridConfig {
    /// Grid cell size in pixels.
    pub cell_size: u32,

    /// Snap placement to the grid.
    pub snap: bool,
}

impl Default for EditorConfig {
    fn default() -> Self {
        Self {
            data_dir: dirs::data_dir()
                .unwrap_or_else(|| PathBuf::from("."))
                .join("tessera"),
            panels: PanelLayoutConfig::default(),
            theme: ThemeConfig::default(),
            grid: GridConfig::default(),
        }
    }
}

impl Default for PanelLayoutConfig {
    fn default() -> Self {
        Self {
            geometry: HashMap::new(),
            left_dock_width: 280.0,
            right_dock_width: 320.0,
        }
    }
}

impl Default for ThemeConfig {
    fn default() -> Self {
        Self {
            name: "dark".to_string(),
            overrides: HashMap::new(),
        }
    }
}

impl Default for GridConfig {
    fn default() -> Self {
        Self {
            cell_size: 32,
            snap: true,
        }
    }
}

impl EditorConfig {
    /// Default on-disk location of the config document.
    pub fn default_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("tessera")
            .join("editor.json")
    }

    /// Load from a JSON file, falling back to defaults when the file does
    /// not exist yet.
    pub fn load(path: &Path) -> TesseraResult<Self> {
        if !path.exists() {
            log::info!("No editor config at {}; using defaults", path.display());
            return Ok(Self::default());
        }
        let raw = std::fs::read_to_string(path)?;
        let config = serde_json::from_str(&raw)?;
        log::info!("Loaded editor config from {}", path.display());
        Ok(config)
    }

    /// Persist as pretty-printed JSON, creating parent directories.
    pub fn save(&self, path: &Path) -> TesseraResult<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let raw = serde_json::to_string_pretty(self)?;
        std::fs::write(path, raw)?;
        log::info!("Saved editor config to {}", path.display());
        Ok(())
    }

    /// Record a panel's geometry for the next session.
    pub fn remember_panel(&mut self, name: &str, geometry: PanelGeometry) {
        self.panels.geometry.insert(name.to_string(), geometry);
    }

    /// Look up a panel's persisted geometry.
    pub fn panel_geometry(&self, name: &str) -> Option<PanelGeometry> {
        self.panels.geometry.get(name).copied()
    }
}

// Helper to get directories
mod dirs {
    use std::path::PathBuf;

    pub fn data_dir() -> Option<PathBuf> {
        if cfg!(target_os = "windows") {
            std::env::var_os("APPDATA").map(PathBuf::from)
        } else if cfg!(target_os = "macos") {
            home_dir().map(|h| h.join("Library").join("Application Support"))
        } else {
            std::env::var_os("XDG_DATA_HOME")
                .map(PathBuf::from)
                .or_else(|| home_dir().map(|h| h.join(".local").join("share")))
        }
    }

    pub fn config_dir() -> Option<PathBuf> {
        if cfg!(target_os = "windows") {
            std::env::var_os("APPDATA").map(PathBuf::from)
        } else if cfg!(target_os = "macos") {
            home_dir().map(|h| h.join("Library").join("Application Support"))
        } else {
            std::env::var_os("XDG_CONFIG_HOME")
                .map(PathBuf::from)
                .or_else(|| home_dir().map(|h| h.join(".config")))
        }
    }

    fn home_dir() -> Option<PathBuf> {
        std::env::var_os("HOME").map(PathBuf::from)
    }
}
