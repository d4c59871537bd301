use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::warn;

use crate::engine::EngineOptions;
use crate::ui::scroll_throttle::DEFAULT_FRAME_INTERVAL_MS;
use crate::ui::windowing::ViewportMetrics;
use crate::utils::debouncer::DEFAULT_DEBOUNCE_MS;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub viewport: ViewportConfig,
    pub filter: FilterConfig,
    pub behavior: BehaviorConfig,
    pub display: DisplayConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ViewportConfig {
    /// Extent of one row in surface units (pixels for a pixel surface)
    pub row_extent: f64,

    /// Visible extent of the scroll container
    pub viewport_extent: f64,

    /// Extra rows rendered above and below the visible area
    pub buffer_rows: usize,

    /// Scroll updates are coalesced to one per frame of this length
    pub frame_interval_ms: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FilterConfig {
    /// Quiet period before typed filter text is applied
    pub debounce_ms: u64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BehaviorConfig {
    /// Re-filter and re-sort right after an edit is committed
    pub refresh_view_on_edit: bool,

    /// Dataset to open when none is given on the command line
    #[serde(skip_serializing_if = "Option::is_none")]
    pub default_dataset: Option<PathBuf>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DisplayConfig {
    /// Show the debug panel (FPS, rendered rows, log tail) on start
    pub show_debug_panel: bool,

    /// Use Unicode glyphs for sort and pin markers
    pub use_glyphs: bool,
}

impl Default for ViewportConfig {
    fn default() -> Self {
        let metrics = ViewportMetrics::default();
        Self {
            row_extent: metrics.row_extent,
            viewport_extent: metrics.viewport_extent,
            buffer_rows: metrics.buffer_rows,
            frame_interval_ms: DEFAULT_FRAME_INTERVAL_MS,
        }
    }
}

impl Default for FilterConfig {
    fn default() -> Self {
        Self {
            debounce_ms: DEFAULT_DEBOUNCE_MS,
        }
    }
}

impl Default for DisplayConfig {
    fn default() -> Self {
        Self {
            show_debug_panel: true,
            use_glyphs: true,
        }
    }
}

impl Config {
    /// Load config from the default location
    pub fn load() -> Result<Self> {
        let config_path = Self::get_config_path()?;

        if !config_path.exists() {
            // Create default config if it doesn't exist
            let default_config = Self::default();
            default_config.save()?;
            return Ok(default_config);
        }

        Self::load_from(&config_path)
    }

    /// Load config from a specific file
    pub fn load_from(path: &Path) -> Result<Self> {
        let contents = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {:?}", path))?;
        let config: Config = toml::from_str(&contents)
            .with_context(|| format!("Failed to parse config file: {:?}", path))?;
        Ok(config)
    }

    /// Save config to the default location
    pub fn save(&self) -> Result<()> {
        self.save_to(&Self::get_config_path()?)
    }

    /// Save config to a specific file
    pub fn save_to(&self, path: &Path) -> Result<()> {
        // Ensure parent directory exists
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }

        let contents = toml::to_string_pretty(self)?;
        fs::write(path, contents)?;

        Ok(())
    }

    /// Get the default config file path
    pub fn get_config_path() -> Result<PathBuf> {
        let config_dir = dirs::config_dir()
            .ok_or_else(|| anyhow::anyhow!("Could not determine config directory"))?;

        Ok(config_dir.join("txn-grid").join("config.toml"))
    }

    /// Engine settings. Unusable viewport geometry falls back to defaults.
    pub fn engine_options(&self) -> EngineOptions {
        let metrics = ViewportMetrics::new(
            self.viewport.viewport_extent,
            self.viewport.row_extent,
            self.viewport.buffer_rows,
        )
        .unwrap_or_else(|e| {
            warn!(target: "config", "{}; using default viewport geometry", e);
            ViewportMetrics::default()
        });

        EngineOptions {
            metrics,
            debounce_ms: self.filter.debounce_ms,
            frame_interval_ms: self.viewport.frame_interval_ms,
            refresh_view_on_edit: self.behavior.refresh_view_on_edit,
        }
    }

    /// Create a default config file with comments
    pub fn create_default_with_comments() -> String {
        r#"# txn-grid configuration file
# Location: ~/.config/txn-grid/config.toml (Linux)
#           ~/Library/Application Support/txn-grid/config.toml (macOS)
#           %APPDATA%\txn-grid\config.toml (Windows)

[viewport]
# Height of one row and of the scroll container, in surface units.
# The terminal UI always uses one terminal line per row.
row_extent = 40.0
viewport_extent = 600.0

# Rows rendered beyond the visible area on each side
buffer_rows = 10

# Scroll updates are applied at most once per frame of this length
frame_interval_ms = 16

[filter]
# Milliseconds of typing silence before the merchant filter is applied
debounce_ms = 300

[behavior]
# Re-apply filter and sort immediately after an edit is committed.
# When false the edited row stays where it is until the next filter or sort.
refresh_view_on_edit = false

# Dataset opened when no file is given on the command line
# default_dataset = "/path/to/transactions.json"

[display]
# Show FPS / rendered rows / log tail panel (toggle with F12)
show_debug_panel = true

# Use Unicode arrows and pins; set to false for ASCII markers
use_glyphs = true
"#
        .to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.viewport.row_extent, 40.0);
        assert_eq!(config.viewport.buffer_rows, 10);
        assert_eq!(config.filter.debounce_ms, 300);
        assert!(!config.behavior.refresh_view_on_edit);
    }

    #[test]
    fn test_partial_file_uses_defaults() {
        let config: Config = toml::from_str("[filter]\ndebounce_ms = 120\n").unwrap();
        assert_eq!(config.filter.debounce_ms, 120);
        assert_eq!(config.viewport, ViewportConfig::default());
    }

    #[test]
    fn test_commented_template_parses_to_defaults() {
        let config: Config = toml::from_str(&Config::create_default_with_comments()).unwrap();
        assert_eq!(config, Config::default());
    }

    #[test]
    fn test_save_and_load_roundtrip() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("nested").join("config.toml");

        let mut config = Config::default();
        config.viewport.buffer_rows = 4;
        config.behavior.default_dataset = Some(PathBuf::from("/data/transactions.json"));
        config.save_to(&path).unwrap();

        assert_eq!(Config::load_from(&path).unwrap(), config);
    }

    #[test]
    fn test_invalid_geometry_falls_back() {
        let mut config = Config::default();
        config.viewport.row_extent = 0.0;
        config.filter.debounce_ms = 50;

        let options = config.engine_options();
        assert_eq!(options.metrics, ViewportMetrics::default());
        assert_eq!(options.debounce_ms, 50);
    }

    #[test]
    fn test_load_from_bad_file_is_error() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(&path, "[viewport\nrow_extent = ").unwrap();
        assert!(Config::load_from(&path).is_err());
    }
}
