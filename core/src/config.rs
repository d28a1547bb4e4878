use config::{Config, ConfigError, Environment, File};
use serde::{Deserialize, Serialize};
use std::env;
use std::path::Path;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum LayoutDirection {
    #[default]
    TopBottom,
    LeftRight,
}

/// Spacing and sweep settings for the layered layout, in abstract units.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LayoutConfig {
    pub node_width: f64,
    pub node_height: f64,
    /// Gap between neighbours inside one layer.
    pub node_gap: f64,
    /// Gap between consecutive layers.
    pub layer_gap: f64,
    /// Distance between feedback routing lanes.
    pub lane_gap: f64,
    /// Vertical offset between stacked variant children.
    pub variant_gap: f64,
    pub crossing_sweeps: usize,
    pub direction: LayoutDirection,
}

impl Default for LayoutConfig {
    fn default() -> Self {
        Self {
            node_width: 180.0,
            node_height: 60.0,
            node_gap: 40.0,
            layer_gap: 100.0,
            lane_gap: 30.0,
            variant_gap: 36.0,
            crossing_sweeps: 4,
            direction: LayoutDirection::TopBottom,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct CatalogConfig {
    /// Directory holding `network.json` and `drugs.json`. `None` uses the bundled catalog.
    pub dir: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    pub cache_entries: usize,
    pub metrics_history: usize,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            cache_entries: 16,
            metrics_history: 256,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct AppConfig {
    pub layout: LayoutConfig,
    pub catalog: CatalogConfig,
    pub session: SessionConfig,
}

impl AppConfig {
    pub fn load() -> Result<Self, ConfigError> {
        Self::from_sources("config")
    }

    /// Reads `<dir>/default`, then `<dir>/<RUN_MODE>`, then `MECHANET__*` variables.
    pub fn from_sources(dir: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let dir = dir.as_ref();
        let run_mode = env::var("RUN_MODE").unwrap_or_else(|_| "development".into());

        let builder = Config::builder()
            .add_source(File::with_name(&dir.join("default").to_string_lossy()).required(false))
            .add_source(
                File::with_name(&dir.join(&run_mode).to_string_lossy()).required(false),
            )
            .add_source(Environment::with_prefix("MECHANET").separator("__"));

        builder.build()?.try_deserialize()
    }
}
