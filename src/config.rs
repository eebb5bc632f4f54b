//! Layout and routing configuration.
//!
//! All values are in model coordinates. Every field has a default, so a
//! configuration file only needs to list what it overrides:
//!
//! ```json
//! { "layout": { "port_spacing": 25.0 }, "routing": { "gap": 15.0 } }
//! ```

use anyhow::{Context, Result};
use camino::Utf8Path;
use serde::{Deserialize, Serialize};

use crate::model::Point;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LayoutConfig {
    /// Height of the block title area above the first port.
    pub header_height: f32,
    /// Space between the header and the first port.
    pub top_margin: f32,
    /// Vertical distance between two neighbouring ports.
    pub port_spacing: f32,
    /// Space below the last port.
    pub bottom_margin: f32,
    pub min_width: f32,
    /// Width given to blocks created without an explicit size.
    pub default_width: f32,
    /// Offset from a junction's center to its (shared) port anchor.
    pub junction_port_offset: Point,
}

impl Default for LayoutConfig {
    fn default() -> Self {
        Self {
            header_height: 24.0,
            top_margin: 10.0,
            port_spacing: 20.0,
            bottom_margin: 10.0,
            min_width: 50.0,
            default_width: 100.0,
            junction_port_offset: Point::new(0.0, 0.0),
        }
    }
}

impl LayoutConfig {
    /// Smallest height that still fits `max(inputs, outputs)` ports.
    pub fn min_height(&self, inputs: u32, outputs: u32) -> f32 {
        self.header_height
            + inputs.max(outputs) as f32 * self.port_spacing
            + self.bottom_margin
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RoutingConfig {
    /// Stub length used when a direct two-bend route does not fit.
    pub gap: f32,
}

impl Default for RoutingConfig {
    fn default() -> Self {
        Self { gap: 20.0 }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EditorConfig {
    pub layout: LayoutConfig,
    pub routing: RoutingConfig,
}

impl EditorConfig {
    /// Load a configuration from a JSON file.
    pub fn load(path: &Utf8Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("Read config {}", path))?;
        let cfg: EditorConfig = serde_json::from_str(&text)
            .with_context(|| format!("Parse config {}", path))?;
        log::debug!("loaded editor config from {}: {:?}", path, cfg);
        Ok(cfg)
    }
}
