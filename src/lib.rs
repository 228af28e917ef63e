// Library exports for fuelgraph

pub mod data;
pub mod error;
pub mod graph;
pub mod ir;
pub mod runtime;
pub mod selection;
pub mod transform;

pub use data::{Dataset, DropdownOptions, Record};
pub use error::{FuelError, Result};
pub use ir::{ChartKind, ChartSpec, ChartView};
pub use runtime::{render_dashboard, DashboardReport};
pub use selection::{select, FilteredView, Selection};

use serde::Deserialize;
use std::path::{Path, PathBuf};

/// Largest accepted canvas side, in pixels
pub const MAX_CANVAS_SIDE: u32 = 10_000;

#[derive(Debug, Clone, Copy, Deserialize, Default, PartialEq)]
pub enum OutputFormat {
    #[serde(rename = "png")]
    #[default]
    Png,
    #[serde(rename = "svg")]
    Svg,
}

impl OutputFormat {
    pub fn extension(&self) -> &'static str {
        match self {
            OutputFormat::Png => "png",
            OutputFormat::Svg => "svg",
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct RenderOptions {
    #[serde(default = "default_width")]
    pub width: u32,
    #[serde(default = "default_height")]
    pub height: u32,
    #[serde(default, rename = "type")]
    pub format: OutputFormat,
    #[serde(default = "default_bins")]
    pub bins: usize,
    #[serde(default = "default_output_dir")]
    pub output_dir: PathBuf,
}

fn default_width() -> u32 { 800 }
fn default_height() -> u32 { 600 }
fn default_bins() -> usize { transform::DEFAULT_BINS }
fn default_output_dir() -> PathBuf { PathBuf::from("static/images") }

impl Default for RenderOptions {
    fn default() -> Self {
        Self {
            width: default_width(),
            height: default_height(),
            format: OutputFormat::Png,
            bins: default_bins(),
            output_dir: default_output_dir(),
        }
    }
}

impl RenderOptions {
    /// Load options from a JSON file; absent keys take their defaults.
    pub fn load_from(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)?;
        let options: Self = serde_json::from_str(&contents)
            .map_err(|e| FuelError::Config(format!("{}: {}", path.display(), e)))?;
        options.validate()?;
        Ok(options)
    }

    pub fn validate(&self) -> Result<()> {
        if self.width < 100 || self.height < 100 {
            return Err(FuelError::Config(format!(
                "canvas must be at least 100x100, got {}x{}",
                self.width, self.height
            )));
        }
        if self.width > MAX_CANVAS_SIDE || self.height > MAX_CANVAS_SIDE {
            return Err(FuelError::Config(format!(
                "canvas must be at most {}x{}, got {}x{}",
                MAX_CANVAS_SIDE, MAX_CANVAS_SIDE, self.width, self.height
            )));
        }
        if self.bins == 0 {
            return Err(FuelError::Config("bins must be at least 1".to_string()));
        }
        Ok(())
    }
}
