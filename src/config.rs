// src/config.rs
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::orbit::{
    ColorBinner, DeviceRow, DeviceTable, OrbitDisplay, OrbitError, OrbitSource, Palette,
    PlotStyle, Rgb, ScalarSource,
};

/// Colour signal binning, either explicit extents or a palette spread over a range.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ColorConfig {
    Explicit {
        extents: Vec<f64>,
        color_map: Vec<Rgb>,
    },
    Span {
        low: f64,
        high: f64,
        palette: Palette,
    },
}

impl ColorConfig {
    pub fn binner(&self) -> Result<ColorBinner, OrbitError> {
        match self {
            ColorConfig::Explicit { extents, color_map } => {
                ColorBinner::new(extents.clone(), color_map.clone())
            }
            ColorConfig::Span { low, high, palette } => {
                ColorBinner::spanning(*low, *high, palette.colors().to_vec())
            }
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct DisplayConfig {
    pub devices: Vec<DeviceRow>,
    /// z position (as text) -> tick label.
    #[serde(default)]
    pub longitudinal_labels: BTreeMap<String, String>,
    #[serde(default = "default_width")]
    pub width: u32,
    #[serde(default = "default_height")]
    pub height: u32,
    #[serde(default)]
    pub bar_width: Option<f64>,
    #[serde(default)]
    pub color: Option<ColorConfig>,
    #[serde(default = "default_reference_n")]
    pub reference_n: i64,
    #[serde(default = "default_refresh_ms")]
    pub refresh_ms: u64,
    #[serde(default = "default_y_range")]
    pub y_range: (f64, f64),
}

fn default_width() -> u32 {
    600
}

fn default_height() -> u32 {
    400
}

fn default_reference_n() -> i64 {
    15
}

fn default_refresh_ms() -> u64 {
    250
}

fn default_y_range() -> (f64, f64) {
    (-1.0, 1.0)
}

impl DisplayConfig {
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = fs::read_to_string(path)
            .with_context(|| format!("reading display config {}", path.display()))?;
        Self::from_json(&text).with_context(|| format!("parsing {}", path.display()))
    }

    pub fn from_json(text: &str) -> Result<Self> {
        let config: DisplayConfig = serde_json::from_str(text)?;
        Ok(config)
    }

    /// Eight monitors spread over a short line, coloured by a 0..8 signal.
    pub fn demo() -> Self {
        let devices = (0..8)
            .map(|i| DeviceRow::new(format!("BPM{}", i + 1), 2.5 * i as f64))
            .collect();
        let mut longitudinal_labels = BTreeMap::new();
        longitudinal_labels.insert("0".to_string(), "GUN".to_string());
        longitudinal_labels.insert("10".to_string(), "BC1".to_string());
        Self {
            devices,
            longitudinal_labels,
            width: default_width(),
            height: default_height(),
            bar_width: None,
            color: Some(ColorConfig::Span {
                low: 0.0,
                high: 8.0,
                palette: Palette::Blues9,
            }),
            reference_n: default_reference_n(),
            refresh_ms: default_refresh_ms(),
            y_range: default_y_range(),
        }
    }

    pub fn table(&self) -> Result<DeviceTable, OrbitError> {
        DeviceTable::new(self.devices.clone())
    }

    /// Export style for the configured chart size.
    pub fn plot_style(&self) -> Result<PlotStyle, OrbitError> {
        let style = PlotStyle {
            width: self.width,
            height: self.height,
            y_range: Some(self.y_range),
            ..PlotStyle::default()
        };
        style.validate()?;
        Ok(style)
    }

    pub fn reference_count(&self) -> Result<usize, OrbitError> {
        usize::try_from(self.reference_n)
            .ok()
            .filter(|n| *n > 0)
            .ok_or_else(|| {
                OrbitError::config(format!(
                    "reference_n must be positive, got {}",
                    self.reference_n
                ))
            })
    }

    pub fn labels(&self) -> Result<Vec<(f64, String)>, OrbitError> {
        self.longitudinal_labels
            .iter()
            .map(|(z, label)| {
                z.trim()
                    .parse::<f64>()
                    .map(|z| (z, label.clone()))
                    .map_err(|_| OrbitError::config(format!("label position {z:?} is not a number")))
            })
            .collect()
    }

    /// Builds a display over the given sources. `color_source` is only
    /// consulted when a colour section is configured.
    pub fn build_display(
        &self,
        source: Box<dyn OrbitSource>,
        color_source: Option<Box<dyn ScalarSource>>,
    ) -> Result<OrbitDisplay, OrbitError> {
        let mut display = OrbitDisplay::new(self.table()?, source, self.reference_count()?)?
            .with_labels(self.labels()?);
        if let Some(width) = self.bar_width {
            display = display.with_bar_width(width)?;
        }
        if let (Some(color), Some(signal)) = (&self.color, color_source) {
            display = display.with_color(signal, color.binner()?);
        }
        Ok(display)
    }
}
