use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use crate::orbit::OrbitError;

/// One monitored device along the beam line.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct DeviceRow {
    pub name: String,
    /// Longitudinal position in meters.
    pub z: f64,
}

impl DeviceRow {
    pub fn new(name: impl Into<String>, z: f64) -> Self {
        Self {
            name: name.into(),
            z,
        }
    }
}

/// Ordered, validated set of devices. Row order is the plotting order and
/// every reading must stay aligned with it.
#[derive(Clone, Debug, PartialEq)]
pub struct DeviceTable {
    rows: Vec<DeviceRow>,
}

impl DeviceTable {
    pub fn new(rows: Vec<DeviceRow>) -> Result<Self, OrbitError> {
        if rows.is_empty() {
            return Err(OrbitError::config("device table has no rows"));
        }
        let mut seen = HashSet::with_capacity(rows.len());
        for row in &rows {
            if !row.z.is_finite() {
                return Err(OrbitError::config(format!(
                    "device {} has non-finite z {}",
                    row.name, row.z
                )));
            }
            if !seen.insert(row.name.as_str()) {
                return Err(OrbitError::config(format!(
                    "device {} listed more than once",
                    row.name
                )));
            }
        }
        Ok(Self { rows })
    }

    pub fn rows(&self) -> &[DeviceRow] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn positions(&self) -> Vec<f64> {
        self.rows.iter().map(|r| r.z).collect()
    }

    pub fn names(&self) -> Vec<String> {
        self.rows.iter().map(|r| r.name.clone()).collect()
    }

    pub fn z_at(&self, row: usize) -> Option<f64> {
        self.rows.get(row).map(|r| r.z)
    }

    /// Default bar width: the z span divided into `rows + 1` slots.
    pub fn bar_width(&self) -> f64 {
        let (min, max) = self.z_extent();
        let width = (max - min) / (self.rows.len() + 1) as f64;
        if width > 0.0 {
            width
        } else {
            1.0
        }
    }

    /// Horizontal plot range that fits every bar of the given width.
    pub fn z_range(&self, bar_width: f64) -> (f64, f64) {
        let (min, max) = self.z_extent();
        (min - bar_width / 2.0, max + bar_width / 2.0)
    }

    fn z_extent(&self) -> (f64, f64) {
        self.rows
            .iter()
            .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), r| {
                (lo.min(r.z), hi.max(r.z))
            })
    }
}
