use std::fmt;

use serde::{Deserialize, Serialize};

use crate::orbit::{DeviceTable, OrbitError};

/// Measured plane.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Axis {
    X,
    Y,
}

impl Axis {
    pub const ALL: [Axis; 2] = [Axis::X, Axis::Y];

    pub fn index(self) -> usize {
        match self {
            Axis::X => 0,
            Axis::Y => 1,
        }
    }
}

impl fmt::Display for Axis {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Axis::X => f.write_str("X"),
            Axis::Y => f.write_str("Y"),
        }
    }
}

/// A single reading; `None` marks a device that reported nothing this cycle.
pub type Sample = Option<f64>;

/// Per-device values for both planes, in device table order.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct OrbitReading {
    pub x: Vec<Sample>,
    pub y: Vec<Sample>,
}

impl OrbitReading {
    pub fn new(x: Vec<Sample>, y: Vec<Sample>) -> Self {
        Self { x, y }
    }

    pub fn axis(&self, axis: Axis) -> &[Sample] {
        match axis {
            Axis::X => &self.x,
            Axis::Y => &self.y,
        }
    }

    /// Checks the row alignment invariant against the table.
    pub fn validate(&self, table: &DeviceTable) -> Result<(), OrbitError> {
        for axis in Axis::ALL {
            let actual = self.axis(axis).len();
            if actual != table.len() {
                return Err(OrbitError::RowMismatch {
                    axis,
                    expected: table.len(),
                    actual,
                });
            }
        }
        Ok(())
    }
}

/// Something that can report the current orbit for a device table.
pub trait OrbitSource: Send {
    fn poll(&mut self, table: &DeviceTable) -> Result<OrbitReading, OrbitError>;
}

/// Optional single value that drives bar colouring.
pub trait ScalarSource: Send {
    fn poll(&mut self) -> Result<Sample, OrbitError>;
}
