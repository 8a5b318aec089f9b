// src/orbit/mod.rs
pub mod color;
pub mod display;
pub mod error;
#[cfg(test)]
pub mod playback;
pub mod plot;
pub mod sampler;
pub mod source;
pub mod table;

pub use color::{ColorBinner, Palette, Rgb};
pub use display::{OrbitDisplay, OrbitProducts};
pub use error::OrbitError;
#[cfg(test)]
pub use playback::{ManualOrbitSource, ManualScalarSource};
pub use plot::{render_orbit_png, PlotStyle};
pub use source::{Axis, OrbitReading, OrbitSource, Sample, ScalarSource};
pub use table::{DeviceRow, DeviceTable};
