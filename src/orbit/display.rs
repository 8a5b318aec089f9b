use log::{debug, info};

use crate::orbit::color::{ColorBinner, Rgb, DEFAULT_COLOR};
use crate::orbit::sampler::{CaptureState, ReferenceCurve, ReferenceSampler};
use crate::orbit::source::{Axis, OrbitSource, Sample, ScalarSource};
use crate::orbit::{DeviceTable, OrbitError};

/// Raw bars for one plane. Missing readings are stored as NaN so the
/// arrays stay aligned with the device table.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct RawSeries {
    pub positions: Vec<f64>,
    pub values: Vec<f64>,
    pub devices: Vec<String>,
    pub colors: Vec<Rgb>,
}

impl RawSeries {
    fn build(table: &DeviceTable, samples: &[Sample], color: Rgb) -> Self {
        Self {
            positions: table.positions(),
            values: samples.iter().map(|s| s.unwrap_or(f64::NAN)).collect(),
            devices: table.names(),
            colors: vec![color; table.len()],
        }
    }

    pub fn is_empty(&self) -> bool {
        self.positions.is_empty()
    }

    /// True when present values straddle zero.
    pub fn crosses_zero(&self) -> bool {
        let (min, max) = self
            .values
            .iter()
            .filter(|v| !v.is_nan())
            .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), v| {
                (lo.min(*v), hi.max(*v))
            });
        min < 0.0 && 0.0 < max
    }
}

/// Everything the presentation layer needs to draw one frame.
#[derive(Clone, Debug, PartialEq)]
pub struct OrbitProducts {
    pub x: RawSeries,
    pub y: RawSeries,
    pub x_reference: ReferenceCurve,
    pub y_reference: ReferenceCurve,
    pub reference_color: Option<Rgb>,
    pub capture: CaptureState,
    /// Active (extents, colours) pairing, for a colour bar.
    pub color_scale: Option<(Vec<f64>, Vec<Rgb>)>,
    pub labels: Vec<(f64, String)>,
    pub bar_width: f64,
    pub z_range: (f64, f64),
    pub cycle: u64,
}

impl OrbitProducts {
    pub fn raw(&self, axis: Axis) -> &RawSeries {
        match axis {
            Axis::X => &self.x,
            Axis::Y => &self.y,
        }
    }

    pub fn reference(&self, axis: Axis) -> &ReferenceCurve {
        match axis {
            Axis::X => &self.x_reference,
            Axis::Y => &self.y_reference,
        }
    }

    fn clear_reference(&mut self) {
        self.x_reference = ReferenceCurve::default();
        self.y_reference = ReferenceCurve::default();
        self.reference_color = None;
    }
}

struct ColorSignal {
    source: Box<dyn ScalarSource>,
    binner: ColorBinner,
}

/// Live two-plane orbit display: polls the sources once per `update()`,
/// runs reference capture and republishes the frame.
pub struct OrbitDisplay {
    table: DeviceTable,
    source: Box<dyn OrbitSource>,
    color: Option<ColorSignal>,
    sampler: ReferenceSampler,
    bar_width: Option<f64>,
    products: OrbitProducts,
}

impl OrbitDisplay {
    pub fn new(
        table: DeviceTable,
        source: Box<dyn OrbitSource>,
        reference_n: usize,
    ) -> Result<Self, OrbitError> {
        let sampler = ReferenceSampler::new(reference_n, table.len())?;
        let bar_width = table.bar_width();
        let products = OrbitProducts {
            x: RawSeries::default(),
            y: RawSeries::default(),
            x_reference: ReferenceCurve::default(),
            y_reference: ReferenceCurve::default(),
            reference_color: None,
            capture: sampler.state(),
            color_scale: None,
            labels: Vec::new(),
            bar_width,
            z_range: table.z_range(bar_width),
            cycle: 0,
        };
        Ok(Self {
            table,
            source,
            color: None,
            sampler,
            bar_width: None,
            products,
        })
    }

    pub fn with_bar_width(mut self, width: f64) -> Result<Self, OrbitError> {
        if !(width.is_finite() && width > 0.0) {
            return Err(OrbitError::config(format!("bar width {width} must be positive")));
        }
        self.bar_width = Some(width);
        self.refresh_geometry();
        Ok(self)
    }

    pub fn with_labels(mut self, labels: Vec<(f64, String)>) -> Self {
        self.products.labels = labels;
        self
    }

    pub fn with_color(
        mut self,
        signal: Box<dyn ScalarSource>,
        binner: ColorBinner,
    ) -> Self {
        self.set_color(signal, binner);
        self
    }

    pub fn table(&self) -> &DeviceTable {
        &self.table
    }

    pub fn products(&self) -> &OrbitProducts {
        &self.products
    }

    pub fn capture_state(&self) -> CaptureState {
        self.sampler.state()
    }

    /// One refresh cycle. Both sources are read before any state changes,
    /// so a failed fetch leaves the previous frame and capture untouched.
    pub fn update(&mut self) -> Result<(), OrbitError> {
        let reading = self.source.poll(&self.table)?;
        reading.validate(&self.table)?;
        let color = match self.color.as_mut() {
            Some(signal) => match signal.source.poll()? {
                Some(value) => signal.binner.bin(value),
                None => DEFAULT_COLOR,
            },
            None => DEFAULT_COLOR,
        };

        if let Some(pair) = self.sampler.record(&reading, &self.table) {
            self.products.x_reference = pair.x;
            self.products.y_reference = pair.y;
            self.products.reference_color = Some(color);
        }
        self.products.x = RawSeries::build(&self.table, &reading.x, color);
        self.products.y = RawSeries::build(&self.table, &reading.y, color);
        self.products.capture = self.sampler.state();
        self.products.cycle += 1;
        debug!("orbit cycle {} published", self.products.cycle);
        Ok(())
    }

    pub fn start_capture(&mut self) {
        self.sampler.start_capture();
        self.products.capture = self.sampler.state();
    }

    pub fn reset_capture(&mut self) {
        self.sampler.reset();
        self.products.clear_reference();
        self.products.capture = self.sampler.state();
    }

    /// Swaps the monitored devices. Any capture in flight is discarded.
    /// Longitudinal labels are kept; replace them with `set_labels`.
    pub fn reconfigure_table(&mut self, table: DeviceTable) {
        info!("device table replaced: {} rows", table.len());
        self.sampler.retarget(table.len());
        self.table = table;
        self.products.x = RawSeries::default();
        self.products.y = RawSeries::default();
        self.products.clear_reference();
        self.products.capture = self.sampler.state();
        self.refresh_geometry();
    }

    pub fn set_labels(&mut self, labels: Vec<(f64, String)>) {
        self.products.labels = labels;
    }

    pub fn reconfigure_color(
        &mut self,
        signal: Box<dyn ScalarSource>,
        color_map: Vec<Rgb>,
        extents: Vec<f64>,
    ) -> Result<(), OrbitError> {
        let binner = ColorBinner::new(extents, color_map)?;
        self.set_color(signal, binner);
        Ok(())
    }

    fn set_color(&mut self, signal: Box<dyn ScalarSource>, binner: ColorBinner) {
        info!("colour signal configured with {} bins", binner.colors().len());
        self.products.color_scale = Some((binner.extents().to_vec(), binner.colors().to_vec()));
        self.color = Some(ColorSignal {
            source: signal,
            binner,
        });
    }

    fn refresh_geometry(&mut self) {
        let width = self.bar_width.unwrap_or_else(|| self.table.bar_width());
        self.products.bar_width = width;
        self.products.z_range = self.table.z_range(width);
    }
}
