// src/simulation.rs
// Stand-in orbit and colour signals for running the display without a control system.
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::orbit::{
    ColorBinner, DeviceTable, OrbitError, OrbitReading, OrbitSource, Sample, ScalarSource,
};

/// Betatron-like oscillation along z with per-device noise and dropouts.
pub struct SimulatedOrbit {
    rng: StdRng,
    phase: f64,
    amplitude: f64,
    noise: f64,
    dropout: f64,
    timeout_rate: f64,
}

impl SimulatedOrbit {
    pub fn new(seed: Option<u64>) -> Self {
        let rng = match seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        Self {
            rng,
            phase: 0.0,
            amplitude: 0.5,
            noise: 0.05,
            dropout: 0.0,
            timeout_rate: 0.0,
        }
    }

    pub fn with_dropout(mut self, probability: f64) -> Self {
        self.dropout = probability.clamp(0.0, 1.0);
        self
    }

    /// Fraction of polls that fail as if the control system timed out.
    pub fn with_timeouts(mut self, probability: f64) -> Self {
        self.timeout_rate = probability.clamp(0.0, 1.0);
        self
    }

    fn plane(&mut self, table: &DeviceTable, tune: f64) -> Vec<Sample> {
        table
            .rows()
            .iter()
            .map(|row| {
                if self.rng.gen_bool(self.dropout) {
                    return None;
                }
                let jitter = self.rng.gen_range(-self.noise..=self.noise);
                Some(self.amplitude * (self.phase + tune * row.z).sin() + jitter)
            })
            .collect()
    }
}

impl OrbitSource for SimulatedOrbit {
    fn poll(&mut self, table: &DeviceTable) -> Result<OrbitReading, OrbitError> {
        if self.rng.gen_bool(self.timeout_rate) {
            return Err(OrbitError::Source("simulated channel access timeout".into()));
        }
        self.phase += 0.05;
        let x = self.plane(table, 0.8);
        let y = self.plane(table, 1.3);
        Ok(OrbitReading::new(x, y))
    }
}

/// Bounded random walk, e.g. a beam energy used to colour the bars.
pub struct SimulatedScalar {
    rng: StdRng,
    value: f64,
    low: f64,
    high: f64,
}

impl SimulatedScalar {
    pub fn new(low: f64, high: f64, seed: Option<u64>) -> Self {
        let rng = match seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        Self {
            rng,
            value: (low + high) / 2.0,
            low,
            high,
        }
    }

    /// Walks over the span of the binner's extents.
    pub fn for_binner(binner: &ColorBinner, seed: Option<u64>) -> Self {
        let (low, high) = binner
            .extents()
            .iter()
            .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), e| {
                (lo.min(*e), hi.max(*e))
            });
        Self::new(low, high, seed)
    }
}

impl ScalarSource for SimulatedScalar {
    fn poll(&mut self) -> Result<Sample, OrbitError> {
        let step = (self.high - self.low) * 0.05;
        if step > 0.0 {
            self.value += self.rng.gen_range(-step..=step);
        }
        self.value = self.value.clamp(self.low, self.high);
        Ok(Some(self.value))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::orbit::{DeviceRow, Rgb};

    #[test]
    fn simulated_orbit_matches_table_shape() {
        let table = DeviceTable::new(vec![
            DeviceRow::new("A", 0.0),
            DeviceRow::new("B", 1.0),
            DeviceRow::new("C", 2.0),
        ])
        .unwrap();
        let mut source = SimulatedOrbit::new(Some(7)).with_dropout(1.0);
        let reading = source.poll(&table).unwrap();
        assert!(reading.validate(&table).is_ok());
        assert!(reading.x.iter().all(Option::is_none));

        let mut source = SimulatedOrbit::new(Some(7)).with_dropout(0.0);
        let reading = source.poll(&table).unwrap();
        assert!(reading.y.iter().all(|v| v.map_or(false, |v| v.abs() <= 0.55)));
    }

    #[test]
    fn timeouts_surface_as_source_errors() {
        let table = DeviceTable::new(vec![DeviceRow::new("A", 0.0)]).unwrap();
        let mut source = SimulatedOrbit::new(Some(1)).with_timeouts(1.0);
        assert!(matches!(source.poll(&table), Err(OrbitError::Source(_))));
        let mut source = SimulatedOrbit::new(Some(1));
        assert!(source.poll(&table).is_ok());
    }

    #[test]
    fn scalar_for_binner_spans_extents() {
        let binner = ColorBinner::new(vec![4.0, -2.0, 1.0], vec![Rgb(0, 0, 0); 3])
            .unwrap();
        let mut signal = SimulatedScalar::for_binner(&binner, Some(5));
        for _ in 0..100 {
            let value = signal.poll().unwrap().unwrap();
            assert!((-2.0..=4.0).contains(&value));
        }
    }

    #[test]
    fn simulated_scalar_stays_in_range() {
        let mut signal = SimulatedScalar::new(0.0, 8.0, Some(3));
        for _ in 0..200 {
            let value = signal.poll().unwrap().unwrap();
            assert!((0.0..=8.0).contains(&value));
        }
    }
}
