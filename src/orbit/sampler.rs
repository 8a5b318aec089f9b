use log::{debug, info};

use crate::orbit::source::{Axis, OrbitReading, Sample};
use crate::orbit::{DeviceTable, OrbitError};

/// Averaged baseline for one plane: parallel (z, mean) sequences.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ReferenceCurve {
    pub positions: Vec<f64>,
    pub values: Vec<f64>,
}

impl ReferenceCurve {
    pub fn len(&self) -> usize {
        self.positions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.positions.is_empty()
    }

    pub fn points(&self) -> impl Iterator<Item = (f64, f64)> + '_ {
        self.positions.iter().copied().zip(self.values.iter().copied())
    }
}

/// Both planes of a completed capture.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ReferencePair {
    pub x: ReferenceCurve,
    pub y: ReferenceCurve,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct CaptureState {
    pub remaining: usize,
    pub target: usize,
    pub capturing: bool,
}

impl CaptureState {
    pub fn collected(&self) -> usize {
        self.target - self.remaining
    }
}

/// Accumulates per-device samples for a fixed number of cycles and reduces
/// them to per-device means.
#[derive(Clone, Debug)]
pub struct ReferenceSampler {
    target: usize,
    remaining: usize,
    capturing: bool,
    // axis -> row -> collected samples
    samples: [Vec<Vec<Sample>>; 2],
}

impl ReferenceSampler {
    pub fn new(target: usize, rows: usize) -> Result<Self, OrbitError> {
        if target == 0 {
            return Err(OrbitError::config(
                "reference capture needs at least one cycle",
            ));
        }
        Ok(Self {
            target,
            remaining: target,
            capturing: false,
            samples: [vec![Vec::new(); rows], vec![Vec::new(); rows]],
        })
    }

    pub fn state(&self) -> CaptureState {
        CaptureState {
            remaining: self.remaining,
            target: self.target,
            capturing: self.capturing,
        }
    }

    /// Arms a capture. Returns `false` when one is already running.
    pub fn start_capture(&mut self) -> bool {
        if self.capturing {
            return false;
        }
        info!("reference capture started ({} cycles)", self.target);
        self.capturing = true;
        true
    }

    /// Drops everything collected so far and restarts the countdown. The
    /// capturing flag is left alone.
    pub fn reset(&mut self) {
        for per_row in self.samples.iter_mut() {
            per_row.iter_mut().for_each(Vec::clear);
        }
        self.remaining = self.target;
    }

    /// Resizes for a new device table and abandons any capture in flight.
    pub fn retarget(&mut self, rows: usize) {
        self.samples = [vec![Vec::new(); rows], vec![Vec::new(); rows]];
        self.remaining = self.target;
        self.capturing = false;
    }

    /// Feeds one refresh cycle (both planes). Returns the averaged curves
    /// when this cycle completes the capture.
    pub fn record(&mut self, reading: &OrbitReading, table: &DeviceTable) -> Option<ReferencePair> {
        if !self.capturing {
            return None;
        }
        for axis in Axis::ALL {
            let per_row = &mut self.samples[axis.index()];
            for (collected, value) in per_row.iter_mut().zip(reading.axis(axis)) {
                collected.push(*value);
            }
        }
        self.remaining -= 1;
        debug!(
            "reference capture {}/{}",
            self.target - self.remaining,
            self.target
        );
        if self.remaining > 0 {
            return None;
        }

        let pair = ReferencePair {
            x: self.reduce(Axis::X, table),
            y: self.reduce(Axis::Y, table),
        };
        self.reset();
        self.capturing = false;
        info!(
            "reference capture complete: {} X / {} Y devices",
            pair.x.len(),
            pair.y.len()
        );
        Some(pair)
    }

    fn reduce(&self, axis: Axis, table: &DeviceTable) -> ReferenceCurve {
        let mut curve = ReferenceCurve::default();
        for (row, collected) in self.samples[axis.index()].iter().enumerate() {
            let Some(mean) = mean_present(collected) else {
                continue;
            };
            let Some(z) = table.z_at(row) else {
                continue;
            };
            curve.positions.push(z);
            curve.values.push(mean);
        }
        curve
    }
}

/// Mean over present samples; `None` when nothing was present or the mean
/// is NaN.
pub fn mean_present(samples: &[Sample]) -> Option<f64> {
    let (sum, count) = samples
        .iter()
        .flatten()
        .fold((0.0, 0usize), |(sum, count), v| (sum + v, count + 1));
    if count == 0 {
        return None;
    }
    let mean = sum / count as f64;
    (!mean.is_nan()).then_some(mean)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::orbit::DeviceRow;

    fn table() -> DeviceTable {
        DeviceTable::new(vec![
            DeviceRow::new("BPM1", 0.0),
            DeviceRow::new("BPM2", 1.0),
            DeviceRow::new("BPM3", 2.0),
        ])
        .unwrap()
    }

    fn reading(x: [Sample; 3]) -> OrbitReading {
        OrbitReading::new(x.to_vec(), vec![Some(0.0); 3])
    }

    #[test]
    fn non_positive_target_is_rejected() {
        assert!(ReferenceSampler::new(0, 3)
            .unwrap_err()
            .is_invalid_configuration());
    }

    #[test]
    fn missing_device_is_dropped_from_curve() {
        let table = table();
        let mut sampler = ReferenceSampler::new(2, table.len()).unwrap();
        assert!(sampler.start_capture());

        let first = sampler.record(&reading([Some(1.0), None, Some(3.0)]), &table);
        assert!(first.is_none());
        assert_eq!(sampler.state().remaining, 1);

        let pair = sampler
            .record(&reading([Some(3.0), None, Some(5.0)]), &table)
            .expect("capture completes on second cycle");
        assert_eq!(pair.x.positions, vec![0.0, 2.0]);
        assert_eq!(pair.x.values, vec![2.0, 4.0]);
        assert_eq!(pair.y.len(), 3);

        let state = sampler.state();
        assert!(!state.capturing);
        assert_eq!(state.remaining, 2);
    }

    #[test]
    fn countdown_ticks_once_per_cycle() {
        let table = table();
        let mut sampler = ReferenceSampler::new(3, table.len()).unwrap();
        sampler.start_capture();
        sampler.record(&reading([Some(1.0); 3]), &table);
        assert_eq!(sampler.state().collected(), 1);
        sampler.record(&reading([Some(1.0); 3]), &table);
        assert_eq!(sampler.state().collected(), 2);
    }

    #[test]
    fn idle_sampler_ignores_readings() {
        let table = table();
        let mut sampler = ReferenceSampler::new(1, table.len()).unwrap();
        assert!(sampler.record(&reading([Some(1.0); 3]), &table).is_none());
        assert_eq!(sampler.state().remaining, 1);
    }

    #[test]
    fn start_while_capturing_does_not_rearm() {
        let table = table();
        let mut sampler = ReferenceSampler::new(2, table.len()).unwrap();
        assert!(sampler.start_capture());
        sampler.record(&reading([Some(1.0); 3]), &table);
        assert!(!sampler.start_capture());
        assert_eq!(sampler.state().remaining, 1);
    }

    #[test]
    fn reset_twice_is_same_as_once() {
        let table = table();
        let mut sampler = ReferenceSampler::new(2, table.len()).unwrap();
        sampler.reset();
        let once = sampler.state();
        sampler.reset();
        assert_eq!(sampler.state(), once);
        assert!(!sampler.state().capturing);
        assert!(sampler.samples.iter().flatten().all(Vec::is_empty));
    }

    #[test]
    fn reset_mid_capture_restarts_window() {
        let table = table();
        let mut sampler = ReferenceSampler::new(2, table.len()).unwrap();
        sampler.start_capture();
        sampler.record(&reading([Some(10.0); 3]), &table);
        sampler.reset();
        assert!(sampler.state().capturing);
        assert!(sampler.record(&reading([Some(1.0); 3]), &table).is_none());
        let pair = sampler.record(&reading([Some(3.0); 3]), &table).unwrap();
        assert_eq!(pair.x.values, vec![2.0, 2.0, 2.0]);
    }

    #[test]
    fn retarget_abandons_capture() {
        let table = table();
        let mut sampler = ReferenceSampler::new(2, table.len()).unwrap();
        sampler.start_capture();
        sampler.record(&reading([Some(1.0); 3]), &table);
        sampler.retarget(5);
        let state = sampler.state();
        assert!(!state.capturing);
        assert_eq!(state.remaining, 2);
        assert_eq!(sampler.samples[0].len(), 5);
    }

    #[test]
    fn curve_never_longer_than_table() {
        let table = table();
        let mut sampler = ReferenceSampler::new(4, table.len()).unwrap();
        sampler.start_capture();
        let cycles = [
            [None, Some(1.0), None],
            [Some(f64::NAN), None, None],
            [Some(2.0), Some(3.0), None],
            [None, None, None],
        ];
        let mut done = None;
        for x in cycles {
            done = sampler.record(&reading(x), &table);
        }
        let pair = done.unwrap();
        assert_eq!(pair.x.positions.len(), pair.x.values.len());
        assert!(pair.x.len() <= table.len());
        // NaN poisons row 0, row 2 never reported
        assert_eq!(pair.x.positions, vec![1.0]);
        assert_eq!(pair.x.values, vec![2.0]);
    }

    #[test]
    fn mean_ignores_missing() {
        assert_eq!(mean_present(&[None, Some(2.0), Some(4.0)]), Some(3.0));
        assert_eq!(mean_present(&[None, None]), None);
        assert_eq!(mean_present(&[]), None);
    }
}
