// In-memory sources for deterministic playback in tests.
use std::collections::VecDeque;

use crate::orbit::source::{OrbitReading, OrbitSource, Sample, ScalarSource};
use crate::orbit::{DeviceTable, OrbitError};

/// In-memory orbit source for deterministic playback.
pub struct ManualOrbitSource {
    queue: VecDeque<OrbitReading>,
}

impl ManualOrbitSource {
    pub fn new(readings: impl IntoIterator<Item = OrbitReading>) -> Self {
        Self {
            queue: readings.into_iter().collect(),
        }
    }
}

impl OrbitSource for ManualOrbitSource {
    fn poll(&mut self, _table: &DeviceTable) -> Result<OrbitReading, OrbitError> {
        self.queue
            .pop_front()
            .ok_or_else(|| OrbitError::Source("playback queue is empty".into()))
    }
}

/// In-memory scalar source. Once drained it keeps repeating the last value.
pub struct ManualScalarSource {
    queue: VecDeque<Sample>,
    last: Sample,
}

impl ManualScalarSource {
    pub fn new(values: impl IntoIterator<Item = Sample>) -> Self {
        Self {
            queue: values.into_iter().collect(),
            last: None,
        }
    }

    pub fn constant(value: f64) -> Self {
        Self::new([Some(value)])
    }
}

impl ScalarSource for ManualScalarSource {
    fn poll(&mut self) -> Result<Sample, OrbitError> {
        if let Some(value) = self.queue.pop_front() {
            self.last = value;
        }
        Ok(self.last)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::orbit::DeviceRow;

    #[test]
    fn manual_sources_play_back_in_order() {
        let table = DeviceTable::new(vec![DeviceRow::new("A", 0.0)]).unwrap();
        let mut source = ManualOrbitSource::new(vec![
            OrbitReading::new(vec![Some(1.0)], vec![Some(2.0)]),
            OrbitReading::new(vec![None], vec![Some(3.0)]),
        ]);
        assert_eq!(source.poll(&table).unwrap().x, vec![Some(1.0)]);
        assert_eq!(source.poll(&table).unwrap().y, vec![Some(3.0)]);
        assert!(source.poll(&table).is_err());

        let mut scalar = ManualScalarSource::new([Some(0.5), None]);
        assert_eq!(scalar.poll().unwrap(), Some(0.5));
        assert_eq!(scalar.poll().unwrap(), None);
        assert_eq!(scalar.poll().unwrap(), None);
    }
}
