//! Time sources for derived series.
//!
//! A time source yields one time value per sample index, in its own
//! [`Unit`]. Sampling does not need to be uniform.

use labtrack_marker_model::{MarkerSource, ModelError, ModelResult, Unit};
use serde::{Deserialize, Serialize};

/// Per-sample times in a given unit.
pub trait TimeSource {
    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn time_at(&self, index: usize) -> ModelResult<f64>;

    fn unit(&self) -> Unit;
}

/// Times of video frames: sample `i` happened at `run_id(i) / frame_rate` seconds.
///
/// Gaps in the tagged run ids yield non-uniform times.
pub struct FrameTimes<'a> {
    markers: &'a dyn MarkerSource,
    frame_rate: f64,
}

impl<'a> FrameTimes<'a> {
    /// `frame_rate` is in frames per second.
    pub fn new(markers: &'a dyn MarkerSource, frame_rate: f64) -> Self {
        Self {
            markers,
            frame_rate,
        }
    }
}

impl TimeSource for FrameTimes<'_> {
    fn len(&self) -> usize {
        self.markers.len()
    }

    fn time_at(&self, index: usize) -> ModelResult<f64> {
        let run_id = self.markers.run_id_at(index)?;
        Ok(run_id as f64 / self.frame_rate)
    }

    fn unit(&self) -> Unit {
        Unit::seconds()
    }
}

/// Explicit timestamps, e.g. from a sensor stream.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecordedTimes {
    times: Vec<f64>,
    unit: Unit,
}

impl RecordedTimes {
    pub fn new(times: Vec<f64>, unit: Unit) -> Self {
        Self { times, unit }
    }

    pub fn seconds(times: Vec<f64>) -> Self {
        Self::new(times, Unit::seconds())
    }

    /// Monotonic nanosecond timestamps, kept in nanoseconds.
    pub fn from_nanos(timestamps_ns: &[u64]) -> Self {
        Self::new(
            timestamps_ns.iter().map(|&t| t as f64).collect(),
            Unit::nanoseconds(),
        )
    }

    pub fn times(&self) -> &[f64] {
        &self.times
    }
}

impl TimeSource for RecordedTimes {
    fn len(&self) -> usize {
        self.times.len()
    }

    fn time_at(&self, index: usize) -> ModelResult<f64> {
        self.times
            .get(index)
            .copied()
            .ok_or(ModelError::OutOfRange {
                index,
                len: self.times.len(),
            })
    }

    fn unit(&self) -> Unit {
        self.unit.clone()
    }
}
