//! Value/time pairs for display.

use labtrack_marker_model::ModelResult;

use crate::series::{Column, Series, TimeAxis};

/// A series read together with its aligned time axis.
#[derive(Debug, Clone)]
pub struct Table<'a> {
    values: Series<'a>,
    times: TimeAxis<'a>,
}

impl<'a> Table<'a> {
    /// Pair `values` with the axis aligned to it, derived from `base`.
    pub fn new(values: Series<'a>, base: &TimeAxis<'a>) -> Self {
        let times = values.aligned_times(base);
        Self { values, times }
    }

    pub fn len(&self) -> usize {
        self.values.size().min(self.times.len())
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Column headers: time first, then values.
    pub fn headers(&self) -> (String, String) {
        (self.times.label(), self.values.label())
    }

    pub fn row(&self, index: usize) -> ModelResult<(f64, f64)> {
        Ok((self.times.time_at(index)?, self.values.value_at(index)?))
    }

    /// Every `(time, value)` row in order.
    pub fn rows(&self) -> ModelResult<Vec<(f64, f64)>> {
        (0..self.len()).map(|i| self.row(i)).collect()
    }
}
