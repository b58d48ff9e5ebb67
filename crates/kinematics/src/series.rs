//! Position and finite-difference series.
//!
//! Two closed families of columns:
//! - [`TimeAxis`]: a recorded time source, or the midpoints of another axis;
//! - [`Series`]: a position axis, a recorded value column, or the first
//!   derivative of another series over a time axis.
//!
//! A derivative sample `i` is computed over the interval `[t(i), t(i+1)]`
//! and is anchored at that interval's midpoint, so a derivative series must
//! be read together with `times.midpoints()`. Differentiating again uses
//! those midpoints as its own time axis.

use std::fmt;

use labtrack_marker_model::{MarkerSource, ModelError, ModelResult, Point2D, Unit};
use serde::{Deserialize, Serialize};

use crate::time::TimeSource;

/// Read access shared by every displayable column.
pub trait Column {
    fn size(&self) -> usize;

    fn value_at(&self, index: usize) -> ModelResult<f64>;

    fn label(&self) -> String;
}

/// Coordinate axis of a position.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Axis {
    X,
    Y,
}

impl Axis {
    pub fn pick(self, point: Point2D) -> f64 {
        match self {
            Axis::X => point.x,
            Axis::Y => point.y,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Axis::X => "x",
            Axis::Y => "y",
        }
    }
}

/// A column of times.
#[derive(Clone)]
pub enum TimeAxis<'a> {
    /// Times read directly from a source.
    Recorded(&'a dyn TimeSource),
    /// `t(i) + (t(i+1) - t(i)) / 2` over the inner axis.
    Midpoint(Box<TimeAxis<'a>>),
}

impl<'a> TimeAxis<'a> {
    pub fn recorded(source: &'a dyn TimeSource) -> Self {
        Self::Recorded(source)
    }

    /// Interval midpoints of this axis.
    pub fn midpoints(&self) -> TimeAxis<'a> {
        TimeAxis::Midpoint(Box::new(self.clone()))
    }

    pub fn len(&self) -> usize {
        match self {
            TimeAxis::Recorded(source) => source.len(),
            TimeAxis::Midpoint(inner) => inner.len().saturating_sub(1),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn time_at(&self, index: usize) -> ModelResult<f64> {
        match self {
            TimeAxis::Recorded(source) => source.time_at(index),
            TimeAxis::Midpoint(inner) => {
                ModelError::check_index(index, self.len())?;
                let t0 = inner.time_at(index)?;
                let t1 = inner.time_at(index + 1)?;
                Ok(t0 + (t1 - t0) / 2.0)
            }
        }
    }

    pub fn unit(&self) -> Unit {
        match self {
            TimeAxis::Recorded(source) => source.unit(),
            TimeAxis::Midpoint(inner) => inner.unit(),
        }
    }
}

impl TimeSource for TimeAxis<'_> {
    fn len(&self) -> usize {
        TimeAxis::len(self)
    }

    fn time_at(&self, index: usize) -> ModelResult<f64> {
        TimeAxis::time_at(self, index)
    }

    fn unit(&self) -> Unit {
        TimeAxis::unit(self)
    }
}

impl Column for TimeAxis<'_> {
    fn size(&self) -> usize {
        self.len()
    }

    fn value_at(&self, index: usize) -> ModelResult<f64> {
        self.time_at(index)
    }

    fn label(&self) -> String {
        format!("t [{}]", self.unit())
    }
}

impl fmt::Debug for TimeAxis<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TimeAxis::Recorded(source) => f
                .debug_struct("Recorded")
                .field("len", &source.len())
                .field("unit", &source.unit())
                .finish(),
            TimeAxis::Midpoint(inner) => f.debug_tuple("Midpoint").field(inner).finish(),
        }
    }
}

/// A column of values that can be differentiated.
#[derive(Clone)]
pub enum Series<'a> {
    /// One coordinate of each marker, calibrated or raw.
    Position {
        markers: &'a dyn MarkerSource,
        axis: Axis,
        calibrated: bool,
    },
    /// Values recorded outside a marker store, e.g. one accelerometer axis.
    Recorded { values: &'a [f64], label: String },
    /// First derivative of `of` over `times`.
    Derivative {
        of: Box<Series<'a>>,
        times: TimeAxis<'a>,
    },
}

impl<'a> Series<'a> {
    /// Calibrated position along `axis`.
    pub fn position(markers: &'a dyn MarkerSource, axis: Axis) -> Self {
        Self::Position {
            markers,
            axis,
            calibrated: true,
        }
    }

    /// Raw position along `axis`.
    pub fn raw_position(markers: &'a dyn MarkerSource, axis: Axis) -> Self {
        Self::Position {
            markers,
            axis,
            calibrated: false,
        }
    }

    pub fn recorded(values: &'a [f64], label: impl Into<String>) -> Self {
        Self::Recorded {
            values,
            label: label.into(),
        }
    }

    /// First derivative of this series over `times`.
    ///
    /// `times` must be aligned with this series' values: the base axis for
    /// a position, or [`Series::aligned_times`] for a derivative.
    pub fn derivative(self, times: TimeAxis<'a>) -> Series<'a> {
        Series::Derivative {
            of: Box::new(self),
            times,
        }
    }

    /// Number of derivatives applied to the underlying values.
    pub fn order(&self) -> usize {
        match self {
            Series::Position { .. } | Series::Recorded { .. } => 0,
            Series::Derivative { of, .. } => of.order() + 1,
        }
    }

    /// Time axis whose entries line up with this series' values.
    ///
    /// Base columns share `base`; a derivative is anchored at the midpoints
    /// of the axis it was computed over.
    pub fn aligned_times(&self, base: &TimeAxis<'a>) -> TimeAxis<'a> {
        match self {
            Series::Position { .. } | Series::Recorded { .. } => base.clone(),
            Series::Derivative { times, .. } => times.midpoints(),
        }
    }

    fn base_name(&self) -> (String, bool) {
        match self {
            Series::Position {
                axis, calibrated, ..
            } => {
                let name = if *calibrated {
                    axis.name().to_string()
                } else {
                    format!("{}_raw", axis.name())
                };
                (name, true)
            }
            Series::Recorded { label, .. } => (label.clone(), false),
            Series::Derivative { of, .. } => of.base_name(),
        }
    }

    fn derivative_at(
        of: &Series<'a>,
        times: &TimeAxis<'a>,
        index: usize,
        size: usize,
    ) -> ModelResult<f64> {
        ModelError::check_index(index, size)?;
        let v0 = of.value_at(index)?;
        let v1 = of.value_at(index + 1)?;
        let t0 = times.time_at(index)?;
        let t1 = times.time_at(index + 1)?;

        // Express the interval in the base unit (e.g. ms -> s).
        let dt = (t1 - t0) * times.unit().scale_factor();
        if dt == 0.0 {
            return Err(ModelError::ZeroInterval { index });
        }
        Ok((v1 - v0) / dt)
    }
}

impl Column for Series<'_> {
    fn size(&self) -> usize {
        match self {
            Series::Position { markers, .. } => markers.len(),
            Series::Recorded { values, .. } => values.len(),
            Series::Derivative { of, times } => of.size().min(times.len()).saturating_sub(1),
        }
    }

    fn value_at(&self, index: usize) -> ModelResult<f64> {
        match self {
            Series::Position {
                markers,
                axis,
                calibrated,
            } => {
                let point = if *calibrated {
                    markers.calibrated_position_at(index)?
                } else {
                    markers.raw_position_at(index)?
                };
                Ok(axis.pick(point))
            }
            Series::Recorded { values, .. } => {
                values
                    .get(index)
                    .copied()
                    .ok_or(ModelError::OutOfRange {
                        index,
                        len: values.len(),
                    })
            }
            Series::Derivative { of, times } => {
                Series::derivative_at(of, times, index, self.size())
            }
        }
    }

    fn label(&self) -> String {
        let (name, is_position) = self.base_name();
        match (self.order(), is_position) {
            (0, _) => name,
            (1, true) => format!("v_{name}"),
            (2, true) => format!("a_{name}"),
            (1, false) => format!("d{name}/dt"),
            (n, _) => format!("d{n}{name}/dt{n}"),
        }
    }
}

impl fmt::Debug for Series<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Series")
            .field("label", &self.label())
            .field("order", &self.order())
            .field("size", &self.size())
            .finish()
    }
}

/// Velocity along `axis`, computed from calibrated positions.
///
/// Read it with `TimeAxis::recorded(times).midpoints()`.
pub fn velocity<'a>(
    markers: &'a dyn MarkerSource,
    axis: Axis,
    times: &'a dyn TimeSource,
) -> Series<'a> {
    Series::position(markers, axis).derivative(TimeAxis::recorded(times))
}

/// Acceleration along `axis`: the derivative of [`velocity`] over the
/// velocity's midpoint times.
pub fn acceleration<'a>(
    markers: &'a dyn MarkerSource,
    axis: Axis,
    times: &'a dyn TimeSource,
) -> Series<'a> {
    let base = TimeAxis::recorded(times);
    let midpoints = base.midpoints();
    Series::position(markers, axis)
        .derivative(base)
        .derivative(midpoints)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::time::RecordedTimes;
    use labtrack_marker_model::{Calibration, CalibrationParams, MarkerSample, MarkerStore};
    use std::rc::Rc;

    fn store_with(xs: &[(i64, f64)]) -> MarkerStore {
        let store = MarkerStore::new();
        for &(run_id, x) in xs {
            store.insert(MarkerSample::new(run_id, x, 0.0)).unwrap();
        }
        store
    }

    #[test]
    fn test_velocity_over_non_uniform_times() {
        let store = store_with(&[(0, 0.0), (1, 2.0), (2, 8.0)]);
        let times = RecordedTimes::seconds(vec![0.0, 1.0, 3.0]);
        let v = velocity(&store, Axis::X, &times);
        let t = TimeAxis::recorded(&times).midpoints();

        assert_eq!(v.size(), 2);
        assert_eq!(t.len(), 2);
        assert_eq!(v.value_at(0), Ok(2.0));
        assert_eq!(t.time_at(0), Ok(0.5));
        assert_eq!(v.value_at(1), Ok(3.0));
        assert_eq!(t.time_at(1), Ok(2.0));
        assert!(matches!(v.value_at(2), Err(ModelError::OutOfRange { .. })));
    }

    #[test]
    fn test_acceleration_uses_velocity_midpoints() {
        let store = store_with(&[(0, 0.0), (1, 2.0), (2, 8.0)]);
        let times = RecordedTimes::seconds(vec![0.0, 1.0, 3.0]);
        let a = acceleration(&store, Axis::X, &times);
        let t = TimeAxis::recorded(&times).midpoints().midpoints();

        // (3 - 2) / (2.0 - 0.5)
        assert_eq!(a.size(), 1);
        assert!((a.value_at(0).unwrap() - 1.0 / 1.5).abs() < 1e-12);
        assert_eq!(t.time_at(0), Ok(1.25));
        assert_eq!(a.order(), 2);
    }

    #[test]
    fn test_degenerate_inputs_have_no_derivative() {
        let empty = MarkerStore::new();
        let single = store_with(&[(4, 1.0)]);
        let times = RecordedTimes::seconds(vec![0.0]);

        assert_eq!(velocity(&empty, Axis::X, &times).size(), 0);
        assert_eq!(velocity(&single, Axis::Y, &times).size(), 0);
        assert_eq!(acceleration(&single, Axis::X, &times).size(), 0);
        assert_eq!(TimeAxis::recorded(&times).midpoints().len(), 0);
    }

    #[test]
    fn test_time_unit_exponent_folds_into_divisor() {
        let store = store_with(&[(0, 0.0), (1, 1.0)]);
        let times = RecordedTimes::new(vec![0.0, 500.0], Unit::milliseconds());
        let v = velocity(&store, Axis::X, &times);
        assert!((v.value_at(0).unwrap() - 2.0).abs() < 1e-12);

        // Midpoint stays in the source unit.
        assert_eq!(TimeAxis::recorded(&times).midpoints().time_at(0), Ok(250.0));
    }

    #[test]
    fn test_zero_interval_is_reported() {
        let store = store_with(&[(0, 0.0), (1, 1.0)]);
        let times = RecordedTimes::seconds(vec![2.0, 2.0]);
        let v = velocity(&store, Axis::X, &times);
        assert_eq!(v.value_at(0), Err(ModelError::ZeroInterval { index: 0 }));
    }

    #[test]
    fn test_velocity_reads_calibrated_positions() {
        let store = store_with(&[(0, 100.0), (1, 110.0)]);
        let calibration = Rc::new(Calibration::new(CalibrationParams::new(
            Point2D::new(100.0, 0.0),
            0.1,
            1.0,
        )));
        store.set_calibration(Some(calibration.clone()));
        let times = RecordedTimes::seconds(vec![0.0, 0.5]);

        let v = velocity(&store, Axis::X, &times);
        assert!((v.value_at(0).unwrap() - 2.0).abs() < 1e-12);

        // Views recompute on every read.
        calibration.set_scale(0.2, 1.0);
        assert!((v.value_at(0).unwrap() - 4.0).abs() < 1e-12);

        let raw = Series::raw_position(&store, Axis::X).derivative(TimeAxis::recorded(&times));
        assert!((raw.value_at(0).unwrap() - 20.0).abs() < 1e-12);
    }

    #[test]
    fn test_size_is_bounded_by_shorter_input() {
        let store = store_with(&[(0, 0.0), (1, 1.0), (2, 2.0), (3, 3.0)]);
        let times = RecordedTimes::seconds(vec![0.0, 1.0]);
        assert_eq!(velocity(&store, Axis::X, &times).size(), 1);
    }

    #[test]
    fn test_recorded_series_derivative() {
        let values = [1.0, 4.0, 9.0];
        let times = RecordedTimes::seconds(vec![1.0, 2.0, 3.0]);
        let series = Series::recorded(&values, "a_z").derivative(TimeAxis::recorded(&times));

        assert_eq!(series.value_at(0), Ok(3.0));
        assert_eq!(series.value_at(1), Ok(5.0));
        assert_eq!(series.label(), "da_z/dt");
    }

    #[test]
    fn test_labels() {
        let store = MarkerStore::new();
        let times = RecordedTimes::new(vec![], Unit::milliseconds());
        assert_eq!(Series::position(&store, Axis::X).label(), "x");
        assert_eq!(Series::raw_position(&store, Axis::Y).label(), "y_raw");
        assert_eq!(velocity(&store, Axis::Y, &times).label(), "v_y");
        assert_eq!(acceleration(&store, Axis::X, &times).label(), "a_x");

        let base = TimeAxis::recorded(&times);
        let jerk = acceleration(&store, Axis::X, &times).derivative(base.midpoints().midpoints());
        assert_eq!(jerk.label(), "d3x/dt3");
        assert_eq!(base.midpoints().label(), "t [ms]");
    }

    #[test]
    fn test_aligned_times() {
        let store = store_with(&[(0, 0.0), (1, 1.0), (2, 4.0)]);
        let times = RecordedTimes::seconds(vec![0.0, 1.0, 2.0]);
        let base = TimeAxis::recorded(&times);

        let position = Series::position(&store, Axis::X);
        assert_eq!(position.aligned_times(&base).len(), 3);

        let v = velocity(&store, Axis::X, &times);
        let aligned = v.aligned_times(&base);
        assert_eq!(aligned.len(), v.size());
        assert_eq!(aligned.time_at(1), Ok(1.5));
    }
}
