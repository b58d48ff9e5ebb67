//! Raw-to-physical coordinate calibration.
//!
//! A calibration maps raw pixel/sensor coordinates to physical ones with a
//! translation followed by a per-axis scale. A negative scale flips the axis
//! (image rows grow downward while physical height grows upward).
//!
//! The parameters live in a single [`Cell`] and are replaced as one value,
//! so an observer never reads a half-applied update.

use std::cell::Cell;
use std::rc::Rc;

use serde::{Deserialize, Serialize};

use crate::error::ModelResult;
use crate::observer::{Listener, ObserverRegistry};
use crate::point::Point2D;
use crate::snapshot::{keys, Snapshot};

/// Calibration parameters.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CalibrationParams {
    /// Raw coordinates of the physical origin.
    pub origin: Point2D,
    /// Physical units per raw unit along x.
    pub scale_x: f64,
    /// Physical units per raw unit along y.
    pub scale_y: f64,
}

impl CalibrationParams {
    pub const IDENTITY: CalibrationParams = CalibrationParams {
        origin: Point2D::ORIGIN,
        scale_x: 1.0,
        scale_y: 1.0,
    };

    pub fn new(origin: Point2D, scale_x: f64, scale_y: f64) -> Self {
        Self {
            origin,
            scale_x,
            scale_y,
        }
    }

    pub fn from_raw(&self, raw: Point2D) -> Point2D {
        Point2D::new(
            (raw.x - self.origin.x) * self.scale_x,
            (raw.y - self.origin.y) * self.scale_y,
        )
    }

    /// Inverse of [`Self::from_raw`]. `None` when either scale is zero.
    pub fn to_raw(&self, physical: Point2D) -> Option<Point2D> {
        if self.scale_x == 0.0 || self.scale_y == 0.0 {
            return None;
        }
        Some(Point2D::new(
            physical.x / self.scale_x + self.origin.x,
            physical.y / self.scale_y + self.origin.y,
        ))
    }
}

impl Default for CalibrationParams {
    fn default() -> Self {
        Self::IDENTITY
    }
}

/// Payload-free notice that a calibration's parameters were replaced.
/// Subscribers re-read the calibration rather than diffing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CalibrationChanged;

/// A shared, mutation-notified calibration.
///
/// Share it as `Rc<Calibration>`; every setter takes `&self`.
#[derive(Debug, Default)]
pub struct Calibration {
    params: Cell<CalibrationParams>,
    listeners: ObserverRegistry<CalibrationChanged>,
}

impl Calibration {
    pub fn new(params: CalibrationParams) -> Self {
        Self {
            params: Cell::new(params),
            listeners: ObserverRegistry::new(),
        }
    }

    pub fn params(&self) -> CalibrationParams {
        self.params.get()
    }

    pub fn origin(&self) -> Point2D {
        self.params.get().origin
    }

    pub fn scale(&self) -> (f64, f64) {
        let params = self.params.get();
        (params.scale_x, params.scale_y)
    }

    pub fn set_origin(&self, origin: Point2D) {
        let mut params = self.params.get();
        params.origin = origin;
        self.set_params(params);
    }

    pub fn set_scale(&self, scale_x: f64, scale_y: f64) {
        let mut params = self.params.get();
        params.scale_x = scale_x;
        params.scale_y = scale_y;
        self.set_params(params);
    }

    /// Replace all parameters at once, then notify subscribers.
    pub fn set_params(&self, params: CalibrationParams) {
        self.params.set(params);
        self.listeners.notify_all(&CalibrationChanged);
    }

    pub fn from_raw(&self, raw: Point2D) -> Point2D {
        self.params.get().from_raw(raw)
    }

    pub fn to_raw(&self, physical: Point2D) -> Option<Point2D> {
        self.params.get().to_raw(physical)
    }

    pub fn subscribe<L>(&self, listener: &Rc<L>)
    where
        L: Listener<CalibrationChanged> + 'static,
    {
        self.listeners.subscribe(listener);
    }

    pub fn unsubscribe<L>(&self, listener: &Rc<L>)
    where
        L: Listener<CalibrationChanged> + 'static,
    {
        self.listeners.unsubscribe(listener);
    }

    /// Number of live subscribers.
    pub fn subscriber_count(&self) -> usize {
        self.listeners.len()
    }

    /// Write `origin_x`, `origin_y`, `scale_x`, `scale_y` into a fresh snapshot.
    pub fn export_snapshot(&self) -> Snapshot {
        let params = self.params.get();
        let mut snapshot = Snapshot::new();
        snapshot.insert(keys::ORIGIN_X, params.origin.x);
        snapshot.insert(keys::ORIGIN_Y, params.origin.y);
        snapshot.insert(keys::SCALE_X, params.scale_x);
        snapshot.insert(keys::SCALE_Y, params.scale_y);
        snapshot
    }

    /// Restore parameters from `snapshot`.
    ///
    /// Missing fields keep their current value. A field of the wrong type
    /// aborts the restore and leaves the calibration untouched.
    ///
    /// # Errors
    ///
    /// Returns [`crate::ModelError::Import`] for fields of the wrong type.
    pub fn import_snapshot(&self, snapshot: &Snapshot) -> ModelResult<()> {
        let current = self.params.get();
        let params = CalibrationParams {
            origin: Point2D::new(
                snapshot.float(keys::ORIGIN_X)?.unwrap_or(current.origin.x),
                snapshot.float(keys::ORIGIN_Y)?.unwrap_or(current.origin.y),
            ),
            scale_x: snapshot.float(keys::SCALE_X)?.unwrap_or(current.scale_x),
            scale_y: snapshot.float(keys::SCALE_Y)?.unwrap_or(current.scale_y),
        };
        self.set_params(params);
        Ok(())
    }
}
