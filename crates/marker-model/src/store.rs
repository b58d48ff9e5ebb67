//! Ordered, uniquely keyed marker storage.
//!
//! Samples are kept sorted strictly ascending by `run_id`. Every mutation
//! is followed by a [`StoreEvent`] to the store's subscribers, sent after
//! the internal borrow is released, so listeners may read or mutate the
//! store from inside their callback.

use std::cell::RefCell;
use std::rc::{Rc, Weak};
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::calibration::{Calibration, CalibrationChanged, CalibrationParams};
use crate::error::{ModelError, ModelResult};
use crate::export::{ExportRow, RowSink};
use crate::observer::{Listener, ObserverRegistry};
use crate::point::Point2D;
use crate::snapshot::{keys, Snapshot};

/// A marker tagged on one frame or sensor sample.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MarkerSample {
    /// Frame/sample index assigned by the producer. Unique within a store.
    pub run_id: i64,
    /// Raw (uncalibrated) position.
    pub position: Point2D,
}

impl MarkerSample {
    pub fn new(run_id: i64, x: f64, y: f64) -> Self {
        Self {
            run_id,
            position: Point2D::new(x, y),
        }
    }
}

/// Change notifications emitted by a [`MarkerStore`].
#[derive(Debug, Clone, PartialEq)]
pub enum StoreEvent {
    /// A sample was inserted at `index`.
    Added { index: usize },
    /// The sample previously at `index` was removed.
    Removed { index: usize, sample: MarkerSample },
    /// `count` samples starting at `index` changed in place.
    Changed { index: usize, count: usize },
    /// Every sample (or every calibrated read) may have changed.
    AllChanged,
    /// The selected index changed, including shifts caused by an insert
    /// or removal before it.
    SelectionChanged { selected: Option<usize> },
}

/// Read access to an ordered marker sequence.
pub trait MarkerSource {
    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn run_id_at(&self, index: usize) -> ModelResult<i64>;

    fn raw_position_at(&self, index: usize) -> ModelResult<Point2D>;

    /// Position after calibration, or the raw position when none is attached.
    fn calibrated_position_at(&self, index: usize) -> ModelResult<Point2D>;
}

#[derive(Debug, Clone, Default)]
struct StoreState {
    samples: Vec<MarkerSample>,
    selected: Option<usize>,
}

/// Re-emits calibration changes as [`StoreEvent::AllChanged`].
struct CalibrationForwarder {
    listeners: Weak<ObserverRegistry<StoreEvent>>,
}

impl Listener<CalibrationChanged> for CalibrationForwarder {
    fn notify(&self, _event: &CalibrationChanged) {
        if let Some(listeners) = self.listeners.upgrade() {
            listeners.notify_all(&StoreEvent::AllChanged);
        }
    }
}

struct CalibrationLink {
    calibration: Rc<Calibration>,
    forwarder: Rc<CalibrationForwarder>,
}

/// Ordered marker store with selection, calibration, and change notification.
pub struct MarkerStore {
    state: RefCell<StoreState>,
    calibration: RefCell<Option<CalibrationLink>>,
    listeners: Rc<ObserverRegistry<StoreEvent>>,
}

impl MarkerStore {
    pub fn new() -> Self {
        Self {
            state: RefCell::new(StoreState::default()),
            calibration: RefCell::new(None),
            listeners: Rc::new(ObserverRegistry::new()),
        }
    }

    pub fn len(&self) -> usize {
        self.state.borrow().samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.state.borrow().samples.is_empty()
    }

    /// Copy of all samples in run-id order.
    pub fn samples(&self) -> Vec<MarkerSample> {
        self.state.borrow().samples.clone()
    }

    pub fn sample_at(&self, index: usize) -> ModelResult<MarkerSample> {
        let state = self.state.borrow();
        state
            .samples
            .get(index)
            .copied()
            .ok_or(ModelError::OutOfRange {
                index,
                len: state.samples.len(),
            })
    }

    pub fn run_id_at(&self, index: usize) -> ModelResult<i64> {
        self.sample_at(index).map(|s| s.run_id)
    }

    pub fn raw_position_at(&self, index: usize) -> ModelResult<Point2D> {
        self.sample_at(index).map(|s| s.position)
    }

    /// Calibrated position of the sample at `index`.
    ///
    /// Without an attached calibration the raw position is returned as-is.
    pub fn calibrated_position_at(&self, index: usize) -> ModelResult<Point2D> {
        let raw = self.raw_position_at(index)?;
        Ok(match self.calibration.borrow().as_ref() {
            Some(link) => link.calibration.from_raw(raw),
            None => raw,
        })
    }

    /// Index of the sample tagged with `run_id`, if any.
    pub fn index_of_run_id(&self, run_id: i64) -> Option<usize> {
        self.state
            .borrow()
            .samples
            .binary_search_by_key(&run_id, |s| s.run_id)
            .ok()
    }

    /// Insert `sample`, keeping run ids sorted and unique.
    ///
    /// Returns the index the sample landed at. A sample whose run id is
    /// already present is rejected without mutation or notification.
    ///
    /// When the insertion shifts the selected index, `SelectionChanged`
    /// follows `Added` with the new index.
    pub fn insert(&self, sample: MarkerSample) -> ModelResult<usize> {
        let (index, shifted) = {
            let mut state = self.state.borrow_mut();
            let index = match state
                .samples
                .binary_search_by_key(&sample.run_id, |s| s.run_id)
            {
                Ok(_) => {
                    return Err(ModelError::DuplicateKey {
                        run_id: sample.run_id,
                    })
                }
                Err(index) => index,
            };
            state.samples.insert(index, sample);
            // Keep the selection on the same sample.
            let shifted = match state.selected {
                Some(selected) if selected >= index => {
                    state.selected = Some(selected + 1);
                    true
                }
                _ => false,
            };
            (index, shifted.then_some(state.selected))
        };

        self.listeners.notify_all(&StoreEvent::Added { index });
        if let Some(selected) = shifted {
            self.listeners
                .notify_all(&StoreEvent::SelectionChanged { selected });
        }
        Ok(index)
    }

    /// Remove and return the sample at `index`.
    ///
    /// Removing the selected sample clears the selection; removing an
    /// earlier sample shifts it down. Either way `SelectionChanged` follows
    /// `Removed`.
    pub fn remove_at(&self, index: usize) -> ModelResult<MarkerSample> {
        let (sample, selection) = {
            let mut state = self.state.borrow_mut();
            ModelError::check_index(index, state.samples.len())?;
            let sample = state.samples.remove(index);
            let selection = match state.selected {
                Some(selected) if selected == index => Some(None),
                Some(selected) if selected > index => Some(Some(selected - 1)),
                _ => None,
            };
            if let Some(selected) = selection {
                state.selected = selected;
            }
            (sample, selection)
        };

        self.listeners
            .notify_all(&StoreEvent::Removed { index, sample });
        if let Some(selected) = selection {
            self.listeners
                .notify_all(&StoreEvent::SelectionChanged { selected });
        }
        Ok(sample)
    }

    /// Move the sample at `index` to a new raw position.
    pub fn set_position(&self, index: usize, position: Point2D) -> ModelResult<()> {
        {
            let mut state = self.state.borrow_mut();
            let len = state.samples.len();
            let sample = state
                .samples
                .get_mut(index)
                .ok_or(ModelError::OutOfRange { index, len })?;
            sample.position = position;
        }

        self.listeners
            .notify_all(&StoreEvent::Changed { index, count: 1 });
        Ok(())
    }

    /// Remove every sample and the selection.
    pub fn clear(&self) {
        let had_selection = {
            let mut state = self.state.borrow_mut();
            state.samples.clear();
            state.selected.take().is_some()
        };

        self.listeners.notify_all(&StoreEvent::AllChanged);
        if had_selection {
            self.listeners
                .notify_all(&StoreEvent::SelectionChanged { selected: None });
        }
    }

    pub fn selected(&self) -> Option<usize> {
        self.state.borrow().selected
    }

    pub fn selected_sample(&self) -> Option<MarkerSample> {
        let state = self.state.borrow();
        state.selected.and_then(|i| state.samples.get(i).copied())
    }

    /// Select the sample at `index`, or clear the selection with `None`.
    pub fn select(&self, selected: Option<usize>) -> ModelResult<()> {
        {
            let mut state = self.state.borrow_mut();
            if let Some(index) = selected {
                ModelError::check_index(index, state.samples.len())?;
            }
            state.selected = selected;
        }

        self.listeners
            .notify_all(&StoreEvent::SelectionChanged { selected });
        Ok(())
    }

    /// Attach `calibration` (or detach with `None`).
    ///
    /// Any previous subscription is released first. Emits exactly one
    /// `AllChanged`, since every calibrated read depends on the transform.
    pub fn set_calibration(&self, calibration: Option<Rc<Calibration>>) {
        let previous = self.calibration.borrow_mut().take();
        if let Some(link) = previous {
            link.calibration.unsubscribe(&link.forwarder);
        }

        if let Some(calibration) = calibration {
            let forwarder = Rc::new(CalibrationForwarder {
                listeners: Rc::downgrade(&self.listeners),
            });
            calibration.subscribe(&forwarder);
            *self.calibration.borrow_mut() = Some(CalibrationLink {
                calibration,
                forwarder,
            });
        }

        self.listeners.notify_all(&StoreEvent::AllChanged);
    }

    pub fn calibration(&self) -> Option<Rc<Calibration>> {
        self.calibration
            .borrow()
            .as_ref()
            .map(|link| link.calibration.clone())
    }

    pub fn subscribe<L>(&self, listener: &Rc<L>)
    where
        L: Listener<StoreEvent> + 'static,
    {
        self.listeners.subscribe(listener);
    }

    pub fn unsubscribe<L>(&self, listener: &Rc<L>)
    where
        L: Listener<StoreEvent> + 'static,
    {
        self.listeners.unsubscribe(listener);
    }

    /// Number of live subscribers.
    pub fn subscriber_count(&self) -> usize {
        self.listeners.len()
    }

    /// Immutable copy of the current state, safe to hand to another thread.
    pub fn publish(&self) -> Arc<StoreSnapshot> {
        let state = self.state.borrow();
        Arc::new(StoreSnapshot {
            samples: state.samples.clone(),
            selected: state.selected,
            calibration: self
                .calibration
                .borrow()
                .as_ref()
                .map(|link| link.calibration.params()),
        })
    }

    /// Append one row per sample to `sink`, in run-id order.
    ///
    /// Rows come from a single published state, so a sink that mutates the
    /// store while writing does not affect the rows of this export.
    ///
    /// Returns the number of rows written.
    pub fn export_rows<S>(&self, sink: &mut S) -> Result<usize, S::Error>
    where
        S: RowSink,
    {
        self.publish().export_rows(sink)
    }

    /// Write entries and selection into a fresh snapshot.
    pub fn export_snapshot(&self) -> Snapshot {
        let state = self.state.borrow();
        let mut snapshot = Snapshot::new();
        snapshot.insert(keys::MARKER_COUNT, state.samples.len() as i64);
        for (i, sample) in state.samples.iter().enumerate() {
            snapshot.insert(keys::marker_run_id(i), sample.run_id);
            snapshot.insert(keys::marker_x(i), sample.position.x);
            snapshot.insert(keys::marker_y(i), sample.position.y);
        }
        snapshot.insert(
            keys::SELECTED_INDEX,
            state.selected.map_or(-1, |i| i as i64),
        );
        snapshot
    }

    /// Restore entries and selection from `snapshot`.
    ///
    /// A missing `marker_count` keeps the current entries; missing `x`/`y`
    /// of a listed entry default to `0.0`. A negative `selected_index`
    /// clears the selection; a missing one keeps it when still valid.
    /// Entries are re-sorted by run id and the selection follows its sample.
    ///
    /// Emits one `AllChanged` (plus `SelectionChanged` when the selection
    /// moved) on success.
    ///
    /// # Errors
    ///
    /// Returns [`ModelError::Import`] for fields of the wrong type, a
    /// negative count, a missing run id, duplicate run ids, or a selection
    /// outside the entry list. The store is left untouched.
    pub fn import_snapshot(&self, snapshot: &Snapshot) -> ModelResult<()> {
        let current = self.state.borrow().clone();

        let listed = match snapshot.int(keys::MARKER_COUNT)? {
            None => None,
            Some(count) => {
                let count = usize::try_from(count).map_err(|_| {
                    ModelError::import(format!("'{}' must not be negative", keys::MARKER_COUNT))
                })?;
                Some(read_samples(snapshot, count)?)
            }
        };
        let replaced = listed.is_some();
        let unsorted = listed.unwrap_or_else(|| current.samples.clone());

        let selected_run_id = match snapshot.int(keys::SELECTED_INDEX)? {
            None => current
                .selected
                .and_then(|i| current.samples.get(i))
                .map(|s| s.run_id),
            Some(index) if index < 0 => None,
            Some(index) => {
                let sample = usize::try_from(index)
                    .ok()
                    .and_then(|i| unsorted.get(i))
                    .ok_or_else(|| {
                        ModelError::import(format!(
                            "'{}' {index} is outside {} entries",
                            keys::SELECTED_INDEX,
                            unsorted.len()
                        ))
                    })?;
                Some(sample.run_id)
            }
        };

        let mut samples = unsorted;
        if replaced {
            samples.sort_by_key(|s| s.run_id);
            if let Some(pair) = samples.windows(2).find(|w| w[0].run_id == w[1].run_id) {
                return Err(ModelError::import(format!(
                    "duplicate run id {}",
                    pair[0].run_id
                )));
            }
        }

        let selected = selected_run_id
            .and_then(|run_id| samples.binary_search_by_key(&run_id, |s| s.run_id).ok());
        let selection_moved = selected != current.selected;

        *self.state.borrow_mut() = StoreState { samples, selected };

        self.listeners.notify_all(&StoreEvent::AllChanged);
        if selection_moved {
            self.listeners
                .notify_all(&StoreEvent::SelectionChanged { selected });
        }
        Ok(())
    }
}

fn read_samples(snapshot: &Snapshot, count: usize) -> ModelResult<Vec<MarkerSample>> {
    (0..count)
        .map(|i| -> ModelResult<MarkerSample> {
            let run_id_key = keys::marker_run_id(i);
            let run_id = snapshot
                .int(&run_id_key)?
                .ok_or_else(|| ModelError::import(format!("missing field '{run_id_key}'")))?;
            let x = snapshot.float(&keys::marker_x(i))?.unwrap_or(0.0);
            let y = snapshot.float(&keys::marker_y(i))?.unwrap_or(0.0);
            Ok(MarkerSample::new(run_id, x, y))
        })
        .collect()
}

impl Default for MarkerStore {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for MarkerStore {
    fn drop(&mut self) {
        if let Some(link) = self.calibration.get_mut().take() {
            link.calibration.unsubscribe(&link.forwarder);
        }
    }
}

impl std::fmt::Debug for MarkerStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let state = self.state.borrow();
        f.debug_struct("MarkerStore")
            .field("samples", &state.samples)
            .field("selected", &state.selected)
            .field(
                "calibration",
                &self
                    .calibration
                    .borrow()
                    .as_ref()
                    .map(|link| link.calibration.params()),
            )
            .field("listeners", &self.listeners)
            .finish()
    }
}

impl MarkerSource for MarkerStore {
    fn len(&self) -> usize {
        MarkerStore::len(self)
    }

    fn run_id_at(&self, index: usize) -> ModelResult<i64> {
        MarkerStore::run_id_at(self, index)
    }

    fn raw_position_at(&self, index: usize) -> ModelResult<Point2D> {
        MarkerStore::raw_position_at(self, index)
    }

    fn calibrated_position_at(&self, index: usize) -> ModelResult<Point2D> {
        MarkerStore::calibrated_position_at(self, index)
    }
}

/// Frozen copy of a [`MarkerStore`] taken from one coherent state.
///
/// `Send + Sync`: this is what crosses to rendering or ingest threads.
#[derive(Debug, Clone, PartialEq)]
pub struct StoreSnapshot {
    samples: Vec<MarkerSample>,
    selected: Option<usize>,
    calibration: Option<CalibrationParams>,
}

impl StoreSnapshot {
    pub fn samples(&self) -> &[MarkerSample] {
        &self.samples
    }

    pub fn selected(&self) -> Option<usize> {
        self.selected
    }

    pub fn calibration(&self) -> Option<CalibrationParams> {
        self.calibration
    }

    fn sample_at(&self, index: usize) -> ModelResult<&MarkerSample> {
        self.samples.get(index).ok_or(ModelError::OutOfRange {
            index,
            len: self.samples.len(),
        })
    }

    pub fn export_rows<S>(&self, sink: &mut S) -> Result<usize, S::Error>
    where
        S: RowSink,
    {
        for sample in &self.samples {
            sink.write_row(&ExportRow {
                run_id: sample.run_id,
                raw: sample.position,
                calibrated: self.calibrate(sample.position),
            })?;
        }
        Ok(self.samples.len())
    }

    fn calibrate(&self, raw: Point2D) -> Point2D {
        match &self.calibration {
            Some(params) => params.from_raw(raw),
            None => raw,
        }
    }
}

impl MarkerSource for StoreSnapshot {
    fn len(&self) -> usize {
        self.samples.len()
    }

    fn run_id_at(&self, index: usize) -> ModelResult<i64> {
        self.sample_at(index).map(|s| s.run_id)
    }

    fn raw_position_at(&self, index: usize) -> ModelResult<Point2D> {
        self.sample_at(index).map(|s| s.position)
    }

    fn calibrated_position_at(&self, index: usize) -> ModelResult<Point2D> {
        self.sample_at(index).map(|s| self.calibrate(s.position))
    }
}
