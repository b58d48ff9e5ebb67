//! LabTrack Marker Model
//!
//! Defines the core data contracts for a tagging session:
//! - **Markers:** Ordered, uniquely keyed samples tagged on frames or sensor readings
//! - **Calibration:** The raw-to-physical coordinate transform shared by stores
//! - **Observers:** Weakly held listener registries used for change notification
//! - **Snapshots:** Flat key/value save and restore
//!
//! All types here are single-threaded. Use [`MarkerStore::publish`] to hand an
//! immutable copy of a store to another thread.

pub mod calibration;
pub mod error;
pub mod export;
pub mod observer;
pub mod point;
pub mod snapshot;
pub mod store;
pub mod unit;

pub use calibration::*;
pub use error::*;
pub use export::*;
pub use observer::*;
pub use point::*;
pub use snapshot::{Snapshot, SnapshotValue};
pub use store::*;
pub use unit::*;
