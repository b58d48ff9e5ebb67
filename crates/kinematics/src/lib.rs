//! LabTrack Kinematics
//!
//! Derives physical quantities from tagged markers:
//! - **Time sources:** Frame-rate times from run ids, or recorded timestamps
//! - **Series:** Position columns and first derivatives (velocity, acceleration)
//! - **Tables:** Derived values paired with their midpoint times
//!
//! This crate is pure computation. Series are views: they hold no data of
//! their own and recompute from the underlying markers on every query.

pub mod series;
pub mod table;
pub mod time;

pub use series::{acceleration, velocity, Axis, Column, Series, TimeAxis};
pub use table::Table;
pub use time::{FrameTimes, RecordedTimes, TimeSource};
