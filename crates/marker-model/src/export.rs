//! Row-oriented export contract.
//!
//! The store hands out one [`ExportRow`] per sample; the sink decides how
//! rows are laid out (delimiters, headers, number formatting).

use std::convert::Infallible;

use serde::{Deserialize, Serialize};

use crate::point::Point2D;

/// One exported marker sample.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ExportRow {
    pub run_id: i64,
    pub raw: Point2D,
    pub calibrated: Point2D,
}

/// Line-oriented destination for exported rows.
pub trait RowSink {
    type Error;

    /// Append a single row.
    fn write_row(&mut self, row: &ExportRow) -> Result<(), Self::Error>;
}

impl RowSink for Vec<ExportRow> {
    type Error = Infallible;

    fn write_row(&mut self, row: &ExportRow) -> Result<(), Self::Error> {
        self.push(*row);
        Ok(())
    }
}
