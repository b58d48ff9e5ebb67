//! Delimited text output for exported marker rows.

use std::io::Write;

use labtrack_common::{LabtrackError, LabtrackResult};
use labtrack_marker_model::{ExportRow, RowSink};

/// Column names, in row order.
pub const HEADER: [&str; 5] = ["run_id", "x_raw", "y_raw", "x", "y"];

/// Parse a delimiter setting: one ASCII character, or `\t` / `tab`.
pub fn parse_delimiter(value: &str) -> LabtrackResult<u8> {
    match value {
        "\\t" | "tab" => Ok(b'\t'),
        _ => match value.as_bytes() {
            [byte] if byte.is_ascii() && *byte != b'"' && *byte != b'\n' && *byte != b'\r' => {
                Ok(*byte)
            }
            _ => Err(LabtrackError::config(format!(
                "Delimiter must be a single ASCII character other than a quote or newline, got {value:?}"
            ))),
        },
    }
}

/// Writes one delimited record per row. Fields containing the delimiter
/// are quoted.
pub struct DelimitedWriter<W: Write> {
    writer: csv::Writer<W>,
    rows_written: u64,
}

impl<W: Write> DelimitedWriter<W> {
    pub fn new(inner: W, delimiter: u8) -> Self {
        let writer = csv::WriterBuilder::new()
            .delimiter(delimiter)
            .terminator(csv::Terminator::Any(b'\n'))
            .from_writer(inner);
        Self {
            writer,
            rows_written: 0,
        }
    }

    /// Write the header line.
    pub fn write_header(&mut self) -> LabtrackResult<()> {
        self.writer
            .write_record(HEADER)
            .map_err(|e| LabtrackError::export(format!("Failed to write header: {e}")))
    }

    /// Write any `(time, value)` table with its headers.
    pub fn write_table(
        &mut self,
        headers: &(String, String),
        rows: &[(f64, f64)],
    ) -> LabtrackResult<()> {
        self.writer
            .write_record([headers.0.as_str(), headers.1.as_str()])
            .map_err(|e| LabtrackError::export(format!("Failed to write header: {e}")))?;
        for (t, v) in rows {
            self.writer
                .write_record([t.to_string(), v.to_string()])
                .map_err(|e| LabtrackError::export(format!("Failed to write row: {e}")))?;
            self.rows_written += 1;
        }
        Ok(())
    }

    pub fn flush(&mut self) -> LabtrackResult<()> {
        self.writer
            .flush()
            .map_err(|e| LabtrackError::export(format!("Failed to flush rows: {e}")))
    }

    pub fn rows_written(&self) -> u64 {
        self.rows_written
    }

    /// Flush and return the underlying writer.
    pub fn into_inner(self) -> LabtrackResult<W> {
        self.writer
            .into_inner()
            .map_err(|e| LabtrackError::export(format!("Failed to flush rows: {}", e.error())))
    }
}

impl<W: Write> RowSink for DelimitedWriter<W> {
    type Error = LabtrackError;

    fn write_row(&mut self, row: &ExportRow) -> Result<(), Self::Error> {
        self.writer
            .write_record([
                row.run_id.to_string(),
                row.raw.x.to_string(),
                row.raw.y.to_string(),
                row.calibrated.x.to_string(),
                row.calibrated.y.to_string(),
            ])
            .map_err(|e| LabtrackError::export(format!("Failed to write row: {e}")))?;
        self.rows_written += 1;
        Ok(())
    }
}
