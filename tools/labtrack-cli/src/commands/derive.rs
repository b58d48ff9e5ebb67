//! Print position, velocity or acceleration over time.

use std::path::{Path, PathBuf};

use clap::ValueEnum;
use labtrack_kinematics::{Axis, FrameTimes, RecordedTimes, Series, Table, TimeAxis, TimeSource};
use labtrack_marker_model::Unit;

use crate::session::Session;
use crate::writer::DelimitedWriter;

/// Derived quantity to print.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Quantity {
    Position,
    Velocity,
    Acceleration,
}

impl Quantity {
    /// Number of derivatives applied to the position.
    pub fn order(self) -> usize {
        match self {
            Quantity::Position => 0,
            Quantity::Velocity => 1,
            Quantity::Acceleration => 2,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum AxisArg {
    X,
    Y,
}

impl From<AxisArg> for Axis {
    fn from(axis: AxisArg) -> Self {
        match axis {
            AxisArg::X => Axis::X,
            AxisArg::Y => Axis::Y,
        }
    }
}

#[derive(Debug, Clone)]
pub struct DeriveOptions {
    pub quantity: Quantity,
    pub axis: AxisArg,
    pub frame_rate: f64,
    pub times: Option<PathBuf>,
    pub time_exponent: i32,
    pub raw: bool,
    pub delimiter: u8,
}

pub fn run(path: PathBuf, options: DeriveOptions) -> anyhow::Result<()> {
    let session =
        Session::load(&path).map_err(|e| anyhow::anyhow!("Failed to load session: {e}"))?;
    let store = session.store();

    let frame_times;
    let recorded_times;
    let times: &dyn TimeSource = match &options.times {
        Some(times_path) => {
            let unit = Unit::seconds().scaled(options.time_exponent);
            recorded_times = RecordedTimes::new(read_times(times_path)?, unit);
            if recorded_times.len() != store.len() {
                tracing::warn!(
                    times = recorded_times.len(),
                    markers = store.len(),
                    "Time count does not match marker count; extra entries are ignored"
                );
            }
            &recorded_times
        }
        None => {
            if options.frame_rate.is_nan() || options.frame_rate <= 0.0 {
                anyhow::bail!("Frame rate must be positive, got {}", options.frame_rate);
            }
            frame_times = FrameTimes::new(store, options.frame_rate);
            &frame_times
        }
    };

    let axis = Axis::from(options.axis);
    let base = TimeAxis::recorded(times);
    let position = if options.raw {
        Series::raw_position(store, axis)
    } else {
        Series::position(store, axis)
    };
    let table = Table::new(differentiate(position, &base, options.quantity.order()), &base);
    let rows = table.rows()?;
    let mut writer = DelimitedWriter::new(std::io::stdout().lock(), options.delimiter);
    writer.write_table(&table.headers(), &rows)?;
    writer.flush()?;
    tracing::debug!(
        quantity = ?options.quantity,
        rows = writer.rows_written(),
        "Derived table written"
    );
    Ok(())
}

/// Differentiate `series` `order` times, each pass over the previous
/// pass's aligned time axis.
fn differentiate<'a>(series: Series<'a>, base: &TimeAxis<'a>, order: usize) -> Series<'a> {
    (0..order).fold(series, |series, _| {
        let times = series.aligned_times(base);
        series.derivative(times)
    })
}

fn read_times(path: &Path) -> anyhow::Result<Vec<f64>> {
    let content = std::fs::read_to_string(path)
        .map_err(|e| anyhow::anyhow!("Failed to read times from {}: {e}", path.display()))?;
    parse_times(&content)
}

/// One time per line. Blank lines and `#` comments are skipped.
fn parse_times(content: &str) -> anyhow::Result<Vec<f64>> {
    content
        .lines()
        .enumerate()
        .filter(|(_, line)| {
            let trimmed = line.trim();
            !trimmed.is_empty() && !trimmed.starts_with('#')
        })
        .map(|(number, line)| {
            line.trim()
                .parse::<f64>()
                .map_err(|e| anyhow::anyhow!("Invalid time on line {}: {e}", number + 1))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use labtrack_kinematics::Column;
    use labtrack_marker_model::{MarkerSample, MarkerStore};

    #[test]
    fn test_parse_times_skips_comments() {
        let times = parse_times("# frame times\n0.0\n\n 1.5 \n3\n").unwrap();
        assert_eq!(times, vec![0.0, 1.5, 3.0]);
    }

    #[test]
    fn test_parse_times_reports_line() {
        let err = parse_times("0.0\nabc\n").unwrap_err();
        assert!(err.to_string().contains("line 2"));
    }

    #[test]
    fn test_differentiate_orders() {
        let store = MarkerStore::new();
        for (run_id, x) in [(0, 0.0), (1, 2.0), (2, 8.0)] {
            store.insert(MarkerSample::new(run_id, x, 0.0)).unwrap();
        }
        let times = RecordedTimes::seconds(vec![0.0, 1.0, 3.0]);
        let base = TimeAxis::recorded(&times);
        let position = Series::position(&store, Axis::X);

        let velocity = differentiate(position.clone(), &base, Quantity::Velocity.order());
        assert_eq!(velocity.label(), "v_x");
        assert_eq!(
            Table::new(velocity, &base).rows().unwrap(),
            vec![(0.5, 2.0), (2.0, 3.0)]
        );

        let acceleration = differentiate(position, &base, Quantity::Acceleration.order());
        let rows = Table::new(acceleration, &base).rows().unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].0, 1.25);
    }
}
