//! Tag a marker on a frame.

use std::path::PathBuf;

use labtrack_marker_model::{MarkerSample, Point2D};

use crate::session::Session;

pub fn run(
    path: PathBuf,
    run_id: i64,
    x: f64,
    y: f64,
    replace: bool,
    select: bool,
) -> anyhow::Result<()> {
    let mut session =
        Session::load(&path).map_err(|e| anyhow::anyhow!("Failed to load session: {e}"))?;
    let store = session.store();

    let index = match store.index_of_run_id(run_id) {
        Some(index) if replace => {
            store.set_position(index, Point2D::new(x, y))?;
            tracing::debug!(run_id, index, "Moved marker");
            index
        }
        _ => {
            let index = store.insert(MarkerSample::new(run_id, x, y))?;
            tracing::debug!(run_id, index, "Inserted marker");
            index
        }
    };

    if select {
        store.select(Some(index))?;
    }

    let physical = store.calibrated_position_at(index)?;
    println!(
        "Tagged run {run_id} at ({x}, {y}) -> ({:.6}, {:.6}) [{} marker(s)]",
        physical.x,
        physical.y,
        store.len()
    );

    session
        .save()
        .map_err(|e| anyhow::anyhow!("Failed to save session: {e}"))?;
    Ok(())
}
