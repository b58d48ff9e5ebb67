//! Show session information.

use std::path::PathBuf;

use crate::session::Session;

pub fn run(path: PathBuf) -> anyhow::Result<()> {
    let session =
        Session::load(&path).map_err(|e| anyhow::anyhow!("Failed to load session: {e}"))?;
    let store = session.store();
    let params = session.calibration().params();

    println!("Session: {}", session.name());
    println!("  Path: {}", session.path().display());
    match session.saved_at() {
        Some(saved_at) => println!("  Saved: {}", saved_at.to_rfc3339()),
        None => println!("  Saved: never"),
    }
    println!();

    println!("Calibration:");
    println!("  Origin: ({}, {})", params.origin.x, params.origin.y);
    println!("  Scale: ({}, {})", params.scale_x, params.scale_y);
    println!();

    let samples = store.samples();
    println!("Markers: {}", samples.len());
    if let (Some(first), Some(last)) = (samples.first(), samples.last()) {
        println!("  Runs: {}..={}", first.run_id, last.run_id);
    }
    match store.selected_sample() {
        Some(sample) => println!("  Selected: run {}", sample.run_id),
        None => println!("  Selected: none"),
    }
    for (index, sample) in samples.iter().enumerate() {
        let physical = store.calibrated_position_at(index)?;
        let marker = if store.selected() == Some(index) {
            "*"
        } else {
            " "
        };
        println!(
            "  {marker} {:>6}  raw ({}, {})  physical ({:.6}, {:.6})",
            sample.run_id, sample.position.x, sample.position.y, physical.x, physical.y
        );
    }

    Ok(())
}
