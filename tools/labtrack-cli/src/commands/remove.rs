//! Remove a marker.

use std::path::PathBuf;

use crate::session::Session;

pub fn run(path: PathBuf, run_id: i64) -> anyhow::Result<()> {
    let mut session =
        Session::load(&path).map_err(|e| anyhow::anyhow!("Failed to load session: {e}"))?;
    let store = session.store();

    let Some(index) = store.index_of_run_id(run_id) else {
        anyhow::bail!("No marker at run {run_id}");
    };
    let removed = store.remove_at(index)?;
    tracing::info!(run_id, index, "Removed marker");
    println!(
        "Removed run {} at ({}, {}) [{} marker(s) left]",
        removed.run_id,
        removed.position.x,
        removed.position.y,
        store.len()
    );

    session
        .save()
        .map_err(|e| anyhow::anyhow!("Failed to save session: {e}"))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::temp_session_path;
    use labtrack_marker_model::MarkerSample;

    fn session_with(path: &std::path::Path, run_ids: &[i64], selected: Option<usize>) {
        let mut session = Session::create(path, "remove");
        for &run_id in run_ids {
            session
                .store()
                .insert(MarkerSample::new(run_id, run_id as f64, 0.0))
                .unwrap();
        }
        session.store().select(selected).unwrap();
        session.save().unwrap();
    }

    #[test]
    fn test_removing_selected_marker_clears_saved_selection() {
        let path = temp_session_path("remove_selected");
        session_with(&path, &[0, 1, 2], Some(1));

        run(path.clone(), 1).unwrap();

        let loaded = Session::load(&path).unwrap();
        let run_ids: Vec<i64> = loaded.store().samples().iter().map(|s| s.run_id).collect();
        assert_eq!(run_ids, vec![0, 2]);
        assert_eq!(loaded.store().selected(), None);

        let _ = std::fs::remove_dir_all(path.parent().unwrap());
    }

    #[test]
    fn test_removing_earlier_marker_keeps_selection_on_its_sample() {
        let path = temp_session_path("remove_shift");
        session_with(&path, &[0, 1, 2], Some(2));

        run(path.clone(), 0).unwrap();

        let loaded = Session::load(&path).unwrap();
        assert_eq!(loaded.store().selected(), Some(1));
        assert_eq!(loaded.store().selected_sample().map(|s| s.run_id), Some(2));

        let _ = std::fs::remove_dir_all(path.parent().unwrap());
    }

    #[test]
    fn test_removing_unknown_run_fails() {
        let path = temp_session_path("remove_unknown");
        session_with(&path, &[3], None);

        assert!(run(path.clone(), 4).is_err());
        assert_eq!(Session::load(&path).unwrap().store().len(), 1);

        let _ = std::fs::remove_dir_all(path.parent().unwrap());
    }
}
