//! Select a marker or clear the selection.

use std::path::PathBuf;

use crate::session::Session;

pub fn run(path: PathBuf, run_id: Option<i64>) -> anyhow::Result<()> {
    let mut session =
        Session::load(&path).map_err(|e| anyhow::anyhow!("Failed to load session: {e}"))?;
    let store = session.store();

    match run_id {
        Some(run_id) => {
            let Some(index) = store.index_of_run_id(run_id) else {
                anyhow::bail!("No marker at run {run_id}");
            };
            store.select(Some(index))?;
            println!("Selected run {run_id} (index {index})");
        }
        None => {
            store.select(None)?;
            println!("Selection cleared");
        }
    }

    session
        .save()
        .map_err(|e| anyhow::anyhow!("Failed to save session: {e}"))?;
    Ok(())
}
