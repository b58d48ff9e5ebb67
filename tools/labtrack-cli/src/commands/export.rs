//! Export session markers as delimited rows.

use std::fs::File;
use std::io::Write;
use std::path::PathBuf;

use labtrack_marker_model::MarkerStore;

use crate::session::Session;
use crate::writer::DelimitedWriter;

pub fn run(
    path: PathBuf,
    output: Option<PathBuf>,
    delimiter: u8,
    header: bool,
) -> anyhow::Result<()> {
    let session =
        Session::load(&path).map_err(|e| anyhow::anyhow!("Failed to load session: {e}"))?;

    match output {
        Some(output) => {
            if let Some(parent) = output.parent() {
                if !parent.as_os_str().is_empty() {
                    std::fs::create_dir_all(parent)?;
                }
            }
            let file = File::create(&output)?;
            let rows = write_rows(session.store(), file, delimiter, header)?;
            tracing::info!(rows, output = %output.display(), "Export complete");
            println!("Exported {rows} marker(s) to {}", output.display());
        }
        None => {
            let rows = write_rows(session.store(), std::io::stdout().lock(), delimiter, header)?;
            tracing::debug!(rows, "Exported to stdout");
        }
    }

    Ok(())
}

fn write_rows<W: Write>(
    store: &MarkerStore,
    inner: W,
    delimiter: u8,
    header: bool,
) -> anyhow::Result<usize> {
    let mut writer = DelimitedWriter::new(inner, delimiter);
    if header {
        writer.write_header()?;
    }
    let rows = store.export_rows(&mut writer)?;
    writer.flush()?;
    Ok(rows)
}
