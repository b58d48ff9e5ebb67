//! Create a new LabTrack session.

use std::path::PathBuf;

use crate::session::Session;

pub fn run(path: PathBuf, name: Option<String>, force: bool) -> anyhow::Result<()> {
    if path.exists() && !force {
        anyhow::bail!(
            "Session already exists at {} (use --force to overwrite)",
            path.display()
        );
    }

    let name = name.unwrap_or_else(|| {
        path.file_stem()
            .map(|stem| stem.to_string_lossy().into_owned())
            .unwrap_or_else(|| "session".to_string())
    });
    println!("Creating session '{}' at {}", name, path.display());

    let mut session = Session::create(&path, &name);
    session
        .save()
        .map_err(|e| anyhow::anyhow!("Failed to create session: {e}"))?;

    tracing::info!(path = %path.display(), "Session created");
    println!("Session created. Tag markers with `labtrack tag`.");
    Ok(())
}
