//! Session files: one JSON document holding a store and its calibration.

use std::path::{Path, PathBuf};
use std::rc::Rc;

use chrono::{DateTime, Utc};
use labtrack_common::{LabtrackError, LabtrackResult};
use labtrack_marker_model::{Calibration, MarkerStore, Snapshot, SnapshotValue};
use serde::{Deserialize, Serialize};

/// Current session file format version.
pub const FORMAT_VERSION: u32 = 1;

/// On-disk layout of a session.
#[derive(Debug, Clone, Serialize, Deserialize)]
struct SessionFile {
    version: u32,
    name: String,
    saved_at: DateTime<Utc>,
    /// Flat store and calibration fields.
    fields: Snapshot,
}

/// A loaded tagging session.
#[derive(Debug)]
pub struct Session {
    path: PathBuf,
    name: String,
    saved_at: Option<DateTime<Utc>>,
    calibration: Rc<Calibration>,
    store: MarkerStore,
}

impl Session {
    /// Create an empty session. Nothing is written until [`Session::save`].
    pub fn create(path: &Path, name: &str) -> Self {
        let calibration = Rc::new(Calibration::default());
        let store = MarkerStore::new();
        store.set_calibration(Some(calibration.clone()));
        Self {
            path: path.to_path_buf(),
            name: name.to_string(),
            saved_at: None,
            calibration,
            store,
        }
    }

    /// Load a session file.
    pub fn load(path: &Path) -> LabtrackResult<Self> {
        if !path.exists() {
            return Err(LabtrackError::FileNotFound {
                path: path.to_path_buf(),
            });
        }

        let content = std::fs::read_to_string(path)?;
        let file: SessionFile = serde_json::from_str(&content)?;
        if file.version > FORMAT_VERSION {
            return Err(LabtrackError::session(format!(
                "Unsupported session version {} (expected <= {FORMAT_VERSION})",
                file.version
            )));
        }

        let mut session = Self::create(path, &file.name);
        session.calibration.import_snapshot(&file.fields)?;
        session.store.import_snapshot(&file.fields)?;
        session.saved_at = Some(file.saved_at);
        Ok(session)
    }

    /// Write the session back to its path, stamping `saved_at`.
    ///
    /// Fails without touching the file when a field holds a non-finite
    /// number, since JSON cannot represent it.
    pub fn save(&mut self) -> LabtrackResult<()> {
        let fields = self.snapshot();
        if let Some((key, value)) = fields.iter().find(|(_, value)| {
            matches!(value, SnapshotValue::Float(v) if !v.is_finite())
        }) {
            return Err(LabtrackError::session(format!(
                "Cannot save non-finite value {value:?} in '{key}'"
            )));
        }

        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }

        let saved_at = Utc::now();
        let file = SessionFile {
            version: FORMAT_VERSION,
            name: self.name.clone(),
            saved_at,
            fields,
        };
        let json = serde_json::to_string_pretty(&file)?;
        std::fs::write(&self.path, json)?;
        self.saved_at = Some(saved_at);
        Ok(())
    }

    /// Store and calibration fields merged into one flat snapshot.
    pub fn snapshot(&self) -> Snapshot {
        let mut snapshot = self.store.export_snapshot();
        snapshot.merge(self.calibration.export_snapshot());
        snapshot
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn saved_at(&self) -> Option<DateTime<Utc>> {
        self.saved_at
    }

    pub fn store(&self) -> &MarkerStore {
        &self.store
    }

    pub fn calibration(&self) -> &Rc<Calibration> {
        &self.calibration
    }
}

#[cfg(test)]
pub(crate) fn temp_session_path(name: &str) -> PathBuf {
    let dir = std::env::temp_dir().join(format!("labtrack_test_{name}"));
    let _ = std::fs::remove_dir_all(&dir);
    dir.join("session.json")
}

#[cfg(test)]
mod tests {
    use super::*;
    use labtrack_marker_model::{MarkerSample, Point2D};

    #[test]
    fn test_save_and_load_session() {
        let path = temp_session_path("roundtrip");
        let mut session = Session::create(&path, "pendulum");
        session
            .store()
            .insert(MarkerSample::new(3, 10.0, 20.0))
            .unwrap();
        session
            .store()
            .insert(MarkerSample::new(1, 5.0, 6.0))
            .unwrap();
        session.store().select(Some(1)).unwrap();
        session.calibration().set_origin(Point2D::new(5.0, 6.0));
        session.calibration().set_scale(0.5, -0.5);
        session.save().unwrap();

        let loaded = Session::load(&path).unwrap();
        assert_eq!(loaded.name(), "pendulum");
        assert!(loaded.saved_at().is_some());
        assert_eq!(loaded.store().samples(), session.store().samples());
        assert_eq!(loaded.store().selected(), Some(1));
        assert_eq!(loaded.calibration().params(), session.calibration().params());
        assert_eq!(
            loaded.store().calibrated_position_at(1),
            Ok(Point2D::new(2.5, -7.0))
        );

        let _ = std::fs::remove_dir_all(path.parent().unwrap());
    }

    #[test]
    fn test_loaded_store_follows_loaded_calibration() {
        let path = temp_session_path("shared_calibration");
        let mut session = Session::create(&path, "cart");
        session
            .store()
            .insert(MarkerSample::new(0, 4.0, 0.0))
            .unwrap();
        session.save().unwrap();

        let loaded = Session::load(&path).unwrap();
        loaded.calibration().set_scale(2.0, 1.0);
        assert_eq!(
            loaded.store().calibrated_position_at(0),
            Ok(Point2D::new(8.0, 0.0))
        );

        let _ = std::fs::remove_dir_all(path.parent().unwrap());
    }

    #[test]
    fn test_non_finite_value_is_not_saved() {
        let path = temp_session_path("non_finite");
        let mut session = Session::create(&path, "bad");
        session.save().unwrap();
        session
            .store()
            .insert(MarkerSample::new(0, f64::INFINITY, 1.0))
            .unwrap();

        let err = session.save().unwrap_err();
        assert!(matches!(err, LabtrackError::Session { .. }));
        assert!(err.to_string().contains("marker_0_x"));

        // The previous file is still loadable.
        let loaded = Session::load(&path).unwrap();
        assert!(loaded.store().is_empty());

        session.store().remove_at(0).unwrap();
        session.calibration().set_scale(f64::NAN, 1.0);
        assert!(session.save().is_err());

        let _ = std::fs::remove_dir_all(path.parent().unwrap());
    }

    #[test]
    fn test_missing_session_file() {
        let path = temp_session_path("missing");
        let err = Session::load(&path).unwrap_err();
        assert!(matches!(err, LabtrackError::FileNotFound { .. }));
    }

    #[test]
    fn test_wrong_field_type_is_rejected() {
        let path = temp_session_path("bad_field");
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(
            &path,
            r#"{"version":1,"name":"x","saved_at":"2024-01-01T00:00:00Z","fields":{"marker_count":"two"}}"#,
        )
        .unwrap();

        let err = Session::load(&path).unwrap_err();
        assert!(matches!(err, LabtrackError::Model(_)));

        let _ = std::fs::remove_dir_all(path.parent().unwrap());
    }
}
