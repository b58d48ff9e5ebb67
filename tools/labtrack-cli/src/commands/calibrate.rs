//! Edit a session's calibration.

use std::path::PathBuf;

use labtrack_marker_model::{CalibrationParams, Point2D};

use crate::session::Session;

/// Requested calibration changes. Unset fields keep their current value.
#[derive(Debug, Clone, Default)]
pub struct CalibrationEdit {
    pub origin_x: Option<f64>,
    pub origin_y: Option<f64>,
    pub scale_x: Option<f64>,
    pub scale_y: Option<f64>,
    pub reset: bool,
}

impl CalibrationEdit {
    pub fn is_empty(&self) -> bool {
        !self.reset
            && self.origin_x.is_none()
            && self.origin_y.is_none()
            && self.scale_x.is_none()
            && self.scale_y.is_none()
    }

    /// Apply the edit on top of `current`.
    pub fn apply(&self, current: CalibrationParams) -> CalibrationParams {
        let base = if self.reset {
            CalibrationParams::IDENTITY
        } else {
            current
        };
        CalibrationParams::new(
            Point2D::new(
                self.origin_x.unwrap_or(base.origin.x),
                self.origin_y.unwrap_or(base.origin.y),
            ),
            self.scale_x.unwrap_or(base.scale_x),
            self.scale_y.unwrap_or(base.scale_y),
        )
    }
}

pub fn run(path: PathBuf, edit: CalibrationEdit) -> anyhow::Result<()> {
    let mut session =
        Session::load(&path).map_err(|e| anyhow::anyhow!("Failed to load session: {e}"))?;
    let calibration = session.calibration();

    if !edit.is_empty() {
        let params = edit.apply(calibration.params());
        if params.scale_x == 0.0 || params.scale_y == 0.0 {
            tracing::warn!("Calibration has a zero scale; physical positions cannot be inverted");
        }
        calibration.set_params(params);
        tracing::info!(?params, "Calibration updated");
    }

    let params = calibration.params();
    println!("Calibration:");
    println!("  Origin: ({}, {})", params.origin.x, params.origin.y);
    println!("  Scale: ({}, {})", params.scale_x, params.scale_y);

    if !edit.is_empty() {
        session
            .save()
            .map_err(|e| anyhow::anyhow!("Failed to save session: {e}"))?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_edit_keeps_other_fields() {
        let current = CalibrationParams::new(Point2D::new(1.0, 2.0), 3.0, 4.0);
        let edit = CalibrationEdit {
            scale_y: Some(-1.0),
            ..Default::default()
        };
        assert_eq!(
            edit.apply(current),
            CalibrationParams::new(Point2D::new(1.0, 2.0), 3.0, -1.0)
        );
    }

    #[test]
    fn test_reset_starts_from_identity() {
        let current = CalibrationParams::new(Point2D::new(1.0, 2.0), 3.0, 4.0);
        let edit = CalibrationEdit {
            origin_x: Some(10.0),
            reset: true,
            ..Default::default()
        };
        assert_eq!(
            edit.apply(current),
            CalibrationParams::new(Point2D::new(10.0, 0.0), 1.0, 1.0)
        );
        assert!(CalibrationEdit::default().is_empty());
    }
}
