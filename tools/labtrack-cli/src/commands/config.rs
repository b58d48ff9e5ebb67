//! Show or edit the default settings.

use std::path::Path;

use labtrack_common::AppConfig;

use crate::writer::parse_delimiter;

/// Requested settings changes. Unset fields keep their current value.
#[derive(Debug, Clone, Default)]
pub struct ConfigEdit {
    pub frame_rate: Option<f64>,
    pub time_exponent: Option<i32>,
    pub delimiter: Option<String>,
    pub log_level: Option<String>,
}

impl ConfigEdit {
    pub fn is_empty(&self) -> bool {
        self.frame_rate.is_none()
            && self.time_exponent.is_none()
            && self.delimiter.is_none()
            && self.log_level.is_none()
    }

    /// Validate and apply the edit on top of `config`.
    pub fn apply(&self, config: &mut AppConfig) -> anyhow::Result<()> {
        if let Some(frame_rate) = self.frame_rate {
            if !frame_rate.is_finite() || frame_rate <= 0.0 {
                anyhow::bail!("Frame rate must be positive, got {frame_rate}");
            }
            config.analysis.frame_rate = frame_rate;
        }
        if let Some(exponent) = self.time_exponent {
            config.analysis.time_unit_exponent = exponent;
        }
        if let Some(delimiter) = &self.delimiter {
            parse_delimiter(delimiter)?;
            config.analysis.delimiter = delimiter.clone();
        }
        if let Some(level) = &self.log_level {
            config.logging.level = level.clone();
        }
        Ok(())
    }
}

pub fn run(path: &Path, edit: ConfigEdit) -> anyhow::Result<()> {
    let mut config = AppConfig::load_from(path)?;

    if !edit.is_empty() {
        edit.apply(&mut config)?;
        config.save_to(path)?;
        tracing::info!(path = %path.display(), "Config saved");
    }

    println!("Config: {}", path.display());
    println!("  Frame rate: {} fps", config.analysis.frame_rate);
    println!(
        "  Time unit exponent: {}",
        config.analysis.time_unit_exponent
    );
    println!("  Delimiter: {:?}", config.analysis.delimiter);
    println!("  Log level: {}", config.logging.level);
    Ok(())
}
