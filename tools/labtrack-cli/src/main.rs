//! LabTrack CLI: command-line interface for tagging, calibration, and analysis.
//!
//! Usage:
//!   labtrack init <SESSION>                 Create an empty session
//!   labtrack tag <SESSION> <RUN_ID> <X> <Y> Tag a marker
//!   labtrack remove <SESSION> <RUN_ID>      Remove a marker
//!   labtrack select <SESSION> [RUN_ID]      Select a marker (or clear)
//!   labtrack calibrate <SESSION> [OPTIONS]  Edit the calibration
//!   labtrack info <SESSION>                 Show session information
//!   labtrack derive <SESSION> [OPTIONS]     Print position, velocity or acceleration
//!   labtrack export <SESSION> [OPTIONS]     Export markers as delimited rows
//!   labtrack config [OPTIONS]               Show or edit default settings

use std::path::PathBuf;

use clap::{Parser, Subcommand};

mod commands;
mod session;
mod writer;

use commands::derive::{AxisArg, Quantity};
use labtrack_common::AppConfig;

#[derive(Parser)]
#[command(
    name = "labtrack",
    about = "Calibrated marker tracking and motion analysis",
    version,
    author
)]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create an empty session file
    Init {
        /// Path to the session file
        session: PathBuf,

        /// Session name (defaults to the file stem)
        #[arg(short, long)]
        name: Option<String>,

        /// Overwrite an existing session
        #[arg(long)]
        force: bool,
    },

    /// Tag a marker at a frame
    Tag {
        /// Path to the session file
        session: PathBuf,

        /// Frame or sample index
        #[arg(allow_negative_numbers = true)]
        run_id: i64,

        /// Raw x coordinate
        #[arg(allow_negative_numbers = true, value_parser = finite_f64)]
        x: f64,

        /// Raw y coordinate
        #[arg(allow_negative_numbers = true, value_parser = finite_f64)]
        y: f64,

        /// Move an existing marker instead of failing on a duplicate run id
        #[arg(long)]
        replace: bool,

        /// Select the tagged marker
        #[arg(long)]
        select: bool,
    },

    /// Remove the marker at a frame
    Remove {
        /// Path to the session file
        session: PathBuf,

        /// Frame or sample index
        #[arg(allow_negative_numbers = true)]
        run_id: i64,
    },

    /// Select the marker at a frame, or clear the selection
    Select {
        /// Path to the session file
        session: PathBuf,

        /// Frame or sample index; omit to clear
        #[arg(allow_negative_numbers = true)]
        run_id: Option<i64>,
    },

    /// Edit the raw-to-physical calibration
    Calibrate {
        /// Path to the session file
        session: PathBuf,

        /// Raw x coordinate of the physical origin
        #[arg(long, allow_negative_numbers = true, value_parser = finite_f64)]
        origin_x: Option<f64>,

        /// Raw y coordinate of the physical origin
        #[arg(long, allow_negative_numbers = true, value_parser = finite_f64)]
        origin_y: Option<f64>,

        /// Physical units per raw unit along x
        #[arg(long, allow_negative_numbers = true, value_parser = finite_f64)]
        scale_x: Option<f64>,

        /// Physical units per raw unit along y
        #[arg(long, allow_negative_numbers = true, value_parser = finite_f64)]
        scale_y: Option<f64>,

        /// Reset to the identity calibration before applying options
        #[arg(long)]
        reset: bool,
    },

    /// Show session information
    Info {
        /// Path to the session file
        session: PathBuf,
    },

    /// Print a position, velocity or acceleration table
    Derive {
        /// Path to the session file
        session: PathBuf,

        /// Quantity to compute
        #[arg(short, long, value_enum, default_value = "velocity")]
        quantity: Quantity,

        /// Coordinate axis
        #[arg(short, long, value_enum, default_value = "x")]
        axis: AxisArg,

        /// Frame rate used to turn run ids into times (defaults to config)
        #[arg(long, value_parser = finite_f64)]
        fps: Option<f64>,

        /// File of recorded sample times, one per line (overrides --fps)
        #[arg(long)]
        times: Option<PathBuf>,

        /// Decimal exponent of the recorded time unit (defaults to config)
        #[arg(long, allow_negative_numbers = true)]
        time_exponent: Option<i32>,

        /// Use raw instead of calibrated positions
        #[arg(long)]
        raw: bool,
    },

    /// Export markers as delimited rows
    Export {
        /// Path to the session file
        session: PathBuf,

        /// Output file path (defaults to stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Field delimiter (defaults to config)
        #[arg(short, long)]
        delimiter: Option<String>,

        /// Omit the header line
        #[arg(long)]
        no_header: bool,
    },

    /// Show or edit the default settings
    Config {
        /// Default frame rate (frames per second)
        #[arg(long, value_parser = finite_f64)]
        frame_rate: Option<f64>,

        /// Default decimal exponent of recorded time units
        #[arg(long, allow_negative_numbers = true)]
        time_exponent: Option<i32>,

        /// Default export delimiter
        #[arg(long)]
        delimiter: Option<String>,

        /// Default log level filter
        #[arg(long)]
        log_level: Option<String>,
    },
}

/// Parse a floating-point argument, rejecting `inf` and `NaN`.
fn finite_f64(value: &str) -> Result<f64, String> {
    let parsed: f64 = value
        .parse()
        .map_err(|e| format!("invalid number '{value}': {e}"))?;
    if parsed.is_finite() {
        Ok(parsed)
    } else {
        Err(format!("'{value}' is not a finite number"))
    }
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let (config, config_error) = AppConfig::load_or_default();

    // Initialize logging
    let mut logging = config.logging.clone();
    if cli.verbose {
        logging.level = "debug".to_string();
    }
    labtrack_common::logging::init_logging(&logging);
    if let Some(e) = &config_error {
        tracing::warn!("{e}; using default settings");
    }

    match cli.command {
        Commands::Init {
            session,
            name,
            force,
        } => commands::init::run(session, name, force),
        Commands::Tag {
            session,
            run_id,
            x,
            y,
            replace,
            select,
        } => commands::tag::run(session, run_id, x, y, replace, select),
        Commands::Remove { session, run_id } => commands::remove::run(session, run_id),
        Commands::Select { session, run_id } => commands::select::run(session, run_id),
        Commands::Calibrate {
            session,
            origin_x,
            origin_y,
            scale_x,
            scale_y,
            reset,
        } => commands::calibrate::run(
            session,
            commands::calibrate::CalibrationEdit {
                origin_x,
                origin_y,
                scale_x,
                scale_y,
                reset,
            },
        ),
        Commands::Info { session } => commands::info::run(session),
        Commands::Derive {
            session,
            quantity,
            axis,
            fps,
            times,
            time_exponent,
            raw,
        } => commands::derive::run(
            session,
            commands::derive::DeriveOptions {
                quantity,
                axis,
                frame_rate: fps.unwrap_or(config.analysis.frame_rate),
                times,
                time_exponent: time_exponent.unwrap_or(config.analysis.time_unit_exponent),
                raw,
                delimiter: writer::parse_delimiter(&config.analysis.delimiter)?,
            },
        ),
        Commands::Export {
            session,
            output,
            delimiter,
            no_header,
        } => commands::export::run(
            session,
            output,
            writer::parse_delimiter(
                delimiter
                    .as_deref()
                    .unwrap_or(config.analysis.delimiter.as_str()),
            )?,
            !no_header,
        ),
        Commands::Config {
            frame_rate,
            time_exponent,
            delimiter,
            log_level,
        } => commands::config::run(
            &labtrack_common::config_file_path(),
            commands::config::ConfigEdit {
                frame_rate,
                time_exponent,
                delimiter,
                log_level,
            },
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_non_finite_arguments_are_rejected() {
        assert_eq!(finite_f64("-2.5"), Ok(-2.5));
        assert!(finite_f64("inf").is_err());
        assert!(finite_f64("NaN").is_err());

        assert!(Cli::try_parse_from(["labtrack", "tag", "s.json", "1", "inf", "2"]).is_err());
        assert!(
            Cli::try_parse_from(["labtrack", "calibrate", "s.json", "--scale-x", "nan"]).is_err()
        );
        assert!(Cli::try_parse_from(["labtrack", "tag", "s.json", "1", "-3", "2"]).is_ok());
    }
}
