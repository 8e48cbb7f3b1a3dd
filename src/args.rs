use clap::Parser;
use std::path::PathBuf;

use crate::columns::ColumnSelection;
use crate::config::DetectionParams;

#[derive(Parser, Debug)]
#[command(name = env!("CARGO_PKG_NAME"))]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Find acceleration enrichment events in ECU datalogs.")]
#[command(allow_negative_numbers = true)]
pub struct Cli {
    /// Datalogs to analyze (.csv, .msl, .mlg)
    #[arg(required = true)]
    pub files: Vec<PathBuf>,

    /// TPS rate threshold in %/s
    #[arg(long)]
    pub tps_dot_threshold: Option<f64>,
    /// Minimum event duration in seconds
    #[arg(long)]
    pub duration_threshold: Option<f64>,
    /// Samples shown either side of an event
    #[arg(long)]
    pub context_samples: Option<usize>,

    #[arg(long, value_name = "COLUMN")]
    pub time_col: Option<String>,
    #[arg(long, value_name = "COLUMN")]
    pub rpm_col: Option<String>,
    #[arg(long, value_name = "COLUMN")]
    pub tps_col: Option<String>,
    #[arg(long, value_name = "COLUMN")]
    pub pw_col: Option<String>,
    #[arg(long, value_name = "COLUMN")]
    pub afr_col: Option<String>,

    /// Print a JSON report instead of text
    #[arg(long)]
    pub json: bool,
    /// Print the samples around event N (1-based)
    #[arg(long, value_name = "N")]
    pub show_event: Option<usize>,
    /// Remember the effective thresholds for later runs
    #[arg(long)]
    pub save_settings: bool,
    /// Enable debug logging
    #[arg(short, long)]
    pub verbose: bool,
}

impl Cli {
    /// Apply any threshold flags on top of `base`
    pub fn detection_params(&self, base: DetectionParams) -> DetectionParams {
        DetectionParams {
            tps_dot_threshold: self.tps_dot_threshold.unwrap_or(base.tps_dot_threshold),
            duration_threshold: self.duration_threshold.unwrap_or(base.duration_threshold),
            context_samples: self.context_samples.unwrap_or(base.context_samples),
        }
    }

    /// Explicit column choices; unset roles are auto-matched
    pub fn column_overrides(&self) -> ColumnSelection {
        ColumnSelection {
            time: self.time_col.clone(),
            rpm: self.rpm_col.clone(),
            tps: self.tps_col.clone(),
            pulsewidth: self.pw_col.clone(),
            afr: self.afr_col.clone(),
        }
    }
}
