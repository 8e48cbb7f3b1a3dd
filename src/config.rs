//! Detection configuration.
//!
//! Everything a detection run depends on lives in one value object, so the
//! same inputs always give the same events.

use serde::{Deserialize, Serialize};

use crate::analysis::AnalysisError;
use crate::columns::ColumnSelection;

/// Default TPS rate threshold in %/s
pub const DEFAULT_TPS_DOT_THRESHOLD: f64 = 10.0;
/// Default minimum event duration in seconds
pub const DEFAULT_DURATION_THRESHOLD: f64 = 0.1;
/// Default number of samples shown either side of an event
pub const DEFAULT_CONTEXT_SAMPLES: usize = 50;

/// Thresholds for AE event detection
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DetectionParams {
    /// Rate (signal units per second) the derived channel must exceed
    pub tps_dot_threshold: f64,
    /// Minimum event length in seconds
    pub duration_threshold: f64,
    /// Padding, in samples, of the display window around each event
    pub context_samples: usize,
}

impl Default for DetectionParams {
    fn default() -> Self {
        Self {
            tps_dot_threshold: DEFAULT_TPS_DOT_THRESHOLD,
            duration_threshold: DEFAULT_DURATION_THRESHOLD,
            context_samples: DEFAULT_CONTEXT_SAMPLES,
        }
    }
}

impl DetectionParams {
    pub fn validate(&self) -> Result<(), AnalysisError> {
        if !self.tps_dot_threshold.is_finite() {
            return Err(AnalysisError::InvalidParameter(format!(
                "TPS rate threshold must be a finite number, got {}",
                self.tps_dot_threshold
            )));
        }
        if !self.duration_threshold.is_finite() || self.duration_threshold < 0.0 {
            return Err(AnalysisError::InvalidParameter(format!(
                "Duration threshold must be zero or positive, got {}",
                self.duration_threshold
            )));
        }
        Ok(())
    }
}

/// Column choices plus thresholds for one detection run
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct DetectionConfig {
    pub columns: ColumnSelection,
    pub params: DetectionParams,
}

impl DetectionConfig {
    pub fn new(columns: ColumnSelection, params: DetectionParams) -> Self {
        Self { columns, params }
    }

    /// Auto-match columns by name, then apply explicit overrides
    pub fn for_columns<S: AsRef<str>>(
        column_names: &[S],
        overrides: &ColumnSelection,
        params: DetectionParams,
    ) -> Self {
        Self {
            columns: ColumnSelection::auto_select(column_names).with_overrides(overrides),
            params,
        }
    }
}
