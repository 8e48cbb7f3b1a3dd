//! Acceleration enrichment analyzer.
//!
//! Binds a [`DetectionConfig`] to a loaded log: resolves the selected time and
//! throttle columns, validates the thresholds, runs the [`EventDetector`] and
//! reports the `TPS_dot` channel alongside the events.

use serde::Serialize;

use super::derivative::{backward_steps, duplicate_timestamps, MIN_DT};
use super::events::{AeEvent, EventDetector};
use super::*;
use crate::columns::ColumnRole;
use crate::config::DetectionConfig;

/// Name of the derived throttle rate channel
pub const TPS_DOT_CHANNEL: &str = "TPS_dot";

/// Everything one AE detection run produces
#[derive(Clone, Debug, Serialize)]
pub struct AeAnalysis {
    pub config: DetectionConfig,
    pub events: Vec<AeEvent>,
    /// The `TPS_dot` channel, aligned with the log rows
    pub tps_dot: AnalysisResult,
    pub row_count: usize,
}

impl AeAnalysis {
    pub fn has_events(&self) -> bool {
        !self.events.is_empty()
    }
}

/// Detects AE events from the selected throttle channel
#[derive(Clone, Debug, Default)]
pub struct AccelEnrichmentAnalyzer {
    pub config: DetectionConfig,
}

impl AccelEnrichmentAnalyzer {
    pub fn new(config: DetectionConfig) -> Self {
        Self { config }
    }

    /// Fail before any computation if the time or throttle column is unset
    fn check_selection(&self) -> Result<(&str, &str), AnalysisError> {
        let columns = &self.config.columns;
        match (columns.get(ColumnRole::Time), columns.get(ColumnRole::Tps)) {
            (Some(time), Some(tps)) => Ok((time, tps)),
            _ => Err(AnalysisError::MissingSelection(
                columns
                    .missing_required()
                    .iter()
                    .map(|r| r.as_ref().to_string())
                    .collect(),
            )),
        }
    }
}

impl Analyzer for AccelEnrichmentAnalyzer {
    type Output = AeAnalysis;

    fn id(&self) -> &str {
        "accel_enrichment"
    }

    fn name(&self) -> &str {
        "Acceleration Enrichment Events"
    }

    fn description(&self) -> &str {
        "Finds periods where the throttle opens faster than the rate threshold \
         for at least the minimum duration, the conditions under which the ECU \
         adds acceleration enrichment fuel."
    }

    fn required_channels(&self) -> Vec<&str> {
        [ColumnRole::Time, ColumnRole::Tps]
            .iter()
            .filter_map(|r| self.config.columns.get(*r))
            .collect()
    }

    fn analyze(&self, log: &Log) -> Result<AeAnalysis, AnalysisError> {
        let (time_col, tps_col) = self.check_selection()?;
        let params = self.config.params;
        params.validate()?;

        let times = require_channel(log, time_col)?;
        let tps = require_channel(log, tps_col)?;
        if times.len() != tps.len() {
            return Err(AnalysisError::ComputationError(
                "Time and TPS channels have different lengths".to_string(),
            ));
        }

        let detector = EventDetector::new(params);
        let (detection, computation_time) = timed_analyze(|| detector.detect(&times, &tps));

        let mut warnings = vec![];
        if let Err(e) = require_min_length(&times, 2) {
            warnings.push(format!("{}; no rate can be computed", e));
        }
        let duplicates = duplicate_timestamps(&times);
        if duplicates > 0 {
            warnings.push(format!(
                "{} duplicate timestamps; their time step was floored to {} s",
                duplicates, MIN_DT
            ));
        }
        let backwards = backward_steps(&times);
        if backwards > 0 {
            warnings.push(format!("Time column goes backwards {} time(s)", backwards));
        }
        for warning in &warnings {
            tracing::warn!("{}", warning);
        }

        tracing::info!(
            "Detected {} AE events over {} samples (threshold {} %/s, min duration {} s)",
            detection.events.len(),
            times.len(),
            params.tps_dot_threshold,
            params.duration_threshold
        );

        let tps_dot = AnalysisResult::new(TPS_DOT_CHANNEL, "%/s", detection.rate).with_metadata(
            AnalysisMetadata {
                algorithm: "Backward difference".to_string(),
                parameters: vec![
                    ("time_channel".to_string(), time_col.to_string()),
                    ("tps_channel".to_string(), tps_col.to_string()),
                    (
                        "tps_dot_threshold".to_string(),
                        format!("{:.2}", params.tps_dot_threshold),
                    ),
                    (
                        "duration_threshold".to_string(),
                        format!("{:.3}", params.duration_threshold),
                    ),
                    ("event_count".to_string(), detection.events.len().to_string()),
                ],
                warnings,
                computation_time_ms: computation_time,
            },
        );

        Ok(AeAnalysis {
            config: self.config.clone(),
            events: detection.events,
            tps_dot,
            row_count: times.len(),
        })
    }
}
