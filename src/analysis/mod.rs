//! Analysis module for acceleration enrichment detection.
//!
//! The algorithms here are pure functions over slices; the [`Analyzer`]
//! trait binds them to a loaded [`Log`] by resolving channel names and
//! validating parameters before any computation runs.
//!
//! - [`derivative`] - rate of change over irregular timestamps
//! - [`events`] - threshold/interval/duration event detection
//! - [`ae`] - the AE analyzer tying column selection to the detector

pub mod ae;
pub mod derivative;
pub mod events;

use crate::parsers::types::Log;
use std::time::Instant;
use thiserror::Error;

/// Errors that can occur during analysis
#[derive(Debug, Clone, PartialEq, Error)]
pub enum AnalysisError {
    /// A selected channel is not present in the log
    #[error("Missing required channel: {0}")]
    MissingChannel(String),
    /// Detection was requested without choosing the required columns
    #[error("No column selected for: {}", .0.join(", "))]
    MissingSelection(Vec<String>),
    /// Not enough data points for the analysis
    #[error("Insufficient data: need {needed} points, got {got}")]
    InsufficientData { needed: usize, got: usize },
    /// Invalid parameter configuration
    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),
    /// General computation error
    #[error("Computation error: {0}")]
    ComputationError(String),
}

/// Metadata about analysis results for display
#[derive(Clone, Debug, Default, serde::Serialize)]
pub struct AnalysisMetadata {
    /// Name of the algorithm used
    pub algorithm: String,
    /// Key parameters and their values
    pub parameters: Vec<(String, String)>,
    /// Warning messages about the analysis
    pub warnings: Vec<String>,
    /// Time taken for computation in milliseconds
    pub computation_time_ms: u64,
}

/// A derived channel produced by an analysis
#[derive(Clone, Debug, serde::Serialize)]
pub struct AnalysisResult {
    /// Name for the result (used as channel name)
    pub name: String,
    /// Unit for the result values
    pub unit: String,
    /// The computed values (one per timestamp)
    pub values: Vec<f64>,
    /// Metadata about the analysis
    pub metadata: AnalysisMetadata,
}

impl AnalysisResult {
    /// Create a new analysis result
    pub fn new(name: impl Into<String>, unit: impl Into<String>, values: Vec<f64>) -> Self {
        Self {
            name: name.into(),
            unit: unit.into(),
            values,
            metadata: AnalysisMetadata::default(),
        }
    }

    /// Add metadata to the result
    pub fn with_metadata(mut self, metadata: AnalysisMetadata) -> Self {
        self.metadata = metadata;
        self
    }

    /// Check if the analysis produced any warnings
    pub fn has_warnings(&self) -> bool {
        !self.metadata.warnings.is_empty()
    }
}

/// Core trait for analysis algorithms run against a loaded log
pub trait Analyzer {
    type Output;

    /// Unique identifier for this analyzer
    fn id(&self) -> &str;

    /// Human-readable algorithm name
    fn name(&self) -> &str;

    fn description(&self) -> &str;

    /// Channel names the analysis cannot run without
    fn required_channels(&self) -> Vec<&str>;

    /// Execute analysis on log data
    fn analyze(&self, log: &Log) -> Result<Self::Output, AnalysisError>;
}

/// Helper trait for accessing log data by channel name
pub trait LogDataAccess {
    /// Get channel values by name (case-insensitive)
    fn get_channel_values(&self, name: &str) -> Option<Vec<f64>>;

    /// Check if a channel exists
    fn has_channel(&self, name: &str) -> bool;
}

impl LogDataAccess for Log {
    fn get_channel_values(&self, name: &str) -> Option<Vec<f64>> {
        let channel_idx = self
            .channels
            .iter()
            .position(|c| c.name().eq_ignore_ascii_case(name))?;
        Some(self.get_channel_data(channel_idx))
    }

    fn has_channel(&self, name: &str) -> bool {
        self.channels
            .iter()
            .any(|c| c.name().eq_ignore_ascii_case(name))
    }
}

/// Helper function to measure analysis execution time
pub fn timed_analyze<F, T>(f: F) -> (T, u64)
where
    F: FnOnce() -> T,
{
    let start = Instant::now();
    let result = f();
    let elapsed = start.elapsed().as_millis() as u64;
    (result, elapsed)
}

/// Helper to get a required channel or return an error
pub fn require_channel(log: &Log, name: &str) -> Result<Vec<f64>, AnalysisError> {
    log.get_channel_values(name)
        .ok_or_else(|| AnalysisError::MissingChannel(name.to_string()))
}

/// Helper to check minimum data length
pub fn require_min_length(data: &[f64], min_len: usize) -> Result<(), AnalysisError> {
    if data.len() < min_len {
        Err(AnalysisError::InsufficientData {
            needed: min_len,
            got: data.len(),
        })
    } else {
        Ok(())
    }
}
