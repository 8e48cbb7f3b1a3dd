//! Rate-threshold event detection.
//!
//! Pipeline: derivative → exceeds-threshold mask → interval extraction →
//! duration filter → display window. Each stage is a pure function so the
//! detector can be re-run with new thresholds at any time.

use serde::Serialize;

use super::derivative::rate_of_change;
use crate::config::DetectionParams;

/// A detected acceleration enrichment event.
///
/// `event_start..event_end` is the half-open sample range where the rate
/// exceeded the threshold. An event still open at the end of the data is
/// closed at the last sample index instead.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct AeEvent {
    /// First sample of the display window
    pub start_idx: usize,
    /// One past the last sample of the display window
    pub end_idx: usize,
    pub event_start: usize,
    pub event_end: usize,
    /// `time[event_end] - time[event_start]` in seconds
    pub duration: f64,
    /// Peak rate over `event_start..event_end`
    pub max_rate: f64,
}

impl AeEvent {
    /// Number of samples inside the event range
    pub fn sample_count(&self) -> usize {
        self.event_end - self.event_start
    }

    /// Range of samples to show for this event
    pub fn window(&self) -> std::ops::Range<usize> {
        self.start_idx..self.end_idx
    }
}

/// Output of one detection pass
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct Detection {
    /// Derived rate channel, aligned with the input samples
    pub rate: Vec<f64>,
    /// Events ordered by start index, non-overlapping
    pub events: Vec<AeEvent>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum ScanState {
    Outside,
    Inside { start: usize },
}

/// Extract candidate intervals from an exceeds-threshold mask.
///
/// Intervals are `(start, end)` with `end` exclusive, except for a run that
/// reaches the end of the mask: that one closes at `mask.len() - 1`.
pub fn extract_intervals(mask: &[bool]) -> Vec<(usize, usize)> {
    let mut intervals = Vec::new();
    let mut state = ScanState::Outside;

    for (i, &exceeds) in mask.iter().enumerate() {
        state = match (state, exceeds) {
            (ScanState::Outside, true) => ScanState::Inside { start: i },
            (ScanState::Inside { start }, false) => {
                intervals.push((start, i));
                ScanState::Outside
            }
            (state, _) => state,
        };
    }

    if let ScanState::Inside { start } = state {
        intervals.push((start, mask.len() - 1));
    }

    intervals
}

/// Stateless AE event detector
#[derive(Clone, Copy, Debug, Default)]
pub struct EventDetector {
    params: DetectionParams,
}

impl EventDetector {
    pub fn new(params: DetectionParams) -> Self {
        Self { params }
    }

    pub fn params(&self) -> &DetectionParams {
        &self.params
    }

    /// Run the full pipeline over a time column and a signal column.
    ///
    /// With fewer than two samples no difference is defined and the event
    /// list is empty; the rate channel is still returned.
    pub fn detect(&self, times: &[f64], signal: &[f64]) -> Detection {
        let rate = rate_of_change(times, signal);
        if rate.len() < 2 {
            return Detection {
                rate,
                events: Vec::new(),
            };
        }

        let mask: Vec<bool> = rate
            .iter()
            .map(|r| *r > self.params.tps_dot_threshold)
            .collect();

        let events = extract_intervals(&mask)
            .into_iter()
            .filter_map(|(start, end)| self.qualify(times, &rate, start, end))
            .collect();

        Detection { rate, events }
    }

    /// Apply the duration filter and attach metrics to one candidate interval
    fn qualify(&self, times: &[f64], rate: &[f64], start: usize, end: usize) -> Option<AeEvent> {
        // A run opening on the very last sample closes onto itself
        if end <= start {
            return None;
        }

        let duration = times[end] - times[start];
        // Written so a NaN duration is rejected too
        if !(duration >= self.params.duration_threshold) {
            return None;
        }

        let max_rate = rate[start..end]
            .iter()
            .copied()
            .fold(f64::NEG_INFINITY, f64::max);

        let context = self.params.context_samples;
        Some(AeEvent {
            start_idx: start.saturating_sub(context),
            end_idx: end.saturating_add(context).min(rate.len()),
            event_start: start,
            event_end: end,
            duration,
            max_rate,
        })
    }
}

/// Convenience wrapper around [`EventDetector::detect`]
pub fn detect_ae_events(times: &[f64], signal: &[f64], params: &DetectionParams) -> Detection {
    EventDetector::new(*params).detect(times, signal)
}
