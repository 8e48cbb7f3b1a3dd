//! Presentation data for detected events.
//!
//! Nothing here influences detection; it slices the log around each event
//! and formats results for the terminal or JSON output.

use serde::Serialize;

use crate::analysis::ae::AeAnalysis;
use crate::analysis::events::AeEvent;
use crate::analysis::{require_channel, AnalysisError};
use crate::columns::ColumnRole;
use crate::parsers::types::Log;

/// Stoichiometric air-fuel ratio for gasoline, used as a reference line
pub const STOICH_AFR: f64 = 14.7;

/// Log data over one event's display window
#[derive(Clone, Debug, Serialize)]
pub struct EventWindow {
    pub times: Vec<f64>,
    pub rpm: Option<Vec<f64>>,
    pub tps: Vec<f64>,
    pub tps_dot: Vec<f64>,
    pub pulsewidth: Option<Vec<f64>>,
    pub afr: Option<Vec<f64>>,
    /// Time span to highlight as the event itself
    pub event_time_start: f64,
    pub event_time_end: f64,
    pub tps_dot_threshold: f64,
}

impl EventWindow {
    /// Slice the selected channels of `log` over the event's display window
    pub fn extract(log: &Log, analysis: &AeAnalysis, event: &AeEvent) -> Result<Self, AnalysisError> {
        let columns = &analysis.config.columns;
        let required = |role: ColumnRole| {
            columns
                .get(role)
                .ok_or_else(|| AnalysisError::MissingSelection(vec![role.as_ref().to_string()]))
                .and_then(|name| require_channel(log, name))
        };
        let times = required(ColumnRole::Time)?;
        let tps = required(ColumnRole::Tps)?;

        let window = event.window();
        if window.end > times.len() || event.event_end >= times.len() {
            return Err(AnalysisError::ComputationError(format!(
                "Event window {:?} is outside the {} loaded samples",
                window,
                times.len()
            )));
        }

        // Optional channels: skipped when unselected or absent
        let optional = |role: ColumnRole| {
            columns
                .get(role)
                .and_then(|name| require_channel(log, name).ok())
                .map(|values| values[window.clone()].to_vec())
        };

        Ok(Self {
            times: times[window.clone()].to_vec(),
            rpm: optional(ColumnRole::Rpm),
            tps: tps[window.clone()].to_vec(),
            tps_dot: analysis.tps_dot.values[window.clone()].to_vec(),
            pulsewidth: optional(ColumnRole::PulseWidth),
            afr: optional(ColumnRole::Afr),
            event_time_start: times[event.event_start],
            event_time_end: times[event.event_end],
            tps_dot_threshold: analysis.config.params.tps_dot_threshold,
        })
    }

    pub fn len(&self) -> usize {
        self.times.len()
    }

    pub fn is_empty(&self) -> bool {
        self.times.is_empty()
    }

    /// Whether a sample time falls inside the highlighted event span
    pub fn is_highlighted(&self, time: f64) -> bool {
        time >= self.event_time_start && time <= self.event_time_end
    }

    /// Render the window as a tab-separated table
    pub fn to_table(&self) -> String {
        let cell = |series: &Option<Vec<f64>>, i: usize| {
            series
                .as_ref()
                .map(|v| format!("{:.2}", v[i]))
                .unwrap_or_else(|| "-".to_string())
        };

        let mut out = String::from("  Time\tRPM\tTPS\tTPS_dot\tPW\tAFR\tAFR-stoich\n");
        for i in 0..self.len() {
            let afr_delta = self
                .afr
                .as_ref()
                .map(|v| format!("{:+.2}", v[i] - STOICH_AFR))
                .unwrap_or_else(|| "-".to_string());
            out.push_str(&format!(
                "{} {:.3}\t{}\t{:.1}\t{:.1}\t{}\t{}\t{}\n",
                if self.is_highlighted(self.times[i]) { '*' } else { ' ' },
                self.times[i],
                cell(&self.rpm, i),
                self.tps[i],
                self.tps_dot[i],
                cell(&self.pulsewidth, i),
                cell(&self.afr, i),
                afr_delta
            ));
        }
        out
    }
}

/// Previous/next navigation over an event list, wrapping at both ends
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct EventCursor {
    index: usize,
    len: usize,
}

impl EventCursor {
    pub fn new(len: usize) -> Self {
        Self { index: 0, len }
    }

    /// Current event index, `None` when there are no events
    pub fn current(&self) -> Option<usize> {
        (self.len > 0).then_some(self.index)
    }

    /// Jump to `index`; out-of-range indices leave the cursor unchanged
    pub fn seek(&mut self, index: usize) -> Option<usize> {
        if index >= self.len {
            return None;
        }
        self.index = index;
        self.current()
    }

    pub fn next_event(&mut self) -> Option<usize> {
        if self.len > 0 {
            self.index = (self.index + 1) % self.len;
        }
        self.current()
    }

    pub fn previous_event(&mut self) -> Option<usize> {
        if self.len > 0 {
            self.index = (self.index + self.len - 1) % self.len;
        }
        self.current()
    }
}

/// One-line title for an event
pub fn event_title(index: usize, total: usize, event: &AeEvent) -> String {
    format!(
        "AE Event {} of {} - Duration: {:.2}s, Max TPS Rate: {:.1} %/s",
        index + 1,
        total,
        event.duration,
        event.max_rate
    )
}

/// Summary line for a whole detection run
pub fn detection_summary(analysis: &AeAnalysis) -> String {
    if analysis.has_events() {
        format!("Found {} AE events", analysis.events.len())
    } else {
        "No acceleration enrichment events detected. \
         Try adjusting the threshold parameters."
            .to_string()
    }
}

/// Machine-readable report for one analyzed file
#[derive(Clone, Debug, Serialize)]
pub struct FileReport {
    pub file: String,
    pub format: String,
    pub rows: usize,
    pub channels: Vec<String>,
    #[serde(flatten)]
    pub analysis: AeAnalysis,
}
