//! Common test utilities shared across all test modules
//!
//! This module provides synthetic log generators, temporary file helpers,
//! and assertions shared by the test suites.

use std::path::PathBuf;

/// Path in the system temp directory unique to this test process
pub fn temp_path(name: &str) -> PathBuf {
    std::env::temp_dir().join(format!("ae-analyzer-{}-{}", std::process::id(), name))
}

/// Write `contents` to a temp file and return its path
pub fn write_temp_file(name: &str, contents: &[u8]) -> PathBuf {
    let path = temp_path(name);
    std::fs::write(&path, contents)
        .unwrap_or_else(|e| panic!("Failed to write temp file {:?}: {}", path, e));
    path
}

/// Test data generators for synthetic tests
pub mod synthetic {
    /// A throttle opening: starts after sample `start`, rises by `rise`
    /// percent evenly over `ramp` samples, then holds
    #[derive(Clone, Copy, Debug)]
    pub struct Stab {
        pub start: usize,
        pub ramp: usize,
        pub rise: f64,
    }

    /// Create a time array with uniform spacing
    pub fn uniform_times(count: usize, interval: f64) -> Vec<f64> {
        (0..count).map(|i| i as f64 * interval).collect()
    }

    /// Throttle trace at `idle` with the given stabs stacked on top
    pub fn throttle_trace(count: usize, idle: f64, stabs: &[Stab]) -> Vec<f64> {
        (0..count)
            .map(|i| {
                idle + stabs
                    .iter()
                    .map(|s| {
                        let progress = i.saturating_sub(s.start) as f64 / s.ramp as f64;
                        s.rise * progress.min(1.0)
                    })
                    .sum::<f64>()
            })
            .collect()
    }

    /// Rows of Time, RPM, TPS, PW, AFR for a throttle trace
    pub fn engine_rows(times: &[f64], tps: &[f64]) -> Vec<[f64; 5]> {
        times
            .iter()
            .zip(tps)
            .map(|(t, tps)| [*t, 900.0 + tps * 40.0, *tps, 2.0 + tps * 0.05, 14.7 - tps * 0.02])
            .collect()
    }

    /// CSV text with a units row
    pub fn engine_csv(times: &[f64], tps: &[f64], delimiter: char) -> String {
        let d = delimiter.to_string();
        let mut out = ["Time", "RPM", "TPS", "PW", "AFR"].join(&d);
        out.push('\n');
        out.push_str(&["s", "rpm", "%", "ms", "AFR"].join(&d));
        out.push('\n');
        for row in engine_rows(times, tps) {
            let cells: Vec<String> = row.iter().map(|v| format!("{:.4}", v)).collect();
            out.push_str(&cells.join(&d));
            out.push('\n');
        }
        out
    }

    /// TunerStudio-style tab-separated MSL text
    pub fn engine_msl(times: &[f64], tps: &[f64]) -> String {
        let mut out = String::from(
            "\"MS3 Format 0568.11E\"\n\"Capture Date: Sat Mar 02 14:12:00 2024\"\n\
             Time\tRPM\tTPS\tPW\tAFR\ns\tRPM\t%\tms\tAFR\n",
        );
        for row in engine_rows(times, tps) {
            let cells: Vec<String> = row.iter().map(|v| format!("{:.4}", v)).collect();
            out.push_str(&cells.join("\t"));
            out.push('\n');
        }
        out
    }
}

/// Common assertions for logs and detection results
pub mod assertions {
    use ae_analyzer::analysis::events::AeEvent;
    use ae_analyzer::config::DetectionParams;
    use ae_analyzer::parsers::Log;

    /// Assert that a log is rectangular and has a time axis per row
    pub fn assert_valid_log_structure(log: &Log) {
        assert!(!log.channels.is_empty(), "Log should have channels");
        assert_eq!(
            log.times.len(),
            log.data.len(),
            "Time axis length should match record count"
        );
        for (i, row) in log.data.iter().enumerate() {
            assert_eq!(
                row.len(),
                log.channels.len(),
                "Record {} width should match channel count",
                i
            );
        }
    }

    /// Assert the invariants every detected event list must hold
    pub fn assert_events_valid(events: &[AeEvent], n: usize, params: &DetectionParams) {
        for event in events {
            assert!(event.start_idx <= event.event_start, "{:?}", event);
            assert!(event.event_start < event.event_end, "{:?}", event);
            assert!(event.event_end < n, "{:?}", event);
            assert!(event.end_idx <= n, "{:?}", event);
            assert!(event.end_idx >= event.event_end, "{:?}", event);
            assert!(event.duration >= params.duration_threshold, "{:?}", event);
            assert!(event.max_rate > params.tps_dot_threshold, "{:?}", event);
        }
        for pair in events.windows(2) {
            assert!(
                pair[0].event_end <= pair[1].event_start,
                "Events should be ordered and disjoint: {:?}",
                pair
            );
        }
    }
}

/// Float comparison helpers for testing
pub mod float_cmp {
    /// Check if two floats are approximately equal within a tolerance
    pub fn approx_eq(a: f64, b: f64, tolerance: f64) -> bool {
        (a - b).abs() < tolerance
    }

    /// Assert that two floats are approximately equal
    pub fn assert_approx_eq(a: f64, b: f64, tolerance: f64) {
        assert!(
            approx_eq(a, b, tolerance),
            "Values not approximately equal: {} vs {} (tolerance: {})",
            a,
            b,
            tolerance
        );
    }
}

/// Minimal MegaLogViewer binary fixtures
pub mod mlg {
    /// Build a v1 MLG file with u16 fields `(name, unit, scale)` and one
    /// data block per `(timestamp ms, values)` record
    pub fn build(fields: &[(&str, &str, f32)], records: &[(u16, Vec<u16>)]) -> Vec<u8> {
        const HEADER_LEN: usize = 22;
        const FIELD_LEN: usize = 55;
        let info = b"\"Capture Date: Sun Jun 09 2024\"\0";
        let info_start = HEADER_LEN + fields.len() * FIELD_LEN;
        let data_start = info_start + info.len();

        let mut out = Vec::new();
        out.extend_from_slice(b"MLVLG\0");
        out.extend_from_slice(&1i16.to_be_bytes());
        out.extend_from_slice(&0i32.to_be_bytes());
        out.extend_from_slice(&(info_start as u16).to_be_bytes());
        out.extend_from_slice(&(data_start as u32).to_be_bytes());
        out.extend_from_slice(&((fields.len() * 2) as i16).to_be_bytes());
        out.extend_from_slice(&(fields.len() as u16).to_be_bytes());

        for (name, unit, scale) in fields {
            // u16 field type
            out.push(2);
            let mut name_buf = [0u8; 34];
            name_buf[..name.len()].copy_from_slice(name.as_bytes());
            out.extend_from_slice(&name_buf);
            let mut unit_buf = [0u8; 10];
            unit_buf[..unit.len()].copy_from_slice(unit.as_bytes());
            out.extend_from_slice(&unit_buf);
            out.push(0);
            out.extend_from_slice(&scale.to_be_bytes());
            out.extend_from_slice(&0f32.to_be_bytes());
            out.push(0);
        }
        out.extend_from_slice(info);

        for (counter, (ms, values)) in records.iter().enumerate() {
            out.push(0);
            out.push(counter as u8);
            out.extend_from_slice(&ms.to_be_bytes());
            for v in values {
                out.extend_from_slice(&v.to_be_bytes());
            }
            out.push(0);
        }
        out
    }
}
