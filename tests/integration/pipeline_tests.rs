//! Pipeline integration tests
//!
//! Tests for the full cycle: write a log to disk, load it, detect AE events,
//! and build the presentation data for them.

use crate::common::assertions::{assert_events_valid, assert_valid_log_structure};
use crate::common::synthetic::{engine_csv, engine_msl, throttle_trace, uniform_times, Stab};
use crate::common::{mlg, write_temp_file};
use ae_analyzer::analysis::ae::{AccelEnrichmentAnalyzer, AeAnalysis};
use ae_analyzer::analysis::{AnalysisError, Analyzer};
use ae_analyzer::columns::ColumnSelection;
use ae_analyzer::config::{DetectionConfig, DetectionParams};
use ae_analyzer::parsers::{load_file, Log, ParseError};
use ae_analyzer::report::{event_title, EventCursor, EventWindow, FileReport};

const SAMPLES: usize = 300;
const INTERVAL: f64 = 0.02;

/// Two long throttle stabs and one blip too short to count
fn stabs() -> [Stab; 3] {
    [
        Stab {
            start: 40,
            ramp: 10,
            rise: 30.0,
        },
        Stab {
            start: 150,
            ramp: 2,
            rise: 10.0,
        },
        Stab {
            start: 220,
            ramp: 15,
            rise: 45.0,
        },
    ]
}

fn analyze(log: &Log, overrides: &ColumnSelection) -> Result<AeAnalysis, AnalysisError> {
    let config =
        DetectionConfig::for_columns(&log.channel_names(), overrides, DetectionParams::default());
    AccelEnrichmentAnalyzer::new(config).analyze(log)
}

fn assert_expected_events(log: &Log) {
    let analysis = analyze(log, &ColumnSelection::default()).unwrap();
    assert_events_valid(&analysis.events, log.row_count(), &DetectionParams::default());

    let ranges: Vec<(usize, usize)> = analysis
        .events
        .iter()
        .map(|e| (e.event_start, e.event_end))
        .collect();
    assert_eq!(ranges, vec![(41, 51), (221, 236)]);
}

// ============================================
// Per-Format Pipelines
// ============================================

#[test]
fn test_csv_pipeline() {
    let times = uniform_times(SAMPLES, INTERVAL);
    let tps = throttle_trace(SAMPLES, 2.0, &stabs());
    let path = write_temp_file("pipeline.csv", engine_csv(&times, &tps, ',').as_bytes());

    let log = load_file(&path).unwrap();
    assert_valid_log_structure(&log);
    assert_expected_events(&log);
    let _ = std::fs::remove_file(&path);
}

#[test]
fn test_semicolon_csv_pipeline() {
    let times = uniform_times(SAMPLES, INTERVAL);
    let tps = throttle_trace(SAMPLES, 2.0, &stabs());
    let path = write_temp_file("pipeline-semicolon.csv", engine_csv(&times, &tps, ';').as_bytes());

    let log = load_file(&path).unwrap();
    assert_expected_events(&log);
    let _ = std::fs::remove_file(&path);
}

#[test]
fn test_msl_pipeline() {
    let times = uniform_times(SAMPLES, INTERVAL);
    let tps = throttle_trace(SAMPLES, 2.0, &stabs());
    let path = write_temp_file("pipeline.msl", engine_msl(&times, &tps).as_bytes());

    let log = load_file(&path).unwrap();
    assert_valid_log_structure(&log);
    assert_expected_events(&log);
    let _ = std::fs::remove_file(&path);
}

#[test]
fn test_mlg_pipeline() {
    let tps = throttle_trace(SAMPLES, 2.0, &stabs());
    // TPS stored in tenths of a percent, 20 ms records
    let records: Vec<(u16, Vec<u16>)> = tps
        .iter()
        .enumerate()
        .map(|(i, v)| ((i * 20) as u16, vec![1000, (v * 10.0).round() as u16]))
        .collect();
    let bytes = mlg::build(&[("RPM", "rpm", 1.0), ("TPS", "%", 0.1)], &records);
    let path = write_temp_file("pipeline.mlg", &bytes);

    let log = load_file(&path).unwrap();
    assert_valid_log_structure(&log);
    assert_eq!(log.channel_names()[0], "Time");
    assert_expected_events(&log);
    let _ = std::fs::remove_file(&path);
}

// ============================================
// Column Selection
// ============================================

#[test]
fn test_unmatched_throttle_column_needs_override() {
    let contents = "Seconds,Engine RPM,Throttle Angle\n\
                    0.00,900,2\n0.05,900,2\n0.10,950,20\n0.15,1100,40\n0.20,1300,40\n";
    let path = write_temp_file("pipeline-renamed.csv", contents.as_bytes());
    let log = load_file(&path).unwrap();

    let err = analyze(&log, &ColumnSelection::default()).unwrap_err();
    assert_eq!(
        err,
        AnalysisError::MissingSelection(vec!["Time".to_string(), "TPS".to_string()])
    );

    let overrides = ColumnSelection {
        time: Some("Seconds".to_string()),
        tps: Some("Throttle Angle".to_string()),
        ..Default::default()
    };
    let analysis = analyze(&log, &overrides).unwrap();
    assert_eq!(analysis.events.len(), 1);
    assert_eq!(
        (analysis.events[0].event_start, analysis.events[0].event_end),
        (2, 4)
    );
    let _ = std::fs::remove_file(&path);
}

#[test]
fn test_override_naming_absent_column() {
    let times = uniform_times(20, INTERVAL);
    let tps = vec![5.0; 20];
    let path = write_temp_file("pipeline-absent.csv", engine_csv(&times, &tps, ',').as_bytes());
    let log = load_file(&path).unwrap();

    let overrides = ColumnSelection {
        tps: Some("TPS2".to_string()),
        ..Default::default()
    };
    assert_eq!(
        analyze(&log, &overrides).unwrap_err(),
        AnalysisError::MissingChannel("TPS2".to_string())
    );
    let _ = std::fs::remove_file(&path);
}

// ============================================
// Presentation
// ============================================

#[test]
fn test_event_windows_and_report() {
    let times = uniform_times(SAMPLES, INTERVAL);
    let tps = throttle_trace(SAMPLES, 2.0, &stabs());
    let path = write_temp_file("pipeline-report.csv", engine_csv(&times, &tps, ',').as_bytes());
    let log = load_file(&path).unwrap();
    let analysis = analyze(&log, &ColumnSelection::default()).unwrap();

    let mut cursor = EventCursor::new(analysis.events.len());
    let second = cursor.next_event().unwrap();
    let event = &analysis.events[second];
    let window = EventWindow::extract(&log, &analysis, event).unwrap();

    assert_eq!(window.len(), event.end_idx - event.start_idx);
    assert_eq!(window.tps.len(), window.tps_dot.len());
    assert!(window.rpm.is_some() && window.pulsewidth.is_some() && window.afr.is_some());
    let highlighted = window.times.iter().filter(|t| window.is_highlighted(**t)).count();
    assert_eq!(highlighted, event.event_end - event.event_start + 1);
    assert!(event_title(second, 2, event).starts_with("AE Event 2 of 2 - Duration: 0.30s"));

    let report = FileReport {
        file: path.display().to_string(),
        format: "CSV".to_string(),
        rows: log.row_count(),
        channels: log.channel_names(),
        analysis,
    };
    let json = serde_json::to_value(&report).unwrap();
    assert_eq!(json["rows"], SAMPLES);
    assert_eq!(json["events"].as_array().map(|e| e.len()), Some(2));
    assert_eq!(json["config"]["columns"]["tps"], "TPS");
    assert_eq!(json["config"]["params"]["tps_dot_threshold"], 10.0);
    let _ = std::fs::remove_file(&path);
}

// ============================================
// Error Cases
// ============================================

#[test]
fn test_empty_file() {
    let path = write_temp_file("pipeline-empty.csv", b"");
    assert!(matches!(load_file(&path), Err(ParseError::Empty)));
    let _ = std::fs::remove_file(&path);
}

#[test]
fn test_missing_file() {
    let path = crate::common::temp_path("does-not-exist.csv");
    assert!(matches!(load_file(&path), Err(ParseError::Io(_))));
}

#[test]
fn test_header_only_file() {
    let path = write_temp_file("pipeline-header.csv", b"Time,TPS\n");
    let log = load_file(&path).unwrap();
    let analysis = analyze(&log, &ColumnSelection::default()).unwrap();

    assert_eq!(log.row_count(), 0);
    assert!(analysis.events.is_empty());
    let _ = std::fs::remove_file(&path);
}
