//! Tests for the MegaSquirt MSL parser
//!
//! Tests cover:
//! - TunerStudio tab-separated logs with metadata lines
//! - Older whitespace-separated logs

use crate::common::assertions::assert_valid_log_structure;
use crate::common::synthetic::{engine_msl, throttle_trace, uniform_times, Stab};
use ae_analyzer::parsers::{parse_bytes, LogFormat, Meta, Msl, Parseable};

#[test]
fn test_tunerstudio_log() {
    let times = uniform_times(50, 0.02);
    let tps = throttle_trace(
        50,
        3.0,
        &[Stab {
            start: 10,
            ramp: 5,
            rise: 50.0,
        }],
    );
    let log = Msl.parse(&engine_msl(&times, &tps)).unwrap();

    assert_eq!(log.channels.len(), 5);
    assert_eq!(log.data.len(), 50);
    assert_eq!(log.channels[0].unit(), "s");
    assert_eq!(log.data[15][2], 53.0);

    match &log.meta {
        Meta::Msl(meta) => {
            assert!(meta.tab_separated);
            assert_eq!(meta.format, "MS3 Format 0568.11E");
            assert_eq!(meta.capture_date, "Sat Mar 02 14:12:00 2024");
        }
        other => panic!("unexpected meta {:?}", other),
    }
}

#[test]
fn test_whitespace_log_with_comments() {
    let contents = "# MegaSquirt-I data log\n\
                    # Capture Date: 1999\n\
                    Time   RPM   TPS\n\
                    0.00   850   2.0\n\
                    0.10   900   2.0   # idle\n\
                    # MARK 1\n\
                    0.20  1400  35.0\n";
    let log = parse_bytes(contents.as_bytes(), LogFormat::Msl).unwrap();

    assert_valid_log_structure(&log);
    assert_eq!(log.channels.len(), 3);
    assert_eq!(log.times, vec![0.0, 0.1, 0.2]);
    assert_eq!(log.data[2], vec![0.2, 1400.0, 35.0]);
}

#[test]
fn test_metadata_only_file() {
    assert!(Msl.parse("\"MS3 Format\"\n\"Capture Date: now\"\n").is_err());
    assert!(Msl.parse("   \n").is_err());
}
