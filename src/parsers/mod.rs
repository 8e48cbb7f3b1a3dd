//! Datalog loading.
//!
//! Produces a rectangular [`Log`] table from MegaSquirt-family log files.
//! The format is picked from the file contents first (MLG magic bytes), then
//! from the extension, falling back to delimited text.

pub mod delimited;
pub mod mlg;
pub mod msl;
pub mod types;

pub use delimited::Delimited;
pub use mlg::Mlg;
pub use msl::Msl;
pub use types::{Channel, Log, LogFormat, Meta, ParseError, Parseable};

use memmap2::Mmap;
use std::fs::File;
use std::path::Path;
use std::str::FromStr;

use crate::columns::{match_column, ColumnRole};

/// Decide the log format from the raw bytes and the file name
pub fn detect_format(bytes: &[u8], path: &Path) -> LogFormat {
    if Mlg::detect(bytes) {
        return LogFormat::Mlg;
    }
    path.extension()
        .and_then(|ext| ext.to_str())
        .and_then(|ext| LogFormat::from_str(ext).ok())
        .filter(|format| *format != LogFormat::Mlg)
        .unwrap_or_default()
}

/// Parse in-memory file contents
pub fn parse_bytes(bytes: &[u8], format: LogFormat) -> Result<Log, ParseError> {
    let mut log = match format {
        LogFormat::Mlg => Mlg::parse_binary(bytes)?,
        LogFormat::Msl => Msl.parse(&String::from_utf8_lossy(bytes))?,
        LogFormat::Delimited => Delimited.parse(&String::from_utf8_lossy(bytes))?,
    };
    attach_time_axis(&mut log);
    Ok(log)
}

/// Memory-map and parse a log file
pub fn load_file(path: &Path) -> Result<Log, ParseError> {
    let file = File::open(path)?;
    if file.metadata()?.len() == 0 {
        return Err(ParseError::Empty);
    }
    // SAFETY: the file must not be modified or truncated by another process
    // while it is mapped; log files are treated as immutable once written.
    let mmap = unsafe { Mmap::map(&file)? };

    let format = detect_format(&mmap, path);
    tracing::info!("Loading {:?} as {}", path, format.name());
    parse_bytes(&mmap, format)
}

/// Fill `Log::times` and make sure a time channel exists when the format provides one.
///
/// Text formats take their time axis from the auto-matched time column, or
/// the row number when there is none. Binary logs carry block timestamps;
/// a `Time` channel is synthesized from them if no field matches.
fn attach_time_axis(log: &mut Log) {
    let names = log.channel_names();
    if let Some(idx) = match_column(ColumnRole::Time, &names).and_then(|n| log.find_channel_index(n)) {
        log.times = log.get_channel_data(idx);
        return;
    }

    if !log.times.is_empty() && log.times.len() == log.data.len() {
        tracing::debug!("Synthesizing Time channel from record timestamps");
        log.channels.insert(0, Channel::new("Time", "s"));
        for (row, t) in log.data.iter_mut().zip(&log.times) {
            row.insert(0, *t);
        }
    } else {
        tracing::warn!("No time column found; using row numbers as time axis");
        log.times = (0..log.data.len()).map(|i| i as f64).collect();
    }
}
