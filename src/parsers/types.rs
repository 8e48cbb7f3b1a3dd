use serde::Serialize;
use strum::{AsRefStr, EnumString};
use thiserror::Error;

/// Errors produced while loading a datalog
#[derive(Debug, Error)]
pub enum ParseError {
    #[error("failed to read log file: {0}")]
    Io(#[from] std::io::Error),
    #[error("log file is empty")]
    Empty,
    #[error("log file has no header row")]
    MissingHeader,
    #[error("invalid MLG file: {0}")]
    InvalidBinary(String),
    #[error("unknown MLG field type {0}")]
    UnknownFieldType(u8),
}

/// Delimited text metadata
#[derive(Clone, Debug, Serialize, Default)]
pub struct DelimitedMeta {
    pub delimiter: char,
    pub had_units_row: bool,
}

/// MegaSquirt MSL text log metadata
#[derive(Clone, Debug, Serialize, Default)]
pub struct MslMeta {
    /// First quoted header line, e.g. `MS3 Format 0568.11E`
    pub format: String,
    pub capture_date: String,
    pub tab_separated: bool,
}

/// MegaLogViewer binary log metadata
#[derive(Clone, Debug, Serialize, Default)]
pub struct MlgMeta {
    pub format_version: i16,
    pub capture_date: String,
    pub marker_count: usize,
}

/// Metadata enum supporting the different source formats
#[derive(Clone, Debug, Serialize, Default)]
pub enum Meta {
    Delimited(DelimitedMeta),
    Msl(MslMeta),
    Mlg(MlgMeta),
    #[default]
    Empty,
}

impl Meta {
    /// Source format the metadata came from
    pub fn format(&self) -> Option<LogFormat> {
        match self {
            Meta::Delimited(_) => Some(LogFormat::Delimited),
            Meta::Msl(_) => Some(LogFormat::Msl),
            Meta::Mlg(_) => Some(LogFormat::Mlg),
            Meta::Empty => None,
        }
    }
}

/// A named column of the log table
#[derive(Clone, Debug, Default, Serialize, PartialEq)]
pub struct Channel {
    pub name: String,
    pub unit: String,
}

impl Channel {
    pub fn new(name: impl Into<String>, unit: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            unit: unit.into(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn unit(&self) -> &str {
        &self.unit
    }
}

/// Parsed log file structure.
///
/// `data` is row-major: `data[row][channel]`. Every row has one value per
/// channel; cells that failed to parse are `NaN`.
#[derive(Clone, Debug, Default)]
pub struct Log {
    pub meta: Meta,
    pub channels: Vec<Channel>,
    /// Time axis in seconds, one entry per row
    pub times: Vec<f64>,
    pub data: Vec<Vec<f64>>,
}

impl Log {
    /// Get data for a specific channel by index
    pub fn get_channel_data(&self, channel_index: usize) -> Vec<f64> {
        self.data
            .iter()
            .filter_map(|row| row.get(channel_index).copied())
            .collect()
    }

    /// Find channel index by exact name
    pub fn find_channel_index(&self, name: &str) -> Option<usize> {
        self.channels.iter().position(|c| c.name == name)
    }

    pub fn channel_names(&self) -> Vec<String> {
        self.channels.iter().map(|c| c.name.clone()).collect()
    }

    pub fn row_count(&self) -> usize {
        self.data.len()
    }
}

/// Trait for text log parsers
pub trait Parseable {
    fn parse(&self, data: &str) -> Result<Log, ParseError>;
}

/// Supported source formats
#[derive(AsRefStr, EnumString, Clone, Copy, Debug, PartialEq, Eq, Default)]
#[strum(ascii_case_insensitive)]
pub enum LogFormat {
    #[default]
    #[strum(serialize = "csv")]
    Delimited,
    #[strum(serialize = "msl")]
    Msl,
    #[strum(serialize = "mlg")]
    Mlg,
}

impl LogFormat {
    pub fn name(&self) -> &'static str {
        match self {
            LogFormat::Delimited => "CSV",
            LogFormat::Msl => "MegaSquirt MSL",
            LogFormat::Mlg => "MegaLogViewer MLG",
        }
    }
}
