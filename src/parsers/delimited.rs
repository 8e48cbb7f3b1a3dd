//! Delimited text (CSV) log parser.
//!
//! Handles the CSV exports produced by TunerStudio, MegaLogViewer and the
//! mlg-converter tool. Semicolon is tried first because European exports
//! use it; a header that does not split on `;` falls back to `,`. An
//! optional units row directly below the header is detected and stripped.

use regex::Regex;
use std::sync::LazyLock;

use super::types::{Channel, DelimitedMeta, Log, Meta, ParseError, Parseable};

/// A cell belongs to a units row if it contains a letter, degree sign or percent
static UNITS_CELL: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[a-zA-Z°%]").expect("units pattern is valid"));

/// Delimited text parser
pub struct Delimited;

impl Delimited {
    /// Pick the column delimiter from the header line
    pub fn sniff_delimiter(header: &str) -> char {
        if split_cells(header, ';').len() > 1 {
            ';'
        } else {
            ','
        }
    }
}

impl Parseable for Delimited {
    fn parse(&self, file_contents: &str) -> Result<Log, ParseError> {
        let mut lines = file_contents.lines().filter(|l| !l.trim().is_empty());

        let header = lines.next().ok_or(ParseError::Empty)?;
        let delimiter = Self::sniff_delimiter(header);
        let names = split_cells(header, delimiter);

        let rows: Vec<Vec<&str>> = lines.map(|l| split_cells(l, delimiter)).collect();
        let (channels, data, had_units_row) = build_table(names, rows)?;

        tracing::info!(
            "Parsed delimited log: {} channels, {} rows (delimiter {:?})",
            channels.len(),
            data.len(),
            delimiter
        );

        Ok(Log {
            meta: Meta::Delimited(DelimitedMeta {
                delimiter,
                had_units_row,
            }),
            channels,
            times: Vec::new(),
            data,
        })
    }
}

pub(crate) fn split_cells(line: &str, delimiter: char) -> Vec<&str> {
    line.trim_end_matches(['\r', '\n']).split(delimiter).collect()
}

pub(crate) fn clean_cell(cell: &str) -> &str {
    cell.trim().trim_matches('"').trim()
}

/// Check whether a row looks like a units row rather than numeric data.
///
/// Numbers in exponent notation contain a letter but are still data.
pub fn is_units_row(cells: &[&str]) -> bool {
    cells.iter().map(|c| clean_cell(c)).any(|c| {
        UNITS_CELL.is_match(c) && c.parse::<f64>().is_err()
    })
}

fn parse_cell(cell: &str) -> f64 {
    clean_cell(cell).parse::<f64>().unwrap_or(f64::NAN)
}

/// Turn a header and raw rows into channels and a rectangular data matrix.
///
/// Short rows are padded with `NaN`, long rows are truncated to the header width.
pub(crate) fn build_table(
    names: Vec<&str>,
    mut rows: Vec<Vec<&str>>,
) -> Result<(Vec<Channel>, Vec<Vec<f64>>, bool), ParseError> {
    let names: Vec<&str> = names.into_iter().map(clean_cell).collect();
    if names.iter().all(|n| n.is_empty()) {
        return Err(ParseError::MissingHeader);
    }

    let mut channels: Vec<Channel> = names.iter().map(|n| Channel::new(*n, "")).collect();

    let had_units_row = rows.first().is_some_and(|r| is_units_row(r));
    if had_units_row {
        let units = rows.remove(0);
        for (channel, unit) in channels.iter_mut().zip(units) {
            channel.unit = clean_cell(unit).to_string();
        }
    }

    let width = channels.len();
    let mut ragged = 0usize;
    let data: Vec<Vec<f64>> = rows
        .iter()
        .map(|cells| {
            if cells.len() != width {
                ragged += 1;
            }
            let mut row: Vec<f64> = cells.iter().take(width).map(|c| parse_cell(c)).collect();
            row.resize(width, f64::NAN);
            row
        })
        .collect();

    if ragged > 0 {
        tracing::warn!(
            "{} rows did not match the header width of {} columns",
            ragged,
            width
        );
    }

    Ok((channels, data, had_units_row))
}
