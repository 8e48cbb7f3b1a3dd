//! MegaSquirt MSL text log parser.
//!
//! Two layouts are in the wild:
//! - Modern (MS2/MS3, TunerStudio): quoted metadata lines, then a
//!   tab-separated header row, a units row, and data rows.
//! - Older: whitespace-separated columns with `#` comment lines.

use super::delimited::{build_table, clean_cell};
use super::types::{Log, Meta, MslMeta, ParseError, Parseable};

/// How many data lines are inspected when deciding between tab and whitespace layouts
const LAYOUT_SNIFF_LINES: usize = 10;

/// MegaSquirt MSL parser
pub struct Msl;

impl Msl {
    fn is_metadata_line(line: &str) -> bool {
        let line = line.trim();
        line.starts_with('"') || line.starts_with('#')
    }

    /// Detect the modern tab-separated layout
    pub fn is_tab_separated(contents: &str) -> bool {
        contents
            .lines()
            .take(LAYOUT_SNIFF_LINES)
            .filter(|l| !l.trim().is_empty() && !Self::is_metadata_line(l))
            .any(|l| l.contains('\t'))
    }

    fn read_metadata<'a>(lines: impl Iterator<Item = &'a str>) -> MslMeta {
        let mut meta = MslMeta::default();
        for line in lines {
            let text = clean_cell(line.trim_start_matches('#'));
            if let Some(date) = text.strip_prefix("Capture Date:") {
                meta.capture_date = date.trim().to_string();
            } else if meta.format.is_empty() && !text.is_empty() {
                meta.format = text.to_string();
            }
        }
        meta
    }
}

impl Parseable for Msl {
    fn parse(&self, file_contents: &str) -> Result<Log, ParseError> {
        if file_contents.trim().is_empty() {
            return Err(ParseError::Empty);
        }

        let tab_separated = Self::is_tab_separated(file_contents);
        let lines: Vec<&str> = file_contents
            .lines()
            .filter(|l| !l.trim().is_empty())
            .collect();

        let header_pos = lines
            .iter()
            .position(|l| !Self::is_metadata_line(l))
            .ok_or(ParseError::MissingHeader)?;

        let mut meta = Self::read_metadata(lines[..header_pos].iter().copied());
        meta.tab_separated = tab_separated;

        let (names, rows) = if tab_separated {
            let names: Vec<&str> = lines[header_pos].split('\t').collect();
            let rows: Vec<Vec<&str>> = lines[header_pos + 1..]
                .iter()
                .map(|l| l.split('\t').collect())
                .collect();
            (names, rows)
        } else {
            // Whitespace layout: strip trailing comments, skip comment-only lines
            let mut body = lines[header_pos..]
                .iter()
                .map(|l| l.split('#').next().unwrap_or_default())
                .filter(|l| !l.trim().is_empty());
            let names: Vec<&str> = body
                .next()
                .ok_or(ParseError::MissingHeader)?
                .split_whitespace()
                .collect();
            let rows: Vec<Vec<&str>> = body.map(|l| l.split_whitespace().collect()).collect();
            (names, rows)
        };

        let (channels, data, _) = build_table(names, rows)?;

        tracing::info!(
            "Parsed MSL log ({}): {} channels, {} rows",
            if tab_separated { "tab" } else { "whitespace" },
            channels.len(),
            data.len()
        );

        Ok(Log {
            meta: Meta::Msl(meta),
            channels,
            times: Vec::new(),
            data,
        })
    }
}
