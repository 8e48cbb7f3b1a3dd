//! AE Analyzer - acceleration enrichment event detection for ECU datalogs
//!
//! This library loads MegaSquirt-family datalogs, finds the periods where the
//! throttle opens fast enough for the ECU to add acceleration enrichment fuel,
//! and prepares each event for display.
//!
//! ## Module Structure
//!
//! - [`parsers`] - Datalog loaders (CSV, MSL, native MLG)
//! - [`columns`] - Column role matching and selection
//! - [`config`] - Detection thresholds and configuration
//! - [`analysis`] - Rate derivative, event detection and the AE analyzer
//! - [`report`] - Event windows, navigation and summaries
//! - [`settings`] - User settings persistence
//! - [`args`] - Command-line arguments

pub mod analysis;
pub mod args;
pub mod columns;
pub mod config;
pub mod parsers;
pub mod report;
pub mod settings;
