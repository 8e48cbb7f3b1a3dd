//! Column role matching.
//!
//! Logs from different firmwares name the same signal differently. Each
//! logical role has an ordered list of lowercase synonyms; the first
//! synonym that equals a column name (ignoring case) wins.

use serde::{Deserialize, Serialize};
use strum::{AsRefStr, EnumIter, IntoEnumIterator};

/// Logical signal roles used by the AE analysis
#[derive(AsRefStr, EnumIter, Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ColumnRole {
    Time,
    #[strum(serialize = "RPM")]
    Rpm,
    #[strum(serialize = "TPS")]
    Tps,
    #[strum(serialize = "Pulsewidth")]
    PulseWidth,
    #[strum(serialize = "AFR")]
    Afr,
}

impl ColumnRole {
    /// Synonyms in priority order
    pub fn patterns(&self) -> &'static [&'static str] {
        match self {
            ColumnRole::Time => &["time", "timestamp", "t"],
            ColumnRole::Rpm => &["rpm", "engine speed"],
            ColumnRole::Tps => &["tps", "throttle", "throttle position"],
            ColumnRole::PulseWidth => &["pw", "pulsewidth", "injector pulse", "pw1", "inj_pw"],
            ColumnRole::Afr => &["afr", "lambda", "o2", "air/fuel", "air fuel"],
        }
    }

    /// Whether detection can run without this role
    pub fn is_required(&self) -> bool {
        matches!(self, ColumnRole::Time | ColumnRole::Tps)
    }
}

/// Find the column for a role, returning the column name as it appears in the log
pub fn match_column<'a, S: AsRef<str>>(role: ColumnRole, columns: &'a [S]) -> Option<&'a str> {
    role.patterns().iter().find_map(|pattern| {
        columns
            .iter()
            .map(AsRef::<str>::as_ref)
            .find(|name| name.trim().eq_ignore_ascii_case(pattern))
    })
}

/// Which log column feeds each role
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnSelection {
    pub time: Option<String>,
    pub rpm: Option<String>,
    pub tps: Option<String>,
    pub pulsewidth: Option<String>,
    pub afr: Option<String>,
}

impl ColumnSelection {
    /// Best-effort selection from column names; unmatched roles stay `None`
    pub fn auto_select<S: AsRef<str>>(columns: &[S]) -> Self {
        let mut selection = Self::default();
        for role in ColumnRole::iter() {
            selection.set(role, match_column(role, columns).map(str::to_string));
        }
        selection
    }

    pub fn get(&self, role: ColumnRole) -> Option<&str> {
        match role {
            ColumnRole::Time => self.time.as_deref(),
            ColumnRole::Rpm => self.rpm.as_deref(),
            ColumnRole::Tps => self.tps.as_deref(),
            ColumnRole::PulseWidth => self.pulsewidth.as_deref(),
            ColumnRole::Afr => self.afr.as_deref(),
        }
    }

    pub fn set(&mut self, role: ColumnRole, column: Option<String>) {
        let slot = match role {
            ColumnRole::Time => &mut self.time,
            ColumnRole::Rpm => &mut self.rpm,
            ColumnRole::Tps => &mut self.tps,
            ColumnRole::PulseWidth => &mut self.pulsewidth,
            ColumnRole::Afr => &mut self.afr,
        };
        *slot = column.filter(|c| !c.trim().is_empty());
    }

    /// Overlay explicit choices on top of this selection
    pub fn with_overrides(mut self, overrides: &ColumnSelection) -> Self {
        for role in ColumnRole::iter() {
            if let Some(column) = overrides.get(role) {
                self.set(role, Some(column.to_string()));
            }
        }
        self
    }

    /// Required roles that have no column assigned
    pub fn missing_required(&self) -> Vec<ColumnRole> {
        ColumnRole::iter()
            .filter(|r| r.is_required() && self.get(*r).is_none())
            .collect()
    }
}
