//! The set of travel modes a chart is filtered to.

use serde::Serialize;
use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

use crate::mode::TravelMode;

/// Selected concrete modes. Defaults to all four.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct ModeSelection(BTreeSet<TravelMode>);

impl Default for ModeSelection {
    fn default() -> Self {
        Self::all()
    }
}

impl ModeSelection {
    pub fn all() -> Self {
        Self(TravelMode::CONCRETE.into_iter().collect())
    }

    pub fn none() -> Self {
        Self(BTreeSet::new())
    }

    pub fn contains(&self, mode: TravelMode) -> bool {
        self.0.contains(&mode)
    }

    /// Flips `mode` in or out of the selection. The placeholder is ignored.
    pub fn toggle(&mut self, mode: TravelMode) {
        if mode.is_placeholder() {
            return;
        }
        if !self.0.remove(&mode) {
            self.0.insert(mode);
        }
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Display for ModeSelection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let labels: Vec<&str> = self.0.iter().map(TravelMode::label).collect();
        f.write_str(&labels.join(","))
    }
}

/// Parses a comma-separated list such as `public,car`.
impl FromStr for ModeSelection {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut modes = BTreeSet::new();
        for label in s.split(',').map(str::trim).filter(|l| !l.is_empty()) {
            let mode: TravelMode = label.parse()?;
            if mode.is_placeholder() {
                anyhow::bail!("'{label}' is a placeholder and cannot be selected");
            }
            modes.insert(mode);
        }
        Ok(Self(modes))
    }
}
