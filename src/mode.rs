//! Travel modes and their emission factors.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// kg CO2 per km for public transport.
pub const PUBLIC_FACTOR: f64 = 0.075;
/// kg CO2 per km for a car.
pub const CAR_FACTOR: f64 = 0.20033;
/// kg CO2 per km for a train.
pub const TRAIN_FACTOR: f64 = 0.01214;

/// Factor → mode table used to resolve the `other` placeholder.
///
/// Plane has no entry: it is the default for any factor not listed here.
static FACTOR_TABLE: &[(f64, TravelMode)] = &[
    (PUBLIC_FACTOR, TravelMode::Public),
    (CAR_FACTOR, TravelMode::Car),
    (TRAIN_FACTOR, TravelMode::Train),
];

/// Mode of travel of a mission, as written in `missions.tsv`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TravelMode {
    Public,
    Car,
    Train,
    Plane,
    /// Placeholder label, resolved through the emission factor.
    Other,
}

impl TravelMode {
    /// The concrete modes, in checklist order.
    pub const CONCRETE: [TravelMode; 4] = [
        TravelMode::Public,
        TravelMode::Car,
        TravelMode::Train,
        TravelMode::Plane,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            TravelMode::Public => "public",
            TravelMode::Car => "car",
            TravelMode::Train => "train",
            TravelMode::Plane => "plane",
            TravelMode::Other => "other",
        }
    }

    pub fn is_placeholder(&self) -> bool {
        matches!(self, TravelMode::Other)
    }
}

impl fmt::Display for TravelMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for TravelMode {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "public" => Ok(TravelMode::Public),
            "car" => Ok(TravelMode::Car),
            "train" => Ok(TravelMode::Train),
            "plane" => Ok(TravelMode::Plane),
            "other" => Ok(TravelMode::Other),
            other => Err(anyhow::anyhow!("unknown travel mode '{other}'")),
        }
    }
}

/// Outcome of resolving the `other` placeholder from an emission factor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModeMatch {
    /// The factor matched one of the canonical factors exactly.
    Exact(TravelMode),
    /// The factor matched nothing and fell back to [`TravelMode::Plane`].
    Defaulted(TravelMode),
}

impl ModeMatch {
    pub fn mode(&self) -> TravelMode {
        match self {
            ModeMatch::Exact(mode) | ModeMatch::Defaulted(mode) => *mode,
        }
    }

    pub fn is_defaulted(&self) -> bool {
        matches!(self, ModeMatch::Defaulted(_))
    }
}

/// Maps an emission factor back to the mode it belongs to.
///
/// | Factor   | Mode   |
/// |----------|--------|
/// | 0.075    | public |
/// | 0.20033  | car    |
/// | 0.01214  | train  |
/// | anything else | plane (defaulted) |
///
/// Matching is exact: factors are parsed from the same decimal text as the
/// constants, so no tolerance is applied.
pub fn resolve_placeholder_mode(factor: f64) -> ModeMatch {
    FACTOR_TABLE
        .iter()
        .find(|(known, _)| *known == factor)
        .map(|(_, mode)| ModeMatch::Exact(*mode))
        .unwrap_or(ModeMatch::Defaulted(TravelMode::Plane))
}
