//! Row types for the mission, place, user and cache tables.

use chrono::NaiveDateTime;
use serde::Deserialize;
use serde::de::DeserializeOwned;

use crate::mode::TravelMode;

/// Mission columns read into typed fields. Every other column of
/// `missions.tsv` is carried through untouched in `extra`.
pub const MISSION_COLUMNS: [&str; 5] = ["place_id", "user_id", "mode", "co2", "date"];

/// Columns appended to the mission columns in the cache.
pub const DERIVED_COLUMNS: [&str; 2] = ["emissions", "regions"];

/// Whether `column` is one of [`MISSION_COLUMNS`] (or the `#place_id` spelling).
pub fn is_typed_column(column: &str) -> bool {
    column == "#place_id" || MISSION_COLUMNS.contains(&column)
}

/// Mission rows together with the header of the file they came from.
#[derive(Debug, Clone, PartialEq)]
pub struct MissionTable<T> {
    /// Mission columns in file order, without the derived cache columns.
    pub columns: Vec<String>,
    pub rows: Vec<T>,
}

#[cfg(test)]
impl<T> MissionTable<T> {
    /// A table with just the typed mission columns.
    pub(crate) fn with_default_columns(rows: Vec<T>) -> Self {
        MissionTable {
            columns: MISSION_COLUMNS.iter().map(|c| c.to_string()).collect(),
            rows,
        }
    }
}

/// A row type read from a mission-shaped table (raw missions or the cache).
pub trait MissionRow: DeserializeOwned {
    /// Stores the values of the untyped columns, in file order.
    fn set_extra(&mut self, extra: Vec<String>);
}

/// A single row of `missions.tsv`.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Trip {
    #[serde(alias = "#place_id")]
    pub place_id: String,
    pub user_id: String,
    pub mode: TravelMode,
    /// Emission factor, kg CO2 per km.
    #[serde(deserialize_with = "finite::deserialize")]
    pub co2: f64,
    #[serde(with = "trip_date")]
    pub date: NaiveDateTime,
    /// Values of the untyped columns, in file order.
    #[serde(skip)]
    pub extra: Vec<String>,
}

impl MissionRow for Trip {
    fn set_extra(&mut self, extra: Vec<String>) {
        self.extra = extra;
    }
}

/// A single row of `places.tsv`.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Place {
    #[serde(rename = "#place_id", alias = "place_id")]
    pub place_id: String,
    /// Trip length in km.
    #[serde(deserialize_with = "finite::deserialize")]
    pub distance: f64,
}

/// A single row of `users.tsv`.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct User {
    #[serde(rename = "#user_id", alias = "user_id")]
    pub user_id: String,
    pub region: String,
}

/// A mission joined with its emission and its user's region.
///
/// This is also the row layout of the `missions.csv` cache: every mission
/// column followed by `emissions` and `regions`. An empty `emissions` or
/// `regions` field means the place or user could not be found.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct EnrichedTrip {
    #[serde(alias = "#place_id")]
    pub place_id: String,
    pub user_id: String,
    pub mode: TravelMode,
    #[serde(deserialize_with = "finite::deserialize")]
    pub co2: f64,
    #[serde(with = "trip_date")]
    pub date: NaiveDateTime,
    #[serde(rename = "emissions")]
    pub emission: Option<f64>,
    #[serde(rename = "regions")]
    pub region: Option<String>,
    #[serde(skip)]
    pub extra: Vec<String>,
}

impl MissionRow for EnrichedTrip {
    fn set_extra(&mut self, extra: Vec<String>) {
        self.extra = extra;
    }
}

impl EnrichedTrip {
    pub fn from_trip(
        trip: &Trip,
        mode: TravelMode,
        emission: Option<f64>,
        region: Option<String>,
    ) -> Self {
        EnrichedTrip {
            place_id: trip.place_id.clone(),
            user_id: trip.user_id.clone(),
            mode,
            co2: trip.co2,
            date: trip.date,
            emission,
            region,
            extra: trip.extra.clone(),
        }
    }

    /// Text of a typed mission column, `None` for any other column.
    pub fn typed_field(&self, column: &str) -> Option<String> {
        match column {
            "place_id" | "#place_id" => Some(self.place_id.clone()),
            "user_id" => Some(self.user_id.clone()),
            "mode" => Some(self.mode.label().to_string()),
            "co2" => Some(self.co2.to_string()),
            "date" => Some(trip_date::format(&self.date)),
            _ => None,
        }
    }
}

/// Rejects `NaN` and infinities, which would poison every running sum they
/// enter.
pub mod finite {
    use serde::{Deserialize, Deserializer};

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<f64, D::Error> {
        let value = f64::deserialize(deserializer)?;
        if value.is_finite() {
            Ok(value)
        } else {
            Err(serde::de::Error::custom(format!("non-finite number {value}")))
        }
    }
}

/// Date handling for mission rows.
///
/// Accepts a bare date or a date with a time of day. Midnight timestamps are
/// written back as a bare date so a date-only input survives a cache write
/// unchanged.
pub mod trip_date {
    use anyhow::{Context, Result};
    use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
    use serde::{Deserialize, Deserializer, Serializer};

    const DATETIME_FORMATS: &[&str] = &["%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M:%S"];
    const DATE_FORMAT: &str = "%Y-%m-%d";

    pub fn parse(raw: &str) -> Result<NaiveDateTime> {
        let raw = raw.trim();
        for format in DATETIME_FORMATS {
            if let Ok(parsed) = NaiveDateTime::parse_from_str(raw, format) {
                return Ok(parsed);
            }
        }
        NaiveDate::parse_from_str(raw, DATE_FORMAT)
            .map(|date| date.and_time(NaiveTime::MIN))
            .with_context(|| format!("unrecognized date '{raw}'"))
    }

    pub fn format(value: &NaiveDateTime) -> String {
        if value.time() == NaiveTime::MIN {
            value.format(DATE_FORMAT).to_string()
        } else {
            value.format(DATETIME_FORMATS[0]).to_string()
        }
    }

    pub fn serialize<S: Serializer>(value: &NaiveDateTime, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&format(value))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<NaiveDateTime, D::Error> {
        let raw = String::deserialize(deserializer)?;
        parse(&raw).map_err(|e| serde::de::Error::custom(format!("{e:#}")))
    }
}
