//! Data types produced by the aggregation pipeline.

use chrono::{DateTime, NaiveDateTime, Utc};
use serde::Serialize;

use crate::analyzers::selection::ModeSelection;
use crate::records::trip_date;

/// One point of a cumulative series.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SeriesPoint {
    #[serde(with = "trip_date")]
    pub date: NaiveDateTime,
    pub cumulative: f64,
}

/// Cumulative emissions over time for a single region.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RegionSeries {
    pub region: String,
    /// Palette color, absent for regions outside the fixed palette.
    pub color: Option<&'static str>,
    pub points: Vec<SeriesPoint>,
}

impl RegionSeries {
    /// Final value of the running sum, 0.0 for an empty series.
    pub fn total(&self) -> f64 {
        self.points.last().map(|p| p.cumulative).unwrap_or(0.0)
    }
}

/// Per-region totals for the selected modes.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RegionTotal {
    pub region: String,
    pub trips: usize,
    pub total: f64,
}

/// Everything a line chart needs, serialized as the `series` command output.
#[derive(Debug, Serialize)]
pub struct ChartData {
    pub generated_at: DateTime<Utc>,
    pub x_label: &'static str,
    pub y_label: &'static str,
    pub modes: ModeSelection,
    pub series: Vec<RegionSeries>,
}

impl ChartData {
    pub const X_LABEL: &'static str = "Date";
    pub const Y_LABEL: &'static str = "Total emissions";

    pub fn new(modes: ModeSelection, series: Vec<RegionSeries>) -> Self {
        ChartData {
            generated_at: Utc::now(),
            x_label: Self::X_LABEL,
            y_label: Self::Y_LABEL,
            modes,
            series,
        }
    }
}
