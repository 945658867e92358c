use crate::enrich::{Enrichment, PlaceIndex, UserIndex, enrich};
use crate::output::write_cache;
use crate::records::{EnrichedTrip, MissionTable, Trip};
use anyhow::Result;
use std::path::Path;
use tracing::info;

/// Sorts trips by date ascending. Trips on the same date keep their order.
pub fn sort_by_date(trips: &mut [EnrichedTrip]) {
    trips.sort_by_key(|t| t.date);
}

/// Enriches the mission rows, sorts them by date and writes them to
/// `cache_path` under the missions header.
///
/// Returns the sorted trips together with the join report.
#[tracing::instrument(skip_all, fields(trips = missions.rows.len(), cache = %cache_path.display()))]
pub fn build_dataset(
    missions: &MissionTable<Trip>,
    places: &PlaceIndex,
    users: &UserIndex,
    cache_path: &Path,
) -> Result<Enrichment> {
    let mut enrichment = enrich(&missions.rows, places, users);
    sort_by_date(&mut enrichment.trips);

    write_cache(cache_path, &missions.columns, &enrichment.trips)?;

    let report = &enrichment.report;
    info!(
        trips = report.trips,
        missing_places = report.missing_places,
        missing_users = report.missing_users,
        resolved_placeholders = report.resolved_placeholders,
        defaulted_placeholders = report.defaulted_placeholders,
        "Dataset built"
    );

    Ok(enrichment)
}
