//! Cache-or-rebuild loading of the enriched mission dataset.
//!
//! An existing cache is always served as is: it is never checked against the
//! raw tables. When a raw table is newer than the cache a warning is logged,
//! and `rebuild` is the way to refresh it.

use anyhow::Result;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::SystemTime;
use tracing::{debug, info, warn};

use crate::analyzers::analyzer::build_dataset;
use crate::enrich::{EnrichmentReport, PlaceIndex, UserIndex};
use crate::output::read_cache;
use crate::parser::{count_rows, read_missions, read_table};
use crate::records::{EnrichedTrip, MissionTable, Place, Trip, User};

/// Paths of the four raw tables.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawPaths {
    pub countries: PathBuf,
    pub missions: PathBuf,
    pub places: PathBuf,
    pub users: PathBuf,
}

impl RawPaths {
    pub fn iter(&self) -> impl Iterator<Item = &Path> {
        [&self.countries, &self.missions, &self.places, &self.users]
            .into_iter()
            .map(PathBuf::as_path)
    }
}

/// Where a [`LoadedDataset`] came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DatasetSource {
    Cache,
    Built,
}

/// Enriched missions sorted by date.
#[derive(Debug)]
pub struct LoadedDataset {
    /// Mission columns in file order, as written to the cache.
    pub columns: Vec<String>,
    pub trips: Vec<EnrichedTrip>,
    pub source: DatasetSource,
    /// Join report, only available when the dataset was just built.
    pub report: Option<EnrichmentReport>,
}

/// Returns the cached dataset if `cache_path` exists, otherwise builds it
/// from the raw tables and writes the cache.
///
/// # Errors
///
/// Fails if the cache cannot be parsed, or, when building, if any raw table
/// is missing or malformed.
#[tracing::instrument(skip_all, fields(cache = %cache_path.display()))]
pub fn load_or_build(cache_path: &Path, raw: &RawPaths) -> Result<LoadedDataset> {
    if cache_path.is_file() {
        for path in stale_inputs(cache_path, raw) {
            warn!(
                raw = %path.display(),
                "Raw table is newer than the cache; serving the cache anyway (use --rebuild to refresh)"
            );
        }
        let cached = read_cache(cache_path)?;
        info!(trips = cached.rows.len(), "Serving cached dataset");
        return Ok(LoadedDataset {
            columns: cached.columns,
            trips: cached.rows,
            source: DatasetSource::Cache,
            report: None,
        });
    }

    info!("No cache found, building dataset from raw tables");
    rebuild(cache_path, raw)
}

/// Builds the dataset from the raw tables and overwrites the cache.
#[tracing::instrument(skip_all, fields(cache = %cache_path.display()))]
pub fn rebuild(cache_path: &Path, raw: &RawPaths) -> Result<LoadedDataset> {
    let countries = count_rows(&raw.countries)?;
    let missions: MissionTable<Trip> = read_missions(&raw.missions)?;
    let places: Vec<Place> = read_table(&raw.places)?;
    let users: Vec<User> = read_table(&raw.users)?;

    let place_index = PlaceIndex::build(&places);
    let user_index = UserIndex::build(&users);

    info!(
        countries,
        missions = missions.rows.len(),
        places = place_index.len(),
        users = user_index.len(),
        "Raw tables loaded"
    );
    if place_index.is_empty() {
        warn!(path = %raw.places.display(), "No places, every emission will be missing");
    }
    if user_index.is_empty() {
        warn!(path = %raw.users.display(), "No users, every region will be missing");
    }

    let built = build_dataset(&missions, &place_index, &user_index, cache_path)?;

    Ok(LoadedDataset {
        columns: missions.columns,
        trips: built.trips,
        source: DatasetSource::Built,
        report: Some(built.report),
    })
}

/// Raw tables modified after the cache was written.
pub fn stale_inputs<'a>(cache_path: &Path, raw: &'a RawPaths) -> Vec<&'a Path> {
    let Some(cache_time) = modified(cache_path) else {
        return Vec::new();
    };

    raw.iter()
        .filter(|path| match modified(path) {
            Some(raw_time) => raw_time > cache_time,
            None => {
                debug!(raw = %path.display(), "Raw table not readable for staleness check");
                false
            }
        })
        .collect()
}

fn modified(path: &Path) -> Option<SystemTime> {
    fs::metadata(path).and_then(|m| m.modified()).ok()
}
