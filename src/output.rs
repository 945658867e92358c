//! Persistence for the enriched dataset and chart data.
//!
//! The cache is a tab-separated file with a header row, even though it is
//! named `missions.csv`. Its columns are those of `missions.tsv`, in file
//! order, followed by `emissions` and `regions`.

use anyhow::{Context, Result, bail};
use csv::WriterBuilder;
use serde::Serialize;
use std::fs;
use std::path::Path;
use tracing::{debug, info, warn};

use crate::parser::read_missions;
use crate::records::{DERIVED_COLUMNS, EnrichedTrip, MissionTable};

/// Writes `trips` to `path` as a tab-separated table headed by `columns`
/// plus the derived columns.
///
/// The rows go to a sibling temporary file which is then renamed over
/// `path`, so an interrupted write never leaves a truncated cache behind.
/// The temporary file is removed if writing fails.
pub fn write_cache(path: &Path, columns: &[String], trips: &[EnrichedTrip]) -> Result<()> {
    ensure_parent(path)?;
    let tmp_path = path.with_extension("csv.tmp");
    debug!(path = %path.display(), rows = trips.len(), "Writing cache");

    if let Err(e) = write_rows(&tmp_path, columns, trips) {
        if let Err(cleanup) = fs::remove_file(&tmp_path) {
            warn!(path = %tmp_path.display(), error = %cleanup, "Failed to remove partial cache");
        }
        return Err(e);
    }

    fs::rename(&tmp_path, path)
        .with_context(|| format!("failed to move cache into '{}'", path.display()))?;

    info!(path = %path.display(), rows = trips.len(), "Cache written");
    Ok(())
}

fn write_rows(tmp_path: &Path, columns: &[String], trips: &[EnrichedTrip]) -> Result<()> {
    let mut writer = WriterBuilder::new()
        .delimiter(b'\t')
        .has_headers(false) // header written explicitly so an empty cache still has one
        .from_path(tmp_path)
        .with_context(|| format!("failed to create '{}'", tmp_path.display()))?;

    writer.write_record(
        columns
            .iter()
            .map(String::as_str)
            .chain(DERIVED_COLUMNS.iter().copied()),
    )?;
    for trip in trips {
        writer.write_record(cache_row(columns, trip)?)?;
    }
    writer.flush()?;
    Ok(())
}

/// Lays out one cache row: typed columns from the trip's fields, the other
/// mission columns from its extra values, then emission and region.
fn cache_row(columns: &[String], trip: &EnrichedTrip) -> Result<Vec<String>> {
    let mut extra = trip.extra.iter();
    let mut row = Vec::with_capacity(columns.len() + DERIVED_COLUMNS.len());

    for column in columns {
        let value = match trip.typed_field(column) {
            Some(value) => value,
            None => extra
                .next()
                .cloned()
                .with_context(|| format!("mission row has no value for column '{column}'"))?,
        };
        row.push(value);
    }
    if extra.next().is_some() {
        bail!("mission row has more values than there are mission columns");
    }

    row.push(trip.emission.map(|e| e.to_string()).unwrap_or_default());
    row.push(trip.region.clone().unwrap_or_default());
    Ok(row)
}

/// Reads a cache written by [`write_cache`], as is.
pub fn read_cache(path: &Path) -> Result<MissionTable<EnrichedTrip>> {
    read_missions(path).with_context(|| format!("failed to read cache '{}'", path.display()))
}

/// Serializes `value` as pretty-printed JSON into `path`.
pub fn write_json(path: &Path, value: &impl Serialize) -> Result<()> {
    ensure_parent(path)?;
    let body = serde_json::to_vec_pretty(value)?;
    fs::write(path, body).with_context(|| format!("failed to write '{}'", path.display()))?;
    info!(path = %path.display(), "JSON written");
    Ok(())
}

fn ensure_parent(path: &Path) -> Result<()> {
    match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => fs::create_dir_all(parent)
            .with_context(|| format!("failed to create directory '{}'", parent.display())),
        _ => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mode::TravelMode;
    use crate::records::{MISSION_COLUMNS, trip_date};
    use std::env;
    use std::path::PathBuf;

    fn temp_path(name: &str) -> PathBuf {
        env::temp_dir().join(name)
    }

    fn default_columns() -> Vec<String> {
        MISSION_COLUMNS.iter().map(|c| c.to_string()).collect()
    }

    fn sample() -> Vec<EnrichedTrip> {
        vec![
            EnrichedTrip {
                place_id: "1".to_string(),
                user_id: "10".to_string(),
                mode: TravelMode::Train,
                co2: 0.01214,
                date: trip_date::parse("2020-01-01").unwrap(),
                emission: Some(1.214),
                region: Some("Riverlands".to_string()),
                extra: Vec::new(),
            },
            EnrichedTrip {
                place_id: "99".to_string(),
                user_id: "77".to_string(),
                mode: TravelMode::Plane,
                co2: 0.3,
                date: trip_date::parse("2020-01-02 10:15:00").unwrap(),
                emission: None,
                region: None,
                extra: Vec::new(),
            },
        ]
    }

    #[test]
    fn test_write_cache_layout() {
        let path = temp_path("mission_emissions_test_layout.csv");
        let _ = fs::remove_file(&path);

        write_cache(&path, &default_columns(), &sample()).unwrap();

        let content = fs::read_to_string(&path).unwrap();
        let lines: Vec<_> = content.lines().collect();
        assert_eq!(lines[0], "place_id\tuser_id\tmode\tco2\tdate\temissions\tregions");
        assert_eq!(lines[1], "1\t10\ttrain\t0.01214\t2020-01-01\t1.214\tRiverlands");
        assert_eq!(lines[2], "99\t77\tplane\t0.3\t2020-01-02 10:15:00\t\t");
        assert_eq!(lines.len(), 3);

        fs::remove_file(&path).unwrap();
    }

    #[test]
    fn test_write_cache_keeps_every_mission_column() {
        let path = temp_path("mission_emissions_test_all_columns.csv");
        let _ = fs::remove_file(&path);

        let columns: Vec<String> = ["#mission_id", "place_id", "user_id", "mode", "co2", "date", "note"]
            .iter()
            .map(|c| c.to_string())
            .collect();
        let mut trips = sample();
        trips[0].extra = vec!["m-1".to_string(), "first".to_string()];
        trips[1].extra = vec!["m-2".to_string(), String::new()];

        write_cache(&path, &columns, &trips).unwrap();

        let content = fs::read_to_string(&path).unwrap();
        let lines: Vec<_> = content.lines().collect();
        assert_eq!(
            lines[0],
            "#mission_id\tplace_id\tuser_id\tmode\tco2\tdate\tnote\temissions\tregions"
        );
        assert_eq!(lines[1], "m-1\t1\t10\ttrain\t0.01214\t2020-01-01\tfirst\t1.214\tRiverlands");

        let loaded = read_cache(&path).unwrap();
        assert_eq!(loaded.columns, columns);
        assert_eq!(loaded.rows, trips);

        fs::remove_file(&path).unwrap();
    }

    #[test]
    fn test_cache_reads_back_missing_values_as_none() {
        let path = temp_path("mission_emissions_test_read_back.csv");
        let _ = fs::remove_file(&path);

        let trips = sample();
        write_cache(&path, &default_columns(), &trips).unwrap();
        let loaded = read_cache(&path).unwrap();

        assert_eq!(loaded.rows, trips);
        assert_eq!(loaded.rows[1].emission, None);
        assert_eq!(loaded.rows[1].region, None);

        fs::remove_file(&path).unwrap();
    }

    #[test]
    fn test_empty_cache_keeps_header() {
        let path = temp_path("mission_emissions_test_empty.csv");
        let _ = fs::remove_file(&path);

        write_cache(&path, &default_columns(), &[]).unwrap();

        let content = fs::read_to_string(&path).unwrap();
        assert_eq!(content.lines().count(), 1);
        let loaded = read_cache(&path).unwrap();
        assert!(loaded.rows.is_empty());
        assert_eq!(loaded.columns, default_columns());

        fs::remove_file(&path).unwrap();
    }

    #[test]
    fn test_failed_write_leaves_no_temp_file() {
        let path = temp_path("mission_emissions_test_failed_write.csv");
        let tmp = path.with_extension("csv.tmp");
        let _ = fs::remove_file(&path);
        let _ = fs::remove_file(&tmp);

        // An extra value with no column to hold it
        let mut trips = sample();
        trips[1].extra = vec!["stray".to_string()];

        assert!(write_cache(&path, &default_columns(), &trips).is_err());
        assert!(!tmp.exists());
        assert!(!path.exists());
    }

    #[test]
    fn test_write_json() {
        let path = temp_path("mission_emissions_test.json");
        let _ = fs::remove_file(&path);

        write_json(&path, &serde_json::json!({ "regions": ["North"] })).unwrap();

        let value: serde_json::Value =
            serde_json::from_str(&fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(value["regions"][0], "North");

        fs::remove_file(&path).unwrap();
    }
}
