//! Tab-separated table parsing.

use anyhow::{Context, Result};
use csv::{ReaderBuilder, StringRecord, Trim};
use serde::de::DeserializeOwned;
use std::fs::File;
use std::io::Read;
use std::path::Path;
use tracing::debug;

use crate::records::{DERIVED_COLUMNS, MissionRow, MissionTable, is_typed_column};

/// Builds a reader for a tab-separated table with a header row.
pub fn tsv_reader<R: Read>(reader: R) -> csv::Reader<R> {
    ReaderBuilder::new()
        .delimiter(b'\t')
        .has_headers(true)
        .trim(Trim::All)
        .from_reader(reader)
}

/// Decodes every row of a tab-separated table into `T`.
///
/// # Errors
///
/// Returns an error on the first row that does not match `T`; the message
/// carries the row position reported by the csv reader.
pub fn parse_table<T: DeserializeOwned>(bytes: &[u8]) -> Result<Vec<T>> {
    read_rows(bytes)
}

/// Opens `path` and decodes it with [`parse_table`] semantics.
pub fn read_table<T: DeserializeOwned>(path: &Path) -> Result<Vec<T>> {
    let file =
        File::open(path).with_context(|| format!("failed to open table '{}'", path.display()))?;
    let rows = read_rows(file).with_context(|| format!("failed to parse '{}'", path.display()))?;
    debug!(path = %path.display(), rows = rows.len(), "Table loaded");
    Ok(rows)
}

/// Decodes a mission-shaped table, keeping its header and the values of
/// every column `T` has no field for.
///
/// The derived `emissions`/`regions` columns of a cache are left out of
/// [`MissionTable::columns`] and of each row's extra values.
pub fn parse_missions<T: MissionRow>(bytes: &[u8]) -> Result<MissionTable<T>> {
    read_mission_rows(bytes)
}

/// Opens `path` and decodes it with [`parse_missions`] semantics.
pub fn read_missions<T: MissionRow>(path: &Path) -> Result<MissionTable<T>> {
    let file =
        File::open(path).with_context(|| format!("failed to open table '{}'", path.display()))?;
    let table: MissionTable<T> =
        read_mission_rows(file).with_context(|| format!("failed to parse '{}'", path.display()))?;
    debug!(
        path = %path.display(),
        rows = table.rows.len(),
        columns = table.columns.len(),
        "Mission table loaded"
    );
    Ok(table)
}

/// Reads `path` as an untyped table and returns its row count.
///
/// Used for inputs whose columns the pipeline does not consume but which
/// must still exist and be well-formed.
pub fn count_rows(path: &Path) -> Result<usize> {
    let file =
        File::open(path).with_context(|| format!("failed to open table '{}'", path.display()))?;
    let mut rdr = tsv_reader(file);
    let mut record = StringRecord::new();
    let mut count = 0;
    while rdr
        .read_record(&mut record)
        .with_context(|| format!("failed to parse '{}'", path.display()))?
    {
        count += 1;
    }
    Ok(count)
}

fn read_rows<T: DeserializeOwned, R: Read>(reader: R) -> Result<Vec<T>> {
    let mut rdr = tsv_reader(reader);
    let mut rows = Vec::new();

    for result in rdr.deserialize() {
        let record: T = result?;
        rows.push(record);
    }

    Ok(rows)
}

fn read_mission_rows<T: MissionRow, R: Read>(reader: R) -> Result<MissionTable<T>> {
    let mut rdr = tsv_reader(reader);
    let headers = rdr.headers()?.clone();
    let columns: Vec<String> = headers
        .iter()
        .filter(|h| !DERIVED_COLUMNS.contains(h))
        .map(str::to_owned)
        .collect();

    let mut rows = Vec::new();
    for result in rdr.records() {
        let record = result?;
        let mut row: T = record.deserialize(Some(&headers))?;
        row.set_extra(
            headers
                .iter()
                .zip(record.iter())
                .filter(|(h, _)| !is_typed_column(h) && !DERIVED_COLUMNS.contains(h))
                .map(|(_, value)| value.to_owned())
                .collect(),
        );
        rows.push(row);
    }

    Ok(MissionTable { columns, rows })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mode::TravelMode;
    use crate::records::{EnrichedTrip, Place, Trip, User};

    #[test]
    fn test_parse_places_with_hash_header() {
        let bytes = b"#place_id\tdistance\n1\t120.5\n2\t8\n";
        let places: Vec<Place> = parse_table(bytes).unwrap();

        assert_eq!(places.len(), 2);
        assert_eq!(places[0].place_id, "1");
        assert_eq!(places[0].distance, 120.5);
        assert_eq!(places[1].distance, 8.0);
    }

    #[test]
    fn test_parse_users() {
        let bytes = b"#user_id\tregion\n10\tNorth\n11\tDorne\n";
        let users: Vec<User> = parse_table(bytes).unwrap();

        assert_eq!(users[1].user_id, "11");
        assert_eq!(users[1].region, "Dorne");
    }

    #[test]
    fn test_parse_missions_keeps_extra_columns() {
        let bytes = b"#mission_id\tplace_id\tuser_id\tmode\tco2\tdate\tnote\n\
                      1\t4\t10\tother\t0.075\t2020-01-05\tlate\n";
        let table: MissionTable<Trip> = parse_missions(bytes).unwrap();

        assert_eq!(
            table.columns,
            vec!["#mission_id", "place_id", "user_id", "mode", "co2", "date", "note"]
        );
        assert_eq!(table.rows.len(), 1);
        assert_eq!(table.rows[0].place_id, "4");
        assert_eq!(table.rows[0].mode, TravelMode::Other);
        assert_eq!(table.rows[0].co2, 0.075);
        assert_eq!(table.rows[0].extra, vec!["1", "late"]);
    }

    #[test]
    fn test_parse_cache_drops_derived_columns() {
        let bytes = b"#mission_id\tplace_id\tuser_id\tmode\tco2\tdate\temissions\tregions\n\
                      1\t4\t10\tpublic\t0.075\t2020-01-05\t7.5\tNorth\n";
        let table: MissionTable<EnrichedTrip> = parse_missions(bytes).unwrap();

        assert_eq!(table.columns.last().map(String::as_str), Some("date"));
        assert_eq!(table.rows[0].extra, vec!["1"]);
        assert_eq!(table.rows[0].emission, Some(7.5));
        assert_eq!(table.rows[0].region.as_deref(), Some("North"));
    }

    #[test]
    fn test_parse_unknown_mode_fails() {
        let bytes = b"place_id\tuser_id\tmode\tco2\tdate\n4\t10\tboat\t0.1\t2020-01-05\n";
        let result: Result<MissionTable<Trip>> = parse_missions(bytes);
        assert!(result.is_err());
    }

    #[test]
    fn test_parse_missing_mission_column_fails() {
        let bytes = b"place_id\tuser_id\tmode\tdate\n4\t10\tcar\t2020-01-05\n";
        let result: Result<MissionTable<Trip>> = parse_missions(bytes);
        assert!(result.is_err());
    }

    #[test]
    fn test_parse_rejects_non_finite_distance() {
        for bad in ["NaN", "inf", "-inf"] {
            let text = format!("#place_id\tdistance\n1\t{bad}\n");
            let result: Result<Vec<Place>> = parse_table(text.as_bytes());
            assert!(result.is_err(), "{bad} was accepted");
        }
    }

    #[test]
    fn test_parse_rejects_non_finite_factor() {
        let bytes = b"place_id\tuser_id\tmode\tco2\tdate\n4\t10\tcar\tNaN\t2020-01-05\n";
        let result: Result<MissionTable<Trip>> = parse_missions(bytes);
        assert!(result.is_err());
    }

    #[test]
    fn test_parse_empty_table() {
        let bytes = b"#place_id\tdistance\n";
        let places: Vec<Place> = parse_table(bytes).unwrap();
        assert!(places.is_empty());
    }

    #[test]
    fn test_read_table_missing_file_names_path() {
        let path = std::env::temp_dir().join("mission_emissions_does_not_exist.tsv");
        let err = read_table::<Place>(&path).unwrap_err();
        assert!(format!("{err:#}").contains("mission_emissions_does_not_exist.tsv"));
    }
}
