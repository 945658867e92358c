//! Locations of the input tables and the cache.

use std::path::{Path, PathBuf};

use crate::loader::RawPaths;

/// Data directory used when neither `--data-dir` nor `DATA_DIR` is set.
pub const DEFAULT_DATA_DIR: &str = "Data";

pub const COUNTRIES_FILE: &str = "countries.tsv";
pub const MISSIONS_FILE: &str = "missions.tsv";
pub const PLACES_FILE: &str = "places.tsv";
pub const USERS_FILE: &str = "users.tsv";
pub const CACHE_FILE: &str = "missions.csv";

/// Every file the pipeline reads or writes, rooted at one data directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DataPaths {
    pub cache: PathBuf,
    pub raw: RawPaths,
}

impl DataPaths {
    pub fn from_dir(dir: impl AsRef<Path>) -> Self {
        let dir = dir.as_ref();
        DataPaths {
            cache: dir.join(CACHE_FILE),
            raw: RawPaths {
                countries: dir.join(COUNTRIES_FILE),
                missions: dir.join(MISSIONS_FILE),
                places: dir.join(PLACES_FILE),
                users: dir.join(USERS_FILE),
            },
        }
    }

    /// Picks the data directory: explicit override, then `DATA_DIR`, then
    /// [`DEFAULT_DATA_DIR`].
    pub fn resolve(override_dir: Option<&str>) -> Self {
        let dir = override_dir
            .map(str::to_owned)
            .or_else(|| std::env::var("DATA_DIR").ok())
            .unwrap_or_else(|| DEFAULT_DATA_DIR.to_string());
        Self::from_dir(dir)
    }
}
