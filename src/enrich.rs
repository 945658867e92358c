//! Joins missions with places and users.
//!
//! Lookups go through hash indexes built once per run. A mission whose place
//! or user cannot be found keeps `None` for the derived field instead of a
//! zero, so missing data never reads as a zero-emission trip.

use std::collections::HashMap;
use std::collections::hash_map::Entry;
use tracing::{debug, warn};

use crate::mode::resolve_placeholder_mode;
use crate::records::{EnrichedTrip, Place, Trip, User};

/// Distance lookup keyed by place id.
#[derive(Debug, Default)]
pub struct PlaceIndex {
    distances: HashMap<String, f64>,
}

impl PlaceIndex {
    /// Indexes `places`. On a duplicate id the first row wins.
    pub fn build(places: &[Place]) -> Self {
        let mut distances = HashMap::with_capacity(places.len());
        for place in places {
            match distances.entry(place.place_id.clone()) {
                Entry::Vacant(slot) => {
                    slot.insert(place.distance);
                }
                Entry::Occupied(_) => {
                    warn!(place_id = %place.place_id, "Duplicate place id, keeping first");
                }
            }
        }
        Self { distances }
    }

    pub fn distance(&self, place_id: &str) -> Option<f64> {
        self.distances.get(place_id).copied()
    }

    pub fn len(&self) -> usize {
        self.distances.len()
    }

    pub fn is_empty(&self) -> bool {
        self.distances.is_empty()
    }
}

/// Region lookup keyed by user id.
#[derive(Debug, Default)]
pub struct UserIndex {
    regions: HashMap<String, String>,
}

impl UserIndex {
    /// Indexes `users`. On a duplicate id the first row wins.
    pub fn build(users: &[User]) -> Self {
        let mut regions = HashMap::with_capacity(users.len());
        for user in users {
            match regions.entry(user.user_id.clone()) {
                Entry::Vacant(slot) => {
                    slot.insert(user.region.clone());
                }
                Entry::Occupied(_) => {
                    warn!(user_id = %user.user_id, "Duplicate user id, keeping first");
                }
            }
        }
        Self { regions }
    }

    pub fn region(&self, user_id: &str) -> Option<&str> {
        self.regions.get(user_id).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.regions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.regions.is_empty()
    }
}

/// Total emission of a trip: place distance × emission factor.
///
/// Returns `None` when `place_id` is not in the index.
pub fn emission_for_trip(places: &PlaceIndex, place_id: &str, factor: f64) -> Option<f64> {
    places.distance(place_id).map(|distance| distance * factor)
}

/// Region of the user who made a trip, or `None` if the user is unknown.
pub fn region_for_user<'a>(users: &'a UserIndex, user_id: &str) -> Option<&'a str> {
    users.region(user_id)
}

/// Counters describing how clean a join was.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct EnrichmentReport {
    pub trips: usize,
    pub missing_places: usize,
    pub missing_users: usize,
    pub resolved_placeholders: usize,
    /// Placeholders whose factor matched no known mode and fell back to plane.
    pub defaulted_placeholders: usize,
}

impl EnrichmentReport {
    pub fn is_clean(&self) -> bool {
        self.missing_places == 0 && self.missing_users == 0 && self.defaulted_placeholders == 0
    }
}

/// Enriched missions, in input order, plus the join report.
#[derive(Debug)]
pub struct Enrichment {
    pub trips: Vec<EnrichedTrip>,
    pub report: EnrichmentReport,
}

/// Computes emission and region for every trip and resolves `other` modes.
///
/// `trips` is left untouched; a new collection is returned.
pub fn enrich(trips: &[Trip], places: &PlaceIndex, users: &UserIndex) -> Enrichment {
    let mut report = EnrichmentReport {
        trips: trips.len(),
        ..Default::default()
    };

    let enriched = trips
        .iter()
        .map(|trip| {
            let emission = emission_for_trip(places, &trip.place_id, trip.co2);
            if emission.is_none() {
                report.missing_places += 1;
                warn!(place_id = %trip.place_id, user_id = %trip.user_id, "Distance not found");
            }

            let region = region_for_user(users, &trip.user_id).map(str::to_owned);
            if region.is_none() {
                report.missing_users += 1;
                warn!(user_id = %trip.user_id, "Region not found");
            }

            let mode = if trip.mode.is_placeholder() {
                let resolved = resolve_placeholder_mode(trip.co2);
                report.resolved_placeholders += 1;
                if resolved.is_defaulted() {
                    report.defaulted_placeholders += 1;
                    warn!(
                        co2 = trip.co2,
                        mode = %resolved.mode(),
                        "Emission factor matches no known mode, assuming plane"
                    );
                }
                resolved.mode()
            } else {
                trip.mode
            };

            EnrichedTrip::from_trip(trip, mode, emission, region)
        })
        .collect();

    debug!(?report, "Enrichment finished");

    Enrichment {
        trips: enriched,
        report,
    }
}
