use crate::analyzers::palette::region_color;
use crate::analyzers::selection::ModeSelection;
use crate::analyzers::types::{RegionSeries, RegionTotal, SeriesPoint};
use crate::analyzers::utility::running_sum;
use crate::records::EnrichedTrip;
use std::collections::BTreeMap;
use tracing::debug;

/// Groups the trips whose mode is selected by region label.
///
/// Trips missing a region or an emission cannot be placed on a chart and are
/// left out; their count is logged.
fn group_by_region<'a>(
    trips: &'a [EnrichedTrip],
    selected: &ModeSelection,
) -> BTreeMap<&'a str, Vec<&'a EnrichedTrip>> {
    let mut groups: BTreeMap<&str, Vec<&EnrichedTrip>> = BTreeMap::new();
    let mut unplaced = 0usize;

    for trip in trips.iter().filter(|t| selected.contains(t.mode)) {
        match (trip.region.as_deref(), trip.emission) {
            (Some(region), Some(_)) => groups.entry(region).or_default().push(trip),
            _ => unplaced += 1,
        }
    }

    if unplaced > 0 {
        debug!(unplaced, "Trips without region or emission left out of the series");
    }

    groups
}

/// Computes, per region, the running sum of emissions in date order.
///
/// Only trips whose mode is in `selected` contribute. Within a region, trips
/// on the same date keep their input order. Series are returned sorted by
/// region name. Every call recomputes from scratch.
pub fn cumulative_emissions(trips: &[EnrichedTrip], selected: &ModeSelection) -> Vec<RegionSeries> {
    group_by_region(trips, selected)
        .into_iter()
        .map(|(region, mut members)| {
            members.sort_by_key(|t| t.date);

            let emissions: Vec<f64> = members.iter().filter_map(|t| t.emission).collect();
            let points = members
                .iter()
                .zip(running_sum(&emissions))
                .map(|(trip, cumulative)| SeriesPoint {
                    date: trip.date,
                    cumulative,
                })
                .collect();

            RegionSeries {
                region: region.to_string(),
                color: region_color(region),
                points,
            }
        })
        .collect()
}

/// Total emissions and trip count per region for the selected modes.
pub fn region_totals(trips: &[EnrichedTrip], selected: &ModeSelection) -> Vec<RegionTotal> {
    group_by_region(trips, selected)
        .into_iter()
        .map(|(region, members)| RegionTotal {
            region: region.to_string(),
            trips: members.len(),
            total: members.iter().filter_map(|t| t.emission).sum(),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mode::TravelMode;
    use crate::records::trip_date;

    fn trip(date: &str, region: Option<&str>, mode: TravelMode, emission: Option<f64>) -> EnrichedTrip {
        EnrichedTrip {
            place_id: "1".to_string(),
            user_id: "1".to_string(),
            mode,
            co2: 0.1,
            date: trip_date::parse(date).unwrap(),
            emission,
            region: region.map(str::to_string),
            extra: Vec::new(),
        }
    }

    fn cumulative(series: &RegionSeries) -> Vec<f64> {
        series.points.iter().map(|p| p.cumulative).collect()
    }

    #[test]
    fn test_running_sum_per_region() {
        let trips = vec![
            trip("2020-01-01", Some("North"), TravelMode::Car, Some(2.0)),
            trip("2020-01-02", Some("Vale"), TravelMode::Car, Some(100.0)),
            trip("2020-01-03", Some("North"), TravelMode::Train, Some(3.0)),
            trip("2020-01-04", Some("North"), TravelMode::Plane, Some(5.0)),
        ];

        let series = cumulative_emissions(&trips, &ModeSelection::all());

        assert_eq!(series.len(), 2);
        assert_eq!(series[0].region, "North");
        assert_eq!(series[0].color, Some("#D55E00"));
        assert_eq!(cumulative(&series[0]), vec![2.0, 5.0, 10.0]);
        assert_eq!(series[1].region, "Vale");
        assert_eq!(series[1].total(), 100.0);
    }

    #[test]
    fn test_orders_by_date_within_region() {
        let trips = vec![
            trip("2020-02-01", Some("Reach"), TravelMode::Car, Some(5.0)),
            trip("2020-01-01", Some("Reach"), TravelMode::Car, Some(2.0)),
            trip("2020-01-15", Some("Reach"), TravelMode::Car, Some(3.0)),
        ];

        let series = cumulative_emissions(&trips, &ModeSelection::all());

        assert_eq!(cumulative(&series[0]), vec![2.0, 5.0, 10.0]);
        let dates: Vec<_> = series[0].points.iter().map(|p| p.date).collect();
        assert!(dates.windows(2).all(|w| w[0] <= w[1]));
    }

    #[test]
    fn test_unselected_modes_contribute_nothing() {
        let trips = vec![
            trip("2020-01-01", Some("Dorne"), TravelMode::Car, Some(2.0)),
            trip("2020-01-02", Some("Dorne"), TravelMode::Plane, Some(500.0)),
            trip("2020-01-03", Some("Dorne"), TravelMode::Car, Some(3.0)),
            trip("2020-01-04", Some("Vale"), TravelMode::Plane, Some(7.0)),
        ];
        let selected: ModeSelection = "car".parse().unwrap();

        let series = cumulative_emissions(&trips, &selected);

        assert_eq!(series.len(), 1);
        assert_eq!(series[0].region, "Dorne");
        assert_eq!(cumulative(&series[0]), vec![2.0, 5.0]);
    }

    #[test]
    fn test_empty_selection_yields_no_series() {
        let trips = vec![trip("2020-01-01", Some("Dorne"), TravelMode::Car, Some(2.0))];
        assert!(cumulative_emissions(&trips, &ModeSelection::none()).is_empty());
    }

    #[test]
    fn test_trips_without_region_or_emission_are_left_out() {
        let trips = vec![
            trip("2020-01-01", None, TravelMode::Car, Some(2.0)),
            trip("2020-01-02", Some("North"), TravelMode::Car, None),
            trip("2020-01-03", Some("North"), TravelMode::Car, Some(4.0)),
        ];

        let series = cumulative_emissions(&trips, &ModeSelection::all());

        assert_eq!(series.len(), 1);
        assert_eq!(cumulative(&series[0]), vec![4.0]);
    }

    #[test]
    fn test_recompute_after_selection_change() {
        let trips = vec![
            trip("2020-01-01", Some("North"), TravelMode::Car, Some(1.0)),
            trip("2020-01-02", Some("North"), TravelMode::Train, Some(2.0)),
        ];
        let mut selected = ModeSelection::all();
        assert_eq!(cumulative(&cumulative_emissions(&trips, &selected)[0]), vec![1.0, 3.0]);

        selected.toggle(TravelMode::Car);
        assert_eq!(cumulative(&cumulative_emissions(&trips, &selected)[0]), vec![2.0]);
    }

    #[test]
    fn test_region_totals() {
        let trips = vec![
            trip("2020-01-01", Some("North"), TravelMode::Car, Some(2.0)),
            trip("2020-01-02", Some("North"), TravelMode::Car, Some(3.0)),
            trip("2020-01-03", Some("Unknown Land"), TravelMode::Plane, Some(1.5)),
        ];

        let totals = region_totals(&trips, &ModeSelection::all());

        assert_eq!(
            totals,
            vec![
                RegionTotal {
                    region: "North".to_string(),
                    trips: 2,
                    total: 5.0,
                },
                RegionTotal {
                    region: "Unknown Land".to_string(),
                    trips: 1,
                    total: 1.5,
                },
            ]
        );
    }
}
