//! Ranked reports over the flight tables.
//!
//! Counting and ranking are pure; code-to-name resolution goes through the
//! [`Resolver`] passed in.

use tracing::warn;

use crate::analyzers::rank::Tally;
use crate::analyzers::types::{
    ArrivalRow, DepartureRow, DestinationFrequency, FacilitiesReport, Field, FlightRow,
    RankedEntry, RankedReport,
};
use crate::services::lookup::Resolver;

/// Counts `group_by` over rows whose `state_field` equals `state_value` and
/// keeps the `top_n` most frequent keys. Empty keys are never counted.
pub fn rank_rows<R: FlightRow>(
    rows: &[R],
    state_field: Field,
    state_value: &str,
    group_by: Field,
    top_n: usize,
) -> Vec<(String, usize)> {
    let selected = rows
        .iter()
        .filter(|row| row.field(state_field) == Some(state_value));
    count_keys(selected.filter_map(|row| row.field(group_by))).top(top_n)
}

/// [`rank_rows`] with each airline code resolved to its public name.
pub async fn filter_ranked<R: FlightRow>(
    rows: &[R],
    state_field: Field,
    state_value: &str,
    group_by: Field,
    top_n: usize,
    resolver: &dyn Resolver,
) -> RankedReport {
    if rows.is_empty() {
        warn!(state_value, "Table provided is empty. No analysis provided.");
        return RankedReport::empty(group_by.column_name(), "count");
    }

    let ranked = rank_rows(rows, state_field, state_value, group_by, top_n);

    let mut entries = Vec::with_capacity(ranked.len());
    for (code, count) in ranked {
        entries.push(RankedEntry {
            name: resolver.airline_name(&code).await,
            count,
        });
    }

    RankedReport {
        key_column: group_by.column_name(),
        count_column: "count",
        entries,
    }
}

/// The `top_n` most visited destinations, resolved to city names.
pub async fn find_popular_destinations(
    destinations: &DestinationFrequency,
    top_n: usize,
    resolver: &dyn Resolver,
) -> RankedReport {
    if destinations.is_empty() {
        warn!("Destination frequency is empty. No analysis provided.");
        return RankedReport::empty("destination", "flights");
    }

    let mut entries = Vec::new();
    for (iata, count) in destinations.0.top(top_n) {
        entries.push(RankedEntry {
            name: resolver.city_name(&iata).await,
            count,
        });
    }

    RankedReport {
        key_column: "destination",
        count_column: "flights",
        entries,
    }
}

/// Busiest belts, gates, terminals and airlines over `window`.
///
/// Each sub-report is computed only when its source table has rows; otherwise
/// it stays an empty placeholder. Belts, gates and terminals are reported as
/// raw identifiers; airlines are resolved to public names.
pub async fn find_busiest_facilities(
    arrivals: &[ArrivalRow],
    departures: &[DepartureRow],
    top_n: usize,
    window: &str,
    resolver: &dyn Resolver,
) -> FacilitiesReport {
    let mut report = FacilitiesReport::empty(window);

    if !arrivals.is_empty() {
        let belts = count_keys(
            arrivals
                .iter()
                .flat_map(|row| row.baggage_claim_belts.iter()),
        );
        report.busy_belts.entries = RankedEntry::from_pairs(belts.top(top_n));

        report.busiest_arrival_terminals.entries = RankedEntry::from_pairs(count_field(
            arrivals,
            Field::Terminal,
            top_n,
        ));
    }

    if !departures.is_empty() {
        report.busy_gates.entries =
            RankedEntry::from_pairs(count_field(departures, Field::Gate, top_n));

        report.busiest_departure_terminals.entries = RankedEntry::from_pairs(count_field(
            departures,
            Field::Terminal,
            top_n,
        ));
    }

    if !arrivals.is_empty() || !departures.is_empty() {
        let mut airlines = airline_tally(arrivals);
        airlines.merge(&airline_tally(departures));

        for (code, count) in airlines.top(top_n) {
            report.busiest_airlines.entries.push(RankedEntry {
                name: resolver.airline_name(&code).await,
                count,
            });
        }
    }

    report
}

fn count_field<R: FlightRow>(rows: &[R], field: Field, top_n: usize) -> Vec<(String, usize)> {
    count_keys(rows.iter().filter_map(|row| row.field(field))).top(top_n)
}

fn airline_tally<R: FlightRow>(rows: &[R]) -> Tally {
    count_keys(rows.iter().filter_map(|row| row.field(Field::Airline)))
}

/// Group-counts `keys`, skipping empty strings.
fn count_keys<I, S>(keys: I) -> Tally
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    keys.into_iter()
        .filter(|key| !AsRef::<str>::as_ref(key).is_empty())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;

    /// Resolves codes by prefixing them, so resolution is visible in asserts.
    struct PrefixResolver;

    #[async_trait]
    impl Resolver for PrefixResolver {
        async fn airline_name(&self, code: &str) -> String {
            format!("airline:{code}")
        }

        async fn city_name(&self, iata: &str) -> String {
            format!("city:{iata}")
        }
    }

    fn arrival(airline: &str, state: &str, terminal: &str, belts: &[&str]) -> ArrivalRow {
        ArrivalRow {
            flight_name: format!("{airline}100"),
            airline: airline.into(),
            terminal: terminal.into(),
            state: state.into(),
            estimated_landing_time: "t1".into(),
            actual_landing_time: "t2".into(),
            expected_time_on_belt: "t3".into(),
            baggage_claim_belts: belts.iter().map(|b| b.to_string()).collect(),
        }
    }

    fn departure(airline: &str, gate: &str, terminal: &str) -> DepartureRow {
        DepartureRow {
            flight_name: format!("{airline}200"),
            airline: airline.into(),
            terminal: terminal.into(),
            state: "DEL".into(),
            gate: gate.into(),
            expected_time_gate_open: "t1".into(),
            expected_time_boarding: "t2".into(),
            expected_time_gate_closing: "t3".into(),
            actual_off_block_time: "t4".into(),
        }
    }

    #[tokio::test]
    async fn test_filter_ranked_top_landed_airline() {
        let rows = vec![
            arrival("KLM", "LND", "1", &[]),
            arrival("KLM", "LND", "1", &[]),
            arrival("DL", "DIV", "1", &[]),
        ];

        let report =
            filter_ranked(&rows, Field::State, "LND", Field::Airline, 1, &PrefixResolver).await;

        assert_eq!(report.key_column, "airline");
        assert_eq!(
            report.entries,
            vec![RankedEntry {
                name: "airline:KLM".into(),
                count: 2
            }]
        );
    }

    #[tokio::test]
    async fn test_filter_ranked_empty_table() {
        let rows: Vec<ArrivalRow> = vec![];
        let report =
            filter_ranked(&rows, Field::State, "LND", Field::Airline, 5, &PrefixResolver).await;
        assert!(report.is_empty());
        assert_eq!(report.key_column, "airline");
    }

    #[tokio::test]
    async fn test_filter_ranked_no_matching_state() {
        let rows = vec![arrival("KLM", "LND", "1", &[])];
        let report =
            filter_ranked(&rows, Field::State, "DIV", Field::Airline, 5, &PrefixResolver).await;
        assert!(report.is_empty());
    }

    #[test]
    fn test_rank_rows_tie_break_is_first_seen() {
        let rows = vec![
            departure("AF", "D1", "1"),
            departure("KLM", "D2", "1"),
            departure("KLM", "D3", "1"),
            departure("AF", "D4", "1"),
        ];
        let ranked = rank_rows(&rows, Field::State, "DEL", Field::Airline, 5);
        assert_eq!(ranked, vec![("AF".to_string(), 2), ("KLM".to_string(), 2)]);
    }

    #[tokio::test]
    async fn test_popular_destinations() {
        let freq = DestinationFrequency(
            ["LHR", "CDG", "LHR", "JFK", "LHR", "CDG"]
                .into_iter()
                .collect(),
        );

        let report = find_popular_destinations(&freq, 2, &PrefixResolver).await;

        assert_eq!(report.key_column, "destination");
        assert_eq!(report.count_column, "flights");
        assert_eq!(
            report.entries,
            vec![
                RankedEntry {
                    name: "city:LHR".into(),
                    count: 3
                },
                RankedEntry {
                    name: "city:CDG".into(),
                    count: 2
                },
            ]
        );
    }

    #[tokio::test]
    async fn test_popular_destinations_empty() {
        let empty = DestinationFrequency::default();
        let report = find_popular_destinations(&empty, 10, &PrefixResolver).await;
        assert!(report.is_empty());
    }

    #[tokio::test]
    async fn test_busiest_facilities_both_empty() {
        let report = find_busiest_facilities(&[], &[], 10, "w1", &PrefixResolver).await;

        for table in report.tables() {
            assert!(table.is_empty());
            assert_eq!(table.window, "w1");
        }
        let names: Vec<_> = report.tables().iter().map(|t| t.name).collect();
        assert_eq!(
            names,
            vec![
                "busy_belts",
                "busy_gates",
                "busiest_arrivals_terminals",
                "busiest_departure_terminals",
                "busiest_airlines"
            ]
        );
    }

    #[tokio::test]
    async fn test_busiest_facilities_counts() {
        let arrivals = vec![
            arrival("KLM", "LND", "1", &["11", "12"]),
            arrival("DL", "LND", "1", &["11"]),
            arrival("", "LND", "3", &["14"]),
        ];
        let departures = vec![
            departure("DL", "D7", "2"),
            departure("DL", "D7", "2"),
            departure("KLM", "B3", "1"),
        ];

        let report =
            find_busiest_facilities(&arrivals, &departures, 2, "w", &PrefixResolver).await;

        assert_eq!(
            report.busy_belts.entries[0],
            RankedEntry {
                name: "11".into(),
                count: 2
            }
        );
        assert_eq!(report.busy_belts.entries.len(), 2);
        assert_eq!(report.busy_gates.entries[0].name, "D7");
        assert_eq!(report.busy_gates.entries[0].count, 2);
        assert_eq!(report.busiest_arrival_terminals.entries[0].name, "1");
        assert_eq!(report.busiest_departure_terminals.entries[0].name, "2");

        // DL: 1 arrival + 2 departures, KLM: 1 + 1, empty airline excluded
        assert_eq!(
            report.busiest_airlines.entries,
            vec![
                RankedEntry {
                    name: "airline:DL".into(),
                    count: 3
                },
                RankedEntry {
                    name: "airline:KLM".into(),
                    count: 2
                },
            ]
        );
    }

    #[tokio::test]
    async fn test_busiest_facilities_only_departures() {
        let departures = vec![departure("KLM", "D1", "1")];
        let report = find_busiest_facilities(&[], &departures, 5, "w", &PrefixResolver).await;

        assert!(report.busy_belts.is_empty());
        assert!(report.busiest_arrival_terminals.is_empty());
        assert_eq!(report.busy_gates.entries.len(), 1);
        assert_eq!(report.busiest_airlines.entries[0].name, "airline:KLM");
    }

    #[tokio::test]
    async fn test_empty_values_are_never_ranked() {
        let arrivals = vec![
            arrival("", "LND", "", &["", "11"]),
            arrival("", "LND", "", &[""]),
            arrival("KLM", "LND", "1", &[""]),
        ];
        let departures = vec![departure("KLM", "", ""), departure("DL", "", "2")];

        let landed =
            filter_ranked(&arrivals, Field::State, "LND", Field::Airline, 5, &PrefixResolver).await;
        assert_eq!(
            landed.entries,
            vec![RankedEntry {
                name: "airline:KLM".into(),
                count: 1
            }]
        );

        let report =
            find_busiest_facilities(&arrivals, &departures, 5, "w", &PrefixResolver).await;
        assert_eq!(report.busy_belts.entries, RankedEntry::from_pairs(vec![("11".into(), 1)]));
        assert!(report.busy_gates.is_empty());
        assert_eq!(
            report.busiest_arrival_terminals.entries,
            RankedEntry::from_pairs(vec![("1".into(), 1)])
        );
        assert_eq!(
            report.busiest_departure_terminals.entries,
            RankedEntry::from_pairs(vec![("2".into(), 1)])
        );
        assert!(report.tables().iter().all(|t| t.entries.iter().all(|e| !e.name.is_empty())));
    }

    #[tokio::test]
    async fn test_aggregation_is_repeatable() {
        let arrivals = vec![
            arrival("KLM", "LND", "1", &["11"]),
            arrival("DL", "LND", "2", &["12"]),
        ];
        let departures = vec![departure("AF", "D1", "1")];

        let first =
            find_busiest_facilities(&arrivals, &departures, 3, "w", &PrefixResolver).await;
        let second =
            find_busiest_facilities(&arrivals, &departures, 3, "w", &PrefixResolver).await;
        assert_eq!(first, second);
    }
}
