//! Schema-gated normalization of raw provider records.

use tracing::{debug, error};

use crate::error::{EtlError, Result};
use crate::flights::{
    ArrivalInfo, CleanedFlight, DepartureInfo, Direction, FlightInfo, RawFlightRecord,
};

/// Cleaned records split by direction.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct CleanedFlights {
    pub arrivals: Vec<CleanedFlight>,
    pub departures: Vec<CleanedFlight>,
}

/// Validates the schema version of every record, then normalizes each one.
///
/// # Errors
///
/// Returns [`EtlError::SchemaVersionMismatch`] for the first record whose
/// `schemaVersion` differs from `expected_version`. Nothing is cleaned in
/// that case.
pub fn clean(records: &[RawFlightRecord], expected_version: &str) -> Result<CleanedFlights> {
    check_schema_version(records, expected_version)?;

    let mut cleaned = CleanedFlights::default();
    for record in records {
        let flight = clean_record(record);
        match flight.direction() {
            Direction::Arrival => cleaned.arrivals.push(flight),
            Direction::Departure => cleaned.departures.push(flight),
        }
    }

    debug!(
        arrivals = cleaned.arrivals.len(),
        departures = cleaned.departures.len(),
        "Flights cleaned"
    );
    Ok(cleaned)
}

fn check_schema_version(records: &[RawFlightRecord], expected: &str) -> Result<()> {
    let mismatch = records
        .iter()
        .find(|r| r.schema_version.as_deref() != Some(expected));

    match mismatch {
        Some(record) => {
            let found = record
                .schema_version
                .clone()
                .unwrap_or_else(|| "<none>".to_string());
            error!(expected, found = %found, "Flight API schema version changed");
            Err(EtlError::SchemaVersionMismatch {
                expected: expected.to_string(),
                found,
            })
        }
        None => Ok(()),
    }
}

fn clean_record(record: &RawFlightRecord) -> CleanedFlight {
    let direction = Direction::from_code(record.flight_direction.as_deref());

    let info = match direction {
        Direction::Arrival => FlightInfo::Arrival(ArrivalInfo {
            estimated_landing_time: record.estimated_landing_time.clone(),
            actual_landing_time: record.actual_landing_time.clone(),
            expected_time_on_belt: record.expected_time_on_belt.clone(),
            baggage_claim_belts: record.baggage_claim.as_ref().map(|c| c.belts.clone()),
        }),
        Direction::Departure => FlightInfo::Departure(DepartureInfo {
            gate: record.gate.clone(),
            expected_time_boarding: record.expected_time_boarding.clone(),
            expected_time_gate_open: record.expected_time_gate_open.clone(),
            expected_time_gate_closing: record.expected_time_gate_closing.clone(),
            actual_off_block_time: record.actual_off_block_time.clone(),
        }),
    };

    CleanedFlight {
        flight_name: record.flight_name.clone(),
        terminal: record.terminal.clone(),
        // keep the most recent state only
        state: record
            .public_flight_state
            .as_ref()
            .and_then(|s| s.flight_states.first().cloned()),
        destinations: record
            .route
            .as_ref()
            .map(|r| r.destinations.clone())
            .unwrap_or_default(),
        airline: record.prefix_icao.clone(),
        aircraft_type: record.aircraft_type.clone(),
        info,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::flights::{BaggageClaim, PublicFlightState, Route};

    fn record(direction: &str, version: &str) -> RawFlightRecord {
        RawFlightRecord {
            schema_version: Some(version.to_string()),
            flight_direction: Some(direction.to_string()),
            flight_name: Some("KL1001".to_string()),
            terminal: Some("1".to_string()),
            prefix_icao: Some("KLM".to_string()),
            route: Some(Route {
                destinations: vec!["LHR".to_string()],
            }),
            public_flight_state: Some(PublicFlightState {
                flight_states: vec!["LND".to_string(), "EXP".to_string()],
            }),
            ..Default::default()
        }
    }

    #[test]
    fn test_routes_by_direction() {
        let records = vec![record("A", "4"), record("D", "4"), record("X", "4")];
        let cleaned = clean(&records, "4").unwrap();

        assert_eq!(cleaned.arrivals.len(), 1);
        assert_eq!(cleaned.departures.len(), 2);
        assert!(
            cleaned
                .arrivals
                .iter()
                .all(|f| matches!(f.info, FlightInfo::Arrival(_)))
        );
        assert!(
            cleaned
                .departures
                .iter()
                .all(|f| matches!(f.info, FlightInfo::Departure(_)))
        );
    }

    #[test]
    fn test_keeps_most_recent_state() {
        let cleaned = clean(&[record("A", "4")], "4").unwrap();
        assert_eq!(cleaned.arrivals[0].state.as_deref(), Some("LND"));
    }

    #[test]
    fn test_schema_mismatch_fails_whole_batch() {
        let records = vec![record("A", "4"), record("D", "5"), record("A", "4")];
        let err = clean(&records, "4").unwrap_err();
        match err {
            EtlError::SchemaVersionMismatch { expected, found } => {
                assert_eq!(expected, "4");
                assert_eq!(found, "5");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_missing_schema_version_is_a_mismatch() {
        let mut raw = record("A", "4");
        raw.schema_version = None;
        assert!(clean(&[raw], "4").is_err());
    }

    #[test]
    fn test_absent_fields_stay_absent() {
        let mut raw = record("A", "4");
        raw.terminal = None;
        raw.public_flight_state = Some(PublicFlightState::default());
        raw.baggage_claim = Some(BaggageClaim {
            belts: vec!["11".to_string()],
        });

        let cleaned = clean(&[raw], "4").unwrap();
        let flight = &cleaned.arrivals[0];
        assert!(flight.terminal.is_none());
        assert!(flight.state.is_none());
        match &flight.info {
            FlightInfo::Arrival(info) => {
                assert_eq!(info.baggage_claim_belts, Some(vec!["11".to_string()]));
                assert!(info.actual_landing_time.is_none());
            }
            FlightInfo::Departure(_) => panic!("expected arrival"),
        }
    }

    #[test]
    fn test_empty_input() {
        let cleaned = clean(&[], "4").unwrap();
        assert!(cleaned.arrivals.is_empty());
        assert!(cleaned.departures.is_empty());
    }
}
