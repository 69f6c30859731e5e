//! Cleaned flights to complete table rows plus destination counts.

use tracing::{debug, warn};

use crate::analyzers::rank::Tally;
use crate::analyzers::types::{ArrivalRow, DepartureRow, DestinationFrequency};
use crate::flights::{CleanedFlight, FlightInfo};

/// Builds the arrivals table and counts arrival destinations.
///
/// Destinations are counted for every arrival, including those whose row is
/// dropped for missing a column.
pub fn analyse_arrivals(arrivals: &[CleanedFlight]) -> (Vec<ArrivalRow>, DestinationFrequency) {
    let mut rows = Vec::new();
    let mut destinations = Tally::new();
    let mut dropped = 0usize;

    for flight in arrivals {
        let FlightInfo::Arrival(info) = &flight.info else {
            warn!(flight = ?flight.flight_name, "Departure found in arrival stream, skipping");
            continue;
        };

        count_destinations(&mut destinations, flight);

        match ArrivalRow::from_flight(flight, info) {
            Some(row) => rows.push(row),
            None => dropped += 1,
        }
    }

    debug!(kept = rows.len(), dropped, "Arrival rows built");
    (rows, DestinationFrequency(destinations))
}

/// Builds the departures table and counts departure destinations.
///
/// Destinations are counted for every departure, including those whose row
/// is dropped for missing a column.
pub fn analyse_departures(
    departures: &[CleanedFlight],
) -> (Vec<DepartureRow>, DestinationFrequency) {
    let mut rows = Vec::new();
    let mut destinations = Tally::new();
    let mut dropped = 0usize;

    for flight in departures {
        let FlightInfo::Departure(info) = &flight.info else {
            warn!(flight = ?flight.flight_name, "Arrival found in departure stream, skipping");
            continue;
        };

        count_destinations(&mut destinations, flight);

        match DepartureRow::from_flight(flight, info) {
            Some(row) => rows.push(row),
            None => dropped += 1,
        }
    }

    debug!(kept = rows.len(), dropped, "Departure rows built");
    (rows, DestinationFrequency(destinations))
}

fn count_destinations(tally: &mut Tally, flight: &CleanedFlight) {
    for iata in &flight.destinations {
        tally.add(iata);
    }
}
