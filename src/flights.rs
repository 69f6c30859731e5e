//! Flight record types: the provider's raw shape and the cleaned shape.
//!
//! Absent fields are `None` all the way through. A field the provider sent as
//! an empty string stays `Some("")`.

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

/// One page of the `flights` endpoint.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct FlightPage {
    pub flights: Vec<RawFlightRecord>,
}

/// A flight exactly as the provider describes it. Every field is optional;
/// the cleaner decides what matters.
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RawFlightRecord {
    #[serde(deserialize_with = "lenient_string")]
    pub schema_version: Option<String>,
    pub flight_direction: Option<String>,
    pub flight_name: Option<String>,
    #[serde(deserialize_with = "lenient_string")]
    pub terminal: Option<String>,
    #[serde(rename = "prefixICAO")]
    pub prefix_icao: Option<String>,
    pub aircraft_type: Option<AircraftType>,
    pub route: Option<Route>,
    pub public_flight_state: Option<PublicFlightState>,

    // arrivals
    pub estimated_landing_time: Option<String>,
    pub actual_landing_time: Option<String>,
    pub expected_time_on_belt: Option<String>,
    pub baggage_claim: Option<BaggageClaim>,

    // departures
    #[serde(deserialize_with = "lenient_string")]
    pub gate: Option<String>,
    pub expected_time_boarding: Option<String>,
    pub expected_time_gate_open: Option<String>,
    pub expected_time_gate_closing: Option<String>,
    pub actual_off_block_time: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase", default)]
pub struct AircraftType {
    pub iata_main: Option<String>,
    pub iata_sub: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct Route {
    #[serde(deserialize_with = "lenient_strings")]
    pub destinations: Vec<String>,
}

/// Flight states, most recent first.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PublicFlightState {
    #[serde(deserialize_with = "lenient_strings")]
    pub flight_states: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct BaggageClaim {
    #[serde(deserialize_with = "lenient_strings")]
    pub belts: Vec<String>,
}

/// Travel direction relative to the airport.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Arrival,
    Departure,
}

impl Direction {
    /// `"A"` is an arrival; any other value, or none at all, is a departure.
    pub fn from_code(code: Option<&str>) -> Self {
        match code {
            Some("A") => Direction::Arrival,
            _ => Direction::Departure,
        }
    }
}

/// A normalized flight with the direction-specific payload attached.
#[derive(Debug, Clone, PartialEq)]
pub struct CleanedFlight {
    pub flight_name: Option<String>,
    pub terminal: Option<String>,
    /// Most recent flight state code (e.g. `LND`, `DEL`).
    pub state: Option<String>,
    pub destinations: Vec<String>,
    /// ICAO airline prefix.
    pub airline: Option<String>,
    pub aircraft_type: Option<AircraftType>,
    pub info: FlightInfo,
}

impl CleanedFlight {
    pub fn direction(&self) -> Direction {
        match self.info {
            FlightInfo::Arrival(_) => Direction::Arrival,
            FlightInfo::Departure(_) => Direction::Departure,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum FlightInfo {
    Arrival(ArrivalInfo),
    Departure(DepartureInfo),
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ArrivalInfo {
    pub estimated_landing_time: Option<String>,
    pub actual_landing_time: Option<String>,
    pub expected_time_on_belt: Option<String>,
    pub baggage_claim_belts: Option<Vec<String>>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct DepartureInfo {
    pub gate: Option<String>,
    pub expected_time_boarding: Option<String>,
    pub expected_time_gate_open: Option<String>,
    pub expected_time_gate_closing: Option<String>,
    pub actual_off_block_time: Option<String>,
}

/// Accepts a JSON string or number (the provider is not consistent about
/// terminals, gates and schema versions).
fn lenient_string<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(scalar_to_string(Option::<Value>::deserialize(deserializer)?))
}

fn lenient_strings<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let values = Option::<Vec<Value>>::deserialize(deserializer)?.unwrap_or_default();
    Ok(values.into_iter().filter_map(|v| scalar_to_string(Some(v))).collect())
}

fn scalar_to_string(value: Option<Value>) -> Option<String> {
    match value? {
        Value::String(s) => Some(s),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}
