//! Row and report types produced by the analyzers.

use crate::analyzers::rank::Tally;
use crate::flights::{ArrivalInfo, CleanedFlight, DepartureInfo};
use crate::output::{Column, Table, ToTable};

/// Columns a ranking can filter or group on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Field {
    FlightName,
    Airline,
    Terminal,
    State,
    Gate,
}

impl Field {
    pub fn column_name(self) -> &'static str {
        match self {
            Field::FlightName => "flight_name",
            Field::Airline => "airline",
            Field::Terminal => "terminal",
            Field::State => "state",
            Field::Gate => "gate",
        }
    }
}

/// A complete row of one of the flight tables.
pub trait FlightRow {
    /// The value of `field`, or `None` if this row type has no such column.
    fn field(&self, field: Field) -> Option<&str>;
}

/// A complete arrival: every column is present.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArrivalRow {
    pub flight_name: String,
    pub airline: String,
    pub terminal: String,
    pub state: String,
    pub estimated_landing_time: String,
    pub actual_landing_time: String,
    pub expected_time_on_belt: String,
    pub baggage_claim_belts: Vec<String>,
}

impl ArrivalRow {
    pub const COLUMNS: [&'static str; 8] = [
        "flight_name",
        "airline",
        "terminal",
        "state",
        "estimatedLandingTime",
        "actualLandingTime",
        "expectedTimeOnBelt",
        "baggageClaimBelts",
    ];

    /// Builds the row, or `None` if any column is missing.
    pub fn from_flight(flight: &CleanedFlight, info: &ArrivalInfo) -> Option<Self> {
        Some(Self {
            flight_name: flight.flight_name.clone()?,
            airline: flight.airline.clone()?,
            terminal: flight.terminal.clone()?,
            state: flight.state.clone()?,
            estimated_landing_time: info.estimated_landing_time.clone()?,
            actual_landing_time: info.actual_landing_time.clone()?,
            expected_time_on_belt: info.expected_time_on_belt.clone()?,
            baggage_claim_belts: info.baggage_claim_belts.clone()?,
        })
    }
}

impl FlightRow for ArrivalRow {
    fn field(&self, field: Field) -> Option<&str> {
        match field {
            Field::FlightName => Some(&self.flight_name),
            Field::Airline => Some(&self.airline),
            Field::Terminal => Some(&self.terminal),
            Field::State => Some(&self.state),
            Field::Gate => None,
        }
    }
}

impl ToTable for [ArrivalRow] {
    fn to_table(&self) -> Table {
        let mut table = Table::new(
            ArrivalRow::COLUMNS
                .iter()
                .map(|c| Column::text(c))
                .collect(),
        );
        for row in self {
            table.push_row(vec![
                row.flight_name.clone(),
                row.airline.clone(),
                row.terminal.clone(),
                row.state.clone(),
                row.estimated_landing_time.clone(),
                row.actual_landing_time.clone(),
                row.expected_time_on_belt.clone(),
                row.baggage_claim_belts.join(","),
            ]);
        }
        table
    }
}

/// A complete departure: every column is present.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DepartureRow {
    pub flight_name: String,
    pub airline: String,
    pub terminal: String,
    pub state: String,
    pub gate: String,
    pub expected_time_gate_open: String,
    pub expected_time_boarding: String,
    pub expected_time_gate_closing: String,
    pub actual_off_block_time: String,
}

impl DepartureRow {
    pub const COLUMNS: [&'static str; 9] = [
        "flight_name",
        "airline",
        "terminal",
        "state",
        "gate",
        "expectedTimeGateOpen",
        "expectedTimeBoarding",
        "expectedTimeGateClosing",
        "actualOffBlockTime",
    ];

    /// Builds the row, or `None` if any column is missing.
    pub fn from_flight(flight: &CleanedFlight, info: &DepartureInfo) -> Option<Self> {
        Some(Self {
            flight_name: flight.flight_name.clone()?,
            airline: flight.airline.clone()?,
            terminal: flight.terminal.clone()?,
            state: flight.state.clone()?,
            gate: info.gate.clone()?,
            expected_time_gate_open: info.expected_time_gate_open.clone()?,
            expected_time_boarding: info.expected_time_boarding.clone()?,
            expected_time_gate_closing: info.expected_time_gate_closing.clone()?,
            actual_off_block_time: info.actual_off_block_time.clone()?,
        })
    }
}

impl FlightRow for DepartureRow {
    fn field(&self, field: Field) -> Option<&str> {
        match field {
            Field::FlightName => Some(&self.flight_name),
            Field::Airline => Some(&self.airline),
            Field::Terminal => Some(&self.terminal),
            Field::State => Some(&self.state),
            Field::Gate => Some(&self.gate),
        }
    }
}

impl ToTable for [DepartureRow] {
    fn to_table(&self) -> Table {
        let mut table = Table::new(
            DepartureRow::COLUMNS
                .iter()
                .map(|c| Column::text(c))
                .collect(),
        );
        for row in self {
            table.push_row(vec![
                row.flight_name.clone(),
                row.airline.clone(),
                row.terminal.clone(),
                row.state.clone(),
                row.gate.clone(),
                row.expected_time_gate_open.clone(),
                row.expected_time_boarding.clone(),
                row.expected_time_gate_closing.clone(),
                row.actual_off_block_time.clone(),
            ]);
        }
        table
    }
}

/// How many flights touched each destination airport.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DestinationFrequency(pub Tally);

impl DestinationFrequency {
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn get(&self, iata: &str) -> usize {
        self.0.get(iata)
    }
}

impl ToTable for DestinationFrequency {
    fn to_table(&self) -> Table {
        let mut table = Table::new(vec![Column::text("destination"), Column::integer("flights")]);
        for (iata, count) in self.0.iter() {
            table.push_row(vec![iata.to_string(), count.to_string()]);
        }
        table
    }
}

/// One ranked entity with its count.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RankedEntry {
    pub name: String,
    pub count: usize,
}

impl RankedEntry {
    pub fn from_pairs(pairs: Vec<(String, usize)>) -> Vec<Self> {
        pairs
            .into_iter()
            .map(|(name, count)| Self { name, count })
            .collect()
    }
}

/// Ordered `(entity, count)` pairs, highest count first.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RankedReport {
    pub key_column: &'static str,
    pub count_column: &'static str,
    pub entries: Vec<RankedEntry>,
}

impl RankedReport {
    pub fn empty(key_column: &'static str, count_column: &'static str) -> Self {
        Self {
            key_column,
            count_column,
            entries: Vec::new(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl ToTable for RankedReport {
    fn to_table(&self) -> Table {
        let mut table = Table::new(vec![
            Column::text(self.key_column),
            Column::integer(self.count_column),
        ]);
        for entry in &self.entries {
            table.push_row(vec![entry.name.clone(), entry.count.to_string()]);
        }
        table
    }
}

/// One of the five facility rankings, stamped with its source window.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FacilityTable {
    /// Report key, used in upload paths.
    pub name: &'static str,
    pub key_column: &'static str,
    pub window: String,
    pub entries: Vec<RankedEntry>,
}

impl FacilityTable {
    pub fn empty(name: &'static str, key_column: &'static str, window: &str) -> Self {
        Self {
            name,
            key_column,
            window: window.to_string(),
            entries: Vec::new(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl ToTable for FacilityTable {
    fn to_table(&self) -> Table {
        let mut table = Table::new(vec![
            Column::text("window"),
            Column::text(self.key_column),
            Column::integer("count"),
        ]);
        for entry in &self.entries {
            table.push_row(vec![
                self.window.clone(),
                entry.name.clone(),
                entry.count.to_string(),
            ]);
        }
        table
    }
}

/// Busiest facilities and airlines over a window. Always has all five tables.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FacilitiesReport {
    pub busy_belts: FacilityTable,
    pub busy_gates: FacilityTable,
    pub busiest_arrival_terminals: FacilityTable,
    pub busiest_departure_terminals: FacilityTable,
    pub busiest_airlines: FacilityTable,
}

impl FacilitiesReport {
    pub fn empty(window: &str) -> Self {
        Self {
            busy_belts: FacilityTable::empty("busy_belts", "beltID", window),
            busy_gates: FacilityTable::empty("busy_gates", "gate", window),
            busiest_arrival_terminals: FacilityTable::empty(
                "busiest_arrivals_terminals",
                "terminal",
                window,
            ),
            busiest_departure_terminals: FacilityTable::empty(
                "busiest_departure_terminals",
                "terminal",
                window,
            ),
            busiest_airlines: FacilityTable::empty("busiest_airlines", "airline", window),
        }
    }

    pub fn tables(&self) -> [&FacilityTable; 5] {
        [
            &self.busy_belts,
            &self.busy_gates,
            &self.busiest_arrival_terminals,
            &self.busiest_departure_terminals,
            &self.busiest_airlines,
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::flights::FlightInfo;

    fn arrival(belts: Option<Vec<String>>) -> (CleanedFlight, ArrivalInfo) {
        let info = ArrivalInfo {
            estimated_landing_time: Some("2024-05-01T11:40:00".into()),
            actual_landing_time: Some("2024-05-01T11:42:00".into()),
            expected_time_on_belt: Some("2024-05-01T12:00:00".into()),
            baggage_claim_belts: belts,
        };
        let flight = CleanedFlight {
            flight_name: Some("KL1".into()),
            terminal: Some("1".into()),
            state: Some("LND".into()),
            destinations: vec!["LHR".into()],
            airline: Some("KLM".into()),
            aircraft_type: None,
            info: FlightInfo::Arrival(info.clone()),
        };
        (flight, info)
    }

    #[test]
    fn test_arrival_row_requires_every_column() {
        let (flight, info) = arrival(Some(vec!["11".into()]));
        assert!(ArrivalRow::from_flight(&flight, &info).is_some());

        let (flight, info) = arrival(None);
        assert!(ArrivalRow::from_flight(&flight, &info).is_none());
    }

    #[test]
    fn test_present_empty_string_is_a_value() {
        let (mut flight, info) = arrival(Some(vec![]));
        flight.airline = Some(String::new());
        let row = ArrivalRow::from_flight(&flight, &info).unwrap();
        assert_eq!(row.airline, "");
    }

    #[test]
    fn test_arrival_table_shape() {
        let (flight, info) = arrival(Some(vec!["11".into(), "12".into()]));
        let rows = vec![ArrivalRow::from_flight(&flight, &info).unwrap()];
        let table = rows.to_table();
        assert_eq!(table.column_names(), ArrivalRow::COLUMNS.to_vec());
        assert_eq!(table.rows[0][7], "11,12");
    }

    #[test]
    fn test_empty_facilities_report_has_five_stamped_tables() {
        let report = FacilitiesReport::empty("w");
        let tables = report.tables();
        assert_eq!(tables.len(), 5);
        assert!(tables.iter().all(|t| t.is_empty() && t.window == "w"));
        assert_eq!(
            report.busy_belts.to_table().column_names(),
            vec!["window", "beltID", "count"]
        );
    }
}
