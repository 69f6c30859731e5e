//! Trait and types for interacting with the remote flight provider.

use chrono::{Local, NaiveDateTime, TimeDelta};
use serde::Deserialize;

use crate::error::{EtlError, Result};
use crate::flights::RawFlightRecord;

const TIMESTAMP_FORMAT: &str = "%Y-%m-%dT%H:%M:%S";

/// The `[now - hours, now]` range flights are requested for, in local time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FlightWindow {
    pub from: NaiveDateTime,
    pub to: NaiveDateTime,
}

impl FlightWindow {
    /// # Errors
    ///
    /// [`EtlError::Config`] unless `hours` is positive, finite and small
    /// enough for the start to be representable.
    pub fn ending_at(to: NaiveDateTime, hours: f64) -> Result<Self> {
        if !(hours.is_finite() && hours > 0.0) {
            return Err(EtlError::Config(format!(
                "window length must be a positive number of hours, got {hours}"
            )));
        }
        let from = TimeDelta::try_milliseconds((hours * 3_600_000.0).round() as i64)
            .and_then(|span| to.checked_sub_signed(span))
            .ok_or_else(|| EtlError::Config(format!("window of {hours} hours is out of range")))?;
        Ok(Self { from, to })
    }

    pub fn last_hours(hours: f64) -> Result<Self> {
        Self::ending_at(Local::now().naive_local(), hours)
    }

    pub fn from_param(&self) -> String {
        self.from.format(TIMESTAMP_FORMAT).to_string()
    }

    pub fn to_param(&self) -> String {
        self.to.format(TIMESTAMP_FORMAT).to_string()
    }

    /// Partition key for sinks: end and start joined by `_`.
    pub fn label(&self) -> String {
        format!("{}_{}", self.to_param(), self.from_param())
    }
}

/// Why pagination ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PageStop {
    /// The provider returned an empty page.
    Exhausted,
    /// A page request failed; what was accumulated before it is kept.
    Failed(String),
    /// The page cap was reached before the provider ran dry.
    PageCap,
}

/// Everything a windowed fetch produced.
#[derive(Debug, Clone)]
pub struct FetchOutcome {
    pub flights: Vec<RawFlightRecord>,
    pub window: FlightWindow,
    pub pages: u32,
    pub stop: PageStop,
}

impl FetchOutcome {
    pub fn window_label(&self) -> String {
        self.window.label()
    }

    /// `true` unless a page request failed.
    pub fn is_complete(&self) -> bool {
        !matches!(self.stop, PageStop::Failed(_))
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Airline {
    pub public_name: String,
    #[serde(default)]
    pub iata: Option<String>,
    #[serde(default)]
    pub icao: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Destination {
    pub city: Option<String>,
    #[serde(default)]
    pub country: Option<String>,
    #[serde(default)]
    pub iata: Option<String>,
}

/// Abstraction over the flight data provider.
#[async_trait::async_trait]
pub trait FlightApi: Send + Sync {
    /// Retrieves every flight scheduled inside `window`.
    ///
    /// Page failures never surface as errors: pagination stops and the
    /// reason is recorded in [`FetchOutcome::stop`].
    async fn fetch_flights(&self, window: FlightWindow) -> FetchOutcome;

    /// Looks up an airline by ICAO/IATA code. `Ok(None)` when unknown.
    async fn fetch_airline(&self, code: &str) -> Result<Option<Airline>>;

    /// Looks up a destination airport by IATA code. `Ok(None)` when unknown.
    async fn fetch_destination(&self, iata: &str) -> Result<Option<Destination>>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn at(h: u32, m: u32, s: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 5, 1)
            .unwrap()
            .and_hms_opt(h, m, s)
            .unwrap()
    }

    #[test]
    fn test_half_hour_window() {
        let window = FlightWindow::ending_at(at(12, 0, 0), 0.5).unwrap();
        assert_eq!(window.from_param(), "2024-05-01T11:30:00");
        assert_eq!(window.to_param(), "2024-05-01T12:00:00");
    }

    #[test]
    fn test_label_is_end_then_start() {
        let window = FlightWindow::ending_at(at(12, 0, 0), 2.0).unwrap();
        assert_eq!(window.label(), "2024-05-01T12:00:00_2024-05-01T10:00:00");
    }

    #[test]
    fn test_failed_outcome_is_incomplete() {
        let outcome = FetchOutcome {
            flights: vec![],
            window: FlightWindow::ending_at(at(1, 0, 0), 1.0).unwrap(),
            pages: 1,
            stop: PageStop::Failed("timeout".into()),
        };
        assert!(!outcome.is_complete());
    }

    #[test]
    fn test_invalid_window_length_is_rejected() {
        for hours in [0.0, -2.0, f64::NAN, f64::INFINITY] {
            let result = FlightWindow::ending_at(at(12, 0, 0), hours);
            assert!(matches!(result, Err(EtlError::Config(_))), "accepted {hours}");
        }
    }

    #[test]
    fn test_unrepresentable_window_is_an_error() {
        let result = FlightWindow::ending_at(at(12, 0, 0), 1e12);
        assert!(matches!(result, Err(EtlError::Config(_))));
    }
}
