//! Resolution of airline and airport codes into display names.

use async_trait::async_trait;
use std::collections::HashMap;
use tokio::sync::Mutex;
use tracing::warn;

use crate::services::flight_api::FlightApi;

/// Turns codes into human-readable names for ranked reports.
///
/// Resolution never fails: an unresolvable code is returned unchanged.
#[async_trait]
pub trait Resolver: Send + Sync {
    async fn airline_name(&self, code: &str) -> String;
    async fn city_name(&self, iata: &str) -> String;
}

/// [`Resolver`] backed by the flight API, memoizing every answer (including
/// fallbacks) for its own lifetime. One instance is created per pipeline run.
pub struct CachedLookup<'a, A> {
    api: &'a A,
    airlines: Mutex<HashMap<String, String>>,
    cities: Mutex<HashMap<String, String>>,
}

impl<'a, A: FlightApi> CachedLookup<'a, A> {
    pub fn new(api: &'a A) -> Self {
        Self {
            api,
            airlines: Mutex::new(HashMap::new()),
            cities: Mutex::new(HashMap::new()),
        }
    }
}

#[async_trait]
impl<'a, A: FlightApi> Resolver for CachedLookup<'a, A> {
    async fn airline_name(&self, code: &str) -> String {
        if let Some(name) = self.airlines.lock().await.get(code) {
            return name.clone();
        }

        let name = match self.api.fetch_airline(code).await {
            Ok(Some(airline)) => airline.public_name,
            Ok(None) => {
                warn!(code, "Airline unknown to provider, using code");
                code.to_string()
            }
            Err(e) => {
                warn!(code, error = %e, "Airline lookup failed, using code");
                code.to_string()
            }
        };

        self.airlines
            .lock()
            .await
            .insert(code.to_string(), name.clone());
        name
    }

    async fn city_name(&self, iata: &str) -> String {
        if let Some(city) = self.cities.lock().await.get(iata) {
            return city.clone();
        }

        let city = match self.api.fetch_destination(iata).await {
            Ok(Some(destination)) => destination.city.unwrap_or_else(|| iata.to_string()),
            Ok(None) => {
                warn!(iata, "Destination unknown to provider, using code");
                iata.to_string()
            }
            Err(e) => {
                warn!(iata, error = %e, "Destination lookup failed, using code");
                iata.to_string()
            }
        };

        self.cities
            .lock()
            .await
            .insert(iata.to_string(), city.clone());
        city
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{EtlError, Result};
    use crate::services::flight_api::{Airline, Destination, FetchOutcome, FlightWindow};
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[derive(Default)]
    struct CountingApi {
        airline_calls: AtomicUsize,
    }

    #[async_trait]
    impl FlightApi for CountingApi {
        async fn fetch_flights(&self, _window: FlightWindow) -> FetchOutcome {
            unreachable!("not used by lookups")
        }

        async fn fetch_airline(&self, code: &str) -> Result<Option<Airline>> {
            self.airline_calls.fetch_add(1, Ordering::SeqCst);
            match code {
                "KLM" => Ok(Some(Airline {
                    public_name: "KLM Royal Dutch Airlines".into(),
                    iata: Some("KL".into()),
                    icao: Some("KLM".into()),
                })),
                "ZZZ" => Ok(None),
                _ => Err(EtlError::Status {
                    endpoint: format!("/airlines/{code}"),
                    status: 500,
                }),
            }
        }

        async fn fetch_destination(&self, iata: &str) -> Result<Option<Destination>> {
            Ok(Some(Destination {
                city: (iata == "LHR").then(|| "London".to_string()),
                country: None,
                iata: Some(iata.to_string()),
            }))
        }
    }

    #[tokio::test]
    async fn test_airline_is_fetched_once() {
        let api = CountingApi::default();
        let lookup = CachedLookup::new(&api);

        assert_eq!(lookup.airline_name("KLM").await, "KLM Royal Dutch Airlines");
        assert_eq!(lookup.airline_name("KLM").await, "KLM Royal Dutch Airlines");
        assert_eq!(api.airline_calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_failures_fall_back_to_code() {
        let api = CountingApi::default();
        let lookup = CachedLookup::new(&api);

        assert_eq!(lookup.airline_name("ZZZ").await, "ZZZ");
        assert_eq!(lookup.airline_name("ERR").await, "ERR");
        assert_eq!(lookup.airline_name("ERR").await, "ERR");
        assert_eq!(api.airline_calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_city_without_name_falls_back_to_code() {
        let api = CountingApi::default();
        let lookup = CachedLookup::new(&api);

        assert_eq!(lookup.city_name("LHR").await, "London");
        assert_eq!(lookup.city_name("JFK").await, "JFK");
    }
}
