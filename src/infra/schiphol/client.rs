use async_trait::async_trait;
use reqwest::Url;
use tracing::{debug, error, info, warn};

use crate::config::ApiConfig;
use crate::error::{EtlError, Result};
use crate::fetch::auth::ApiKey;
use crate::fetch::{BasicClient, HttpClient, get_json};
use crate::flights::FlightPage;
use crate::services::flight_api::{
    Airline, Destination, FetchOutcome, FlightApi, FlightWindow, PageStop,
};

/// Base client wrapped with the `Accept`, `ResourceVersion`, `app_id` and
/// `app_key` headers the provider expects.
pub type AuthenticatedClient = ApiKey<ApiKey<ApiKey<ApiKey<BasicClient>>>>;

/// Client for the Schiphol public-flights API.
pub struct SchipholClient<C> {
    client: C,
    base_url: String,
    max_pages: u32,
}

impl SchipholClient<AuthenticatedClient> {
    /// Builds the authenticated client.
    ///
    /// # Errors
    ///
    /// [`EtlError::CredentialMissing`] if either API credential is absent.
    pub fn from_config(config: &ApiConfig) -> Result<Self> {
        let credentials = config.credentials()?;

        let client = BasicClient::new(config.timeout_secs)?;
        let client = ApiKey::new(client, "Accept", "application/json")?;
        let client = ApiKey::new(client, "ResourceVersion", &config.resource_version)?;
        let client = ApiKey::new(client, "app_id", credentials.app_id)?;
        let client = ApiKey::new(client, "app_key", credentials.app_key)?;

        Ok(Self::new(client, &config.base_url, config.max_pages))
    }
}

impl<C: HttpClient> SchipholClient<C> {
    pub fn new(client: C, base_url: &str, max_pages: u32) -> Self {
        Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            max_pages,
        }
    }

    fn endpoint(&self, path: &str) -> Result<Url> {
        let raw = format!("{}/{}", self.base_url, path);
        raw.parse()
            .map_err(|e| EtlError::Config(format!("invalid API url '{raw}': {e}")))
    }

    async fn fetch_page(&self, window: &FlightWindow, page: u32) -> Result<Option<FlightPage>> {
        let mut url = self.endpoint("flights")?;
        url.query_pairs_mut()
            .append_pair("includedelays", "true")
            .append_pair("sort", "+scheduleTime")
            .append_pair("fromDateTime", &window.from_param())
            .append_pair("toDateTime", &window.to_param())
            .append_pair("page", &page.to_string());

        get_json(&self.client, url).await
    }
}

#[async_trait]
impl<C: HttpClient> FlightApi for SchipholClient<C> {
    #[tracing::instrument(skip(self), fields(window = %window.label()))]
    async fn fetch_flights(&self, window: FlightWindow) -> FetchOutcome {
        let mut flights = Vec::new();
        let mut pages = 0;
        let mut stop = PageStop::PageCap;

        for page in 0..self.max_pages {
            pages += 1;
            match self.fetch_page(&window, page).await {
                Ok(Some(body)) if !body.flights.is_empty() => {
                    debug!(page, count = body.flights.len(), "Page fetched");
                    flights.extend(body.flights);
                }
                Ok(_) => {
                    stop = PageStop::Exhausted;
                    break;
                }
                Err(e) => {
                    error!(page, error = %e, "Page fetch failed, ending pagination");
                    stop = PageStop::Failed(e.to_string());
                    break;
                }
            }
        }

        if stop == PageStop::PageCap {
            warn!(pages, "Page cap reached before the provider ran dry");
        }
        info!(flights = flights.len(), pages, "Flight window fetched");

        FetchOutcome {
            flights,
            window,
            pages,
            stop,
        }
    }

    async fn fetch_airline(&self, code: &str) -> Result<Option<Airline>> {
        debug!(code, "Requesting airline info");
        get_json(&self.client, self.endpoint(&format!("airlines/{code}"))?).await
    }

    async fn fetch_destination(&self, iata: &str) -> Result<Option<Destination>> {
        debug!(iata, "Requesting destination info");
        get_json(&self.client, self.endpoint(&format!("destinations/{iata}"))?).await
    }
}
