//! Sequential extract, process, load and upload of one flight window.
//!
//! ```text
//! Idle -> Extracting -> Processing -> Loading -> Uploading -> Done
//!              \             \            \           \
//!               +-------------+------------+-----------+--> Failed
//! ```
//!
//! Extraction degrades to whatever pages arrived; processing errors stop the
//! run; each table write is attempted independently; any upload error stops
//! the run.

use bytes::Bytes;
use tracing::{debug, error, info, warn};

use crate::analyzers::reports::{
    filter_ranked, find_busiest_facilities, find_popular_destinations,
};
use crate::analyzers::rows::{analyse_arrivals, analyse_departures};
use crate::analyzers::types::{
    ArrivalRow, DepartureRow, DestinationFrequency, FacilitiesReport, Field, RankedReport,
};
use crate::cleaner::clean;
use crate::config::Config;
use crate::error::{EtlError, Result};
use crate::infra::postgres::PostgresSink;
use crate::infra::s3::S3Store;
use crate::infra::schiphol::SchipholClient;
use crate::output::{Table, ToTable, to_csv};
use crate::services::flight_api::{FetchOutcome, FlightApi, FlightWindow, PageStop};
use crate::services::lookup::CachedLookup;
use crate::services::sinks::{ObjectStore, TableSink};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Idle,
    Extracting,
    Processing,
    Loading,
    Uploading,
    Done,
    Failed,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArrivalReports {
    pub most_landed: RankedReport,
    pub most_diverted: RankedReport,
    pub most_popular_destinations: RankedReport,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DepartureReports {
    pub most_delayed: RankedReport,
    pub most_canceled: RankedReport,
    pub most_popular_destinations: RankedReport,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reports {
    pub arrivals: ArrivalReports,
    pub departures: DepartureReports,
    pub facilities: FacilitiesReport,
}

/// Output of the processing stage: the four stored tables and the reports.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProcessedFlights {
    pub arrivals: Vec<ArrivalRow>,
    pub arrival_destinations: DestinationFrequency,
    pub departures: Vec<DepartureRow>,
    pub departure_destinations: DestinationFrequency,
    pub reports: Reports,
}

impl ProcessedFlights {
    /// The stored tables, paired with their destination table names.
    pub fn tables(&self) -> [(&'static str, Table); 4] {
        [
            ("ARRIVALS", self.arrivals.to_table()),
            ("DESTINATIONS_ARRIVALS", self.arrival_destinations.to_table()),
            ("DEPARTURES", self.departures.to_table()),
            ("DESTINATIONS_DEPARTURES", self.departure_destinations.to_table()),
        ]
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LoadSummary {
    pub written: Vec<String>,
    /// Table name and error message for each write that failed.
    pub failed: Vec<(String, String)>,
}

/// What a call to [`Pipeline::run`] did.
#[derive(Debug)]
pub struct RunReport {
    pub stage: Stage,
    /// The stage that was executing when the run failed.
    pub failed_at: Option<Stage>,
    pub window: Option<String>,
    pub fetched: usize,
    pub fetch_stop: Option<PageStop>,
    pub load: Option<LoadSummary>,
    pub uploaded: Vec<String>,
    pub error: Option<EtlError>,
}

impl RunReport {
    fn new() -> Self {
        Self {
            stage: Stage::Idle,
            failed_at: None,
            window: None,
            fetched: 0,
            fetch_stop: None,
            load: None,
            uploaded: Vec::new(),
            error: None,
        }
    }

    pub fn succeeded(&self) -> bool {
        self.stage == Stage::Done
    }
}

pub struct Pipeline<'a, A, S, O> {
    config: &'a Config,
    api: A,
    sink: S,
    store: O,
    window_hours: f64,
    stage: Stage,
}

impl<'a, A, S, O> Pipeline<'a, A, S, O>
where
    A: FlightApi,
    S: TableSink,
    O: ObjectStore,
{
    pub fn new(config: &'a Config, api: A, sink: S, store: O) -> Self {
        Self {
            config,
            api,
            sink,
            store,
            window_hours: config.api.window_hours,
            stage: Stage::Idle,
        }
    }

    /// Overrides the configured window length for this pipeline. The value is
    /// validated when the window is built in [`Pipeline::extract`].
    pub fn with_window_hours(mut self, hours: f64) -> Self {
        self.window_hours = hours;
        self
    }

    pub fn stage(&self) -> Stage {
        self.stage
    }

    pub fn api(&self) -> &A {
        &self.api
    }

    pub fn sink(&self) -> &S {
        &self.sink
    }

    pub fn store(&self) -> &O {
        &self.store
    }

    /// Fetches the flights of the last `window_hours`.
    ///
    /// # Errors
    ///
    /// [`EtlError::CredentialMissing`] or, for an unusable window length,
    /// [`EtlError::Config`]. Both are raised before any request. A failed
    /// fetch is logged and returns whatever was accumulated.
    #[tracing::instrument(skip(self), fields(window_hours = self.window_hours))]
    pub async fn extract(&mut self) -> Result<FetchOutcome> {
        self.stage = Stage::Extracting;
        self.config.api.credentials()?;

        let window = FlightWindow::last_hours(self.window_hours)?;
        let outcome = self.api.fetch_flights(window).await;

        if let PageStop::Failed(reason) = &outcome.stop {
            error!(
                reason = %reason,
                flights = outcome.flights.len(),
                "Flight fetch failed, continuing with partial data"
            );
        }
        Ok(outcome)
    }

    /// Cleans the raw records and computes every table and report.
    ///
    /// # Errors
    ///
    /// [`EtlError::SchemaVersionMismatch`] if any record carries an
    /// unexpected schema version.
    #[tracing::instrument(skip_all, fields(records = raw.flights.len()))]
    pub async fn process(&mut self, raw: &FetchOutcome) -> Result<ProcessedFlights> {
        self.stage = Stage::Processing;

        let cleaned = clean(&raw.flights, &self.config.api.schema_version).inspect_err(|e| {
            error!(error = %e, "Processing failed");
        })?;

        let (arrivals, arrival_destinations) = analyse_arrivals(&cleaned.arrivals);
        let (departures, departure_destinations) = analyse_departures(&cleaned.departures);

        let top = self.config.reports;
        let resolver = CachedLookup::new(&self.api);
        let window = raw.window_label();

        let n = top.state_top_n;
        let most_landed =
            filter_ranked(&arrivals, Field::State, "LND", Field::Airline, n, &resolver).await;
        let most_diverted =
            filter_ranked(&arrivals, Field::State, "DIV", Field::Airline, n, &resolver).await;
        let most_delayed =
            filter_ranked(&departures, Field::State, "DEL", Field::Airline, n, &resolver).await;
        let most_canceled =
            filter_ranked(&departures, Field::State, "CNX", Field::Airline, n, &resolver).await;

        let reports = Reports {
            arrivals: ArrivalReports {
                most_landed,
                most_diverted,
                most_popular_destinations: find_popular_destinations(
                    &arrival_destinations,
                    top.destination_top_n,
                    &resolver,
                )
                .await,
            },
            departures: DepartureReports {
                most_delayed,
                most_canceled,
                most_popular_destinations: find_popular_destinations(
                    &departure_destinations,
                    top.destination_top_n,
                    &resolver,
                )
                .await,
            },
            facilities: find_busiest_facilities(
                &arrivals,
                &departures,
                top.facility_top_n,
                &window,
                &resolver,
            )
            .await,
        };

        log_report("arrivals.most_landed", &reports.arrivals.most_landed);
        log_report("arrivals.most_diverted", &reports.arrivals.most_diverted);
        log_report(
            "arrivals.most_popular_destinations",
            &reports.arrivals.most_popular_destinations,
        );
        log_report("departures.most_delayed", &reports.departures.most_delayed);
        log_report("departures.most_canceled", &reports.departures.most_canceled);
        log_report(
            "departures.most_popular_destinations",
            &reports.departures.most_popular_destinations,
        );

        info!(
            arrivals = arrivals.len(),
            departures = departures.len(),
            "Flights processed"
        );

        Ok(ProcessedFlights {
            arrivals,
            arrival_destinations,
            departures,
            departure_destinations,
            reports,
        })
    }

    /// Replaces the four flight tables in storage.
    ///
    /// # Errors
    ///
    /// Only [`EtlError::CredentialMissing`]. Failures of individual tables are
    /// logged and collected in [`LoadSummary::failed`].
    #[tracing::instrument(skip_all)]
    pub async fn load(&mut self, processed: &ProcessedFlights) -> Result<LoadSummary> {
        self.stage = Stage::Loading;
        self.config.database.connection()?;

        if let Err(e) = self.sink.ensure_schema().await {
            if e.is_fatal() {
                return Err(e);
            }
            error!(error = %e, "Could not ensure destination schema");
        }

        let mut summary = LoadSummary::default();
        for (name, table) in processed.tables() {
            info!(table = name, rows = table.len(), "Storing table");
            match self.sink.replace_table(name, &table).await {
                Ok(()) => {
                    info!(table = name, "Table successfully written to database");
                    summary.written.push(name.to_string());
                }
                Err(e) if e.is_fatal() => return Err(e),
                Err(e) => {
                    error!(table = name, error = %e, "Table write failed");
                    summary.failed.push((name.to_string(), e.to_string()));
                }
            }
        }
        Ok(summary)
    }

    /// Uploads each facility report as CSV under
    /// `{window}/{report}{suffix}`. Empty reports are uploaded too.
    ///
    /// # Errors
    ///
    /// The first upload or encoding error.
    #[tracing::instrument(skip_all)]
    pub async fn upload(&mut self, facilities: &FacilitiesReport) -> Result<Vec<String>> {
        self.stage = Stage::Uploading;

        let mut keys = Vec::new();
        for table in facilities.tables() {
            let key = format!(
                "{}/{}{}",
                table.window, table.name, self.config.storage.key_suffix
            );
            if table.is_empty() {
                warn!(key = %key, "Report is empty, uploading header only");
            }

            let body = to_csv(&table.to_table())?;
            self.store
                .put_object(&key, Bytes::from(body), "text/csv")
                .await?;
            keys.push(key);
        }
        Ok(keys)
    }

    /// Runs every stage in order. Never panics and never returns an error:
    /// the outcome, including a fatal error, is in the [`RunReport`].
    pub async fn run(&mut self) -> RunReport {
        let mut report = RunReport::new();

        info!("Extracting data");
        let raw = match self.extract().await {
            Ok(raw) => raw,
            Err(e) => return self.fail(report, e),
        };
        report.window = Some(raw.window_label());
        report.fetched = raw.flights.len();
        report.fetch_stop = Some(raw.stop.clone());

        info!("Data processing");
        let processed = match self.process(&raw).await {
            Ok(processed) => processed,
            Err(e) => return self.fail(report, e),
        };

        info!("Data storing");
        match self.load(&processed).await {
            Ok(summary) => report.load = Some(summary),
            Err(e) => return self.fail(report, e),
        }

        info!("Uploading reports");
        match self.upload(&processed.reports.facilities).await {
            Ok(keys) => report.uploaded = keys,
            Err(e) => return self.fail(report, e),
        }

        self.stage = Stage::Done;
        report.stage = Stage::Done;
        info!("Success");
        report
    }

    fn fail(&mut self, mut report: RunReport, e: EtlError) -> RunReport {
        error!(stage = ?self.stage, error = %e, "Pipeline run failed");
        report.failed_at = Some(self.stage);
        self.stage = Stage::Failed;
        report.stage = Stage::Failed;
        report.error = Some(e);
        report
    }
}

fn log_report(name: &str, report: &RankedReport) {
    debug!(report = name, "{:#?}", report.entries);
}

/// Builds the production collaborators from `config` and runs one window.
///
/// `window_hours` overrides the configured window length.
pub async fn run_etl(config: &Config, window_hours: Option<f64>) -> RunReport {
    let api = match SchipholClient::from_config(&config.api) {
        Ok(api) => api,
        Err(e) => {
            error!(error = %e, "Cannot build flight API client");
            let mut report = RunReport::new();
            report.stage = Stage::Failed;
            report.failed_at = Some(Stage::Extracting);
            report.error = Some(e);
            return report;
        }
    };

    let sink = PostgresSink::new(config.database.clone());
    let store = S3Store::from_env(&config.storage).await;

    let mut pipeline = Pipeline::new(config, api, sink, store);
    if let Some(hours) = window_hours {
        pipeline = pipeline.with_window_hours(hours);
    }
    pipeline.run().await
}
