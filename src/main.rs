//! CLI entry point for the flight window ETL.
//!
//! `run` fetches one window of flights, stores the cleaned tables and uploads
//! the facility reports. The lookup subcommands query the provider directly.

use anyhow::{Result, bail};
use clap::{Parser, Subcommand};
use flight_window_etl::config::Config;
use flight_window_etl::infra::schiphol::SchipholClient;
use flight_window_etl::run_etl;
use flight_window_etl::services::flight_api::FlightApi;
use std::ffi::OsStr;
use std::path::Path;
use tracing::{error, info};
use tracing_subscriber::{
    EnvFilter, Layer,
    fmt::{self, format::FmtSpan},
    layer::SubscriberExt,
    util::SubscriberInitExt,
};

#[derive(Parser)]
#[command(name = "flight_window_etl")]
#[command(
    about = "Fetch a window of flight movements and publish ranked reports",
    long_about = None
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the ETL pipeline for the most recent window
    Run {
        /// Window length in hours (defaults to DATA_WINDOW_HOURS)
        #[arg(short, long)]
        window_hours: Option<f64>,
    },
    /// Print the public name of an airline
    LookupAirline {
        /// ICAO or IATA airline code
        #[arg(value_name = "CODE")]
        code: String,
    },
    /// Print the city of a destination airport
    LookupDestination {
        /// IATA airport code
        #[arg(value_name = "IATA")]
        iata: String,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok(); // Load .env file

    // Logging setup: colored stderr + JSON rolling log file
    let log_file_path = std::env::var("LOG_FILE_PATH")
        .unwrap_or_else(|_| "logs/flight_window_etl.log".to_string());
    let log_dir = Path::new(&log_file_path)
        .parent()
        .unwrap_or(Path::new("logs"));
    let log_file_name = Path::new(&log_file_path)
        .file_name()
        .unwrap_or(OsStr::new("flight_window_etl.log"));

    let file_appender = tracing_appender::rolling::daily(log_dir, log_file_name);
    let (non_blocking_file, _file_guard) = tracing_appender::non_blocking(file_appender);

    let stderr_layer = fmt::layer()
        .with_target(true)
        .with_span_events(FmtSpan::CLOSE)
        .with_ansi(true)
        .with_writer(std::io::stderr)
        .with_filter(EnvFilter::from_env("RUST_LOG").add_directive("info".parse()?));

    let json_layer = fmt::layer()
        .json()
        .with_current_span(true)
        .with_span_list(true)
        .with_writer(non_blocking_file)
        .with_filter(EnvFilter::from_env("RUST_LOG_JSON").add_directive("debug".parse()?));

    tracing_subscriber::registry()
        .with(stderr_layer)
        .with(json_layer)
        .init();

    let cli = Cli::parse();
    let config = Config::from_env()?;

    match cli.command {
        Commands::Run { window_hours } => {
            let report = run_etl(&config, window_hours).await;
            if report.succeeded() {
                info!(
                    window = report.window.as_deref().unwrap_or_default(),
                    fetched = report.fetched,
                    uploaded = report.uploaded.len(),
                    "ETL run complete"
                );
            } else {
                error!(
                    failed_at = ?report.failed_at,
                    error = ?report.error,
                    "ETL run failed"
                );
                bail!("ETL run failed");
            }
        }
        Commands::LookupAirline { code } => {
            let client = SchipholClient::from_config(&config.api)?;
            match client.fetch_airline(&code).await? {
                Some(airline) => println!("{}", airline.public_name),
                None => bail!("airline {code} not found"),
            }
        }
        Commands::LookupDestination { iata } => {
            let client = SchipholClient::from_config(&config.api)?;
            match client.fetch_destination(&iata).await? {
                Some(destination) => println!("{}", destination.city.unwrap_or(iata)),
                None => bail!("destination {iata} not found"),
            }
        }
    }

    Ok(())
}
