//! Process-wide configuration, resolved once at start-up.
//!
//! Values come from the environment (after `.env` is loaded by the binary).
//! Credentials stay optional here; the stage that needs them checks presence
//! and fails with [`EtlError::CredentialMissing`].

use crate::error::{EtlError, Result};

/// Pagination never requests more than this many pages (indices `0..=50`).
pub const MAX_PAGES: u32 = 51;

#[derive(Debug, Clone)]
pub struct Config {
    pub api: ApiConfig,
    pub database: DatabaseConfig,
    pub storage: StorageConfig,
    pub reports: ReportConfig,
}

#[derive(Debug, Clone)]
pub struct ApiConfig {
    pub base_url: String,
    pub app_id: Option<String>,
    pub app_key: Option<String>,
    pub resource_version: String,
    pub schema_version: String,
    pub window_hours: f64,
    pub max_pages: u32,
    pub timeout_secs: u64,
}

/// Borrowed view of the two API credentials once both are known to be present.
#[derive(Debug, Clone, Copy)]
pub struct ApiCredentials<'a> {
    pub app_id: &'a str,
    pub app_key: &'a str,
}

impl ApiConfig {
    pub fn credentials(&self) -> Result<ApiCredentials<'_>> {
        let app_id = self
            .app_id
            .as_deref()
            .ok_or(EtlError::CredentialMissing("FLIGHT_API_APP_ID"))?;
        let app_key = self
            .app_key
            .as_deref()
            .ok_or(EtlError::CredentialMissing("FLIGHT_API_APP_KEY"))?;
        Ok(ApiCredentials { app_id, app_key })
    }
}

#[derive(Debug, Clone)]
pub struct DatabaseConfig {
    pub host: Option<String>,
    pub port: Option<u16>,
    pub user: Option<String>,
    pub password: Option<String>,
    pub name: Option<String>,
    pub schema: String,
}

/// Fully specified connection parameters.
#[derive(Debug, Clone)]
pub struct DatabaseConnection {
    pub host: String,
    pub port: u16,
    pub user: String,
    pub password: String,
    pub name: String,
    pub schema: String,
}

impl DatabaseConfig {
    pub fn connection(&self) -> Result<DatabaseConnection> {
        fn require<T: Clone>(value: &Option<T>, name: &'static str) -> Result<T> {
            value.clone().ok_or(EtlError::CredentialMissing(name))
        }

        Ok(DatabaseConnection {
            host: require(&self.host, "DB_HOST")?,
            port: require(&self.port, "DB_PORT")?,
            user: require(&self.user, "DB_USER")?,
            password: require(&self.password, "DB_PASSWORD")?,
            name: require(&self.name, "DB_NAME")?,
            schema: self.schema.clone(),
        })
    }
}

#[derive(Debug, Clone)]
pub struct StorageConfig {
    pub bucket: Option<String>,
    pub key_suffix: String,
}

/// How many entries each ranked report keeps.
#[derive(Debug, Clone, Copy)]
pub struct ReportConfig {
    pub state_top_n: usize,
    pub destination_top_n: usize,
    pub facility_top_n: usize,
}

impl Default for ReportConfig {
    fn default() -> Self {
        Self {
            state_top_n: 5,
            destination_top_n: 10,
            facility_top_n: 10,
        }
    }
}

impl Config {
    /// Reads the configuration from process environment variables.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Builds the configuration from an arbitrary variable source.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |name: &str| lookup(name).filter(|v| !v.is_empty());
        let or = |name: &str, default: &str| get(name).unwrap_or_else(|| default.to_string());

        let window_hours: f64 = parse_or(get("DATA_WINDOW_HOURS"), "DATA_WINDOW_HOURS", 0.5)?;
        if !(window_hours.is_finite() && window_hours > 0.0) {
            return Err(EtlError::Config(format!(
                "DATA_WINDOW_HOURS must be a positive number, got {window_hours}"
            )));
        }

        let port = match get("DB_PORT") {
            Some(raw) => Some(
                raw.parse::<u16>()
                    .map_err(|e| EtlError::Config(format!("DB_PORT '{raw}': {e}")))?,
            ),
            None => None,
        };

        Ok(Self {
            api: ApiConfig {
                base_url: or("FLIGHT_API_BASE_URL", "https://api.schiphol.nl/public-flights"),
                app_id: get("FLIGHT_API_APP_ID"),
                app_key: get("FLIGHT_API_APP_KEY"),
                resource_version: or("FLIGHT_API_RESOURCE_VERSION", "v4"),
                schema_version: or("FLIGHT_SCHEMA_VERSION", "4"),
                window_hours,
                max_pages: MAX_PAGES,
                timeout_secs: parse_or(
                    get("FLIGHT_API_TIMEOUT_SECS"),
                    "FLIGHT_API_TIMEOUT_SECS",
                    30,
                )?,
            },
            database: DatabaseConfig {
                host: get("DB_HOST"),
                port,
                user: get("DB_USER"),
                password: get("DB_PASSWORD"),
                name: get("DB_NAME"),
                schema: or("DB_SCHEMA", "public"),
            },
            storage: StorageConfig {
                bucket: get("S3_BUCKET_NAME"),
                key_suffix: or("S3_BASE_KEY", "_window_report.csv"),
            },
            reports: ReportConfig::default(),
        })
    }
}

fn parse_or<T>(raw: Option<String>, name: &str, default: T) -> Result<T>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    match raw {
        Some(value) => value
            .parse()
            .map_err(|e| EtlError::Config(format!("{name} '{value}': {e}"))),
        None => Ok(default),
    }
}
