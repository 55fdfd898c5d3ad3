use std::env;
use std::fmt;
use std::net::{IpAddr, SocketAddr};
use std::str::FromStr;
use std::time::Duration;

use crate::workflows::prospecting::evaluation::{
    BatchOptions, HttpWebsiteProbe, LevelThresholds, QualificationConfig,
    QualificationConfigError,
};

/// Distinguishes runtime behavior for different stages of the service.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppEnvironment {
    Development,
    Test,
    Production,
}

impl AppEnvironment {
    fn from_str(value: &str) -> Self {
        match value.trim().to_ascii_lowercase().as_str() {
            "prod" | "production" => Self::Production,
            "test" | "ci" => Self::Test,
            _ => Self::Development,
        }
    }
}

/// Top-level configuration for the application.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub environment: AppEnvironment,
    pub server: ServerConfig,
    pub telemetry: TelemetryConfig,
    pub qualification: QualificationSettings,
}

impl AppConfig {
    /// Reads `.env` (when present) and then the process environment.
    pub fn load() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Builds the configuration from an arbitrary key lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let environment = AppEnvironment::from_str(
            &lookup("APP_ENV").unwrap_or_else(|| "development".to_string()),
        );

        let host = lookup("APP_HOST").unwrap_or_else(|| "127.0.0.1".to_string());
        let port = lookup("APP_PORT")
            .unwrap_or_else(|| "3000".to_string())
            .trim()
            .parse::<u16>()
            .map_err(|_| ConfigError::InvalidPort)?;

        let log_level = lookup("APP_LOG_LEVEL").unwrap_or_else(|| "info".to_string());

        Ok(Self {
            environment,
            server: ServerConfig { host, port },
            telemetry: TelemetryConfig { log_level },
            qualification: QualificationSettings::from_lookup(&lookup)?,
        })
    }
}

/// Settings controlling the HTTP server binding.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

impl ServerConfig {
    pub fn socket_addr(&self) -> Result<SocketAddr, ConfigError> {
        if self.host.eq_ignore_ascii_case("localhost") {
            return Ok(SocketAddr::new(IpAddr::from([127, 0, 0, 1]), self.port));
        }

        let ip: IpAddr = self
            .host
            .parse()
            .map_err(|source| ConfigError::InvalidHost { source })?;

        Ok(SocketAddr::new(ip, self.port))
    }
}

/// Tracing controls.
#[derive(Debug, Clone)]
pub struct TelemetryConfig {
    pub log_level: String,
}

/// Engine rubric plus the knobs of the network-bound stages.
#[derive(Debug, Clone)]
pub struct QualificationSettings {
    pub engine: QualificationConfig,
    pub probe_timeout: Duration,
    pub probe_concurrency: usize,
    /// Company-registry base URL; enrichment is skipped when unset.
    pub registry_url: Option<String>,
}

impl QualificationSettings {
    fn from_lookup<F>(lookup: &F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = LevelThresholds::default();
        let thresholds = LevelThresholds::new(
            number(lookup, "LEAD_THRESHOLD_LOW", defaults.low())?,
            number(lookup, "LEAD_THRESHOLD_MEDIUM", defaults.medium())?,
            number(lookup, "LEAD_THRESHOLD_HIGH", defaults.high())?,
        )?;

        let engine = match lookup("LEAD_INDUSTRY_CODES").filter(|raw| !raw.trim().is_empty()) {
            Some(raw) => QualificationConfig::new(
                raw.split(',').filter(|code| !code.trim().is_empty()),
                thresholds,
            )?,
            None => QualificationConfig::default().with_thresholds(thresholds),
        };

        let timeout_secs = number(
            lookup,
            "LEAD_PROBE_TIMEOUT_SECS",
            HttpWebsiteProbe::DEFAULT_TIMEOUT.as_secs(),
        )?;
        let probe_concurrency = number(
            lookup,
            "LEAD_PROBE_CONCURRENCY",
            BatchOptions::DEFAULT_CONCURRENCY,
        )?;
        if timeout_secs == 0 {
            return Err(ConfigError::InvalidNumber {
                key: "LEAD_PROBE_TIMEOUT_SECS",
                value: "0".to_string(),
            });
        }
        if probe_concurrency == 0 {
            return Err(ConfigError::InvalidNumber {
                key: "LEAD_PROBE_CONCURRENCY",
                value: "0".to_string(),
            });
        }

        let registry_url = lookup("LEAD_REGISTRY_URL")
            .map(|raw| raw.trim().to_string())
            .filter(|raw| !raw.is_empty());

        Ok(Self {
            engine,
            probe_timeout: Duration::from_secs(timeout_secs),
            probe_concurrency,
            registry_url,
        })
    }

    pub fn batch_options(&self) -> BatchOptions {
        BatchOptions::with_concurrency(self.probe_concurrency)
    }
}

fn number<F, T>(lookup: &F, key: &'static str, default: T) -> Result<T, ConfigError>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
{
    match lookup(key) {
        Some(raw) => raw
            .trim()
            .parse::<T>()
            .map_err(|_| ConfigError::InvalidNumber { key, value: raw }),
        None => Ok(default),
    }
}

#[derive(Debug)]
pub enum ConfigError {
    InvalidPort,
    InvalidHost { source: std::net::AddrParseError },
    InvalidNumber { key: &'static str, value: String },
    Qualification(QualificationConfigError),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::InvalidPort => write!(f, "APP_PORT must be a valid u16"),
            ConfigError::InvalidHost { .. } => {
                write!(f, "APP_HOST must parse to an IPv4 or IPv6 address")
            }
            ConfigError::InvalidNumber { key, value } => {
                write!(f, "{key} must be a positive integer, got '{value}'")
            }
            ConfigError::Qualification(err) => write!(f, "invalid qualification rubric: {err}"),
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ConfigError::InvalidPort | ConfigError::InvalidNumber { .. } => None,
            ConfigError::InvalidHost { source } => Some(source),
            ConfigError::Qualification(err) => Some(err),
        }
    }
}

impl From<QualificationConfigError> for ConfigError {
    fn from(value: QualificationConfigError) -> Self {
        Self::Qualification(value)
    }
}
