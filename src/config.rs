use std::env;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("JWT_SECRET or SECRET_KEY environment variable not set")]
    MissingJwtSecret,

    #[error("Invalid PORT value {value:?}: {source}")]
    InvalidPort {
        value: String,
        source: std::num::ParseIntError,
    },
}

/// OpenTelemetry export settings
#[derive(Debug, Clone, PartialEq)]
pub struct OtelConfig {
    pub enabled: bool,
    pub endpoint: String,
    pub service_name: String,
    pub environment: String,
    pub sampling_rate: f64,
}

/// Process configuration, read once at startup
#[derive(Debug, Clone)]
pub struct AppConfig {
    /// `None` selects the in-memory stamp store
    pub database_url: Option<String>,
    pub jwt_secret: String,
    pub port: u16,
    pub otel: OtelConfig,
}

impl AppConfig {
    /// Load configuration from the environment, after applying any `.env` file
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenv::dotenv().ok();
        Self::from_lookup(|key| env::var(key).ok())
    }

    fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let database_url = lookup("DATABASE_URL").or_else(|| lookup("RDS_PROXY_URL"));

        // Secrets injected through secret managers sometimes keep their JSON quotes
        let jwt_secret = lookup("JWT_SECRET")
            .or_else(|| lookup("SECRET_KEY"))
            .map(|s| s.trim_matches('"').to_string())
            .filter(|s| !s.is_empty())
            .ok_or(ConfigError::MissingJwtSecret)?;

        let port = match lookup("PORT") {
            Some(value) => value
                .parse::<u16>()
                .map_err(|source| ConfigError::InvalidPort { value, source })?,
            None => 3000,
        };

        let otel = OtelConfig {
            enabled: lookup("OTEL_ENABLED").as_deref() == Some("true"),
            endpoint: lookup("OTEL_EXPORTER_OTLP_ENDPOINT")
                .unwrap_or_else(|| "http://localhost:4318/v1/traces".to_string()),
            service_name: lookup("OTEL_SERVICE_NAME")
                .unwrap_or_else(|| "ceramic-cache".to_string()),
            environment: lookup("ENVIRONMENT").unwrap_or_else(|| "development".to_string()),
            sampling_rate: lookup("OTEL_TRACE_SAMPLING_RATE")
                .and_then(|s| s.parse::<f64>().ok())
                .unwrap_or(0.01)
                .clamp(0.0, 1.0),
        };

        Ok(Self {
            database_url,
            jwt_secret,
            port,
            otel,
        })
    }
}
