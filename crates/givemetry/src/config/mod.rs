use std::env;
use std::fmt;
use std::fs;
use std::net::{IpAddr, SocketAddr};
use std::path::PathBuf;

use crate::intelligence::{FiscalCalendar, IntelligenceConfig};

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
    pub scoring: ScoringSource,
    pub intelligence: IntelligenceConfig,
}

impl AppConfig {
    pub fn load() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();

        let environment = AppEnvironment::from_str(
            &env::var("APP_ENV").unwrap_or_else(|_| "development".to_string()),
        );

        let host = env::var("APP_HOST").unwrap_or_else(|_| "127.0.0.1".to_string());
        let port = env::var("APP_PORT")
            .unwrap_or_else(|_| "3000".to_string())
            .parse::<u16>()
            .map_err(|_| ConfigError::InvalidPort)?;

        let log_level = env::var("APP_LOG_LEVEL").unwrap_or_else(|_| "info".to_string());

        let fiscal_year_start_month = match env::var("GIVEMETRY_FISCAL_YEAR_START_MONTH") {
            Ok(raw) => Some(parse_month(&raw)?),
            Err(_) => None,
        };
        let config_path = env::var("GIVEMETRY_SCORING_CONFIG")
            .ok()
            .filter(|value| !value.trim().is_empty())
            .map(PathBuf::from);
        let scoring = ScoringSource {
            config_path,
            fiscal_year_start_month,
        };
        let intelligence = scoring.resolve()?;

        Ok(Self {
            environment,
            server: ServerConfig { host, port },
            telemetry: TelemetryConfig { log_level },
            scoring,
            intelligence,
        })
    }
}

fn parse_month(raw: &str) -> Result<u32, ConfigError> {
    raw.trim()
        .parse::<u32>()
        .ok()
        .filter(|month| (1..=12).contains(month))
        .ok_or_else(|| ConfigError::InvalidFiscalMonth {
            value: raw.to_string(),
        })
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

/// Where the scoring configuration comes from. The env month overrides the document's.
#[derive(Debug, Clone, Default)]
pub struct ScoringSource {
    pub config_path: Option<PathBuf>,
    pub fiscal_year_start_month: Option<u32>,
}

impl ScoringSource {
    pub fn resolve(&self) -> Result<IntelligenceConfig, ConfigError> {
        let mut config = match &self.config_path {
            Some(path) => {
                let raw = fs::read_to_string(path).map_err(|source| ConfigError::ScoringFile {
                    path: path.clone(),
                    source,
                })?;
                IntelligenceConfig::from_json(&raw).map_err(|source| {
                    ConfigError::ScoringDocument {
                        path: path.clone(),
                        source,
                    }
                })?
            }
            None => IntelligenceConfig::default(),
        };
        if let Some(month) = self.fiscal_year_start_month {
            config.fiscal = FiscalCalendar::new(month);
        }
        Ok(config)
    }
}

#[derive(Debug)]
pub enum ConfigError {
    InvalidPort,
    InvalidHost {
        source: std::net::AddrParseError,
    },
    InvalidFiscalMonth {
        value: String,
    },
    ScoringFile {
        path: PathBuf,
        source: std::io::Error,
    },
    ScoringDocument {
        path: PathBuf,
        source: serde_json::Error,
    },
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::InvalidPort => write!(f, "APP_PORT must be a valid u16"),
            ConfigError::InvalidHost { .. } => {
                write!(f, "APP_HOST must parse to an IPv4 or IPv6 address")
            }
            ConfigError::InvalidFiscalMonth { value } => write!(
                f,
                "GIVEMETRY_FISCAL_YEAR_START_MONTH must be a month number \
                 from 1 to 12, got '{value}'"
            ),
            ConfigError::ScoringFile { path, .. } => {
                write!(f, "unable to read scoring config {}", path.display())
            }
            ConfigError::ScoringDocument { path, source } => {
                write!(f, "invalid scoring config {}: {source}", path.display())
            }
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ConfigError::InvalidPort | ConfigError::InvalidFiscalMonth { .. } => None,
            ConfigError::InvalidHost { source } => Some(source),
            ConfigError::ScoringFile { source, .. } => Some(source),
            ConfigError::ScoringDocument { source, .. } => Some(source),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::env;
    use std::sync::{Mutex, OnceLock};

    fn env_guard() -> &'static Mutex<()> {
        static GUARD: OnceLock<Mutex<()>> = OnceLock::new();
        GUARD.get_or_init(|| Mutex::new(()))
    }

    fn reset_env() {
        env::remove_var("APP_ENV");
        env::remove_var("APP_HOST");
        env::remove_var("APP_PORT");
        env::remove_var("APP_LOG_LEVEL");
        env::remove_var("GIVEMETRY_FISCAL_YEAR_START_MONTH");
        env::remove_var("GIVEMETRY_SCORING_CONFIG");
    }

    fn scratch_file(name: &str, contents: &str) -> PathBuf {
        let path = env::temp_dir().join(format!("givemetry-{}-{name}", std::process::id()));
        fs::write(&path, contents).expect("write scratch config");
        path
    }

    #[test]
    fn load_uses_defaults_when_env_missing() {
        let _lock = env_guard().lock().expect("env mutex poisoned");
        reset_env();
        let config = AppConfig::load().expect("config loads with defaults");
        assert_eq!(config.environment, AppEnvironment::Development);
        assert_eq!(config.server.host, "127.0.0.1");
        assert_eq!(config.server.port, 3000);
        assert_eq!(config.telemetry.log_level, "info");
        assert_eq!(config.intelligence, IntelligenceConfig::default());
    }

    #[test]
    fn accepts_localhost_host() {
        let _lock = env_guard().lock().expect("env mutex poisoned");
        reset_env();
        env::set_var("APP_HOST", "localhost");
        let config = AppConfig::load().expect("config loads");
        let addr = config.server.socket_addr().expect("localhost resolves");
        assert_eq!(addr, SocketAddr::new(IpAddr::from([127, 0, 0, 1]), 3000));
        reset_env();
    }

    #[test]
    fn fiscal_month_must_be_a_calendar_month() {
        let _lock = env_guard().lock().expect("env mutex poisoned");
        reset_env();
        env::set_var("GIVEMETRY_FISCAL_YEAR_START_MONTH", "13");
        let error = AppConfig::load().expect_err("month out of range");
        assert!(matches!(error, ConfigError::InvalidFiscalMonth { .. }));

        env::set_var("GIVEMETRY_FISCAL_YEAR_START_MONTH", "10");
        let config = AppConfig::load().expect("config loads");
        assert_eq!(config.intelligence.fiscal.start_month, 10);
        reset_env();
    }

    #[test]
    fn scoring_document_is_layered_under_env_overrides() {
        let _lock = env_guard().lock().expect("env mutex poisoned");
        reset_env();
        let path = scratch_file(
            "layered.json",
            r#"{ "fiscal": { "start_month": 4 }, "priority": { "unknown_lapse_risk": 0.6 } }"#,
        );
        env::set_var("GIVEMETRY_SCORING_CONFIG", &path);

        let config = AppConfig::load().expect("config loads");
        assert_eq!(config.intelligence.fiscal.start_month, 4);
        assert_eq!(config.intelligence.priority.unknown_lapse_risk, 0.6);

        env::set_var("GIVEMETRY_FISCAL_YEAR_START_MONTH", "1");
        let config = AppConfig::load().expect("config loads");
        assert_eq!(config.intelligence.fiscal.start_month, 1);

        reset_env();
        fs::remove_file(path).ok();
    }

    #[test]
    fn unreadable_scoring_document_is_an_error() {
        let _lock = env_guard().lock().expect("env mutex poisoned");
        reset_env();
        let path = scratch_file("broken.json", "{ not json");
        env::set_var("GIVEMETRY_SCORING_CONFIG", &path);
        let error = AppConfig::load().expect_err("invalid json");
        assert!(matches!(error, ConfigError::ScoringDocument { .. }));

        env::set_var("GIVEMETRY_SCORING_CONFIG", "/nonexistent/scoring.json");
        let error = AppConfig::load().expect_err("missing file");
        assert!(matches!(error, ConfigError::ScoringFile { .. }));

        reset_env();
        fs::remove_file(path).ok();
    }
}
