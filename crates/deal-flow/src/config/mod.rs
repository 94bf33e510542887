use std::env;
use std::fmt;
use std::net::{IpAddr, SocketAddr};

use crate::workflows::feasibility::FeasibilityAssumptions;

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
    pub feasibility: FeasibilityConfig,
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

        Ok(Self {
            environment,
            server: ServerConfig { host, port },
            telemetry: TelemetryConfig { log_level },
            feasibility: FeasibilityConfig::from_env()?,
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

/// Tracing and metrics controls.
#[derive(Debug, Clone)]
pub struct TelemetryConfig {
    pub log_level: String,
}

/// Business constants of the feasibility engine plus the default ROI target.
#[derive(Debug, Clone, PartialEq)]
pub struct FeasibilityConfig {
    pub assumptions: FeasibilityAssumptions,
    pub target_roi: f64,
}

impl FeasibilityConfig {
    pub const DEFAULT_TARGET_ROI: f64 = 30.0;

    fn from_env() -> Result<Self, ConfigError> {
        let defaults = FeasibilityAssumptions::default();

        let assumptions = FeasibilityAssumptions {
            brokerage_percent: percent_var("DEAL_BROKERAGE_PERCENT", defaults.brokerage_percent)?,
            auctioneer_percent: percent_var(
                "DEAL_AUCTIONEER_PERCENT",
                defaults.auctioneer_percent,
            )?,
            income_tax_percent: percent_var(
                "DEAL_INCOME_TAX_PERCENT",
                defaults.income_tax_percent,
            )?,
            condo_debt_cap_percent: percent_var(
                "DEAL_CONDO_DEBT_CAP_PERCENT",
                defaults.condo_debt_cap_percent,
            )?,
            default_financing_rate: percent_var(
                "DEAL_DEFAULT_FINANCING_RATE",
                defaults.default_financing_rate,
            )?,
            default_financing_term: months_var(
                "DEAL_DEFAULT_FINANCING_TERM",
                defaults.default_financing_term,
            )?,
            default_sales_period: months_var(
                "DEAL_DEFAULT_SALES_PERIOD",
                defaults.default_sales_period,
            )?,
        };

        Ok(Self {
            assumptions,
            target_roi: percent_var("DEAL_TARGET_ROI", Self::DEFAULT_TARGET_ROI)?,
        })
    }
}

impl Default for FeasibilityConfig {
    fn default() -> Self {
        Self {
            assumptions: FeasibilityAssumptions::default(),
            target_roi: Self::DEFAULT_TARGET_ROI,
        }
    }
}

fn percent_var(key: &'static str, default: f64) -> Result<f64, ConfigError> {
    match env::var(key) {
        Ok(raw) => raw
            .trim()
            .parse::<f64>()
            .ok()
            .filter(|value| value.is_finite() && *value >= 0.0)
            .ok_or(ConfigError::InvalidAssumption { key }),
        Err(_) => Ok(default),
    }
}

/// Month counts must be at least one.
fn months_var(key: &'static str, default: u32) -> Result<u32, ConfigError> {
    match env::var(key) {
        Ok(raw) => raw
            .trim()
            .parse::<u32>()
            .ok()
            .filter(|value| *value > 0)
            .ok_or(ConfigError::InvalidAssumption { key }),
        Err(_) => Ok(default),
    }
}

#[derive(Debug)]
pub enum ConfigError {
    InvalidPort,
    InvalidHost { source: std::net::AddrParseError },
    InvalidAssumption { key: &'static str },
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::InvalidPort => write!(f, "APP_PORT must be a valid u16"),
            ConfigError::InvalidHost { .. } => {
                write!(f, "APP_HOST must parse to an IPv4 or IPv6 address")
            }
            ConfigError::InvalidAssumption { key } => {
                write!(f, "{key} must be a non-negative number")
            }
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ConfigError::InvalidPort | ConfigError::InvalidAssumption { .. } => None,
            ConfigError::InvalidHost { source } => Some(source),
        }
    }
}
