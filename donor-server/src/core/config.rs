use std::path::PathBuf;
use std::time::Duration;

use chrono::NaiveTime;

use crate::auth::JwtConfig;

/// Server configuration
///
/// # Environment variables
///
/// | Variable | Default | Meaning |
/// |----------|---------|---------|
/// | WORK_DIR | ./data | data directory |
/// | DATABASE_PATH | `<WORK_DIR>/donor.db` | SQLite file |
/// | HTTP_PORT | 5000 | HTTP port |
/// | ENVIRONMENT | development | development / staging / production |
/// | OPERATION_TIMEOUT_MS | 10000 | bound on one acceptance or persistence call |
/// | SWEEP_AT | 02:10 | local time of the daily re-enable sweep |
/// | SWEEP_ON_STARTUP | true | run the sweep once at boot |
/// | COOLDOWN_MONTHS | 3 | cooldown after a search-request acceptance |
/// | LEGACY_COOLDOWN_DAYS | 90 | cooldown after a legacy request acceptance |
/// | CORS_ORIGINS | * | comma separated allowed origins |
/// | SHUTDOWN_TIMEOUT_MS | 10000 | grace period for background tasks |
#[derive(Debug, Clone)]
pub struct Config {
    /// Data directory
    pub work_dir: String,
    /// SQLite database file
    pub database_path: String,
    pub http_port: u16,
    pub jwt: JwtConfig,
    /// development | staging | production
    pub environment: String,
    pub operation_timeout_ms: u64,
    pub shutdown_timeout_ms: u64,
    /// Daily sweep time, server local time
    pub sweep_at: NaiveTime,
    pub sweep_on_startup: bool,
    pub cooldown_months: u32,
    pub legacy_cooldown_days: i64,
    pub cors_origins: Vec<String>,
}

fn env_parse<T: std::str::FromStr>(key: &str, default: T) -> T {
    std::env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

fn default_sweep_at() -> NaiveTime {
    NaiveTime::from_hms_opt(2, 10, 0).unwrap_or(NaiveTime::MIN)
}

impl Config {
    /// Load configuration from the environment, falling back to defaults
    pub fn from_env() -> Self {
        let work_dir = std::env::var("WORK_DIR").unwrap_or_else(|_| "./data".into());
        let database_path = std::env::var("DATABASE_PATH").unwrap_or_else(|_| {
            PathBuf::from(&work_dir)
                .join("donor.db")
                .to_string_lossy()
                .into_owned()
        });

        let sweep_at = match std::env::var("SWEEP_AT") {
            Ok(raw) => crate::utils::time::parse_time_of_day(&raw).unwrap_or_else(|e| {
                tracing::warn!("Invalid SWEEP_AT '{}': {}, falling back to 02:10", raw, e);
                default_sweep_at()
            }),
            Err(_) => default_sweep_at(),
        };

        let cors_origins = std::env::var("CORS_ORIGINS")
            .unwrap_or_else(|_| "*".into())
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect();

        Self {
            work_dir,
            database_path,
            http_port: env_parse("HTTP_PORT", 5000),
            jwt: JwtConfig::default(),
            environment: std::env::var("ENVIRONMENT").unwrap_or_else(|_| "development".into()),
            operation_timeout_ms: env_parse("OPERATION_TIMEOUT_MS", 10_000),
            shutdown_timeout_ms: env_parse("SHUTDOWN_TIMEOUT_MS", 10_000),
            sweep_at,
            sweep_on_startup: env_parse("SWEEP_ON_STARTUP", true),
            cooldown_months: env_parse("COOLDOWN_MONTHS", 3),
            legacy_cooldown_days: env_parse("LEGACY_COOLDOWN_DAYS", 90),
            cors_origins,
        }
    }

    /// Override the storage location and port
    ///
    /// Used by tests
    pub fn with_overrides(
        work_dir: impl Into<String>,
        database_path: impl Into<String>,
        http_port: u16,
    ) -> Self {
        let mut config = Self::from_env();
        config.work_dir = work_dir.into();
        config.database_path = database_path.into();
        config.http_port = http_port;
        config
    }

    pub fn operation_timeout(&self) -> Duration {
        Duration::from_millis(self.operation_timeout_ms)
    }

    pub fn is_production(&self) -> bool {
        self.environment == "production"
    }

    pub fn is_development(&self) -> bool {
        self.environment == "development"
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::from_env()
    }
}
