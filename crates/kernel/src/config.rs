//! Configuration loaded from environment variables.

use std::env;
use std::path::PathBuf;
use std::str::FromStr;

use anyhow::{Context, Result, bail};

use crate::locale::{Locale, LocaleSettings};

/// Which document store backs the catalog.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreBackend {
    /// JSONB documents in PostgreSQL.
    Postgres,
    /// Documents held in memory, optionally seeded from a file.
    Memory,
}

impl FromStr for StoreBackend {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "postgres" | "postgresql" => Ok(StoreBackend::Postgres),
            "memory" => Ok(StoreBackend::Memory),
            other => bail!("unknown store backend: {other} (expected postgres or memory)"),
        }
    }
}

/// Application configuration.
#[derive(Debug, Clone)]
pub struct Config {
    /// HTTP server port (default: 3000).
    pub port: u16,

    /// Document store backend (default: postgres).
    pub store_backend: StoreBackend,

    /// PostgreSQL connection URL. Required for the postgres backend.
    pub database_url: Option<String>,

    /// Maximum database connections in pool (default: 10).
    pub database_max_connections: u32,

    /// JSON seed file loaded at startup.
    pub seed_path: Option<PathBuf>,

    /// Locale used when a request names none or an unsupported one (default: vi).
    pub default_locale: Locale,

    /// Locales requests may select (default: vi,en).
    pub supported_locales: Vec<Locale>,

    /// CORS allowed origins (comma-separated, default: "*").
    pub cors_allowed_origins: Vec<String>,
}

impl Config {
    /// Load configuration from environment variables.
    pub fn from_env() -> Result<Self> {
        let port = env::var("PORT")
            .unwrap_or_else(|_| "3000".to_string())
            .parse()
            .context("PORT must be a valid u16")?;

        let store_backend = env::var("STORE_BACKEND")
            .unwrap_or_else(|_| "postgres".to_string())
            .parse()
            .context("STORE_BACKEND is invalid")?;

        let database_url = env::var("DATABASE_URL").ok();
        if store_backend == StoreBackend::Postgres && database_url.is_none() {
            bail!("DATABASE_URL environment variable is required for the postgres backend");
        }

        let database_max_connections = env::var("DATABASE_MAX_CONNECTIONS")
            .unwrap_or_else(|_| "10".to_string())
            .parse()
            .context("DATABASE_MAX_CONNECTIONS must be a valid u32")?;

        let seed_path = env::var("SEED_PATH")
            .ok()
            .filter(|v| !v.trim().is_empty())
            .map(PathBuf::from);

        let default_locale = env::var("DEFAULT_LOCALE")
            .unwrap_or_else(|_| "vi".to_string())
            .parse()
            .context("DEFAULT_LOCALE must be one of vi, en, km")?;

        let supported_locales = parse_locales(
            &env::var("SUPPORTED_LOCALES").unwrap_or_else(|_| "vi,en".to_string()),
        )
        .context("SUPPORTED_LOCALES must be a comma-separated list of vi, en, km")?;

        let cors_allowed_origins = env::var("CORS_ALLOWED_ORIGINS")
            .map(|v| v.split(',').map(|s| s.trim().to_string()).collect())
            .unwrap_or_else(|_| vec!["*".to_string()]);

        Ok(Self {
            port,
            store_backend,
            database_url,
            database_max_connections,
            seed_path,
            default_locale,
            supported_locales,
            cors_allowed_origins,
        })
    }

    /// Locale settings derived from the configured default and supported set.
    pub fn locale_settings(&self) -> LocaleSettings {
        LocaleSettings::new(self.default_locale, self.supported_locales.iter().copied())
    }
}

/// Parse a comma-separated locale list, ignoring empty entries.
fn parse_locales(raw: &str) -> Result<Vec<Locale>> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(|code| code.parse::<Locale>().map_err(anyhow::Error::from))
        .collect()
}
