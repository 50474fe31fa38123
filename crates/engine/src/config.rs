//! Engine configuration from environment variables.

use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;

/// Default TTL for cached location listings.
pub const DEFAULT_LOCATION_CACHE_TTL_SECS: u64 = 300;

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("{name} has invalid value '{value}': {reason}")]
    Invalid {
        name: &'static str,
        value: String,
        reason: String,
    },
    #[error("{0} must be set when LOCATION_BACKEND=postgrest")]
    Missing(&'static str),
}

/// Where location rows are read from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LocationBackend {
    Sqlite,
    Postgrest { url: String, api_key: String },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EngineConfig {
    pub location_backend: LocationBackend,
    /// SQLite file for designer profiles, and for locations with the SQLite backend.
    pub database_path: String,
    pub server_host: String,
    pub server_port: u16,
    pub location_cache_ttl: Duration,
    pub location_seed_path: Option<PathBuf>,
    /// Comma separated origins, or `*`.
    pub cors_allowed_origins: Option<String>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            location_backend: LocationBackend::Sqlite,
            database_path: "roomcraft.db".to_string(),
            server_host: "0.0.0.0".to_string(),
            server_port: 3000,
            location_cache_ttl: Duration::from_secs(DEFAULT_LOCATION_CACHE_TTL_SECS),
            location_seed_path: None,
            cors_allowed_origins: None,
        }
    }
}

impl EngineConfig {
    /// Read configuration from the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Read configuration through `lookup`; unset and blank values use defaults.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let var = |name: &str| {
            lookup(name)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };
        let defaults = Self::default();

        let location_backend = match var("LOCATION_BACKEND").as_deref() {
            None | Some("sqlite") => LocationBackend::Sqlite,
            Some("postgrest") => LocationBackend::Postgrest {
                url: var("POSTGREST_URL").ok_or(ConfigError::Missing("POSTGREST_URL"))?,
                api_key: var("POSTGREST_API_KEY")
                    .ok_or(ConfigError::Missing("POSTGREST_API_KEY"))?,
            },
            Some(other) => {
                return Err(ConfigError::Invalid {
                    name: "LOCATION_BACKEND",
                    value: other.to_string(),
                    reason: "expected 'sqlite' or 'postgrest'".to_string(),
                })
            }
        };

        let server_port = parse_var("SERVER_PORT", var("SERVER_PORT").or_else(|| var("PORT")))?
            .unwrap_or(defaults.server_port);
        let location_cache_ttl = parse_var::<u64>("LOCATION_CACHE_TTL_SECS", var("LOCATION_CACHE_TTL_SECS"))?
            .map(Duration::from_secs)
            .unwrap_or(defaults.location_cache_ttl);

        Ok(Self {
            location_backend,
            database_path: var("DATABASE_PATH").unwrap_or(defaults.database_path),
            server_host: var("SERVER_HOST").unwrap_or(defaults.server_host),
            server_port,
            location_cache_ttl,
            location_seed_path: var("LOCATION_SEED_PATH").map(PathBuf::from),
            cors_allowed_origins: var("CORS_ALLOWED_ORIGINS"),
        })
    }

    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.server_host, self.server_port)
    }
}

fn parse_var<T>(name: &'static str, value: Option<String>) -> Result<Option<T>, ConfigError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    value
        .map(|raw| {
            raw.parse::<T>().map_err(|e| ConfigError::Invalid {
                name,
                value: raw.clone(),
                reason: e.to_string(),
            })
        })
        .transpose()
}

/// Load `.env.local` then `.env` from `dir`, without overriding variables
/// already present in the environment.
pub fn load_dotenv(dir: &Path) {
    for filename in [".env.local", ".env"] {
        let path = dir.join(filename);
        if path.exists() {
            if let Err(e) = dotenvy::from_path(&path) {
                tracing::warn!(path = %path.display(), error = %e, "Ignoring unreadable env file");
            }
        }
    }
}
