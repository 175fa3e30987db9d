use anyhow::Result;
use moka::future::Cache;
use sea_orm::Database;
use serde::Deserialize;
use std::sync::Arc;
use std::time::Duration;

use crate::schemas::AppState;

pub const DEFAULT_DATABASE_URL: &str = "sqlite://taxi.db?mode=rwc";
pub const DEFAULT_BIND_ADDRESS: &str = "0.0.0.0:3000";
/// Two weeks.
pub const DEFAULT_SESSION_TTL_SECS: u64 = 1_209_600;
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 30;
const MAX_SESSIONS: u64 = 10_000;

/// Runtime settings. Defaults are overridden by environment variables
/// (`DATABASE_URL`, `BIND_ADDRESS`, `SESSION_TTL_SECS`,
/// `REQUEST_TIMEOUT_SECS`), which may also come from a `.env` file.
#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
    pub database_url: String,
    pub bind_address: String,
    pub session_ttl_secs: u64,
    pub request_timeout_secs: u64,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            database_url: DEFAULT_DATABASE_URL.to_string(),
            bind_address: DEFAULT_BIND_ADDRESS.to_string(),
            session_ttl_secs: DEFAULT_SESSION_TTL_SECS,
            request_timeout_secs: DEFAULT_REQUEST_TIMEOUT_SECS,
        }
    }
}

impl Settings {
    /// Load settings from defaults, `.env`, and the process environment.
    pub fn load() -> Result<Self> {
        dotenvy::dotenv().ok();

        let settings = config::Config::builder()
            .set_default("database_url", DEFAULT_DATABASE_URL)?
            .set_default("bind_address", DEFAULT_BIND_ADDRESS)?
            .set_default("session_ttl_secs", DEFAULT_SESSION_TTL_SECS as i64)?
            .set_default("request_timeout_secs", DEFAULT_REQUEST_TIMEOUT_SECS as i64)?
            .add_source(config::Environment::default().try_parsing(true))
            .build()?;

        Ok(settings.try_deserialize()?)
    }

    pub fn session_ttl(&self) -> Duration {
        Duration::from_secs(self.session_ttl_secs)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

/// Connect to the configured database and build the shared state.
pub async fn initialize_app_state(settings: Settings) -> Result<AppState> {
    tracing::info!("Connecting to database: {}", settings.database_url);
    let db = Database::connect(&settings.database_url).await?;

    let sessions = Cache::builder()
        .max_capacity(MAX_SESSIONS)
        .time_to_live(settings.session_ttl())
        .build();

    Ok(AppState {
        db,
        sessions,
        settings: Arc::new(settings),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_settings() {
        let settings = Settings::default();
        assert_eq!(settings.bind_address, "0.0.0.0:3000");
        assert_eq!(settings.session_ttl(), Duration::from_secs(14 * 24 * 60 * 60));
        assert_eq!(settings.request_timeout(), Duration::from_secs(30));
    }
}
