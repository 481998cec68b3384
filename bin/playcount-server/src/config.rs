//! Server configuration, loaded from environment variables at startup.

use std::time::Duration;

/// Runtime configuration for playcount-server.
///
/// Every field has a default so the server starts without any environment
/// variables set; only the osu! API token is needed for polling to succeed.
#[derive(Debug, Clone)]
pub struct Config {
    /// TCP address to bind (default: `"0.0.0.0:8080"`).
    pub bind_address: String,

    /// sqlx SQLite URL (default: `"sqlite://playcount.db"`).
    pub database_url: String,

    /// `tracing` filter string, e.g. `"info"` or `"debug,tower_http=warn"`.
    pub log_level: String,

    /// When `true`, emit log records as newline-delimited JSON.
    pub log_json: bool,

    /// osu! API v2 base URL.
    pub osu_api_url: String,

    /// Bearer token for the osu! API. Empty means unauthenticated requests.
    pub osu_api_token: String,

    /// Seconds between scheduled tracking passes; `0` disables the scheduler.
    pub track_interval_secs: u64,

    /// Delay between two users within one pass.
    pub track_pace_ms: u64,

    /// Attempts per osu! API request.
    pub api_retries: usize,

    /// Comma-separated CORS origins; unset allows any origin.
    pub cors_allowed_origins: Option<String>,

    pub enable_swagger: bool,

    /// Bearer token required on `/admin` routes; unset leaves them open.
    pub admin_token: Option<String>,
}

impl Config {
    /// Build [`Config`] from environment variables, falling back to defaults.
    pub fn from_env() -> Self {
        Self {
            bind_address: env_or("PLAYCOUNT_BIND", "0.0.0.0:8080"),
            database_url: env_or("PLAYCOUNT_DATABASE_URL", "sqlite://playcount.db"),
            log_level: env_or("PLAYCOUNT_LOG", "info"),
            log_json: env_flag("PLAYCOUNT_LOG_JSON", false),
            osu_api_url: env_or("PLAYCOUNT_OSU_API_URL", playcount_osuapi::DEFAULT_BASE_URL),
            osu_api_token: env_or("PLAYCOUNT_OSU_API_TOKEN", ""),
            track_interval_secs: parse_env("PLAYCOUNT_TRACK_INTERVAL_SECS", 24 * 60 * 60),
            track_pace_ms: parse_env("PLAYCOUNT_TRACK_PACE_MS", 200),
            api_retries: parse_env("PLAYCOUNT_API_RETRIES", 3),
            cors_allowed_origins: env_opt("PLAYCOUNT_CORS_ORIGINS"),
            enable_swagger: env_flag("PLAYCOUNT_ENABLE_SWAGGER", true),
            admin_token: env_opt("PLAYCOUNT_ADMIN_TOKEN"),
        }
    }

    /// `None` when scheduled tracking is disabled.
    pub fn track_interval(&self) -> Option<Duration> {
        (self.track_interval_secs > 0).then(|| Duration::from_secs(self.track_interval_secs))
    }

    pub fn track_pace(&self) -> Duration {
        Duration::from_millis(self.track_pace_ms)
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0:8080".to_owned(),
            database_url: "sqlite://playcount.db".to_owned(),
            log_level: "info".to_owned(),
            log_json: false,
            osu_api_url: playcount_osuapi::DEFAULT_BASE_URL.to_owned(),
            osu_api_token: String::new(),
            track_interval_secs: 24 * 60 * 60,
            track_pace_ms: 200,
            api_retries: 3,
            cors_allowed_origins: None,
            enable_swagger: true,
            admin_token: None,
        }
    }
}

// ── private helpers ──────────────────────────────────────────────────────────

fn env_or(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_owned())
}

fn env_opt(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.trim().is_empty())
}

fn env_flag(key: &str, default: bool) -> bool {
    std::env::var(key)
        .map(|v| v == "1" || v.eq_ignore_ascii_case("true"))
        .unwrap_or(default)
}

fn parse_env<T: std::str::FromStr>(key: &str, default: T) -> T {
    std::env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn zero_interval_disables_scheduler() {
        let cfg = Config {
            track_interval_secs: 0,
            ..Config::default()
        };
        assert_eq!(cfg.track_interval(), None);
        assert_eq!(
            Config::default().track_interval(),
            Some(Duration::from_secs(86_400))
        );
        assert_eq!(Config::default().track_pace(), Duration::from_millis(200));
    }
}
