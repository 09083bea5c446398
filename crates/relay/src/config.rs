//! Environment-sourced configuration, following `notify::Notifier::from_env()`'s
//! `ENV_*` constant convention rather than a config-file crate.

const ENV_HOST: &str = "HOST";
const ENV_PORT: &str = "PORT";
const ENV_BASE_URL: &str = "BASE_URL";
const ENV_ESCALATION_CHECK_INTERVAL: &str = "ESCALATION_CHECK_INTERVAL";
const ENV_MONGODB_URI: &str = "MONGODB_URI";
const ENV_MONGODB_DATABASE: &str = "MONGODB_DATABASE";
const ENV_SESSION_COOKIE_NAME: &str = "SESSION_COOKIE_NAME";
const ENV_NOTIFY_DISABLED: &str = "NOTIFY_DISABLED";
const ENV_LOG_FORMAT: &str = "LOG_FORMAT";

/// Selects the `tracing-subscriber` formatter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    Json,
    Pretty,
}

#[derive(Debug, Clone)]
pub struct Config {
    pub host: String,
    pub port: u16,
    pub base_url: String,
    pub escalation_check_interval_secs: u64,
    pub mongodb_uri: String,
    pub mongodb_database: String,
    /// Unused by the core (session auth is out of scope), but part of the
    /// documented environment surface and threaded through for whatever
    /// owns the admin UI.
    pub session_cookie_name: String,
    pub notify_disabled: bool,
    pub log_format: LogFormat,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 5032,
            base_url: "http://localhost:5032".to_string(),
            escalation_check_interval_secs: 5,
            mongodb_uri: "mongodb://localhost:27017".to_string(),
            mongodb_database: "bullet".to_string(),
            session_cookie_name: "bullet_session".to_string(),
            notify_disabled: false,
            log_format: LogFormat::Json,
        }
    }
}

impl Config {
    #[must_use]
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            host: std::env::var(ENV_HOST).unwrap_or(defaults.host),
            port: std::env::var(ENV_PORT)
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(defaults.port),
            base_url: std::env::var(ENV_BASE_URL).unwrap_or(defaults.base_url),
            escalation_check_interval_secs: std::env::var(ENV_ESCALATION_CHECK_INTERVAL)
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(defaults.escalation_check_interval_secs),
            mongodb_uri: std::env::var(ENV_MONGODB_URI).unwrap_or(defaults.mongodb_uri),
            mongodb_database: std::env::var(ENV_MONGODB_DATABASE).unwrap_or(defaults.mongodb_database),
            session_cookie_name: std::env::var(ENV_SESSION_COOKIE_NAME)
                .unwrap_or(defaults.session_cookie_name),
            notify_disabled: std::env::var(ENV_NOTIFY_DISABLED)
                .ok()
                .is_some_and(|v| v == "1" || v.eq_ignore_ascii_case("true")),
            log_format: match std::env::var(ENV_LOG_FORMAT).as_deref() {
                Ok("pretty") => LogFormat::Pretty,
                _ => LogFormat::Json,
            },
        }
    }
}
