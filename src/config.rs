use reqwest::Url;
use std::net::SocketAddr;
use std::time::Duration;

const DEFAULT_API_BASE_URL: &str = "http://localhost:4000/api";
const DEFAULT_APP_ORIGIN: &str = "http://localhost:5173";
const DEFAULT_BIND_ADDR: &str = "0.0.0.0:5173";
const DEFAULT_STATIC_DIR: &str = "static";
const DEFAULT_HTTP_TIMEOUT_SECS: u64 = 10;

/// Server-wide configuration, read once at startup
#[derive(Debug, Clone)]
pub struct AppConfig {
    /// Root of the trivia backend REST API
    pub api_base_url: String,
    /// Public origin of this app, used for challenge links
    pub app_origin: Url,
    /// Address the app host listens on
    pub bind_addr: SocketAddr,
    /// Directory with the pre-built front-end
    pub static_dir: String,
    /// Per-request timeout for backend calls
    pub request_timeout: Duration,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            api_base_url: DEFAULT_API_BASE_URL.to_string(),
            app_origin: default_origin(),
            bind_addr: default_bind_addr(),
            static_dir: DEFAULT_STATIC_DIR.to_string(),
            request_timeout: Duration::from_secs(DEFAULT_HTTP_TIMEOUT_SECS),
        }
    }
}

fn default_origin() -> Url {
    Url::parse(DEFAULT_APP_ORIGIN).expect("default origin is a valid URL")
}

fn default_bind_addr() -> SocketAddr {
    DEFAULT_BIND_ADDR
        .parse()
        .expect("default bind address is valid")
}

/// Read a trimmed, non-empty environment variable
fn env_var(key: &str) -> Option<String> {
    std::env::var(key).ok().and_then(|value| {
        let trimmed = value.trim();
        (!trimmed.is_empty()).then(|| trimmed.to_string())
    })
}

impl AppConfig {
    /// Load configuration from environment variables, falling back to
    /// defaults for anything missing or unparsable
    pub fn from_env() -> Self {
        let defaults = Self::default();

        let api_base_url = env_var("TRIVIA_API_BASE_URL")
            .map(|url| url.trim_end_matches('/').to_string())
            .unwrap_or(defaults.api_base_url);

        let app_origin = match env_var("TRIVIA_APP_ORIGIN") {
            Some(raw) => Url::parse(&raw).unwrap_or_else(|e| {
                tracing::warn!("Invalid TRIVIA_APP_ORIGIN '{}': {}, using default", raw, e);
                defaults.app_origin.clone()
            }),
            None => defaults.app_origin,
        };

        let bind_addr = match env_var("TRIVIA_BIND_ADDR") {
            Some(raw) => raw.parse().unwrap_or_else(|e| {
                tracing::warn!("Invalid TRIVIA_BIND_ADDR '{}': {}, using default", raw, e);
                defaults.bind_addr
            }),
            None => defaults.bind_addr,
        };

        let request_timeout = match env_var("TRIVIA_HTTP_TIMEOUT") {
            Some(raw) => match raw.parse::<u64>() {
                Ok(0) => {
                    tracing::warn!("TRIVIA_HTTP_TIMEOUT must be at least 1 second, using default");
                    defaults.request_timeout
                }
                Ok(secs) => Duration::from_secs(secs),
                Err(e) => {
                    tracing::warn!("Invalid TRIVIA_HTTP_TIMEOUT '{}': {}, using default", raw, e);
                    defaults.request_timeout
                }
            },
            None => defaults.request_timeout,
        };

        Self {
            api_base_url,
            app_origin,
            bind_addr,
            static_dir: env_var("TRIVIA_STATIC_DIR").unwrap_or(defaults.static_dir),
            request_timeout,
        }
    }

    /// Per-connection session configuration
    pub fn session_config(&self, challenger: Option<String>) -> SessionConfig {
        SessionConfig {
            app_origin: self.app_origin.clone(),
            challenger,
        }
    }
}

/// Everything a session needs to know about its surroundings, passed in
/// explicitly when the session starts
#[derive(Debug, Clone)]
pub struct SessionConfig {
    /// Origin challenge links point at
    pub app_origin: Url,
    /// Username from the `challenger` entry parameter, if any
    pub challenger: Option<String>,
}

impl Default for SessionConfig {
    fn default() -> Self {
        AppConfig::default().session_config(None)
    }
}
