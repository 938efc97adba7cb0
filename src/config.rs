//! Application configuration loaded from environment variables.

use serde::Deserialize;
use strum::{Display, EnumString};

/// Which persistence backend to run against.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Display, EnumString, Default)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum StoreBackend {
    /// In-process maps; data is lost on exit.
    #[default]
    Memory,
    /// Hosted database over its REST interface.
    Rest,
}

/// Log output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Display, EnumString, Default)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum LogFormat {
    /// Human-readable lines.
    #[default]
    Text,
    /// One JSON object per event.
    Json,
}

/// Application configuration loaded from environment variables.
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    // === Persistence ===
    /// Persistence backend.
    #[serde(default)]
    pub store_backend: StoreBackend,

    /// Hosted database base URL (e.g. `https://<project>.supabase.co`).
    #[serde(default)]
    pub supabase_url: Option<String>,

    /// Hosted database service key.
    #[serde(default)]
    pub supabase_key: Option<String>,

    /// Timeout for each store request.
    #[serde(default = "default_http_timeout_ms")]
    pub http_timeout_ms: u64,

    // === Server Configuration ===
    /// HTTP server port.
    #[serde(default = "default_port")]
    pub port: u16,

    /// Log level (trace, debug, info, warn, error).
    #[serde(default = "default_log_level")]
    pub rust_log: String,

    /// Log output format.
    #[serde(default)]
    pub log_format: LogFormat,

    /// Enable verbose logging.
    #[serde(default)]
    pub verbose: bool,
}

fn default_http_timeout_ms() -> u64 {
    5000
}

fn default_port() -> u16 {
    5000
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for Config {
    fn default() -> Self {
        Self {
            store_backend: StoreBackend::default(),
            supabase_url: None,
            supabase_key: None,
            http_timeout_ms: default_http_timeout_ms(),
            port: default_port(),
            rust_log: default_log_level(),
            log_format: LogFormat::default(),
            verbose: false,
        }
    }
}

impl Config {
    /// Load configuration from environment, reading .env file first.
    pub fn load() -> Result<Self, envy::Error> {
        dotenvy::dotenv().ok();
        envy::from_env()
    }

    /// Check if the configuration is valid.
    pub fn validate(&self) -> Result<(), String> {
        if self.store_backend == StoreBackend::Rest {
            match self.supabase_url.as_deref() {
                None | Some("") => {
                    return Err("SUPABASE_URL is required when STORE_BACKEND=rest".to_string())
                }
                Some(url) if !(url.starts_with("http://") || url.starts_with("https://")) => {
                    return Err("SUPABASE_URL must start with http:// or https://".to_string())
                }
                Some(_) => {}
            }

            if self.supabase_key.as_deref().map_or(true, str::is_empty) {
                return Err("SUPABASE_KEY is required when STORE_BACKEND=rest".to_string());
            }
        }

        if self.http_timeout_ms == 0 {
            return Err("HTTP_TIMEOUT_MS must be greater than 0".to_string());
        }

        Ok(())
    }

    /// Log filter directives: `RUST_LOG`, or debug for this crate when verbose.
    pub fn log_directives(&self) -> String {
        if self.verbose {
            "athlete_health=debug,info".to_string()
        } else {
            self.rust_log.clone()
        }
    }

    /// Store request timeout.
    pub fn http_timeout(&self) -> std::time::Duration {
        std::time::Duration::from_millis(self.http_timeout_ms)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rest_config() -> Config {
        Config {
            store_backend: StoreBackend::Rest,
            supabase_url: Some("https://project.supabase.co".to_string()),
            supabase_key: Some("service-key".to_string()),
            ..Config::default()
        }
    }

    #[test]
    fn default_values_are_sensible() {
        let config = Config::default();
        assert_eq!(config.store_backend, StoreBackend::Memory);
        assert_eq!(config.port, 5000);
        assert_eq!(config.rust_log, "info");
        assert_eq!(config.log_format, LogFormat::Text);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn validate_accepts_complete_rest_config() {
        assert!(rest_config().validate().is_ok());
    }

    #[test]
    fn validate_rejects_rest_without_url() {
        let config = Config {
            supabase_url: None,
            ..rest_config()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn validate_rejects_url_without_scheme() {
        let config = Config {
            supabase_url: Some("project.supabase.co".to_string()),
            ..rest_config()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn validate_rejects_rest_without_key() {
        let config = Config {
            supabase_key: Some(String::new()),
            ..rest_config()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn validate_rejects_zero_timeout() {
        let config = Config {
            http_timeout_ms: 0,
            ..Config::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn log_directives_follow_rust_log() {
        let config = Config {
            rust_log: "athlete_health=trace,tower_http=warn".to_string(),
            ..Config::default()
        };
        assert_eq!(config.log_directives(), "athlete_health=trace,tower_http=warn");

        let verbose = Config {
            verbose: true,
            ..config
        };
        assert_eq!(verbose.log_directives(), "athlete_health=debug,info");
    }

    #[test]
    fn backend_parses_from_text() {
        assert_eq!("rest".parse::<StoreBackend>().unwrap(), StoreBackend::Rest);
        assert_eq!("json".parse::<LogFormat>().unwrap(), LogFormat::Json);
    }
}
