use tracing::Level;

pub const DEFAULT_BACKEND_URL: &str = "https://web.afterlife.org.in";
pub const DEFAULT_LIVEKIT_URL: &str = "wss://webagent-n2z20mdr.livekit.cloud";
pub const DEFAULT_IDENTITY: &str = "admin";

/// A custom error type for configuration loading failures.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid value for environment variable {0}: {1}")]
    InvalidValue(String, String),
}

/// Holds all configuration loaded from the environment at startup.
#[derive(Clone, Debug)]
pub struct Config {
    /// Base URL of the backend serving `/getToken`.
    pub backend_url: String,
    /// Realtime server the session connects to.
    pub livekit_url: String,
    /// Identity requested from the token endpoint.
    pub identity: String,
    pub log_level: Level,
}

impl Config {
    /// Loads configuration from environment variables.
    ///
    /// Unset URLs fall back to the production defaults. A URL set to an empty
    /// string is kept empty, which the credential fetch reports as a
    /// configuration failure.
    pub fn from_env() -> Result<Self, ConfigError> {
        // Only load from .env in non-test mode to avoid contamination
        if !cfg!(test) {
            dotenvy::dotenv().ok();
        }

        let backend_url =
            std::env::var("BACKEND_URL").unwrap_or_else(|_| DEFAULT_BACKEND_URL.to_string());
        let livekit_url =
            std::env::var("LIVEKIT_URL").unwrap_or_else(|_| DEFAULT_LIVEKIT_URL.to_string());
        let identity =
            std::env::var("AGENT_IDENTITY").unwrap_or_else(|_| DEFAULT_IDENTITY.to_string());

        let log_level_str = std::env::var("RUST_LOG").unwrap_or_else(|_| "INFO".to_string());
        let log_level = log_level_str.parse::<Level>().map_err(|_| {
            ConfigError::InvalidValue(
                "RUST_LOG".to_string(),
                format!("'{}' is not a valid log level", log_level_str),
            )
        })?;

        Ok(Self {
            backend_url,
            livekit_url,
            identity,
            log_level,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;
    use std::env;

    fn clear_env_vars() {
        unsafe {
            env::remove_var("BACKEND_URL");
            env::remove_var("LIVEKIT_URL");
            env::remove_var("AGENT_IDENTITY");
            env::remove_var("RUST_LOG");
        }
    }

    #[test]
    fn test_config_error_display() {
        let invalid_value =
            ConfigError::InvalidValue("TEST_VAR".to_string(), "bad_value".to_string());
        assert_eq!(
            format!("{}", invalid_value),
            "Invalid value for environment variable TEST_VAR: bad_value"
        );
    }

    #[test]
    #[serial]
    fn test_config_defaults_when_unset() {
        clear_env_vars();

        let config = Config::from_env().expect("Config should load successfully");

        assert_eq!(config.backend_url, DEFAULT_BACKEND_URL);
        assert_eq!(config.livekit_url, DEFAULT_LIVEKIT_URL);
        assert_eq!(config.identity, "admin");
        assert_eq!(config.log_level, Level::INFO);
    }

    #[test]
    #[serial]
    fn test_config_from_env_custom_values() {
        clear_env_vars();
        unsafe {
            env::set_var("BACKEND_URL", "http://localhost:8000");
            env::set_var("LIVEKIT_URL", "ws://localhost:7880");
            env::set_var("AGENT_IDENTITY", "visitor");
            env::set_var("RUST_LOG", "debug");
        }

        let config = Config::from_env().expect("Config should load successfully");

        assert_eq!(config.backend_url, "http://localhost:8000");
        assert_eq!(config.livekit_url, "ws://localhost:7880");
        assert_eq!(config.identity, "visitor");
        assert_eq!(config.log_level, Level::DEBUG);
    }

    #[test]
    #[serial]
    fn test_config_keeps_empty_backend_url() {
        clear_env_vars();
        unsafe {
            env::set_var("BACKEND_URL", "");
        }

        let config = Config::from_env().expect("Config should load successfully");
        assert_eq!(config.backend_url, "");
    }

    #[test]
    #[serial]
    fn test_config_invalid_log_level() {
        clear_env_vars();
        unsafe {
            env::set_var("RUST_LOG", "not-a-level");
        }

        let err = Config::from_env().unwrap_err();
        match err {
            ConfigError::InvalidValue(var, _) => assert_eq!(var, "RUST_LOG"),
        }
    }
}
