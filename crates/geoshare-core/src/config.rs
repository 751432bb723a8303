use crate::app_config::{AppConfig, Environment};
use crate::ConfigError;

/// Desktop browser User-Agent sent with the HTML fetch.
///
/// Google serves a lite, script-only page to unknown agents, and that page
/// carries no coordinates.
pub const DEFAULT_USER_AGENT: &str =
    "Mozilla/5.0 (X11; Linux x86_64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/124.0.0.0 Safari/537.36";

/// Load application configuration from environment variables.
///
/// Calls `dotenvy::dotenv().ok()` to load `.env` files before reading env vars.
///
/// # Errors
///
/// Returns `ConfigError` if a value is present but invalid.
pub fn load_app_config() -> Result<AppConfig, ConfigError> {
    dotenvy::dotenv().ok();
    load_app_config_from_env()
}

/// Load application configuration from environment variables already in the process.
///
/// Unlike [`load_app_config`], this does NOT load `.env` files.
///
/// # Errors
///
/// Returns `ConfigError` if a value is present but invalid.
pub fn load_app_config_from_env() -> Result<AppConfig, ConfigError> {
    build_app_config(|key| std::env::var(key))
}

/// Build application configuration using the provided env-var lookup function.
///
/// Decoupled from the real environment so it can be tested with a pure
/// `HashMap` lookup.
fn build_app_config<F>(lookup: F) -> Result<AppConfig, ConfigError>
where
    F: Fn(&str) -> Result<String, std::env::VarError>,
{
    use std::path::PathBuf;

    let or_default = |var: &str, default: &str| -> String {
        lookup(var).unwrap_or_else(|_| default.to_string())
    };

    let parse_secs = |var: &str, default: &str| -> Result<u64, ConfigError> {
        let raw = or_default(var, default);
        let secs = raw.parse::<u64>().map_err(|e| ConfigError::InvalidEnvVar {
            var: var.to_string(),
            reason: e.to_string(),
        })?;
        if secs == 0 {
            return Err(ConfigError::InvalidEnvVar {
                var: var.to_string(),
                reason: "timeout must be at least 1 second".to_string(),
            });
        }
        Ok(secs)
    };

    let env = parse_environment(&or_default("GEOSHARE_ENV", "development"))?;
    let log_level = or_default("GEOSHARE_LOG_LEVEL", "warn");
    let connect_timeout_secs = parse_secs("GEOSHARE_CONNECT_TIMEOUT_SECS", "5")?;
    let read_timeout_secs = parse_secs("GEOSHARE_READ_TIMEOUT_SECS", "10")?;
    let user_agent = or_default("GEOSHARE_USER_AGENT", DEFAULT_USER_AGENT);
    let preferences_path = PathBuf::from(or_default(
        "GEOSHARE_PREFERENCES_PATH",
        "./geoshare-preferences.yaml",
    ));

    Ok(AppConfig {
        env,
        log_level,
        connect_timeout_secs,
        read_timeout_secs,
        user_agent,
        preferences_path,
    })
}

fn parse_environment(s: &str) -> Result<Environment, ConfigError> {
    match s {
        "development" => Ok(Environment::Development),
        "test" => Ok(Environment::Test),
        "production" => Ok(Environment::Production),
        other => Err(ConfigError::InvalidEnvVar {
            var: "GEOSHARE_ENV".to_string(),
            reason: format!("expected development, test or production, got '{other}'"),
        }),
    }
}

#[cfg(test)]
#[path = "config_test.rs"]
mod tests;
