use crate::app_config::{AppConfig, Environment};
use crate::error::ConfigError;

/// Load application configuration from environment variables.
///
/// Calls `dotenvy::dotenv().ok()` to load `.env` files before reading env vars.
///
/// # Errors
///
/// Returns `ConfigError` if any env var holds an invalid value.
pub fn load_app_config() -> Result<AppConfig, ConfigError> {
    dotenvy::dotenv().ok();
    load_app_config_from_env()
}

/// Load application configuration from environment variables already in the
/// process.
///
/// Unlike [`load_app_config`], this does NOT load `.env` files, which keeps it usable in
/// testing or when the caller manages env setup.
///
/// # Errors
///
/// Returns `ConfigError` if any env var holds an invalid value.
pub fn load_app_config_from_env() -> Result<AppConfig, ConfigError> {
    build_app_config(|key| std::env::var(key))
}

/// Build application configuration using the provided env-var lookup function.
///
/// This is the core parsing/validation logic, decoupled from the actual
/// environment so it can be tested with a pure `HashMap` lookup.
fn build_app_config<F>(lookup: F) -> Result<AppConfig, ConfigError>
where
    F: Fn(&str) -> Result<String, std::env::VarError>,
{
    use std::net::SocketAddr;
    use std::path::PathBuf;

    let or_default =
        |var: &str, default: &str| -> String { lookup(var).unwrap_or_else(|_| default.to_string()) };

    let optional = |var: &str| -> Option<String> {
        lookup(var).ok().filter(|v| !v.trim().is_empty())
    };

    let parse_u64 = |var: &str, default: &str| -> Result<u64, ConfigError> {
        let raw = or_default(var, default);
        raw.parse::<u64>().map_err(|e| ConfigError::InvalidEnvVar {
            var: var.to_string(),
            reason: e.to_string(),
        })
    };

    let env = parse_environment(&or_default("SEGLENS_ENV", "development"));

    let bind_raw = or_default("SEGLENS_BIND_ADDR", "0.0.0.0:8080");
    let bind_addr = bind_raw
        .parse::<SocketAddr>()
        .map_err(|e| ConfigError::InvalidEnvVar {
            var: "SEGLENS_BIND_ADDR".to_string(),
            reason: e.to_string(),
        })?;

    let log_level = or_default("SEGLENS_LOG_LEVEL", "info");
    let upload_dir = PathBuf::from(or_default("SEGLENS_UPLOAD_DIR", "./uploads"));

    // 25 MB, matching the upload validator's default cap.
    let max_upload_bytes = parse_u64("SEGLENS_MAX_UPLOAD_BYTES", "26214400")?;
    let engine_timeout_secs = parse_u64("SEGLENS_ENGINE_TIMEOUT_SECS", "30")?;

    let engine_base_url = optional("SEGLENS_ENGINE_URL");
    let engine_api_token = optional("SEGLENS_ENGINE_TOKEN");

    Ok(AppConfig {
        env,
        bind_addr,
        log_level,
        upload_dir,
        max_upload_bytes,
        engine_base_url,
        engine_api_token,
        engine_timeout_secs,
    })
}

/// Parse a string into an `Environment` variant.
///
/// Unrecognized values default to `Environment::Development`.
fn parse_environment(s: &str) -> Environment {
    match s {
        "production" => Environment::Production,
        "test" => Environment::Test,
        _ => Environment::Development,
    }
}
