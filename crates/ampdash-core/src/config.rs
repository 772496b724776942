use crate::app_config::{AppConfig, Environment, SourceShape};
use crate::ConfigError;

/// Bridge endpoint used when `AMPDASH_API_URL` is unset.
pub const DEFAULT_API_BASE_URL: &str = "http://localhost:3001";

/// Accepted values for `AMPDASH_REPORT_WINDOW_DAYS`.
pub const REPORT_WINDOW_DAYS: std::ops::RangeInclusive<u32> = 1..=3650;

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
/// Every setting has a default, so an empty environment yields a working
/// development configuration pointed at [`DEFAULT_API_BASE_URL`].
fn build_app_config<F>(lookup: F) -> Result<AppConfig, ConfigError>
where
    F: Fn(&str) -> Result<String, std::env::VarError>,
{
    let or_default = |var: &str, default: &str| -> String {
        lookup(var).unwrap_or_else(|_| default.to_string())
    };

    let invalid = |var: &str, reason: String| ConfigError::InvalidEnvVar {
        var: var.to_string(),
        reason,
    };

    let parse_u32 = |var: &str, default: &str| -> Result<u32, ConfigError> {
        or_default(var, default)
            .parse::<u32>()
            .map_err(|e| invalid(var, e.to_string()))
    };

    let parse_u64 = |var: &str, default: &str| -> Result<u64, ConfigError> {
        or_default(var, default)
            .parse::<u64>()
            .map_err(|e| invalid(var, e.to_string()))
    };

    let parse_bool = |var: &str, default: &str| -> Result<bool, ConfigError> {
        match or_default(var, default).to_ascii_lowercase().as_str() {
            "1" | "true" | "yes" | "on" => Ok(true),
            "0" | "false" | "no" | "off" => Ok(false),
            other => Err(invalid(var, format!("expected a boolean, got \"{other}\""))),
        }
    };

    let api_base_url = parse_base_url(&or_default("AMPDASH_API_URL", DEFAULT_API_BASE_URL))?;
    let env = parse_environment(&or_default("AMPDASH_ENV", "development"))?;
    let log_level = or_default("AMPDASH_LOG_LEVEL", "info");

    let request_timeout_secs = parse_u64("AMPDASH_REQUEST_TIMEOUT_SECS", "30")?;
    let user_agent = or_default("AMPDASH_USER_AGENT", "ampdash/0.1 (campaign-console)");
    let max_retries = parse_u32("AMPDASH_MAX_RETRIES", "2")?;
    let retry_backoff_base_ms = parse_u64("AMPDASH_RETRY_BACKOFF_BASE_MS", "500")?;

    let source_shape = parse_source_shape(&or_default("AMPDASH_SOURCE_SHAPE", "live"))?;
    let fallback_enabled = parse_bool("AMPDASH_FALLBACK_ENABLED", "true")?;
    let report_window_days = parse_u32("AMPDASH_REPORT_WINDOW_DAYS", "30")?;
    if !REPORT_WINDOW_DAYS.contains(&report_window_days) {
        return Err(invalid(
            "AMPDASH_REPORT_WINDOW_DAYS",
            format!(
                "window of {report_window_days} days is outside {}..={}",
                REPORT_WINDOW_DAYS.start(),
                REPORT_WINDOW_DAYS.end()
            ),
        ));
    }

    Ok(AppConfig {
        api_base_url,
        env,
        log_level,
        request_timeout_secs,
        user_agent,
        max_retries,
        retry_backoff_base_ms,
        source_shape,
        fallback_enabled,
        report_window_days,
    })
}

/// Parse a string into an `Environment` variant.
///
/// Returns `ConfigError::InvalidEnvVar` for unrecognized values.
fn parse_environment(s: &str) -> Result<Environment, ConfigError> {
    match s {
        "development" => Ok(Environment::Development),
        "test" => Ok(Environment::Test),
        "production" => Ok(Environment::Production),
        other => Err(ConfigError::InvalidEnvVar {
            var: "AMPDASH_ENV".to_string(),
            reason: format!(
                "unrecognized environment \"{other}\"; expected development, test, or production"
            ),
        }),
    }
}

fn parse_source_shape(s: &str) -> Result<SourceShape, ConfigError> {
    match s.to_ascii_lowercase().as_str() {
        "live" => Ok(SourceShape::Live),
        "demo" => Ok(SourceShape::Demo),
        other => Err(ConfigError::InvalidEnvVar {
            var: "AMPDASH_SOURCE_SHAPE".to_string(),
            reason: format!("unrecognized shape \"{other}\"; expected live or demo"),
        }),
    }
}

/// Requires an `http(s)://` scheme and strips trailing slashes.
fn parse_base_url(raw: &str) -> Result<String, ConfigError> {
    let trimmed = raw.trim().trim_end_matches('/');
    if !(trimmed.starts_with("http://") || trimmed.starts_with("https://")) {
        return Err(ConfigError::InvalidEnvVar {
            var: "AMPDASH_API_URL".to_string(),
            reason: format!("\"{raw}\" must start with http:// or https://"),
        });
    }
    Ok(trimmed.to_string())
}

#[cfg(test)]
#[path = "config_test.rs"]
mod tests;
