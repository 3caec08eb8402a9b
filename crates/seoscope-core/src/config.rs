use std::path::PathBuf;

use crate::app_config::AppConfig;
use crate::weights::{ScoreWeights, DEFAULT_WEIGHTS};
use crate::ConfigError;

/// Load application configuration from environment variables.
///
/// Calls `dotenvy::dotenv().ok()` to load `.env` files before reading env vars.
///
/// # Errors
///
/// Returns `ConfigError` if values are invalid.
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
/// Returns `ConfigError` if values are invalid.
pub fn load_app_config_from_env() -> Result<AppConfig, ConfigError> {
    build_app_config(|key| std::env::var(key))
}

/// Build application configuration using the provided env-var lookup function.
///
/// Decoupled from the process environment so it can be tested with a pure
/// `HashMap` lookup.
fn build_app_config<F>(lookup: F) -> Result<AppConfig, ConfigError>
where
    F: Fn(&str) -> Result<String, std::env::VarError>,
{
    let or_default = |var: &str, default: &str| -> String {
        lookup(var).unwrap_or_else(|_| default.to_string())
    };

    // Present-but-blank counts as unset, so `SEOSCOPE_CSE_API_KEY=` disables a tier.
    let optional = |var: &str| -> Option<String> {
        lookup(var)
            .ok()
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
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

    let parse_positive_usize = |var: &str, default: &str| -> Result<usize, ConfigError> {
        let value = or_default(var, default)
            .parse::<usize>()
            .map_err(|e| invalid(var, e.to_string()))?;
        if value == 0 {
            return Err(invalid(var, "must be at least 1".to_string()));
        }
        Ok(value)
    };

    let parse_threshold = |var: &str, default: &str| -> Result<f64, ConfigError> {
        let value = or_default(var, default)
            .parse::<f64>()
            .map_err(|e| invalid(var, e.to_string()))?;
        if !value.is_finite() || value < 0.0 {
            return Err(invalid(var, format!("must be a non-negative number, got {value}")));
        }
        Ok(value)
    };

    let data_dir = match lookup("SEOSCOPE_DATA_DIR") {
        Ok(dir) => PathBuf::from(dir),
        Err(_) => default_data_dir(lookup("HOME").ok()),
    };
    let log_level = or_default("SEOSCOPE_LOG_LEVEL", "info");
    let sites_path = PathBuf::from(or_default("SEOSCOPE_SITES_PATH", "./config/sites.yaml"));

    let searxng_url = match lookup("SEOSCOPE_SEARXNG_URL") {
        Ok(v) if v.trim().is_empty() => None,
        Ok(v) => Some(v.trim().to_string()),
        Err(_) => Some("http://localhost:8013".to_string()),
    };
    let cse_api_key = optional("SEOSCOPE_CSE_API_KEY");
    let cse_cx = optional("SEOSCOPE_CSE_CX");
    let cse_base_url = or_default("SEOSCOPE_CSE_BASE_URL", "https://www.googleapis.com");
    let scrape_base_url = or_default("SEOSCOPE_SCRAPE_BASE_URL", "https://www.google.com");
    let autocomplete_url = or_default(
        "SEOSCOPE_AUTOCOMPLETE_URL",
        "https://suggestqueries.google.com",
    );
    let pagespeed_url = or_default("SEOSCOPE_PAGESPEED_URL", "https://www.googleapis.com");
    let pagespeed_api_key = optional("SEOSCOPE_PAGESPEED_API_KEY");
    let search_lang = or_default("SEOSCOPE_SEARCH_LANG", "en");

    let request_timeout_secs = parse_u64("SEOSCOPE_REQUEST_TIMEOUT_SECS", "15")?;
    if request_timeout_secs == 0 {
        return Err(invalid(
            "SEOSCOPE_REQUEST_TIMEOUT_SECS",
            "every outbound request needs a timeout; must be at least 1".to_string(),
        ));
    }
    let user_agent = or_default(
        "SEOSCOPE_USER_AGENT",
        "Mozilla/5.0 (compatible; seoscope/0.1)",
    );
    let max_concurrent_fetches = parse_positive_usize("SEOSCOPE_MAX_CONCURRENT_FETCHES", "4")?;
    let max_concurrent_sites = parse_positive_usize("SEOSCOPE_MAX_CONCURRENT_SITES", "2")?;
    let max_retries = parse_u32("SEOSCOPE_MAX_RETRIES", "2")?;
    let retry_backoff_base_ms = parse_u64("SEOSCOPE_RETRY_BACKOFF_BASE_MS", "1000")?;

    let score_weights = ScoreWeights::parse(&or_default("SEOSCOPE_SCORE_WEIGHTS", DEFAULT_WEIGHTS))?;
    let score_drop_threshold = parse_threshold("SEOSCOPE_SCORE_DROP_THRESHOLD", "5")?;
    let position_drop_threshold = parse_threshold("SEOSCOPE_POSITION_DROP_THRESHOLD", "3")?;
    let match_subdomains = parse_bool(
        "SEOSCOPE_MATCH_SUBDOMAINS",
        &or_default("SEOSCOPE_MATCH_SUBDOMAINS", "false"),
    )?;

    Ok(AppConfig {
        data_dir,
        log_level,
        sites_path,
        searxng_url,
        cse_api_key,
        cse_cx,
        cse_base_url,
        scrape_base_url,
        autocomplete_url,
        pagespeed_url,
        pagespeed_api_key,
        search_lang,
        request_timeout_secs,
        user_agent,
        max_concurrent_fetches,
        max_concurrent_sites,
        max_retries,
        retry_backoff_base_ms,
        score_weights,
        score_drop_threshold,
        position_drop_threshold,
        match_subdomains,
    })
}

fn default_data_dir(home: Option<String>) -> PathBuf {
    match home {
        Some(home) if !home.is_empty() => PathBuf::from(home)
            .join(".config")
            .join("seoscope")
            .join("data"),
        _ => PathBuf::from("./data"),
    }
}

fn parse_bool(var: &str, raw: &str) -> Result<bool, ConfigError> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        other => Err(ConfigError::InvalidEnvVar {
            var: var.to_string(),
            reason: format!("expected a boolean, got \"{other}\""),
        }),
    }
}

#[cfg(test)]
#[path = "config_test.rs"]
mod tests;
