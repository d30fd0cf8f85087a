//! Runner configuration from environment.

use std::env;
use std::path::PathBuf;

#[derive(Debug, Clone)]
pub struct Config {
    pub tick_secs: f64,
    pub rules_path: Option<PathBuf>,
    pub airport_path: Option<PathBuf>,
    pub log_filter: String,
}

impl Config {
    pub fn from_env() -> Self {
        Self {
            tick_secs: env::var("ATCSIM_TICK_SECS")
                .ok()
                .and_then(|s| s.parse().ok())
                .filter(|secs: &f64| secs.is_finite() && *secs > 0.0)
                .unwrap_or(1.0),
            rules_path: env::var("ATCSIM_RULES").ok().map(PathBuf::from),
            airport_path: env::var("ATCSIM_AIRPORT").ok().map(PathBuf::from),
            log_filter: env::var("ATCSIM_LOG").unwrap_or_else(|_| "info".to_string()),
        }
    }
}
