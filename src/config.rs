//! Client configuration, read from `RESETMENTAL_*` environment variables.

use std::path::PathBuf;
use std::time::Duration;

use reqwest::Url;

use crate::error::{AppError, AppResult};

pub const DEFAULT_API_BASE_URL: &str = "http://localhost:8000";
pub const DEFAULT_SESSION_FILE: &str = ".resetmental/session.json";
pub const DEFAULT_TIMEOUT_MS: u64 = 30_000;

/// How concurrent 401s share a refresh.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RefreshMode {
    /// Every request that sees a 401 runs its own refresh.
    #[default]
    Independent,
    /// The first 401 starts the refresh; concurrent callers await the same outcome.
    SingleFlight,
}

impl RefreshMode {
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "independent" => Some(RefreshMode::Independent),
            "single_flight" | "single-flight" | "singleflight" => Some(RefreshMode::SingleFlight),
            _ => None,
        }
    }
}

#[derive(Debug, Clone)]
pub struct ClientConfig {
    pub api_base_url: Url,
    pub session_file: PathBuf,
    pub request_timeout: Duration,
    pub refresh_mode: RefreshMode,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            api_base_url: Url::parse(DEFAULT_API_BASE_URL).expect("default API base URL is valid"),
            session_file: PathBuf::from(DEFAULT_SESSION_FILE),
            request_timeout: Duration::from_millis(DEFAULT_TIMEOUT_MS),
            refresh_mode: RefreshMode::Independent,
        }
    }
}

impl ClientConfig {
    pub fn new(api_base_url: &str) -> AppResult<Self> {
        Ok(Self { api_base_url: parse_base_url(api_base_url)?, ..Default::default() })
    }

    pub fn from_env() -> AppResult<Self> {
        Self::from_lookup(|k| std::env::var(k).ok())
    }

    /// Build from an arbitrary variable source; `from_env` passes the process environment.
    pub fn from_lookup<F: Fn(&str) -> Option<String>>(get: F) -> AppResult<Self> {
        let mut cfg = ClientConfig::default();
        if let Some(base) = get("RESETMENTAL_API_BASE_URL").filter(|s| !s.trim().is_empty()) {
            cfg.api_base_url = parse_base_url(&base)?;
        }
        if let Some(path) = get("RESETMENTAL_SESSION_FILE").filter(|s| !s.trim().is_empty()) {
            cfg.session_file = PathBuf::from(path);
        }
        if let Some(ms) = get("RESETMENTAL_HTTP_TIMEOUT_MS") {
            let ms: u64 = ms.trim().parse().map_err(|_| AppError::config("timeout", "RESETMENTAL_HTTP_TIMEOUT_MS must be an integer (milliseconds)"))?;
            if ms == 0 { return Err(AppError::config("timeout", "RESETMENTAL_HTTP_TIMEOUT_MS must be greater than zero")); }
            cfg.request_timeout = Duration::from_millis(ms);
        }
        if let Some(mode) = get("RESETMENTAL_REFRESH_MODE") {
            cfg.refresh_mode = RefreshMode::parse(&mode)
                .ok_or_else(|| AppError::config("refresh_mode", "RESETMENTAL_REFRESH_MODE must be 'independent' or 'single_flight'"))?;
        }
        Ok(cfg)
    }

    /// Resolve an API path like `/citas/` against the base URL.
    pub fn endpoint(&self, path: &str) -> AppResult<Url> {
        self.api_base_url
            .join(path.trim_start_matches('/'))
            .map_err(|e| AppError::config("endpoint", format!("invalid endpoint '{}': {}", path, e)))
    }
}

fn parse_base_url(s: &str) -> AppResult<Url> {
    let mut url = Url::parse(s.trim()).map_err(|e| AppError::config("base_url", format!("invalid API base URL '{}': {}", s, e)))?;
    // keep any path prefix when joining endpoints
    if !url.path().ends_with('/') {
        let p = format!("{}/", url.path());
        url.set_path(&p);
    }
    Ok(url)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let m: HashMap<String, String> = pairs.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect();
        move |k| m.get(k).cloned()
    }

    #[test]
    fn defaults_when_unset() {
        let cfg = ClientConfig::from_lookup(lookup(&[])).unwrap();
        assert_eq!(cfg.api_base_url.as_str(), "http://localhost:8000/");
        assert_eq!(cfg.request_timeout, Duration::from_secs(30));
        assert_eq!(cfg.refresh_mode, RefreshMode::Independent);
        assert_eq!(cfg.session_file, PathBuf::from(DEFAULT_SESSION_FILE));
    }

    #[test]
    fn reads_overrides() {
        let cfg = ClientConfig::from_lookup(lookup(&[
            ("RESETMENTAL_API_BASE_URL", "https://api.example.org/v2"),
            ("RESETMENTAL_HTTP_TIMEOUT_MS", "1500"),
            ("RESETMENTAL_REFRESH_MODE", "single_flight"),
        ])).unwrap();
        assert_eq!(cfg.request_timeout, Duration::from_millis(1500));
        assert_eq!(cfg.refresh_mode, RefreshMode::SingleFlight);
        assert_eq!(cfg.endpoint("/citas/").unwrap().as_str(), "https://api.example.org/v2/citas/");
    }

    #[test]
    fn rejects_bad_values() {
        assert!(matches!(ClientConfig::from_lookup(lookup(&[("RESETMENTAL_HTTP_TIMEOUT_MS", "soon")])), Err(AppError::Config { .. })));
        assert!(matches!(ClientConfig::from_lookup(lookup(&[("RESETMENTAL_REFRESH_MODE", "eager")])), Err(AppError::Config { .. })));
        assert!(matches!(ClientConfig::new("not a url"), Err(AppError::Config { .. })));
    }

    #[test]
    fn endpoint_joins_against_root() {
        let cfg = ClientConfig::new("http://localhost:8000").unwrap();
        assert_eq!(cfg.endpoint("/api/token/refresh/").unwrap().as_str(), "http://localhost:8000/api/token/refresh/");
        assert_eq!(cfg.endpoint("psicologos/").unwrap().as_str(), "http://localhost:8000/psicologos/");
    }
}
