//! Process configuration read from the environment

use std::time::Duration;

use crate::constants::*;

/// Settings for the identity lookup, the grant store and the server.
///
/// The read policy is deliberately absent: it is re-read per decision through
/// [`crate::PolicySource`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    /// Identity service base URL, without trailing slash
    pub auth_url: Option<String>,
    pub service_token: Option<String>,
    pub lookup_timeout: Duration,
    pub db_path: String,
    pub port: u16,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            auth_url: None,
            service_token: None,
            lookup_timeout: Duration::from_millis(DEFAULT_AUTH_TIMEOUT_MS),
            db_path: DEFAULT_DB_PATH.into(),
            port: DEFAULT_PORT,
        }
    }
}

impl Config {
    pub fn from_env() -> Self {
        Self::from_vars(|k| std::env::var(k).ok())
    }

    /// Build from any key lookup. Empty values count as unset, as does a zero timeout.
    pub fn from_vars<F: Fn(&str) -> Option<String>>(var: F) -> Self {
        let get = |k: &str| var(k).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());
        let d = Self::default();
        Self {
            auth_url: get(ENV_AUTH_URL)
                .or_else(|| get(ENV_AUTH_PUBLIC_URL))
                .map(|u| u.trim_end_matches('/').to_string()),
            service_token: get(ENV_SERVICE_TOKEN),
            lookup_timeout: get(ENV_AUTH_TIMEOUT_MS)
                .and_then(|v| v.parse::<u64>().ok())
                .filter(|&ms| ms > 0)
                .map(Duration::from_millis)
                .unwrap_or(d.lookup_timeout),
            db_path: get(ENV_DB_PATH).unwrap_or(d.db_path),
            port: get(ENV_PORT).and_then(|v| v.parse().ok()).unwrap_or(d.port),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn vars(pairs: &[(&str, &str)]) -> Config {
        let m: HashMap<String, String> = pairs.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect();
        Config::from_vars(|k| m.get(k).cloned())
    }

    #[test]
    fn defaults() {
        assert_eq!(vars(&[]), Config::default());
    }

    #[test]
    fn public_url_is_fallback() {
        let c = vars(&[(ENV_AUTH_PUBLIC_URL, "https://pub.example/")]);
        assert_eq!(c.auth_url.as_deref(), Some("https://pub.example"));
        let c = vars(&[(ENV_AUTH_URL, "http://auth:8080"), (ENV_AUTH_PUBLIC_URL, "https://pub.example")]);
        assert_eq!(c.auth_url.as_deref(), Some("http://auth:8080"));
        let c = vars(&[(ENV_AUTH_URL, "  "), (ENV_AUTH_PUBLIC_URL, "https://pub.example")]);
        assert_eq!(c.auth_url.as_deref(), Some("https://pub.example"));
    }

    #[test]
    fn numbers() {
        let c = vars(&[(ENV_AUTH_TIMEOUT_MS, "250"), (ENV_PORT, "8081")]);
        assert_eq!(c.lookup_timeout, Duration::from_millis(250));
        assert_eq!(c.port, 8081);
        let c = vars(&[(ENV_AUTH_TIMEOUT_MS, "soon"), (ENV_PORT, "-1")]);
        assert_eq!(c.lookup_timeout, Duration::from_millis(DEFAULT_AUTH_TIMEOUT_MS));
        assert_eq!(c.port, DEFAULT_PORT);
    }

    #[test]
    fn zero_timeout_uses_default() {
        let c = vars(&[(ENV_AUTH_TIMEOUT_MS, "0")]);
        assert_eq!(c.lookup_timeout, Duration::from_millis(DEFAULT_AUTH_TIMEOUT_MS));
        let c = vars(&[(ENV_AUTH_TIMEOUT_MS, "1")]);
        assert_eq!(c.lookup_timeout, Duration::from_millis(1));
    }
}
