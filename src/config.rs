//! Configuration management.
//!
//! Config values are loaded with the following priority (highest to lowest):
//! 1. Command-line flags (applied by `main`)
//! 2. Environment variables (MANGA_*)
//! 3. Config file (~/.config/mangaview/config.toml)
//! 4. Default values

use serde::Deserialize;
use std::path::{Path, PathBuf};

use crate::backend::api::Endpoint;

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Base address of the upstream API, without the `/api` suffix.
    pub api_url: Option<String>,
    /// When set, the reader goes through a running forwarder instead of
    /// calling the upstream directly.
    pub proxy_url: Option<String>,
    pub proxy_port: u16,
    pub search_debounce_ms: u64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_url: None,
            proxy_url: None,
            proxy_port: 3000,
            search_debounce_ms: 300,
        }
    }
}

impl Config {
    /// Load config with priority: env vars > config file > defaults
    pub fn load() -> Self {
        let mut config = Self::config_path()
            .and_then(|p| Self::load_from_file(&p))
            .unwrap_or_default();
        config.apply_env_overrides();
        config.clamp_values();
        config
    }

    pub fn config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|p| p.join("mangaview").join("config.toml"))
    }

    fn load_from_file(path: &Path) -> Option<Self> {
        let content = std::fs::read_to_string(path).ok()?;
        match toml::from_str(&content) {
            Ok(config) => Some(config),
            Err(e) => {
                log::warn!("Ignoring malformed config {}: {}", path.display(), e);
                None
            }
        }
    }

    fn apply_env_overrides(&mut self) {
        if let Some(v) = Self::non_empty_env("MANGA_API_URL") {
            self.api_url = Some(v);
        }
        if let Some(v) = Self::non_empty_env("MANGA_PROXY_URL") {
            self.proxy_url = Some(v);
        }
        if let Some(v) = Self::parse_env::<u16>("MANGA_PROXY_PORT") {
            self.proxy_port = v;
        }
        if let Some(v) = Self::parse_env::<u64>("MANGA_SEARCH_DEBOUNCE_MS") {
            self.search_debounce_ms = v;
        }
    }

    fn clamp_values(&mut self) {
        const MAX_DEBOUNCE_MS: u64 = 5_000;

        self.search_debounce_ms = self.search_debounce_ms.min(MAX_DEBOUNCE_MS);
        self.api_url = self.api_url.take().filter(|u| !u.trim().is_empty());
        self.proxy_url = self.proxy_url.take().filter(|u| !u.trim().is_empty());
    }

    fn parse_env<T: std::str::FromStr>(key: &str) -> Option<T> {
        std::env::var(key).ok()?.parse().ok()
    }

    fn non_empty_env(key: &str) -> Option<String> {
        std::env::var(key).ok().filter(|v| !v.trim().is_empty())
    }

    /// Where the reader sends its requests. A forwarder wins over a direct
    /// upstream address.
    pub fn endpoint(&self) -> Endpoint {
        match (&self.proxy_url, &self.api_url) {
            (Some(proxy), _) => Endpoint::Proxy(proxy.clone()),
            (None, Some(api)) => Endpoint::Direct(api.clone()),
            (None, None) => Endpoint::Unconfigured,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_default_values() {
        let config = Config::default();
        assert_eq!(config.api_url, None);
        assert_eq!(config.proxy_url, None);
        assert_eq!(config.proxy_port, 3000);
        assert_eq!(config.search_debounce_ms, 300);
        assert_eq!(config.endpoint(), Endpoint::Unconfigured);
    }

    #[test]
    fn test_load_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "api_url = \"https://abc.ngrok.app\"\nproxy_port = 8080").unwrap();

        let config = Config::load_from_file(file.path()).unwrap();
        assert_eq!(config.api_url.as_deref(), Some("https://abc.ngrok.app"));
        assert_eq!(config.proxy_port, 8080);
        assert_eq!(config.search_debounce_ms, 300);
    }

    #[test]
    fn test_malformed_file_is_ignored() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "proxy_port = \"not a number\"").unwrap();
        assert!(Config::load_from_file(file.path()).is_none());
    }

    #[test]
    fn test_clamp_values() {
        let mut config = Config {
            search_debounce_ms: 60_000,
            api_url: Some("   ".into()),
            ..Default::default()
        };
        config.clamp_values();
        assert_eq!(config.search_debounce_ms, 5_000);
        assert_eq!(config.api_url, None);
    }

    #[test]
    fn test_endpoint_prefers_proxy() {
        let config = Config {
            api_url: Some("https://api.test".into()),
            proxy_url: Some("http://127.0.0.1:3000".into()),
            ..Default::default()
        };
        assert_eq!(config.endpoint(), Endpoint::Proxy("http://127.0.0.1:3000".into()));

        let config = Config {
            api_url: Some("https://api.test".into()),
            ..Default::default()
        };
        assert_eq!(config.endpoint(), Endpoint::Direct("https://api.test".into()));
    }
}
