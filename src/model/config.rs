use serde::Deserialize;
use std::fs;
use std::path::Path;
use std::time::Duration;
use url::Url;

const ENV_CONFIG_PATH: &str = "EPISODE_LENS_CONFIG_PATH";
const ENV_BACKEND_URL: &str = "EPISODE_LENS_BACKEND_URL";
const ENV_REQUEST_TIMEOUT: &str = "EPISODE_LENS_REQUEST_TIMEOUT_SECS";
const DEFAULT_CONFIG_PATH: &str = "config.yaml";
const DEFAULT_BACKEND_URL: &str = "http://localhost:8000";
const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 30;

/// Readmissions backend settings as written in the config file
#[derive(Debug, Clone, Default, Deserialize)]
pub struct BackendFileConfig {
    pub base_url: Option<String>,
    pub request_timeout_secs: Option<u64>,
}

/// YAML configuration file structure
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ConfigFile {
    #[serde(default)]
    pub backend: BackendFileConfig,
}

/// Resolved backend settings
#[derive(Debug, Clone)]
pub struct BackendConfig {
    pub base_url: Url,
    pub request_timeout: Duration,
}

impl BackendConfig {
    /// Combine file and environment values. Environment wins over the file.
    fn resolve(
        file: BackendFileConfig,
        env_url: Option<String>,
        env_timeout: Option<String>,
    ) -> Self {
        let base_url = env_url
            .or(file.base_url)
            .and_then(|raw| match Url::parse(&raw) {
                Ok(url) => Some(url),
                Err(e) => {
                    tracing::warn!(url = %raw, error = %e, "Invalid backend URL, using default");
                    None
                }
            })
            .unwrap_or_else(default_backend_url);

        let env_timeout = env_timeout.and_then(|raw| match raw.trim().parse::<u64>() {
            Ok(secs) => Some(secs),
            Err(e) => {
                tracing::warn!(
                    variable = ENV_REQUEST_TIMEOUT,
                    value = %raw,
                    error = %e,
                    "Invalid request timeout, ignoring"
                );
                None
            }
        });

        let timeout_secs = env_timeout
            .or(file.request_timeout_secs)
            .and_then(|secs| {
                if secs == 0 {
                    tracing::warn!("Request timeout of 0 seconds is not allowed, using default");
                    None
                } else {
                    Some(secs)
                }
            })
            .unwrap_or(DEFAULT_REQUEST_TIMEOUT_SECS);

        Self {
            base_url,
            request_timeout: Duration::from_secs(timeout_secs),
        }
    }
}

fn default_backend_url() -> Url {
    Url::parse(DEFAULT_BACKEND_URL).expect("default backend URL is valid")
}

/// Application configuration
#[derive(Debug, Clone)]
pub struct Config {
    pub backend: BackendConfig,
    pub port: u16,
    pub host: String,
}

impl Config {
    /// Load configuration from environment and config file
    pub fn from_env() -> Self {
        let port = std::env::var("PORT")
            .ok()
            .and_then(|p| p.parse().ok())
            .unwrap_or(8080);

        let host = std::env::var("HOST").unwrap_or_else(|_| "127.0.0.1".to_string());

        let config_path =
            std::env::var(ENV_CONFIG_PATH).unwrap_or_else(|_| DEFAULT_CONFIG_PATH.to_string());

        let file = Self::load_config_file(&config_path).unwrap_or_default();

        let backend = BackendConfig::resolve(
            file.backend,
            std::env::var(ENV_BACKEND_URL).ok(),
            std::env::var(ENV_REQUEST_TIMEOUT).ok(),
        );

        tracing::debug!(
            backend_url = %backend.base_url,
            timeout_secs = backend.request_timeout.as_secs(),
            "Resolved backend configuration"
        );

        Self {
            backend,
            port,
            host,
        }
    }

    /// Load configuration from YAML file
    fn load_config_file(path: &str) -> Option<ConfigFile> {
        let path = Path::new(path);

        if !path.exists() {
            tracing::debug!(path = %path.display(), "Config file not found, using defaults");
            return None;
        }

        match fs::read_to_string(path) {
            Ok(contents) => Self::parse_config(&contents, path),
            Err(e) => {
                tracing::warn!(
                    path = %path.display(),
                    error = %e,
                    "Failed to read config file, using defaults"
                );
                None
            }
        }
    }

    fn parse_config(contents: &str, path: &Path) -> Option<ConfigFile> {
        let contents = contents.trim();
        if contents.is_empty() {
            tracing::debug!(path = %path.display(), "Config file is empty, using defaults");
            return Some(ConfigFile::default());
        }

        match serde_yaml::from_str(contents) {
            Ok(config) => {
                tracing::info!(path = %path.display(), "Loaded configuration from file");
                Some(config)
            }
            Err(e) => {
                tracing::warn!(
                    path = %path.display(),
                    error = %e,
                    "Failed to parse config file, using defaults"
                );
                None
            }
        }
    }

    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_env_overrides_file() {
        let file = BackendFileConfig {
            base_url: Some("http://backend.internal:9000".to_string()),
            request_timeout_secs: Some(5),
        };
        let resolved = BackendConfig::resolve(
            file,
            Some("http://override:8000".to_string()),
            Some("12".to_string()),
        );
        assert_eq!(resolved.base_url.as_str(), "http://override:8000/");
        assert_eq!(resolved.request_timeout, Duration::from_secs(12));
    }

    #[test]
    fn test_file_used_when_env_missing() {
        let file = BackendFileConfig {
            base_url: Some("http://backend.internal:9000".to_string()),
            request_timeout_secs: Some(5),
        };
        let resolved = BackendConfig::resolve(file, None, Some("not-a-number".to_string()));
        assert_eq!(resolved.base_url.host_str(), Some("backend.internal"));
        assert_eq!(resolved.request_timeout, Duration::from_secs(5));
    }

    #[test]
    fn test_invalid_url_falls_back_to_default() {
        let resolved = BackendConfig::resolve(
            BackendFileConfig::default(),
            Some("::nope".to_string()),
            None,
        );
        assert_eq!(resolved.base_url.as_str(), "http://localhost:8000/");
        assert_eq!(
            resolved.request_timeout,
            Duration::from_secs(DEFAULT_REQUEST_TIMEOUT_SECS)
        );
    }

    #[test]
    fn test_zero_timeout_uses_default() {
        let file = BackendFileConfig {
            base_url: None,
            request_timeout_secs: Some(0),
        };
        let resolved = BackendConfig::resolve(file, None, None);
        assert_eq!(
            resolved.request_timeout,
            Duration::from_secs(DEFAULT_REQUEST_TIMEOUT_SECS)
        );

        let file = BackendFileConfig {
            base_url: None,
            request_timeout_secs: Some(5),
        };
        let resolved = BackendConfig::resolve(file, None, Some("0".to_string()));
        assert_eq!(
            resolved.request_timeout,
            Duration::from_secs(DEFAULT_REQUEST_TIMEOUT_SECS)
        );
    }

    #[test]
    fn test_parse_yaml_backend_section() {
        let yaml = "backend:\n  base_url: http://analytics:8000\n  request_timeout_secs: 45\n";
        let parsed = Config::parse_config(yaml, Path::new("config.yaml")).unwrap();
        assert_eq!(parsed.backend.base_url.as_deref(), Some("http://analytics:8000"));
        assert_eq!(parsed.backend.request_timeout_secs, Some(45));
    }

    #[test]
    fn test_empty_and_invalid_yaml() {
        assert!(Config::parse_config("  \n", Path::new("c.yaml")).is_some());
        assert!(Config::parse_config("backend: [1, 2", Path::new("c.yaml")).is_none());
    }
}
