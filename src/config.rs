use crate::error::{Result, WrapperError};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Public Dify endpoint used when no base URL override is configured.
pub const DEFAULT_BASE_URL: &str = "https://api.dify.ai";

/// Environment variable consulted when the config file sets no base URL.
pub const BASE_URL_ENV: &str = "DIFY_BASE_URL";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WrapperConfig {
    #[serde(default = "default_port")]
    pub port: u16,
    #[serde(default)]
    pub dify: DifyConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DifyConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub base_url: Option<String>,
    #[serde(default = "default_api_key_env")]
    pub api_key_env: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub environment: Option<String>,
}

fn default_port() -> u16 {
    3000
}

fn default_api_key_env() -> String {
    "DIFY_API_KEY".to_string()
}

impl Default for WrapperConfig {
    fn default() -> Self {
        Self {
            port: default_port(),
            dify: DifyConfig::default(),
        }
    }
}

impl Default for DifyConfig {
    fn default() -> Self {
        Self {
            base_url: None,
            api_key_env: default_api_key_env(),
            environment: None,
        }
    }
}

impl WrapperConfig {
    /// Load config from a TOML file.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            WrapperError::config(format!(
                "Failed to read config file {}: {}",
                path.display(),
                e
            ))
        })?;
        let config: Self = toml::from_str(&content)?;
        Ok(config)
    }

    /// Search standard locations for a config file.
    /// Priority: CLI arg > CWD > XDG config > home dir. A config file is
    /// optional: with none found, defaults apply and everything else comes
    /// from the environment.
    pub fn find_and_load(explicit_path: Option<&Path>) -> Result<Self> {
        if let Some(path) = explicit_path {
            return Self::load(path);
        }

        for candidate in config_search_paths() {
            if candidate.exists() {
                tracing::info!(path = %candidate.display(), "Loading config");
                return Self::load(&candidate);
            }
        }

        Ok(Self::default())
    }

    /// Resolve the effective Dify base URL.
    /// Priority: config override > `DIFY_BASE_URL` env var > public default.
    pub fn effective_base_url(&self) -> String {
        resolve_base_url(
            self.dify.base_url.as_deref(),
            std::env::var(BASE_URL_ENV).ok().as_deref(),
        )
    }

    /// Resolve the API key from the configured environment variable.
    /// Checked per request, before any outbound call, never at startup.
    pub fn resolve_api_key(&self) -> Result<String> {
        std::env::var(&self.dify.api_key_env)
            .ok()
            .filter(|key| !key.is_empty())
            .ok_or_else(|| {
                WrapperError::config(format!("{} is not configured", self.dify.api_key_env))
            })
    }

    /// Presence-only check used by the health endpoint; never validates the
    /// key against the upstream.
    pub fn api_key_configured(&self) -> bool {
        self.resolve_api_key().is_ok()
    }

    /// Deployment environment label reflected by the health endpoint.
    pub fn environment_label(&self) -> String {
        if let Some(ref env) = self.dify.environment {
            return env.clone();
        }
        std::env::var("ENVIRONMENT").unwrap_or_else(|_| "development".to_string())
    }
}

fn config_search_paths() -> Vec<PathBuf> {
    let mut paths = Vec::new();

    // CWD
    paths.push(PathBuf::from("dify-wrapper.toml"));

    // XDG / platform config dir
    if cfg!(target_os = "macos") {
        if let Some(home) = home_dir() {
            paths.push(
                home.join("Library")
                    .join("Application Support")
                    .join("dify-wrapper")
                    .join("config.toml"),
            );
        }
    } else {
        if let Ok(xdg) = std::env::var("XDG_CONFIG_HOME") {
            paths.push(PathBuf::from(xdg).join("dify-wrapper").join("config.toml"));
        }
        if let Some(home) = home_dir() {
            paths.push(home.join(".config").join("dify-wrapper").join("config.toml"));
        }
    }

    // Home directory fallback
    if let Some(home) = home_dir() {
        paths.push(home.join(".dify-wrapper.toml"));
    }

    paths
}

fn home_dir() -> Option<PathBuf> {
    std::env::var("HOME").ok().map(PathBuf::from)
}

fn resolve_base_url(config_url: Option<&str>, env_url: Option<&str>) -> String {
    config_url
        .or(env_url)
        .filter(|url| !url.is_empty())
        .unwrap_or(DEFAULT_BASE_URL)
        .to_string()
}
