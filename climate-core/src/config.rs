use anyhow::{Context, Result, anyhow};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::{
    env, fs,
    path::{Path, PathBuf},
    time::Duration,
};

pub const BACKEND_URL_ENV: &str = "CLIMATE_BACKEND_URL";
pub const FIRMS_MAP_KEY_ENV: &str = "CLIMATE_FIRMS_MAP_KEY";

/// Where the dashboard sends its three requests.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BackendConfig {
    pub base_url: String,

    /// Per-request timeout. Absent means the request may wait forever.
    pub timeout_seconds: Option<u64>,
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self {
            base_url: "http://127.0.0.1:5000".to_string(),
            timeout_seconds: None,
        }
    }
}

impl BackendConfig {
    pub fn timeout(&self) -> Option<Duration> {
        self.timeout_seconds.map(Duration::from_secs)
    }
}

/// Settings for `climate serve`, the proxy in front of the public APIs.
///
/// Example TOML:
/// [server]
/// port = 5000
/// firms_map_key = "..."
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub open_meteo_url: String,
    pub firms_url: String,
    pub firms_map_key: Option<String>,
    pub cerulean_url: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 5000,
            open_meteo_url: "https://api.open-meteo.com".to_string(),
            firms_url: "https://firms.modaps.eosdis.nasa.gov".to_string(),
            firms_map_key: None,
            cerulean_url: "https://api.cerulean.skytruth.org".to_string(),
        }
    }
}

impl ServerConfig {
    pub fn firms_map_key(&self) -> Result<&str> {
        self.firms_map_key.as_deref().filter(|k| !k.is_empty()).ok_or_else(|| {
            anyhow!(
                "No FIRMS map key configured.\n\
                 Hint: run `climate configure` or set {FIRMS_MAP_KEY_ENV}."
            )
        })
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Filter directive used when `RUST_LOG` is not set, e.g. "info" or "climate_core=debug".
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self { level: "info".to_string() }
    }
}

/// Top-level configuration stored on disk.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct Config {
    pub backend: BackendConfig,
    pub server: ServerConfig,
    pub logging: LoggingConfig,
}

impl Config {
    /// Load config from the platform config dir, or defaults if it doesn't exist yet.
    /// Environment overrides are applied on top.
    pub fn load() -> Result<Self> {
        let path = Self::config_file_path()?;
        let mut cfg = Self::load_from(&path)?;
        cfg.apply_env_overrides();
        Ok(cfg)
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            // First run: no config file, return defaults.
            return Ok(Self::default());
        }

        let contents = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let cfg: Config = toml::from_str(&contents)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

        cfg.validate()?;
        Ok(cfg)
    }

    /// Save config to the platform config dir.
    pub fn save(&self) -> Result<PathBuf> {
        let path = Self::config_file_path()?;
        self.save_to(&path)?;
        Ok(path)
    }

    /// Save config to `path`, creating parent directories as needed.
    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).with_context(|| {
                format!("Failed to create config directory: {}", parent.display())
            })?;
        }

        let toml =
            toml::to_string_pretty(self).context("Failed to serialize configuration to TOML")?;

        fs::write(path, toml)
            .with_context(|| format!("Failed to write config file: {}", path.display()))?;

        Ok(())
    }

    /// Path to the config file.
    pub fn config_file_path() -> Result<PathBuf> {
        let dirs = ProjectDirs::from("dev", "climate-dashboard", "climate")
            .ok_or_else(|| anyhow!("Could not determine platform config directory"))?;

        Ok(dirs.config_dir().join("config.toml"))
    }

    pub fn apply_env_overrides(&mut self) {
        if let Ok(url) = env::var(BACKEND_URL_ENV) {
            if !url.trim().is_empty() {
                self.backend.base_url = url.trim().to_string();
            }
        }
        if let Ok(key) = env::var(FIRMS_MAP_KEY_ENV) {
            if !key.trim().is_empty() {
                self.server.firms_map_key = Some(key.trim().to_string());
            }
        }
    }

    pub fn validate(&self) -> Result<()> {
        let urls = [
            ("backend.base_url", &self.backend.base_url),
            ("server.open_meteo_url", &self.server.open_meteo_url),
            ("server.firms_url", &self.server.firms_url),
            ("server.cerulean_url", &self.server.cerulean_url),
        ];
        for (name, url) in urls {
            if !url.starts_with("http://") && !url.starts_with("https://") {
                return Err(anyhow!("{name} must be an http or https URL, got '{url}'"));
            }
        }
        Ok(())
    }
}
