use anyhow::{Context, Result, anyhow};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::{
    fs,
    path::{Path, PathBuf},
    time::Duration,
};

use crate::{client::ClientSettings, error::WeatherError, model::Units, theme::ThemeRules};

/// Value written by the config template before the user supplies a real key.
pub const API_KEY_PLACEHOLDER: &str = "YOUR_API_KEY_HERE";

pub const API_KEY_ENV: &str = "OPENWEATHER_API_KEY";
pub const UNITS_ENV: &str = "SKYLOOK_UNITS";
pub const BASE_URL_ENV: &str = "SKYLOOK_BASE_URL";

/// Top-level configuration stored on disk.
///
/// Example TOML:
/// ```toml
/// api_key = "..."
/// units = "imperial"
/// default_city = "London"
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// OpenWeather API key.
    #[serde(default)]
    pub api_key: Option<String>,

    #[serde(default)]
    pub units: Units,

    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Request timeout in seconds.
    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,

    /// City looked up automatically when an interactive session starts.
    #[serde(default)]
    pub default_city: Option<String>,

    #[serde(default = "default_warm_threshold")]
    pub warm_threshold_c: f64,
}

fn default_base_url() -> String {
    "https://api.openweathermap.org/data/2.5".to_string()
}

const fn default_timeout() -> u64 {
    10
}

const fn default_warm_threshold() -> f64 {
    20.0
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_key: None,
            units: Units::default(),
            base_url: default_base_url(),
            timeout_secs: default_timeout(),
            default_city: None,
            warm_threshold_c: default_warm_threshold(),
        }
    }
}

impl Config {
    /// Load config from the default location, then apply environment overrides.
    pub fn load() -> Result<Self> {
        let path = Self::config_file_path()?;
        Self::load_from(&path)
    }

    /// Load config from `path` for a lookup: file values, then environment overrides.
    pub fn load_from(path: &Path) -> Result<Self> {
        Self::load_with_env(path, |name| std::env::var(name).ok())
    }

    fn load_with_env<F>(path: &Path, lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut cfg = Self::read_from(path)?;
        cfg.apply_env_overrides(lookup)?;
        Ok(cfg)
    }

    /// File values only, or defaults if the file doesn't exist yet.
    /// Use this when the config will be saved back.
    pub fn read_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            // First run: no config file.
            return Ok(Self::default());
        }

        let contents = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        toml::from_str::<Config>(&contents)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))
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
        let dirs = ProjectDirs::from("dev", "skylook", "skylook")
            .ok_or_else(|| anyhow!("Could not determine platform config directory"))?;

        Ok(dirs.config_dir().join("config.toml"))
    }

    /// Overlay values from the environment. `lookup` is `std::env::var` outside of tests.
    pub fn apply_env_overrides<F>(&mut self, lookup: F) -> Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(key) = lookup(API_KEY_ENV).filter(|k| !k.trim().is_empty()) {
            self.api_key = Some(key);
        }

        if let Some(units) = lookup(UNITS_ENV) {
            self.units = units
                .parse()
                .with_context(|| format!("Invalid value in {UNITS_ENV}"))?;
        }

        if let Some(base_url) = lookup(BASE_URL_ENV).filter(|u| !u.trim().is_empty()) {
            self.base_url = base_url;
        }

        Ok(())
    }

    /// The configured API key, unless it is missing or still the placeholder.
    pub fn api_key(&self) -> Result<&str, WeatherError> {
        validate_api_key(self.api_key.as_deref()).map_err(WeatherError::Configuration)
    }

    pub fn set_api_key(&mut self, api_key: String) {
        self.api_key = Some(api_key.trim().to_string());
    }

    pub fn theme_rules(&self) -> ThemeRules {
        ThemeRules { warm_threshold_c: self.warm_threshold_c }
    }

    pub fn client_settings(&self) -> ClientSettings {
        ClientSettings {
            base_url: self.base_url.clone(),
            api_key: self.api_key.clone(),
            units: self.units,
            timeout: Duration::from_secs(self.timeout_secs),
        }
    }
}

/// Shared by `Config` and the client so both reject the same keys.
pub(crate) fn validate_api_key(key: Option<&str>) -> Result<&str, String> {
    match key.map(str::trim) {
        None | Some("") => Err(format!(
            "No OpenWeather API key configured.\n\
             Hint: run `skylook configure` or set {API_KEY_ENV}."
        )),
        Some(API_KEY_PLACEHOLDER) => Err(format!(
            "The OpenWeather API key is still the placeholder {API_KEY_PLACEHOLDER}.\n\
             Hint: run `skylook configure` and enter your real key."
        )),
        Some(key) => Ok(key),
    }
}
