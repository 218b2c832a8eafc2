use serde::{Deserialize, Serialize};
use std::fs;
use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use thiserror::Error;

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Config {
    pub listen: String,
    #[serde(default = "default_static_dir")]
    pub static_dir: PathBuf,
    #[serde(default = "default_boot_time_env")]
    pub boot_time_env: String,
    #[serde(default)]
    pub boot_time: Option<String>,
    #[serde(default = "default_cpu_sample_ms")]
    pub cpu_sample_ms: u64,
    #[serde(default)]
    pub quote: QuoteConfig,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct QuoteConfig {
    #[serde(default = "default_quote_url")]
    pub url: String,
    #[serde(default = "default_quote_timeout_ms")]
    pub timeout_ms: u64,
}

impl Default for QuoteConfig {
    fn default() -> Self {
        Self {
            url: default_quote_url(),
            timeout_ms: default_quote_timeout_ms(),
        }
    }
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("не удалось прочитать файл конфигурации {path}: {source}")]
    Read {
        path: String,
        source: std::io::Error,
    },
    #[error("не удалось разобрать YAML в {path}: {source}")]
    Parse {
        path: String,
        source: serde_yaml::Error,
    },
    #[error("ошибка валидации конфигурации: {0}")]
    Validation(String),
}

impl Config {
    pub fn load_from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path_ref = path.as_ref();
        let path_display = path_ref.display().to_string();
        let text = fs::read_to_string(path_ref).map_err(|source| ConfigError::Read {
            path: path_display.clone(),
            source,
        })?;

        let cfg: Config = serde_yaml::from_str(&text).map_err(|source| ConfigError::Parse {
            path: path_display,
            source,
        })?;

        cfg.validate()?;
        Ok(cfg)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.listen.trim().is_empty() {
            return Err(ConfigError::Validation(
                "поле listen обязательно".to_string(),
            ));
        }
        if SocketAddr::from_str(&self.listen).is_err() {
            return Err(ConfigError::Validation(
                "поле listen должно быть корректным адресом host:port".to_string(),
            ));
        }
        if self.static_dir.as_os_str().is_empty() {
            return Err(ConfigError::Validation(
                "поле static_dir не должно быть пустым".to_string(),
            ));
        }
        if self.boot_time_env.trim().is_empty() {
            return Err(ConfigError::Validation(
                "поле boot_time_env не должно быть пустым".to_string(),
            ));
        }
        if !(1..=10_000).contains(&self.cpu_sample_ms) {
            return Err(ConfigError::Validation(
                "cpu_sample_ms должно быть в диапазоне 1..10000".to_string(),
            ));
        }
        if self.quote.url.trim().is_empty() {
            return Err(ConfigError::Validation(
                "quote.url не должен быть пустым".to_string(),
            ));
        }
        if self.quote.timeout_ms == 0 {
            return Err(ConfigError::Validation(
                "quote.timeout_ms должен быть > 0".to_string(),
            ));
        }

        Ok(())
    }

    pub fn example_yaml() -> &'static str {
        include_str!("../config.yaml.example")
    }
}

fn default_static_dir() -> PathBuf {
    PathBuf::from("./frontend/dist")
}

fn default_boot_time_env() -> String {
    "VITALSD_BOOT_TIME".to_string()
}

const fn default_cpu_sample_ms() -> u64 {
    1000
}

fn default_quote_url() -> String {
    "https://v1.hitokoto.cn".to_string()
}

const fn default_quote_timeout_ms() -> u64 {
    3000
}
