use crate::collectors::{quote, system, CollectError};
use crate::config::Config;
use crate::metrics::Metrics;
use crate::uptime;
use reqwest::Client;
use serde::Serialize;
use std::time::Duration;
use sysinfo::{System, SystemExt};

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct SystemSnapshot {
    pub operating_system: String,
    pub cpu_usage: f64,
    pub memory_usage: MemoryUsage,
    pub disk_usage: DiskUsage,
    pub uptime: Uptime,
    pub word: Word,
}

#[derive(Debug, Clone, Copy, Serialize, PartialEq)]
pub struct MemoryUsage {
    pub total_mb: f64,
    pub used_mb: f64,
}

#[derive(Debug, Clone, Copy, Serialize, PartialEq)]
pub struct DiskUsage {
    pub total_gb: f64,
    pub used_gb: f64,
}

#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
pub struct Uptime {
    pub day: u64,
    pub hour: u64,
    pub minute: u64,
    pub second: u64,
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct Word {
    pub content: String,
    pub author: String,
}

pub async fn collect(
    client: &Client,
    cfg: &Config,
    metrics: &Metrics,
) -> Result<SystemSnapshot, CollectError> {
    let mut system = System::new();

    let operating_system = system::operating_system(&system).resolve("operating_system", metrics);
    let cpu_usage =
        system::cpu_usage(&mut system, Duration::from_millis(cfg.cpu_sample_ms)).await;
    let memory_usage = system::memory_usage(&mut system)?;
    let disk_usage = system::disk_usage(&mut system).resolve("disk", metrics);

    let override_raw = boot_time_override(cfg);
    let uptime = uptime::measure(override_raw.as_deref(), system.boot_time());

    let word = quote::fetch_word(client, &cfg.quote)
        .await
        .resolve("quote", metrics);

    let snapshot = SystemSnapshot {
        operating_system,
        cpu_usage,
        memory_usage,
        disk_usage,
        uptime,
        word,
    };
    metrics.update_from_snapshot(&snapshot);
    Ok(snapshot)
}

// Read per request so operators can change the override without a restart.
fn boot_time_override(cfg: &Config) -> Option<String> {
    std::env::var(&cfg.boot_time_env)
        .ok()
        .or_else(|| cfg.boot_time.clone())
}

pub(crate) fn round1(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}

pub(crate) fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::QuoteConfig;
    use std::path::PathBuf;

    fn sample_snapshot() -> SystemSnapshot {
        SystemSnapshot {
            operating_system: "NixOS".to_string(),
            cpu_usage: 12.5,
            memory_usage: MemoryUsage {
                total_mb: 8192.0,
                used_mb: 4096.25,
            },
            disk_usage: DiskUsage {
                total_gb: 100.0,
                used_gb: 50.5,
            },
            uptime: Uptime {
                day: 1,
                hour: 2,
                minute: 3,
                second: 4,
            },
            word: Word {
                content: "X".to_string(),
                author: "Y".to_string(),
            },
        }
    }

    #[test]
    fn snapshot_serializes_with_contract_keys() {
        let value = serde_json::to_value(sample_snapshot()).expect("сериализация снимка");
        assert_eq!(value["operating_system"], "NixOS");
        assert_eq!(value["cpu_usage"], 12.5);
        assert_eq!(value["memory_usage"]["total_mb"], 8192.0);
        assert_eq!(value["memory_usage"]["used_mb"], 4096.25);
        assert_eq!(value["disk_usage"]["total_gb"], 100.0);
        assert_eq!(value["disk_usage"]["used_gb"], 50.5);
        assert_eq!(value["uptime"]["day"], 1);
        assert_eq!(value["uptime"]["hour"], 2);
        assert_eq!(value["uptime"]["minute"], 3);
        assert_eq!(value["uptime"]["second"], 4);
        assert_eq!(value["word"]["content"], "X");
        assert_eq!(value["word"]["author"], "Y");
    }

    #[test]
    fn rounding_helpers() {
        assert_eq!(round1(12.34), 12.3);
        assert_eq!(round1(12.35), 12.4);
        assert_eq!(round2(1.005), 1.0);
        assert_eq!(round2(1.239), 1.24);
    }

    #[test]
    fn env_override_wins_over_config_value() {
        let env_name = "VITALSD_TEST_BOOT_OVERRIDE";
        let cfg = Config {
            listen: "127.0.0.1:8080".to_string(),
            static_dir: PathBuf::from("./frontend/dist"),
            boot_time_env: env_name.to_string(),
            boot_time: Some("1700000000".to_string()),
            cpu_sample_ms: 5,
            quote: QuoteConfig::default(),
        };

        std::env::remove_var(env_name);
        assert_eq!(boot_time_override(&cfg), Some("1700000000".to_string()));

        std::env::set_var(env_name, "1800000000");
        assert_eq!(boot_time_override(&cfg), Some("1800000000".to_string()));
        std::env::remove_var(env_name);
    }
}
