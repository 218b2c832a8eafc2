use crate::snapshot::Uptime;
use chrono::DateTime;
use std::time::{Duration, SystemTime, UNIX_EPOCH};
use tracing::{debug, warn};

pub fn measure(override_raw: Option<&str>, os_boot_unix: u64) -> Uptime {
    let boot = resolve_boot_time(override_raw, os_boot_unix as f64);
    let now = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs_f64())
        .unwrap_or(0.0);
    decompose(elapsed_since(boot, now))
}

pub fn resolve_boot_time(override_raw: Option<&str>, os_boot_unix: f64) -> f64 {
    let Some(raw) = override_raw else {
        return os_boot_unix;
    };

    let cleaned = clean_override(raw);
    if cleaned.is_empty() {
        warn!("переопределение времени загрузки пустое, используется значение ОС");
        return os_boot_unix;
    }

    match parse_unix_seconds(cleaned).or_else(|| parse_iso8601(cleaned)) {
        Some(ts) => {
            // humantime cannot format dates past year 9999
            if (0.0..253_402_300_800.0).contains(&ts) {
                debug!(
                    boot_time = %humantime::format_rfc3339_seconds(
                        UNIX_EPOCH + Duration::from_secs(ts as u64)
                    ),
                    "применено переопределение времени загрузки"
                );
            }
            ts
        }
        None => {
            warn!(
                value = %cleaned,
                "не удалось разобрать переопределение времени загрузки, используется значение ОС"
            );
            os_boot_unix
        }
    }
}

fn clean_override(raw: &str) -> &str {
    let trimmed = raw.trim();
    let unquoted = trimmed
        .strip_prefix('"')
        .and_then(|v| v.strip_suffix('"'))
        .or_else(|| {
            trimmed
                .strip_prefix('\'')
                .and_then(|v| v.strip_suffix('\''))
        })
        .unwrap_or(trimmed);
    unquoted.trim()
}

fn parse_unix_seconds(value: &str) -> Option<f64> {
    value.parse::<f64>().ok().filter(|v| v.is_finite())
}

fn parse_iso8601(value: &str) -> Option<f64> {
    DateTime::parse_from_rfc3339(value)
        .ok()
        .map(|dt| dt.timestamp_millis() as f64 / 1000.0)
}

pub fn elapsed_since(boot_unix: f64, now_unix: f64) -> u64 {
    let elapsed = now_unix - boot_unix;
    if elapsed < 0.0 {
        warn!(
            elapsed_secs = elapsed,
            "время загрузки в будущем, аптайм обнулён"
        );
        return 0;
    }
    elapsed as u64
}

pub fn decompose(elapsed_secs: u64) -> Uptime {
    let day = elapsed_secs / 86_400;
    let rem = elapsed_secs % 86_400;
    let hour = rem / 3_600;
    let rem = rem % 3_600;
    Uptime {
        day,
        hour,
        minute: rem / 60,
        second: rem % 60,
    }
}
