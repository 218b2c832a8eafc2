use crate::collectors::{CollectError, Sample};
use crate::snapshot::{round1, round2, DiskUsage, MemoryUsage};
#[cfg(unix)]
use std::fs;
use std::time::Duration;
use sysinfo::{CpuExt, DiskExt, System, SystemExt};
use tracing::debug;

#[cfg(unix)]
pub fn operating_system(system: &System) -> Sample<String> {
    match fs::read_to_string("/etc/os-release") {
        Ok(text) => match parse_os_release_name(&text) {
            Some(name) => Sample::Measured(name),
            None => Sample::Fallback {
                value: platform_name(system),
                reason: "в /etc/os-release нет поля NAME".to_string(),
            },
        },
        Err(err) => Sample::Fallback {
            value: platform_name(system),
            reason: format!("не удалось прочитать /etc/os-release: {err}"),
        },
    }
}

#[cfg(not(unix))]
pub fn operating_system(system: &System) -> Sample<String> {
    Sample::Measured(platform_name(system))
}

fn platform_name(system: &System) -> String {
    system
        .name()
        .unwrap_or_else(|| std::env::consts::OS.to_string())
}

fn parse_os_release_name(text: &str) -> Option<String> {
    text.lines().find_map(|line| {
        let value = line.strip_prefix("NAME=")?.trim().trim_matches('"');
        if value.is_empty() {
            None
        } else {
            Some(value.to_string())
        }
    })
}

pub async fn cpu_usage(system: &mut System, window: Duration) -> f64 {
    system.refresh_cpu();
    tokio::time::sleep(window).await;
    system.refresh_cpu();

    if system.cpus().is_empty() {
        return 0.0;
    }
    let sum: f32 = system.cpus().iter().map(|c| c.cpu_usage()).sum();
    let avg = (sum / system.cpus().len() as f32) as f64;
    round1(avg.clamp(0.0, 100.0))
}

pub fn memory_usage(system: &mut System) -> Result<MemoryUsage, CollectError> {
    system.refresh_memory();
    let total = system.total_memory();
    if total == 0 {
        return Err(CollectError::MemoryUnavailable);
    }
    Ok(memory_from_bytes(total, system.used_memory()))
}

pub fn disk_usage(system: &mut System) -> Sample<DiskUsage> {
    system.refresh_disks_list();
    system.refresh_disks();

    let readings: Vec<Result<(u64, u64), String>> = system
        .disks()
        .iter()
        .map(|disk| {
            let total = disk.total_space();
            if total == 0 {
                return Err(format!(
                    "раздел {} сообщает нулевой объём",
                    disk.mount_point().display()
                ));
            }
            Ok((total, total.saturating_sub(disk.available_space())))
        })
        .collect();

    match aggregate_partitions(&readings) {
        Some((total, used)) => Sample::Measured(disk_from_bytes(total, used)),
        None => fallback_to_root(),
    }
}

fn aggregate_partitions(readings: &[Result<(u64, u64), String>]) -> Option<(u64, u64)> {
    if readings.is_empty() {
        return None;
    }

    let mut total = 0_u64;
    let mut used = 0_u64;
    for reading in readings {
        match reading {
            Ok((part_total, part_used)) => {
                total = total.saturating_add(*part_total);
                used = used.saturating_add(*part_used);
            }
            Err(reason) => debug!(reason = %reason, "раздел пропущен"),
        }
    }
    Some((total, used))
}

#[cfg(unix)]
fn fallback_to_root() -> Sample<DiskUsage> {
    match root_usage() {
        Ok((total, used)) => Sample::Fallback {
            value: disk_from_bytes(total, used),
            reason: "список разделов пуст, использованы данные корневой файловой системы"
                .to_string(),
        },
        Err(err) => Sample::Fallback {
            value: DiskUsage {
                total_gb: 0.0,
                used_gb: 0.0,
            },
            reason: format!("список разделов пуст, statvfs для / не удался: {err}"),
        },
    }
}

#[cfg(not(unix))]
fn fallback_to_root() -> Sample<DiskUsage> {
    Sample::Fallback {
        value: DiskUsage {
            total_gb: 0.0,
            used_gb: 0.0,
        },
        reason: "список разделов пуст".to_string(),
    }
}

#[cfg(unix)]
fn root_usage() -> Result<(u64, u64), nix::Error> {
    use nix::sys::statvfs::statvfs;

    let stats = statvfs("/")?;
    let block = stats.block_size() as u64;
    let total = (stats.blocks() as u64).saturating_mul(block);
    let free = (stats.blocks_free() as u64).saturating_mul(block);
    Ok((total, total.saturating_sub(free)))
}

fn memory_from_bytes(total: u64, used: u64) -> MemoryUsage {
    MemoryUsage {
        total_mb: round2(total as f64 / 1024.0 / 1024.0),
        used_mb: round2(used as f64 / 1024.0 / 1024.0),
    }
}

fn disk_from_bytes(total: u64, used: u64) -> DiskUsage {
    DiskUsage {
        total_gb: round2(total as f64 / 1024.0 / 1024.0 / 1024.0),
        used_gb: round2(used as f64 / 1024.0 / 1024.0 / 1024.0),
    }
}
