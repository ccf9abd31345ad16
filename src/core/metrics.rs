/// Host metrics collection
///
/// One call to [`MetricsCollector::sample`] produces an immutable [`MetricsSnapshot`]
/// covering CPU, memory, the root filesystem and the summed network counters.
/// Sub-sources that are unavailable (no root mount, no interfaces) come back zeroed
/// instead of failing the whole sample.

use chrono::{DateTime, Local};
use serde::Serialize;
use std::path::Path;
use std::time::Duration;
use sysinfo::{Disks, Networks, System, MINIMUM_CPU_UPDATE_INTERVAL};

use crate::core::config::MonitoringConfig;
use crate::utils::CPU_SAMPLE_WINDOW;

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct MemoryUsage {
    pub total: u64,
    pub available: u64,
    pub used: u64,
    pub free: u64,
    pub percent: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct DiskUsage {
    pub total: u64,
    pub used: u64,
    pub free: u64,
    pub percent: f64,
}

/// Cumulative counters since boot, summed over all interfaces
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct NetworkCounters {
    pub bytes_sent: u64,
    pub bytes_recv: u64,
    pub packets_sent: u64,
    pub packets_recv: u64,
}

/// Bytes per second between two counter readings
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct NetworkThroughput {
    pub sent_per_sec: f64,
    pub recv_per_sec: f64,
}

impl NetworkThroughput {
    pub fn total_per_sec(&self) -> f64 {
        self.sent_per_sec + self.recv_per_sec
    }
}

impl NetworkCounters {
    /// Throughput from `previous` to `self`. A counter that went backwards (host reset)
    /// counts as zero traffic for that interval.
    pub fn throughput_since(&self, previous: &NetworkCounters, elapsed: Duration) -> NetworkThroughput {
        let secs = elapsed.as_secs_f64();
        if secs <= 0.0 {
            return NetworkThroughput::default();
        }

        NetworkThroughput {
            sent_per_sec: self.bytes_sent.saturating_sub(previous.bytes_sent) as f64 / secs,
            recv_per_sec: self.bytes_recv.saturating_sub(previous.bytes_recv) as f64 / secs,
        }
    }
}

/// Point-in-time bundle of host metrics
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MetricsSnapshot {
    pub timestamp: DateTime<Local>,
    pub cpu_percent: f64,
    pub memory: MemoryUsage,
    pub disk: DiskUsage,
    pub network: NetworkCounters,
}

/// Anything that can hand out snapshots together with the thresholds that apply to them
pub trait MetricsSource {
    fn sample(&mut self) -> MetricsSnapshot;
    fn config(&self) -> &MonitoringConfig;
}

/// sysinfo-backed collector. Sampling needs `&mut self`, so one collector is never
/// sampled concurrently.
pub struct MetricsCollector {
    config: MonitoringConfig,
    system: System,
    disks: Disks,
    networks: Networks,
    cpu_window: Duration,
}

impl MetricsCollector {
    pub fn new(config: MonitoringConfig) -> Self {
        let mut system = System::new();
        // Prime the CPU counters so the first delta has a baseline
        system.refresh_cpu();

        Self {
            config,
            system,
            disks: Disks::new_with_refreshed_list(),
            networks: Networks::new_with_refreshed_list(),
            cpu_window: CPU_SAMPLE_WINDOW,
        }
    }

    /// Override the CPU measurement window. Never shorter than what sysinfo needs.
    pub fn with_cpu_window(mut self, window: Duration) -> Self {
        self.cpu_window = window.max(MINIMUM_CPU_UPDATE_INTERVAL);
        self
    }

    /// Blocks for the measurement window
    pub fn cpu_usage(&mut self) -> f64 {
        self.system.refresh_cpu();
        std::thread::sleep(self.cpu_window);
        self.system.refresh_cpu();
        f64::from(self.system.global_cpu_info().cpu_usage())
    }

    pub fn memory_usage(&mut self) -> MemoryUsage {
        self.system.refresh_memory();

        let total = self.system.total_memory();
        let available = self.system.available_memory();

        MemoryUsage {
            total,
            available,
            used: self.system.used_memory(),
            free: self.system.free_memory(),
            percent: percent_of(total.saturating_sub(available), total),
        }
    }

    /// Usage of the filesystem mounted at `/`, or the first listed disk on hosts without one
    pub fn disk_usage(&mut self) -> DiskUsage {
        if let Some(usage) = root_statvfs() {
            return usage;
        }

        self.disks.refresh_list();

        let root = self
            .disks
            .iter()
            .find(|d| d.mount_point() == Path::new("/"))
            .or_else(|| self.disks.iter().next());

        match root {
            Some(disk) => {
                let total = disk.total_space();
                let free = disk.available_space();
                let used = total.saturating_sub(free);
                DiskUsage {
                    total,
                    used,
                    free,
                    percent: percent_of(used, total),
                }
            }
            None => {
                log::warn!("No mounted filesystem found, reporting zero disk usage");
                DiskUsage::default()
            }
        }
    }

    pub fn network_usage(&mut self) -> NetworkCounters {
        self.networks.refresh_list();

        self.networks
            .iter()
            .fold(NetworkCounters::default(), |mut acc, (_name, data)| {
                acc.bytes_sent += data.total_transmitted();
                acc.bytes_recv += data.total_received();
                acc.packets_sent += data.total_packets_transmitted();
                acc.packets_recv += data.total_packets_received();
                acc
            })
    }
}

impl MetricsSource for MetricsCollector {
    fn sample(&mut self) -> MetricsSnapshot {
        let cpu_percent = self.cpu_usage();

        MetricsSnapshot {
            timestamp: Local::now(),
            cpu_percent,
            memory: self.memory_usage(),
            disk: self.disk_usage(),
            network: self.network_usage(),
        }
    }

    fn config(&self) -> &MonitoringConfig {
        &self.config
    }
}

impl DiskUsage {
    /// `df` semantics: blocks reserved for root count neither as used nor as free,
    /// so `percent` is `used / (used + available)`.
    pub fn from_blocks(blocks: u64, blocks_free: u64, blocks_available: u64, fragment_size: u64) -> Self {
        let used = blocks.saturating_sub(blocks_free) * fragment_size;
        let free = blocks_available * fragment_size;

        DiskUsage {
            total: blocks * fragment_size,
            used,
            free,
            percent: percent_of(used, used + free),
        }
    }
}

#[cfg(unix)]
fn root_statvfs() -> Option<DiskUsage> {
    match nix::sys::statvfs::statvfs("/") {
        Ok(stat) => Some(DiskUsage::from_blocks(
            stat.blocks() as u64,
            stat.blocks_free() as u64,
            stat.blocks_available() as u64,
            stat.fragment_size() as u64,
        )),
        Err(e) => {
            log::warn!("statvfs on / failed, falling back to the disk list: {}", e);
            None
        }
    }
}

#[cfg(not(unix))]
fn root_statvfs() -> Option<DiskUsage> {
    None
}

fn percent_of(part: u64, total: u64) -> f64 {
    if total == 0 {
        0.0
    } else {
        (part as f64 / total as f64 * 1000.0).round() / 10.0
    }
}
