/// Dashboard layout derivation
///
/// Turns one snapshot, the thresholds and the already-ranked process list into a
/// [`DashboardLayout`]. Nothing here touches the terminal or keeps state between calls,
/// so the same inputs always give the same layout.

use crate::core::config::MonitoringConfig;
use crate::core::metrics::MetricsSnapshot;
use crate::core::process::ProcessRecord;
use crate::utils::{format_gib, truncate_chars, PROCESS_NAME_WIDTH, TOP_PROCESS_COUNT};

pub const DASHBOARD_TITLE: &str = "System Monitor";
pub const EXIT_HINT: &str = "Press Ctrl+C or q to exit";
pub const PROCESS_COLUMNS: [&str; 4] = ["PID", "Name", "CPU %", "Memory %"];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PanelStyle {
    Normal,
    Alert,
}

impl PanelStyle {
    /// Strictly above the threshold alerts; equal does not
    pub fn for_value(value: f64, threshold: f64) -> Self {
        if value > threshold {
            PanelStyle::Alert
        } else {
            PanelStyle::Normal
        }
    }

    pub fn is_alert(&self) -> bool {
        *self == PanelStyle::Alert
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PanelKind {
    Cpu,
    Memory,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Panel {
    pub kind: PanelKind,
    pub title: String,
    pub lines: Vec<String>,
    pub style: PanelStyle,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Header {
    pub title: String,
    pub subtitle: String,
}

/// Display-ready row; the source record is left untouched
#[derive(Debug, Clone, PartialEq)]
pub struct ProcessRow {
    pub pid: String,
    pub name: String,
    pub cpu: String,
    pub memory: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ProcessTableView {
    pub title: String,
    pub rows: Vec<ProcessRow>,
}

/// Header on top, CPU and memory side by side, process table at the bottom
#[derive(Debug, Clone, PartialEq)]
pub struct DashboardLayout {
    pub header: Header,
    pub cpu: Panel,
    pub memory: Panel,
    pub processes: ProcessTableView,
}

pub fn header(snapshot: &MetricsSnapshot) -> Header {
    Header {
        title: format!(
            "{} - {}",
            DASHBOARD_TITLE,
            snapshot.timestamp.format("%Y-%m-%d %H:%M:%S")
        ),
        subtitle: EXIT_HINT.to_string(),
    }
}

pub fn cpu_panel(snapshot: &MetricsSnapshot, config: &MonitoringConfig) -> Panel {
    Panel {
        kind: PanelKind::Cpu,
        title: "CPU".to_string(),
        lines: vec![format!("CPU Usage: {:.1}%", snapshot.cpu_percent)],
        style: PanelStyle::for_value(snapshot.cpu_percent, config.cpu_threshold),
    }
}

pub fn memory_panel(snapshot: &MetricsSnapshot, config: &MonitoringConfig) -> Panel {
    let memory = &snapshot.memory;

    Panel {
        kind: PanelKind::Memory,
        title: "Memory".to_string(),
        lines: vec![
            format!("Total: {}", format_gib(memory.total)),
            format!("Used: {}", format_gib(memory.used)),
            format!("Free: {}", format_gib(memory.free)),
            format!("Usage: {:.1}%", memory.percent),
        ],
        style: PanelStyle::for_value(memory.percent, config.memory_threshold),
    }
}

/// Rows for at most [`TOP_PROCESS_COUNT`] records, in the order given
pub fn process_table(top: &[ProcessRecord]) -> ProcessTableView {
    let rows = top
        .iter()
        .take(TOP_PROCESS_COUNT)
        .map(|record| ProcessRow {
            pid: record.pid.to_string(),
            name: truncate_chars(&record.name, PROCESS_NAME_WIDTH),
            cpu: format!("{:.1}", record.cpu_percent.unwrap_or(0.0)),
            memory: format!("{:.1}", record.memory_percent.unwrap_or(0.0)),
        })
        .collect();

    ProcessTableView {
        title: "Top Processes".to_string(),
        rows,
    }
}

pub fn build_layout(
    snapshot: &MetricsSnapshot,
    config: &MonitoringConfig,
    top: &[ProcessRecord],
) -> DashboardLayout {
    DashboardLayout {
        header: header(snapshot),
        cpu: cpu_panel(snapshot, config),
        memory: memory_panel(snapshot, config),
        processes: process_table(top),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::metrics::{DiskUsage, MemoryUsage, NetworkCounters};
    use chrono::{Local, TimeZone};

    fn snapshot(cpu: f64, memory_percent: f64) -> MetricsSnapshot {
        MetricsSnapshot {
            timestamp: Local.with_ymd_and_hms(2024, 5, 1, 12, 30, 0).unwrap(),
            cpu_percent: cpu,
            memory: MemoryUsage {
                total: 8 * 1024 * 1024 * 1024,
                available: 4 * 1024 * 1024 * 1024,
                used: 4 * 1024 * 1024 * 1024,
                free: 2 * 1024 * 1024 * 1024,
                percent: memory_percent,
            },
            disk: DiskUsage::default(),
            network: NetworkCounters::default(),
        }
    }

    fn record(pid: u32, name: &str, cpu: f32) -> ProcessRecord {
        ProcessRecord {
            pid,
            name: name.to_string(),
            username: None,
            cpu_percent: Some(cpu),
            memory_percent: Some(0.5),
        }
    }

    #[test]
    fn test_cpu_alert_above_threshold() {
        let config = MonitoringConfig::default();
        assert_eq!(cpu_panel(&snapshot(95.0, 10.0), &config).style, PanelStyle::Alert);
    }

    #[test]
    fn test_cpu_at_threshold_is_normal() {
        let config = MonitoringConfig::default();
        assert_eq!(cpu_panel(&snapshot(80.0, 10.0), &config).style, PanelStyle::Normal);
        assert_eq!(cpu_panel(&snapshot(80.01, 10.0), &config).style, PanelStyle::Alert);
    }

    #[test]
    fn test_memory_alert_uses_memory_threshold() {
        let config = MonitoringConfig {
            memory_threshold: 50.0,
            ..MonitoringConfig::default()
        };

        let layout = build_layout(&snapshot(10.0, 60.0), &config, &[]);
        assert_eq!(layout.cpu.style, PanelStyle::Normal);
        assert_eq!(layout.memory.style, PanelStyle::Alert);
        assert!(layout.memory.style.is_alert());
    }

    #[test]
    fn test_memory_at_threshold_is_normal() {
        let config = MonitoringConfig::default();

        assert_eq!(memory_panel(&snapshot(10.0, 80.0), &config).style, PanelStyle::Normal);
        assert_eq!(memory_panel(&snapshot(10.0, 80.1), &config).style, PanelStyle::Alert);
    }

    #[test]
    fn test_out_of_range_values_pass_through() {
        let config = MonitoringConfig::default();
        let layout = build_layout(&snapshot(130.0, 101.5), &config, &[]);

        assert_eq!(layout.cpu.lines, vec!["CPU Usage: 130.0%".to_string()]);
        assert_eq!(layout.memory.lines[3], "Usage: 101.5%");
    }

    #[test]
    fn test_memory_lines_in_gib() {
        let panel = memory_panel(&snapshot(1.0, 50.0), &MonitoringConfig::default());
        assert_eq!(
            panel.lines,
            vec!["Total: 8.00 GB", "Used: 4.00 GB", "Free: 2.00 GB", "Usage: 50.0%"]
        );
    }

    #[test]
    fn test_header_uses_snapshot_time() {
        let header = header(&snapshot(1.0, 1.0));
        assert_eq!(header.title, "System Monitor - 2024-05-01 12:30:00");
    }

    #[test]
    fn test_process_table_truncates_for_display_only() {
        let long = record(7, "a-very-long-process-name-indeed", 3.0);
        let top = vec![long.clone()];

        let table = process_table(&top);

        assert_eq!(table.rows[0].name, "a-very-long-process-");
        assert_eq!(table.rows[0].name.chars().count(), PROCESS_NAME_WIDTH);
        assert_eq!(top[0], long);
        assert_eq!(table.rows[0].cpu, "3.0");
        assert_eq!(table.rows[0].memory, "0.5");
    }

    #[test]
    fn test_process_table_capped() {
        let top: Vec<ProcessRecord> = (1..=8).map(|pid| record(pid, "p", 1.0)).collect();
        assert_eq!(process_table(&top).rows.len(), TOP_PROCESS_COUNT);
    }

    #[test]
    fn test_same_snapshot_same_layout() {
        let config = MonitoringConfig::default();
        let snap = snapshot(42.0, 33.0);
        let top = vec![record(1, "init", 0.1), record(2, "kworker", 0.0)];

        assert_eq!(
            build_layout(&snap, &config, &top),
            build_layout(&snap, &config, &top)
        );
    }
}
