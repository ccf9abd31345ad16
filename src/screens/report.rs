/// Plain-text metrics report used by `report` and `monitor`

use colored::Colorize;

use crate::core::config::MonitoringConfig;
use crate::core::layout::PanelStyle;
use crate::core::metrics::{MetricsSnapshot, MetricsSource, NetworkThroughput};
use crate::utils::{format_kib, format_rate};

#[derive(Debug, Clone, PartialEq)]
pub struct ReportLine {
    pub text: String,
    pub style: PanelStyle,
}

impl ReportLine {
    fn normal(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            style: PanelStyle::Normal,
        }
    }

    fn checked(text: impl Into<String>, value: f64, threshold: f64) -> Self {
        Self {
            text: text.into(),
            style: PanelStyle::for_value(value, threshold),
        }
    }
}

/// Report body for one snapshot. `throughput` is only known once two samples exist.
pub fn report_lines(
    snapshot: &MetricsSnapshot,
    config: &MonitoringConfig,
    throughput: Option<NetworkThroughput>,
) -> Vec<ReportLine> {
    let mut lines = vec![
        ReportLine::checked(
            format!("CPU Usage: {:.1}%", snapshot.cpu_percent),
            snapshot.cpu_percent,
            config.cpu_threshold,
        ),
        ReportLine::checked(
            format!("Memory: {:.1}%", snapshot.memory.percent),
            snapshot.memory.percent,
            config.memory_threshold,
        ),
        ReportLine::checked(
            format!("Disk: {:.1}%", snapshot.disk.percent),
            snapshot.disk.percent,
            config.disk_threshold,
        ),
        ReportLine::normal("Network:"),
        ReportLine::normal(format!("    Sent: {}", format_kib(snapshot.network.bytes_sent))),
        ReportLine::normal(format!("    Received: {}", format_kib(snapshot.network.bytes_recv))),
    ];

    if let Some(rate) = throughput {
        lines.push(ReportLine::checked(
            format!(
                "    Throughput: {} up, {} down",
                format_rate(rate.sent_per_sec),
                format_rate(rate.recv_per_sec)
            ),
            rate.total_per_sec(),
            config.network_threshold,
        ));
    }

    lines
}

pub fn print_report(snapshot: &MetricsSnapshot, lines: &[ReportLine]) {
    println!(
        "{} ({})",
        "System Metrics".bold(),
        snapshot.timestamp.format("%Y-%m-%d %H:%M:%S")
    );

    for line in lines {
        match line.style {
            PanelStyle::Alert => println!("{}", line.text.red().bold()),
            PanelStyle::Normal => println!("{}", line.text.green()),
        }
    }
}

/// Looping report source. Keeps the previous network counters to derive throughput.
pub struct TextMonitor<M: MetricsSource> {
    source: M,
    previous: Option<MetricsSnapshot>,
}

impl<M: MetricsSource> TextMonitor<M> {
    pub fn new(source: M) -> Self {
        Self {
            source,
            previous: None,
        }
    }

    pub fn next_report(&mut self) -> (MetricsSnapshot, Vec<ReportLine>) {
        let snapshot = self.source.sample();

        let throughput = self.previous.as_ref().map(|prev| {
            let elapsed = (snapshot.timestamp - prev.timestamp)
                .to_std()
                .unwrap_or_default();
            snapshot.network.throughput_since(&prev.network, elapsed)
        });

        let lines = report_lines(&snapshot, self.source.config(), throughput);
        self.previous = Some(snapshot.clone());

        (snapshot, lines)
    }
}
