pub mod config;
pub mod layout;
pub mod metrics;
pub mod process;

pub use config::MonitoringConfig;
pub use layout::DashboardLayout;
pub use metrics::{MetricsCollector, MetricsSnapshot, MetricsSource};
pub use process::{ProcessDetail, ProcessManager, ProcessRecord, ProcessTable};
