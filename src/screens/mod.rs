pub mod dashboard;
pub mod report;

// Two ways of looking at the same snapshot:
// - dashboard.rs: full-screen TUI (header, CPU and memory panels, top processes)
// - report.rs: plain text for `report` and the looping `monitor` command
//
// Both mark a value as alerting only when it is strictly above its threshold.

pub use dashboard::Dashboard;
pub use report::{report_lines, ReportLine, TextMonitor};
