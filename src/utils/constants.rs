/// Shared constants for collection, ranking and the dashboard layout

use std::time::Duration;

/// How long a CPU sample measures for
pub const CPU_SAMPLE_WINDOW: Duration = Duration::from_secs(1);

/// Rows in the dashboard process table
pub const TOP_PROCESS_COUNT: usize = 5;

/// Process names are cut to this many characters for display
pub const PROCESS_NAME_WIDTH: usize = 20;

/// Dashboard region heights (terminal rows)
pub const HEADER_HEIGHT: u16 = 3;
pub const FOOTER_HEIGHT: u16 = 8; // 5 rows + column header + borders

/// How often the dashboard checks for a quit key while waiting for the next tick
pub const INPUT_POLL_INTERVAL: Duration = Duration::from_millis(100);

/// Default paths
pub const DEFAULT_CONFIG_FILE: &str = "config.yaml";
pub const DEFAULT_LOG_FILE: &str = "monitor.log";

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_footer_fits_top_processes() {
        // borders (2) + column header (1)
        assert_eq!(FOOTER_HEIGHT as usize, TOP_PROCESS_COUNT + 3);
    }

    #[test]
    fn test_cpu_window_meets_sysinfo_minimum() {
        assert!(CPU_SAMPLE_WINDOW >= sysinfo::MINIMUM_CPU_UPDATE_INTERVAL);
    }
}
