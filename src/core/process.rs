/// Process listing, inspection and signalling
///
/// [`ProcessTable`] is the raw capability over the OS process table; it reports every
/// failure. [`ProcessManager`] sits on top and applies the best-effort policy callers
/// rely on: unreadable entries are skipped when listing, a missing or denied pid is
/// `None` for details, and a failed signal is `false`.

use chrono::{DateTime, Local};
use serde::Serialize;
use std::cmp::Ordering;
use std::fmt;
use sysinfo::{Pid, Process, Signal, System, Users};
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProcessRecord {
    pub pid: u32,
    pub name: String,
    pub username: Option<String>,
    pub cpu_percent: Option<f32>,
    pub memory_percent: Option<f32>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProcessDetail {
    pub pid: u32,
    pub name: String,
    pub status: String,
    pub cpu_percent: f32,
    pub memory_percent: f32,
    pub create_time: Option<DateTime<Local>>,
    pub username: Option<String>,
    pub cmdline: Vec<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KillSignal {
    /// Graceful termination (SIGTERM)
    Terminate,
    /// Immediate kill (SIGKILL)
    Kill,
}

impl KillSignal {
    pub fn from_force(force: bool) -> Self {
        if force {
            KillSignal::Kill
        } else {
            KillSignal::Terminate
        }
    }
}

impl fmt::Display for KillSignal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            KillSignal::Terminate => write!(f, "SIGTERM"),
            KillSignal::Kill => write!(f, "SIGKILL"),
        }
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ProcessError {
    #[error("no such process (pid={0})")]
    NotFound(u32),

    #[error("access denied (pid={0})")]
    AccessDenied(u32),

    #[error("{0} is not supported on this platform")]
    UnsupportedSignal(KillSignal),
}

/// Raw access to the OS process table
#[cfg_attr(test, mockall::automock)]
pub trait ProcessTable {
    /// One entry per enumerated process, in enumeration order
    fn processes(&mut self) -> Vec<Result<ProcessRecord, ProcessError>>;

    fn detail(&mut self, pid: u32) -> Result<ProcessDetail, ProcessError>;

    fn signal(&mut self, pid: u32, signal: KillSignal) -> Result<(), ProcessError>;
}

/// sysinfo-backed process table
pub struct SysinfoProcessTable {
    system: System,
    users: Users,
}

impl SysinfoProcessTable {
    pub fn new() -> Self {
        let mut system = System::new();
        system.refresh_memory();
        // Baseline for per-process CPU deltas
        system.refresh_processes();

        Self {
            system,
            users: Users::new_with_refreshed_list(),
        }
    }

    fn memory_percent(&self, process: &Process) -> Option<f32> {
        let total = self.system.total_memory();
        if total == 0 {
            None
        } else {
            Some((process.memory() as f64 / total as f64 * 100.0) as f32)
        }
    }

    fn username(&self, process: &Process) -> Option<String> {
        process
            .user_id()
            .and_then(|uid| self.users.get_user_by_id(uid))
            .map(|user| user.name().to_string())
    }
}

impl Default for SysinfoProcessTable {
    fn default() -> Self {
        Self::new()
    }
}

impl ProcessTable for SysinfoProcessTable {
    fn processes(&mut self) -> Vec<Result<ProcessRecord, ProcessError>> {
        self.system.refresh_memory();
        self.system.refresh_processes();
        self.users.refresh_list();

        self.system
            .processes()
            .iter()
            .map(|(pid, process)| {
                Ok(ProcessRecord {
                    pid: pid.as_u32(),
                    name: process.name().to_string(),
                    username: self.username(process),
                    cpu_percent: Some(process.cpu_usage()),
                    memory_percent: self.memory_percent(process),
                })
            })
            .collect()
    }

    fn detail(&mut self, pid: u32) -> Result<ProcessDetail, ProcessError> {
        let sys_pid = Pid::from_u32(pid);
        self.system.refresh_memory();
        if !self.system.refresh_process(sys_pid) {
            return Err(ProcessError::NotFound(pid));
        }

        let process = self
            .system
            .process(sys_pid)
            .ok_or(ProcessError::NotFound(pid))?;

        let create_time = i64::try_from(process.start_time())
            .ok()
            .and_then(|secs| DateTime::from_timestamp(secs, 0))
            .map(|dt| dt.with_timezone(&Local));

        Ok(ProcessDetail {
            pid,
            name: process.name().to_string(),
            status: process.status().to_string(),
            cpu_percent: process.cpu_usage(),
            memory_percent: self.memory_percent(process).unwrap_or(0.0),
            create_time,
            username: self.username(process),
            cmdline: process.cmd().to_vec(),
        })
    }

    fn signal(&mut self, pid: u32, signal: KillSignal) -> Result<(), ProcessError> {
        let sys_pid = Pid::from_u32(pid);
        if !self.system.refresh_process(sys_pid) {
            return Err(ProcessError::NotFound(pid));
        }

        let sent = self
            .system
            .process(sys_pid)
            .ok_or(ProcessError::NotFound(pid))?
            .kill_with(match signal {
                KillSignal::Terminate => Signal::Term,
                KillSignal::Kill => Signal::Kill,
            });

        match sent {
            Some(true) => Ok(()),
            None => Err(ProcessError::UnsupportedSignal(signal)),
            Some(false) => {
                // Delivery failed: either the process exited in between or we lack permission
                if self.system.refresh_process(sys_pid) {
                    Err(ProcessError::AccessDenied(pid))
                } else {
                    Err(ProcessError::NotFound(pid))
                }
            }
        }
    }
}

/// Best-effort process operations over a [`ProcessTable`]
pub struct ProcessManager<T: ProcessTable = SysinfoProcessTable> {
    table: T,
}

impl ProcessManager<SysinfoProcessTable> {
    pub fn system() -> Self {
        Self::new(SysinfoProcessTable::new())
    }
}

impl<T: ProcessTable> ProcessManager<T> {
    pub fn new(table: T) -> Self {
        Self { table }
    }

    /// All readable processes. Entries that vanish or deny access are skipped.
    pub fn list_processes(&mut self) -> Vec<ProcessRecord> {
        self.table
            .processes()
            .into_iter()
            .filter_map(|entry| match entry {
                Ok(record) => Some(record),
                Err(e) => {
                    log::debug!("Skipping process during enumeration: {}", e);
                    None
                }
            })
            .collect()
    }

    /// `None` when the pid does not exist or cannot be read
    pub fn process_detail(&mut self, pid: u32) -> Option<ProcessDetail> {
        match self.table.detail(pid) {
            Ok(detail) => Some(detail),
            Err(ProcessError::NotFound(_)) => None,
            Err(e) => {
                log::error!("Error getting process details for PID {}: {}", pid, e);
                None
            }
        }
    }

    /// Send SIGTERM, or SIGKILL when `force` is set. Does not wait for the process to exit.
    pub fn kill_process(&mut self, pid: u32, force: bool) -> bool {
        let signal = KillSignal::from_force(force);

        match self.table.signal(pid, signal) {
            Ok(()) => {
                log::info!("Sent {} to process {}", signal, pid);
                true
            }
            Err(e) => {
                log::error!("Error killing process {}: {}", pid, e);
                false
            }
        }
    }
}

/// Ordering used by the process listing
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProcessSort {
    Cpu,
    Memory,
    Pid,
}

fn descending(a: Option<f32>, b: Option<f32>) -> Ordering {
    b.unwrap_or(0.0).total_cmp(&a.unwrap_or(0.0))
}

/// Stable sort: records comparing equal keep their enumeration order
pub fn sort_processes(records: &mut [ProcessRecord], by: ProcessSort) {
    match by {
        ProcessSort::Cpu => records.sort_by(|a, b| descending(a.cpu_percent, b.cpu_percent)),
        ProcessSort::Memory => {
            records.sort_by(|a, b| descending(a.memory_percent, b.memory_percent))
        }
        ProcessSort::Pid => records.sort_by_key(|r| r.pid),
    }
}

/// The `limit` busiest processes by CPU, ties in enumeration order.
/// A missing CPU reading ranks as 0%.
pub fn top_by_cpu(mut records: Vec<ProcessRecord>, limit: usize) -> Vec<ProcessRecord> {
    sort_processes(&mut records, ProcessSort::Cpu);
    records.truncate(limit);
    records
}

#[cfg(test)]
mod tests {
    use super::*;
    use mockall::predicate::eq;

    fn record(pid: u32, cpu: f32) -> ProcessRecord {
        ProcessRecord {
            pid,
            name: format!("proc-{}", pid),
            username: Some("root".to_string()),
            cpu_percent: Some(cpu),
            memory_percent: Some(1.0),
        }
    }

    fn pids(records: &[ProcessRecord]) -> Vec<u32> {
        records.iter().map(|r| r.pid).collect()
    }

    /// Per-thread capture of log lines so parallel tests do not see each other's output
    mod captured_log {
        use std::cell::RefCell;
        use std::sync::Once;

        thread_local! {
            static LINES: RefCell<Vec<String>> = RefCell::new(Vec::new());
        }

        struct Capture;

        impl log::Log for Capture {
            fn enabled(&self, _: &log::Metadata) -> bool {
                true
            }

            fn log(&self, record: &log::Record) {
                LINES.with(|l| l.borrow_mut().push(format!("{} - {}", record.level(), record.args())));
            }

            fn flush(&self) {}
        }

        static CAPTURE: Capture = Capture;
        static INSTALL: Once = Once::new();

        pub fn start() {
            INSTALL.call_once(|| {
                log::set_logger(&CAPTURE).unwrap();
                log::set_max_level(log::LevelFilter::Trace);
            });
            LINES.with(|l| l.borrow_mut().clear());
        }

        pub fn lines() -> Vec<String> {
            LINES.with(|l| l.borrow().clone())
        }
    }

    #[test]
    fn test_top_by_cpu_stable_ties() {
        let records = vec![
            record(1, 10.0),
            record(2, 50.0),
            record(3, 50.0),
            record(4, 5.0),
            record(5, 99.0),
            record(6, 1.0),
        ];

        assert_eq!(pids(&top_by_cpu(records, 5)), vec![5, 2, 3, 1, 4]);
    }

    #[test]
    fn test_top_by_cpu_fewer_than_limit() {
        let records = vec![record(7, 0.5), record(8, 3.0)];
        assert_eq!(pids(&top_by_cpu(records, 5)), vec![8, 7]);
        assert!(top_by_cpu(Vec::new(), 5).is_empty());
    }

    #[test]
    fn test_missing_cpu_ranks_as_zero() {
        let mut unknown = record(9, 0.0);
        unknown.cpu_percent = None;
        let records = vec![unknown, record(10, 0.0), record(11, 0.1)];

        assert_eq!(pids(&top_by_cpu(records, 5)), vec![11, 9, 10]);
    }

    #[test]
    fn test_nan_reading_sorts_without_panicking() {
        let records = vec![record(1, 1.0), record(2, f32::NAN), record(3, 3.0), record(4, 1.0)];

        let top = top_by_cpu(records, 5);

        // NaN orders above every number; equal readings keep enumeration order
        assert_eq!(pids(&top), vec![2, 3, 1, 4]);
    }

    #[test]
    fn test_sort_by_memory_and_pid() {
        let mut a = record(30, 0.0);
        a.memory_percent = Some(2.0);
        let mut b = record(10, 0.0);
        b.memory_percent = Some(9.0);
        let mut c = record(20, 0.0);
        c.memory_percent = None;

        let mut records = vec![a, b, c];
        sort_processes(&mut records, ProcessSort::Memory);
        assert_eq!(pids(&records), vec![10, 30, 20]);

        sort_processes(&mut records, ProcessSort::Pid);
        assert_eq!(pids(&records), vec![10, 20, 30]);
    }

    #[test]
    fn test_list_skips_vanished_processes() {
        let mut table = MockProcessTable::new();
        table.expect_processes().times(1).returning(|| {
            vec![
                Ok(record(1, 2.0)),
                Err(ProcessError::NotFound(2)),
                Err(ProcessError::AccessDenied(3)),
                Ok(record(4, 1.0)),
            ]
        });

        let mut manager = ProcessManager::new(table);
        assert_eq!(pids(&manager.list_processes()), vec![1, 4]);
    }

    #[test]
    fn test_detail_absent_for_missing_or_denied() {
        let mut table = MockProcessTable::new();
        table
            .expect_detail()
            .with(eq(404))
            .returning(|pid| Err(ProcessError::NotFound(pid)));
        table
            .expect_detail()
            .with(eq(1))
            .returning(|pid| Err(ProcessError::AccessDenied(pid)));

        let mut manager = ProcessManager::new(table);
        assert!(manager.process_detail(404).is_none());
        assert!(manager.process_detail(1).is_none());
    }

    #[test]
    fn test_detail_found() {
        let mut table = MockProcessTable::new();
        table.expect_detail().with(eq(42)).returning(|pid| {
            Ok(ProcessDetail {
                pid,
                name: "worker".to_string(),
                status: "Sleeping".to_string(),
                cpu_percent: 0.5,
                memory_percent: 1.5,
                create_time: None,
                username: None,
                cmdline: vec!["worker".to_string(), "--serve".to_string()],
            })
        });

        let mut manager = ProcessManager::new(table);
        let detail = manager.process_detail(42).unwrap();
        assert_eq!(detail.name, "worker");
        assert_eq!(detail.cmdline.len(), 2);
    }

    #[test]
    fn test_kill_nonexistent_returns_false() {
        let mut table = MockProcessTable::new();
        table
            .expect_signal()
            .with(eq(999_999), eq(KillSignal::Terminate))
            .times(1)
            .returning(|pid, _| Err(ProcessError::NotFound(pid)));

        captured_log::start();
        let mut manager = ProcessManager::new(table);
        assert!(!manager.kill_process(999_999, false));

        let lines = captured_log::lines();
        assert_eq!(
            lines,
            vec!["ERROR - Error killing process 999999: no such process (pid=999999)".to_string()]
        );
        assert!(!lines.iter().any(|l| l.contains("Sent")));
    }

    #[test]
    fn test_kill_force_sends_sigkill() {
        let mut table = MockProcessTable::new();
        table
            .expect_signal()
            .with(eq(42), eq(KillSignal::Kill))
            .times(1)
            .returning(|_, _| Ok(()));

        captured_log::start();
        let mut manager = ProcessManager::new(table);
        assert!(manager.kill_process(42, true));

        assert_eq!(captured_log::lines(), vec!["INFO - Sent SIGKILL to process 42".to_string()]);
    }

    #[test]
    fn test_kill_denied_returns_false() {
        let mut table = MockProcessTable::new();
        table
            .expect_signal()
            .returning(|pid, _| Err(ProcessError::AccessDenied(pid)));

        let mut manager = ProcessManager::new(table);
        assert!(!manager.kill_process(1, false));
    }

    #[test]
    fn test_signal_names() {
        assert_eq!(KillSignal::from_force(false).to_string(), "SIGTERM");
        assert_eq!(KillSignal::from_force(true).to_string(), "SIGKILL");
    }

    #[test]
    fn test_sysinfo_table_unknown_pid() {
        let mut manager = ProcessManager::system();
        // Pids are bounded well below this on every supported platform
        let pid = u32::MAX - 1;
        assert!(manager.process_detail(pid).is_none());
        assert!(!manager.kill_process(pid, false));
    }

    #[test]
    fn test_sysinfo_table_sees_self() {
        let mut manager = ProcessManager::system();
        let own = std::process::id();

        assert!(manager.list_processes().iter().any(|r| r.pid == own));
        assert_eq!(manager.process_detail(own).map(|d| d.pid), Some(own));
    }
}
