/// Main TUI application

use anyhow::Result;
use crossterm::{
    event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{backend::CrosstermBackend, Terminal};
use std::io;
use std::sync::mpsc::Receiver;
use std::time::{Duration, Instant};

use crate::core::config::MonitoringConfig;
use crate::core::metrics::{MetricsCollector, MetricsSource};
use crate::core::process::{ProcessManager, ProcessTable, SysinfoProcessTable};
use crate::screens::dashboard::{self, Dashboard};
use crate::utils::INPUT_POLL_INTERVAL;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunState {
    Running,
    Stopped,
}

/// Tick, then wait one interval, until the wait reports an interrupt.
///
/// A failing tick is logged and the loop carries on with the next one. The only way
/// from `Running` to `Stopped` is the interrupt, and `Stopped` is final.
pub struct RefreshLoop {
    state: RunState,
    interval: Duration,
    ticks: u64,
}

impl RefreshLoop {
    pub fn new(interval: Duration) -> Self {
        Self {
            state: RunState::Running,
            interval,
            ticks: 0,
        }
    }

    pub fn state(&self) -> RunState {
        self.state
    }

    pub fn ticks(&self) -> u64 {
        self.ticks
    }

    /// `wait` returns `Ok(true)` when the user asked to stop.
    pub fn run<T, W>(&mut self, mut tick: T, mut wait: W) -> Result<()>
    where
        T: FnMut() -> Result<()>,
        W: FnMut(Duration) -> Result<bool>,
    {
        while self.state == RunState::Running {
            if let Err(e) = tick() {
                log::warn!("Refresh failed: {:#}", e);
            }
            self.ticks += 1;

            if wait(self.interval)? {
                self.state = RunState::Stopped;
            }
        }

        Ok(())
    }
}

/// q, Esc and Ctrl-C all close the dashboard
pub fn is_quit_key(key: &KeyEvent) -> bool {
    if key.kind != KeyEventKind::Press {
        return false;
    }

    match key.code {
        KeyCode::Char('q') | KeyCode::Esc => true,
        KeyCode::Char('c') => key.modifiers.contains(KeyModifiers::CONTROL),
        _ => false,
    }
}

/// `true` once a stop request has been sent. A dropped sender is not a request.
pub fn stop_requested(stop: &Receiver<()>) -> bool {
    matches!(stop.try_recv(), Ok(()))
}

/// Wait up to `timeout`, returning early with `true` on a stop request or a quit key.
/// `quit_key` polls input for at most the slice it is given.
fn wait_until_stopped<K>(timeout: Duration, stop: &Receiver<()>, mut quit_key: K) -> Result<bool>
where
    K: FnMut(Duration) -> Result<bool>,
{
    let deadline = Instant::now() + timeout;

    loop {
        if stop_requested(stop) {
            return Ok(true);
        }

        let remaining = deadline.saturating_duration_since(Instant::now());
        if remaining.is_zero() {
            return Ok(false);
        }

        if quit_key(remaining.min(INPUT_POLL_INTERVAL))? {
            return Ok(true);
        }
    }
}

fn poll_quit_key(timeout: Duration) -> Result<bool> {
    if event::poll(timeout)? {
        if let Event::Key(key) = event::read()? {
            return Ok(is_quit_key(&key));
        }
    }
    Ok(false)
}

pub struct App<M: MetricsSource = MetricsCollector, P: ProcessTable = SysinfoProcessTable> {
    dashboard: Dashboard<M, P>,
    refresh: RefreshLoop,
}

impl App {
    pub fn new(config: MonitoringConfig) -> Self {
        let refresh = RefreshLoop::new(config.dashboard_refresh());
        let dashboard = Dashboard::new(MetricsCollector::new(config), ProcessManager::system());

        Self { dashboard, refresh }
    }
}

impl<M: MetricsSource, P: ProcessTable> App<M, P> {
    /// Blocking. Owns the terminal until a quit key arrives or `stop` fires.
    pub fn run(&mut self, stop: Receiver<()>) -> Result<()> {
        // Setup terminal
        enable_raw_mode()?;
        let mut stdout = io::stdout();
        execute!(stdout, EnterAlternateScreen)?;
        let backend = CrosstermBackend::new(stdout);
        let mut terminal = Terminal::new(backend)?;

        log::info!("Dashboard started");
        let result = self.run_loop(&mut terminal, &stop);

        // Restore terminal
        disable_raw_mode()?;
        execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
        terminal.show_cursor()?;

        log::info!("Dashboard stopped after {} refreshes", self.refresh.ticks());
        result
    }

    fn run_loop<B: ratatui::backend::Backend>(
        &mut self,
        terminal: &mut Terminal<B>,
        stop: &Receiver<()>,
    ) -> Result<()> {
        let screen = &mut self.dashboard;

        self.refresh.run(
            || {
                let layout = screen.tick();
                terminal.draw(|f| dashboard::render(f, &layout))?;
                Ok(())
            },
            |timeout| wait_until_stopped(timeout, stop, poll_quit_key),
        )
    }
}
