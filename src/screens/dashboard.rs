/// Live dashboard screen

use ratatui::{
    layout::{Constraint, Direction, Layout},
    Frame,
};

use crate::core::layout::{build_layout, DashboardLayout};
use crate::core::metrics::MetricsSource;
use crate::core::process::{top_by_cpu, ProcessManager, ProcessTable};
use crate::utils::{FOOTER_HEIGHT, HEADER_HEIGHT, TOP_PROCESS_COUNT};
use crate::widgets;

/// Pulls a snapshot and the process list on every tick and derives the layout from them.
/// Holds no state between ticks beyond the two sources.
pub struct Dashboard<M: MetricsSource, P: ProcessTable> {
    metrics: M,
    processes: ProcessManager<P>,
}

impl<M: MetricsSource, P: ProcessTable> Dashboard<M, P> {
    pub fn new(metrics: M, processes: ProcessManager<P>) -> Self {
        Self { metrics, processes }
    }

    /// One tick: sample, rank, derive. Both panels come from the same snapshot.
    pub fn tick(&mut self) -> DashboardLayout {
        let snapshot = self.metrics.sample();
        let top = top_by_cpu(self.processes.list_processes(), TOP_PROCESS_COUNT);
        build_layout(&snapshot, self.metrics.config(), &top)
    }
}

/// Draw a layout. Region heights are fixed regardless of content.
pub fn render(frame: &mut Frame, layout: &DashboardLayout) {
    let regions = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(HEADER_HEIGHT),
            Constraint::Min(0),
            Constraint::Length(FOOTER_HEIGHT),
        ])
        .split(frame.size());

    let main = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(50), Constraint::Percentage(50)])
        .split(regions[1]);

    frame.render_widget(widgets::header(&layout.header), regions[0]);
    frame.render_widget(widgets::panel(&layout.cpu), main[0]);
    frame.render_widget(widgets::panel(&layout.memory), main[1]);
    frame.render_widget(widgets::process_table(&layout.processes), regions[2]);
}
