// ratatui widgets for the dashboard layout values
//
// - Paragraph + Block for the header and the CPU/memory panels
// - Table for the top processes
// - Border color carries the alert state: red when alerting, green (CPU) or blue (memory) otherwise

use ratatui::{
    layout::{Alignment, Constraint},
    style::{Color, Modifier, Style},
    text::Line,
    widgets::{
        block::{Position, Title},
        Block, Borders, Cell, Paragraph, Row, Table,
    },
};

use crate::core::layout::{Header, Panel, PanelKind, PanelStyle, ProcessTableView, PROCESS_COLUMNS};
use crate::utils::PROCESS_NAME_WIDTH;

pub fn panel_color(panel: &Panel) -> Color {
    match (panel.style, panel.kind) {
        (PanelStyle::Alert, _) => Color::Red,
        (PanelStyle::Normal, PanelKind::Cpu) => Color::Green,
        (PanelStyle::Normal, PanelKind::Memory) => Color::Blue,
    }
}

pub fn header(header: &Header) -> Paragraph<'_> {
    Paragraph::new(header.title.as_str())
        .style(Style::default().fg(Color::White).add_modifier(Modifier::BOLD))
        .block(
            Block::default().borders(Borders::ALL).title(
                Title::from(header.subtitle.as_str())
                    .position(Position::Bottom)
                    .alignment(Alignment::Right),
            ),
        )
}

pub fn panel(panel: &Panel) -> Paragraph<'_> {
    let lines: Vec<Line> = panel.lines.iter().map(|l| Line::from(l.as_str())).collect();

    Paragraph::new(lines).block(
        Block::default()
            .borders(Borders::ALL)
            .title(panel.title.as_str())
            .border_style(Style::default().fg(panel_color(panel))),
    )
}

pub fn process_table(view: &ProcessTableView) -> Table<'_> {
    let header = Row::new(PROCESS_COLUMNS.iter().map(|c| Cell::from(*c)))
        .style(Style::default().fg(Color::Magenta).add_modifier(Modifier::BOLD));

    let rows: Vec<Row> = view
        .rows
        .iter()
        .map(|row| {
            Row::new(vec![
                Cell::from(row.pid.as_str()).style(Style::default().fg(Color::Cyan)),
                Cell::from(row.name.as_str()).style(Style::default().fg(Color::Magenta)),
                Cell::from(Line::from(row.cpu.as_str()).alignment(Alignment::Right)),
                Cell::from(Line::from(row.memory.as_str()).alignment(Alignment::Right)),
            ])
        })
        .collect();

    Table::new(
        rows,
        [
            Constraint::Length(8),                             // PID
            Constraint::Length(PROCESS_NAME_WIDTH as u16 + 2), // Name
            Constraint::Length(8),                             // CPU %
            Constraint::Length(10),                            // Memory %
        ],
    )
    .header(header)
    .block(Block::default().borders(Borders::ALL).title(view.title.as_str()))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn panel_of(kind: PanelKind, style: PanelStyle) -> Panel {
        Panel {
            kind,
            title: "x".to_string(),
            lines: Vec::new(),
            style,
        }
    }

    #[test]
    fn test_panel_colors() {
        assert_eq!(panel_color(&panel_of(PanelKind::Cpu, PanelStyle::Normal)), Color::Green);
        assert_eq!(panel_color(&panel_of(PanelKind::Memory, PanelStyle::Normal)), Color::Blue);
        assert_eq!(panel_color(&panel_of(PanelKind::Cpu, PanelStyle::Alert)), Color::Red);
        assert_eq!(panel_color(&panel_of(PanelKind::Memory, PanelStyle::Alert)), Color::Red);
    }
}
