//! Top processes table with per-cell coloring.

use ratatui::{
    layout::{Constraint, Rect},
    style::{Modifier, Style},
    widgets::{Cell, Paragraph, Row, Table},
};

use crate::types::SystemSnapshot;
use crate::ui::theme;
use crate::ui::util::pane;

const COLS: [Constraint; 3] = [
    Constraint::Min(12),    // Name
    Constraint::Length(7),  // CPU %
    Constraint::Length(10), // RAM MB
];

pub fn draw_top_processes(f: &mut ratatui::Frame<'_>, area: Rect, snap: Option<&SystemSnapshot>) {
    let block = pane("Top Processes", false);
    let Some(s) = snap else {
        f.render_widget(Paragraph::new("").block(block), area);
        return;
    };

    let peak = s
        .processes
        .iter()
        .map(|p| p.cpu_percent)
        .fold(0.0_f64, f64::max);

    let rows = s.processes.iter().map(|p| {
        let emphasis = if peak > 0.0 && (p.cpu_percent - peak).abs() < f64::EPSILON {
            Style::default().add_modifier(Modifier::BOLD)
        } else {
            Style::default()
        };
        Row::new(vec![
            Cell::from(p.name.clone()).style(theme::text()),
            Cell::from(format!("{:>5.1}", p.cpu_percent))
                .style(Style::default().fg(theme::load_color(p.cpu_percent))),
            Cell::from(format!("{:>8.1}", p.memory_mb)).style(theme::dim()),
        ])
        .style(emphasis)
    });

    let header = Row::new(vec!["Name", "CPU %", "RAM MB"]).style(theme::title());
    let table = Table::new(rows, COLS.to_vec())
        .header(header)
        .block(block)
        .column_spacing(1);
    f.render_widget(table, area);
}
