//! Boot screen.

use std::time::Instant;

use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    text::{Line, Span},
    widgets::Paragraph,
};

use crate::boot::BootSequence;
use crate::ui::theme;

pub fn draw_boot(f: &mut ratatui::Frame<'_>, area: Rect, boot: &BootSequence, now: Instant) {
    let shown = boot.visible(now);
    let lines: Vec<Line> = boot
        .lines()
        .iter()
        .take(shown)
        .map(|l| Line::from(Span::styled(*l, theme::text())))
        .collect();

    let height = (boot.lines().len() as u16).min(area.height);
    let cols = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Fill(1),
            Constraint::Length(height),
            Constraint::Fill(1),
        ])
        .split(area);
    let row = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Fill(1),
            Constraint::Length(48.min(area.width)),
            Constraint::Fill(1),
        ])
        .split(cols[1]);
    f.render_widget(Paragraph::new(lines), row[1]);
}
