//! Terminal pane: scrollback above, prompt on the last row.

use ratatui::{
    layout::{Constraint, Direction, Layout, Position, Rect},
    text::{Line, Span},
    widgets::Paragraph,
};

use crate::console::Console;
use crate::ui::theme;
use crate::ui::util::pane;

pub fn draw_console(f: &mut ratatui::Frame<'_>, area: Rect, console: &Console, focused: bool) {
    let block = pane("Terminal", focused);
    let inner = block.inner(area);
    f.render_widget(block, area);
    if inner.height == 0 {
        return;
    }

    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Min(0), Constraint::Length(1)])
        .split(inner);

    // Pin the newest lines to the bottom of the scrollback area
    let visible = rows[0].height as usize;
    let skip = console.lines().len().saturating_sub(visible);
    let lines: Vec<Line> = console
        .lines()
        .iter()
        .skip(skip)
        .map(|l| {
            let style = if l.starts_with("[ERROR]") {
                ratatui::style::Style::default().fg(theme::ALERT)
            } else if l.starts_with("> ") {
                theme::title()
            } else {
                theme::text()
            };
            Line::from(Span::styled(l.clone(), style))
        })
        .collect();
    f.render_widget(Paragraph::new(lines), rows[0]);

    let prompt = Line::from(vec![
        Span::styled("mochi> ", theme::title()),
        Span::styled(console.input.clone(), theme::text()),
    ]);
    f.render_widget(Paragraph::new(prompt), rows[1]);

    if focused {
        let x = rows[1].x + 7 + console.input.chars().count() as u16;
        f.set_cursor_position(Position::new(
            x.min(rows[1].right().saturating_sub(1)),
            rows[1].y,
        ));
    }
}
