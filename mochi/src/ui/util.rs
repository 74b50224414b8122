//! Small UI helpers: block construction, truncation, durations.

use ratatui::widgets::{Block, BorderType, Borders};

use crate::ui::theme;

pub fn pane(title: &str, focused: bool) -> Block<'_> {
    Block::default()
        .borders(Borders::ALL)
        .border_type(BorderType::Plain)
        .border_style(theme::border(focused))
        .title(title)
        .title_style(theme::title())
}

/// Keep both ends of a long string, e.g. deep paths in a narrow title.
pub fn truncate_middle(s: &str, max: usize) -> String {
    let n = s.chars().count();
    if n <= max {
        return s.to_string();
    }
    if max <= 3 {
        return "...".into();
    }
    let keep = max - 3;
    let left = keep / 2;
    let right = keep - left;
    let head: String = s.chars().take(left).collect();
    let tail: String = s.chars().skip(n - right).collect();
    format!("{head}...{tail}")
}

/// Host uptime as fractional hours, the way the stats panel shows it.
pub fn uptime_hours(seconds: u64) -> String {
    format!("{:.1} h", seconds as f64 / 3600.0)
}
