//! Shared UI theme constants: green phosphor on black.

use ratatui::style::{Color, Modifier, Style};

pub const FG: Color = Color::Rgb(51, 255, 102);
pub const DIM: Color = Color::Rgb(20, 120, 50);
pub const ACCENT: Color = Color::Rgb(0, 212, 255);
pub const WARN: Color = Color::Yellow;
pub const ALERT: Color = Color::Red;

pub fn text() -> Style {
    Style::default().fg(FG)
}

pub fn dim() -> Style {
    Style::default().fg(DIM)
}

pub fn title() -> Style {
    Style::default().fg(ACCENT).add_modifier(Modifier::BOLD)
}

/// Border style for a pane; the focused pane is drawn bright.
pub fn border(focused: bool) -> Style {
    if focused {
        Style::default().fg(ACCENT)
    } else {
        dim()
    }
}

/// Green / yellow / red by load percentage.
pub fn load_color(pct: f64) -> Color {
    match pct {
        x if x < 25.0 => FG,
        x if x < 60.0 => WARN,
        _ => ALERT,
    }
}
