//! Top header with OS, IP and hostname.

use ratatui::{
    layout::Rect,
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph},
};

use crate::types::SystemSnapshot;
use crate::ui::theme;

pub fn draw_header(
    f: &mut ratatui::Frame<'_>,
    area: Rect,
    snap: Option<&SystemSnapshot>,
    connected: bool,
) {
    let mut spans = vec![Span::styled(" MOCHI ", theme::title())];
    match snap {
        Some(s) => {
            spans.push(Span::styled(format!("│ OS: {} ", s.os.description), theme::text()));
            spans.push(Span::styled(format!("│ IP: {} ", s.network.primary_ipv4), theme::text()));
            spans.push(Span::styled(format!("│ Hostname: {} ", s.os.hostname), theme::text()));
        }
        None => spans.push(Span::styled("│ waiting for agent...", theme::dim())),
    }
    if !connected {
        spans.push(Span::styled(
            "│ AGENT OFFLINE",
            ratatui::style::Style::default().fg(theme::ALERT),
        ));
    }
    let header = Paragraph::new(Line::from(spans)).block(
        Block::default()
            .borders(Borders::BOTTOM)
            .border_style(theme::dim()),
    );
    f.render_widget(header, area);
}
