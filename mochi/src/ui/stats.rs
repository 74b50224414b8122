//! System load panel: CPU, RAM, GPU, uptime and the CPU/RAM sparklines.

use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    style::Style,
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph, Sparkline},
};

use crate::history::StatHistory;
use crate::types::SystemSnapshot;
use crate::ui::theme;
use crate::ui::util::{pane, uptime_hours};

pub fn draw_stats(
    f: &mut ratatui::Frame<'_>,
    area: Rect,
    snap: Option<&SystemSnapshot>,
    hist: &StatHistory,
) {
    let block = pane("System Load", false);
    let inner = block.inner(area);
    f.render_widget(block, area);
    if inner.height == 0 {
        return;
    }

    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(4), Constraint::Min(0)])
        .split(inner);

    let lines = match snap {
        Some(s) => {
            let cpu_color = s
                .cpu
                .load_percent
                .value()
                .map(theme::load_color)
                .unwrap_or(theme::DIM);
            vec![
                stat_line(
                    "CPU",
                    s.cpu.load_percent.percent_label(),
                    Style::default().fg(cpu_color),
                ),
                stat_line(
                    "RAM",
                    format!("{:.2} GB / {:.2} GB", s.memory.used_gib, s.memory.total_gib),
                    Style::default().fg(theme::load_color(s.memory.used_percent())),
                ),
                stat_line("GPU", s.gpu.load_percent.percent_label(), theme::text()),
                stat_line("UP ", uptime_hours(s.uptime_seconds), theme::text()),
            ]
        }
        None => vec![Line::from(Span::styled("collecting...", theme::dim()))],
    };
    f.render_widget(Paragraph::new(lines), rows[0]);

    if rows[1].height < 2 {
        return;
    }
    let charts = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Percentage(50), Constraint::Percentage(50)])
        .split(rows[1]);
    draw_spark(f, charts[0], "CPU %", &hist.cpu, theme::ACCENT);
    draw_spark(f, charts[1], "RAM %", &hist.ram, theme::FG);
}

fn stat_line(label: &str, value: String, style: Style) -> Line<'static> {
    Line::from(vec![
        Span::styled(format!("{label}: "), theme::dim()),
        Span::styled(value, style),
    ])
}

fn draw_spark(
    f: &mut ratatui::Frame<'_>,
    area: Rect,
    title: &str,
    data: &std::collections::VecDeque<u64>,
    color: ratatui::style::Color,
) {
    let max_points = area.width as usize;
    let start = data.len().saturating_sub(max_points);
    let points: Vec<u64> = data.iter().skip(start).copied().collect();
    let spark = Sparkline::default()
        .block(
            Block::default()
                .borders(Borders::TOP)
                .border_style(theme::dim())
                .title(Span::styled(title.to_string(), theme::dim())),
        )
        .data(&points)
        .max(100)
        .style(Style::default().fg(color));
    f.render_widget(spark, area);
}
