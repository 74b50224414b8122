//! Detail view: everything in the cached snapshot, one field per line.

use ratatui::{
    layout::Rect,
    text::{Line, Span},
    widgets::{Paragraph, Wrap},
};

use crate::types::SystemSnapshot;
use crate::ui::theme;
use crate::ui::util::pane;

fn field(label: &str, value: String) -> Line<'static> {
    Line::from(vec![
        Span::styled(format!("{label:<13}"), theme::dim()),
        Span::styled(value, theme::text()),
    ])
}

pub fn draw_detail(f: &mut ratatui::Frame<'_>, area: Rect, snap: Option<&SystemSnapshot>) {
    let block = pane("Details (d to close)", true);
    let Some(s) = snap else {
        f.render_widget(
            Paragraph::new(Span::styled("no data yet", theme::dim())).block(block),
            area,
        );
        return;
    };

    let mut lines = vec![
        Line::from(Span::styled("CPU", theme::title())),
        field("Model", s.cpu.name.clone()),
        field("Cores", s.cpu.cores.to_string()),
        field("Clock", format!("{:.2} GHz", s.cpu.speed_ghz)),
        field("Load", s.cpu.load_percent.percent_label()),
        Line::default(),
        Line::from(Span::styled("Memory", theme::title())),
        field(
            "Used",
            format!("{:.2} GB / {:.2} GB", s.memory.used_gib, s.memory.total_gib),
        ),
        field("Usage", format!("{:.1} %", s.memory.used_percent())),
        Line::default(),
        Line::from(Span::styled("GPU", theme::title())),
        field("Model", s.gpu.name.clone()),
        field("Load", s.gpu.load_percent.percent_label()),
        Line::default(),
        Line::from(Span::styled("Network", theme::title())),
        field("IPv4", s.network.primary_ipv4.clone()),
        field("Hostname", s.os.hostname.clone()),
        Line::default(),
        Line::from(Span::styled("Processes", theme::title())),
    ];
    lines.extend(s.processes.iter().map(|p| {
        field(
            &p.name,
            format!("{:>5.1} %  {:>8.1} MB", p.cpu_percent, p.memory_mb),
        )
    }));

    f.render_widget(
        Paragraph::new(lines).block(block).wrap(Wrap { trim: false }),
        area,
    );
}
