//! File browser pane.

use ratatui::{
    layout::Rect,
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{List, ListItem, ListState},
};

use crate::explorer::Explorer;
use crate::ui::theme;
use crate::ui::util::{pane, truncate_middle};

pub fn draw_explorer(f: &mut ratatui::Frame<'_>, area: Rect, ex: &Explorer, focused: bool) {
    let title = format!(
        "Files: {}",
        truncate_middle(&ex.path, area.width.saturating_sub(10) as usize)
    );
    let items: Vec<ListItem> = ex
        .entries
        .iter()
        .map(|e| {
            let (icon, style) = if e.is_parent_marker {
                ("↰ ", theme::dim())
            } else if e.is_directory {
                ("📁 ", theme::title())
            } else {
                ("📄 ", theme::text())
            };
            ListItem::new(Line::from(vec![
                Span::raw(icon),
                Span::styled(e.name.clone(), style),
            ]))
        })
        .collect();

    let list = List::new(items)
        .block(pane(&title, focused))
        .highlight_style(
            Style::default()
                .fg(ratatui::style::Color::Black)
                .bg(if focused { theme::ACCENT } else { theme::DIM })
                .add_modifier(Modifier::BOLD),
        )
        .highlight_symbol("> ");

    let mut state = ListState::default().with_selected(Some(ex.selected));
    f.render_stateful_widget(list, area, &mut state);
}
