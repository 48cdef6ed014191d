use ratatui::prelude::*;
use ratatui::widgets::Paragraph;

use crate::app::Model;

pub fn status_text(model: &Model) -> String {
    let count = model.gallery.len();
    let noun = if count == 1 { "photo" } else { "photos" };
    let position = model.lightbox.as_ref().map_or_else(
        || format!("[{}%]", model.viewport.scroll_percent()),
        |lb| format!("[{}/{}]", lb.index + 1, count),
    );
    let loading = if model.gallery.is_loading() {
        "  Loading\u{2026}"
    } else {
        ""
    };
    format!(
        " pexgal  {count} {noun}  next page {}  {position}{loading}  ?:help",
        model.gallery.next_page()
    )
}

pub fn render_status_bar(model: &Model, frame: &mut Frame, area: Rect) {
    let status_bar = Paragraph::new(status_text(model))
        .style(Style::default().bg(Color::DarkGray).fg(Color::White));
    frame.render_widget(status_bar, area);
}

pub fn render_toast_bar(model: &Model, frame: &mut Frame, area: Rect) {
    let Some((message, level)) = model.active_toast() else {
        return;
    };
    let (prefix, style) = match level {
        crate::app::ToastLevel::Info => (
            "[info]",
            Style::default().bg(Color::DarkGray).fg(Color::White),
        ),
        crate::app::ToastLevel::Warning => (
            "[warn]",
            Style::default().bg(Color::Yellow).fg(Color::Black),
        ),
        crate::app::ToastLevel::Error => {
            ("[error]", Style::default().bg(Color::Red).fg(Color::White))
        }
    };
    let toast = Paragraph::new(format!("{prefix} {message}")).style(style);
    frame.render_widget(toast, area);
}
