use ratatui::prelude::*;
use ratatui::widgets::{Clear, Paragraph};

use crate::app::Model;
use crate::source::Photo;

use super::{images, lightbox, overlays, status};

/// Gallery (or lightbox) area of a `width` x `height` terminal: everything
/// above the status bar.
pub const fn gallery_area(width: u16, height: u16) -> Rect {
    Rect::new(0, 0, width, height.saturating_sub(1))
}

/// Render the complete UI.
pub fn render(model: &mut Model, frame: &mut Frame) {
    let area = frame.area();
    let toast_active = model.active_toast().is_some();
    let main_area = Rect {
        height: area.height.saturating_sub(1),
        ..area
    };
    let status_area = Rect {
        y: area.y + area.height.saturating_sub(1),
        height: 1.min(area.height),
        ..area
    };
    // The toast covers the last gallery row rather than shrinking the grid.
    let toast_area = Rect {
        y: area.y + area.height.saturating_sub(2),
        height: 1.min(main_area.height),
        ..area
    };

    if model.lightbox.is_some() {
        lightbox::render_lightbox(model, frame, main_area);
    } else {
        render_gallery(model, frame, main_area);
    }

    if toast_active {
        status::render_toast_bar(model, frame, toast_area);
    }
    status::render_status_bar(model, frame, status_area);

    if model.help_visible {
        overlays::render_help_overlay(model, frame, area);
    }
}

fn render_gallery(model: &mut Model, frame: &mut Frame, area: Rect) {
    // Clear first so image cells from previous frames do not leak.
    frame.render_widget(Clear, area);

    if model.gallery.is_empty() {
        let message = if model.gallery.is_loading() || model.gallery.next_page() == 1 {
            "Loading photos\u{2026}"
        } else {
            "No photos"
        };
        frame.render_widget(
            Paragraph::new(message)
                .alignment(Alignment::Center)
                .style(Style::default().fg(Color::Indexed(245))),
            Rect {
                y: area.y + area.height / 2,
                height: 1.min(area.height),
                ..area
            },
        );
        return;
    }

    let offset = model.viewport.offset();
    let visible = offset..offset + area.height as usize;
    let placeholder_style = Style::default().bg(Color::Indexed(236));
    let caption_style = Style::default().fg(Color::Gray);

    for tile in model.layout.visible(visible.clone()) {
        let Some(photo) = model.gallery.photo(tile.index) else {
            continue;
        };
        let x = area.x + tile.x;
        let width = tile.width.min(area.right().saturating_sub(x));
        if width == 0 {
            continue;
        }

        // Placeholder box under the thumbnail; thumbnails narrower than the
        // column leave it showing at the sides.
        let has_thumbnail = model.thumbnails.contains_key(&photo.medium_url);
        if let Some((_, row_offset, rows)) = images::clip_rows(tile.top, tile.image_rows(), &visible)
        {
            let rect = Rect::new(x, area.y + row_offset, width, rows);
            if has_thumbnail {
                frame.render_widget(Clear, rect);
            } else {
                frame.render_widget(Paragraph::new("").style(placeholder_style), rect);
            }
        }

        let caption_row = tile.top + tile.image_rows();
        if let Some((_, row_offset, _)) = images::clip_rows(caption_row, 1, &visible) {
            let style = if tile.index == model.selected {
                caption_style.add_modifier(Modifier::REVERSED | Modifier::BOLD)
            } else {
                caption_style
            };
            frame.render_widget(
                Paragraph::new(caption_for(photo, tile.index)).style(style),
                Rect::new(x, area.y + row_offset, width, 1),
            );
        }
    }

    if model.images_enabled {
        images::render_thumbnails(model, frame, area);
    }
}

/// Caption under a tile: the photographer, the alt text, or a numbered
/// fallback.
pub(super) fn caption_for(photo: &Photo, index: usize) -> String {
    photo
        .photographer
        .as_deref()
        .or(photo.alt.as_deref())
        .filter(|text| !text.trim().is_empty())
        .map_or_else(|| format!("Photo {}", index + 1), ToString::to_string)
}
