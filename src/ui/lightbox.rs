use ratatui::prelude::*;
use ratatui::widgets::{Clear, Paragraph};
use ratatui_image::protocol::{StatefulProtocol, StatefulProtocolType};
use ratatui_image::{Resize, StatefulImage};

use crate::app::{Lightbox, Model, Zoom};

/// Rows above the image (infobar) and below it (caption, toolbar).
const HEADER_ROWS: u16 = 1;
const FOOTER_ROWS: u16 = 2;

/// Area the lightbox image is drawn into, given the lightbox area.
pub fn lightbox_image_area(area: Rect) -> Rect {
    Rect {
        y: area.y + HEADER_ROWS.min(area.height),
        height: area.height.saturating_sub(HEADER_ROWS + FOOTER_ROWS),
        ..area
    }
}

pub fn render_lightbox(model: &mut Model, frame: &mut Frame, area: Rect) {
    let Some(lightbox) = model.lightbox.clone() else {
        return;
    };
    frame.render_widget(Clear, area);

    let bar_style = Style::default().bg(Color::Indexed(236)).fg(Color::White);
    let infobar = Rect { height: 1, ..area };
    frame.render_widget(
        Paragraph::new(infobar_text(&lightbox, model.gallery.len())).style(bar_style),
        infobar,
    );

    let image_area = lightbox_image_area(area);
    render_image(model, frame, image_area);

    let caption_area = Rect {
        y: image_area.bottom(),
        height: 1.min(area.bottom().saturating_sub(image_area.bottom())),
        ..area
    };
    let caption = model
        .gallery
        .photo(lightbox.index)
        .map(|photo| {
            let mut parts = Vec::new();
            if let Some(name) = &photo.photographer {
                parts.push(format!("Photo by {name}"));
            }
            if let Some(alt) = photo.alt.as_deref().filter(|alt| !alt.is_empty()) {
                parts.push(alt.to_string());
            }
            parts.join(" \u{b7} ")
        })
        .unwrap_or_default();
    frame.render_widget(
        Paragraph::new(format!(" {caption}")).style(Style::default().fg(Color::Gray)),
        caption_area,
    );

    let toolbar_area = Rect {
        y: caption_area.bottom(),
        height: 1.min(area.bottom().saturating_sub(caption_area.bottom())),
        ..area
    };
    let toolbar = " \u{2190}/\u{2192} nav  +/- zoom  1 1:1  r/R rotate  x/v flip  s play  o open  Esc close";
    frame.render_widget(
        Paragraph::new(toolbar).style(Style::default().fg(Color::Indexed(245))),
        toolbar_area,
    );
}

fn infobar_text(lightbox: &Lightbox, total: usize) -> String {
    let mut parts = vec![format!(" {} / {}", lightbox.index + 1, total)];
    if lightbox.zoom != Zoom::Fit {
        parts.push(format!("zoom {}\u{d7}", lightbox.zoom.factor()));
    }
    if lightbox.one_to_one {
        parts.push("1:1".to_string());
    }
    if lightbox.rotation.degrees() != 0 {
        parts.push(format!("rotated {}\u{b0}", lightbox.rotation.degrees()));
    }
    if lightbox.flip_x {
        parts.push("flip x".to_string());
    }
    if lightbox.flip_y {
        parts.push("flip y".to_string());
    }
    if lightbox.is_playing() {
        parts.push("\u{25b6} slideshow".to_string());
    }
    parts.join("  ")
}

fn render_image(model: &mut Model, frame: &mut Frame, area: Rect) {
    if area.is_empty() {
        return;
    }
    let Some(prepared) = model.lightbox_image.as_mut() else {
        let message = if model.images_enabled {
            "Loading photo\u{2026}"
        } else {
            "Images disabled (o opens the photo in a browser)"
        };
        let y = area.y + area.height / 2;
        frame.render_widget(
            Paragraph::new(message)
                .alignment(Alignment::Center)
                .style(Style::default().fg(Color::Indexed(245))),
            Rect::new(area.x, y, area.width, 1),
        );
        return;
    };

    let size = prepared
        .protocol
        .size_for(lightbox_resize(&prepared.protocol), area);
    let target = Rect::new(
        area.x + area.width.saturating_sub(size.width) / 2,
        area.y + area.height.saturating_sub(size.height) / 2,
        size.width.min(area.width),
        size.height.min(area.height),
    );
    StatefulImage::default()
        .resize(lightbox_resize(&prepared.protocol))
        .render(target, frame.buffer_mut(), &mut prepared.protocol);
    if matches!(
        prepared.protocol.protocol_type(),
        StatefulProtocolType::Halfblocks(_)
    ) {
        super::images::index_colors(frame.buffer_mut(), target);
    }
    crate::perf::log_event(
        "render.lightbox",
        format!(
            "full={} area={}x{} drawn={}x{}",
            prepared.is_full, area.width, area.height, target.width, target.height
        ),
    );
}

fn lightbox_resize(protocol: &StatefulProtocol) -> Resize {
    if matches!(protocol.protocol_type(), StatefulProtocolType::Halfblocks(_)) {
        super::images::scale_for(protocol)
    } else {
        Resize::Fit(None)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app::Rotation;

    #[test]
    fn test_image_area_leaves_room_for_bars() {
        let area = lightbox_image_area(Rect::new(0, 0, 80, 23));
        assert_eq!(area, Rect::new(0, 1, 80, 20));
    }

    #[test]
    fn test_image_area_on_tiny_terminal() {
        let area = lightbox_image_area(Rect::new(0, 0, 80, 2));
        assert_eq!(area.height, 0);
    }

    #[test]
    fn test_infobar_lists_view_state() {
        let mut lightbox = Lightbox::new(2);
        assert_eq!(infobar_text(&lightbox, 7), " 3 / 7");

        lightbox.zoom = Zoom::Quad;
        lightbox.rotation = Rotation::Half;
        lightbox.flip_y = true;
        let text = infobar_text(&lightbox, 7);
        assert!(text.contains("zoom 4\u{d7}"));
        assert!(text.contains("rotated 180\u{b0}"));
        assert!(text.contains("flip y"));
        assert!(!text.contains("flip x"));
    }
}
