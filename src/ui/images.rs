use std::ops::Range;

use ratatui::buffer::Buffer;
use ratatui::prelude::*;
use ratatui_image::protocol::{StatefulProtocol, StatefulProtocolType};
use ratatui_image::{CropOptions, Resize, StatefulImage};

use crate::app::Model;

/// Part of content rows `top..top + len` that falls inside `visible`.
///
/// Returns `(rows skipped at the top, screen row offset, rows shown)`.
pub(super) fn clip_rows(top: usize, len: usize, visible: &Range<usize>) -> Option<(u16, u16, u16)> {
    let start = top.max(visible.start);
    let end = (top + len).min(visible.end);
    if start >= end {
        return None;
    }
    let skipped = u16::try_from(start - top).ok()?;
    let offset = u16::try_from(start - visible.start).ok()?;
    let rows = u16::try_from(end - start).ok()?;
    Some((skipped, offset, rows))
}

/// Draw the thumbnails of visible tiles into the gallery `area`.
pub fn render_thumbnails(model: &mut Model, frame: &mut Frame, area: Rect) {
    let offset = model.viewport.offset();
    let visible = offset..offset + area.height as usize;
    let settling = model.is_image_scroll_settling();
    crate::perf::log_event(
        "render.gallery",
        format!(
            "vp={}..{} area={}x{} thumbnails={}",
            visible.start,
            visible.end,
            area.width,
            area.height,
            model.thumbnails.len()
        ),
    );

    if model.thumbnails.is_empty() {
        return;
    }

    for tile in model.layout.visible(visible.clone()) {
        let Some(photo) = model.gallery.photo(tile.index) else {
            continue;
        };
        let Some(thumb) = model.thumbnails.get_mut(&photo.medium_url) else {
            continue;
        };
        let Some((skipped, row_offset, rows)) = clip_rows(tile.top, thumb.height as usize, &visible)
        else {
            continue;
        };
        let inset = tile.width.saturating_sub(thumb.width) / 2;
        let x = area.x + tile.x + inset;
        let cols = thumb.width.min(area.right().saturating_sub(x));
        if cols == 0 {
            continue;
        }
        let dest = Rect::new(x, area.y + row_offset, cols, rows);
        blit_protocol(
            frame,
            &mut thumb.protocol,
            (thumb.width, thumb.height),
            dest,
            skipped,
            settling,
        );
        crate::perf::log_event(
            "render.thumbnail",
            format!(
                "index={} skipped={skipped} dst_y={} rows={rows} cols={cols}",
                tile.index, dest.y
            ),
        );
    }
}

/// Draw rows `skipped..` of an image `size` cells large into `dest`.
fn blit_protocol(
    frame: &mut Frame,
    protocol: &mut StatefulProtocol,
    size: (u16, u16),
    dest: Rect,
    skipped: u16,
    settling: bool,
) {
    if matches!(protocol.protocol_type(), StatefulProtocolType::ITerm2(_)) {
        if settling {
            // iTerm2/Warp can flicker when re-embedding inline images during rapid scroll.
            // Draw a cheap gray placeholder while scrolling; restore image on settle.
            fill_placeholder(frame.buffer_mut(), dest);
            return;
        }

        // iTerm2 inline graphics store the payload in a single anchor cell; row-slicing the
        // rendered buffer breaks scrolling and causes stale/overwritten content.
        let crop = if skipped > 0 {
            Resize::Crop(Some(CropOptions {
                clip_top: true,
                clip_left: false,
            }))
        } else {
            Resize::Crop(None)
        };
        StatefulImage::default()
            .resize(crop)
            .render(dest, frame.buffer_mut(), protocol);
        return;
    }

    // Other protocols are safe to render to a temp buffer and then blit row slices.
    let temp_area = Rect::new(0, 0, size.0, size.1);
    let mut temp_buf = Buffer::empty(temp_area);
    StatefulImage::default()
        .resize(scale_for(protocol))
        .render(temp_area, &mut temp_buf, protocol);
    if matches!(protocol.protocol_type(), StatefulProtocolType::Halfblocks(_)) {
        index_colors(&mut temp_buf, temp_area);
    }

    let frame_buf = frame.buffer_mut();
    for row in 0..dest.height {
        let src_row = skipped + row;
        let dst_row = dest.y + row;
        if src_row >= size.1 || dst_row >= frame_buf.area.bottom() {
            continue;
        }
        for col in 0..dest.width.min(size.0) {
            frame_buf[(dest.x + col, dst_row)] = temp_buf[(col, src_row)].clone();
        }
    }
}

pub(super) fn scale_for(protocol: &StatefulProtocol) -> Resize {
    if matches!(protocol.protocol_type(), StatefulProtocolType::Halfblocks(_)) {
        // Nearest-neighbor causes strong color aliasing artifacts in half-cell mode.
        Resize::Scale(Some(image::imageops::FilterType::CatmullRom))
    } else {
        Resize::Scale(None)
    }
}

/// Swap truecolor cells for the nearest 256-color index on terminals
/// without truecolor.
pub(super) fn index_colors(buf: &mut Buffer, area: Rect) {
    if crate::image::supports_truecolor_terminal() {
        return;
    }
    for row in area.top()..area.bottom() {
        for col in area.left()..area.right() {
            let cell = &mut buf[(col, row)];
            if let Color::Rgb(r, g, b) = cell.fg {
                cell.fg = Color::Indexed(crate::image::rgb_to_cube(r, g, b));
            }
            if let Color::Rgb(r, g, b) = cell.bg {
                cell.bg = Color::Indexed(crate::image::rgb_to_cube(r, g, b));
            }
        }
    }
}

pub(super) fn fill_placeholder(buf: &mut Buffer, area: Rect) {
    let area = area.intersection(buf.area);
    for row in area.top()..area.bottom() {
        for col in area.left()..area.right() {
            buf[(col, row)]
                .set_symbol(" ")
                .set_bg(Color::DarkGray)
                .set_fg(Color::DarkGray)
                .set_skip(false);
        }
    }
}
