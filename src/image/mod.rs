//! Image downloading, caching and terminal rendering setup.
//!
//! Supports multiple terminal graphics protocols through ratatui-image:
//! - Kitty graphics protocol
//! - Sixel
//! - iTerm2
//! - Unicode half-blocks (fallback)

mod loader;

pub use loader::{ImageCache, ImageEvent, ImageFetcher, download_image};

use std::time::Duration;

use image::{DynamicImage, GenericImageView, Rgba, RgbaImage};
use ratatui_image::picker::Picker;
#[cfg(unix)]
use ratatui_image::picker::cap_parser::QueryStdioOptions;

const PICKER_QUERY_TIMEOUT_MS: u64 = 250;

/// Cell size assumed when no picker is available (no images, tests).
pub const DEFAULT_CELL_PX: (u16, u16) = (8, 16);

/// Create a picker for terminal image rendering.
///
/// The picker detects terminal capabilities and chooses the best protocol.
pub fn create_picker(force_half_cell: bool) -> Option<Picker> {
    if force_half_cell {
        crate::perf::log_event(
            "image.create_picker",
            "force_half_cell=true protocol=Halfblocks",
        );
        return Some(Picker::halfblocks());
    }

    // The stdio capability query can leave a reader thread parked on the
    // Windows console input buffer, so Windows always uses half-blocks.
    #[cfg(not(unix))]
    {
        crate::perf::log_event(
            "image.create_picker",
            "windows fallback protocol=Halfblocks",
        );
        return Some(Picker::halfblocks());
    }

    #[cfg(unix)]
    {
        let picker = match Picker::from_query_stdio_with_options(query_options()) {
            Ok(picker) => picker,
            Err(err) => {
                tracing::warn!(error = %err, "terminal graphics query failed, using half-blocks");
                return Some(Picker::halfblocks());
            }
        };
        crate::perf::log_event(
            "image.create_picker",
            format!(
                "term_program={} term={} protocol={:?} font={:?}",
                std::env::var("TERM_PROGRAM").unwrap_or_else(|_| "<unset>".to_string()),
                std::env::var("TERM").unwrap_or_else(|_| "<unset>".to_string()),
                picker.protocol_type(),
                picker.font_size()
            ),
        );
        Some(picker)
    }
}

/// Whether terminal output should be treated as truecolor-capable.
pub fn supports_truecolor_terminal() -> bool {
    if let Ok(force) = std::env::var("PEXGAL_TRUECOLOR") {
        let value = force.to_ascii_lowercase();
        return matches!(value.as_str(), "1" | "true" | "yes" | "on");
    }
    if std::env::var("TERM_PROGRAM")
        .ok()
        .as_deref()
        .is_some_and(|v| v == "Apple_Terminal")
    {
        return false;
    }
    supports_truecolor_from_env(
        std::env::var("COLORTERM").ok().as_deref(),
        std::env::var("TERM").ok().as_deref(),
    )
}

/// Quantize image RGB channels to the xterm 6x6x6 color cube, keeping alpha.
///
/// Half-block rendering on 256-color terminals maps every cell to a palette
/// entry anyway; doing it up front keeps neighbouring cells consistent.
pub fn quantize_to_ansi256(image: &DynamicImage) -> DynamicImage {
    let (width, height) = image.dimensions();
    let src = image.to_rgba8();
    let out = RgbaImage::from_fn(width, height, |x, y| {
        let px = src.get_pixel(x, y);
        let (r, g, b) = cube_to_rgb(rgb_to_cube(px[0], px[1], px[2]));
        Rgba([r, g, b, px[3]])
    });
    DynamicImage::ImageRgba8(out)
}

/// Index of the nearest xterm-256 color cube entry (16..=231).
pub fn rgb_to_cube(r: u8, g: u8, b: u8) -> u8 {
    let level = |v: u8| ((u16::from(v) * 5) / 255) as u8;
    16 + (36 * level(r)) + (6 * level(g)) + level(b)
}

fn cube_to_rgb(index: u8) -> (u8, u8, u8) {
    let i = index.saturating_sub(16);
    let value = |c: u8| if c == 0 { 0 } else { 55 + c * 40 };
    (value((i / 36) % 6), value((i / 6) % 6), value(i % 6))
}

#[cfg(unix)]
fn query_options() -> QueryStdioOptions {
    let mut options = QueryStdioOptions::default();
    options.timeout = Duration::from_millis(PICKER_QUERY_TIMEOUT_MS);
    options
}

fn supports_truecolor_from_env(colorterm: Option<&str>, term: Option<&str>) -> bool {
    if let Some(ct) = colorterm {
        let lower = ct.to_ascii_lowercase();
        if lower.contains("truecolor") || lower.contains("24bit") {
            return true;
        }
    }
    if let Some(t) = term {
        let lower = t.to_ascii_lowercase();
        if lower.contains("direct") || lower.contains("truecolor") {
            return true;
        }
    }
    false
}

#[cfg(test)]
mod tests {
    use super::*;

    #[cfg(unix)]
    #[test]
    fn test_picker_query_timeout_is_fast() {
        let options = query_options();
        assert_eq!(options.timeout, Duration::from_millis(250));
    }

    #[test]
    fn test_force_half_cell_picker_skips_query() {
        let picker = create_picker(true).unwrap();
        assert!(matches!(
            picker.protocol_type(),
            ratatui_image::picker::ProtocolType::Halfblocks
        ));
    }

    #[test]
    fn test_supports_truecolor_from_env_detects_24bit() {
        assert!(supports_truecolor_from_env(
            Some("truecolor"),
            Some("xterm-256color")
        ));
        assert!(supports_truecolor_from_env(Some("24BIT"), Some("screen")));
    }

    #[test]
    fn test_supports_truecolor_from_env_detects_non_truecolor() {
        assert!(!supports_truecolor_from_env(None, Some("xterm-256color")));
    }

    #[test]
    fn test_rgb_to_cube_corners() {
        assert_eq!(rgb_to_cube(0, 0, 0), 16);
        assert_eq!(rgb_to_cube(255, 255, 255), 231);
        assert_eq!(cube_to_rgb(231), (255, 255, 255));
    }

    #[test]
    fn test_quantize_to_ansi256_preserves_alpha() {
        let image = DynamicImage::ImageRgba8(RgbaImage::from_pixel(1, 1, Rgba([12, 34, 56, 77])));
        let quantized = quantize_to_ansi256(&image).to_rgba8();
        assert_eq!(quantized.get_pixel(0, 0)[3], 77);
    }
}
