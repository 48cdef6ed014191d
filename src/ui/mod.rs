//! Terminal UI components.
//!
//! This module contains all UI-related code including:
//! - [`viewport`]: Scroll position and visible range management
//! - the masonry grid with thumbnails and captions
//! - the lightbox, status bar, toasts and help overlay

pub mod viewport;

mod images;
mod lightbox;
mod overlays;
mod render;
mod status;

pub use lightbox::lightbox_image_area;
pub use render::{gallery_area, render};

#[cfg(test)]
mod tests;
