// Only allow lints that are either transitive-dependency noise or
// genuinely opinionated style choices that don't indicate real issues.
#![allow(
    // Transitive dependency version mismatches we can't control
    clippy::multiple_crate_versions,
    // module_name_repetitions is pure style preference (e.g. image::ImageCache)
    clippy::module_name_repetitions
)]

//! # Pexgal
//!
//! A terminal gallery for Pexels curated photos.
//!
//! Pexgal shows curated photos with:
//! - A responsive masonry grid (1 to 4 columns by terminal width)
//! - Infinite scroll with duplicate-free pagination
//! - A lightbox with zoom, rotation, flips and a slideshow
//! - Image support (Kitty, Sixel, iTerm2, half-block fallback)
//!
//! ## Architecture
//!
//! Pexgal uses The Elm Architecture (TEA) pattern:
//! - **Model**: Application state
//! - **Message**: Events and actions
//! - **Update**: Pure state transitions
//! - **View**: Render to terminal
//!
//! ## Modules
//!
//! - [`app`]: Main application loop and state
//! - [`source`]: Photo records and the Pexels client
//! - [`gallery`]: Pagination cursor and duplicate-free merging
//! - [`layout`]: Column breakpoints and masonry placement
//! - [`image`]: Image downloads, caching and terminal protocols
//! - [`ui`]: Terminal UI components
//! - [`config`]: Saved flag defaults

pub mod app;
pub mod config;
pub mod gallery;
pub mod image;
pub mod layout;
pub mod perf;
pub mod source;
pub mod ui;

/// Re-export commonly used types
pub mod prelude {
    pub use crate::app::{App, Message, Model};
    pub use crate::gallery::GalleryState;
    pub use crate::source::{Photo, PhotoSource};
    pub use crate::ui::viewport::Viewport;
}
