//! Application state and main event loop.
//!
//! This module implements The Elm Architecture (TEA):
//! - [`Model`]: The complete application state
//! - [`Message`]: All possible events and actions
//! - [`update`]: Pure function for state transitions
//! - [`App::run`]: Main event loop with rendering
//!
//! Page fetches and image downloads run on worker threads and come back
//! to the loop over channels; `update` itself never blocks.

mod effects;
mod event_loop;
mod input;
mod model;
mod update;

pub use model::{
    Lightbox, LightboxImage, Model, Rotation, SLIDESHOW_INTERVAL, Thumbnail, ToastLevel, Zoom,
};
pub use update::{Message, update};

use std::path::PathBuf;
use std::sync::Arc;

use crate::source::PhotoSource;

/// Main application struct that owns the photo source and runs the event loop.
pub struct App {
    source: Arc<dyn PhotoSource>,
    http: reqwest::blocking::Client,
    images_enabled: bool,
    force_half_cell: bool,
    config_global_path: Option<PathBuf>,
    config_local_path: Option<PathBuf>,
}

impl App {
    /// Create an application reading pages from `source`.
    ///
    /// `http` is shared with the image downloader.
    pub fn new(source: Arc<dyn PhotoSource>, http: reqwest::blocking::Client) -> Self {
        Self {
            source,
            http,
            images_enabled: true,
            force_half_cell: false,
            config_global_path: None,
            config_local_path: None,
        }
    }

    /// Enable or disable photo rendering.
    #[must_use]
    pub fn with_images_enabled(mut self, enabled: bool) -> Self {
        self.images_enabled = enabled;
        self
    }

    /// Skip terminal graphics detection and draw with half blocks.
    #[must_use]
    pub fn with_force_half_cell(mut self, force: bool) -> Self {
        self.force_half_cell = force;
        self
    }

    /// Set config paths to show in help.
    #[must_use]
    pub fn with_config_paths(
        mut self,
        global_path: Option<PathBuf>,
        local_path: Option<PathBuf>,
    ) -> Self {
        self.config_global_path = global_path;
        self.config_local_path = local_path;
        self
    }
}
