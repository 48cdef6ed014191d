use std::time::Instant;

use crate::app::Model;
use crate::app::model::{Lightbox, SLIDESHOW_INTERVAL};
use crate::gallery::{LoadOutcome, PageRequest};
use crate::layout::Direction;
use crate::source::{FetchError, Photo};

/// All possible events and actions in the application.
///
/// These represent user input, system events, and internal actions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Message {
    // Navigation
    /// Scroll up by n rows
    ScrollUp(usize),
    /// Scroll down by n rows
    ScrollDown(usize),
    PageUp,
    PageDown,
    HalfPageUp,
    HalfPageDown,
    GoToTop,
    GoToBottom,
    /// Move the selection to a neighbouring tile
    Select(Direction),
    /// Select a tile by photo index
    SelectAt(usize),

    // Loading
    /// Request the next page regardless of scroll position
    LoadNextPage,
    /// A page fetch finished on a worker
    PageFetched {
        request: PageRequest,
        result: Result<Vec<Photo>, FetchError>,
    },

    // Lightbox
    /// Open the lightbox on a photo index
    OpenLightbox(usize),
    CloseLightbox,
    LightboxNext,
    LightboxPrev,
    ZoomIn,
    ZoomOut,
    /// Toggle pixel-for-pixel display
    ToggleOneToOne,
    RotateClockwise,
    RotateCounterClockwise,
    FlipHorizontal,
    FlipVertical,
    ToggleSlideshow,
    /// Slideshow timer fired
    SlideshowTick,

    // Photo actions (handled as side effects)
    /// Open the focused photo's full-size URL in the browser
    OpenOriginal,
    /// Copy the focused photo's full-size URL to the clipboard
    CopyUrl,

    /// Toggle help overlay
    ToggleHelp,
    /// Hide help overlay
    HideHelp,

    // Window
    /// Terminal resized
    Resize(u16, u16),
    /// Redraw screen
    Redraw,

    // Application
    /// Quit the application
    Quit,
}

/// Pure function that updates the model based on a message.
///
/// This is the core of TEA - all state transitions happen here.
/// No side effects should occur in this function.
pub fn update(mut model: Model, msg: Message) -> Model {
    // Anything that moves the viewport or grows the content may bring the
    // end of the gallery into view.
    let mut check_near_end = false;

    match msg {
        // Navigation
        Message::ScrollUp(n) => {
            model.viewport.scroll_up(n);
            model.bump_image_scroll_cooldown();
        }
        Message::ScrollDown(n) => {
            model.viewport.scroll_down(n);
            model.bump_image_scroll_cooldown();
            check_near_end = true;
        }
        Message::PageUp => {
            model.viewport.page_up();
            model.bump_image_scroll_cooldown();
        }
        Message::PageDown => {
            model.viewport.page_down();
            model.bump_image_scroll_cooldown();
            check_near_end = true;
        }
        Message::HalfPageUp => {
            model.viewport.half_page_up();
            model.bump_image_scroll_cooldown();
        }
        Message::HalfPageDown => {
            model.viewport.half_page_down();
            model.bump_image_scroll_cooldown();
            check_near_end = true;
        }
        Message::GoToTop => {
            model.viewport.go_to_top();
            model.bump_image_scroll_cooldown();
            if !model.gallery.is_empty() {
                model.selected = 0;
            }
        }
        Message::GoToBottom => {
            model.viewport.go_to_bottom();
            model.bump_image_scroll_cooldown();
            check_near_end = true;
        }
        Message::Select(direction) => {
            if let Some(target) = model.layout.neighbor(model.selected, direction) {
                model.select(target);
                model.bump_image_scroll_cooldown();
            }
            check_near_end = true;
        }
        Message::SelectAt(index) => {
            model.select(index);
            check_near_end = true;
        }

        // Loading
        Message::LoadNextPage => model.request_next_page(),
        Message::PageFetched { request, result } => {
            let outcome = model.gallery.finish_load(request, result);
            crate::perf::log_event(
                "gallery.fetch.finish",
                format!("page={} outcome={outcome:?}", request.page()),
            );
            if let LoadOutcome::Appended { added, .. } = outcome
                && added > 0
            {
                model.reflow_layout();
                check_near_end = true;
            }
        }

        // Lightbox
        Message::OpenLightbox(index) => {
            if index < model.gallery.len() {
                model.select(index);
                model.lightbox = Some(Lightbox::new(index));
                model.help_visible = false;
            }
        }
        Message::CloseLightbox => {
            model.lightbox = None;
            model.lightbox_image = None;
        }
        Message::LightboxNext => {
            check_near_end = step_lightbox(&mut model, 1);
        }
        Message::LightboxPrev => {
            check_near_end = step_lightbox(&mut model, -1);
        }
        Message::ZoomIn => {
            if let Some(lb) = model.lightbox.as_mut() {
                lb.zoom = lb.zoom.zoom_in();
                lb.one_to_one = false;
            }
        }
        Message::ZoomOut => {
            if let Some(lb) = model.lightbox.as_mut() {
                lb.zoom = lb.zoom.zoom_out();
                lb.one_to_one = false;
            }
        }
        Message::ToggleOneToOne => {
            if let Some(lb) = model.lightbox.as_mut() {
                lb.one_to_one = !lb.one_to_one;
                lb.zoom = crate::app::model::Zoom::Fit;
            }
        }
        Message::RotateClockwise => {
            if let Some(lb) = model.lightbox.as_mut() {
                lb.rotation = lb.rotation.clockwise();
            }
        }
        Message::RotateCounterClockwise => {
            if let Some(lb) = model.lightbox.as_mut() {
                lb.rotation = lb.rotation.counter_clockwise();
            }
        }
        Message::FlipHorizontal => {
            if let Some(lb) = model.lightbox.as_mut() {
                lb.flip_x = !lb.flip_x;
            }
        }
        Message::FlipVertical => {
            if let Some(lb) = model.lightbox.as_mut() {
                lb.flip_y = !lb.flip_y;
            }
        }
        Message::ToggleSlideshow => {
            if let Some(lb) = model.lightbox.as_mut() {
                lb.slideshow_due = if lb.is_playing() {
                    None
                } else {
                    Some(Instant::now() + SLIDESHOW_INTERVAL)
                };
            }
        }
        Message::SlideshowTick => {
            let playing = model.lightbox.as_ref().is_some_and(Lightbox::is_playing);
            if playing {
                check_near_end = step_lightbox(&mut model, 1);
                if let Some(lb) = model.lightbox.as_mut() {
                    // Stops on the last loaded photo.
                    lb.slideshow_due = check_near_end.then(|| Instant::now() + SLIDESHOW_INTERVAL);
                }
            }
        }

        Message::OpenOriginal | Message::CopyUrl => {}

        Message::ToggleHelp => {
            model.help_visible = !model.help_visible;
        }
        Message::HideHelp => {
            model.help_visible = false;
        }

        // Redraw: no state change needed
        Message::Redraw => {}

        // Window
        Message::Resize(width, height) => {
            model.viewport.resize(width, height.saturating_sub(1));
            model.reflow_layout();
            model.lightbox_image = None;
            check_near_end = true;
        }

        // Application
        Message::Quit => {
            model.should_quit = true;
        }
    }

    if check_near_end {
        model.load_more_if_near_end();
    }
    model
}

/// Move the lightbox `delta` photos without wrapping.
///
/// Returns whether it moved. The selection follows so the grid stays in
/// step (and loads more as the lightbox reaches the end).
fn step_lightbox(model: &mut Model, delta: isize) -> bool {
    let Some(lb) = model.lightbox.as_mut() else {
        return false;
    };
    let Some(target) = lb.index.checked_add_signed(delta) else {
        return false;
    };
    if target >= model.gallery.len() {
        return false;
    }
    lb.show(target);
    model.select(target);
    true
}
