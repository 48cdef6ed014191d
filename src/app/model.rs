use std::collections::{HashMap, HashSet};
use std::path::PathBuf;
use std::time::{Duration, Instant};

use image::DynamicImage;
use image::imageops::FilterType;
use ratatui::layout::Rect;
use ratatui_image::picker::{Picker, ProtocolType};
use ratatui_image::protocol::StatefulProtocol;

use crate::gallery::{GalleryState, PageRequest};
use crate::image::{DEFAULT_CELL_PX, ImageCache};
use crate::layout::{Breakpoints, MasonryLayout, tile_rows};
use crate::source::Photo;
use crate::ui::viewport::Viewport;

/// Time each photo stays up while the slideshow runs.
pub const SLIDESHOW_INTERVAL: Duration = Duration::from_secs(3);

/// Decoded thumbnails kept in memory.
const IMAGE_CACHE_SIZE: usize = 200;

/// Decoded full-size photos kept in memory; each can be hundreds of MB.
const ORIGINAL_CACHE_SIZE: usize = 4;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToastLevel {
    Info,
    Warning,
    Error,
}

#[derive(Debug, Clone)]
struct Toast {
    level: ToastLevel,
    message: String,
    expires_at: Instant,
}

/// Lightbox magnification. Zoomed views show the center of the photo.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum Zoom {
    #[default]
    Fit,
    Double,
    Quad,
}

impl Zoom {
    pub const fn factor(self) -> u32 {
        match self {
            Self::Fit => 1,
            Self::Double => 2,
            Self::Quad => 4,
        }
    }

    #[must_use]
    pub const fn zoom_in(self) -> Self {
        match self {
            Self::Fit => Self::Double,
            Self::Double | Self::Quad => Self::Quad,
        }
    }

    #[must_use]
    pub const fn zoom_out(self) -> Self {
        match self {
            Self::Fit | Self::Double => Self::Fit,
            Self::Quad => Self::Double,
        }
    }
}

/// Clockwise rotation in quarter turns.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum Rotation {
    #[default]
    None,
    Quarter,
    Half,
    ThreeQuarter,
}

impl Rotation {
    #[must_use]
    pub const fn clockwise(self) -> Self {
        match self {
            Self::None => Self::Quarter,
            Self::Quarter => Self::Half,
            Self::Half => Self::ThreeQuarter,
            Self::ThreeQuarter => Self::None,
        }
    }

    #[must_use]
    pub const fn counter_clockwise(self) -> Self {
        match self {
            Self::None => Self::ThreeQuarter,
            Self::Quarter => Self::None,
            Self::Half => Self::Quarter,
            Self::ThreeQuarter => Self::Half,
        }
    }

    pub const fn degrees(self) -> u16 {
        match self {
            Self::None => 0,
            Self::Quarter => 90,
            Self::Half => 180,
            Self::ThreeQuarter => 270,
        }
    }
}

/// Full-size viewer state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Lightbox {
    /// Index into the gallery's photo list
    pub index: usize,
    pub zoom: Zoom,
    /// Show the photo pixel-for-pixel instead of fitted
    pub one_to_one: bool,
    pub rotation: Rotation,
    pub flip_x: bool,
    pub flip_y: bool,
    /// When the slideshow advances next; `None` when it is stopped
    pub slideshow_due: Option<Instant>,
}

impl Lightbox {
    pub const fn new(index: usize) -> Self {
        Self {
            index,
            zoom: Zoom::Fit,
            one_to_one: false,
            rotation: Rotation::None,
            flip_x: false,
            flip_y: false,
            slideshow_due: None,
        }
    }

    /// Show another photo with a fresh view; the slideshow keeps running.
    pub fn show(&mut self, index: usize) {
        let due = self.slideshow_due;
        *self = Self::new(index);
        self.slideshow_due = due;
    }

    pub const fn is_playing(&self) -> bool {
        self.slideshow_due.is_some()
    }

    /// Apply the current view (rotation, flips, zoom, 1:1) to `image`.
    ///
    /// `target_px` is the pixel size of the area the result is drawn into.
    pub fn apply(&self, image: &DynamicImage, target_px: (u32, u32)) -> DynamicImage {
        let (target_w, target_h) = (target_px.0.max(1), target_px.1.max(1));
        let mut view = if self.one_to_one {
            image.clone()
        } else {
            let bound = target_w.max(target_h).saturating_mul(self.zoom.factor());
            if image.width() > bound || image.height() > bound {
                image.thumbnail(bound, bound)
            } else {
                image.clone()
            }
        };

        view = match self.rotation {
            Rotation::None => view,
            Rotation::Quarter => view.rotate90(),
            Rotation::Half => view.rotate180(),
            Rotation::ThreeQuarter => view.rotate270(),
        };
        if self.flip_x {
            view = view.fliph();
        }
        if self.flip_y {
            view = view.flipv();
        }

        let (crop_w, crop_h) = if self.one_to_one {
            (target_w.min(view.width()), target_h.min(view.height()))
        } else {
            let factor = self.zoom.factor();
            (
                (view.width() / factor).max(1),
                (view.height() / factor).max(1),
            )
        };
        if (crop_w, crop_h) == (view.width(), view.height()) {
            return view;
        }
        let x = (view.width() - crop_w) / 2;
        let y = (view.height() - crop_h) / 2;
        view.crop_imm(x, y, crop_w, crop_h)
    }
}

/// A thumbnail ready to draw inside a tile.
pub struct Thumbnail {
    pub protocol: StatefulProtocol,
    /// Tile image box the thumbnail was scaled for
    box_size: (u16, u16),
    /// Cells the thumbnail actually covers
    pub width: u16,
    pub height: u16,
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct LightboxKey {
    url: String,
    area: (u16, u16),
    zoom: Zoom,
    one_to_one: bool,
    rotation: Rotation,
    flip_x: bool,
    flip_y: bool,
}

/// The lightbox image, prepared for one view of one photo.
pub struct LightboxImage {
    key: LightboxKey,
    pub protocol: StatefulProtocol,
    /// Whether the full-size image (not the thumbnail stand-in) is shown
    pub is_full: bool,
}

/// The complete application state.
///
/// All state lives here - no global or scattered state.
pub struct Model {
    /// Photos loaded so far and the pagination cursor
    pub gallery: GalleryState,
    /// Placement of every photo
    pub layout: MasonryLayout,
    /// Viewport over the layout's rows
    pub viewport: Viewport,
    /// Index of the highlighted tile
    pub selected: usize,
    /// Open lightbox, if any
    pub lightbox: Option<Lightbox>,
    /// Global config path shown in help
    pub config_global_path: Option<PathBuf>,
    /// Local override path shown in help
    pub config_local_path: Option<PathBuf>,
    /// Whether help overlay is visible
    pub help_visible: bool,
    /// Whether the app should quit
    pub should_quit: bool,
    /// Whether photos are drawn at all (placeholders otherwise)
    pub images_enabled: bool,
    /// Image picker for terminal rendering
    pub picker: Option<Picker>,
    /// Tile thumbnails keyed by medium URL
    pub thumbnails: HashMap<String, Thumbnail>,
    /// Prepared lightbox image
    pub lightbox_image: Option<LightboxImage>,
    images: ImageCache,
    /// Full-size photos, keyed by full URL
    originals: ImageCache,
    /// Height/width of decoded thumbnails for photos without dimensions
    decoded_aspects: HashMap<String, f64>,
    breakpoints: Breakpoints,
    /// Page claimed by `update` and waiting for a worker
    pending_fetch: Option<PageRequest>,
    toast: Option<Toast>,
    /// True when a resize is pending and expensive work should be paused
    resize_pending: bool,
    /// Short cooldown used only for iTerm2 inline image placeholdering while scrolling
    image_scroll_cooldown_ticks: u8,
}

impl std::fmt::Debug for Model {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Model")
            .field("photos", &self.gallery.len())
            .field("next_page", &self.gallery.next_page())
            .field("is_loading", &self.gallery.is_loading())
            .field("selected", &self.selected)
            .field("lightbox", &self.lightbox)
            .finish_non_exhaustive()
    }
}

impl Model {
    /// Create an empty gallery for a terminal of `terminal_size` (cols, rows).
    ///
    /// The bottom row is reserved for the status bar.
    pub fn new(terminal_size: (u16, u16)) -> Self {
        Self {
            viewport: Viewport::new(terminal_size.0, terminal_size.1.saturating_sub(1), 0),
            ..Self::default()
        }
    }

    /// Set the image picker.
    #[must_use]
    pub fn with_picker(mut self, picker: Option<Picker>) -> Self {
        self.picker = picker;
        self.reflow_layout();
        self
    }

    /// Replace the column breakpoints.
    #[must_use]
    pub fn with_breakpoints(mut self, breakpoints: Breakpoints) -> Self {
        self.breakpoints = breakpoints;
        self.reflow_layout();
        self
    }

    /// Terminal cell size in pixels.
    pub fn cell_px(&self) -> (u16, u16) {
        self.picker.as_ref().map_or(DEFAULT_CELL_PX, |picker| {
            let (w, h) = picker.font_size();
            (w.max(1), h.max(1))
        })
    }

    /// Photo the lightbox shows, or the selected tile's photo.
    pub fn focused_photo(&self) -> Option<&Photo> {
        let index = self.lightbox.as_ref().map_or(self.selected, |lb| lb.index);
        self.gallery.photo(index)
    }

    /// When the slideshow should advance next.
    pub fn slideshow_due(&self) -> Option<Instant> {
        self.lightbox.as_ref().and_then(|lb| lb.slideshow_due)
    }

    /// Recompute columns and tile heights from the viewport and photo shapes.
    pub(super) fn reflow_layout(&mut self) {
        let width = self.viewport.width();
        let cell = self.cell_px();
        let width_px = u32::from(width) * u32::from(cell.0);
        let columns = self.breakpoints.columns_for_width(width_px);
        let column_width = MasonryLayout::column_width_for(columns, width);

        let heights: Vec<usize> = self
            .gallery
            .photos()
            .iter()
            .map(|photo| tile_rows(self.photo_aspect(photo), column_width, cell))
            .collect();
        self.layout = MasonryLayout::arrange(&heights, columns, width);
        self.viewport.set_total_rows(self.layout.content_rows());
        self.selected = self.selected.min(self.gallery.len().saturating_sub(1));
        crate::perf::log_event(
            "layout.reflow",
            format!(
                "photos={} width={width} width_px={width_px} columns={columns} rows={}",
                heights.len(),
                self.layout.content_rows()
            ),
        );
    }

    fn photo_aspect(&self, photo: &Photo) -> Option<f64> {
        photo
            .aspect_ratio()
            .or_else(|| self.decoded_aspects.get(&photo.medium_url).copied())
    }

    /// Claim the next page if the viewport is close to the end of the content.
    pub(super) fn load_more_if_near_end(&mut self) {
        if self.viewport.near_end() {
            self.request_next_page();
        }
    }

    /// Claim the next page unless a fetch is already outstanding.
    pub(super) fn request_next_page(&mut self) {
        if let Some(request) = self.gallery.begin_load() {
            crate::perf::log_event("gallery.fetch.begin", format!("page={}", request.page()));
            self.pending_fetch = Some(request);
        }
    }

    /// Hand the claimed page to whoever runs fetches.
    pub fn take_pending_fetch(&mut self) -> Option<PageRequest> {
        self.pending_fetch.take()
    }

    /// Move the selection and scroll it into view.
    pub(super) fn select(&mut self, index: usize) {
        if index >= self.gallery.len() {
            return;
        }
        self.selected = index;
        if let Some(tile) = self.layout.tile(index) {
            self.viewport.ensure_visible(tile.rows());
        }
    }

    /// Full-size image the lightbox is waiting for.
    pub fn lightbox_wanted(&self) -> Vec<String> {
        if !self.images_enabled {
            return Vec::new();
        }
        let Some(photo) = self.lightbox.as_ref().and_then(|lb| self.gallery.photo(lb.index)) else {
            return Vec::new();
        };
        let mut wanted = Vec::new();
        if !self.originals.contains(&photo.full_url) {
            wanted.push(photo.full_url.clone());
        }
        if !self.images.contains(&photo.medium_url) {
            wanted.push(photo.medium_url.clone());
        }
        wanted
    }

    /// Thumbnails near the viewport that are not downloaded yet, top first.
    pub fn wanted_thumbnails(&self) -> Vec<String> {
        if !self.images_enabled || self.resize_pending {
            return Vec::new();
        }
        self.layout
            .visible(self.lookahead_rows())
            .filter_map(|tile| self.gallery.photo(tile.index))
            .filter(|photo| !self.images.contains(&photo.medium_url))
            .map(|photo| photo.medium_url.clone())
            .collect()
    }

    /// Record a downloaded image.
    ///
    /// Thumbnails and full-size photos go to separate caches so a few large
    /// originals cannot crowd out the grid.
    pub fn image_arrived(&mut self, url: &str, image: DynamicImage) {
        let thumbnail_of = self
            .gallery
            .photos()
            .iter()
            .find(|photo| photo.medium_url == url);
        let is_original = thumbnail_of.is_none() && self.gallery.contains(url);
        let needs_shape = thumbnail_of.is_some_and(|photo| photo.aspect_ratio().is_none());
        if needs_shape && image.width() > 0 && image.height() > 0 {
            self.decoded_aspects.insert(
                url.to_string(),
                f64::from(image.height()) / f64::from(image.width()),
            );
        }
        if is_original {
            self.originals.insert(url, image);
        } else {
            self.images.insert(url, image);
        }
        if needs_shape {
            self.reflow_layout();
        }
    }

    /// Whether a downloaded image is cached for `url`.
    pub fn has_image(&self, url: &str) -> bool {
        self.images.contains(url) || self.originals.contains(url)
    }

    fn lookahead_rows(&self) -> std::ops::Range<usize> {
        let height = self.viewport.height() as usize;
        let start = self.viewport.offset().saturating_sub(height);
        start..self.viewport.offset() + height * 2
    }

    /// Build thumbnails for tiles near the viewport from cached images and
    /// drop the ones that scrolled out of reach.
    pub fn load_nearby_images(&mut self) {
        if self.resize_pending {
            crate::perf::log_event("image.load_nearby.skip", "resize_pending=true");
            return;
        }
        if !self.images_enabled {
            return;
        }
        self.evict_distant_thumbnails();
        let Some(picker) = &self.picker else { return };

        let mut built = 0_usize;
        for tile in self.layout.visible(self.lookahead_rows()) {
            let Some(photo) = self.gallery.photo(tile.index) else {
                continue;
            };
            #[allow(clippy::cast_possible_truncation)]
            // Image rows are clamped to a few dozen.
            let box_size = (tile.width, tile.image_rows() as u16);
            let fresh = self
                .thumbnails
                .get(&photo.medium_url)
                .is_some_and(|thumb| thumb.box_size == box_size);
            if fresh {
                continue;
            }
            let Some(image) = self.images.get(&photo.medium_url) else {
                continue;
            };
            let thumbnail = build_thumbnail(picker, &image, box_size);
            self.thumbnails.insert(photo.medium_url.clone(), thumbnail);
            built += 1;
        }
        if built > 0 {
            crate::perf::log_event(
                "image.load_nearby.protocol",
                format!("built={built} cached={}", self.thumbnails.len()),
            );
        }
    }

    fn evict_distant_thumbnails(&mut self) {
        let nearby: HashSet<&str> = self
            .layout
            .visible(self.lookahead_rows())
            .filter_map(|tile| self.gallery.photo(tile.index))
            .map(|photo| photo.medium_url.as_str())
            .collect();
        let before = self.thumbnails.len();
        self.thumbnails.retain(|url, _| nearby.contains(url.as_str()));
        let evicted = before - self.thumbnails.len();
        if evicted > 0 {
            crate::perf::log_event("image.thumbnail.evict", format!("evicted={evicted}"));
        }
    }

    /// Prepare the lightbox image for drawing into `area`.
    ///
    /// Shows the thumbnail until the full-size image has been downloaded.
    pub fn prepare_lightbox(&mut self, area: Rect) {
        let Some(lightbox) = &self.lightbox else {
            self.lightbox_image = None;
            return;
        };
        let Some(picker) = &self.picker else { return };
        let Some(photo) = self.gallery.photo(lightbox.index) else {
            self.lightbox_image = None;
            return;
        };
        let (url, is_full) = if self.originals.contains(&photo.full_url) {
            (photo.full_url.clone(), true)
        } else if self.images.contains(&photo.medium_url) {
            (photo.medium_url.clone(), false)
        } else {
            self.lightbox_image = None;
            return;
        };

        let key = LightboxKey {
            url,
            area: (area.width, area.height),
            zoom: lightbox.zoom,
            one_to_one: lightbox.one_to_one,
            rotation: lightbox.rotation,
            flip_x: lightbox.flip_x,
            flip_y: lightbox.flip_y,
        };
        if self
            .lightbox_image
            .as_ref()
            .is_some_and(|current| current.key == key)
        {
            return;
        }
        let cache = if is_full { &self.originals } else { &self.images };
        let Some(image) = cache.get(&key.url) else {
            return;
        };

        let started = Instant::now();
        let (cell_w, cell_h) = picker.font_size();
        let target_px = (
            u32::from(area.width) * u32::from(cell_w),
            u32::from(area.height) * u32::from(cell_h),
        );
        let mut view = lightbox.apply(&image, target_px);
        if matches!(picker.protocol_type(), ProtocolType::Halfblocks)
            && !crate::image::supports_truecolor_terminal()
        {
            view = crate::image::quantize_to_ansi256(&view);
        }
        let protocol = picker.new_resize_protocol(view);
        crate::perf::log_event(
            "lightbox.prepare",
            format!(
                "url={} full={is_full} area={}x{} ms={:.3}",
                key.url,
                area.width,
                area.height,
                started.elapsed().as_secs_f64() * 1000.0
            ),
        );
        self.lightbox_image = Some(LightboxImage {
            key,
            protocol,
            is_full,
        });
    }

    pub const fn tick_image_scroll_cooldown(&mut self) {
        self.image_scroll_cooldown_ticks = self.image_scroll_cooldown_ticks.saturating_sub(1);
    }

    pub const fn is_image_scroll_settling(&self) -> bool {
        self.image_scroll_cooldown_ticks > 0
    }

    pub(super) const fn bump_image_scroll_cooldown(&mut self) {
        self.image_scroll_cooldown_ticks = 3;
    }

    pub(super) const fn set_resize_pending(&mut self, pending: bool) {
        self.resize_pending = pending;
    }

    pub fn show_toast(&mut self, level: ToastLevel, message: impl Into<String>) {
        self.toast = Some(Toast {
            level,
            message: message.into(),
            expires_at: Instant::now() + Duration::from_secs(4),
        });
    }

    pub(super) fn expire_toast(&mut self, now: Instant) -> bool {
        if self
            .toast
            .as_ref()
            .is_some_and(|toast| toast.expires_at <= now)
        {
            self.toast = None;
            return true;
        }
        false
    }

    pub fn active_toast(&self) -> Option<(&str, ToastLevel)> {
        self.toast
            .as_ref()
            .map(|toast| (toast.message.as_str(), toast.level))
    }
}

fn build_thumbnail(picker: &Picker, image: &DynamicImage, box_size: (u16, u16)) -> Thumbnail {
    let (cell_w, cell_h) = picker.font_size();
    let use_halfblocks = matches!(picker.protocol_type(), ProtocolType::Halfblocks);
    let target_w = (u32::from(box_size.0) * u32::from(cell_w)).max(1);
    let target_h = (u32::from(box_size.1) * u32::from(cell_h)).max(1);
    let mut scaled = image.resize(
        target_w,
        target_h,
        if use_halfblocks {
            FilterType::CatmullRom
        } else {
            FilterType::Triangle
        },
    );
    if use_halfblocks && !crate::image::supports_truecolor_terminal() {
        scaled = crate::image::quantize_to_ansi256(&scaled);
    }
    let protocol = picker.new_resize_protocol(scaled);
    let (width, height) = protocol_render_size(&protocol, box_size);
    Thumbnail {
        protocol,
        box_size,
        width,
        height,
    }
}

fn protocol_render_size(protocol: &StatefulProtocol, box_size: (u16, u16)) -> (u16, u16) {
    use ratatui_image::Resize;
    let resize = if matches!(
        protocol.protocol_type(),
        ratatui_image::protocol::StatefulProtocolType::Halfblocks(_)
    ) {
        Resize::Scale(Some(FilterType::CatmullRom))
    } else {
        Resize::Scale(None)
    };
    let area = Rect::new(0, 0, box_size.0, box_size.1);
    let rect = protocol.size_for(resize, area);
    (
        rect.width.clamp(1, box_size.0.max(1)),
        rect.height.clamp(1, box_size.1.max(1)),
    )
}

// Implement Default for Model to allow std::mem::take
impl Default for Model {
    fn default() -> Self {
        Self {
            gallery: GalleryState::new(),
            layout: MasonryLayout::default(),
            viewport: Viewport::new(80, 23, 0),
            selected: 0,
            lightbox: None,
            config_global_path: None,
            config_local_path: None,
            help_visible: false,
            should_quit: false,
            images_enabled: true,
            picker: None,
            thumbnails: HashMap::new(),
            lightbox_image: None,
            images: ImageCache::new(IMAGE_CACHE_SIZE),
            originals: ImageCache::new(ORIGINAL_CACHE_SIZE),
            decoded_aspects: HashMap::new(),
            breakpoints: Breakpoints::default(),
            pending_fetch: None,
            toast: None,
            resize_pending: false,
            image_scroll_cooldown_ticks: 0,
        }
    }
}
