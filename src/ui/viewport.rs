//! Viewport management for scrolling the gallery.
//!
//! The [`Viewport`] tracks which rows of the masonry layout are on screen.

use std::ops::Range;

/// Fraction of the content that must be scrolled past before more photos
/// are requested.
pub const LOAD_THRESHOLD: f64 = 0.8;

/// Visible window over the gallery's rows.
///
/// # Example
///
/// ```
/// use pexgal::ui::viewport::Viewport;
///
/// let mut vp = Viewport::new(80, 20, 100);
/// assert_eq!(vp.visible_range(), 0..20);
/// assert!(!vp.near_end());
///
/// vp.scroll_down(60);
/// assert_eq!(vp.visible_range(), 60..80);
/// assert!(vp.near_end());
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Viewport {
    width: u16,
    height: u16,
    offset: usize,
    total_rows: usize,
}

impl Viewport {
    /// Create a viewport `width` x `height` cells over `total_rows` rows.
    pub const fn new(width: u16, height: u16, total_rows: usize) -> Self {
        Self {
            width,
            height,
            offset: 0,
            total_rows,
        }
    }

    pub const fn offset(&self) -> usize {
        self.offset
    }

    pub const fn width(&self) -> u16 {
        self.width
    }

    pub const fn height(&self) -> u16 {
        self.height
    }

    pub const fn total_rows(&self) -> usize {
        self.total_rows
    }

    /// Rows currently on screen, clamped to the content.
    pub fn visible_range(&self) -> Range<usize> {
        let start = self.offset;
        let end = (self.offset + self.height as usize).min(self.total_rows);
        start..end
    }

    /// Whether the bottom edge has reached [`LOAD_THRESHOLD`] of the
    /// content, or the content does not fill the screen.
    pub fn near_end(&self) -> bool {
        if self.total_rows <= self.height as usize {
            return true;
        }
        let bottom = self.offset + self.height as usize;
        #[allow(clippy::cast_precision_loss)]
        // Row counts stay far below f64's exact integer range.
        let reached = bottom as f64 >= self.total_rows as f64 * LOAD_THRESHOLD;
        reached
    }

    /// Get the scroll percentage (0-100).
    pub fn scroll_percent(&self) -> u8 {
        let max_offset = self.max_offset();
        if self.total_rows == 0 || max_offset == 0 {
            return 100;
        }

        // Percentage value always 0-100
        #[allow(
            clippy::cast_precision_loss,
            clippy::cast_possible_truncation,
            clippy::cast_sign_loss
        )]
        {
            ((self.offset as f64 / max_offset as f64) * 100.0).round() as u8
        }
    }

    pub const fn can_scroll_down(&self) -> bool {
        self.offset < self.max_offset()
    }

    pub const fn scroll_up(&mut self, n: usize) {
        self.offset = self.offset.saturating_sub(n);
    }

    pub fn scroll_down(&mut self, n: usize) {
        self.offset = (self.offset + n).min(self.max_offset());
    }

    pub const fn page_up(&mut self) {
        self.scroll_up(self.height as usize);
    }

    pub fn page_down(&mut self) {
        self.scroll_down(self.height as usize);
    }

    pub const fn half_page_up(&mut self) {
        self.scroll_up(self.height as usize / 2);
    }

    pub fn half_page_down(&mut self) {
        self.scroll_down(self.height as usize / 2);
    }

    pub const fn go_to_top(&mut self) {
        self.offset = 0;
    }

    pub const fn go_to_bottom(&mut self) {
        self.offset = self.max_offset();
    }

    /// Scroll the least amount that brings `rows` fully on screen.
    ///
    /// Rows taller than the viewport are aligned to their top.
    pub fn ensure_visible(&mut self, rows: Range<usize>) {
        let height = self.height as usize;
        if rows.start < self.offset || rows.len() > height {
            self.offset = rows.start;
        } else if rows.end > self.offset + height {
            self.offset = rows.end - height;
        }
        self.offset = self.offset.min(self.max_offset());
    }

    /// Resize the viewport.
    pub fn resize(&mut self, width: u16, height: u16) {
        self.width = width;
        self.height = height;
        self.offset = self.offset.min(self.max_offset());
    }

    /// Update the content length (after new photos or a reflow).
    pub fn set_total_rows(&mut self, total: usize) {
        self.total_rows = total;
        self.offset = self.offset.min(self.max_offset());
    }

    const fn max_offset(&self) -> usize {
        self.total_rows.saturating_sub(self.height as usize)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_viewport_starts_at_top() {
        let vp = Viewport::new(80, 24, 100);
        assert_eq!(vp.offset(), 0);
        assert_eq!(vp.visible_range(), 0..24);
    }

    #[test]
    fn test_visible_range_at_bottom() {
        let mut vp = Viewport::new(80, 24, 100);
        vp.go_to_bottom();
        assert_eq!(vp.visible_range(), 76..100);
    }

    #[test]
    fn test_scroll_down_clamps_to_max() {
        let mut vp = Viewport::new(80, 24, 100);
        vp.scroll_down(1000);
        assert_eq!(vp.offset(), 76);
    }

    #[test]
    fn test_page_and_half_page_moves() {
        let mut vp = Viewport::new(80, 24, 100);
        vp.page_down();
        assert_eq!(vp.offset(), 24);
        vp.half_page_down();
        assert_eq!(vp.offset(), 36);
        vp.half_page_up();
        vp.page_up();
        assert_eq!(vp.offset(), 0);
    }

    #[test]
    fn test_near_end_threshold() {
        let mut vp = Viewport::new(80, 20, 100);
        vp.scroll_down(59);
        assert!(!vp.near_end());
        vp.scroll_down(1);
        assert!(vp.near_end());
    }

    #[test]
    fn test_near_end_when_content_fits() {
        assert!(Viewport::new(80, 24, 10).near_end());
        assert!(Viewport::new(80, 24, 0).near_end());
    }

    #[test]
    fn test_ensure_visible_scrolls_minimally() {
        let mut vp = Viewport::new(80, 10, 100);
        vp.ensure_visible(15..20);
        assert_eq!(vp.offset(), 10);
        vp.ensure_visible(12..14);
        assert_eq!(vp.offset(), 10);
        vp.ensure_visible(3..6);
        assert_eq!(vp.offset(), 3);
    }

    #[test]
    fn test_ensure_visible_tall_rows_align_top() {
        let mut vp = Viewport::new(80, 10, 100);
        vp.ensure_visible(40..70);
        assert_eq!(vp.offset(), 40);
    }

    #[test]
    fn test_scroll_percent_bounds() {
        let mut vp = Viewport::new(80, 24, 100);
        assert_eq!(vp.scroll_percent(), 0);
        vp.go_to_bottom();
        assert_eq!(vp.scroll_percent(), 100);
        assert_eq!(Viewport::new(80, 24, 0).scroll_percent(), 100);
    }

    #[test]
    fn test_resize_keeps_valid_offset() {
        let mut vp = Viewport::new(80, 24, 100);
        vp.scroll_down(50);
        vp.resize(80, 60);
        assert_eq!(vp.offset(), 40);
    }

    #[test]
    fn test_set_total_rows_grows_scroll_room() {
        let mut vp = Viewport::new(80, 24, 30);
        vp.go_to_bottom();
        assert!(!vp.can_scroll_down());
        vp.set_total_rows(60);
        assert!(vp.can_scroll_down());
        assert_eq!(vp.offset(), 6);
    }

    mod property_tests {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            #[test]
            fn scroll_never_exceeds_bounds(
                total in 1..10000usize,
                height in 1..100u16,
                scroll_amount in 0..10000usize,
            ) {
                let mut vp = Viewport::new(80, height, total);
                vp.scroll_down(scroll_amount);
                prop_assert!(vp.offset() <= total.saturating_sub(height as usize));
            }

            #[test]
            fn ensure_visible_stays_in_bounds(
                total in 0..5000usize,
                height in 1..100u16,
                start in 0..5000usize,
                len in 0..200usize,
            ) {
                let mut vp = Viewport::new(80, height, total);
                vp.ensure_visible(start..start + len);
                prop_assert!(vp.offset() <= total.saturating_sub(height as usize));
            }

            #[test]
            fn percent_always_valid(
                total in 0..10000usize,
                height in 1..100u16,
                offset in 0..10000usize,
            ) {
                let mut vp = Viewport::new(80, height, total);
                vp.scroll_down(offset);
                prop_assert!(vp.scroll_percent() <= 100);
            }
        }
    }
}
