//! Masonry layout.
//!
//! Photos are dealt into columns round-robin (photo `i` goes to column
//! `i % columns`) and stacked top to bottom, so each column keeps its own
//! height. Positions are in terminal cells: `x`/`width` in columns,
//! `top`/`height` in rows.

use std::ops::Range;

/// Blank columns between adjacent tiles.
pub const GUTTER_COLS: u16 = 1;
/// Blank rows between stacked tiles.
pub const GUTTER_ROWS: usize = 1;
/// Rows reserved under each image for its caption.
pub const CAPTION_ROWS: usize = 1;

const MIN_IMAGE_ROWS: usize = 3;
const MAX_IMAGE_ROWS: usize = 40;
/// Height/width used when a photo's shape is not known yet.
const FALLBACK_ASPECT: f64 = 2.0 / 3.0;

/// Viewport-width breakpoints mapping pixel width to a column count.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Breakpoints {
    /// `(min_width_px, columns)`, widest first.
    rules: Vec<(u32, usize)>,
}

impl Default for Breakpoints {
    fn default() -> Self {
        Self::new(vec![(992, 4), (768, 3), (576, 2), (0, 1)])
    }
}

impl Breakpoints {
    /// Build from `(min_width_px, columns)` pairs in any order.
    pub fn new(mut rules: Vec<(u32, usize)>) -> Self {
        rules.sort_by(|a, b| b.0.cmp(&a.0));
        Self { rules }
    }

    /// Column count for a viewport `width_px` wide. Never less than 1.
    ///
    /// ```
    /// use pexgal::layout::Breakpoints;
    ///
    /// let bp = Breakpoints::default();
    /// assert_eq!(bp.columns_for_width(1200), 4);
    /// assert_eq!(bp.columns_for_width(575), 1);
    /// ```
    pub fn columns_for_width(&self, width_px: u32) -> usize {
        self.rules
            .iter()
            .find(|(min, _)| width_px >= *min)
            .map_or(1, |(_, columns)| *columns)
            .max(1)
    }
}

/// Height in rows of a tile showing an image with the given height/width
/// ratio in a column `width_cols` wide, caption included.
///
/// `cell_px` is the terminal cell size in pixels (width, height).
pub fn tile_rows(aspect: Option<f64>, width_cols: u16, cell_px: (u16, u16)) -> usize {
    let aspect = aspect.filter(|a| a.is_finite() && *a > 0.0).unwrap_or(FALLBACK_ASPECT);
    let (cell_w, cell_h) = (f64::from(cell_px.0.max(1)), f64::from(cell_px.1.max(1)));
    let width_px = f64::from(width_cols) * cell_w;
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    // Clamped right after; the float is finite and non-negative.
    let rows = (width_px * aspect / cell_h).round() as usize;
    rows.clamp(MIN_IMAGE_ROWS, MAX_IMAGE_ROWS) + CAPTION_ROWS
}

/// Direction for moving the selection between tiles.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Left,
    Right,
    Up,
    Down,
}

/// One placed photo.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Tile {
    /// Index into the gallery's photo list
    pub index: usize,
    pub column: usize,
    /// Left edge in terminal columns
    pub x: u16,
    pub width: u16,
    /// First row, counted from the top of the gallery
    pub top: usize,
    /// Rows including the caption
    pub height: usize,
}

impl Tile {
    /// Rows occupied by the tile.
    pub const fn rows(&self) -> Range<usize> {
        self.top..self.top + self.height
    }

    /// Rows available to the image itself.
    pub const fn image_rows(&self) -> usize {
        self.height.saturating_sub(CAPTION_ROWS)
    }

    fn contains(&self, col: u16, row: usize) -> bool {
        col >= self.x
            && col < self.x.saturating_add(self.width)
            && row >= self.top
            && row < self.top + self.height
    }
}

/// Placement of every photo in the gallery.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MasonryLayout {
    tiles: Vec<Tile>,
    columns: usize,
    column_width: u16,
    column_heights: Vec<usize>,
}

impl MasonryLayout {
    /// Place tiles of the given heights into `columns` columns spanning
    /// `total_width` terminal columns.
    pub fn arrange(heights: &[usize], columns: usize, total_width: u16) -> Self {
        let columns = columns.max(1);
        let column_width = Self::column_width_for(columns, total_width);
        let mut column_heights = vec![0_usize; columns];
        let mut tiles = Vec::with_capacity(heights.len());

        for (index, &height) in heights.iter().enumerate() {
            let column = index % columns;
            let top = column_heights[column];
            #[allow(clippy::cast_possible_truncation)]
            // column < columns, and columns * column_width fits in total_width.
            let x = column as u16 * (column_width + GUTTER_COLS);
            tiles.push(Tile {
                index,
                column,
                x,
                width: column_width,
                top,
                height,
            });
            column_heights[column] = top + height + GUTTER_ROWS;
        }

        Self {
            tiles,
            columns,
            column_width,
            column_heights,
        }
    }

    /// Width of one column when `columns` columns share `total_width`.
    pub fn column_width_for(columns: usize, total_width: u16) -> u16 {
        let columns = u16::try_from(columns.max(1)).unwrap_or(u16::MAX);
        let gutters = GUTTER_COLS.saturating_mul(columns - 1);
        (total_width.saturating_sub(gutters) / columns).max(1)
    }

    pub fn tiles(&self) -> &[Tile] {
        &self.tiles
    }

    pub fn tile(&self, index: usize) -> Option<&Tile> {
        self.tiles.get(index)
    }

    pub const fn columns(&self) -> usize {
        self.columns
    }

    pub const fn column_width(&self) -> u16 {
        self.column_width
    }

    /// Total rows: the bottom of the tallest column.
    pub fn content_rows(&self) -> usize {
        self.column_heights
            .iter()
            .copied()
            .max()
            .unwrap_or(0)
            .saturating_sub(GUTTER_ROWS)
    }

    /// Tiles that overlap `rows`.
    pub fn visible(&self, rows: Range<usize>) -> impl Iterator<Item = &Tile> {
        self.tiles
            .iter()
            .filter(move |tile| tile.top < rows.end && tile.top + tile.height > rows.start)
    }

    /// Tile under a cell, if any.
    pub fn tile_at(&self, col: u16, row: usize) -> Option<usize> {
        self.tiles
            .iter()
            .find(|tile| tile.contains(col, row))
            .map(|tile| tile.index)
    }

    /// Tile next to `index` in `direction`.
    ///
    /// Because photos are dealt round-robin, the photo above is
    /// `columns` places earlier and the photo to the left is one place
    /// earlier.
    pub fn neighbor(&self, index: usize, direction: Direction) -> Option<usize> {
        let target = match direction {
            Direction::Left => index.checked_sub(1)?,
            Direction::Right => index + 1,
            Direction::Up => index.checked_sub(self.columns)?,
            Direction::Down => index + self.columns,
        };
        (target < self.tiles.len()).then_some(target)
    }
}
