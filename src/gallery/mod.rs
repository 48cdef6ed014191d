//! Gallery state and the page-loading controller.
//!
//! [`GalleryState`] owns the accumulated photo list, the page cursor and the
//! single-flight flag. Loading a page is split at the point where the fetch
//! happens so the UI thread can run the fetch elsewhere:
//!
//! 1. [`GalleryState::begin_load`] claims the next page (or refuses while a
//!    fetch is outstanding).
//! 2. The caller fetches the page however it likes.
//! 3. [`GalleryState::finish_load`] merges the result and advances the cursor.
//!
//! [`GalleryState::load_next`] runs all three steps in place.

use std::collections::HashSet;

use crate::source::{FetchError, Photo, PhotoSource};

/// Order-preserving merge that drops photos whose `full_url` is already known.
///
/// Duplicates inside `incoming` are dropped too; the first occurrence wins.
///
/// ```
/// use pexgal::gallery::merge;
/// use pexgal::source::Photo;
///
/// let current = vec![Photo::new("m1", "o1")];
/// let incoming = vec![Photo::new("m1", "o1"), Photo::new("m2", "o2")];
/// let merged = merge(&current, incoming);
/// assert_eq!(merged.len(), 2);
/// assert_eq!(merged[1].full_url, "o2");
/// ```
pub fn merge(current: &[Photo], incoming: Vec<Photo>) -> Vec<Photo> {
    let mut seen: HashSet<String> = current.iter().map(|p| p.full_url.clone()).collect();
    let mut next = current.to_vec();
    next.extend(retain_unseen(&mut seen, incoming));
    next
}

/// Photos of `incoming` whose `full_url` is not in `seen`, in order.
/// Admitted URLs are added to `seen`.
fn retain_unseen(seen: &mut HashSet<String>, incoming: Vec<Photo>) -> Vec<Photo> {
    incoming
        .into_iter()
        .filter(|photo| seen.insert(photo.full_url.clone()))
        .collect()
}

/// A claimed page fetch. Only [`GalleryState::begin_load`] hands these out.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    page: u32,
}

impl PageRequest {
    /// The 1-based page number to fetch.
    pub const fn page(self) -> u32 {
        self.page
    }
}

/// What a load attempt did to the gallery.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoadOutcome {
    /// The page was merged.
    Appended { added: usize, skipped: usize },
    /// The fetch failed; photos are unchanged but the cursor moved on.
    Failed(FetchError),
    /// Another fetch is outstanding; nothing happened.
    Busy,
    /// The completion did not belong to the outstanding fetch and was ignored.
    Stale,
}

impl LoadOutcome {
    /// Number of photos this load added.
    pub const fn added(&self) -> usize {
        match self {
            Self::Appended { added, .. } => *added,
            _ => 0,
        }
    }
}

/// Photos loaded so far plus pagination bookkeeping.
#[derive(Debug, Clone)]
pub struct GalleryState {
    photos: Vec<Photo>,
    seen: HashSet<String>,
    next_page: u32,
    is_loading: bool,
}

impl Default for GalleryState {
    fn default() -> Self {
        Self::new()
    }
}

impl GalleryState {
    /// Empty gallery positioned at page 1.
    pub fn new() -> Self {
        Self {
            photos: Vec::new(),
            seen: HashSet::new(),
            next_page: 1,
            is_loading: false,
        }
    }

    /// Photos in display order.
    pub fn photos(&self) -> &[Photo] {
        &self.photos
    }

    pub fn photo(&self, index: usize) -> Option<&Photo> {
        self.photos.get(index)
    }

    pub fn len(&self) -> usize {
        self.photos.len()
    }

    pub fn is_empty(&self) -> bool {
        self.photos.is_empty()
    }

    /// The page the next load will request.
    pub const fn next_page(&self) -> u32 {
        self.next_page
    }

    /// Whether a fetch is outstanding.
    pub const fn is_loading(&self) -> bool {
        self.is_loading
    }

    /// Whether a photo with this full-size URL is already in the gallery.
    pub fn contains(&self, full_url: &str) -> bool {
        self.seen.contains(full_url)
    }

    /// Claim the next page for fetching.
    ///
    /// Returns `None` without touching any state while another fetch is
    /// outstanding.
    pub const fn begin_load(&mut self) -> Option<PageRequest> {
        if self.is_loading {
            return None;
        }
        self.is_loading = true;
        Some(PageRequest {
            page: self.next_page,
        })
    }

    /// Apply the result of a fetch claimed with [`Self::begin_load`].
    ///
    /// The cursor advances by one whether or not the fetch succeeded, so a
    /// failed page is never requested again.
    pub fn finish_load(
        &mut self,
        request: PageRequest,
        result: Result<Vec<Photo>, FetchError>,
    ) -> LoadOutcome {
        if !self.is_loading || request.page != self.next_page {
            tracing::warn!(
                page = request.page,
                next_page = self.next_page,
                "ignoring completion for a page that is not outstanding"
            );
            return LoadOutcome::Stale;
        }

        let outcome = match result {
            Ok(incoming) => {
                let fetched = incoming.len();
                let added = self.append_unique(incoming);
                tracing::debug!(page = request.page, fetched, added, "page merged");
                LoadOutcome::Appended {
                    added,
                    skipped: fetched - added,
                }
            }
            Err(err) => {
                tracing::warn!(page = request.page, error = %err, "error fetching images");
                crate::perf::log_event(
                    "gallery.fetch.error",
                    format!("page={} err={err}", request.page),
                );
                LoadOutcome::Failed(err)
            }
        };

        self.next_page += 1;
        self.is_loading = false;
        outcome
    }

    /// Load the next page from `source` on the current thread.
    pub fn load_next(&mut self, source: &dyn PhotoSource) -> LoadOutcome {
        let Some(request) = self.begin_load() else {
            return LoadOutcome::Busy;
        };
        let result = source.fetch_page(request.page);
        self.finish_load(request, result)
    }

    fn append_unique(&mut self, incoming: Vec<Photo>) -> usize {
        let fresh = retain_unseen(&mut self.seen, incoming);
        let added = fresh.len();
        self.photos.extend(fresh);
        added
    }
}
