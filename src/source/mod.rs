//! Photo sources.
//!
//! A [`PhotoSource`] produces one page of [`Photo`]s per call. The app runs
//! sources on worker threads, so implementations block freely.

mod pexels;

pub use pexels::{DEFAULT_API_BASE, PexelsClient, parse_curated};

use thiserror::Error;

/// Number of photos requested per page.
pub const PAGE_SIZE: u32 = 7;

/// A single gallery photo.
///
/// `full_url` is the identity of a photo: two photos with the same
/// full-size URL are the same photo, whatever their metadata says.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Photo {
    /// Thumbnail-sized image shown in the grid
    pub medium_url: String,
    /// Full-size image shown in the lightbox
    pub full_url: String,
    /// Original pixel width, when the source reports it
    pub width: Option<u32>,
    /// Original pixel height, when the source reports it
    pub height: Option<u32>,
    /// Alternative text
    pub alt: Option<String>,
    /// Credited photographer
    pub photographer: Option<String>,
}

impl Photo {
    /// Create a photo with only the two URLs set.
    pub fn new(medium_url: impl Into<String>, full_url: impl Into<String>) -> Self {
        Self {
            medium_url: medium_url.into(),
            full_url: full_url.into(),
            width: None,
            height: None,
            alt: None,
            photographer: None,
        }
    }

    /// Attach original dimensions.
    #[must_use]
    pub const fn with_dimensions(mut self, width: u32, height: u32) -> Self {
        self.width = Some(width);
        self.height = Some(height);
        self
    }

    /// Height/width ratio of the original, if both dimensions are known and non-zero.
    pub fn aspect_ratio(&self) -> Option<f64> {
        match (self.width, self.height) {
            (Some(w), Some(h)) if w > 0 && h > 0 => Some(f64::from(h) / f64::from(w)),
            _ => None,
        }
    }
}

/// Why a page (or image) could not be fetched.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FetchError {
    /// The server answered with a non-success status.
    #[error("Error: {status} {text}")]
    Status { status: u16, text: String },

    /// The response body did not have the expected shape.
    #[error("Malformed response: {0}")]
    Malformed(String),

    /// The request never produced a response.
    #[error("Network error: {0}")]
    Transport(String),
}

impl From<reqwest::Error> for FetchError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            Self::Malformed(err.to_string())
        } else if let Some(status) = err.status() {
            Self::from_status(status)
        } else {
            Self::Transport(err.to_string())
        }
    }
}

impl FetchError {
    pub(crate) fn from_status(status: reqwest::StatusCode) -> Self {
        Self::Status {
            status: status.as_u16(),
            text: status.canonical_reason().unwrap_or_default().to_string(),
        }
    }
}

/// Something that can hand out pages of photos.
pub trait PhotoSource: Send + Sync {
    /// Fetch page `page` (1-based).
    ///
    /// # Errors
    ///
    /// Returns a [`FetchError`] when the request fails or the response
    /// cannot be understood. Callers decide on retry policy.
    fn fetch_page(&self, page: u32) -> Result<Vec<Photo>, FetchError>;
}
