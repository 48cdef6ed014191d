//! Pexels curated-photos client.
//!
//! [Pexels API Documentation](https://www.pexels.com/api/documentation/)

use std::time::Duration;

use reqwest::blocking::Client;
use serde::Deserialize;

use super::{FetchError, PAGE_SIZE, Photo, PhotoSource};

/// Production API root.
pub const DEFAULT_API_BASE: &str = "https://api.pexels.com/v1";

const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Fetches curated photos, one page per call.
#[derive(Debug, Clone)]
pub struct PexelsClient {
    client: Client,
    access_key: String,
    api_base: String,
}

impl PexelsClient {
    /// Create a client for `api_base` (usually [`DEFAULT_API_BASE`]).
    ///
    /// # Errors
    ///
    /// Returns an error if the underlying HTTP client cannot be built.
    pub fn new(access_key: impl Into<String>, api_base: impl Into<String>) -> Result<Self, FetchError> {
        let client = Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .user_agent(concat!("pexgal/", env!("CARGO_PKG_VERSION")))
            .build()?;
        Ok(Self::with_client(client, access_key, api_base))
    }

    /// Create a client that shares an existing HTTP client.
    pub fn with_client(
        client: Client,
        access_key: impl Into<String>,
        api_base: impl Into<String>,
    ) -> Self {
        let api_base = api_base.into();
        Self {
            client,
            access_key: access_key.into(),
            api_base: api_base.trim_end_matches('/').to_string(),
        }
    }

    /// The underlying HTTP client.
    pub const fn http(&self) -> &Client {
        &self.client
    }

    /// URL for a page of curated photos.
    pub fn curated_url(&self, page: u32) -> String {
        format!(
            "{}/curated?page={page}&per_page={PAGE_SIZE}",
            self.api_base
        )
    }
}

impl PhotoSource for PexelsClient {
    fn fetch_page(&self, page: u32) -> Result<Vec<Photo>, FetchError> {
        let url = self.curated_url(page);
        crate::perf::log_event("source.request", format!("url={url}"));

        let response = self
            .client
            .get(&url)
            .header(reqwest::header::AUTHORIZATION, self.access_key.as_str())
            .send()?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::from_status(status));
        }

        let body = response.text()?;
        parse_curated(&body)
    }
}

/// Parse a curated-photos response body.
///
/// Only `src.medium` and `src.original` are required; the rest is
/// display metadata and may be missing.
///
/// # Errors
///
/// Returns [`FetchError::Malformed`] when the body is not the expected JSON.
pub fn parse_curated(body: &str) -> Result<Vec<Photo>, FetchError> {
    let parsed: CuratedResponse =
        serde_json::from_str(body).map_err(|err| FetchError::Malformed(err.to_string()))?;
    Ok(parsed.photos.into_iter().map(Photo::from).collect())
}

impl From<PexelsPhoto> for Photo {
    fn from(photo: PexelsPhoto) -> Self {
        Self {
            medium_url: photo.src.medium,
            full_url: photo.src.original,
            width: photo.width,
            height: photo.height,
            alt: photo.alt.filter(|alt| !alt.trim().is_empty()),
            photographer: photo.photographer.filter(|name| !name.trim().is_empty()),
        }
    }
}

#[derive(Debug, Deserialize)]
struct CuratedResponse {
    photos: Vec<PexelsPhoto>,
}

#[derive(Debug, Deserialize)]
struct PexelsPhoto {
    #[serde(default)]
    width: Option<u32>,
    #[serde(default)]
    height: Option<u32>,
    #[serde(default)]
    photographer: Option<String>,
    #[serde(default)]
    alt: Option<String>,
    src: PexelsPhotoSrc,
}

#[derive(Debug, Deserialize)]
struct PexelsPhotoSrc {
    original: String,
    medium: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_curated_url_uses_fixed_page_size() {
        let client = PexelsClient::with_client(Client::new(), "key", "https://api.example.com/v1/");
        assert_eq!(
            client.curated_url(3),
            "https://api.example.com/v1/curated?page=3&per_page=7"
        );
    }

    #[test]
    fn test_parse_curated_keeps_server_order() {
        let body = r#"{
            "page": 1,
            "per_page": 7,
            "photos": [
                {"id": 1, "width": 4000, "height": 6000, "photographer": "Ann",
                 "alt": "A lake", "src": {"medium": "m1", "original": "o1", "tiny": "t1"}},
                {"id": 2, "src": {"medium": "m2", "original": "o2"}}
            ]
        }"#;
        let photos = parse_curated(body).unwrap();
        assert_eq!(photos.len(), 2);
        assert_eq!(photos[0].full_url, "o1");
        assert_eq!(photos[0].medium_url, "m1");
        assert_eq!(photos[0].photographer.as_deref(), Some("Ann"));
        assert_eq!(photos[0].aspect_ratio(), Some(1.5));
        assert_eq!(photos[1].full_url, "o2");
        assert!(photos[1].width.is_none());
    }

    #[test]
    fn test_parse_curated_blank_alt_is_dropped() {
        let body = r#"{"photos": [{"alt": "  ", "src": {"medium": "m", "original": "o"}}]}"#;
        let photos = parse_curated(body).unwrap();
        assert!(photos[0].alt.is_none());
    }

    #[test]
    fn test_parse_curated_rejects_missing_src() {
        let body = r#"{"photos": [{"id": 1}]}"#;
        assert!(matches!(parse_curated(body), Err(FetchError::Malformed(_))));
    }

    #[test]
    fn test_parse_curated_rejects_non_json() {
        assert!(matches!(
            parse_curated("<html>rate limited</html>"),
            Err(FetchError::Malformed(_))
        ));
    }
}
