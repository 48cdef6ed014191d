//! Remote image downloading and caching.

use std::collections::{HashMap, HashSet, VecDeque};
use std::sync::mpsc::{self, Receiver, Sender};
use std::sync::{Arc, Mutex};

use image::DynamicImage;
use reqwest::blocking::Client;

use crate::source::FetchError;

/// Downloads allowed to run at once.
pub const MAX_IN_FLIGHT: usize = 6;

#[derive(Debug, Default)]
struct CacheInner {
    entries: HashMap<String, Arc<DynamicImage>>,
    order: VecDeque<String>,
}

/// Bounded cache of decoded images keyed by URL.
///
/// Reads refresh an entry, so the least recently used image is evicted first.
/// Images are shared, so a read never copies pixels.
#[derive(Debug, Default, Clone)]
pub struct ImageCache {
    inner: Arc<Mutex<CacheInner>>,
    max_size: usize,
}

impl ImageCache {
    /// Create a new image cache with the given maximum number of entries.
    pub fn new(max_size: usize) -> Self {
        Self {
            inner: Arc::new(Mutex::new(CacheInner::default())),
            max_size,
        }
    }

    /// Get an image from the cache.
    pub fn get(&self, url: &str) -> Option<Arc<DynamicImage>> {
        let mut guard = self.lock();
        let image = guard.entries.get(url).map(Arc::clone)?;
        touch(&mut guard.order, url);
        Some(image)
    }

    /// Insert an image into the cache.
    pub fn insert(&self, url: impl Into<String>, image: DynamicImage) {
        let url = url.into();
        let mut guard = self.lock();

        if guard.entries.insert(url.clone(), Arc::new(image)).is_some() {
            touch(&mut guard.order, &url);
            return;
        }
        guard.order.push_back(url);

        while guard.entries.len() > self.max_size {
            let Some(oldest) = guard.order.pop_front() else {
                break;
            };
            guard.entries.remove(&oldest);
        }
    }

    pub fn contains(&self, url: &str) -> bool {
        self.lock().entries.contains_key(url)
    }

    pub fn clear(&self) {
        let mut guard = self.lock();
        guard.entries.clear();
        guard.order.clear();
    }

    /// Get the number of cached images.
    pub fn len(&self) -> usize {
        self.lock().entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, CacheInner> {
        match self.inner.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }
}

fn touch(order: &mut VecDeque<String>, url: &str) {
    if let Some(pos) = order.iter().position(|u| u == url) {
        if let Some(entry) = order.remove(pos) {
            order.push_back(entry);
        }
    }
}

/// Result of one image download.
#[derive(Debug)]
pub struct ImageEvent {
    pub url: String,
    pub result: Result<DynamicImage, FetchError>,
}

/// Download and decode a single image.
///
/// # Errors
///
/// Returns a [`FetchError`] on transport failure, a non-success status, or
/// bytes that do not decode as an image.
pub fn download_image(client: &Client, url: &str) -> Result<DynamicImage, FetchError> {
    let response = client.get(url).send()?;
    let status = response.status();
    if !status.is_success() {
        return Err(FetchError::from_status(status));
    }
    let bytes = response.bytes()?;
    image::load_from_memory(&bytes).map_err(|err| FetchError::Malformed(err.to_string()))
}

/// Background image downloader.
///
/// Requests are queued in order and at most [`MAX_IN_FLIGHT`] downloads run
/// at a time, each on its own thread. Finished downloads come back through
/// [`ImageFetcher::drain`]. A URL that failed once is not requested again.
pub struct ImageFetcher {
    client: Client,
    tx: Sender<ImageEvent>,
    rx: Receiver<ImageEvent>,
    queue: VecDeque<String>,
    in_flight: HashSet<String>,
    failed: HashSet<String>,
    max_in_flight: usize,
}

impl ImageFetcher {
    pub fn new(client: Client) -> Self {
        Self::with_limit(client, MAX_IN_FLIGHT)
    }

    pub fn with_limit(client: Client, max_in_flight: usize) -> Self {
        let (tx, rx) = mpsc::channel();
        Self {
            client,
            tx,
            rx,
            queue: VecDeque::new(),
            in_flight: HashSet::new(),
            failed: HashSet::new(),
            max_in_flight: max_in_flight.max(1),
        }
    }

    /// Queue `url` behind earlier requests.
    pub fn request(&mut self, url: &str) {
        if self.is_known(url) {
            return;
        }
        self.queue.push_back(url.to_string());
        self.pump();
    }

    /// Queue `url` ahead of everything else (lightbox images).
    pub fn request_first(&mut self, url: &str) {
        if self.in_flight.contains(url) || self.failed.contains(url) {
            return;
        }
        self.queue.retain(|queued| queued != url);
        self.queue.push_front(url.to_string());
        self.pump();
    }

    /// Whether `url` is queued or downloading.
    pub fn is_pending(&self, url: &str) -> bool {
        self.in_flight.contains(url) || self.queue.iter().any(|q| q == url)
    }

    pub fn has_failed(&self, url: &str) -> bool {
        self.failed.contains(url)
    }

    pub fn in_flight(&self) -> usize {
        self.in_flight.len()
    }

    pub fn queued(&self) -> usize {
        self.queue.len()
    }

    /// Start queued downloads while under the in-flight limit.
    pub fn pump(&mut self) {
        while self.in_flight.len() < self.max_in_flight {
            let Some(url) = self.queue.pop_front() else {
                break;
            };
            self.in_flight.insert(url.clone());
            let client = self.client.clone();
            let tx = self.tx.clone();
            crate::perf::log_event("image.fetch.start", format!("url={url}"));
            std::thread::spawn(move || {
                let result = download_image(&client, &url);
                let _ = tx.send(ImageEvent { url, result });
            });
        }
    }

    /// Collect finished downloads without blocking, then start more.
    pub fn drain(&mut self) -> Vec<ImageEvent> {
        let mut events = Vec::new();
        while let Ok(event) = self.rx.try_recv() {
            self.settle(&event);
            events.push(event);
        }
        if !events.is_empty() {
            self.pump();
        }
        events
    }

    /// Wait for the next finished download.
    pub fn recv_timeout(&mut self, timeout: std::time::Duration) -> Option<ImageEvent> {
        let event = self.rx.recv_timeout(timeout).ok()?;
        self.settle(&event);
        self.pump();
        Some(event)
    }

    fn settle(&mut self, event: &ImageEvent) {
        self.in_flight.remove(&event.url);
        if let Err(err) = &event.result {
            tracing::warn!(url = %event.url, error = %err, "image download failed");
            self.failed.insert(event.url.clone());
        }
    }

    fn is_known(&self, url: &str) -> bool {
        self.failed.contains(url) || self.is_pending(url)
    }
}
