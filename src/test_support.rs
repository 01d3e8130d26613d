//! Test doubles shared by unit tests across modules

use crate::cancellation::CancellationToken;
use crate::pipeline::{FetchError, ImageSource};
use crate::provider::{Candidate, PhotoProvider, SearchError};
use crate::storage::{MemoryStorage, StorageError, StorageSink};
use async_trait::async_trait;
use image::{DynamicImage, ImageFormat, Rgb, RgbImage};
use std::collections::HashMap;
use std::io::Cursor;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

/// A solid-colour PNG of the given size
pub(crate) fn png_bytes(width: u32, height: u32) -> Vec<u8> {
    let image = DynamicImage::ImageRgb8(RgbImage::from_pixel(width, height, Rgb([200, 40, 40])));
    let mut out = Vec::new();
    image
        .write_to(&mut Cursor::new(&mut out), ImageFormat::Png)
        .unwrap();
    out
}

/// Candidates `{prefix}1..={count}` pointing at `https://images.test/{id}`
pub(crate) fn candidates(prefix: &str, count: usize) -> Vec<Candidate> {
    (1..=count)
        .map(|i| {
            let id = format!("{}{}", prefix, i);
            Candidate::new(id.clone(), format!("https://images.test/{}", id))
                .with_alt_text(format!("Photo of {}", i))
        })
        .collect()
}

/// Image source serving canned bytes, instrumented with an in-flight gauge
pub(crate) struct StubSource {
    default: Vec<u8>,
    per_url: HashMap<String, Vec<u8>>,
    failing: HashMap<String, String>,
    delay: Duration,
    in_flight: AtomicUsize,
    peak: AtomicUsize,
    calls: AtomicUsize,
}

impl StubSource {
    pub(crate) fn serving(bytes: Vec<u8>) -> Self {
        Self {
            default: bytes,
            per_url: HashMap::new(),
            failing: HashMap::new(),
            delay: Duration::ZERO,
            in_flight: AtomicUsize::new(0),
            peak: AtomicUsize::new(0),
            calls: AtomicUsize::new(0),
        }
    }

    pub(crate) fn serving_url(mut self, url: &str, bytes: Vec<u8>) -> Self {
        self.per_url.insert(url.to_string(), bytes);
        self
    }

    pub(crate) fn failing(mut self, url: &str, message: &str) -> Self {
        self.failing.insert(url.to_string(), message.to_string());
        self
    }

    pub(crate) fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    /// Highest number of simultaneous fetches observed
    pub(crate) fn peak(&self) -> usize {
        self.peak.load(Ordering::SeqCst)
    }

    pub(crate) fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

struct InFlight<'a>(&'a AtomicUsize);

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::SeqCst);
    }
}

#[async_trait]
impl ImageSource for StubSource {
    async fn fetch(&self, url: &str) -> Result<Vec<u8>, FetchError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        let _guard = InFlight(&self.in_flight);
        self.peak.fetch_max(now, Ordering::SeqCst);

        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }

        if let Some(message) = self.failing.get(url) {
            return Err(FetchError::Transport(message.clone()));
        }
        Ok(self
            .per_url
            .get(url)
            .cloned()
            .unwrap_or_else(|| self.default.clone()))
    }
}

/// Storage that records every call and fails chosen names
#[derive(Default)]
pub(crate) struct RecordingStorage {
    pub(crate) inner: MemoryStorage,
    failing: HashMap<String, String>,
    deleted: Mutex<Vec<String>>,
}

impl RecordingStorage {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Make `save(name)` fail with an I/O error carrying `message`
    pub(crate) fn failing(mut self, name: &str, message: &str) -> Self {
        self.failing.insert(name.to_string(), message.to_string());
        self
    }

    pub(crate) fn names(&self) -> Vec<String> {
        self.inner.names()
    }

    pub(crate) fn deleted(&self) -> Vec<String> {
        self.deleted.lock().unwrap().clone()
    }
}

#[async_trait]
impl StorageSink for RecordingStorage {
    async fn save(&self, bytes: Vec<u8>, name: &str) -> Result<String, StorageError> {
        if let Some(message) = self.failing.get(name) {
            return Err(std::io::Error::new(std::io::ErrorKind::Other, message.clone()).into());
        }
        self.inner.save(bytes, name).await
    }

    async fn delete(&self, name: &str) -> Result<(), StorageError> {
        self.deleted.lock().unwrap().push(name.to_string());
        self.inner.delete(name).await
    }
}

/// What a [`StubProvider`] answers with
pub(crate) enum ProviderReply {
    Candidates(Vec<Candidate>),
    RateLimited(Option<Duration>),
    Status(u16),
    CancelDuringSearch,
}

/// Provider double that records the queries it receives
pub(crate) struct StubProvider {
    reply: ProviderReply,
    calls: Mutex<Vec<(String, u32)>>,
}

impl StubProvider {
    pub(crate) fn new(reply: ProviderReply) -> Self {
        Self {
            reply,
            calls: Mutex::new(Vec::new()),
        }
    }

    pub(crate) fn calls(&self) -> Vec<(String, u32)> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl PhotoProvider for StubProvider {
    fn name(&self) -> &str {
        "stub"
    }

    async fn search(
        &self,
        query: &str,
        limit: u32,
        cancel: &CancellationToken,
    ) -> Result<Vec<Candidate>, SearchError> {
        self.calls.lock().unwrap().push((query.to_string(), limit));
        if cancel.is_cancelled() {
            return Err(SearchError::Cancelled);
        }
        match &self.reply {
            ProviderReply::Candidates(candidates) => Ok(candidates.clone()),
            ProviderReply::RateLimited(retry_after) => Err(SearchError::RateLimited {
                retry_after: *retry_after,
            }),
            ProviderReply::Status(status) => Err(SearchError::status(*status)),
            ProviderReply::CancelDuringSearch => {
                cancel.cancel();
                Err(SearchError::Cancelled)
            }
        }
    }
}
