//! Download test payloads.
//!
//! A `DownloadJob` is built per request from the client's requested size.
//! Its body is produced lazily: the HTTP stack polls the stream for the next
//! chunk only once the previous one has been handed to the transport, so at
//! most one `CHUNK_SIZE` buffer is live per download regardless of total size.
//! Dropping the stream (peer went away) ends generation on the spot.

use bytes::Bytes;
use futures::Stream;

use crate::chunk::random_chunk;

/// Fixed emission unit. The final chunk carries the remainder.
pub const CHUNK_SIZE: usize = 65_536;

pub const DEFAULT_DOWNLOAD_BYTES: u64 = 1024 * 1024;
pub const MIN_DOWNLOAD_BYTES: u64 = 1024;
pub const MAX_DOWNLOAD_BYTES: u64 = 10 * 1024 * 1024;

/// Server-enforced bounds for download sizes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DownloadLimits {
    pub default_bytes: u64,
    pub min_bytes: u64,
    pub max_bytes: u64,
}

impl Default for DownloadLimits {
    fn default() -> Self {
        Self {
            default_bytes: DEFAULT_DOWNLOAD_BYTES,
            min_bytes: MIN_DOWNLOAD_BYTES,
            max_bytes: MAX_DOWNLOAD_BYTES,
        }
    }
}

impl DownloadLimits {
    /// Clamp a requested size into `[min_bytes, max_bytes]`. Out-of-range and
    /// negative requests are adjusted, never rejected.
    pub fn clamp(&self, requested: Option<i64>) -> u64 {
        let requested = requested
            .map(i128::from)
            .unwrap_or(self.default_bytes as i128);
        requested.clamp(self.min_bytes as i128, self.max_bytes as i128) as u64
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("size must be an integer, got {0:?}")]
pub struct InvalidSize(pub String);

/// Parse a raw `size` query value. Any integer is accepted; values beyond
/// the `i64` range saturate, which the clamp then maps to the bounds.
pub fn parse_requested_size(raw: &str) -> Result<i64, InvalidSize> {
    let text = raw.trim();
    let (negative, digits) = match text.as_bytes().first() {
        Some(b'-') => (true, &text[1..]),
        Some(b'+') => (false, &text[1..]),
        _ => (false, text),
    };
    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return Err(InvalidSize(raw.to_string()));
    }
    Ok(text.parse::<i64>().unwrap_or(if negative { i64::MIN } else { i64::MAX }))
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DownloadJob {
    pub requested: Option<i64>,
    pub size: u64,
}

impl DownloadJob {
    pub fn new(requested: Option<i64>, limits: &DownloadLimits) -> Self {
        Self {
            requested,
            size: limits.clamp(requested),
        }
    }

    pub fn chunk_count(&self) -> u64 {
        self.size.div_ceil(CHUNK_SIZE as u64)
    }

    /// Lengths of the chunks this job will emit, in order.
    pub fn chunk_lengths(&self) -> impl Iterator<Item = usize> {
        let size = self.size;
        (0..self.chunk_count()).map(move |i| {
            let offset = i * CHUNK_SIZE as u64;
            (size - offset).min(CHUNK_SIZE as u64) as usize
        })
    }

    /// Lazily generated body of random bytes. Each poll produces exactly
    /// one chunk.
    pub fn into_stream(self) -> impl Stream<Item = Bytes> + Send + 'static {
        self.into_stream_with(random_chunk)
    }

    /// Like [`into_stream`](Self::into_stream) with a caller-supplied chunk
    /// source. `generate` is called once per poll, with the chunk length.
    pub fn into_stream_with<G>(self, generate: G) -> impl Stream<Item = Bytes> + Send + 'static
    where
        G: FnMut(usize) -> Bytes + Send + 'static,
    {
        let progress = Progress {
            total: self.size,
            remaining: self.size,
        };
        futures::stream::unfold((progress, generate), |(mut progress, mut generate)| async move {
            if progress.remaining == 0 {
                return None;
            }
            let len = progress.remaining.min(CHUNK_SIZE as u64);
            progress.remaining -= len;
            let chunk = generate(len as usize);
            Some((chunk, (progress, generate)))
        })
    }
}

struct Progress {
    total: u64,
    remaining: u64,
}

impl Drop for Progress {
    fn drop(&mut self) {
        if self.remaining > 0 {
            tracing::debug!(
                total = self.total,
                unsent = self.remaining,
                "download stream dropped before completion"
            );
        }
    }
}
