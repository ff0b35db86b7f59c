//! Upload sink — counts an incoming body and turns it into a throughput figure.
//!
//! The body is never buffered: each chunk is counted and dropped. The clock
//! starts when the read loop begins and stops after the last chunk.

use std::error::Error as StdError;
use std::time::Duration;

use bytes::Bytes;
use futures::{Stream, StreamExt};
use serde::{Deserialize, Serialize};
use tokio::time::Instant;

use crate::clock::ServerClock;

pub const MAX_UPLOAD_BYTES: u64 = 50 * 1024 * 1024;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UploadLimits {
    pub max_bytes: u64,
    /// Longest gap tolerated between body chunks.
    pub idle_timeout: Option<Duration>,
    /// Fail as soon as the running total crosses `max_bytes` instead of
    /// draining the rest of the body first.
    pub early_abort: bool,
}

impl Default for UploadLimits {
    fn default() -> Self {
        Self {
            max_bytes: MAX_UPLOAD_BYTES,
            idle_timeout: Some(Duration::from_secs(30)),
            early_abort: false,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct UploadResult {
    pub received_bytes: u64,
    pub elapsed_seconds: f64,
    pub upload_bps: u64,
    pub server_time: i64,
}

#[derive(Debug, thiserror::Error)]
pub enum UploadError {
    /// `drained` is false when the read was cut short by early abort, in
    /// which case `received` is only a lower bound.
    #[error("upload of {received} bytes exceeds the {limit} byte limit")]
    TooLarge {
        received: u64,
        limit: u64,
        drained: bool,
    },
    #[error("no body data received for {0:?}")]
    Stalled(Duration),
    #[error("body read failed after {received} bytes: {source}")]
    Transport {
        received: u64,
        source: Box<dyn StdError + Send + Sync>,
    },
}

/// Bits per second for `bytes` moved in `elapsed`. Zero when no time passed.
pub fn throughput_bps(bytes: u64, elapsed: Duration) -> u64 {
    let secs = elapsed.as_secs_f64();
    if secs > 0.0 {
        (bytes as f64 * 8.0 / secs).floor() as u64
    } else {
        0
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct UploadSink {
    limits: UploadLimits,
}

impl UploadSink {
    pub fn new(limits: UploadLimits) -> Self {
        Self { limits }
    }

    pub fn limits(&self) -> &UploadLimits {
        &self.limits
    }

    /// Read `body` to the end, counting bytes.
    pub async fn consume<S, E>(
        &self,
        body: S,
        clock: &ServerClock,
    ) -> Result<UploadResult, UploadError>
    where
        S: Stream<Item = Result<Bytes, E>>,
        E: Into<Box<dyn StdError + Send + Sync>>,
    {
        let mut body = std::pin::pin!(body);
        let limit = self.limits.max_bytes;
        let start = Instant::now();
        let mut received: u64 = 0;

        loop {
            let next = match self.limits.idle_timeout {
                Some(idle) => tokio::time::timeout(idle, body.next())
                    .await
                    .map_err(|_| UploadError::Stalled(idle))?,
                None => body.next().await,
            };

            match next {
                Some(Ok(chunk)) => {
                    received += chunk.len() as u64;
                    if self.limits.early_abort && received > limit {
                        return Err(UploadError::TooLarge {
                            received,
                            limit,
                            drained: false,
                        });
                    }
                }
                Some(Err(e)) => {
                    return Err(UploadError::Transport {
                        received,
                        source: e.into(),
                    })
                }
                None => break,
            }
        }

        let elapsed = start.elapsed();
        if received > limit {
            return Err(UploadError::TooLarge {
                received,
                limit,
                drained: true,
            });
        }

        Ok(UploadResult {
            received_bytes: received,
            elapsed_seconds: elapsed.as_secs_f64(),
            upload_bps: throughput_bps(received, elapsed),
            server_time: clock.now_ms(),
        })
    }
}
