//! speedtest-core — measurement primitives and configuration.
//! The HTTP edge, the daemon and the CLI all build on this crate.

pub mod chunk;
pub mod clock;
pub mod config;
pub mod download;
pub mod ping;
pub mod upload;

pub use clock::ServerClock;
pub use config::SpeedtestConfig;
pub use download::{parse_requested_size, DownloadJob, DownloadLimits, InvalidSize, CHUNK_SIZE};
pub use ping::{PingExchange, PingRequest};
pub use upload::{throughput_bps, UploadError, UploadLimits, UploadResult, UploadSink};
