//! Random payload chunks for download tests.
//!
//! Content only has to defeat transport compression and intermediary caches,
//! so any CSPRNG output works. `thread_rng` keeps one generator per worker
//! thread, so concurrent callers never contend.

use bytes::Bytes;
use rand::RngCore;

/// Return `len` unpredictable bytes.
pub fn random_chunk(len: usize) -> Bytes {
    let mut buf = vec![0u8; len];
    rand::thread_rng().fill_bytes(&mut buf);
    Bytes::from(buf)
}
