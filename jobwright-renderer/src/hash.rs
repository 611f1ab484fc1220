//! Content hashing for drift detection.
//!
//! SHA-256 over the exact bytes, truncated to the first 16 bytes and encoded
//! as 32 lowercase hex characters so a digest fits the `@<hash>` suffix of a
//! template reference.

use sha2::{Digest, Sha256};

/// Number of digest bytes kept.
const DIGEST_BYTES: usize = 16;

/// Hash `content` into a 32-character lowercase hex string.
pub fn content_hash(content: &[u8]) -> String {
    let mut h = Sha256::new();
    h.update(content);
    let digest = h.finalize();
    hex::encode(&digest[..DIGEST_BYTES])
}
