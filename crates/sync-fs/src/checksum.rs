//! Content fingerprints for change detection
//!
//! A synced directory records one fingerprint per file; comparing against a
//! fresh fingerprint tells whether the file was edited since.

use sha2::{Digest, Sha256};

const PREFIX: &str = "sha256:";

/// `sha256:<hex>` fingerprint of `content`'s UTF-8 bytes.
pub fn compute_content_checksum(content: &str) -> String {
    let digest = Sha256::digest(content.as_bytes());
    format!("{PREFIX}{digest:x}")
}
