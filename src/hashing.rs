//! Hashing - SHA-256 fingerprints for compiled units
//!
//! Same source and names always give the same fingerprint, so a generated
//! file can be checked against the manifest it came with.

use sha2::{Sha256, Digest};

/// Compute SHA-256 hash of bytes, return hex string
pub fn sha256_hex(data: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(data);
    let result = hasher.finalize();
    hex::encode(result)
}

/// unit_hash = sha256(engine:module.class:sha256(source))
pub fn compute_unit_hash(engine: &str, full_class_name: &str, source: &str) -> String {
    let combined = format!("{}:{}:{}", engine, full_class_name, sha256_hex(source.as_bytes()));
    sha256_hex(combined.as_bytes())
}
