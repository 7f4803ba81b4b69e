//! Password hashing and verification
//!
//! Credentials are stored as an unsalted SHA-256 digest, base64-encoded.
//! The digest is deterministic: two accounts sharing a plaintext password
//! produce identical stored values. Known weakness, kept for compatibility
//! with existing stored credentials.

use base64::{engine::general_purpose::STANDARD as BASE64, Engine};
use sha2::{Digest, Sha256};

/// Hash a plaintext password into its stored digest form
pub fn hash_password(password: &str) -> String {
    let digest = Sha256::digest(password.as_bytes());
    BASE64.encode(digest)
}

/// Verify a plaintext password against a stored digest
pub fn verify_password(password: &str, digest: &str) -> bool {
    hash_password(password) == digest
}
