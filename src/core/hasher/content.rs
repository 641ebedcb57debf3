//! Exact content hashing.
//!
//! SHA-256 over the raw payload. Any byte difference, including a
//! re-encode at a different quality, produces a different hash; that
//! brittleness is what the perceptual path compensates for.

use crate::core::input::ImageBytes;
use crate::error::HashError;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::fmt;
use std::str::FromStr;

/// Hex length of a SHA-256 digest
pub const CONTENT_HASH_LEN: usize = 64;

/// Lowercase hex SHA-256 digest of an image payload
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ContentHash(String);

impl ContentHash {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl FromStr for ContentHash {
    type Err = HashError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let valid = value.len() == CONTENT_HASH_LEN
            && value
                .chars()
                .all(|c| c.is_ascii_digit() || ('a'..='f').contains(&c));
        if !valid {
            return Err(HashError::InvalidContentHash {
                value: value.to_string(),
            });
        }
        Ok(Self(value.to_string()))
    }
}

impl TryFrom<String> for ContentHash {
    type Error = HashError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<ContentHash> for String {
    fn from(hash: ContentHash) -> Self {
        hash.0
    }
}

impl fmt::Display for ContentHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Computes the exact-duplicate key of a payload
#[derive(Debug, Clone, Copy, Default)]
pub struct ContentHasher;

impl ContentHasher {
    pub fn new() -> Self {
        Self
    }

    /// Hash the raw bytes. Fails only on an empty payload.
    pub fn hash(&self, image: &ImageBytes) -> Result<ContentHash, HashError> {
        image.ensure_readable()?;
        let digest = Sha256::digest(image.as_bytes());
        Ok(ContentHash(format!("{:x}", digest)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn payload(bytes: &[u8]) -> ImageBytes {
        ImageBytes::new(bytes.to_vec(), "image/jpeg")
    }

    #[test]
    fn hash_is_deterministic() {
        let hasher = ContentHasher::new();
        let image = payload(b"hello world");

        let hash1 = hasher.hash(&image).unwrap();
        let hash2 = hasher.hash(&image).unwrap();
        assert_eq!(hash1, hash2);
        // Known SHA-256 of "hello world"
        assert_eq!(
            hash1.as_str(),
            "b94d27b9934d3e08a52e52d7da7dabfac484efe37a5380ee9088f7ace2efcde9"
        );
    }

    #[test]
    fn every_single_byte_flip_changes_hash() {
        let hasher = ContentHasher::new();
        let original: Vec<u8> = (0..512u32).map(|i| (i * 31 % 251) as u8).collect();
        let baseline = hasher.hash(&payload(&original)).unwrap();

        for position in 0..original.len() {
            let mut mutated = original.clone();
            mutated[position] ^= 0x01;
            let hash = hasher.hash(&payload(&mutated)).unwrap();
            assert_ne!(hash, baseline, "flip at byte {} kept the hash", position);
        }
    }

    #[test]
    fn empty_payload_is_rejected() {
        let result = ContentHasher::new().hash(&payload(b""));
        assert!(matches!(result, Err(HashError::InvalidInput { .. })));
    }

    #[test]
    fn parse_accepts_only_lowercase_sha256_hex() {
        let valid = "e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855";
        assert!(valid.parse::<ContentHash>().is_ok());
        assert!(valid.to_uppercase().parse::<ContentHash>().is_err());
        assert!("abc123".parse::<ContentHash>().is_err());
    }

    #[test]
    fn serializes_as_plain_string() {
        let hash = ContentHasher::new().hash(&payload(b"car")).unwrap();
        let json = serde_json::to_string(&hash).unwrap();
        assert_eq!(json, format!("\"{}\"", hash));

        let back: ContentHash = serde_json::from_str(&json).unwrap();
        assert_eq!(back, hash);
        assert!(serde_json::from_str::<ContentHash>("\"nope\"").is_err());
    }
}
