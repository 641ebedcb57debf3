//! The perceptual fingerprint value type.

use crate::error::HashError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Fixed-length string of binary digits, one per grid cell in row-major order
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct PerceptualFingerprint(String);

impl PerceptualFingerprint {
    /// Build a fingerprint from cell bits
    pub fn from_bits<I>(bits: I) -> Result<Self, HashError>
    where
        I: IntoIterator<Item = bool>,
    {
        let digits: String = bits
            .into_iter()
            .map(|bit| if bit { '1' } else { '0' })
            .collect();
        if digits.is_empty() {
            return Err(HashError::InvalidFingerprint {
                reason: "fingerprint has no bits".to_string(),
            });
        }
        Ok(Self(digits))
    }

    /// Number of bits
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Always false; empty fingerprints cannot be constructed
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Iterate over the bits in row-major order
    pub fn bits(&self) -> impl Iterator<Item = bool> + '_ {
        self.0.bytes().map(|b| b == b'1')
    }

    /// Compact hex rendering, 4 bits per digit, last nibble zero-padded
    pub fn to_hex(&self) -> String {
        self.0
            .as_bytes()
            .chunks(4)
            .map(|nibble| {
                let value = nibble
                    .iter()
                    .chain(std::iter::repeat(&b'0'))
                    .take(4)
                    .fold(0u32, |acc, &digit| (acc << 1) | u32::from(digit == b'1'));
                std::char::from_digit(value, 16).unwrap_or('0')
            })
            .collect()
    }
}

impl FromStr for PerceptualFingerprint {
    type Err = HashError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        if let Some(bad) = value.chars().find(|c| *c != '0' && *c != '1') {
            return Err(HashError::InvalidFingerprint {
                reason: format!("unexpected character '{}'", bad),
            });
        }
        Self::from_bits(value.chars().map(|c| c == '1'))
    }
}

impl TryFrom<String> for PerceptualFingerprint {
    type Error = HashError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<PerceptualFingerprint> for String {
    fn from(fingerprint: PerceptualFingerprint) -> Self {
        fingerprint.0
    }
}

impl fmt::Display for PerceptualFingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn from_bits_renders_binary_digits() {
        let fingerprint = PerceptualFingerprint::from_bits([true, false, false, true]).unwrap();
        assert_eq!(fingerprint.as_str(), "1001");
        assert_eq!(fingerprint.len(), 4);
        assert_eq!(fingerprint.bits().collect::<Vec<_>>(), vec![true, false, false, true]);
    }

    #[test]
    fn empty_fingerprint_is_rejected() {
        assert!(PerceptualFingerprint::from_bits(std::iter::empty()).is_err());
        assert!("".parse::<PerceptualFingerprint>().is_err());
    }

    #[test]
    fn parse_rejects_non_binary_digits() {
        let error = "0102".parse::<PerceptualFingerprint>().unwrap_err();
        assert!(error.to_string().contains("'2'"));
    }

    #[test]
    fn to_hex_packs_nibbles() {
        let fingerprint: PerceptualFingerprint = "11011110101011011".parse().unwrap();
        // 1101 1110 1010 1101 1(000)
        assert_eq!(fingerprint.to_hex(), "dead8");
    }

    #[test]
    fn deserialization_validates() {
        let ok: PerceptualFingerprint = serde_json::from_str("\"0110\"").unwrap();
        assert_eq!(ok.as_str(), "0110");
        assert!(serde_json::from_str::<PerceptualFingerprint>("\"01x0\"").is_err());
    }
}
