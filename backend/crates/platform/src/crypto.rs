//! Hashing and Encoding Utilities

use base64::{Engine, engine::general_purpose};
use sha1::Sha1;
use sha2::{Digest, Sha256};

/// Compute SHA-1 hash
pub fn sha1(data: &[u8]) -> [u8; 20] {
    let mut hasher = Sha1::new();
    hasher.update(data);
    hasher.finalize().into()
}

/// Compute SHA-256 hash
pub fn sha256(data: &[u8]) -> [u8; 32] {
    let mut hasher = Sha256::new();
    hasher.update(data);
    hasher.finalize().into()
}

/// Encode bytes as base64
pub fn to_base64(bytes: &[u8]) -> String {
    general_purpose::STANDARD.encode(bytes)
}

/// Decode standard (padded) base64
pub fn from_base64(s: &str) -> Result<Vec<u8>, base64::DecodeError> {
    general_purpose::STANDARD.decode(s)
}

/// Lowercase hex
pub fn to_hex(bytes: &[u8]) -> String {
    hex::encode(bytes)
}

/// Decode hex, either case
pub fn from_hex(s: &str) -> Result<Vec<u8>, hex::FromHexError> {
    hex::decode(s)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sha1_known_values() {
        assert_eq!(
            to_hex(&sha1(b"")),
            "da39a3ee5e6b4b0d3255bfef95601890afd80709"
        );
        // four zero bytes: LE32 of principal id 0
        assert_eq!(
            to_hex(&sha1(&[0u8; 4])),
            "9069ca78e7450a285173431b3e52c5c25299e473"
        );
    }

    #[test]
    fn test_sha256_known_values() {
        assert_eq!(
            to_hex(&sha256(b"")),
            "e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855"
        );
        assert_eq!(
            to_hex(&sha256(b"hello")),
            "2cf24dba5fb0a30e26e83b2ac5b9e29e1b161e5c1fa7425e73043362938b9824"
        );
    }

    #[test]
    fn test_base64_rejects_garbage() {
        assert!(from_base64("not base64!").is_err());
        assert_eq!(from_base64(&to_base64(b"part1")).unwrap(), b"part1");
    }

    #[test]
    fn test_hex_accepts_upper_case() {
        assert_eq!(from_hex("00FF").unwrap(), vec![0x00, 0xFF]);
        assert!(from_hex("0g").is_err());
    }
}
