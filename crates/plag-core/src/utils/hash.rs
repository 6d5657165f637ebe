use sha2::{Digest, Sha256};

/// Hex-encoded SHA-256 digest of `content`.
pub fn content_hash(content: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(content);
    format!("{:x}", hasher.finalize())
}

pub fn short_hash(digest: &str, length: usize) -> &str {
    &digest[..length.min(digest.len())]
}

#[cfg(test)]
pub(crate) fn is_sha256_hex(value: &str) -> bool {
    value.len() == 64 && value.chars().all(|c| c.is_ascii_hexdigit())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_content_hash_deterministic() {
        let h1 = content_hash(b"print('hi')\n");
        let h2 = content_hash(b"print('hi')\n");
        assert_eq!(h1, h2);
        assert_ne!(h1, content_hash(b"print('hi') \n"));
    }

    #[test]
    fn test_content_hash_known_vector() {
        assert_eq!(
            content_hash(b""),
            "e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855"
        );
    }

    #[test]
    fn test_content_hash_hex_format() {
        assert!(is_sha256_hex(&content_hash(b"test")));
        assert!(!is_sha256_hex("abc"));
    }

    #[test]
    fn test_short_hash() {
        let digest = content_hash(b"test");
        assert_eq!(short_hash(&digest, 8).len(), 8);
        assert_eq!(short_hash("abc", 8), "abc");
    }
}
