use sha2::{Digest, Sha256};

/// Hex SHA-256 of the content. Used for content-addressed object names.
pub fn content_hash(bytes: &[u8]) -> String {
    hex::encode(Sha256::digest(bytes))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn content_hash_deterministic() {
        assert_eq!(content_hash(b"repair order"), content_hash(b"repair order"));
        assert_eq!(content_hash(b"").len(), 64);
    }

    #[test]
    fn different_content_different_hash() {
        assert_ne!(content_hash(b"RO 1"), content_hash(b"RO 2"));
    }

    #[test]
    fn known_digest() {
        assert_eq!(
            content_hash(b"abc"),
            "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
        );
    }
}
