use sha2::{Digest, Sha256};

/// SHA-256 of normalized content, as a lowercase hex string. Used both for
/// `wiki_pages.content_hash` and for `Store::should_update`'s change check.
pub fn content_hash(content: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(content.trim().as_bytes());
    hex::encode(hasher.finalize())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn identical_content_hashes_identically() {
        assert_eq!(content_hash("hello"), content_hash("hello"));
    }

    #[test]
    fn leading_trailing_whitespace_does_not_affect_hash() {
        assert_eq!(content_hash("hello"), content_hash("  hello  \n"));
    }

    #[test]
    fn different_content_hashes_differently() {
        assert_ne!(content_hash("hello"), content_hash("goodbye"));
    }
}
