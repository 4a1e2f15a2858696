//! Content fingerprinting for change detection.
//!
//! A fingerprint is a SHA256 hash of a record's serialized JSON. Any change
//! in the remote metadata (title, author, last-opened position) changes the
//! fingerprint, which is what the planner uses to decide whether an item
//! needs re-export without fetching its full content.

use serde::Serialize;
use sha2::{Digest, Sha256};

/// Compute a SHA256 fingerprint of a serializable value.
///
/// The value is serialized to JSON and hashed, giving a deterministic
/// fingerprint that changes whenever any field changes.
///
/// # Panics
///
/// Panics if the value cannot be serialized to JSON. This should never happen
/// for our data types which are all serializable.
#[must_use]
pub fn content_hash<T: Serialize>(value: &T) -> String {
    let json = serde_json::to_string(value).expect("serialization should not fail");
    let mut hasher = Sha256::new();
    hasher.update(json.as_bytes());
    format!("{:x}", hasher.finalize())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Serialize;

    #[derive(Serialize)]
    struct TestRecord {
        id: String,
        value: i32,
    }

    #[test]
    fn test_content_hash_deterministic() {
        let record = TestRecord {
            id: "item_1".into(),
            value: 42,
        };

        let hash1 = content_hash(&record);
        let hash2 = content_hash(&record);

        assert_eq!(hash1, hash2);
        assert_eq!(hash1.len(), 64); // SHA256 produces 64 hex chars
    }

    #[test]
    fn test_content_hash_changes_with_content() {
        let record1 = TestRecord {
            id: "item_1".into(),
            value: 42,
        };
        let record2 = TestRecord {
            id: "item_1".into(),
            value: 43,
        };

        assert_ne!(content_hash(&record1), content_hash(&record2));
    }
}
