//! Shared key generation for upload objects.
//!
//! Key format: `videos/{yyyyMMddHHmmss}_{8 hex}.{ext}`, or
//! `videos/{user_id}/{yyyyMMddHHmmss}_{8 hex}.{ext}` for an authenticated caller.

use chrono::{DateTime, Utc};
use clipgrant_core::constants::UPLOAD_KEY_PREFIX;
use uuid::Uuid;

const KEY_TIMESTAMP_FORMAT: &str = "%Y%m%d%H%M%S";

fn key_prefix(user_id: Option<i64>) -> String {
    match user_id {
        Some(id) => format!("{}/{}", UPLOAD_KEY_PREFIX, id),
        None => UPLOAD_KEY_PREFIX.to_string(),
    }
}

/// Generate a fresh object key for an upload.
///
/// `extension` must already be sanitized. The 8 hex characters come from a v4 UUID, so
/// collisions within the same second are possible in principle but not expected.
pub fn generate_upload_key(user_id: Option<i64>, extension: &str, now: DateTime<Utc>) -> String {
    let timestamp = now.format(KEY_TIMESTAMP_FORMAT);
    let suffix = Uuid::new_v4().simple().to_string();
    format!(
        "{}/{}_{}.{}",
        key_prefix(user_id),
        timestamp,
        &suffix[..8],
        extension
    )
}

/// Map a name supplied to the verify endpoint onto the object key to look up.
///
/// Names already under `videos/` are used as-is; bare names are placed under the
/// caller's prefix.
pub fn resolve_upload_key(blob_name: &str, user_id: Option<i64>) -> String {
    let blob_name = blob_name.trim_start_matches('/');
    if blob_name.starts_with(&format!("{}/", UPLOAD_KEY_PREFIX)) {
        blob_name.to_string()
    } else {
        format!("{}/{}", key_prefix(user_id), blob_name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use regex::Regex;
    use std::collections::HashSet;

    #[test]
    fn test_key_format() {
        let now = Utc.with_ymd_and_hms(2026, 3, 1, 12, 0, 5).unwrap();
        let key = generate_upload_key(None, "mp4", now);
        let pattern = Regex::new(r"^videos/20260301120005_[0-9a-f]{8}\.mp4$").unwrap();
        assert!(pattern.is_match(&key), "{}", key);
    }

    #[test]
    fn test_user_scoped_key_format() {
        let now = Utc.with_ymd_and_hms(2026, 3, 1, 12, 0, 5).unwrap();
        let key = generate_upload_key(Some(42), "mov", now);
        let pattern = Regex::new(r"^videos/42/20260301120005_[0-9a-f]{8}\.mov$").unwrap();
        assert!(pattern.is_match(&key), "{}", key);
    }

    #[test]
    fn test_keys_are_unique_within_one_second() {
        let now = Utc::now();
        let keys: HashSet<String> = (0..1000)
            .map(|_| generate_upload_key(None, "mp4", now))
            .collect();
        assert_eq!(keys.len(), 1000);
    }

    #[test]
    fn test_resolve_keeps_prefixed_names() {
        assert_eq!(
            resolve_upload_key("videos/20260301120005_0a1b2c3d.mp4", None),
            "videos/20260301120005_0a1b2c3d.mp4"
        );
        assert_eq!(
            resolve_upload_key("videos/7/20260301120005_0a1b2c3d.mp4", Some(7)),
            "videos/7/20260301120005_0a1b2c3d.mp4"
        );
    }

    #[test]
    fn test_resolve_prefixes_bare_names() {
        assert_eq!(
            resolve_upload_key("20260301120005_0a1b2c3d.mp4", None),
            "videos/20260301120005_0a1b2c3d.mp4"
        );
        assert_eq!(
            resolve_upload_key("20260301120005_0a1b2c3d.mp4", Some(7)),
            "videos/7/20260301120005_0a1b2c3d.mp4"
        );
    }
}
