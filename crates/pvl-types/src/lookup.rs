use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::TypeError;
use crate::ids::BatchId;

const MAX_SLUG_LEN: usize = 24;
const MAX_KEY_LEN: usize = 64;
const SUFFIX_BYTES: usize = 6;

/// Public, shareable key for finding a batch.
///
/// Keys look like `ORGANIC-TOMATOES-3f9a1c2b7d4e`: a slug of the batch name
/// followed by 12 hex characters derived from the batch id. They are what a
/// lookup-key renderer turns into a scannable image, and the only handle
/// non-owning parties need.
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct LookupKey(String);

impl LookupKey {
    /// Derive a key from a batch's identity.
    ///
    /// `attempt` salts the suffix so a caller can retry after a collision;
    /// the same inputs always yield the same key.
    pub fn derive(batch: &BatchId, name: &str, attempt: u32) -> Self {
        let mut hasher = blake3::Hasher::new();
        hasher.update(b"pvl-lookup-v1:");
        hasher.update(batch.as_bytes());
        hasher.update(&attempt.to_le_bytes());
        let digest = hasher.finalize();
        let suffix = hex::encode(&digest.as_bytes()[..SUFFIX_BYTES]);
        Self(format!("{}-{suffix}", slugify(name)))
    }

    /// Parse and normalise a key supplied by a caller.
    pub fn parse(s: &str) -> Result<Self, TypeError> {
        let trimmed = s.trim();
        if trimmed.is_empty() || trimmed.len() > MAX_KEY_LEN {
            return Err(TypeError::InvalidLookupKey(format!(
                "length must be 1..={MAX_KEY_LEN}"
            )));
        }
        if !trimmed
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
        {
            return Err(TypeError::InvalidLookupKey(format!(
                "unexpected character in {trimmed:?}"
            )));
        }
        if trimmed.starts_with('-') || trimmed.ends_with('-') {
            return Err(TypeError::InvalidLookupKey(
                "must not start or end with '-'".into(),
            ));
        }
        Ok(Self(normalise(trimmed)))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// Upper-cases the slug and lower-cases the hex suffix.
fn normalise(key: &str) -> String {
    match key.rsplit_once('-') {
        Some((slug, suffix)) => format!(
            "{}-{}",
            slug.to_ascii_uppercase(),
            suffix.to_ascii_lowercase()
        ),
        None => key.to_ascii_uppercase(),
    }
}

fn slugify(name: &str) -> String {
    let mut slug = String::with_capacity(MAX_SLUG_LEN);
    let mut pending_dash = false;
    for c in name.chars() {
        if c.is_ascii_alphanumeric() {
            if pending_dash && !slug.is_empty() {
                slug.push('-');
            }
            pending_dash = false;
            slug.push(c.to_ascii_uppercase());
        } else {
            pending_dash = true;
        }
        if slug.len() >= MAX_SLUG_LEN {
            break;
        }
    }
    let slug = slug.trim_end_matches('-');
    if slug.is_empty() {
        "BATCH".to_string()
    } else {
        slug.to_string()
    }
}

impl fmt::Debug for LookupKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "LookupKey({})", self.0)
    }
}

impl fmt::Display for LookupKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for LookupKey {
    type Err = TypeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TryFrom<String> for LookupKey {
    type Error = TypeError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<LookupKey> for String {
    fn from(key: LookupKey) -> Self {
        key.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn derive_is_deterministic() {
        let id = BatchId::new();
        assert_eq!(
            LookupKey::derive(&id, "Organic Tomatoes", 0),
            LookupKey::derive(&id, "Organic Tomatoes", 0)
        );
    }

    #[test]
    fn attempt_changes_suffix() {
        let id = BatchId::new();
        assert_ne!(
            LookupKey::derive(&id, "Tomatoes", 0),
            LookupKey::derive(&id, "Tomatoes", 1)
        );
    }

    #[test]
    fn slug_shape() {
        let id = BatchId::new();
        let key = LookupKey::derive(&id, "  Organic   tomatoes (grade A) ", 0);
        let (slug, suffix) = key.as_str().rsplit_once('-').unwrap();
        assert_eq!(slug, "ORGANIC-TOMATOES-GRADE-A");
        assert_eq!(suffix.len(), 12);
    }

    #[test]
    fn empty_name_falls_back() {
        let key = LookupKey::derive(&BatchId::new(), "***", 0);
        assert!(key.as_str().starts_with("BATCH-"));
    }

    #[test]
    fn long_names_are_truncated() {
        let key = LookupKey::derive(&BatchId::new(), &"x".repeat(200), 0);
        assert!(key.as_str().len() <= MAX_SLUG_LEN + 13);
    }

    #[test]
    fn derived_keys_parse_back_unchanged() {
        let key = LookupKey::derive(&BatchId::new(), "Basil", 3);
        assert_eq!(LookupKey::parse(key.as_str()).unwrap(), key);
    }

    #[test]
    fn parse_normalises_case() {
        let key = LookupKey::parse("basil-ABCDEF012345").unwrap();
        assert_eq!(key.as_str(), "BASIL-abcdef012345");
    }

    #[test]
    fn parse_rejects_bad_input() {
        assert!(LookupKey::parse("").is_err());
        assert!(LookupKey::parse("has space").is_err());
        assert!(LookupKey::parse("-LEADING").is_err());
        assert!(LookupKey::parse(&"A".repeat(65)).is_err());
    }

    #[test]
    fn serde_validates() {
        let ok: LookupKey = serde_json::from_str("\"BASIL-0a0b0c0d0e0f\"").unwrap();
        assert_eq!(ok.as_str(), "BASIL-0a0b0c0d0e0f");
        assert!(serde_json::from_str::<LookupKey>("\"not valid!\"").is_err());
    }
}
