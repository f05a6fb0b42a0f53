//! Structural fingerprints for optimistic concurrency.
//!
//! A [`VersionHash`] covers the document path, the slide count and the
//! ordered slide identifiers. It changes when slides are added, removed,
//! reordered or replaced, and it does **not** change for edits inside a
//! slide (text, shapes, notes). Callers that need to detect those must pair
//! it with their own content hash.

use std::fmt;
use std::path::Path;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use thiserror::Error;

use crate::model::{Document, SlideId};

const DOMAIN_TAG: &[u8] = b"deckwright-version-v1";
const HEX_LEN: usize = 64;

/// Error returned when parsing a version string.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("'{0}' is not a version hash; expected 64 lowercase hex digits")]
pub struct InvalidVersionHash(pub String);

/// Fixed-length structural digest of a document.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct VersionHash(String);

impl VersionHash {
    /// Hashes the structural identity of a document stored at `path`.
    #[must_use]
    pub fn compute(path: &Path, slide_ids: &[SlideId]) -> Self {
        let mut hasher = Sha256::new();
        hasher.update(DOMAIN_TAG);
        hasher.update([0]);
        hasher.update(path.as_os_str().as_encoded_bytes());
        hasher.update([0]);
        hasher.update((slide_ids.len() as u64).to_le_bytes());
        for id in slide_ids {
            hasher.update(id.get().to_le_bytes());
        }
        let digest = hasher.finalize();
        let mut hex = String::with_capacity(HEX_LEN);
        for byte in digest {
            hex.push_str(&format!("{byte:02x}"));
        }
        Self(hex)
    }

    /// Hashes `document` as stored at `path`.
    #[must_use]
    pub fn of(path: &Path, document: &Document) -> Self {
        Self::compute(path, &document.slide_ids())
    }

    /// Hex rendering.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl FromStr for VersionHash {
    type Err = InvalidVersionHash;

    fn from_str(input: &str) -> Result<Self, Self::Err> {
        let trimmed = input.trim();
        let valid = trimmed.len() == HEX_LEN
            && trimmed
                .chars()
                .all(|c| c.is_ascii_digit() || ('a'..='f').contains(&c));
        if valid {
            Ok(Self(trimmed.to_owned()))
        } else {
            Err(InvalidVersionHash(input.to_owned()))
        }
    }
}

impl TryFrom<String> for VersionHash {
    type Error = InvalidVersionHash;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<VersionHash> for String {
    fn from(value: VersionHash) -> Self {
        value.0
    }
}

impl fmt::Display for VersionHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[cfg(test)]
mod tests {
    use proptest::prelude::*;

    use super::*;

    fn ids(raw: &[u32]) -> Vec<SlideId> {
        raw.iter().copied().map(SlideId::new).collect()
    }

    #[test]
    fn digest_is_fixed_length_lowercase_hex() {
        let hash = VersionHash::compute(Path::new("/decks/a.json"), &ids(&[256, 257]));
        assert_eq!(hash.as_str().len(), 64);
        assert_eq!(hash.as_str().parse::<VersionHash>(), Ok(hash.clone()));
    }

    #[test]
    fn slide_order_changes_the_hash() {
        let path = Path::new("/decks/a.json");
        assert_ne!(
            VersionHash::compute(path, &ids(&[256, 257, 258])),
            VersionHash::compute(path, &ids(&[257, 256, 258]))
        );
    }

    #[test]
    fn path_participates_in_the_hash() {
        let slides = ids(&[256]);
        assert_ne!(
            VersionHash::compute(Path::new("/decks/a.json"), &slides),
            VersionHash::compute(Path::new("/decks/b.json"), &slides)
        );
    }

    #[test]
    fn rejects_malformed_versions() {
        assert!("abc".parse::<VersionHash>().is_err());
        assert!("Z".repeat(64).parse::<VersionHash>().is_err());
        assert!("A".repeat(64).parse::<VersionHash>().is_err());
    }

    proptest! {
        #[test]
        fn identical_inputs_hash_identically(raw in prop::collection::vec(256_u32..10_000, 0..12)) {
            let path = Path::new("/decks/p.json");
            prop_assert_eq!(
                VersionHash::compute(path, &ids(&raw)),
                VersionHash::compute(path, &ids(&raw))
            );
        }

        #[test]
        fn hash_changes_iff_identity_sequence_changes(
            a in prop::collection::vec(256_u32..300, 0..6),
            b in prop::collection::vec(256_u32..300, 0..6),
        ) {
            let path = Path::new("/decks/p.json");
            let same = VersionHash::compute(path, &ids(&a)) == VersionHash::compute(path, &ids(&b));
            prop_assert_eq!(same, a == b);
        }
    }
}
