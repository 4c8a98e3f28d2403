use pvl_types::EntryHash;

/// Domain-separated BLAKE3 content hasher.
///
/// Each hasher carries a domain tag (e.g. `"pvl-entry-v1"`) that is prepended
/// to every hash computation, so the same bytes hashed for different purposes
/// never produce the same digest.
pub struct ContentHasher {
    domain: &'static str,
}

impl ContentHasher {
    /// Hasher for ledger entries.
    pub const ENTRY: Self = Self {
        domain: "pvl-entry-v1",
    };

    /// Hash raw bytes with domain separation.
    pub fn hash(&self, data: &[u8]) -> EntryHash {
        let mut hasher = blake3::Hasher::new();
        hasher.update(self.domain.as_bytes());
        hasher.update(b":");
        hasher.update(data);
        EntryHash::from_bytes(*hasher.finalize().as_bytes())
    }

    /// Verify that data produces the expected digest.
    pub fn verify(&self, data: &[u8], expected: &EntryHash) -> bool {
        self.hash(data) == *expected
    }
}
