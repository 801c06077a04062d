use sha2::{Digest, Sha256};

/// Incremental SHA-256 content fingerprint over tagged sections.
///
/// Each section is prefixed with its tag and length so that moving bytes
/// between adjacent sections changes the digest.
pub(crate) struct Fingerprint {
    hasher: Sha256,
}

impl Fingerprint {
    pub(crate) fn new(domain: &str) -> Self {
        let mut hasher = Sha256::new();
        hasher.update(domain.as_bytes());
        Self { hasher }
    }

    pub(crate) fn bytes(&mut self, tag: &str, bytes: &[u8]) -> &mut Self {
        self.hasher.update(tag.as_bytes());
        self.hasher.update((bytes.len() as u64).to_le_bytes());
        self.hasher.update(bytes);
        self
    }

    pub(crate) fn floats(&mut self, tag: &str, values: &[f64]) -> &mut Self {
        self.hasher.update(tag.as_bytes());
        self.hasher.update((values.len() as u64).to_le_bytes());
        for value in values {
            self.hasher.update(value.to_le_bytes());
        }
        self
    }

    pub(crate) fn finish(self) -> String {
        hex::encode(self.hasher.finalize())
    }
}

/// SHA-256 of a byte slice, hex encoded.
pub(crate) fn sha256_bytes(bytes: &[u8]) -> String {
    hex::encode(Sha256::digest(bytes))
}
