use xxhash_rust::xxh3::Xxh3;

const XXH3_SEED: u64 = 0x5c3a_91d2_e04b_7f16;

/// 128-bit content fingerprint.
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, serde::Serialize, serde::Deserialize,
)]
pub struct Fingerprint {
    /// High 64 bits.
    pub hi: u64,
    /// Low 64 bits.
    pub lo: u64,
}

impl Fingerprint {
    /// Fingerprint of a byte slice.
    pub fn of_bytes(bytes: &[u8]) -> Self {
        let mut h = StableHasher::new();
        h.write_u64(bytes.len() as u64);
        h.write_bytes(bytes);
        h.finish()
    }

    /// Short lower-case hex form (first 8 digits), used for readable names.
    pub fn short_hex(self) -> String {
        format!("{:08x}", (self.hi >> 32) as u32)
    }
}

/// Seeded xxh3-128 hasher with little-endian fixed-width writes.
pub(crate) struct StableHasher {
    inner: Xxh3,
}

impl StableHasher {
    pub(crate) fn new() -> Self {
        Self {
            inner: Xxh3::with_seed(XXH3_SEED),
        }
    }

    pub(crate) fn write_bytes(&mut self, b: &[u8]) {
        self.inner.update(b);
    }

    pub(crate) fn write_u32(&mut self, v: u32) {
        self.write_bytes(&v.to_le_bytes());
    }

    pub(crate) fn write_u64(&mut self, v: u64) {
        self.write_bytes(&v.to_le_bytes());
    }

    pub(crate) fn write_str(&mut self, s: &str) {
        self.write_u32(s.len() as u32);
        self.write_bytes(s.as_bytes());
    }

    pub(crate) fn finish(self) -> Fingerprint {
        let v = self.inner.digest128();
        Fingerprint {
            hi: (v >> 64) as u64,
            lo: v as u64,
        }
    }
}

#[cfg(test)]
#[path = "../../tests/unit/foundation/hash.rs"]
mod tests;
