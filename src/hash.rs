use std::hash::{BuildHasher, Hasher};

const OFFSET_BASIS: u64 = 14695981039346656037;
const PRIME: u64 = 1099511628211;

/// 64-bit FNV digest of a station name: multiply by the prime, then xor in
/// the byte.
#[inline]
pub fn fnv1a(bytes: &[u8]) -> u64 {
    fnv_continue(OFFSET_BASIS, bytes)
}

#[inline]
fn fnv_continue(mut hash: u64, bytes: &[u8]) -> u64 {
    for &byte in bytes {
        hash = hash.wrapping_mul(PRIME);
        hash ^= byte as u64;
    }
    hash
}

/// `Hasher` over the same accumulation as [`fnv1a`]. A key that feeds its
/// bytes through a single `write` call hashes to exactly `fnv1a(bytes)`,
/// which lets the grouping maps reuse a precomputed digest on rehash.
#[derive(Debug, Clone, Copy)]
pub struct FnvHasher(u64);

impl Default for FnvHasher {
    fn default() -> Self {
        FnvHasher(OFFSET_BASIS)
    }
}

impl Hasher for FnvHasher {
    #[inline]
    fn finish(&self) -> u64 {
        self.0
    }

    #[inline]
    fn write(&mut self, bytes: &[u8]) {
        self.0 = fnv_continue(self.0, bytes);
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct FnvBuildHasher;

impl BuildHasher for FnvBuildHasher {
    type Hasher = FnvHasher;

    #[inline]
    fn build_hasher(&self) -> FnvHasher {
        FnvHasher::default()
    }
}
