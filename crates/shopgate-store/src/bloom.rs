//! Bit-position derivation for the replay Bloom filter.
//!
//! Both backends store the filter as a flat bitmap; the k bit positions
//! for a jti are derived here so the Redis Lua script only tests and
//! sets offsets it is handed, and both backends agree on placement.

use sha2::{Digest, Sha256};

/// Derive `hash_count` bit positions in `[0, filter_bits)` for a jti.
///
/// Uses Kirsch-Mitzenmacher double hashing over a single SHA-256 digest:
/// position_i = (h1 + i * h2) mod m, with h1 and h2 taken from the first
/// two 64-bit halves of the digest.
pub fn bit_positions(jti: &str, filter_bits: u64, hash_count: u32) -> Vec<u64> {
    let digest = Sha256::digest(jti.as_bytes());
    let h1 = u64::from_be_bytes(digest[0..8].try_into().expect("digest is 32 bytes"));
    let h2 = u64::from_be_bytes(digest[8..16].try_into().expect("digest is 32 bytes"));

    // h2 must be odd so the probe sequence cycles through the bitmap.
    let h2 = h2 | 1;

    (0..hash_count as u64)
        .map(|i| h1.wrapping_add(i.wrapping_mul(h2)) % filter_bits)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn positions_are_deterministic() {
        let a = bit_positions("jti-1", 1 << 20, 7);
        let b = bit_positions("jti-1", 1 << 20, 7);
        assert_eq!(a, b);
        assert_eq!(a.len(), 7);
    }

    #[test]
    fn positions_stay_in_range() {
        for p in bit_positions("another-jti", 1024, 11) {
            assert!(p < 1024);
        }
    }

    #[test]
    fn distinct_keys_differ() {
        let a = bit_positions("jti-a", 1 << 20, 7);
        let b = bit_positions("jti-b", 1 << 20, 7);
        assert_ne!(a, b);
    }
}
