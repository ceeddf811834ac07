// Checksums for fixed windows and whole buffers, plus the forward match
// scanner used to extend verified windows.
//
// The window checksum only has to be deterministic and well distributed over
// 64 bits. Collisions are expected (repetitive content hashes identically at
// many offsets), so every lookup is verified byte for byte by the matcher.

use xxhash_rust::xxh3::xxh3_64;

/// A deterministic 64-bit checksum over a byte slice.
///
/// The same implementation must be used to build an index and to probe it;
/// `ChecksumIndex` stores its checksum for exactly that reason.
pub trait Checksum {
    /// Checksum of `bytes`.
    fn checksum(&self, bytes: &[u8]) -> u64;
}

/// XXH3-64, the default window and integrity checksum.
#[derive(Debug, Clone, Copy, Default)]
pub struct Xxh3;

impl Checksum for Xxh3 {
    #[inline]
    fn checksum(&self, bytes: &[u8]) -> u64 {
        xxh3_64(bytes)
    }
}

/// Whole-buffer integrity checksum recorded in patch headers.
#[inline]
pub fn buffer_checksum(bytes: &[u8]) -> u64 {
    xxh3_64(bytes)
}

/// Count how many leading bytes of `s1` and `s2` are equal.
///
/// Compares eight bytes at a time, then finishes byte by byte.
pub fn forward_match(s1: &[u8], s2: &[u8]) -> usize {
    let n = s1.len().min(s2.len());
    let mut i = 0;

    let (words1, _) = s1[..n].as_chunks::<8>();
    let (words2, _) = s2[..n].as_chunks::<8>();
    for (a, b) in words1.iter().zip(words2) {
        let xor = u64::from_le_bytes(*a) ^ u64::from_le_bytes(*b);
        if xor != 0 {
            return i + (xor.trailing_zeros() / 8) as usize;
        }
        i += 8;
    }

    while i < n && s1[i] == s2[i] {
        i += 1;
    }
    i
}
