// Checksum index over the old content.
//
// Maps the checksum of every full `B`-byte window of the old buffer to the
// ascending list of offsets producing it. Buckets routinely hold many
// offsets: runs of a single byte value all hash alike. Offsets are removed
// as they are consumed by matches, so a source region anchors at most one
// copy operation.

use std::collections::VecDeque;

use rustc_hash::FxHashMap;

use super::checksum::{Checksum, Xxh3};

/// Checksum → ascending old offsets, for one diff invocation.
///
/// Buckets are `VecDeque`s: the first candidate usually wins, so the common
/// removal is from the front.
pub struct ChecksumIndex<C: Checksum = Xxh3> {
    buckets: FxHashMap<u64, VecDeque<usize>>,
    block_size: usize,
    checksum: C,
    entries: usize,
}

impl ChecksumIndex<Xxh3> {
    /// Index `old` with the default XXH3 checksum.
    pub fn build(old: &[u8], block_size: usize) -> Self {
        Self::build_with(old, block_size, Xxh3)
    }
}

impl<C: Checksum> ChecksumIndex<C> {
    /// Index every full window `old[i..i + block_size]`, `i` ascending.
    ///
    /// A buffer shorter than `block_size` yields an empty index.
    pub fn build_with(old: &[u8], block_size: usize, checksum: C) -> Self {
        debug_assert!(block_size > 0);
        let mut buckets: FxHashMap<u64, VecDeque<usize>> = FxHashMap::default();
        let mut entries = 0usize;

        // Inclusive of the last full window at `old.len() - block_size`.
        for (i, window) in old.windows(block_size).enumerate() {
            buckets
                .entry(checksum.checksum(window))
                .or_default()
                .push_back(i);
            entries += 1;
        }

        log::debug!(
            "index: {entries} windows of {block_size} bytes in {} buckets",
            buckets.len()
        );

        Self {
            buckets,
            block_size,
            checksum,
            entries,
        }
    }

    /// Checksum of a probe window, using the index's own checksum.
    #[inline]
    pub fn checksum_of(&self, window: &[u8]) -> u64 {
        self.checksum.checksum(window)
    }

    /// Candidate offsets for `cksum`, in stored (ascending) order.
    pub fn candidates(&self, cksum: u64) -> impl Iterator<Item = usize> + '_ {
        self.buckets
            .get(&cksum)
            .into_iter()
            .flat_map(|bucket| bucket.iter().copied())
    }

    /// Remove `offset` from the bucket for `cksum`.
    ///
    /// Returns `false` if the offset was not indexed under that checksum.
    pub fn consume(&mut self, cksum: u64, offset: usize) -> bool {
        let Some(slot) = self
            .buckets
            .get(&cksum)
            .and_then(|bucket| bucket.iter().position(|&o| o == offset))
        else {
            return false;
        };
        self.consume_slot(cksum, slot).is_some()
    }

    /// Remove the entry at position `slot` of the bucket for `cksum`.
    ///
    /// The matcher already knows the slot from its candidate scan, so this
    /// avoids a second search. Drops the bucket once it is empty.
    pub fn consume_slot(&mut self, cksum: u64, slot: usize) -> Option<usize> {
        let bucket = self.buckets.get_mut(&cksum)?;
        let offset = bucket.remove(slot)?;
        if bucket.is_empty() {
            self.buckets.remove(&cksum);
        }
        self.entries -= 1;
        Some(offset)
    }

    /// Window length this index was built with.
    pub fn block_size(&self) -> usize {
        self.block_size
    }

    /// Number of offsets still indexed.
    pub fn len(&self) -> usize {
        self.entries
    }

    /// Whether no offsets remain.
    pub fn is_empty(&self) -> bool {
        self.entries == 0
    }

    /// Number of distinct checksums still indexed.
    pub fn bucket_count(&self) -> usize {
        self.buckets.len()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    /// Checksum that sends every window to the same bucket.
    struct Constant;

    impl Checksum for Constant {
        fn checksum(&self, _bytes: &[u8]) -> u64 {
            42
        }
    }

    #[test]
    fn every_full_window_is_indexed() {
        let old: Vec<u8> = (0..40u8).collect();
        let index = ChecksumIndex::build(&old, 16);
        assert_eq!(index.len(), 40 - 16 + 1);

        let last = index.checksum_of(&old[24..40]);
        assert_eq!(index.candidates(last).collect::<Vec<_>>(), vec![24]);
    }

    #[test]
    fn buffer_shorter_than_block_yields_empty_index() {
        let index = ChecksumIndex::build(b"short", 16);
        assert!(index.is_empty());
        assert_eq!(index.bucket_count(), 0);
    }

    #[test]
    fn repeated_content_shares_one_bucket_in_ascending_order() {
        let old = vec![0u8; 20];
        let index = ChecksumIndex::build(&old, 16);
        let cksum = index.checksum_of(&old[..16]);
        assert_eq!(index.bucket_count(), 1);
        assert_eq!(
            index.candidates(cksum).collect::<Vec<_>>(),
            vec![0, 1, 2, 3, 4]
        );
    }

    #[test]
    fn collisions_keep_insertion_order() {
        let old: Vec<u8> = (0..8u8).collect();
        let index = ChecksumIndex::build_with(&old, 4, Constant);
        assert_eq!(
            index.candidates(42).collect::<Vec<_>>(),
            vec![0, 1, 2, 3, 4]
        );
    }

    #[test]
    fn consume_removes_exactly_one_offset() {
        let old = vec![9u8; 19];
        let mut index = ChecksumIndex::build(&old, 16);
        let cksum = index.checksum_of(&old[..16]);

        assert!(index.consume(cksum, 2));
        assert!(!index.consume(cksum, 2));
        assert_eq!(index.candidates(cksum).collect::<Vec<_>>(), vec![0, 1, 3]);
        assert_eq!(index.len(), 3);
    }

    #[test]
    fn empty_bucket_is_dropped() {
        let old: Vec<u8> = (0..16u8).collect();
        let mut index = ChecksumIndex::build(&old, 16);
        let cksum = index.checksum_of(&old);

        assert_eq!(index.consume_slot(cksum, 0), Some(0));
        assert_eq!(index.bucket_count(), 0);
        assert!(index.is_empty());
        assert_eq!(index.candidates(cksum).count(), 0);
        assert_eq!(index.consume_slot(cksum, 0), None);
    }

    #[test]
    fn unknown_checksum_has_no_candidates() {
        let index = ChecksumIndex::build(&[1u8; 32], 16);
        assert_eq!(index.candidates(0xDEAD_BEEF).count(), 0);
    }
}
