// Block matching against the old content.
//
// Scans the new content one window at a time:
//   1. Checksum the window at the cursor
//   2. Verify candidates from the index in stored order; first identical wins
//   3. Extend the verified window forward byte by byte
//   4. Consume the anchor offset and jump past the match
//   5. Otherwise advance the cursor by one byte
//
// The first-candidate rule does not look for the longest extension among
// colliding candidates. Output is reproducible for a given input pair, not
// necessarily minimal.

use super::checksum::{Checksum, forward_match};
use super::config::MatcherConfig;
use super::index::ChecksumIndex;

// ---------------------------------------------------------------------------
// Match result
// ---------------------------------------------------------------------------

/// A run of bytes shared by the old and new content.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MatchBlock {
    /// Position in the new content where the run starts.
    pub new_offset: usize,
    /// Position in the old content the run is copied from.
    pub old_offset: usize,
    /// Run length, at least the block size.
    pub len: usize,
}

impl MatchBlock {
    /// One past the last new-content byte covered.
    #[inline]
    pub fn new_end(&self) -> usize {
        self.new_offset + self.len
    }
}

/// Matches ordered by `new_offset`, non-overlapping.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MatchList {
    blocks: Vec<MatchBlock>,
}

impl MatchList {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a block starting at or after the end of the previous one.
    pub fn push(&mut self, block: MatchBlock) {
        debug_assert!(
            self.blocks
                .last()
                .is_none_or(|last| last.new_end() <= block.new_offset),
            "match list must advance monotonically"
        );
        self.blocks.push(block);
    }

    pub fn as_slice(&self) -> &[MatchBlock] {
        &self.blocks
    }

    pub fn iter(&self) -> std::slice::Iter<'_, MatchBlock> {
        self.blocks.iter()
    }

    pub fn len(&self) -> usize {
        self.blocks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.blocks.is_empty()
    }

    /// Total bytes covered by matches.
    pub fn matched_bytes(&self) -> u64 {
        self.blocks.iter().map(|b| b.len as u64).sum()
    }
}

impl<'a> IntoIterator for &'a MatchList {
    type Item = &'a MatchBlock;
    type IntoIter = std::slice::Iter<'a, MatchBlock>;

    fn into_iter(self) -> Self::IntoIter {
        self.blocks.iter()
    }
}

// ---------------------------------------------------------------------------
// Match finder
// ---------------------------------------------------------------------------

/// Finds runs of `new` that also occur in `old`.
#[derive(Debug, Clone, Copy, Default)]
pub struct MatchFinder {
    config: MatcherConfig,
}

impl MatchFinder {
    pub fn new(config: MatcherConfig) -> Self {
        Self { config }
    }

    /// Scan `new` against `index`, draining consumed anchors from it.
    ///
    /// `index` must have been built from `old` with this finder's block
    /// size. Never fails: an empty list means every byte is literal.
    pub fn find<C: Checksum>(
        &self,
        old: &[u8],
        new: &[u8],
        index: &mut ChecksumIndex<C>,
    ) -> MatchList {
        let block = self.config.block_size;
        debug_assert_eq!(index.block_size(), block);

        let mut matches = MatchList::new();
        if new.len() < block {
            return matches;
        }

        let mut k = 0usize;
        while k + block <= new.len() {
            let window = &new[k..k + block];
            let cksum = index.checksum_of(window);

            let hit = index
                .candidates(cksum)
                .enumerate()
                .find(|&(_, i)| old.get(i..i + block) == Some(window));

            let Some((slot, i)) = hit else {
                k += 1;
                continue;
            };

            let len = block + forward_match(&old[i + block..], &new[k + block..]);
            log::trace!("match: new {k} old {i} len {len}");
            matches.push(MatchBlock {
                new_offset: k,
                old_offset: i,
                len,
            });

            index.consume_slot(cksum, slot);
            k += len;
        }

        log::debug!(
            "matcher: {} matches covering {} of {} bytes",
            matches.len(),
            matches.matched_bytes(),
            new.len()
        );
        matches
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
