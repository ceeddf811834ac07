// Patch application.
//
// Follows a fixed state progression: read the header, validate it against
// this consumer and the supplied old content, replay ops until exactly
// `target_size` bytes are produced, then verify the result.
//
// `PatchReader` owns the stream-level rules (truncation, overrun) so that
// inspecting a patch and applying it see the same op sequence. The applier
// adds the old-buffer rules (bounds, base and result checksums).

use super::header::PatchHeader;
use super::ops::{OffsetWidth, PatchOp, TAG_COPY, TAG_INSERT};
use crate::error::{Error, FormatError, Result};
use crate::hash::checksum::buffer_checksum;

/// Upper bound on the output buffer reserved up front. The header's
/// `target_size` is untrusted until the ops back it up.
const MAX_PREALLOC: u64 = 1 << 26; // 64 MiB

// ---------------------------------------------------------------------------
// PatchReader
// ---------------------------------------------------------------------------

/// Sequential, zero-copy reader over an in-memory patch stream.
#[derive(Debug, Clone)]
pub struct PatchReader<'a> {
    data: &'a [u8],
    pos: usize,
    header: PatchHeader,
    produced: u64,
}

impl<'a> PatchReader<'a> {
    /// Parse the header at the front of `data`.
    pub fn new(data: &'a [u8]) -> Result<Self> {
        let (header, header_len) = PatchHeader::decode(data)?;
        Ok(Self {
            data,
            pos: header_len,
            header,
            produced: 0,
        })
    }

    pub fn header(&self) -> &PatchHeader {
        &self.header
    }

    /// Output bytes accounted for by the ops read so far.
    pub fn produced(&self) -> u64 {
        self.produced
    }

    /// Current position in the stream.
    pub fn stream_offset(&self) -> usize {
        self.pos
    }

    /// Bytes left in the stream after the current position.
    pub fn remaining(&self) -> usize {
        self.data.len() - self.pos
    }

    /// Read the next op, or `None` once `target_size` bytes are covered.
    ///
    /// Fails with `TruncatedPatch` if the stream ends first and with
    /// `Overrun` if an op would pass `target_size`.
    pub fn next_op(&mut self) -> Result<Option<PatchOp<'a>>> {
        let target_size = self.header.target_size;
        if self.produced == target_size {
            return Ok(None);
        }

        let op_start = self.pos;
        let tag = *self
            .data
            .get(self.pos)
            .ok_or_else(|| self.truncated())?;
        self.pos += 1;

        let op = match tag {
            TAG_INSERT => {
                let len = self.read_field()?;
                self.check_overrun(len)?;
                let stream: &'a [u8] = self.data;
                let start = self.pos;
                let data = usize::try_from(len)
                    .ok()
                    .and_then(|n| stream.get(start..start.checked_add(n)?))
                    .ok_or_else(|| self.truncated())?;
                self.pos += data.len();
                PatchOp::Insert { data }
            }
            TAG_COPY => {
                let old_offset = self.read_field()?;
                let len = self.read_field()?;
                self.check_overrun(len)?;
                PatchOp::Copy { old_offset, len }
            }
            tag => {
                return Err(FormatError::UnknownOpTag {
                    tag,
                    stream_offset: op_start,
                }
                .into());
            }
        };

        self.produced += op.len();
        Ok(Some(op))
    }

    fn read_field(&mut self) -> Result<u64> {
        let width = self.header.offset_width;
        let value = width
            .read_field(&self.data[self.pos..])
            .ok_or_else(|| self.truncated())?;
        self.pos += width.bytes() as usize;
        Ok(value)
    }

    fn check_overrun(&self, len: u64) -> Result<()> {
        let target_size = self.header.target_size;
        if len > target_size - self.produced {
            return Err(Error::Overrun {
                len,
                produced: self.produced,
                target_size,
            });
        }
        Ok(())
    }

    fn truncated(&self) -> Error {
        Error::TruncatedPatch {
            stream_offset: self.data.len(),
            produced: self.produced,
            target_size: self.header.target_size,
        }
    }
}

// ---------------------------------------------------------------------------
// PatchApplier
// ---------------------------------------------------------------------------

/// Reconstructs new content from old content and a patch stream.
#[derive(Debug, Clone, Copy)]
pub struct PatchApplier {
    accepted_width: Option<OffsetWidth>,
    verify_checksums: bool,
}

impl Default for PatchApplier {
    fn default() -> Self {
        Self {
            accepted_width: None,
            verify_checksums: true,
        }
    }
}

impl PatchApplier {
    /// An applier accepting both offset widths and verifying checksums.
    pub fn new() -> Self {
        Self::default()
    }

    /// Accept only patches written with `width`. `None` accepts both.
    pub fn with_offset_width(mut self, width: Option<OffsetWidth>) -> Self {
        self.accepted_width = width;
        self
    }

    /// Enable or disable base and result checksum verification.
    pub fn with_checksums(mut self, verify: bool) -> Self {
        self.verify_checksums = verify;
        self
    }

    /// Apply `patch` to `old`, returning the reconstructed content.
    pub fn apply(&self, old: &[u8], patch: &[u8]) -> Result<Vec<u8>> {
        // ReadHeader
        let mut reader = PatchReader::new(patch)?;
        let header = *reader.header();

        // Validate
        self.validate(&header, old)?;

        // Replay
        let mut out = Vec::with_capacity(header.target_size.min(MAX_PREALLOC) as usize);
        let old_size = old.len() as u64;
        let mut ops = 0u64;
        while let Some(op) = reader.next_op()? {
            match op {
                PatchOp::Insert { data } => out.extend_from_slice(data),
                PatchOp::Copy { old_offset, len } => {
                    let src = old_offset
                        .checked_add(len)
                        .filter(|&end| end <= old_size)
                        .map(|end| &old[old_offset as usize..end as usize])
                        .ok_or(Error::Bounds {
                            old_offset,
                            len,
                            old_size,
                        })?;
                    out.extend_from_slice(src);
                }
            }
            ops += 1;
        }

        if reader.remaining() > 0 {
            log::warn!(
                "ignoring {} trailing bytes after the last op",
                reader.remaining()
            );
        }

        // Done
        if self.verify_checksums
            && let Some(sums) = header.checksums
        {
            let actual = buffer_checksum(&out);
            if actual != sums.new {
                return Err(Error::Corruption {
                    expected: sums.new,
                    actual,
                });
            }
        }

        log::debug!("applier: {ops} ops, {} bytes", out.len());
        Ok(out)
    }

    fn validate(&self, header: &PatchHeader, old: &[u8]) -> Result<()> {
        if let Some(accepted) = self.accepted_width
            && header.offset_width != accepted
        {
            return Err(FormatError::OffsetWidthMismatch {
                found: header.offset_width,
                accepted,
            }
            .into());
        }

        if self.verify_checksums
            && let Some(sums) = header.checksums
        {
            let actual = buffer_checksum(old);
            if actual != sums.old {
                return Err(Error::BaseMismatch {
                    expected: sums.old,
                    actual,
                });
            }
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Convenience function
// ---------------------------------------------------------------------------

/// Apply a patch held in memory with default settings.
pub fn apply_memory(old: &[u8], patch: &[u8]) -> Result<Vec<u8>> {
    PatchApplier::new().apply(old, patch)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
