// Patch encoding: match list → op stream → bytes.
//
// Ops are produced by walking the match list with a cursor over the new
// content. Gaps before and after matches become inserts, so the op lengths
// always sum to the new content's size.

use std::io::{self, Write};

use super::header::{Checksums, PatchHeader};
use super::ops::{OffsetWidth, PatchOp};
use crate::hash::matching::MatchList;

// ---------------------------------------------------------------------------
// Op construction
// ---------------------------------------------------------------------------

/// Turn `matches` into the ordered, contiguous op sequence covering `new`.
pub fn build_ops<'a>(new: &'a [u8], matches: &MatchList) -> Vec<PatchOp<'a>> {
    let mut ops = Vec::with_capacity(matches.len() * 2 + 1);
    let mut k = 0usize;

    for block in matches {
        if k < block.new_offset {
            ops.push(PatchOp::Insert {
                data: &new[k..block.new_offset],
            });
        }
        ops.push(PatchOp::Copy {
            old_offset: block.old_offset as u64,
            len: block.len as u64,
        });
        k = block.new_end();
    }

    if k < new.len() {
        ops.push(PatchOp::Insert { data: &new[k..] });
    }
    ops
}

// ---------------------------------------------------------------------------
// Summary
// ---------------------------------------------------------------------------

/// What an encode produced.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PatchSummary {
    pub header: PatchHeader,
    pub insert_ops: u64,
    pub copy_ops: u64,
    /// Bytes carried literally in the stream.
    pub literal_bytes: u64,
    /// Bytes copied from the old content.
    pub copied_bytes: u64,
    /// Total encoded size, header included.
    pub patch_len: u64,
}

// ---------------------------------------------------------------------------
// Stream encoder
// ---------------------------------------------------------------------------

/// Writes a header followed by ops, tracking what was written.
pub struct PatchEncoder<W: Write> {
    writer: W,
    summary: PatchSummary,
}

impl<W: Write> PatchEncoder<W> {
    /// Write `header` and return an encoder ready for ops.
    pub fn new(mut writer: W, header: PatchHeader) -> io::Result<Self> {
        header.encode(&mut writer)?;
        Ok(Self {
            writer,
            summary: PatchSummary {
                header,
                insert_ops: 0,
                copy_ops: 0,
                literal_bytes: 0,
                copied_bytes: 0,
                patch_len: header.encoded_len() as u64,
            },
        })
    }

    /// Append one op.
    pub fn write_op(&mut self, op: &PatchOp<'_>) -> io::Result<()> {
        let width = self.summary.header.offset_width;
        op.encode(&mut self.writer, width)?;
        match op {
            PatchOp::Insert { data } => {
                self.summary.insert_ops += 1;
                self.summary.literal_bytes += data.len() as u64;
            }
            PatchOp::Copy { len, .. } => {
                self.summary.copy_ops += 1;
                self.summary.copied_bytes += len;
            }
        }
        self.summary.patch_len += op.encoded_len(width) as u64;
        Ok(())
    }

    /// Flush and return the writer with the summary.
    pub fn finish(mut self) -> io::Result<(W, PatchSummary)> {
        self.writer.flush()?;
        Ok((self.writer, self.summary))
    }
}

// ---------------------------------------------------------------------------
// One-shot encode
// ---------------------------------------------------------------------------

/// Header options for [`encode_patch`].
#[derive(Debug, Clone, Copy, Default)]
pub struct EncodeParams {
    /// Whole-buffer checksums to record, if integrity checks are enabled.
    pub checksums: Option<Checksums>,
    /// Use 8-byte fields even when every value fits in 4.
    pub wide_offsets: bool,
}

/// Encode the patch turning old content into `new`, given `matches`.
///
/// The offset width is the narrowest that holds every field, unless
/// `wide_offsets` is set.
pub fn encode_patch<W: Write>(
    writer: W,
    new: &[u8],
    matches: &MatchList,
    params: EncodeParams,
) -> io::Result<(W, PatchSummary)> {
    let ops = build_ops(new, matches);

    let max_field = ops.iter().map(PatchOp::max_field).max().unwrap_or(0);
    let offset_width = if params.wide_offsets {
        OffsetWidth::Eight
    } else {
        OffsetWidth::for_max(max_field)
    };

    let header = PatchHeader::new(new.len() as u64, offset_width, params.checksums);
    let mut encoder = PatchEncoder::new(writer, header)?;
    for op in &ops {
        encoder.write_op(op)?;
    }
    let (writer, summary) = encoder.finish()?;

    log::debug!(
        "encoder: {} copies ({} bytes), {} inserts ({} bytes), {}-byte offsets, {} bytes total",
        summary.copy_ops,
        summary.copied_bytes,
        summary.insert_ops,
        summary.literal_bytes,
        offset_width,
        summary.patch_len
    );
    Ok((writer, summary))
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
