// Delta engine: ties block matching to the patch codec.
//
// Provides high-level diff/apply APIs that orchestrate:
//   - Checksum indexing of the old content
//   - Block matching of the new content against that index
//   - Patch encoding of the resulting match list
//   - Patch application against the old content
//
// Every invocation owns its own index and match list, so independent file
// pairs can be diffed concurrently.

use crate::error::{Error, Result};
use crate::hash::checksum::buffer_checksum;
use crate::hash::config::{DEFAULT_BLOCK_SIZE, MatcherConfig};
use crate::hash::index::ChecksumIndex;
use crate::hash::matching::MatchFinder;
use crate::patch::decoder::PatchApplier;
use crate::patch::encoder::{EncodeParams, PatchSummary, encode_patch};
use crate::patch::header::Checksums;
use crate::patch::ops::OffsetWidth;

// ---------------------------------------------------------------------------
// Options
// ---------------------------------------------------------------------------

/// Configuration for patch creation.
#[derive(Debug, Clone)]
pub struct DiffOptions {
    /// Fixed window length for indexing and match anchoring.
    pub block_size: usize,
    /// Record old/new checksums so apply can detect a wrong base or a
    /// corrupted result.
    pub checksums: bool,
    /// Always write 8-byte offset fields.
    pub wide_offsets: bool,
}

impl Default for DiffOptions {
    fn default() -> Self {
        Self {
            block_size: DEFAULT_BLOCK_SIZE,
            checksums: true,
            wide_offsets: false,
        }
    }
}

/// Configuration for patch application.
#[derive(Debug, Clone)]
pub struct ApplyOptions {
    /// Accept only this offset width. `None` accepts both.
    pub offset_width: Option<OffsetWidth>,
    /// Verify recorded base and result checksums.
    pub verify_checksums: bool,
}

impl Default for ApplyOptions {
    fn default() -> Self {
        Self {
            offset_width: None,
            verify_checksums: true,
        }
    }
}

// ---------------------------------------------------------------------------
// High-level diff
// ---------------------------------------------------------------------------

/// Compute the patch turning `old` into `new`.
pub fn diff(old: &[u8], new: &[u8]) -> Result<Vec<u8>> {
    let mut patch = Vec::new();
    diff_with_options(old, new, &mut patch, &DiffOptions::default())?;
    Ok(patch)
}

/// Compute the patch turning `old` into `new`, appending it to `output`.
///
/// Both inputs must be at least one block long.
pub fn diff_with_options(
    old: &[u8],
    new: &[u8],
    output: &mut Vec<u8>,
    opts: &DiffOptions,
) -> Result<PatchSummary> {
    let config = MatcherConfig::new(opts.block_size);
    check_size("old input", old, config.block_size)?;
    check_size("new input", new, config.block_size)?;

    log::info!("pass 1: indexing {} bytes of old content", old.len());
    let mut index = ChecksumIndex::build(old, config.block_size);

    log::info!("pass 2: matching {} bytes of new content", new.len());
    let matches = MatchFinder::new(config).find(old, new, &mut index);

    log::info!(
        "pass 3: encoding {} matches ({} bytes to copy)",
        matches.len(),
        matches.matched_bytes()
    );
    let params = EncodeParams {
        checksums: opts.checksums.then(|| Checksums {
            old: buffer_checksum(old),
            new: buffer_checksum(new),
        }),
        wide_offsets: opts.wide_offsets,
    };
    let (_, summary) = encode_patch(output, new, &matches, params)?;
    Ok(summary)
}

fn check_size(name: &str, data: &[u8], block_size: usize) -> Result<()> {
    if data.len() < block_size {
        return Err(Error::FileTooSmall {
            name: name.to_string(),
            size: data.len() as u64,
            min: block_size as u64,
        });
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// High-level apply
// ---------------------------------------------------------------------------

/// Reconstruct new content from `old` and `patch`.
pub fn apply(old: &[u8], patch: &[u8]) -> Result<Vec<u8>> {
    apply_with_options(old, patch, &ApplyOptions::default())
}

/// Apply with custom options.
pub fn apply_with_options(old: &[u8], patch: &[u8], opts: &ApplyOptions) -> Result<Vec<u8>> {
    PatchApplier::new()
        .with_offset_width(opts.offset_width)
        .with_checksums(opts.verify_checksums)
        .apply(old, patch)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
