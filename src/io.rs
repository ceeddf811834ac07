// File-level helpers for diffing and patching.
//
// Provides `diff_file()` and `apply_file()` convenience functions that load
// both inputs fully into memory, run the in-memory engine, and write the
// result atomically: output goes to a temporary file in the destination
// directory and is only renamed into place once it is complete. Optionally
// computes SHA-256 digests (feature-gated behind `file-io`).

use std::fs::File;
use std::io::{BufWriter, Read, Write};
use std::path::Path;

#[cfg(feature = "file-io")]
use sha2::Digest;

use crate::compress::backend::{Compression, compress_patch, decompress_patch};
use crate::engine::{self, ApplyOptions, DiffOptions};
use crate::error::{Error, Result};
use crate::hash::config::MatcherConfig;
use crate::patch::header::PatchHeader;
use crate::patch::ops::OffsetWidth;

const BUF_SIZE: usize = 64 * 1024; // 64 KiB

// ---------------------------------------------------------------------------
// Stats
// ---------------------------------------------------------------------------

/// Statistics returned by `diff_file()`.
#[derive(Debug, Clone)]
pub struct DiffStats {
    /// Old file size in bytes.
    pub old_size: u64,
    /// New file size in bytes.
    pub new_size: u64,
    /// Patch stream size before compression.
    pub raw_patch_size: u64,
    /// Patch file size as written.
    pub patch_size: u64,
    /// Compressor actually used ("none" if compression did not help).
    pub compression: &'static str,
    pub offset_width: OffsetWidth,
    pub copy_ops: u64,
    pub insert_ops: u64,
    /// Bytes reproduced by copying from the old file.
    pub copied_bytes: u64,
    /// Bytes carried literally in the patch.
    pub literal_bytes: u64,
    /// SHA-256 of the old file (if `file-io` feature is enabled).
    pub old_sha256: Option<[u8; 32]>,
    /// SHA-256 of the new file (if `file-io` feature is enabled).
    pub new_sha256: Option<[u8; 32]>,
}

/// Statistics returned by `apply_file()`.
#[derive(Debug, Clone)]
pub struct ApplyStats {
    /// Old file size in bytes.
    pub old_size: u64,
    /// Patch file size in bytes.
    pub patch_size: u64,
    /// Reconstructed output size in bytes.
    pub output_size: u64,
    pub offset_width: OffsetWidth,
    /// Whether the patch carried checksums that were verified.
    pub verified: bool,
    /// SHA-256 of the reconstructed output (if `file-io` feature is enabled).
    pub output_sha256: Option<[u8; 32]>,
}

// ---------------------------------------------------------------------------
// Loading
// ---------------------------------------------------------------------------

/// Read a whole file into memory, requiring at least `min_size` bytes.
pub fn load_file(path: &Path, min_size: u64) -> Result<Vec<u8>> {
    let mut file = File::open(path).map_err(|e| Error::file(path, e))?;
    let size = file.metadata().map_err(|e| Error::file(path, e))?.len();
    if size < min_size {
        return Err(Error::FileTooSmall {
            name: path.display().to_string(),
            size,
            min: min_size,
        });
    }

    let mut data = Vec::with_capacity(size as usize);
    file.read_to_end(&mut data)
        .map_err(|e| Error::file(path, e))?;
    log::debug!("loaded {} ({} bytes)", path.display(), data.len());
    Ok(data)
}

/// Write `data` to `path` through a temporary file in the same directory.
///
/// `path` is left untouched if anything fails before the final rename.
pub fn write_atomic(path: &Path, data: &[u8]) -> Result<()> {
    let dir = match path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p,
        _ => Path::new("."),
    };
    let tmp = tempfile::NamedTempFile::new_in(dir).map_err(|e| Error::file(dir, e))?;
    {
        let mut writer = BufWriter::with_capacity(BUF_SIZE, tmp.as_file());
        writer.write_all(data).map_err(|e| Error::file(tmp.path(), e))?;
        writer.flush().map_err(|e| Error::file(tmp.path(), e))?;
    }
    tmp.persist(path).map_err(|e| Error::file(path, e.error))?;
    Ok(())
}

#[cfg(feature = "file-io")]
fn sha256(data: &[u8]) -> Option<[u8; 32]> {
    Some(sha2::Sha256::digest(data).into())
}

#[cfg(not(feature = "file-io"))]
fn sha256(_data: &[u8]) -> Option<[u8; 32]> {
    None
}

// ---------------------------------------------------------------------------
// diff_file
// ---------------------------------------------------------------------------

/// Create a patch turning `old_path` into `new_path`, writing it to `patch_path`.
///
/// Both files must be at least one block long.
pub fn diff_file(
    old_path: &Path,
    new_path: &Path,
    patch_path: &Path,
    opts: &DiffOptions,
    compression: Compression,
) -> Result<DiffStats> {
    let min = MatcherConfig::new(opts.block_size).block_size as u64;
    let old = load_file(old_path, min)?;
    let new = load_file(new_path, min)?;

    let mut raw = Vec::with_capacity(new.len() / 4 + 64);
    let summary = engine::diff_with_options(&old, &new, &mut raw, opts)?;

    let packed = compress_patch(&raw, compression)?;
    let compression = if packed.len() < raw.len() {
        compression.backend().name()
    } else {
        "none"
    };
    write_atomic(patch_path, &packed)?;
    log::info!(
        "wrote {} ({} bytes, {compression})",
        patch_path.display(),
        packed.len()
    );

    Ok(DiffStats {
        old_size: old.len() as u64,
        new_size: new.len() as u64,
        raw_patch_size: raw.len() as u64,
        patch_size: packed.len() as u64,
        compression,
        offset_width: summary.header.offset_width,
        copy_ops: summary.copy_ops,
        insert_ops: summary.insert_ops,
        copied_bytes: summary.copied_bytes,
        literal_bytes: summary.literal_bytes,
        old_sha256: sha256(&old),
        new_sha256: sha256(&new),
    })
}

// ---------------------------------------------------------------------------
// apply_file
// ---------------------------------------------------------------------------

/// Read a patch file, raw or compressed, into its raw stream.
pub fn load_patch(path: &Path) -> Result<Vec<u8>> {
    let packed = load_file(path, 0)?;
    decompress_patch(&packed)
}

/// Apply the patch at `patch_path` to `old_path`, writing to `output_path`.
///
/// Nothing is written unless the whole patch applies cleanly.
pub fn apply_file(
    old_path: &Path,
    patch_path: &Path,
    output_path: &Path,
    opts: &ApplyOptions,
) -> Result<ApplyStats> {
    let old = load_file(old_path, 0)?;
    let patch_size = std::fs::metadata(patch_path)
        .map_err(|e| Error::file(patch_path, e))?
        .len();
    let raw = load_patch(patch_path)?;

    let (header, _) = PatchHeader::decode(&raw)?;
    let output = engine::apply_with_options(&old, &raw, opts)?;

    write_atomic(output_path, &output)?;
    log::info!(
        "wrote {} ({} bytes)",
        output_path.display(),
        output.len()
    );

    Ok(ApplyStats {
        old_size: old.len() as u64,
        patch_size,
        output_size: output.len() as u64,
        offset_width: header.offset_width,
        verified: opts.verify_checksums && header.checksums.is_some(),
        output_sha256: sha256(&output),
    })
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
