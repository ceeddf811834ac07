// Error taxonomy shared by the diff and apply pipelines.
//
// Every failure is terminal for the operation in progress: there is no
// retry, and the first error encountered is surfaced with enough context
// (offsets, expected vs. actual sizes) to diagnose it.

use std::io;
use std::path::PathBuf;

use thiserror::Error;

use crate::patch::ops::OffsetWidth;

/// Crate-wide result alias.
pub type Result<T, E = Error> = std::result::Result<T, E>;

/// All failure categories of the diff/apply pipelines.
#[derive(Debug, Error)]
pub enum Error {
    /// Content is shorter than the fixed window; diffing is undefined.
    #[error("{name} is {size} bytes, smaller than the {min}-byte block size")]
    FileTooSmall { name: String, size: u64, min: u64 },

    /// I/O failure on an external buffer without a known path.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// I/O failure on a named file.
    #[error("{}: {source}", path.display())]
    File {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// The patch header or op stream is not in a format this build reads.
    #[error(transparent)]
    Format(#[from] FormatError),

    /// The patch was produced against a different base file.
    #[error(
        "patch does not apply to this file: base checksum {actual:#018x}, patch expects {expected:#018x}"
    )]
    BaseMismatch { expected: u64, actual: u64 },

    /// The stream ended before `target_size` bytes were produced.
    #[error(
        "patch truncated at stream offset {stream_offset}: produced {produced} of {target_size} bytes"
    )]
    TruncatedPatch {
        stream_offset: usize,
        produced: u64,
        target_size: u64,
    },

    /// An op would push the output past `target_size`.
    #[error("op of {len} bytes at output offset {produced} overruns target size {target_size}")]
    Overrun {
        len: u64,
        produced: u64,
        target_size: u64,
    },

    /// A copy op references bytes outside the old buffer.
    #[error("copy of {len} bytes at old offset {old_offset} exceeds old size {old_size}")]
    Bounds {
        old_offset: u64,
        len: u64,
        old_size: u64,
    },

    /// The reconstructed output does not match the recorded checksum.
    #[error("output corrupted: checksum {actual:#018x}, patch recorded {expected:#018x}")]
    Corruption { expected: u64, actual: u64 },
}

/// Header and op-stream format violations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FormatError {
    #[error("not a patch file: bad magic {found:#010x}")]
    BadMagic { found: u32 },

    #[error("patch version {found} is newer than supported version {supported}, use a newer build")]
    UnsupportedVersion { found: u32, supported: u32 },

    #[error("invalid offset width {found} in patch header")]
    InvalidOffsetWidth { found: u32 },

    /// Both sides must agree on the offset width; the fix is the other build.
    #[error(
        "patch uses {found}-byte offsets but this consumer only accepts {}-byte offsets, use the {}-bit build",
        accepted.bytes(),
        found.bytes() * 8
    )]
    OffsetWidthMismatch {
        found: OffsetWidth,
        accepted: OffsetWidth,
    },

    #[error("unknown op tag {tag:#04x} at stream offset {stream_offset}")]
    UnknownOpTag { tag: u8, stream_offset: usize },
}

impl Error {
    /// Attach a path to a bare I/O error.
    pub fn file(path: impl Into<PathBuf>, source: io::Error) -> Self {
        Self::File {
            path: path.into(),
            source,
        }
    }

    /// Whether this is an offset-width mismatch (fixable with the other build).
    pub fn is_width_mismatch(&self) -> bool {
        matches!(self, Self::Format(FormatError::OffsetWidthMismatch { .. }))
    }
}
