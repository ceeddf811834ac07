// Patch operations and their fixed-width field encoding.
//
// Every op starts with a one-byte tag:
//
//   TAG_COPY   old_offset(width) length(width)
//   TAG_INSERT length(width) literal bytes
//
// `width` is the header's offset width, 4 or 8 bytes, little-endian.

use std::fmt;
use std::io::{self, Write};

/// Copy `length` bytes from the old buffer.
pub const TAG_COPY: u8 = 0;
/// Insert `length` literal bytes carried in the stream.
pub const TAG_INSERT: u8 = 1;

// ---------------------------------------------------------------------------
// Offset width
// ---------------------------------------------------------------------------

/// Byte width of every offset and length field in one patch stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum OffsetWidth {
    /// 32-bit fields, enough for inputs under 4 GiB.
    Four,
    /// 64-bit fields.
    Eight,
}

impl OffsetWidth {
    /// Field size in bytes, as stored in the header.
    #[inline]
    pub const fn bytes(self) -> u32 {
        match self {
            Self::Four => 4,
            Self::Eight => 8,
        }
    }

    /// Parse the header's width field.
    pub const fn from_bytes(bytes: u32) -> Option<Self> {
        match bytes {
            4 => Some(Self::Four),
            8 => Some(Self::Eight),
            _ => None,
        }
    }

    /// Narrowest width able to hold `max`.
    pub const fn for_max(max: u64) -> Self {
        if max <= u32::MAX as u64 {
            Self::Four
        } else {
            Self::Eight
        }
    }

    /// Write one field. `value` must fit this width.
    pub fn write_field<W: Write>(self, w: &mut W, value: u64) -> io::Result<()> {
        match self {
            Self::Four => {
                let v = u32::try_from(value).map_err(|_| {
                    io::Error::new(
                        io::ErrorKind::InvalidInput,
                        format!("value {value} does not fit a 4-byte field"),
                    )
                })?;
                w.write_all(&v.to_le_bytes())
            }
            Self::Eight => w.write_all(&value.to_le_bytes()),
        }
    }

    /// Read one field from the front of `buf`.
    ///
    /// Returns `None` if `buf` is shorter than the field.
    pub fn read_field(self, buf: &[u8]) -> Option<u64> {
        match self {
            Self::Four => buf
                .first_chunk::<4>()
                .map(|b| u32::from_le_bytes(*b) as u64),
            Self::Eight => buf.first_chunk::<8>().map(|b| u64::from_le_bytes(*b)),
        }
    }
}

impl fmt::Display for OffsetWidth {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.bytes())
    }
}

// ---------------------------------------------------------------------------
// Patch op
// ---------------------------------------------------------------------------

/// One patch instruction. Insert data borrows from the new buffer on encode
/// and from the patch stream on decode.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PatchOp<'a> {
    Insert { data: &'a [u8] },
    Copy { old_offset: u64, len: u64 },
}

impl PatchOp<'_> {
    /// Number of output bytes this op produces.
    #[inline]
    pub fn len(&self) -> u64 {
        match self {
            Self::Insert { data } => data.len() as u64,
            Self::Copy { len, .. } => *len,
        }
    }

    /// Whether the op produces no output.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Tag byte for this op.
    pub fn tag(&self) -> u8 {
        match self {
            Self::Insert { .. } => TAG_INSERT,
            Self::Copy { .. } => TAG_COPY,
        }
    }

    /// Largest field value this op writes.
    pub fn max_field(&self) -> u64 {
        match self {
            Self::Insert { data } => data.len() as u64,
            Self::Copy { old_offset, len } => (*old_offset).max(*len),
        }
    }

    /// Encoded size in bytes at `width`.
    pub fn encoded_len(&self, width: OffsetWidth) -> usize {
        let field = width.bytes() as usize;
        match self {
            Self::Insert { data } => 1 + field + data.len(),
            Self::Copy { .. } => 1 + 2 * field,
        }
    }

    /// Serialize the op.
    pub fn encode<W: Write>(&self, w: &mut W, width: OffsetWidth) -> io::Result<()> {
        w.write_all(&[self.tag()])?;
        match self {
            Self::Insert { data } => {
                width.write_field(w, data.len() as u64)?;
                w.write_all(data)
            }
            Self::Copy { old_offset, len } => {
                width.write_field(w, *old_offset)?;
                width.write_field(w, *len)
            }
        }
    }
}

impl fmt::Display for PatchOp<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Insert { data } => write!(f, "INSERT len={}", data.len()),
            Self::Copy { old_offset, len } => write!(f, "COPY   len={len} old={old_offset}"),
        }
    }
}
