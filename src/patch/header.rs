// Patch file header.
//
// Layout (little-endian, packed):
//
//   magic(u32) version(u32) offset_width(u32) target_size(u64)
//   [old_checksum(u64) new_checksum(u64)]      version 2 only
//
// Version 1 carries no checksums. Version 2 appends whole-buffer checksums
// of the old and new content.

use std::io::{self, Write};

use super::ops::OffsetWidth;
use crate::error::{Error, FormatError};

// ---------------------------------------------------------------------------
// Magic and versions
// ---------------------------------------------------------------------------

pub const PATCH_MAGIC: u32 = 0x2024_1118;

/// Header without integrity checksums.
pub const VERSION_PLAIN: u32 = 1;
/// Header followed by old/new checksums.
pub const VERSION_CHECKSUMS: u32 = 2;
/// Newest version this build reads.
pub const FORMAT_VERSION: u32 = VERSION_CHECKSUMS;

/// Size of the version 1 header.
pub const PLAIN_HEADER_LEN: usize = 20;
/// Size of the version 2 header.
pub const CHECKSUM_HEADER_LEN: usize = PLAIN_HEADER_LEN + 16;

// ---------------------------------------------------------------------------
// Header
// ---------------------------------------------------------------------------

/// Whole-buffer checksums used to detect a wrong base or a corrupted result.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Checksums {
    pub old: u64,
    pub new: u64,
}

/// Parsed patch header.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PatchHeader {
    pub version: u32,
    pub offset_width: OffsetWidth,
    /// Size of the content the patch reconstructs.
    pub target_size: u64,
    pub checksums: Option<Checksums>,
}

impl PatchHeader {
    /// Build a header; the version follows from whether checksums are present.
    pub fn new(target_size: u64, offset_width: OffsetWidth, checksums: Option<Checksums>) -> Self {
        let version = if checksums.is_some() {
            VERSION_CHECKSUMS
        } else {
            VERSION_PLAIN
        };
        Self {
            version,
            offset_width,
            target_size,
            checksums,
        }
    }

    /// Encoded header size.
    pub fn encoded_len(&self) -> usize {
        if self.checksums.is_some() {
            CHECKSUM_HEADER_LEN
        } else {
            PLAIN_HEADER_LEN
        }
    }

    /// Encode the header to a writer.
    pub fn encode<W: Write>(&self, w: &mut W) -> io::Result<()> {
        w.write_all(&PATCH_MAGIC.to_le_bytes())?;
        w.write_all(&self.version.to_le_bytes())?;
        w.write_all(&self.offset_width.bytes().to_le_bytes())?;
        w.write_all(&self.target_size.to_le_bytes())?;
        if let Some(sums) = self.checksums {
            w.write_all(&sums.old.to_le_bytes())?;
            w.write_all(&sums.new.to_le_bytes())?;
        }
        Ok(())
    }

    /// Parse a header from the front of `data`.
    ///
    /// Checks magic, version, and that the width field is 4 or 8. Whether
    /// the width is accepted, and whether the checksums hold, is up to the
    /// applier. Returns the header and its encoded length.
    pub fn decode(data: &[u8]) -> Result<(Self, usize), Error> {
        let truncated = || Error::TruncatedPatch {
            stream_offset: data.len(),
            produced: 0,
            target_size: 0,
        };

        let magic = read_u32(data, 0).ok_or_else(truncated)?;
        if magic != PATCH_MAGIC {
            return Err(FormatError::BadMagic { found: magic }.into());
        }

        let version = read_u32(data, 4).ok_or_else(truncated)?;
        if version == 0 || version > FORMAT_VERSION {
            return Err(FormatError::UnsupportedVersion {
                found: version,
                supported: FORMAT_VERSION,
            }
            .into());
        }

        let width_field = read_u32(data, 8).ok_or_else(truncated)?;
        let offset_width = OffsetWidth::from_bytes(width_field)
            .ok_or(FormatError::InvalidOffsetWidth { found: width_field })?;

        let target_size = read_u64(data, 12).ok_or_else(truncated)?;

        let checksums = if version >= VERSION_CHECKSUMS {
            Some(Checksums {
                old: read_u64(data, 20).ok_or_else(truncated)?,
                new: read_u64(data, 28).ok_or_else(truncated)?,
            })
        } else {
            None
        };

        let header = Self {
            version,
            offset_width,
            target_size,
            checksums,
        };
        Ok((header, header.encoded_len()))
    }
}

fn read_u32(data: &[u8], at: usize) -> Option<u32> {
    data.get(at..)?
        .first_chunk::<4>()
        .map(|b| u32::from_le_bytes(*b))
}

fn read_u64(data: &[u8], at: usize) -> Option<u64> {
    data.get(at..)?
        .first_chunk::<8>()
        .map(|b| u64::from_le_bytes(*b))
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn encode(h: &PatchHeader) -> Vec<u8> {
        let mut out = Vec::new();
        h.encode(&mut out).unwrap();
        out
    }

    #[test]
    fn plain_header_layout() {
        let h = PatchHeader::new(0x1234, OffsetWidth::Four, None);
        let bytes = encode(&h);
        assert_eq!(bytes.len(), PLAIN_HEADER_LEN);
        assert_eq!(&bytes[0..4], &[0x18, 0x11, 0x24, 0x20]);
        assert_eq!(&bytes[4..8], &1u32.to_le_bytes());
        assert_eq!(&bytes[8..12], &4u32.to_le_bytes());
        assert_eq!(&bytes[12..20], &0x1234u64.to_le_bytes());

        let (parsed, len) = PatchHeader::decode(&bytes).unwrap();
        assert_eq!(parsed, h);
        assert_eq!(len, PLAIN_HEADER_LEN);
    }

    #[test]
    fn checksums_select_version_two() {
        let h = PatchHeader::new(
            99,
            OffsetWidth::Eight,
            Some(Checksums { old: 1, new: 2 }),
        );
        assert_eq!(h.version, VERSION_CHECKSUMS);
        let bytes = encode(&h);
        assert_eq!(bytes.len(), CHECKSUM_HEADER_LEN);
        let (parsed, len) = PatchHeader::decode(&bytes).unwrap();
        assert_eq!(parsed.checksums, Some(Checksums { old: 1, new: 2 }));
        assert_eq!(len, CHECKSUM_HEADER_LEN);
    }

    #[test]
    fn bad_magic() {
        let mut bytes = encode(&PatchHeader::new(1, OffsetWidth::Four, None));
        bytes[0] ^= 0xFF;
        let err = PatchHeader::decode(&bytes).unwrap_err();
        assert!(matches!(err, Error::Format(FormatError::BadMagic { .. })));
    }

    #[test]
    fn newer_version_is_rejected() {
        let mut bytes = encode(&PatchHeader::new(1, OffsetWidth::Four, None));
        bytes[4..8].copy_from_slice(&(FORMAT_VERSION + 1).to_le_bytes());
        let err = PatchHeader::decode(&bytes).unwrap_err();
        assert!(matches!(
            err,
            Error::Format(FormatError::UnsupportedVersion { found: 3, supported: 2 })
        ));
    }

    #[test]
    fn invalid_width_field() {
        let mut bytes = encode(&PatchHeader::new(1, OffsetWidth::Four, None));
        bytes[8..12].copy_from_slice(&6u32.to_le_bytes());
        let err = PatchHeader::decode(&bytes).unwrap_err();
        assert!(matches!(
            err,
            Error::Format(FormatError::InvalidOffsetWidth { found: 6 })
        ));
    }

    #[test]
    fn short_header_is_truncation() {
        let bytes = encode(&PatchHeader::new(
            1,
            OffsetWidth::Four,
            Some(Checksums { old: 3, new: 4 }),
        ));
        for cut in [0, 3, 11, 19, 27, 35] {
            let err = PatchHeader::decode(&bytes[..cut]).unwrap_err();
            assert!(
                matches!(err, Error::TruncatedPatch { .. }),
                "cut at {cut}: {err}"
            );
        }
    }
}
