// Whole-patch compression.
//
// Provides a pluggable `CompressBackend` trait with built-in implementations:
//   - LZMA (via lzma-rs, feature-gated `lzma`)
//   - Zlib/Deflate (via flate2, feature-gated `zlib`)
//   - NoCompression (passthrough)
//
// Compressed patches carry no envelope of their own. The reader tells the
// three apart by their first bytes: a raw patch starts with the patch magic,
// a zlib stream with 0x78, and anything else is taken to be LZMA.

use std::io;

use crate::error::Result;
use crate::patch::header::{PATCH_MAGIC, PatchHeader};

/// Minimum patch size worth compressing.
const MIN_COMPRESS_SIZE: usize = 32;

/// First byte of a zlib stream using a 32 KiB window (CMF 0x78).
const ZLIB_CMF: u8 = 0x78;

// ---------------------------------------------------------------------------
// CompressBackend trait
// ---------------------------------------------------------------------------

/// A pluggable compressor for finished patch streams.
///
/// # Implementing a custom backend
///
/// ```no_run
/// use blockdelta::compress::backend::CompressBackend;
///
/// struct Reversed;
///
/// impl CompressBackend for Reversed {
///     fn name(&self) -> &'static str { "reversed" }
///     fn compress(&self, data: &[u8]) -> std::io::Result<Vec<u8>> {
///         Ok(data.iter().rev().copied().collect())
///     }
///     fn decompress(&self, data: &[u8]) -> std::io::Result<Vec<u8>> {
///         Ok(data.iter().rev().copied().collect())
///     }
/// }
/// ```
pub trait CompressBackend: Send + Sync {
    /// Short name used in logs and CLI output.
    fn name(&self) -> &'static str;

    /// Compress a whole patch stream.
    fn compress(&self, data: &[u8]) -> io::Result<Vec<u8>>;

    /// Reverse [`compress`](Self::compress).
    fn decompress(&self, data: &[u8]) -> io::Result<Vec<u8>>;

    /// Whether `data` is worth compressing. Default: skip if < 32 bytes.
    fn should_compress(&self, data: &[u8]) -> bool {
        data.len() >= MIN_COMPRESS_SIZE
    }
}

fn invalid_data(what: &str, e: impl std::fmt::Display) -> io::Error {
    io::Error::new(io::ErrorKind::InvalidData, format!("{what} decompression failed: {e}"))
}

// ---------------------------------------------------------------------------
// LZMA backend
// ---------------------------------------------------------------------------

/// LZMA ("alone" format) compressor.
#[cfg(feature = "lzma")]
#[derive(Debug, Clone, Copy, Default)]
pub struct LzmaBackend;

#[cfg(feature = "lzma")]
impl CompressBackend for LzmaBackend {
    fn name(&self) -> &'static str {
        "lzma"
    }

    fn compress(&self, data: &[u8]) -> io::Result<Vec<u8>> {
        let mut input = io::Cursor::new(data);
        let mut output = Vec::new();
        lzma_rs::lzma_compress(&mut input, &mut output)?;
        Ok(output)
    }

    fn decompress(&self, data: &[u8]) -> io::Result<Vec<u8>> {
        let mut input = io::BufReader::new(io::Cursor::new(data));
        let mut output = Vec::new();
        lzma_rs::lzma_decompress(&mut input, &mut output).map_err(|e| invalid_data("LZMA", e))?;
        Ok(output)
    }
}

// ---------------------------------------------------------------------------
// Zlib backend
// ---------------------------------------------------------------------------

/// Zlib/Deflate compressor.
///
/// Uses zlib format (deflate + zlib header), not raw deflate, so the stream
/// is recognisable by its first byte and carries an Adler-32 trailer.
#[cfg(feature = "zlib")]
#[derive(Debug, Clone, Copy)]
pub struct ZlibBackend {
    level: flate2::Compression,
}

#[cfg(feature = "zlib")]
impl ZlibBackend {
    /// Create a Zlib backend with the given compression level (0-9).
    pub fn new(level: u32) -> Self {
        Self {
            level: flate2::Compression::new(level.min(9)),
        }
    }
}

#[cfg(feature = "zlib")]
impl Default for ZlibBackend {
    fn default() -> Self {
        Self::new(6)
    }
}

#[cfg(feature = "zlib")]
impl CompressBackend for ZlibBackend {
    fn name(&self) -> &'static str {
        "zlib"
    }

    fn compress(&self, data: &[u8]) -> io::Result<Vec<u8>> {
        use flate2::write::ZlibEncoder;
        use io::Write;

        let mut encoder = ZlibEncoder::new(Vec::new(), self.level);
        encoder.write_all(data)?;
        encoder.finish()
    }

    fn decompress(&self, data: &[u8]) -> io::Result<Vec<u8>> {
        use flate2::read::ZlibDecoder;
        use io::Read;

        let mut decoder = ZlibDecoder::new(data);
        let mut output = Vec::new();
        decoder
            .read_to_end(&mut output)
            .map_err(|e| invalid_data("Zlib", e))?;
        Ok(output)
    }
}

// ---------------------------------------------------------------------------
// No-compression backend
// ---------------------------------------------------------------------------

/// Passthrough backend; patches are written raw.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoCompression;

impl CompressBackend for NoCompression {
    fn name(&self) -> &'static str {
        "none"
    }

    fn compress(&self, data: &[u8]) -> io::Result<Vec<u8>> {
        Ok(data.to_vec())
    }

    fn decompress(&self, data: &[u8]) -> io::Result<Vec<u8>> {
        Ok(data.to_vec())
    }

    fn should_compress(&self, _data: &[u8]) -> bool {
        false
    }
}

// ---------------------------------------------------------------------------
// Algorithm selection
// ---------------------------------------------------------------------------

/// The compression applied to a finished patch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Compression {
    /// Write the raw patch stream.
    None,
    /// LZMA.
    #[cfg(feature = "lzma")]
    Lzma,
    /// Zlib/Deflate.
    #[cfg(feature = "zlib")]
    Zlib {
        /// Zlib compression level (0-9). Default: 6.
        level: u32,
    },
}

impl Default for Compression {
    /// LZMA when built in, otherwise raw.
    fn default() -> Self {
        #[cfg(feature = "lzma")]
        {
            Self::Lzma
        }
        #[cfg(not(feature = "lzma"))]
        {
            Self::None
        }
    }
}

impl Compression {
    /// Return the backend implementation.
    pub fn backend(&self) -> Box<dyn CompressBackend> {
        match self {
            Self::None => Box::new(NoCompression),
            #[cfg(feature = "lzma")]
            Self::Lzma => Box::new(LzmaBackend),
            #[cfg(feature = "zlib")]
            Self::Zlib { level } => Box::new(ZlibBackend::new(*level)),
        }
    }
}

// ---------------------------------------------------------------------------
// Patch-level helpers
// ---------------------------------------------------------------------------

/// Compress a finished patch.
///
/// Returns compressed data only if it's actually smaller; otherwise returns
/// the raw patch, which [`decompress_patch`] accepts as-is.
pub fn compress_patch(patch: &[u8], compression: Compression) -> Result<Vec<u8>> {
    let backend = compression.backend();
    if !backend.should_compress(patch) {
        return Ok(patch.to_vec());
    }

    let compressed = backend.compress(patch)?;
    log::debug!(
        "{}: {} -> {} bytes",
        backend.name(),
        patch.len(),
        compressed.len()
    );
    if compressed.len() < patch.len() {
        Ok(compressed)
    } else {
        Ok(patch.to_vec())
    }
}

/// Identify how `data` was stored by its leading bytes.
///
/// Returns the backend able to read it back to a raw patch stream.
pub fn backend_for(data: &[u8]) -> Result<Box<dyn CompressBackend>> {
    if data.starts_with(&PATCH_MAGIC.to_le_bytes()) {
        return Ok(Box::new(NoCompression));
    }
    match data.first() {
        #[cfg(feature = "zlib")]
        Some(&ZLIB_CMF) => Ok(Box::new(ZlibBackend::default())),
        #[cfg(not(feature = "zlib"))]
        Some(&ZLIB_CMF) => Err(unsupported("Zlib", "zlib")),

        #[cfg(feature = "lzma")]
        Some(_) => Ok(Box::new(LzmaBackend)),
        #[cfg(not(feature = "lzma"))]
        Some(_) => Err(unsupported("LZMA", "lzma")),

        // Empty input: let the header parser report the truncation.
        None => Ok(Box::new(NoCompression)),
    }
}

/// Recover the raw patch stream from a possibly compressed file.
///
/// Input that neither decompresses nor starts with the patch magic is
/// reported the way the header parser sees it: a bad magic, or a truncated
/// patch when it is shorter than the magic.
pub fn decompress_patch(data: &[u8]) -> Result<Vec<u8>> {
    let backend = backend_for(data)?;
    match backend.decompress(data) {
        Ok(raw) => {
            log::debug!("{}: {} -> {} bytes", backend.name(), data.len(), raw.len());
            Ok(raw)
        }
        Err(e) => {
            log::debug!("{} decode failed: {e}", backend.name());
            match PatchHeader::decode(data) {
                Err(header_err) => Err(header_err),
                Ok(_) => Err(e.into()),
            }
        }
    }
}

#[cfg(any(not(feature = "zlib"), not(feature = "lzma")))]
fn unsupported(what: &str, feature: &str) -> crate::error::Error {
    io::Error::new(
        io::ErrorKind::Unsupported,
        format!("{what}-compressed patch requires the '{feature}' feature"),
    )
    .into()
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
