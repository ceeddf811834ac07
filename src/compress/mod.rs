// Patch compression.
//
// - `backend` — Pluggable whole-patch compression (LZMA, Zlib, none) and
//               detection of how a patch file was stored

pub mod backend;

pub use backend::{CompressBackend, Compression, compress_patch, decompress_patch};
