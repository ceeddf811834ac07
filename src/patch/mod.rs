// Patch stream format and codec.
//
// # Modules
//
// - `ops`     — Copy/Insert ops and fixed-width field encoding
// - `header`  — Patch header (magic, version, offset width, sizes, checksums)
// - `encoder` — Match list to op stream, stream emission
// - `decoder` — Stream reading and application against the old content

pub mod decoder;
pub mod encoder;
pub mod header;
pub mod ops;

pub use decoder::{PatchApplier, PatchReader, apply_memory};
pub use encoder::{EncodeParams, PatchEncoder, PatchSummary, build_ops, encode_patch};
pub use header::{Checksums, FORMAT_VERSION, PATCH_MAGIC, PatchHeader};
pub use ops::{OffsetWidth, PatchOp};
