//! Blockdelta: block-hash binary deltas for software-update patches.
//!
//! A patch is built by indexing fixed-size windows of the old content by
//! checksum, scanning the new content for windows that occur in the old one,
//! extending each hit forward, and emitting Copy ops for the matched runs and
//! Insert ops for everything else.
//!
//! The crate provides:
//! - Window indexing and block matching (`hash`)
//! - The patch stream format, encoder and applier (`patch`)
//! - High-level in-memory APIs (`engine`)
//! - Whole-patch compression (`compress`)
//! - File-oriented helpers (`io`)
//! - An optional CLI (`cli` feature)
//!
//! # Quick Start
//!
//! ```no_run
//! use blockdelta::engine;
//!
//! let old = b"hello old world, long enough to index";
//! let new = b"hello new world, long enough to index";
//!
//! let patch = engine::diff(old, new).unwrap();
//! let rebuilt = engine::apply(old, &patch).unwrap();
//! assert_eq!(rebuilt, new);
//! ```

pub mod compress;
pub mod engine;
pub mod error;
pub mod hash;
pub mod io;
pub mod patch;

#[cfg(feature = "cli")]
pub mod cli;

pub use error::{Error, FormatError, Result};
