// Block hashing and matching for delta encoding.
//
// This module provides:
// - Window and whole-buffer checksums (XXH3-64)
// - The checksum index over fixed-size windows of the old content
// - Block matching with first-candidate selection and forward extension
// - Matcher configuration (block size bounds)

pub mod checksum;
pub mod config;
pub mod index;
pub mod matching;
