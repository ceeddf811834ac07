// Matcher configuration.
//
// The block size `B` is the unit of indexing and initial match verification.
// It does not bound the final match length.

/// Default fixed window length.
pub const DEFAULT_BLOCK_SIZE: usize = 16;

/// Smallest accepted block size. Below this, checksum lookups cost more
/// than the copies they find.
pub const MIN_BLOCK_SIZE: usize = 4;

/// Largest accepted block size.
pub const MAX_BLOCK_SIZE: usize = 4096;

/// Matcher configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MatcherConfig {
    /// Fixed window length used for indexing and match anchoring.
    pub block_size: usize,
}

impl MatcherConfig {
    /// Create a config, clamping `block_size` into the supported range.
    pub fn new(block_size: usize) -> Self {
        Self {
            block_size: block_size.clamp(MIN_BLOCK_SIZE, MAX_BLOCK_SIZE),
        }
    }
}

impl Default for MatcherConfig {
    fn default() -> Self {
        Self {
            block_size: DEFAULT_BLOCK_SIZE,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_block_size_is_16() {
        assert_eq!(MatcherConfig::default().block_size, 16);
    }

    #[test]
    fn block_size_is_clamped() {
        assert_eq!(MatcherConfig::new(0).block_size, MIN_BLOCK_SIZE);
        assert_eq!(MatcherConfig::new(1 << 20).block_size, MAX_BLOCK_SIZE);
        assert_eq!(MatcherConfig::new(32).block_size, 32);
    }
}
