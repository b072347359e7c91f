// Reader configuration.

/// Upper bounds applied to producer-declared lengths before anything is
/// allocated. Exceeding one is a format error.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReadOptions {
    /// Longest NEVR string accepted, in bytes. Default: 64 KiB.
    pub max_string_len: u32,
    /// Longest byte block (sequence, comp-params, lead, add-data read into
    /// memory) accepted, in bytes. Default: 256 MiB.
    pub max_block_len: u32,
    /// Most (first, second) pairs accepted in one pair table. Default: 16 Mi.
    pub max_pairs: u32,
}

impl Default for ReadOptions {
    fn default() -> Self {
        Self {
            max_string_len: 64 * 1024,
            max_block_len: 256 * 1024 * 1024,
            max_pairs: 16 * 1024 * 1024,
        }
    }
}
