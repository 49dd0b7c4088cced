//! Reader configuration

use serde::{Deserialize, Serialize};

/// Default upper bound on a single chunk payload (256 MiB)
pub const DEFAULT_MAX_CHUNK_LENGTH: u32 = 256 * 1024 * 1024;

/// Options controlling how NVRAW data is read
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReaderOptions {
    /// Check each chunk payload against the MD5 digest in its frame
    pub verify_chunk_digests: bool,
    /// Largest payload length a chunk frame may declare
    pub max_chunk_length: u32,
}

impl Default for ReaderOptions {
    fn default() -> Self {
        Self {
            verify_chunk_digests: false,
            max_chunk_length: DEFAULT_MAX_CHUNK_LENGTH,
        }
    }
}

impl ReaderOptions {
    /// Create options with default values
    pub fn new() -> Self {
        Self::default()
    }

    /// Enable or disable chunk digest verification
    #[must_use]
    pub fn with_verify_chunk_digests(mut self, verify: bool) -> Self {
        self.verify_chunk_digests = verify;
        self
    }

    /// Set the largest accepted chunk payload length
    #[must_use]
    pub fn with_max_chunk_length(mut self, length: u32) -> Self {
        self.max_chunk_length = length;
        self
    }
}
