//! Error types for NVRAW decoding and encoding

use thiserror::Error;

/// Result type alias for NVRAW operations
pub type Result<T> = std::result::Result<T, NvRawError>;

/// Errors that can occur when reading or writing NVRAW files
#[derive(Debug, Error)]
pub enum NvRawError {
    /// The first 8 bytes match neither the legacy nor the chunked layout
    #[error("unrecognized NVRAW format: leading bytes {0:02X?}")]
    UnrecognizedFormat([u8; 8]),

    /// A fixed sentinel word does not hold its expected value
    #[error("{sentinel} sentinel mismatch: expected {expected:#010X}, got {actual:#010X}")]
    SentinelMismatch {
        /// Name of the sentinel
        sentinel: &'static str,
        /// Expected value
        expected: u32,
        /// Value found in the data
        actual: u32,
    },

    /// A length prefix or buffer size is malformed
    #[error("invalid {context} length: {length}")]
    InvalidLength {
        /// What the length describes
        context: &'static str,
        /// Offending length
        length: i64,
    },

    /// A field holds a value that cannot be represented
    #[error("invalid value for {field}: {value}")]
    InvalidField {
        /// Field name
        field: &'static str,
        /// Offending value
        value: i64,
    },

    /// The input ends before a required field is complete
    #[error("truncated {context}: need {needed} bytes, {available} available")]
    TruncatedInput {
        /// What was being read
        context: &'static str,
        /// Bytes required
        needed: usize,
        /// Bytes left in the input
        available: usize,
    },

    /// Output data format wire value with no caller-facing counterpart
    #[error("unmapped output data format value: {0}")]
    UnmappedEnumValue(u32),

    /// Payload digest differs from the one stored in the chunk frame
    #[error("digest mismatch in chunk {tag}: expected {expected}, computed {actual}")]
    DigestMismatch {
        /// Chunk tag as text
        tag: String,
        /// Digest stored in the frame (hex)
        expected: String,
        /// Digest of the payload (hex)
        actual: String,
    },

    /// Building a parsed file did not reproduce the input bytes
    #[error("round-trip mismatch at byte {offset}: {original} bytes in, {rebuilt} bytes out")]
    RoundTripMismatch {
        /// First differing byte
        offset: usize,
        /// Input length
        original: usize,
        /// Rebuilt length
        rebuilt: usize,
    },

    /// Failure reported by an external frame reader
    #[error("frame source error: {0}")]
    FrameSource(String),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Binary parsing error
    #[error("binary parsing error: {0}")]
    BinRw(#[from] binrw::Error),
}

impl NvRawError {
    /// Build a truncation error
    pub fn truncated(context: &'static str, needed: usize, available: usize) -> Self {
        Self::TruncatedInput {
            context,
            needed,
            available,
        }
    }

    /// Check if the leading bytes were not a known layout
    pub fn is_format_error(&self) -> bool {
        matches!(self, Self::UnrecognizedFormat(_))
    }

    /// Check if this error indicates a structurally corrupt file
    pub fn is_structural_corruption(&self) -> bool {
        matches!(
            self,
            Self::SentinelMismatch { .. }
                | Self::InvalidLength { .. }
                | Self::InvalidField { .. }
                | Self::DigestMismatch { .. }
        )
    }

    /// Check if the input ended early
    pub fn is_truncated(&self) -> bool {
        match self {
            Self::TruncatedInput { .. } => true,
            Self::Io(e) => e.kind() == std::io::ErrorKind::UnexpectedEof,
            Self::BinRw(e) => e.is_eof(),
            _ => false,
        }
    }
}

/// Non-fatal conditions noticed while decoding
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Diagnostic {
    /// Output data format wire value kept as-is because the table has no entry
    UnmappedOutputDataFormat(u32),
    /// Chunk with an unknown tag was skipped
    UnknownChunk([u8; 16]),
    /// Recognized chunk skipped because its version predates the decoder
    UnsupportedChunkVersion {
        /// Chunk tag
        tag: [u8; 16],
        /// Version read from the payload
        version: i64,
    },
}

#[cfg(test)]
#[allow(clippy::expect_used, clippy::unwrap_used, clippy::panic)]
mod tests {
    use super::*;

    #[test]
    fn test_error_categorization() {
        let format_error = NvRawError::UnrecognizedFormat(*b"GARBAGE!");
        assert!(format_error.is_format_error());
        assert!(!format_error.is_structural_corruption());
        assert!(!format_error.is_truncated());

        let sentinel = NvRawError::SentinelMismatch {
            sentinel: "bayer start",
            expected: 0xCAFE_FEED,
            actual: 0,
        };
        assert!(sentinel.is_structural_corruption());
        assert!(!sentinel.is_format_error());

        let truncated = NvRawError::truncated("chunk payload", 100, 12);
        assert!(truncated.is_truncated());
        assert!(!truncated.is_structural_corruption());

        let eof = NvRawError::Io(std::io::Error::from(std::io::ErrorKind::UnexpectedEof));
        assert!(eof.is_truncated());

        assert!(!NvRawError::UnmappedEnumValue(99).is_structural_corruption());
    }

    #[test]
    fn test_error_messages() {
        let error = NvRawError::SentinelMismatch {
            sentinel: "bayer start",
            expected: 0xCAFE_FEED,
            actual: 0x1234,
        };
        assert_eq!(
            error.to_string(),
            "bayer start sentinel mismatch: expected 0xCAFEFEED, got 0x00001234"
        );

        let error = NvRawError::truncated("LUT", 40, 8);
        assert_eq!(error.to_string(), "truncated LUT: need 40 bytes, 8 available");

        let error = NvRawError::InvalidLength {
            context: "LUT",
            length: 7,
        };
        assert!(error.to_string().contains("LUT length: 7"));

        let error = NvRawError::RoundTripMismatch {
            offset: 36,
            original: 80,
            rebuilt: 84,
        };
        assert_eq!(
            error.to_string(),
            "round-trip mismatch at byte 36: 80 bytes in, 84 bytes out"
        );
    }
}
