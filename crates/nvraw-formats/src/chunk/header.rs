//! `NVRAWFILE_111107` header chunk
//!
//! Unlike the other chunks the header has no version word: the payload is
//! nine little-endian `i32` fields. Bytes after them are ignored.

use super::{ChunkPayload, ChunkTag};
use crate::error::Result;
use crate::primitives::{PayloadCursor, WireSize};
use binrw::{BinRead, BinWrite};
use std::io::Cursor;

/// File-level image description
#[derive(Debug, Clone, PartialEq, Eq, Default, BinRead, BinWrite)]
#[brw(little)]
pub struct HeaderChunk {
    /// Image width
    pub width: i32,
    /// Image height, embedded lines included
    pub height: i32,
    /// Bayer phase code
    pub bayer_phase: i32,
    /// Significant bits per sample
    pub bits_per_sample: i32,
    /// Samples per pixel
    pub samples_per_pixel: i32,
    /// Number of images
    pub image_count: i32,
    /// Capture time, seconds
    pub time_sec: i32,
    /// Capture time, milliseconds
    pub time_ms: i32,
    /// Flags
    pub flags: i32,
}

/// Encoded size of the header payload
pub const HEADER_PAYLOAD_SIZE: usize = 9 * 4;

impl WireSize for HeaderChunk {
    const WIRE_SIZE: usize = HEADER_PAYLOAD_SIZE;
}

impl ChunkPayload for HeaderChunk {
    const TAG: ChunkTag = ChunkTag::Header;
    const MIN_VERSION: Option<i32> = None;

    fn parse(payload: &[u8]) -> Result<Self> {
        PayloadCursor::new(payload, "header chunk").read_struct()
    }

    fn build(&self) -> Result<Vec<u8>> {
        let mut cursor = Cursor::new(Vec::with_capacity(HEADER_PAYLOAD_SIZE));
        self.write(&mut cursor)?;
        Ok(cursor.into_inner())
    }
}

#[cfg(test)]
#[allow(clippy::expect_used, clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::error::NvRawError;

    fn words(values: &[i32]) -> Vec<u8> {
        values.iter().flat_map(|v| v.to_le_bytes()).collect()
    }

    #[test]
    fn test_parse_header() {
        let payload = words(&[1920, 1080, 0x4247_4752, 10, 1, 1, 1_700_000_000, 250, 0]);
        let header = HeaderChunk::parse(&payload).expect("Operation should succeed");

        assert_eq!(header.width, 1920);
        assert_eq!(header.height, 1080);
        assert_eq!(header.bayer_phase, 0x4247_4752);
        assert_eq!(header.bits_per_sample, 10);
        assert_eq!(header.time_ms, 250);
    }

    #[test]
    fn test_trailing_bytes_ignored() {
        let mut payload = words(&[8, 8, 0, 12, 1, 1, 0, 0, 0]);
        payload.extend_from_slice(&[0xAA; 7]);
        let header = HeaderChunk::parse(&payload).expect("Operation should succeed");
        assert_eq!(header.bits_per_sample, 12);
    }

    #[test]
    fn test_short_payload() {
        let payload = words(&[8, 8, 0, 12]);
        let err = HeaderChunk::parse(&payload).expect_err("Header is nine words");
        assert!(matches!(
            err,
            NvRawError::TruncatedInput {
                needed: HEADER_PAYLOAD_SIZE,
                available: 16,
                ..
            }
        ));
    }

    #[test]
    fn test_build_size() {
        let header = HeaderChunk {
            width: 2,
            height: 2,
            ..HeaderChunk::default()
        };
        let payload = header.build().expect("Operation should succeed");
        assert_eq!(payload.len(), HEADER_PAYLOAD_SIZE);
        assert_eq!(HeaderChunk::parse(&payload).expect("parse"), header);
    }
}
