//! `PIXELDATA_111107` pixel data chunk
//!
//! Layout: `version(i32)`, `ordinal(i32)`, then the raw little-endian `i16`
//! samples for the rest of the payload.

use super::{ChunkPayload, ChunkTag};
use crate::error::Result;
use crate::primitives::{PayloadCursor, samples_from_le_bytes, samples_to_le_bytes};

/// Pixel samples of one image
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PixelDataChunk {
    /// Payload version
    pub version: u32,
    /// Image ordinal within the file
    pub ordinal: i32,
    /// Row-major samples, embedded lines included
    pub samples: Vec<i16>,
}

impl ChunkPayload for PixelDataChunk {
    const TAG: ChunkTag = ChunkTag::PixelData;
    const MIN_VERSION: Option<i32> = Some(1);

    fn parse(payload: &[u8]) -> Result<Self> {
        let mut cursor = PayloadCursor::new(payload, "pixel data chunk");
        let version = super::read_version::<Self>(&mut cursor)?;
        let ordinal = cursor.read_i32()?;
        let samples = samples_from_le_bytes(cursor.take_rest(), "pixel data chunk")?;
        Ok(Self {
            version,
            ordinal,
            samples,
        })
    }

    fn build(&self) -> Result<Vec<u8>> {
        let mut out = Vec::with_capacity(8 + self.samples.len() * 2);
        out.extend_from_slice(&self.version.to_le_bytes());
        out.extend_from_slice(&self.ordinal.to_le_bytes());
        samples_to_le_bytes(&self.samples, &mut out);
        Ok(out)
    }
}
