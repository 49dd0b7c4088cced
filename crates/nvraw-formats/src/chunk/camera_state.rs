//! `CAMSTATE__120118` camera state chunk

use super::{ChunkPayload, ChunkTag};
use crate::error::Result;
use crate::primitives::PayloadCursor;

/// AWB state at capture time
#[derive(Debug, Clone, PartialEq, Default)]
pub struct CameraStateChunk {
    /// Payload version
    pub version: u32,
    /// AWB convergence status
    pub converge_status: i32,
    /// Per-channel AWB gains
    pub awb_gains: [f32; 4],
}

impl ChunkPayload for CameraStateChunk {
    const TAG: ChunkTag = ChunkTag::CameraState;
    const MIN_VERSION: Option<i32> = Some(1);

    fn parse(payload: &[u8]) -> Result<Self> {
        let mut cursor = PayloadCursor::new(payload, "camera state chunk");
        let version = super::read_version::<Self>(&mut cursor)?;
        Ok(Self {
            version,
            converge_status: cursor.read_i32()?,
            awb_gains: cursor.read_f32x4()?,
        })
    }

    fn build(&self) -> Result<Vec<u8>> {
        let mut out = Vec::with_capacity(24);
        out.extend_from_slice(&self.version.to_le_bytes());
        out.extend_from_slice(&self.converge_status.to_le_bytes());
        for gain in self.awb_gains {
            out.extend_from_slice(&gain.to_le_bytes());
        }
        Ok(out)
    }
}
