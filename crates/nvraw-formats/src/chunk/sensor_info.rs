//! `SENSORINFO120131` sensor identity chunk
//!
//! Two length-prefixed strings follow the version. Some writers append a
//! module id after the fuse id; it is not read.

use super::{ChunkPayload, ChunkTag};
use crate::error::Result;
use crate::primitives::{PayloadCursor, encode_string};

/// Sensor and fuse identifiers
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct SensorInfoChunk {
    /// Payload version
    pub version: u32,
    /// Sensor identifier bytes
    pub sensor_id: Vec<u8>,
    /// Fuse identifier bytes
    pub fuse_id: Vec<u8>,
}

impl ChunkPayload for SensorInfoChunk {
    const TAG: ChunkTag = ChunkTag::SensorInfo;
    const MIN_VERSION: Option<i32> = Some(1);

    fn parse(payload: &[u8]) -> Result<Self> {
        let mut cursor = PayloadCursor::new(payload, "sensor info chunk");
        let version = super::read_version::<Self>(&mut cursor)?;
        Ok(Self {
            version,
            sensor_id: cursor.read_string()?,
            fuse_id: cursor.read_string()?,
        })
    }

    fn build(&self) -> Result<Vec<u8>> {
        let mut out = Vec::with_capacity(12 + self.sensor_id.len() + self.fuse_id.len());
        out.extend_from_slice(&self.version.to_le_bytes());
        encode_string(&self.sensor_id, &mut out)?;
        encode_string(&self.fuse_id, &mut out)?;
        Ok(out)
    }
}
