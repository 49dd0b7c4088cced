//! `HDR_______130318` HDR exposure plan chunk
//!
//! Layout after the version: exposure count (`i32`), readout scheme
//! (length-prefixed string), then one entry per exposure. Version 2 adds AWB
//! gains and a conversion gain flag to every entry.

use super::{ChunkPayload, ChunkTag};
use crate::error::{NvRawError, Result};
use crate::primitives::{PayloadCursor, VersionedWireSize, encode_string};
use binrw::{BinRead, BinWrite};
use std::io::Cursor;

const EXPOSURE_AWB_VERSION: u32 = 2;

/// Entry size for version 1: symbol, time and two gain sets
const EXPOSURE_V1_SIZE: usize = 4 + 4 + 16 + 16;

/// One exposure of the HDR plan
#[derive(Debug, Clone, PartialEq, BinRead, BinWrite)]
#[br(little, import(version: u32))]
#[bw(little)]
pub struct HdrExposure {
    /// Exposure symbol
    pub symbol: [u8; 4],
    /// Exposure time in seconds
    pub exposure_time: f32,
    /// Per-channel analog gains
    pub analog_gains: [f32; 4],
    /// Per-channel digital gains
    pub digital_gains: [f32; 4],
    /// Per-channel AWB gains (version 2+)
    #[br(if(version >= EXPOSURE_AWB_VERSION))]
    pub awb_gains: Option<[f32; 4]>,
    /// Conversion gain flag (version 2+)
    #[br(if(version >= EXPOSURE_AWB_VERSION))]
    pub conversion_gain: Option<u32>,
}

impl HdrExposure {
    fn matches_version(&self, version: u32) -> bool {
        let extended = version >= EXPOSURE_AWB_VERSION;
        self.awb_gains.is_some() == extended && self.conversion_gain.is_some() == extended
    }
}

impl VersionedWireSize for HdrExposure {
    fn wire_size(version: u32) -> usize {
        if version >= EXPOSURE_AWB_VERSION {
            EXPOSURE_V1_SIZE + 16 + 4
        } else {
            EXPOSURE_V1_SIZE
        }
    }
}

/// HDR exposure plan
#[derive(Debug, Clone, PartialEq, Default)]
pub struct HdrChunk {
    /// Payload version
    pub version: u32,
    /// Readout scheme name
    pub readout_scheme: Vec<u8>,
    /// Exposures in plan order
    pub exposures: Vec<HdrExposure>,
}

impl ChunkPayload for HdrChunk {
    const TAG: ChunkTag = ChunkTag::Hdr;
    const MIN_VERSION: Option<i32> = Some(1);

    fn parse(payload: &[u8]) -> Result<Self> {
        let mut cursor = PayloadCursor::new(payload, "HDR chunk");
        let version = super::read_version::<Self>(&mut cursor)?;

        let count = cursor.read_i32()?;
        let count = usize::try_from(count).map_err(|_| NvRawError::InvalidField {
            field: "HDR exposure count",
            value: i64::from(count),
        })?;
        let readout_scheme = cursor.read_string()?;

        // A corrupt count must not drive the allocation
        let mut exposures = Vec::with_capacity(count.min(cursor.remaining() / EXPOSURE_V1_SIZE));
        for _ in 0..count {
            exposures.push(cursor.read_versioned::<HdrExposure>(version)?);
        }

        Ok(Self {
            version,
            readout_scheme,
            exposures,
        })
    }

    fn build(&self) -> Result<Vec<u8>> {
        let count = i32::try_from(self.exposures.len()).map_err(|_| NvRawError::InvalidLength {
            context: "HDR exposures",
            length: self.exposures.len() as i64,
        })?;
        if let Some(exposure) = self
            .exposures
            .iter()
            .find(|exposure| !exposure.matches_version(self.version))
        {
            return Err(NvRawError::InvalidField {
                field: "HDR exposure layout",
                value: i64::from(exposure.awb_gains.is_some()),
            });
        }

        let mut out = Vec::new();
        out.extend_from_slice(&self.version.to_le_bytes());
        out.extend_from_slice(&count.to_le_bytes());
        encode_string(&self.readout_scheme, &mut out)?;

        let mut cursor = Cursor::new(out);
        cursor.set_position(cursor.get_ref().len() as u64);
        for exposure in &self.exposures {
            exposure.write(&mut cursor)?;
        }
        Ok(cursor.into_inner())
    }
}
