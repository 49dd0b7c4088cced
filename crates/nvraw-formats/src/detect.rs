//! On-disk variant detection from the first 8 bytes

use crate::error::{NvRawError, Result};
use tracing::debug;

/// Number of bytes inspected by [`detect_format`]
pub const SNIFF_LEN: usize = 8;

/// Legacy magic word
pub const LEGACY_MAGIC: u32 = 1;

/// Legacy versions accepted by the detector
pub const LEGACY_VERSIONS: std::ops::RangeInclusive<u32> = 1..=4;

/// Leading bytes of the header chunk tag
pub const CHUNKED_MARKER: [u8; SNIFF_LEN] = *b"NVRAWFIL";

/// NVRAW file layout
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FormatKind {
    /// Fixed-offset header followed by pixel body
    Legacy,
    /// Sequence of tagged, length-delimited chunks
    Chunked,
}

/// Classify a file from its leading bytes
///
/// Only the first 8 bytes are examined.
pub fn detect_format(data: &[u8]) -> Result<FormatKind> {
    let sniff: [u8; SNIFF_LEN] = data
        .get(..SNIFF_LEN)
        .and_then(|b| b.try_into().ok())
        .ok_or_else(|| NvRawError::truncated("format marker", SNIFF_LEN, data.len()))?;

    if is_legacy(&sniff) {
        debug!("Detected legacy NVRAW layout");
        Ok(FormatKind::Legacy)
    } else if sniff == CHUNKED_MARKER {
        debug!("Detected chunked NVRAW layout");
        Ok(FormatKind::Chunked)
    } else {
        Err(NvRawError::UnrecognizedFormat(sniff))
    }
}

fn is_legacy(sniff: &[u8; SNIFF_LEN]) -> bool {
    let magic = u32::from_le_bytes([sniff[0], sniff[1], sniff[2], sniff[3]]);
    let version = u32::from_le_bytes([sniff[4], sniff[5], sniff[6], sniff[7]]);
    magic == LEGACY_MAGIC && LEGACY_VERSIONS.contains(&version)
}
