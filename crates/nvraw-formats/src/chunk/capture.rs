//! `CAPTURE___120118` capture chunk
//!
//! The payload grows by field groups, each introduced by a version:
//!
//! | Version | Group                                                        |
//! |---------|--------------------------------------------------------------|
//! | 2       | exposure block (13 words after the version)                  |
//! | 3       | rolling shutter length (`u32`)                               |
//! | 4       | pixel format (length-prefixed string)                        |
//! | 5       | ISP digital gain (`f32`)                                     |
//! | 6       | output format, endianness, embedded line counts, LUT         |
//!
//! A version-N payload contains every group up to N in this order. Groups
//! from later versions are never interleaved with earlier ones, so a decoder
//! that knows up to version 6 reads a version 7 payload as version 6.

use super::{ChunkPayload, ChunkTag};
use crate::error::{NvRawError, Result};
use crate::primitives::{PayloadCursor, WireSize, encode_lut, encode_string};
use binrw::{BinRead, BinWrite};
use std::io::Cursor;

const EXPOSURE_VERSION: u32 = 2;
const ROLLING_SHUTTER_VERSION: u32 = 3;
const PIXEL_FORMAT_VERSION: u32 = 4;
const ISP_GAIN_VERSION: u32 = 5;
const OUTPUT_VERSION: u32 = 6;

/// Newest capture version this crate writes
pub const CAPTURE_VERSION_LATEST: u32 = OUTPUT_VERSION;

/// Version 2 exposure block
#[derive(Debug, Clone, PartialEq, Default, BinRead, BinWrite)]
#[brw(little)]
pub struct CaptureExposure {
    /// Exposure time in seconds
    pub exposure_time: f32,
    /// Exposure compensation
    pub exposure_compensation: f32,
    /// ISO sensitivity
    pub iso: u32,
    /// Lens focus position
    pub focus_position: i32,
    /// Signal-to-noise ratio
    pub snr: f32,
    /// Scene illuminance
    pub lux: f32,
    /// Per-channel sensor gains
    pub sensor_gains: [f32; 4],
    /// Flash power
    pub flash_power: f32,
    /// Flash to ambient light ratio
    pub flash_to_ambient_ratio: f32,
    /// Frame rate
    pub frame_rate: f32,
}

impl WireSize for CaptureExposure {
    const WIRE_SIZE: usize = 13 * 4;
}

/// Version 6 sensor output description
#[derive(Debug, Clone, PartialEq, Default)]
pub struct CaptureOutput {
    /// Output data format, wire encoding
    pub output_data_format: u32,
    /// Non-zero when samples are little-endian
    pub pixel_little_endian: u8,
    /// Embedded rows above the image
    pub embedded_line_count_top: u32,
    /// Embedded rows below the image
    pub embedded_line_count_bottom: u32,
    /// Calibration lookup table
    pub lut: Vec<f32>,
}

/// Capture metadata, one optional group per schema version
#[derive(Debug, Clone, PartialEq, Default)]
pub struct CaptureChunk {
    /// Payload version
    pub version: u32,
    /// Version 2+
    pub exposure: Option<CaptureExposure>,
    /// Version 3+
    pub rolling_shutter_length: Option<u32>,
    /// Version 4+
    pub pixel_format: Option<Vec<u8>>,
    /// Version 5+
    pub isp_digital_gain: Option<f32>,
    /// Version 6+
    pub output: Option<CaptureOutput>,
}

fn check_group<'a, T>(
    version: u32,
    introduced: u32,
    group: &'a Option<T>,
    field: &'static str,
) -> Result<Option<&'a T>> {
    match (version >= introduced, group) {
        (true, Some(value)) => Ok(Some(value)),
        (false, None) => Ok(None),
        _ => Err(NvRawError::InvalidField {
            field,
            value: i64::from(version),
        }),
    }
}

impl ChunkPayload for CaptureChunk {
    const TAG: ChunkTag = ChunkTag::Capture;
    const MIN_VERSION: Option<i32> = Some(1);

    fn parse(payload: &[u8]) -> Result<Self> {
        let mut cursor = PayloadCursor::new(payload, "capture chunk");
        let version = super::read_version::<Self>(&mut cursor)?;

        let mut chunk = Self {
            version,
            ..Self::default()
        };
        if version >= EXPOSURE_VERSION {
            chunk.exposure = Some(cursor.read_struct()?);
        }
        if version >= ROLLING_SHUTTER_VERSION {
            chunk.rolling_shutter_length = Some(cursor.read_u32()?);
        }
        if version >= PIXEL_FORMAT_VERSION {
            chunk.pixel_format = Some(cursor.read_string()?);
        }
        if version >= ISP_GAIN_VERSION {
            chunk.isp_digital_gain = Some(cursor.read_f32()?);
        }
        if version >= OUTPUT_VERSION {
            chunk.output = Some(CaptureOutput {
                output_data_format: cursor.read_u32()?,
                pixel_little_endian: cursor.read_u8()?,
                embedded_line_count_top: cursor.read_u32()?,
                embedded_line_count_bottom: cursor.read_u32()?,
                lut: cursor.read_lut()?,
            });
        }
        Ok(chunk)
    }

    fn build(&self) -> Result<Vec<u8>> {
        let version = self.version;
        let mut cursor = Cursor::new(Vec::new());
        version.write_le(&mut cursor)?;

        if let Some(exposure) =
            check_group(version, EXPOSURE_VERSION, &self.exposure, "capture exposure")?
        {
            exposure.write(&mut cursor)?;
        }
        if let Some(length) = check_group(
            version,
            ROLLING_SHUTTER_VERSION,
            &self.rolling_shutter_length,
            "capture rolling shutter",
        )? {
            length.write_le(&mut cursor)?;
        }

        let mut out = cursor.into_inner();
        if let Some(format) = check_group(
            version,
            PIXEL_FORMAT_VERSION,
            &self.pixel_format,
            "capture pixel format",
        )? {
            encode_string(format, &mut out)?;
        }
        if let Some(gain) = check_group(
            version,
            ISP_GAIN_VERSION,
            &self.isp_digital_gain,
            "capture ISP gain",
        )? {
            out.extend_from_slice(&gain.to_le_bytes());
        }
        if let Some(output) =
            check_group(version, OUTPUT_VERSION, &self.output, "capture output")?
        {
            out.extend_from_slice(&output.output_data_format.to_le_bytes());
            out.push(output.pixel_little_endian);
            out.extend_from_slice(&output.embedded_line_count_top.to_le_bytes());
            out.extend_from_slice(&output.embedded_line_count_bottom.to_le_bytes());
            encode_lut(&output.lut, &mut out)?;
        }
        Ok(out)
    }
}

#[cfg(test)]
#[allow(clippy::expect_used, clippy::unwrap_used)]
mod tests {
    use super::*;

    fn full_chunk() -> CaptureChunk {
        CaptureChunk {
            version: 6,
            exposure: Some(CaptureExposure {
                exposure_time: 0.01,
                exposure_compensation: 0.0,
                iso: 200,
                focus_position: 450,
                snr: 38.5,
                lux: 320.0,
                sensor_gains: [1.0, 1.25, 1.25, 1.5],
                flash_power: 0.0,
                flash_to_ambient_ratio: 0.0,
                frame_rate: 30.0,
            }),
            rolling_shutter_length: Some(16_000),
            pixel_format: Some(b"int16".to_vec()),
            isp_digital_gain: Some(1.5),
            output: Some(CaptureOutput {
                output_data_format: 3,
                pixel_little_endian: 1,
                embedded_line_count_top: 2,
                embedded_line_count_bottom: 1,
                lut: vec![0.0, 0.5, 1.0],
            }),
        }
    }

    /// Truncate the latest chunk down to `version`, keeping older groups
    fn chunk_at(version: u32) -> CaptureChunk {
        let full = full_chunk();
        CaptureChunk {
            version,
            exposure: full.exposure.filter(|_| version >= 2),
            rolling_shutter_length: full.rolling_shutter_length.filter(|_| version >= 3),
            pixel_format: full.pixel_format.filter(|_| version >= 4),
            isp_digital_gain: full.isp_digital_gain.filter(|_| version >= 5),
            output: full.output.filter(|_| version >= 6),
        }
    }

    #[test]
    fn test_v2_block_is_fourteen_words() {
        let payload = chunk_at(2).build().expect("Operation should succeed");
        assert_eq!(payload.len(), 14 * 4);
    }

    #[test]
    fn test_v6_layout() {
        let payload = full_chunk().build().expect("Operation should succeed");
        // 14 words + rolling shutter + "int16" string + ISP gain
        let output_offset = 14 * 4 + 4 + (4 + 5) + 4;
        assert_eq!(&payload[output_offset..output_offset + 4], &3_u32.to_le_bytes());
        assert_eq!(payload[output_offset + 4], 1);
        assert_eq!(payload.len(), output_offset + 4 + 1 + 4 + 4 + 4 + 12);
    }

    #[test]
    fn test_each_version_parses_its_groups() {
        for version in 1..=6 {
            let chunk = chunk_at(version);
            let payload = chunk.build().expect("Operation should succeed");
            let parsed = CaptureChunk::parse(&payload).expect("Operation should succeed");
            assert_eq!(parsed, chunk, "version {version}");
        }
    }

    #[test]
    fn test_later_versions_keep_earlier_fields() {
        let mut previous = CaptureChunk::parse(&chunk_at(1).build().expect("build"))
            .expect("Operation should succeed");
        for version in 2..=6 {
            let current = CaptureChunk::parse(&chunk_at(version).build().expect("build"))
                .expect("Operation should succeed");
            if previous.exposure.is_some() {
                assert_eq!(current.exposure, previous.exposure);
            }
            if previous.rolling_shutter_length.is_some() {
                assert_eq!(current.rolling_shutter_length, previous.rolling_shutter_length);
            }
            if previous.pixel_format.is_some() {
                assert_eq!(current.pixel_format, previous.pixel_format);
            }
            if previous.isp_digital_gain.is_some() {
                assert_eq!(current.isp_digital_gain, previous.isp_digital_gain);
            }
            previous = current;
        }
    }

    #[test]
    fn test_future_version_reads_known_groups() {
        let mut chunk = full_chunk();
        chunk.version = 6;
        let mut payload = chunk.build().expect("Operation should succeed");
        payload[0..4].copy_from_slice(&9_u32.to_le_bytes());
        payload.extend_from_slice(&[0xEE; 12]);

        let parsed = CaptureChunk::parse(&payload).expect("Operation should succeed");
        assert_eq!(parsed.version, 9);
        assert_eq!(parsed.output, full_chunk().output);
    }

    #[test]
    fn test_version_claims_missing_group() {
        let mut payload = chunk_at(4).build().expect("Operation should succeed");
        payload[0..4].copy_from_slice(&5_u32.to_le_bytes());

        let err = CaptureChunk::parse(&payload).expect_err("ISP gain is missing");
        assert!(err.is_truncated());
    }

    #[test]
    fn test_short_exposure_block() {
        let mut payload = chunk_at(2).build().expect("Operation should succeed");
        payload.truncate(4 + 20);

        let err = CaptureChunk::parse(&payload).expect_err("Exposure block cut short");
        assert!(matches!(
            err,
            NvRawError::TruncatedInput {
                needed: 52,
                available: 20,
                ..
            }
        ));
    }

    #[test]
    fn test_build_rejects_inconsistent_groups() {
        let mut chunk = chunk_at(3);
        chunk.isp_digital_gain = Some(2.0);
        assert!(chunk.build().is_err());

        let mut chunk = chunk_at(5);
        chunk.exposure = None;
        assert!(chunk.build().is_err());
    }
}
