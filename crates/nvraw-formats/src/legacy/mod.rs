//! Legacy fixed-layout NVRAW files
//!
//! A legacy file is a fixed-size header ([`LEGACY_HEADER_SIZE`] bytes) followed
//! by `width * height` signed 16-bit samples. Two sentinels guard the header
//! layout; if either does not match, the file is rejected as a whole.
//!
//! Header version 1 carries no AWB state. Version 2 (and 3, 4, which decode
//! the same way) stores AWB gains and convergence status at the start of the
//! AF input block.
//!
//! ```rust,no_run
//! use nvraw_formats::legacy::LegacyFile;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let data = std::fs::read("capture.nvraw")?;
//! let file = LegacyFile::parse(&data)?;
//! let record = file.into_record()?;
//! println!("{}x{} {}", record.width, record.height, record.bayer_phase);
//! # Ok(())
//! # }
//! ```

mod header;

pub use header::{
    AF_INPUT_SIZE, AWB_STATE_OFFSET, BAYER_SENTINEL, BAYER_SENTINEL_OFFSET, CORE_HEADER_SIZE,
    LEGACY_BITS_PER_SAMPLE, LEGACY_HEADER_SIZE, LegacyAwbState, LegacyCoreHeader,
    SHARPNESS_BLOB_SIZE, STATS_BLOB_SIZE, STATS_SENTINEL, fixed_to_float, float_to_fixed,
};

use crate::NvRawFormat;
use crate::bayer::BayerPhase;
use crate::detect::LEGACY_MAGIC;
use crate::error::{NvRawError, Result};
use crate::pixels::{RawFrame, extract_embedded_lines};
use crate::primitives::{samples_from_le_bytes, samples_to_le_bytes};
use crate::record::RawImageRecord;
use binrw::{BinRead, BinWrite};
use std::io::Cursor;
use tracing::debug;

/// First header version that carries AWB state
const AWB_STATE_VERSION: u32 = 2;

/// Parsed legacy file
#[derive(Debug, Clone, PartialEq)]
pub struct LegacyFile {
    /// Core header
    pub header: LegacyCoreHeader,
    /// AWB state (header version 2+)
    pub awb: Option<LegacyAwbState>,
    /// Row-major samples
    pub pixels: Vec<i16>,
}

fn read_u32_at(data: &[u8], offset: usize) -> u32 {
    u32::from_le_bytes([
        data[offset],
        data[offset + 1],
        data[offset + 2],
        data[offset + 3],
    ])
}

fn dimension(field: &'static str, value: i32) -> Result<u32> {
    u32::try_from(value).map_err(|_| NvRawError::InvalidField {
        field,
        value: i64::from(value),
    })
}

impl LegacyFile {
    /// Parse a complete legacy file
    ///
    /// Fails without producing anything if either sentinel is wrong or the
    /// pixel body is shorter than `width * height` samples.
    pub fn parse(data: &[u8]) -> Result<Self> {
        if data.len() < LEGACY_HEADER_SIZE {
            return Err(NvRawError::truncated(
                "legacy header",
                LEGACY_HEADER_SIZE,
                data.len(),
            ));
        }

        let bayer_mark = read_u32_at(data, BAYER_SENTINEL_OFFSET);
        if bayer_mark != BAYER_SENTINEL {
            return Err(NvRawError::SentinelMismatch {
                sentinel: "bayer start",
                expected: BAYER_SENTINEL,
                actual: bayer_mark,
            });
        }

        let header = LegacyCoreHeader::read(&mut Cursor::new(&data[..CORE_HEADER_SIZE]))?;
        if header.stats_start_mark != STATS_SENTINEL {
            return Err(NvRawError::SentinelMismatch {
                sentinel: "stats start",
                expected: STATS_SENTINEL,
                actual: header.stats_start_mark,
            });
        }
        debug!(
            "Legacy header: version {} {}x{}",
            header.version, header.width, header.height
        );

        let awb = if header.version >= AWB_STATE_VERSION {
            let block = &data[AWB_STATE_OFFSET..AWB_STATE_OFFSET + AF_INPUT_SIZE];
            Some(LegacyAwbState::read(&mut Cursor::new(block))?)
        } else {
            None
        };

        let width = dimension("width", header.width)?;
        let height = dimension("height", header.height)?;
        let body_len = (width as usize)
            .checked_mul(height as usize)
            .and_then(|samples| samples.checked_mul(2))
            .ok_or(NvRawError::InvalidField {
                field: "frame size",
                value: i64::from(width) * i64::from(height),
            })?;
        let body = data
            .get(LEGACY_HEADER_SIZE..LEGACY_HEADER_SIZE + body_len)
            .ok_or_else(|| {
                NvRawError::truncated(
                    "legacy pixel body",
                    body_len,
                    data.len() - LEGACY_HEADER_SIZE,
                )
            })?;
        let pixels = samples_from_le_bytes(body, "legacy pixel body")?;

        Ok(Self {
            header,
            awb,
            pixels,
        })
    }

    /// Serialize header and pixel body
    pub fn build(&self) -> Result<Vec<u8>> {
        let expected = self.header.width.max(0) as usize * self.header.height.max(0) as usize;
        if self.pixels.len() != expected {
            return Err(NvRawError::InvalidLength {
                context: "legacy pixel body",
                length: self.pixels.len() as i64,
            });
        }

        let mut buffer = vec![0u8; LEGACY_HEADER_SIZE];
        {
            let mut cursor = Cursor::new(&mut buffer[..]);
            self.header.write(&mut cursor)?;
        }

        if self.header.version >= AWB_STATE_VERSION {
            let awb = self.awb.clone().unwrap_or_default();
            let mut cursor = Cursor::new(&mut buffer[AWB_STATE_OFFSET..]);
            awb.write(&mut cursor)?;
        }

        buffer[BAYER_SENTINEL_OFFSET..LEGACY_HEADER_SIZE]
            .copy_from_slice(&BAYER_SENTINEL.to_le_bytes());

        samples_to_le_bytes(&self.pixels, &mut buffer);
        Ok(buffer)
    }

    /// Build a legacy file from a record
    ///
    /// Header version 2 is chosen when any AWB gain is non-zero, version 1
    /// otherwise. Embedded lines are not representable and are dropped.
    pub fn from_record(record: &RawImageRecord) -> Result<Self> {
        let version = if record.awb_gains.iter().any(|gain| *gain != 0.0) {
            AWB_STATE_VERSION
        } else {
            1
        };
        let width = i32::try_from(record.width).map_err(|_| NvRawError::InvalidField {
            field: "width",
            value: i64::from(record.width),
        })?;
        let height = i32::try_from(record.height).map_err(|_| NvRawError::InvalidField {
            field: "height",
            value: i64::from(record.height),
        })?;

        let header = LegacyCoreHeader {
            magic: LEGACY_MAGIC,
            version,
            width,
            height,
            bayer_phase: record.bayer_phase.to_code(),
            reserved: [0; 3],
            exposure_time: float_to_fixed(record.exposure_time),
            iso: record.iso as i32,
            exposure_compensation: float_to_fixed(record.exposure_compensation),
            illuminant: 0,
            focus_position: record.focus_position as u32,
            isp_rgb_gains: [0; 4],
            sensor_gains: record.sensor_gains,
            sensor_exposure: 0.0,
            debug: [0; 16],
            stats_start_mark: STATS_SENTINEL,
        };

        let awb = (version >= AWB_STATE_VERSION).then(|| LegacyAwbState {
            converge_status: record.awb_converge_status as u32,
            gains: record.awb_gains,
            ..LegacyAwbState::default()
        });

        Ok(Self {
            header,
            awb,
            pixels: record.pixel_data.clone(),
        })
    }

    /// Convert into a decoded record
    pub fn into_record(self) -> Result<RawImageRecord> {
        let Self {
            header,
            awb,
            pixels,
        } = self;

        let mut record = RawImageRecord {
            bayer_phase: BayerPhase::from_code(header.bayer_phase),
            bits_per_sample: LEGACY_BITS_PER_SAMPLE,
            iso: header.iso as u32,
            exposure_time: fixed_to_float(header.exposure_time),
            exposure_compensation: fixed_to_float(header.exposure_compensation),
            focus_position: header.focus_position as i32,
            sensor_gains: header.sensor_gains,
            ..RawImageRecord::default()
        };
        if let Some(awb) = awb {
            record.awb_converge_status = awb.converge_status as i32;
            record.awb_gains = awb.gains;
        }

        let frame = extract_embedded_lines(RawFrame {
            width: dimension("width", header.width)?,
            height: dimension("height", header.height)?,
            embedded_line_count_top: 0,
            embedded_line_count_bottom: 0,
            samples: pixels,
        })?;
        record.set_active_frame(frame);
        Ok(record)
    }
}

impl NvRawFormat for LegacyFile {
    fn parse(data: &[u8]) -> Result<Self> {
        Self::parse(data)
    }

    fn build(&self) -> Result<Vec<u8>> {
        self.build()
    }
}

#[cfg(test)]
#[allow(clippy::expect_used, clippy::unwrap_used, clippy::panic)]
mod tests {
    use super::*;
    use crate::test_utils::test_round_trip;

    fn sample_record() -> RawImageRecord {
        RawImageRecord {
            width: 4,
            height: 3,
            bayer_phase: "RGGB".parse().expect("valid phase"),
            bits_per_sample: LEGACY_BITS_PER_SAMPLE,
            iso: 400,
            exposure_time: 0.03125,
            exposure_compensation: 0.25,
            focus_position: 312,
            sensor_gains: [1.0, 1.5, 1.5, 2.0],
            awb_gains: [1.8, 1.0, 1.0, 1.6],
            awb_converge_status: 1,
            pixel_data: (0..12).map(|v| v * 64).collect(),
            ..RawImageRecord::default()
        }
    }

    #[test]
    fn test_version_selection() {
        let record = sample_record();
        let file = LegacyFile::from_record(&record).expect("Operation should succeed");
        assert_eq!(file.header.version, 2);
        assert!(file.awb.is_some());

        let record = RawImageRecord {
            awb_gains: [0.0; 4],
            ..sample_record()
        };
        let file = LegacyFile::from_record(&record).expect("Operation should succeed");
        assert_eq!(file.header.version, 1);
        assert!(file.awb.is_none());
    }

    #[test]
    fn test_build_layout() {
        let file = LegacyFile::from_record(&sample_record()).expect("Operation should succeed");
        let data = file.build().expect("Operation should succeed");

        assert_eq!(data.len(), LEGACY_HEADER_SIZE + 12 * 2);
        assert_eq!(&data[0..4], &1_u32.to_le_bytes());
        assert_eq!(&data[4..8], &2_u32.to_le_bytes());
        assert_eq!(&data[104..108], &STATS_SENTINEL.to_le_bytes());
        assert_eq!(
            &data[BAYER_SENTINEL_OFFSET..LEGACY_HEADER_SIZE],
            &BAYER_SENTINEL.to_le_bytes()
        );
        // AWB gains follow last_good_guess[2], sane flag and converge status
        assert_eq!(
            &data[AWB_STATE_OFFSET + 16..AWB_STATE_OFFSET + 20],
            &1.8_f32.to_le_bytes()
        );
    }

    #[test]
    fn test_record_round_trip() {
        let record = sample_record();
        let data = LegacyFile::from_record(&record)
            .and_then(|file| file.build())
            .expect("Operation should succeed");
        let decoded = LegacyFile::parse(&data)
            .and_then(LegacyFile::into_record)
            .expect("Operation should succeed");

        assert_eq!(decoded, record);
    }

    #[test]
    fn test_file_round_trip() {
        let file = LegacyFile::from_record(&sample_record()).expect("Operation should succeed");
        test_round_trip(&file).expect("Round trip should succeed");
    }

    #[test]
    fn test_version_one_ignores_af_block() {
        let record = RawImageRecord {
            awb_gains: [0.0; 4],
            ..sample_record()
        };
        let mut data = LegacyFile::from_record(&record)
            .and_then(|file| file.build())
            .expect("Operation should succeed");
        // Garbage in the AF block of a v1 file must not leak into the record
        data[AWB_STATE_OFFSET..AWB_STATE_OFFSET + 32].fill(0x3F);

        let decoded = LegacyFile::parse(&data)
            .and_then(LegacyFile::into_record)
            .expect("Operation should succeed");
        assert_eq!(decoded.awb_gains, [0.0; 4]);
        assert_eq!(decoded.awb_converge_status, 0);
    }

    #[test]
    fn test_version_three_reads_awb() {
        let mut data = LegacyFile::from_record(&sample_record())
            .and_then(|file| file.build())
            .expect("Operation should succeed");
        data[4..8].copy_from_slice(&3_u32.to_le_bytes());

        let decoded = LegacyFile::parse(&data)
            .and_then(LegacyFile::into_record)
            .expect("Operation should succeed");
        assert_eq!(decoded.awb_gains, [1.8, 1.0, 1.0, 1.6]);
    }

    #[test]
    fn test_bayer_sentinel_mismatch() {
        let mut data = LegacyFile::from_record(&sample_record())
            .and_then(|file| file.build())
            .expect("Operation should succeed");
        data[BAYER_SENTINEL_OFFSET] ^= 0xFF;

        match LegacyFile::parse(&data) {
            Err(NvRawError::SentinelMismatch { sentinel, .. }) => {
                assert_eq!(sentinel, "bayer start");
            }
            other => panic!("expected sentinel mismatch, got {other:?}"),
        }
    }

    #[test]
    fn test_stats_sentinel_mismatch() {
        let mut data = LegacyFile::from_record(&sample_record())
            .and_then(|file| file.build())
            .expect("Operation should succeed");
        data[104..108].copy_from_slice(&0_u32.to_le_bytes());

        let err = LegacyFile::parse(&data).expect_err("Corrupt stats sentinel");
        assert!(err.is_structural_corruption());
    }

    #[test]
    fn test_truncated_pixel_body() {
        let data = LegacyFile::from_record(&sample_record())
            .and_then(|file| file.build())
            .expect("Operation should succeed");

        let err = LegacyFile::parse(&data[..data.len() - 1]).expect_err("Short body");
        assert!(err.is_truncated());

        let err = LegacyFile::parse(&data[..1000]).expect_err("Short header");
        assert!(err.is_truncated());
    }

    #[test]
    fn test_build_rejects_wrong_pixel_count() {
        let mut file = LegacyFile::from_record(&sample_record()).expect("Operation should succeed");
        file.pixels.pop();
        assert!(file.build().is_err());
    }
}
