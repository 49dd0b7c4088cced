//! Legacy header structures
//!
//! The legacy header is a fixed 298,672-byte block:
//!
//! | Offset | Size    | Content                                   |
//! |--------|---------|-------------------------------------------|
//! | 0      | 108     | Core header, ending in the stats sentinel |
//! | 108    | 16,384  | Opaque statistics blob                    |
//! | 16,492 | 282,112 | AF input block, AWB state at its start    |
//! | 298,604| 64      | Opaque sharpness blob                     |
//! | 298,668| 4       | Bayer-start sentinel                      |
//!
//! All integers are little-endian. The pixel body follows immediately.

use binrw::{BinRead, BinWrite};

/// Size of the core header, stats sentinel included
pub const CORE_HEADER_SIZE: usize = 4 * 27;

/// Size of the opaque statistics blob
pub const STATS_BLOB_SIZE: usize = 4 * (64 * 64);

/// Size of the AF input block that carries the AWB state
pub const AF_INPUT_SIZE: usize = 4 * ((152 * 116 / 4) * 16);

/// Size of the opaque sharpness blob
pub const SHARPNESS_BLOB_SIZE: usize = 4 * 16;

/// Offset of the AWB state inside the header
pub const AWB_STATE_OFFSET: usize = CORE_HEADER_SIZE + STATS_BLOB_SIZE;

/// Offset of the bayer-start sentinel
pub const BAYER_SENTINEL_OFFSET: usize = AWB_STATE_OFFSET + AF_INPUT_SIZE + SHARPNESS_BLOB_SIZE;

/// Total header size up to the pixel body
pub const LEGACY_HEADER_SIZE: usize = BAYER_SENTINEL_OFFSET + 4;

/// Value of the stats-start sentinel
pub const STATS_SENTINEL: u32 = 0xDEAD_BEEF;

/// Value of the bayer-start sentinel
pub const BAYER_SENTINEL: u32 = 0xCAFE_FEED;

/// Legacy files carry no sample depth; they are 10-bit
pub const LEGACY_BITS_PER_SAMPLE: u32 = 10;

/// Convert a 16.16 fixed-point value to float
pub fn fixed_to_float(value: i32) -> f32 {
    (f64::from(value) / 65536.0) as f32
}

/// Convert a float to 16.16 fixed point
pub fn float_to_fixed(value: f32) -> i32 {
    (f64::from(value) * 65536.0 + 0.5) as i32
}

/// First 108 bytes of a legacy header
#[derive(Debug, Clone, PartialEq, BinRead, BinWrite)]
#[brw(little)]
pub struct LegacyCoreHeader {
    /// Magic word, always 1
    pub magic: u32,
    /// Header version (1 or 2; 3 and 4 read as 2)
    pub version: u32,
    /// Image width
    pub width: i32,
    /// Image height
    pub height: i32,
    /// Bayer phase code
    pub bayer_phase: i32,
    /// Padding and sensor GUID, unused
    pub reserved: [u32; 3],
    /// Exposure time, 16.16 fixed point
    pub exposure_time: i32,
    /// ISO sensitivity
    pub iso: i32,
    /// Exposure compensation, 16.16 fixed point
    pub exposure_compensation: i32,
    /// Illuminant, unused
    pub illuminant: i32,
    /// Lens focus position
    pub focus_position: u32,
    /// ISP RGB gains, unused
    pub isp_rgb_gains: [i32; 4],
    /// Per-channel sensor gains
    pub sensor_gains: [f32; 4],
    /// Sensor exposure, unused
    pub sensor_exposure: f32,
    /// Debug bytes, unused
    pub debug: [u8; 16],
    /// Must equal [`STATS_SENTINEL`]
    pub stats_start_mark: u32,
}

/// AWB state stored at the start of the AF input block (version 2+)
#[derive(Debug, Clone, PartialEq, Default, BinRead, BinWrite)]
#[brw(little)]
pub struct LegacyAwbState {
    /// Last good gray point guess, unused
    pub last_good_guess: [f32; 2],
    /// Sane gray point flag, unused
    pub found_sane_graypoint: i32,
    /// AWB convergence status
    pub converge_status: u32,
    /// Per-channel AWB gains
    pub gains: [f32; 4],
}

#[cfg(test)]
#[allow(clippy::expect_used, clippy::unwrap_used)]
mod tests {
    use super::*;
    use std::io::Cursor;

    #[test]
    fn test_layout_constants() {
        assert_eq!(CORE_HEADER_SIZE, 108);
        assert_eq!(AWB_STATE_OFFSET, 16_492);
        assert_eq!(AF_INPUT_SIZE, 282_112);
        assert_eq!(LEGACY_HEADER_SIZE, 298_672);
    }

    #[test]
    fn test_core_header_size() {
        let header = LegacyCoreHeader {
            magic: 1,
            version: 1,
            width: 4,
            height: 2,
            bayer_phase: 0,
            reserved: [0; 3],
            exposure_time: 0,
            iso: 100,
            exposure_compensation: 0,
            illuminant: 0,
            focus_position: 0,
            isp_rgb_gains: [0; 4],
            sensor_gains: [1.0; 4],
            sensor_exposure: 0.0,
            debug: [0; 16],
            stats_start_mark: STATS_SENTINEL,
        };
        let mut buffer = Cursor::new(Vec::new());
        header.write(&mut buffer).expect("Operation should succeed");
        let bytes = buffer.into_inner();

        assert_eq!(bytes.len(), CORE_HEADER_SIZE);
        assert_eq!(&bytes[104..108], &STATS_SENTINEL.to_le_bytes());

        let parsed = LegacyCoreHeader::read(&mut Cursor::new(&bytes)).expect("Operation should succeed");
        assert_eq!(parsed, header);
    }

    #[test]
    fn test_awb_state_size() {
        let mut buffer = Cursor::new(Vec::new());
        LegacyAwbState::default()
            .write(&mut buffer)
            .expect("Operation should succeed");
        assert_eq!(buffer.into_inner().len(), 32);
    }

    #[test]
    fn test_fixed_point() {
        assert_eq!(float_to_fixed(1.0), 65536);
        assert_eq!(float_to_fixed(0.5), 32768);
        assert!((fixed_to_float(32768) - 0.5).abs() < f32::EPSILON);
        assert!((fixed_to_float(float_to_fixed(0.033)) - 0.033).abs() < 1.0 / 65536.0);
    }
}
