//! Decoded NVRAW capture

use crate::bayer::BayerPhase;
use crate::error::{Diagnostic, NvRawError, Result};
use crate::output_format::OutputDataFormat;
use crate::pixels::{ActiveFrame, RawFrame};

/// Sample format tag used when a file does not name one
pub const DEFAULT_PIXEL_FORMAT: &str = "int16";

/// One exposure of an HDR capture
#[derive(Debug, Clone, PartialEq, Default)]
pub struct HdrExposureInfo {
    /// Exposure symbol (four raw bytes)
    pub symbol: [u8; 4],
    /// Exposure time in seconds
    pub exposure_time: f32,
    /// Per-channel analog gains
    pub analog_gains: [f32; 4],
    /// Per-channel digital gains
    pub digital_gains: [f32; 4],
    /// Per-channel AWB gains (HDR chunk v2+)
    pub awb_gains: [f32; 4],
    /// Conversion gain flag (HDR chunk v2+)
    pub conversion_gain: bool,
}

/// A single decoded capture with its metadata
///
/// `width`, `height` and `pixel_data` describe the active image region;
/// embedded metadata rows have already been moved to `embedded_lines_top`
/// and `embedded_lines_bottom`.
#[derive(Debug, Clone, PartialEq)]
pub struct RawImageRecord {
    /// Active region width
    pub width: u32,
    /// Active region height
    pub height: u32,
    /// Color filter tile order
    pub bayer_phase: BayerPhase,
    /// Significant bits per sample
    pub bits_per_sample: u32,
    /// Samples per pixel (chunked header)
    pub samples_per_pixel: i32,
    /// Number of images (chunked header)
    pub image_count: i32,
    /// Capture time, seconds part (chunked header)
    pub capture_time_sec: i32,
    /// Capture time, milliseconds part (chunked header)
    pub capture_time_ms: i32,
    /// Header flags (chunked header)
    pub header_flags: i32,
    /// Sample format tag
    pub pixel_format: String,

    /// ISO sensitivity
    pub iso: u32,
    /// Exposure time in seconds
    pub exposure_time: f32,
    /// Exposure compensation
    pub exposure_compensation: f32,
    /// Lens focus position
    pub focus_position: i32,
    /// Signal-to-noise ratio
    pub snr: f32,
    /// Scene illuminance
    pub lux: f32,
    /// ISP digital gain
    pub isp_digital_gain: f32,
    /// Per-channel sensor gains
    pub sensor_gains: [f32; 4],
    /// Flash power
    pub flash_power: f32,
    /// Flash to ambient light ratio
    pub flash_to_ambient_ratio: f32,
    /// Sensor frame rate
    pub frame_rate: f32,
    /// Rolling shutter length
    pub rolling_shutter_length: u32,

    /// Per-channel AWB gains
    pub awb_gains: [f32; 4],
    /// AWB convergence status
    pub awb_converge_status: i32,

    /// Sensor identifier bytes
    pub sensor_id: Vec<u8>,
    /// Fuse identifier bytes
    pub fuse_id: Vec<u8>,

    /// Sensor output data format
    pub output_data_format: OutputDataFormat,
    /// Whether samples were produced little-endian by the sensor
    pub pixel_little_endian: bool,
    /// Embedded metadata rows that preceded the image
    pub embedded_line_count_top: u32,
    /// Embedded metadata rows that followed the image
    pub embedded_line_count_bottom: u32,
    /// Samples of the top embedded rows
    pub embedded_lines_top: Vec<i16>,
    /// Samples of the bottom embedded rows
    pub embedded_lines_bottom: Vec<i16>,

    /// Ordinal of the pixel data chunk
    pub pixel_ordinal: i32,
    /// Row-major active image samples
    pub pixel_data: Vec<i16>,

    /// Calibration lookup table
    pub lut: Vec<f32>,

    /// Exposure count announced by the HDR chunk
    pub hdr_number_of_exposures: u32,
    /// HDR readout scheme
    pub hdr_readout_scheme: String,
    /// HDR exposure plan
    pub hdr_exposure_infos: Vec<HdrExposureInfo>,

    /// Non-fatal conditions seen while decoding
    pub diagnostics: Vec<Diagnostic>,
}

impl Default for RawImageRecord {
    fn default() -> Self {
        Self {
            width: 0,
            height: 0,
            bayer_phase: BayerPhase::default(),
            bits_per_sample: 0,
            samples_per_pixel: 0,
            image_count: 0,
            capture_time_sec: 0,
            capture_time_ms: 0,
            header_flags: 0,
            pixel_format: DEFAULT_PIXEL_FORMAT.to_string(),
            iso: 0,
            exposure_time: 0.0,
            exposure_compensation: 0.0,
            focus_position: 0,
            snr: 0.0,
            lux: 0.0,
            isp_digital_gain: 0.0,
            sensor_gains: [0.0; 4],
            flash_power: 0.0,
            flash_to_ambient_ratio: 0.0,
            frame_rate: 0.0,
            rolling_shutter_length: 0,
            awb_gains: [0.0; 4],
            awb_converge_status: 0,
            sensor_id: Vec::new(),
            fuse_id: Vec::new(),
            output_data_format: OutputDataFormat::default(),
            pixel_little_endian: false,
            embedded_line_count_top: 0,
            embedded_line_count_bottom: 0,
            embedded_lines_top: Vec::new(),
            embedded_lines_bottom: Vec::new(),
            pixel_ordinal: 0,
            pixel_data: Vec::new(),
            lut: Vec::new(),
            hdr_number_of_exposures: 0,
            hdr_readout_scheme: String::new(),
            hdr_exposure_infos: Vec::new(),
            diagnostics: Vec::new(),
        }
    }
}

impl RawImageRecord {
    /// Take the pixel layout from a stripped frame
    pub(crate) fn set_active_frame(&mut self, frame: ActiveFrame) {
        self.width = frame.width;
        self.height = frame.height;
        self.embedded_lines_top = frame.embedded_lines_top;
        self.embedded_lines_bottom = frame.embedded_lines_bottom;
        self.pixel_data = frame.pixels;
    }

    /// Pixel buffer as it is laid out on disk, embedded lines included
    ///
    /// Fails when the buffers do not match the dimensions and line counts,
    /// so a file written from the frame always decodes.
    pub fn raw_frame(&self) -> Result<RawFrame> {
        let height = self
            .height
            .checked_add(self.embedded_line_count_top)
            .and_then(|height| height.checked_add(self.embedded_line_count_bottom))
            .ok_or(NvRawError::InvalidField {
                field: "height with embedded lines",
                value: i64::from(self.height)
                    + i64::from(self.embedded_line_count_top)
                    + i64::from(self.embedded_line_count_bottom),
            })?;

        check_buffer(
            "embedded lines top",
            &self.embedded_lines_top,
            self.width,
            self.embedded_line_count_top,
        )?;
        check_buffer("pixel data", &self.pixel_data, self.width, self.height)?;
        check_buffer(
            "embedded lines bottom",
            &self.embedded_lines_bottom,
            self.width,
            self.embedded_line_count_bottom,
        )?;

        let mut samples = Vec::with_capacity(
            self.embedded_lines_top.len() + self.pixel_data.len() + self.embedded_lines_bottom.len(),
        );
        samples.extend_from_slice(&self.embedded_lines_top);
        samples.extend_from_slice(&self.pixel_data);
        samples.extend_from_slice(&self.embedded_lines_bottom);

        Ok(RawFrame {
            width: self.width,
            height,
            embedded_line_count_top: self.embedded_line_count_top,
            embedded_line_count_bottom: self.embedded_line_count_bottom,
            samples,
        })
    }

    /// Number of active samples implied by the dimensions
    pub fn expected_sample_count(&self) -> usize {
        self.width as usize * self.height as usize
    }

    /// Check if the record carries an HDR exposure plan
    pub fn is_hdr(&self) -> bool {
        !self.hdr_exposure_infos.is_empty()
    }
}

fn check_buffer(context: &'static str, samples: &[i16], width: u32, rows: u32) -> Result<()> {
    let expected = u64::from(width) * u64::from(rows);
    if samples.len() as u64 != expected {
        return Err(NvRawError::InvalidLength {
            context,
            length: samples.len() as i64,
        });
    }
    Ok(())
}

#[cfg(test)]
#[allow(clippy::expect_used, clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::pixels::extract_embedded_lines;

    #[test]
    fn test_default_pixel_format() {
        let record = RawImageRecord::default();
        assert_eq!(record.pixel_format, "int16");
        assert_eq!(record.output_data_format, OutputDataFormat::Linear10Bit);
        assert!(!record.is_hdr());
    }

    #[test]
    fn test_raw_frame_matches_stripped_input() {
        let frame = RawFrame {
            width: 2,
            height: 5,
            embedded_line_count_top: 1,
            embedded_line_count_bottom: 1,
            samples: (0..10).collect(),
        };
        let mut record = RawImageRecord {
            embedded_line_count_top: 1,
            embedded_line_count_bottom: 1,
            ..RawImageRecord::default()
        };
        record.set_active_frame(extract_embedded_lines(frame.clone()).expect("valid frame"));

        assert_eq!(record.height, 3);
        assert_eq!(record.expected_sample_count(), record.pixel_data.len());
        assert_eq!(record.raw_frame().expect("consistent record"), frame);
    }
}
