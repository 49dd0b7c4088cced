//! Chunk dispatch and record assembly
//!
//! Chunks are decoded as they arrive but only applied to the record in
//! [`RecordAssembler::finish`], in a fixed order. The embedded-line counts
//! come from the capture chunk and the samples from the pixel chunk, so
//! stripping has to wait until both are known regardless of stream order.

use super::{
    CameraStateChunk, CaptureChunk, ChunkPayload, ChunkTag, HdrChunk, HeaderChunk,
    PixelDataChunk, RawChunk, SensorInfoChunk, peek_version,
};
use crate::bayer::BayerPhase;
use crate::error::{Diagnostic, NvRawError, Result};
use crate::output_format::OutputDataFormat;
use crate::pixels::{RawFrame, extract_embedded_lines};
use crate::record::{HdrExposureInfo, RawImageRecord};
use tracing::{debug, warn};

/// Collects decoded chunks and produces a [`RawImageRecord`]
#[derive(Debug, Default)]
pub struct RecordAssembler {
    header: Option<HeaderChunk>,
    pixels: Option<PixelDataChunk>,
    capture: Option<CaptureChunk>,
    camera_state: Option<CameraStateChunk>,
    sensor_info: Option<SensorInfoChunk>,
    hdr: Option<HdrChunk>,
    diagnostics: Vec<Diagnostic>,
}

fn store<P: ChunkPayload>(slot: &mut Option<P>, value: Option<P>) {
    if let Some(value) = value
        && slot.replace(value).is_some()
    {
        warn!("Duplicate {} chunk, keeping the later one", P::TAG);
    }
}

fn non_negative(field: &'static str, value: i32) -> Result<u32> {
    u32::try_from(value).map_err(|_| NvRawError::InvalidField {
        field,
        value: i64::from(value),
    })
}

impl RecordAssembler {
    /// Create an empty assembler
    pub fn new() -> Self {
        Self::default()
    }

    /// Decode one chunk
    ///
    /// Unknown tags and payload versions below a decoder's minimum are
    /// skipped and noted as diagnostics. A later chunk of the same type
    /// replaces an earlier one.
    pub fn absorb(&mut self, chunk: RawChunk) -> Result<()> {
        let Some(kind) = chunk.kind() else {
            warn!("Skipping unknown chunk {}", chunk.tag_str());
            self.diagnostics.push(Diagnostic::UnknownChunk(chunk.tag));
            return Ok(());
        };

        let payload = chunk.payload.as_slice();
        match kind {
            ChunkTag::Header => {
                let value = self.decode::<HeaderChunk>(payload)?;
                store(&mut self.header, value);
            }
            ChunkTag::PixelData => {
                let value = self.decode::<PixelDataChunk>(payload)?;
                store(&mut self.pixels, value);
            }
            ChunkTag::Capture => {
                let value = self.decode::<CaptureChunk>(payload)?;
                store(&mut self.capture, value);
            }
            ChunkTag::CameraState => {
                let value = self.decode::<CameraStateChunk>(payload)?;
                store(&mut self.camera_state, value);
            }
            ChunkTag::SensorInfo => {
                let value = self.decode::<SensorInfoChunk>(payload)?;
                store(&mut self.sensor_info, value);
            }
            ChunkTag::Hdr => {
                let value = self.decode::<HdrChunk>(payload)?;
                store(&mut self.hdr, value);
            }
        }
        Ok(())
    }

    fn decode<P: ChunkPayload>(&mut self, payload: &[u8]) -> Result<Option<P>> {
        if let (Some(min), Some(version)) = (P::MIN_VERSION, peek_version(payload))
            && version < min
        {
            warn!(
                "Skipping {} chunk: version {} is older than {}",
                P::TAG,
                version,
                min
            );
            self.diagnostics.push(Diagnostic::UnsupportedChunkVersion {
                tag: *P::TAG.bytes(),
                version: i64::from(version),
            });
            return Ok(None);
        }
        debug!("Decoding {} chunk, {} bytes", P::TAG, payload.len());
        P::parse(payload).map(Some)
    }

    /// Build the record from everything absorbed
    pub fn finish(self) -> Result<RawImageRecord> {
        let Self {
            header,
            pixels,
            capture,
            camera_state,
            sensor_info,
            hdr,
            mut diagnostics,
        } = self;

        let mut record = RawImageRecord::default();
        let (mut width, mut height) = (0, 0);

        if let Some(header) = header {
            width = non_negative("width", header.width)?;
            height = non_negative("height", header.height)?;
            record.bayer_phase = BayerPhase::from_code(header.bayer_phase);
            record.bits_per_sample = non_negative("bits per sample", header.bits_per_sample)?;
            record.samples_per_pixel = header.samples_per_pixel;
            record.image_count = header.image_count;
            record.capture_time_sec = header.time_sec;
            record.capture_time_ms = header.time_ms;
            record.header_flags = header.flags;
        }

        if let Some(capture) = capture {
            apply_capture(&mut record, capture, &mut diagnostics);
        }

        if let Some(state) = camera_state {
            record.awb_converge_status = state.converge_status;
            record.awb_gains = state.awb_gains;
        }

        if let Some(info) = sensor_info {
            record.sensor_id = info.sensor_id;
            record.fuse_id = info.fuse_id;
        }

        if let Some(hdr) = hdr {
            record.hdr_number_of_exposures = hdr.exposures.len() as u32;
            record.hdr_readout_scheme = String::from_utf8_lossy(&hdr.readout_scheme).into_owned();
            record.hdr_exposure_infos = hdr
                .exposures
                .into_iter()
                .map(|exposure| HdrExposureInfo {
                    symbol: exposure.symbol,
                    exposure_time: exposure.exposure_time,
                    analog_gains: exposure.analog_gains,
                    digital_gains: exposure.digital_gains,
                    awb_gains: exposure.awb_gains.unwrap_or_default(),
                    conversion_gain: exposure.conversion_gain.is_some_and(|flag| flag != 0),
                })
                .collect();
        }

        match pixels {
            Some(pixels) => {
                record.pixel_ordinal = pixels.ordinal;
                let frame = extract_embedded_lines(RawFrame {
                    width,
                    height,
                    embedded_line_count_top: record.embedded_line_count_top,
                    embedded_line_count_bottom: record.embedded_line_count_bottom,
                    samples: pixels.samples,
                })?;
                record.set_active_frame(frame);
            }
            None => {
                debug!("No pixel data chunk");
                record.width = width;
                record.height = height;
            }
        }

        record.diagnostics = diagnostics;
        Ok(record)
    }
}

fn apply_capture(
    record: &mut RawImageRecord,
    capture: CaptureChunk,
    diagnostics: &mut Vec<Diagnostic>,
) {
    if let Some(exposure) = capture.exposure {
        record.exposure_time = exposure.exposure_time;
        record.exposure_compensation = exposure.exposure_compensation;
        record.iso = exposure.iso;
        record.focus_position = exposure.focus_position;
        record.snr = exposure.snr;
        record.lux = exposure.lux;
        record.sensor_gains = exposure.sensor_gains;
        record.flash_power = exposure.flash_power;
        record.flash_to_ambient_ratio = exposure.flash_to_ambient_ratio;
        record.frame_rate = exposure.frame_rate;
    }
    if let Some(length) = capture.rolling_shutter_length {
        record.rolling_shutter_length = length;
    }
    if let Some(format) = capture.pixel_format {
        record.pixel_format = String::from_utf8_lossy(&format).into_owned();
    }
    if let Some(gain) = capture.isp_digital_gain {
        record.isp_digital_gain = gain;
    }
    if let Some(output) = capture.output {
        record.output_data_format = match OutputDataFormat::from_wire(output.output_data_format) {
            Ok(format) => format,
            Err(e) => {
                warn!("{e}, keeping the raw value");
                diagnostics.push(Diagnostic::UnmappedOutputDataFormat(
                    output.output_data_format,
                ));
                OutputDataFormat::Unmapped(output.output_data_format)
            }
        };
        record.pixel_little_endian = output.pixel_little_endian != 0;
        record.embedded_line_count_top = output.embedded_line_count_top;
        record.embedded_line_count_bottom = output.embedded_line_count_bottom;
        record.lut = output.lut;
    }
}
