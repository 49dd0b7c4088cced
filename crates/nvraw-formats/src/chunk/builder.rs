//! Chunked file builder

use super::{
    CAPTURE_VERSION_LATEST, CameraStateChunk, CaptureChunk, CaptureExposure, CaptureOutput,
    ChunkPayload, ChunkTag, ChunkedFile, HdrChunk, HdrExposure, HeaderChunk, PixelDataChunk,
    RawChunk, SensorInfoChunk,
};
use crate::error::{NvRawError, Result};
use crate::record::RawImageRecord;

/// HDR version written when a record carries an exposure plan
const HDR_VERSION: u32 = 2;

fn to_i32(field: &'static str, value: u32) -> Result<i32> {
    i32::try_from(value).map_err(|_| NvRawError::InvalidField {
        field,
        value: i64::from(value),
    })
}

/// Builder for chunked NVRAW files
///
/// ```rust
/// use nvraw_formats::chunk::{ChunkTag, ChunkedFileBuilder};
/// use nvraw_formats::RawImageRecord;
///
/// # fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let record = RawImageRecord {
///     width: 2,
///     height: 2,
///     bits_per_sample: 10,
///     pixel_data: vec![0, 1, 2, 3],
///     ..RawImageRecord::default()
/// };
/// let data = ChunkedFileBuilder::from_record(&record)?
///     .add_raw_chunk(*b"VENDOR__NOTES001", b"lab bench".to_vec())
///     .with_chunk_order(&[ChunkTag::Header, ChunkTag::Capture, ChunkTag::PixelData])
///     .build()?;
/// assert_eq!(&data[..8], b"NVRAWFIL");
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone, Default)]
pub struct ChunkedFileBuilder {
    chunks: Vec<RawChunk>,
}

impl ChunkedFileBuilder {
    /// Create an empty builder
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a builder holding every chunk needed to represent `record`
    ///
    /// Chunks are added in the order header, pixel data, capture, camera
    /// state, sensor info and, when the record has an HDR plan, HDR.
    ///
    /// Fails on buffers that disagree with the dimensions, and on an
    /// `Unmapped(v)` output format whose `v` is in the wire table.
    pub fn from_record(record: &RawImageRecord) -> Result<Self> {
        let frame = record.raw_frame()?;
        if !record.output_data_format.is_canonical() {
            return Err(NvRawError::InvalidField {
                field: "output data format",
                value: i64::from(record.output_data_format.to_wire()),
            });
        }

        let header = HeaderChunk {
            width: to_i32("width", frame.width)?,
            height: to_i32("height", frame.height)?,
            bayer_phase: record.bayer_phase.to_code(),
            bits_per_sample: to_i32("bits per sample", record.bits_per_sample)?,
            samples_per_pixel: record.samples_per_pixel,
            image_count: record.image_count,
            time_sec: record.capture_time_sec,
            time_ms: record.capture_time_ms,
            flags: record.header_flags,
        };

        let pixels = PixelDataChunk {
            version: 1,
            ordinal: record.pixel_ordinal,
            samples: frame.samples,
        };

        let capture = CaptureChunk {
            version: CAPTURE_VERSION_LATEST,
            exposure: Some(CaptureExposure {
                exposure_time: record.exposure_time,
                exposure_compensation: record.exposure_compensation,
                iso: record.iso,
                focus_position: record.focus_position,
                snr: record.snr,
                lux: record.lux,
                sensor_gains: record.sensor_gains,
                flash_power: record.flash_power,
                flash_to_ambient_ratio: record.flash_to_ambient_ratio,
                frame_rate: record.frame_rate,
            }),
            rolling_shutter_length: Some(record.rolling_shutter_length),
            pixel_format: Some(record.pixel_format.as_bytes().to_vec()),
            isp_digital_gain: Some(record.isp_digital_gain),
            output: Some(CaptureOutput {
                output_data_format: record.output_data_format.to_wire(),
                pixel_little_endian: u8::from(record.pixel_little_endian),
                embedded_line_count_top: record.embedded_line_count_top,
                embedded_line_count_bottom: record.embedded_line_count_bottom,
                lut: record.lut.clone(),
            }),
        };

        let camera_state = CameraStateChunk {
            version: 1,
            converge_status: record.awb_converge_status,
            awb_gains: record.awb_gains,
        };

        let sensor_info = SensorInfoChunk {
            version: 1,
            sensor_id: record.sensor_id.clone(),
            fuse_id: record.fuse_id.clone(),
        };

        let mut builder = Self::new()
            .add_payload(&header)?
            .add_payload(&pixels)?
            .add_payload(&capture)?
            .add_payload(&camera_state)?
            .add_payload(&sensor_info)?;

        if record.is_hdr() || !record.hdr_readout_scheme.is_empty() {
            let hdr = HdrChunk {
                version: HDR_VERSION,
                readout_scheme: record.hdr_readout_scheme.as_bytes().to_vec(),
                exposures: record
                    .hdr_exposure_infos
                    .iter()
                    .map(|info| HdrExposure {
                        symbol: info.symbol,
                        exposure_time: info.exposure_time,
                        analog_gains: info.analog_gains,
                        digital_gains: info.digital_gains,
                        awb_gains: Some(info.awb_gains),
                        conversion_gain: Some(u32::from(info.conversion_gain)),
                    })
                    .collect(),
            };
            builder = builder.add_payload(&hdr)?;
        }

        Ok(builder)
    }

    /// Append a typed payload
    pub fn add_payload<P: ChunkPayload>(mut self, payload: &P) -> Result<Self> {
        self.chunks.push(RawChunk::from_payload(payload)?);
        Ok(self)
    }

    /// Append a chunk with an arbitrary tag; the digest is computed here
    #[must_use]
    pub fn add_raw_chunk(mut self, tag: [u8; 16], payload: Vec<u8>) -> Self {
        self.chunks.push(RawChunk::new(tag, payload));
        self
    }

    /// Reorder chunks so the listed types come first, in the given order
    ///
    /// Chunks whose type is not listed keep their relative order after them.
    #[must_use]
    pub fn with_chunk_order(mut self, order: &[ChunkTag]) -> Self {
        self.chunks.sort_by_key(|chunk| {
            chunk
                .kind()
                .and_then(|kind| order.iter().position(|tag| *tag == kind))
                .unwrap_or(order.len())
        });
        self
    }

    /// Chunks added so far
    pub fn chunks(&self) -> &[RawChunk] {
        &self.chunks
    }

    /// Finish into a framed file
    pub fn into_file(self) -> ChunkedFile {
        ChunkedFile {
            chunks: self.chunks,
        }
    }

    /// Serialize the file
    pub fn build(self) -> Result<Vec<u8>> {
        self.into_file().build()
    }
}
