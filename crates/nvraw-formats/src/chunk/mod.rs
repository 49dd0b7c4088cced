//! Chunked NVRAW container
//!
//! A chunked file is a flat sequence of frames starting at byte 0:
//!
//! | Size | Content                         |
//! |------|---------------------------------|
//! | 16   | Type tag (ASCII, padded)        |
//! | 16   | MD5 digest of the payload       |
//! | 4    | Payload length (`u32` LE)       |
//! | N    | Payload                         |
//!
//! The header chunk tag `NVRAWFILE_111107` begins with the 8-byte marker used
//! for format detection, so the header chunk is the first framed chunk.
//! Framing stops when fewer than [`CHUNK_FRAME_HEADER_SIZE`] bytes remain; the
//! tail is discarded. Order of chunks is not significant.
//!
//! ```rust,no_run
//! use nvraw_formats::chunk::ChunkedFile;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let data = std::fs::read("capture.nvraw")?;
//! let record = ChunkedFile::parse(&data)?.into_record()?;
//! println!("{}x{} {:?}", record.width, record.height, record.output_data_format);
//! # Ok(())
//! # }
//! ```

mod assemble;
mod builder;
mod camera_state;
mod capture;
mod hdr;
mod header;
mod pixel_data;
mod sensor_info;

pub use assemble::RecordAssembler;
pub use builder::ChunkedFileBuilder;
pub use camera_state::CameraStateChunk;
pub use capture::{CAPTURE_VERSION_LATEST, CaptureChunk, CaptureExposure, CaptureOutput};
pub use hdr::{HdrChunk, HdrExposure};
pub use header::{HEADER_PAYLOAD_SIZE, HeaderChunk};
pub use pixel_data::PixelDataChunk;
pub use sensor_info::SensorInfoChunk;

use crate::NvRawFormat;
use crate::error::{NvRawError, Result};
use crate::options::ReaderOptions;
use crate::primitives::PayloadCursor;
use crate::record::RawImageRecord;
use tracing::{debug, trace};

/// Size of a chunk frame before its payload
pub const CHUNK_FRAME_HEADER_SIZE: usize = 16 + 16 + 4;

/// Size of a chunk type tag
pub const CHUNK_TAG_SIZE: usize = 16;

/// Chunk types this crate decodes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ChunkTag {
    /// `NVRAWFILE_111107`
    Header,
    /// `PIXELDATA_111107`
    PixelData,
    /// `CAPTURE___120118`
    Capture,
    /// `CAMSTATE__120118`
    CameraState,
    /// `SENSORINFO120131`
    SensorInfo,
    /// `HDR_______130318`
    Hdr,
}

impl ChunkTag {
    /// Every known tag
    pub const ALL: [Self; 6] = [
        Self::Header,
        Self::PixelData,
        Self::Capture,
        Self::CameraState,
        Self::SensorInfo,
        Self::Hdr,
    ];

    /// Tag bytes as stored in the frame
    pub const fn bytes(self) -> &'static [u8; CHUNK_TAG_SIZE] {
        match self {
            Self::Header => b"NVRAWFILE_111107",
            Self::PixelData => b"PIXELDATA_111107",
            Self::Capture => b"CAPTURE___120118",
            Self::CameraState => b"CAMSTATE__120118",
            Self::SensorInfo => b"SENSORINFO120131",
            Self::Hdr => b"HDR_______130318",
        }
    }

    /// Look up a tag, `None` for unknown chunk types
    pub fn from_bytes(tag: &[u8; CHUNK_TAG_SIZE]) -> Option<Self> {
        Self::ALL.into_iter().find(|kind| kind.bytes() == tag)
    }
}

impl std::fmt::Display for ChunkTag {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&String::from_utf8_lossy(self.bytes()))
    }
}

/// A typed chunk payload with symmetric parse and build
pub trait ChunkPayload: Sized {
    /// Tag of the chunk that carries this payload
    const TAG: ChunkTag;

    /// Lowest payload version the decoder understands, `None` if unversioned
    const MIN_VERSION: Option<i32>;

    /// Parse a payload; reads never run past `payload`
    fn parse(payload: &[u8]) -> Result<Self>;

    /// Serialize to a payload
    fn build(&self) -> Result<Vec<u8>>;
}

/// Read the leading version word of `P`'s payload
pub(crate) fn read_version<P: ChunkPayload>(cursor: &mut PayloadCursor<'_>) -> Result<u32> {
    let version = cursor.read_i32()?;
    match P::MIN_VERSION {
        Some(min) if version < min => Err(NvRawError::InvalidField {
            field: "chunk version",
            value: i64::from(version),
        }),
        _ => u32::try_from(version).map_err(|_| NvRawError::InvalidField {
            field: "chunk version",
            value: i64::from(version),
        }),
    }
}

/// Peek at a payload's leading version without consuming it
///
/// Returns `None` when the payload is too short to carry one.
pub(crate) fn peek_version(payload: &[u8]) -> Option<i32> {
    let bytes = payload.get(..4)?;
    Some(i32::from_le_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]))
}

/// One framed chunk, payload still encoded
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawChunk {
    /// Type tag
    pub tag: [u8; CHUNK_TAG_SIZE],
    /// Digest stored in the frame
    pub digest: [u8; 16],
    /// Payload bytes
    pub payload: Vec<u8>,
}

impl RawChunk {
    /// Create a chunk, computing the MD5 digest of `payload`
    pub fn new(tag: [u8; CHUNK_TAG_SIZE], payload: Vec<u8>) -> Self {
        let digest = md5::compute(&payload).0;
        Self {
            tag,
            digest,
            payload,
        }
    }

    /// Encode a typed payload into a chunk
    pub fn from_payload<P: ChunkPayload>(payload: &P) -> Result<Self> {
        Ok(Self::new(*P::TAG.bytes(), payload.build()?))
    }

    /// Known chunk type, if any
    pub fn kind(&self) -> Option<ChunkTag> {
        ChunkTag::from_bytes(&self.tag)
    }

    /// Tag rendered as text
    pub fn tag_str(&self) -> String {
        String::from_utf8_lossy(&self.tag).into_owned()
    }

    /// Check the stored digest against the payload
    pub fn digest_matches(&self) -> bool {
        md5::compute(&self.payload).0 == self.digest
    }

    fn verify_digest(&self) -> Result<()> {
        let actual = md5::compute(&self.payload).0;
        if actual != self.digest {
            return Err(NvRawError::DigestMismatch {
                tag: self.tag_str(),
                expected: hex::encode(self.digest),
                actual: hex::encode(actual),
            });
        }
        Ok(())
    }

    /// Encoded size of the frame
    pub fn encoded_len(&self) -> usize {
        CHUNK_FRAME_HEADER_SIZE + self.payload.len()
    }

    fn write_to(&self, out: &mut Vec<u8>) -> Result<()> {
        let length = u32::try_from(self.payload.len()).map_err(|_| NvRawError::InvalidLength {
            context: "chunk payload",
            length: self.payload.len() as i64,
        })?;
        out.extend_from_slice(&self.tag);
        out.extend_from_slice(&self.digest);
        out.extend_from_slice(&length.to_le_bytes());
        out.extend_from_slice(&self.payload);
        Ok(())
    }
}

/// Framed chunked file
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ChunkedFile {
    /// Chunks in stream order
    pub chunks: Vec<RawChunk>,
}

impl ChunkedFile {
    /// Frame `data` into chunks using default options
    pub fn parse(data: &[u8]) -> Result<Self> {
        Self::parse_with_options(data, &ReaderOptions::default())
    }

    /// Frame `data` into chunks
    ///
    /// A frame whose declared length runs past the end of `data` is
    /// [`NvRawError::TruncatedInput`]. Fewer than [`CHUNK_FRAME_HEADER_SIZE`]
    /// trailing bytes are dropped.
    pub fn parse_with_options(data: &[u8], options: &ReaderOptions) -> Result<Self> {
        let mut chunks = Vec::new();
        let mut offset = 0;

        while data.len() - offset >= CHUNK_FRAME_HEADER_SIZE {
            let mut cursor = PayloadCursor::new(&data[offset..], "chunk frame");
            let tag: [u8; CHUNK_TAG_SIZE] = cursor.take_array()?;
            let digest: [u8; 16] = cursor.take_array()?;
            let length = cursor.read_u32()?;

            if length > options.max_chunk_length {
                return Err(NvRawError::InvalidLength {
                    context: "chunk payload",
                    length: i64::from(length),
                });
            }
            let payload = cursor.take(length as usize)?.to_vec();

            let chunk = RawChunk {
                tag,
                digest,
                payload,
            };
            debug!("Chunk {} at offset {}: {} bytes", chunk.tag_str(), offset, length);

            if options.verify_chunk_digests {
                chunk.verify_digest()?;
            }

            offset += chunk.encoded_len();
            chunks.push(chunk);
        }

        if offset < data.len() {
            debug!("Discarding {} trailing bytes", data.len() - offset);
        }
        trace!("Framed {} chunks", chunks.len());

        Ok(Self { chunks })
    }

    /// Serialize all chunks in order
    pub fn build(&self) -> Result<Vec<u8>> {
        let size = self.chunks.iter().map(RawChunk::encoded_len).sum();
        let mut out = Vec::with_capacity(size);
        for chunk in &self.chunks {
            chunk.write_to(&mut out)?;
        }
        Ok(out)
    }

    /// Decode the chunks into a record
    pub fn into_record(self) -> Result<RawImageRecord> {
        let mut assembler = RecordAssembler::new();
        for chunk in self.chunks {
            assembler.absorb(chunk)?;
        }
        assembler.finish()
    }

    /// Encode a record with the default chunk order
    pub fn from_record(record: &RawImageRecord) -> Result<Self> {
        Ok(ChunkedFileBuilder::from_record(record)?.into_file())
    }
}

impl NvRawFormat for ChunkedFile {
    fn parse(data: &[u8]) -> Result<Self> {
        Self::parse(data)
    }

    fn build(&self) -> Result<Vec<u8>> {
        self.build()
    }
}
