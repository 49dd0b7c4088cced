//! Cursor over chunk payloads and the two length-prefixed sub-encodings
//!
//! Both sub-encodings start with a little-endian `i32` length:
//!
//! - **String**: `L` raw bytes follow. Not terminated, not required to be text.
//! - **LUT**: `L` is a byte count, followed by `L / 4` little-endian `f32`s.
//!
//! Decoders return the parsed value together with the number of bytes
//! consumed (length field included) so callers advance their own offset.

use crate::error::{NvRawError, Result};
use binrw::BinRead;
use std::io::Cursor;

/// Size of the length prefix shared by both sub-encodings
pub const LENGTH_PREFIX_SIZE: usize = 4;

fn read_length(data: &[u8], context: &'static str) -> Result<usize> {
    let prefix = data
        .get(..LENGTH_PREFIX_SIZE)
        .ok_or_else(|| NvRawError::truncated(context, LENGTH_PREFIX_SIZE, data.len()))?;
    let length = i32::from_le_bytes([prefix[0], prefix[1], prefix[2], prefix[3]]);
    usize::try_from(length).map_err(|_| NvRawError::InvalidLength {
        context,
        length: i64::from(length),
    })
}

fn write_length(length: usize, context: &'static str, out: &mut Vec<u8>) -> Result<()> {
    let length = i32::try_from(length).map_err(|_| NvRawError::InvalidLength {
        context,
        length: length as i64,
    })?;
    out.extend_from_slice(&length.to_le_bytes());
    Ok(())
}

/// Decode a length-prefixed byte string
///
/// Returns the bytes and the total number of bytes consumed (`4 + L`).
pub fn decode_string(data: &[u8]) -> Result<(Vec<u8>, usize)> {
    let length = read_length(data, "string")?;
    let end = LENGTH_PREFIX_SIZE + length;
    let bytes = data
        .get(LENGTH_PREFIX_SIZE..end)
        .ok_or_else(|| NvRawError::truncated("string", end, data.len()))?;
    Ok((bytes.to_vec(), end))
}

/// Append a length-prefixed byte string to `out`
pub fn encode_string(bytes: &[u8], out: &mut Vec<u8>) -> Result<()> {
    write_length(bytes.len(), "string", out)?;
    out.extend_from_slice(bytes);
    Ok(())
}

/// Decode a length-prefixed float table
///
/// Returns the floats and the total number of bytes consumed (`4 + L`).
pub fn decode_lut(data: &[u8]) -> Result<(Vec<f32>, usize)> {
    let length = read_length(data, "LUT")?;
    if length % 4 != 0 {
        return Err(NvRawError::InvalidLength {
            context: "LUT",
            length: length as i64,
        });
    }
    let end = LENGTH_PREFIX_SIZE + length;
    let table = data
        .get(LENGTH_PREFIX_SIZE..end)
        .ok_or_else(|| NvRawError::truncated("LUT", end, data.len()))?;
    let values = table
        .chunks_exact(4)
        .map(|b| f32::from_le_bytes([b[0], b[1], b[2], b[3]]))
        .collect();
    Ok((values, end))
}

/// Append a length-prefixed float table to `out`
pub fn encode_lut(values: &[f32], out: &mut Vec<u8>) -> Result<()> {
    write_length(values.len() * 4, "LUT", out)?;
    for value in values {
        out.extend_from_slice(&value.to_le_bytes());
    }
    Ok(())
}

/// Reinterpret little-endian bytes as signed 16-bit samples
pub fn samples_from_le_bytes(bytes: &[u8], context: &'static str) -> Result<Vec<i16>> {
    if bytes.len() % 2 != 0 {
        return Err(NvRawError::InvalidLength {
            context,
            length: bytes.len() as i64,
        });
    }
    Ok(bytes
        .chunks_exact(2)
        .map(|b| i16::from_le_bytes([b[0], b[1]]))
        .collect())
}

/// Append signed 16-bit samples to `out` in little-endian order
pub fn samples_to_le_bytes(samples: &[i16], out: &mut Vec<u8>) {
    out.reserve(samples.len() * 2);
    for sample in samples {
        out.extend_from_slice(&sample.to_le_bytes());
    }
}

/// Encoded size of a fixed-layout structure
pub trait WireSize {
    /// Bytes the structure occupies in a payload
    const WIRE_SIZE: usize;
}

/// Encoded size of a structure whose layout depends on the payload version
pub trait VersionedWireSize {
    /// Bytes the structure occupies in a payload of `version`
    fn wire_size(version: u32) -> usize;
}

/// Read-only cursor over a single chunk payload
///
/// Every read is bounded by the payload slice, so a decoder can never run
/// past the length declared in the chunk frame.
#[derive(Debug, Clone)]
pub struct PayloadCursor<'a> {
    data: &'a [u8],
    pos: usize,
    context: &'static str,
}

impl<'a> PayloadCursor<'a> {
    /// Create a cursor at the start of `data`
    pub fn new(data: &'a [u8], context: &'static str) -> Self {
        Self {
            data,
            pos: 0,
            context,
        }
    }

    /// Current offset from the start of the payload
    pub fn position(&self) -> usize {
        self.pos
    }

    /// Bytes left after the cursor
    pub fn remaining(&self) -> usize {
        self.data.len() - self.pos
    }

    /// Unread tail of the payload
    pub fn rest(&self) -> &'a [u8] {
        &self.data[self.pos..]
    }

    /// Take the next `len` bytes
    pub fn take(&mut self, len: usize) -> Result<&'a [u8]> {
        let available = self.remaining();
        if len > available {
            return Err(NvRawError::truncated(self.context, len, available));
        }
        let bytes = &self.data[self.pos..self.pos + len];
        self.pos += len;
        Ok(bytes)
    }

    /// Take the next `N` bytes as an array
    pub fn take_array<const N: usize>(&mut self) -> Result<[u8; N]> {
        let mut out = [0u8; N];
        out.copy_from_slice(self.take(N)?);
        Ok(out)
    }

    /// Take everything left
    pub fn take_rest(&mut self) -> &'a [u8] {
        let bytes = self.rest();
        self.pos = self.data.len();
        bytes
    }

    /// Read a `u8`
    pub fn read_u8(&mut self) -> Result<u8> {
        Ok(self.take_array::<1>()?[0])
    }

    /// Read a little-endian `u32`
    pub fn read_u32(&mut self) -> Result<u32> {
        Ok(u32::from_le_bytes(self.take_array()?))
    }

    /// Read a little-endian `i32`
    pub fn read_i32(&mut self) -> Result<i32> {
        Ok(i32::from_le_bytes(self.take_array()?))
    }

    /// Read a little-endian `f32`
    pub fn read_f32(&mut self) -> Result<f32> {
        Ok(f32::from_le_bytes(self.take_array()?))
    }

    /// Read four consecutive little-endian `f32`s
    pub fn read_f32x4(&mut self) -> Result<[f32; 4]> {
        Ok([
            self.read_f32()?,
            self.read_f32()?,
            self.read_f32()?,
            self.read_f32()?,
        ])
    }

    /// Read a length-prefixed byte string
    pub fn read_string(&mut self) -> Result<Vec<u8>> {
        let (bytes, consumed) = decode_string(self.rest())?;
        self.pos += consumed;
        Ok(bytes)
    }

    /// Read a length-prefixed float table
    pub fn read_lut(&mut self) -> Result<Vec<f32>> {
        let (values, consumed) = decode_lut(self.rest())?;
        self.pos += consumed;
        Ok(values)
    }

    /// Read a fixed-layout little-endian structure
    pub fn read_struct<T>(&mut self) -> Result<T>
    where
        T: for<'b> BinRead<Args<'b> = ()> + WireSize,
    {
        let mut reader = Cursor::new(self.rest());
        match T::read_options(&mut reader, binrw::Endian::Little, ()) {
            Ok(value) => {
                self.pos += reader.position() as usize;
                Ok(value)
            }
            Err(e) if e.is_eof() => Err(NvRawError::truncated(
                self.context,
                T::WIRE_SIZE,
                self.remaining(),
            )),
            Err(e) => Err(e.into()),
        }
    }

    /// Read a fixed-layout structure whose shape depends on `version`
    pub fn read_versioned<T>(&mut self, version: u32) -> Result<T>
    where
        T: for<'b> BinRead<Args<'b> = (u32,)> + VersionedWireSize,
    {
        let mut reader = Cursor::new(self.rest());
        match T::read_options(&mut reader, binrw::Endian::Little, (version,)) {
            Ok(value) => {
                self.pos += reader.position() as usize;
                Ok(value)
            }
            Err(e) if e.is_eof() => Err(NvRawError::truncated(
                self.context,
                T::wire_size(version),
                self.remaining(),
            )),
            Err(e) => Err(e.into()),
        }
    }
}
