//! Bayer phase four-character codes
//!
//! On disk the phase is a 32-bit integer. Packing it little-endian and then
//! reversing the four bytes gives the display form (for example `RGGB`).
//!
//! Bytes outside printable ASCII are shown as `\xHH` and a backslash as
//! `\\`, so every 32-bit code has a string form that parses back to it.

use crate::error::{NvRawError, Result};
use std::fmt;
use std::str::FromStr;

/// 2x2 color filter tile order of a sensor
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct BayerPhase([u8; 4]);

impl BayerPhase {
    /// Build from the display bytes
    pub const fn from_bytes(bytes: [u8; 4]) -> Self {
        Self(bytes)
    }

    /// Decode the on-disk integer
    pub fn from_code(code: i32) -> Self {
        let mut bytes = code.to_le_bytes();
        bytes.reverse();
        Self(bytes)
    }

    /// Encode to the on-disk integer
    pub fn to_code(self) -> i32 {
        let mut bytes = self.0;
        bytes.reverse();
        i32::from_le_bytes(bytes)
    }

    /// Display bytes in tile order
    pub fn as_bytes(&self) -> &[u8; 4] {
        &self.0
    }
}

impl fmt::Display for BayerPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for &byte in &self.0 {
            match byte {
                b'\\' => f.write_str("\\\\")?,
                0x20..=0x7E => write!(f, "{}", char::from(byte))?,
                _ => write!(f, "\\x{byte:02x}")?,
            }
        }
        Ok(())
    }
}

impl FromStr for BayerPhase {
    type Err = NvRawError;

    fn from_str(s: &str) -> Result<Self> {
        let mut bytes = Vec::with_capacity(4);
        let mut rest = s.as_bytes();

        while let Some((&first, tail)) = rest.split_first() {
            rest = match (first, tail) {
                (b'\\', [b'\\', tail @ ..]) => {
                    bytes.push(b'\\');
                    tail
                }
                (b'\\', [b'x', hi, lo, tail @ ..]) => {
                    let mut byte = [0u8; 1];
                    hex::decode_to_slice([*hi, *lo], &mut byte).map_err(|_| {
                        NvRawError::InvalidField {
                            field: "bayer phase escape",
                            value: (s.len() - tail.len()) as i64,
                        }
                    })?;
                    bytes.push(byte[0]);
                    tail
                }
                (b'\\', _) => {
                    return Err(NvRawError::InvalidField {
                        field: "bayer phase escape",
                        value: (s.len() - tail.len()) as i64,
                    });
                }
                (byte, tail) => {
                    bytes.push(byte);
                    tail
                }
            };
        }

        let length = bytes.len();
        let bytes: [u8; 4] = bytes.try_into().map_err(|_| NvRawError::InvalidLength {
            context: "bayer phase",
            length: length as i64,
        })?;
        Ok(Self(bytes))
    }
}

/// Render an on-disk bayer phase as its display string
pub fn bayer_phase_string(code: i32) -> String {
    BayerPhase::from_code(code).to_string()
}

/// Convert a display string, escapes included, to the on-disk integer
pub fn bayer_phase_code(phase: &str) -> Result<i32> {
    Ok(phase.parse::<BayerPhase>()?.to_code())
}
