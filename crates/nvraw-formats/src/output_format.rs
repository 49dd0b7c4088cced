//! Sensor output data format and its wire encoding
//!
//! The capture chunk stores the format as a `u32` from the file's own enum.
//! [`OutputDataFormat`] is the caller-facing form; the two are related by a
//! fixed table. Wire values missing from the table are kept as
//! [`OutputDataFormat::Unmapped`].

use crate::error::{NvRawError, Result};

/// Caller-facing sensor output data format
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum OutputDataFormat {
    /// 10-bit linear
    #[default]
    Linear10Bit,
    /// 2x11 companded
    Packed2x11,
    /// 3x12 companded
    Packed3x12,
    /// 12-bit linear
    Linear12Bit,
    /// 12-bit combined compressed
    CombinedCompressed12Bit,
    /// 12-bit combined compressed, extended
    CombinedCompressedExtended12Bit,
    /// 16-bit linear
    Linear16Bit,
    /// 16-bit log domain
    LogDomain16Bit,
    /// 16-bit log domain, extended
    LogDomainExtended16Bit,
    /// 20-bit linear
    Linear20Bit,
    /// 20-bit linear, extended
    LinearExtended20Bit,
    /// Half-precision float
    Fp16,
    /// 12-bit compressed
    Compressed12Bit,
    /// End-of-table marker
    Last,
    /// Wire value with no table entry
    Unmapped(u32),
}

const WIRE_TABLE: [(u32, OutputDataFormat); 14] = [
    (0, OutputDataFormat::Linear10Bit),
    (1, OutputDataFormat::Packed2x11),
    (2, OutputDataFormat::Packed3x12),
    (3, OutputDataFormat::Linear12Bit),
    (4, OutputDataFormat::CombinedCompressed12Bit),
    (5, OutputDataFormat::CombinedCompressedExtended12Bit),
    (6, OutputDataFormat::Linear16Bit),
    (7, OutputDataFormat::LogDomain16Bit),
    (8, OutputDataFormat::LogDomainExtended16Bit),
    (9, OutputDataFormat::Linear20Bit),
    (10, OutputDataFormat::LinearExtended20Bit),
    (11, OutputDataFormat::Fp16),
    (12, OutputDataFormat::Compressed12Bit),
    (13, OutputDataFormat::Last),
];

impl OutputDataFormat {
    /// Look up a wire value
    pub fn from_wire(value: u32) -> Result<Self> {
        WIRE_TABLE
            .iter()
            .find(|(wire, _)| *wire == value)
            .map(|(_, format)| *format)
            .ok_or(NvRawError::UnmappedEnumValue(value))
    }

    /// Wire value for this format
    pub fn to_wire(self) -> u32 {
        if let Self::Unmapped(raw) = self {
            return raw;
        }
        WIRE_TABLE
            .iter()
            .find(|(_, format)| *format == self)
            .map_or(0, |(wire, _)| *wire)
    }

    /// Check if `to_wire` followed by a decode gives this value back
    ///
    /// `Unmapped(v)` is not canonical when `v` has a table entry.
    pub fn is_canonical(self) -> bool {
        match self {
            Self::Unmapped(raw) => Self::from_wire(raw).is_err(),
            _ => true,
        }
    }

    /// Check if this value came from outside the table
    pub fn is_unmapped(self) -> bool {
        matches!(self, Self::Unmapped(_))
    }
}

#[cfg(test)]
#[allow(clippy::expect_used, clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_table_is_bidirectional() {
        for (wire, format) in WIRE_TABLE {
            assert_eq!(OutputDataFormat::from_wire(wire).expect("mapped"), format);
            assert_eq!(format.to_wire(), wire);
        }
    }

    #[test]
    fn test_unmapped_value() {
        let err = OutputDataFormat::from_wire(0x1000).expect_err("Not in table");
        assert!(matches!(err, NvRawError::UnmappedEnumValue(0x1000)));

        let fallback = OutputDataFormat::Unmapped(0x1000);
        assert!(fallback.is_unmapped());
        assert!(fallback.is_canonical());
        assert_eq!(fallback.to_wire(), 0x1000);
    }

    #[test]
    fn test_unmapped_table_value_not_canonical() {
        assert!(!OutputDataFormat::Unmapped(3).is_canonical());
        assert!(OutputDataFormat::Linear12Bit.is_canonical());
        assert_eq!(
            OutputDataFormat::Unmapped(3).to_wire(),
            OutputDataFormat::Linear12Bit.to_wire()
        );
    }
}
