//! Sketch file format definitions
//!
//! Every sketch file is a 64-byte little-endian header followed by the raw
//! payload of one sketch (words, registers or counters).

use crate::constants::{FILE_FORMAT_VERSION, FILE_HEADER_SIZE, SKETCH_MAGIC};
use crate::domain::error::SketchError;
use std::fmt;
use std::str::FromStr;
use std::time::{SystemTime, UNIX_EPOCH};
use thiserror::Error;

/// Type of sketch stored in a file
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum SketchKind {
    BitSet = 1,
    Bloom = 2,
    HyperLogLog = 3,
    MinHash = 4,
    CountMin = 5,
}

impl SketchKind {
    /// All kinds, in tag order
    pub const ALL: [SketchKind; 5] = [
        SketchKind::BitSet,
        SketchKind::Bloom,
        SketchKind::HyperLogLog,
        SketchKind::MinHash,
        SketchKind::CountMin,
    ];

    /// Decode a kind tag
    pub fn from_tag(tag: u8) -> Result<Self, SketchFormatError> {
        Self::ALL
            .into_iter()
            .find(|&kind| kind as u8 == tag)
            .ok_or(SketchFormatError::UnknownKind(tag))
    }

    /// Short name used on the command line
    pub fn name(self) -> &'static str {
        match self {
            Self::BitSet => "bitset",
            Self::Bloom => "bloom",
            Self::HyperLogLog => "hll",
            Self::MinHash => "minhash",
            Self::CountMin => "countmin",
        }
    }
}

impl fmt::Display for SketchKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for SketchKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|kind| kind.name() == s)
            .ok_or_else(|| {
                let names: Vec<_> = Self::ALL.iter().map(|k| k.name()).collect();
                format!("Unknown sketch kind '{}' (expected one of {})", s, names.join(", "))
            })
    }
}

/// Sketch file header metadata
///
/// Meaning of `params` per kind:
/// - BitSet: `[bit_width, 0, 0]`
/// - Bloom: `[bit_width, hash_count, 0]`
/// - HyperLogLog: `[precision, 0, 0]`
/// - MinHash: `[hash_count, 0, 0]`
/// - CountMin: `[depth, width, 0]`
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SketchHeader {
    /// File format version
    pub version: u16,
    /// Sketch type
    pub kind: SketchKind,
    /// Kind-specific parameters
    pub params: [u64; 3],
    /// Payload size in bytes
    pub payload_len: u64,
    /// Creation timestamp (Unix epoch seconds)
    pub created_at: u64,
}

impl SketchHeader {
    /// Create a new header for the current format version
    pub fn new(kind: SketchKind, params: [u64; 3], payload_len: u64) -> Self {
        let created_at = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_secs())
            .unwrap_or(0);

        Self {
            version: FILE_FORMAT_VERSION,
            kind,
            params,
            payload_len,
            created_at,
        }
    }

    /// Serialize header to bytes (64 bytes)
    pub fn to_bytes(&self) -> [u8; FILE_HEADER_SIZE] {
        let mut buf = [0u8; FILE_HEADER_SIZE];

        buf[0..8].copy_from_slice(&SKETCH_MAGIC);
        buf[8..10].copy_from_slice(&self.version.to_le_bytes());
        buf[10] = self.kind as u8;
        // 11..16 reserved
        buf[16..24].copy_from_slice(&self.params[0].to_le_bytes());
        buf[24..32].copy_from_slice(&self.params[1].to_le_bytes());
        buf[32..40].copy_from_slice(&self.params[2].to_le_bytes());
        buf[40..48].copy_from_slice(&self.payload_len.to_le_bytes());
        buf[48..56].copy_from_slice(&self.created_at.to_le_bytes());
        // 56..64 reserved

        buf
    }

    /// Deserialize header from bytes
    pub fn from_bytes(buf: &[u8; FILE_HEADER_SIZE]) -> Result<Self, SketchFormatError> {
        if buf[0..8] != SKETCH_MAGIC {
            return Err(SketchFormatError::InvalidMagic);
        }

        let version = u16::from_le_bytes([buf[8], buf[9]]);
        if version != FILE_FORMAT_VERSION {
            return Err(SketchFormatError::UnsupportedVersion(version));
        }

        Ok(Self {
            version,
            kind: SketchKind::from_tag(buf[10])?,
            params: [read_u64(buf, 16), read_u64(buf, 24), read_u64(buf, 32)],
            payload_len: read_u64(buf, 40),
            created_at: read_u64(buf, 48),
        })
    }

    /// Fail unless the header describes a sketch of `expected` kind
    pub fn expect_kind(&self, expected: SketchKind) -> Result<(), SketchFormatError> {
        if self.kind != expected {
            return Err(SketchFormatError::KindMismatch {
                expected,
                found: self.kind,
            });
        }
        Ok(())
    }
}

fn read_u64(buf: &[u8; FILE_HEADER_SIZE], offset: usize) -> u64 {
    let mut bytes = [0u8; 8];
    bytes.copy_from_slice(&buf[offset..offset + 8]);
    u64::from_le_bytes(bytes)
}

/// Sketch format errors
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SketchFormatError {
    /// Invalid magic number (not a sketch file)
    #[error("Invalid file format: not a valid sketch file")]
    InvalidMagic,
    /// Unsupported format version
    #[error("Unsupported format version: {0}")]
    UnsupportedVersion(u16),
    /// Unknown sketch kind tag
    #[error("Unknown sketch kind tag: {0}")]
    UnknownKind(u8),
    /// File holds a different kind of sketch
    #[error("Sketch kind mismatch: expected {expected}, found {found}")]
    KindMismatch {
        expected: SketchKind,
        found: SketchKind,
    },
    /// Payload length does not match the header parameters
    #[error("Invalid payload length: expected {expected} bytes, found {found} bytes")]
    InvalidPayloadLength { expected: u64, found: u64 },
    /// File size does not match expected size
    #[error("Invalid file size: expected {expected} bytes, found {found} bytes")]
    InvalidFileSize { expected: u64, found: u64 },
    /// Header parameters do not describe a valid sketch
    #[error("Invalid sketch parameters: {0}")]
    Sketch(#[from] SketchError),
    /// I/O error
    #[error("I/O error: {0}")]
    Io(String),
}

impl From<std::io::Error> for SketchFormatError {
    fn from(e: std::io::Error) -> Self {
        Self::Io(e.to_string())
    }
}

/// Payload size implied by the header parameters
pub fn expected_payload_len(kind: SketchKind, params: [u64; 3]) -> u64 {
    match kind {
        SketchKind::BitSet | SketchKind::Bloom => params[0].div_ceil(64).saturating_mul(8),
        SketchKind::HyperLogLog => 1u64.checked_shl(params[0] as u32).unwrap_or(u64::MAX),
        SketchKind::MinHash => params[0].saturating_mul(4),
        SketchKind::CountMin => params[0].saturating_mul(params[1]).saturating_mul(8),
    }
}

/// Validate the header payload length against its parameters
pub fn validate_header(header: &SketchHeader) -> Result<(), SketchFormatError> {
    let expected = expected_payload_len(header.kind, header.params);
    if header.payload_len != expected {
        return Err(SketchFormatError::InvalidPayloadLength {
            expected,
            found: header.payload_len,
        });
    }
    Ok(())
}

/// Calculate expected file size from header
pub fn expected_file_size(header: &SketchHeader) -> u64 {
    (FILE_HEADER_SIZE as u64).saturating_add(header.payload_len)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_tags_round_trip() {
        for kind in SketchKind::ALL {
            assert_eq!(SketchKind::from_tag(kind as u8).unwrap(), kind);
            assert_eq!(kind.name().parse::<SketchKind>().unwrap(), kind);
        }
        assert_eq!(SketchKind::from_tag(0), Err(SketchFormatError::UnknownKind(0)));
        assert!("bogus".parse::<SketchKind>().is_err());
    }

    #[test]
    fn test_expected_payload_len() {
        assert_eq!(expected_payload_len(SketchKind::BitSet, [65, 0, 0]), 16);
        assert_eq!(expected_payload_len(SketchKind::Bloom, [64, 3, 0]), 8);
        assert_eq!(expected_payload_len(SketchKind::HyperLogLog, [8, 0, 0]), 256);
        assert_eq!(expected_payload_len(SketchKind::MinHash, [64, 0, 0]), 256);
        assert_eq!(expected_payload_len(SketchKind::CountMin, [7, 200, 0]), 11200);
    }

    #[test]
    fn test_validate_payload_mismatch() {
        let header = SketchHeader::new(SketchKind::MinHash, [64, 0, 0], 255);
        assert_eq!(
            validate_header(&header),
            Err(SketchFormatError::InvalidPayloadLength {
                expected: 256,
                found: 255
            })
        );
    }

    #[test]
    fn test_expect_kind() {
        let header = SketchHeader::new(SketchKind::Bloom, [64, 3, 0], 8);
        assert!(header.expect_kind(SketchKind::Bloom).is_ok());
        assert!(matches!(
            header.expect_kind(SketchKind::CountMin),
            Err(SketchFormatError::KindMismatch { .. })
        ));
    }

    #[test]
    fn test_error_display() {
        let e = SketchFormatError::KindMismatch {
            expected: SketchKind::Bloom,
            found: SketchKind::HyperLogLog,
        };
        assert_eq!(e.to_string(), "Sketch kind mismatch: expected bloom, found hll");
    }
}
