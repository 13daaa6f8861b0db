//! Sketch file I/O operations
//!
//! This module provides functions for reading and writing sketch files.

use crate::constants::{FILE_HEADER_SIZE, SKETCH_FILE_EXTENSION};
use crate::domain::bit_set::BitSet;
use crate::domain::bloom::BloomFilter;
use crate::domain::count_min::CountMin;
use crate::domain::hash::Hashing;
use crate::domain::hyper_log_log::HyperLogLog;
use crate::domain::min_hash::MinHash;
use crate::domain::sketch_format::{
    SketchFormatError, SketchHeader, SketchKind, expected_file_size, validate_header,
};
use byteorder::{LittleEndian, ReadBytesExt, WriteBytesExt};
use std::fs::{self, File};
use std::io::{BufReader, BufWriter, Read, Write};
use std::path::{Path, PathBuf};

fn ensure_parent_dir(path: &Path) -> std::io::Result<()> {
    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        fs::create_dir_all(parent)?;
    }

    Ok(())
}

/// Get the file path for a named sketch
///
/// Format: `{dir}/{name}.sketch`
pub fn get_sketch_path(dir: impl AsRef<Path>, name: &str) -> PathBuf {
    dir.as_ref()
        .join(format!("{}.{}", name, SKETCH_FILE_EXTENSION))
}

/// Read and validate only the header of a sketch file
pub fn read_header(path: impl AsRef<Path>) -> Result<SketchHeader, SketchFormatError> {
    let (header, _) = open_sketch(path.as_ref(), None)?;
    Ok(header)
}

// =============================================================================
// Save
// =============================================================================

/// Save a bit set
pub fn save_bit_set(path: impl AsRef<Path>, set: &BitSet) -> Result<(), SketchFormatError> {
    let header = SketchHeader::new(
        SketchKind::BitSet,
        [set.bit_width() as u64, 0, 0],
        set.words().len() as u64 * 8,
    );
    write_sketch(path.as_ref(), &header, |w| write_words(w, set.words()))
}

/// Save a Bloom filter
pub fn save_bloom<H: Hashing>(
    path: impl AsRef<Path>,
    filter: &BloomFilter<H>,
) -> Result<(), SketchFormatError> {
    let words = filter.bits().words();
    let header = SketchHeader::new(
        SketchKind::Bloom,
        [filter.bit_width() as u64, filter.hash_count() as u64, 0],
        words.len() as u64 * 8,
    );
    write_sketch(path.as_ref(), &header, |w| write_words(w, words))
}

/// Save a HyperLogLog sketch
pub fn save_hyper_log_log<H: Hashing>(
    path: impl AsRef<Path>,
    sketch: &HyperLogLog<H>,
) -> Result<(), SketchFormatError> {
    let registers = sketch.registers();
    let header = SketchHeader::new(
        SketchKind::HyperLogLog,
        [sketch.precision() as u64, 0, 0],
        registers.len() as u64,
    );
    write_sketch(path.as_ref(), &header, |w| w.write_all(registers))
}

/// Save a MinHash signature
pub fn save_min_hash<H: Hashing>(
    path: impl AsRef<Path>,
    sketch: &MinHash<H>,
) -> Result<(), SketchFormatError> {
    let signature = sketch.signature();
    let header = SketchHeader::new(
        SketchKind::MinHash,
        [signature.len() as u64, 0, 0],
        signature.len() as u64 * 4,
    );
    write_sketch(path.as_ref(), &header, |w| {
        for &slot in signature {
            w.write_u32::<LittleEndian>(slot)?;
        }
        Ok(())
    })
}

/// Save a Count-Min sketch
pub fn save_count_min<H: Hashing>(
    path: impl AsRef<Path>,
    sketch: &CountMin<H>,
) -> Result<(), SketchFormatError> {
    let header = SketchHeader::new(
        SketchKind::CountMin,
        [sketch.depth() as u64, sketch.width() as u64, 0],
        sketch.counts().len() as u64 * 8,
    );
    write_sketch(path.as_ref(), &header, |w| write_words(w, sketch.counts()))
}

// =============================================================================
// Load
// =============================================================================

/// Load a bit set with validation
pub fn load_bit_set(path: impl AsRef<Path>) -> Result<BitSet, SketchFormatError> {
    let (header, mut reader) = open_sketch(path.as_ref(), Some(SketchKind::BitSet))?;
    let bit_width = header_usize(header.params[0])?;
    let words = read_words(&mut reader, header.payload_len / 8)?;
    Ok(BitSet::from_words(bit_width, words)?)
}

/// Load a Bloom filter with validation
pub fn load_bloom<H: Hashing>(
    path: impl AsRef<Path>,
) -> Result<BloomFilter<H>, SketchFormatError> {
    let (header, mut reader) = open_sketch(path.as_ref(), Some(SketchKind::Bloom))?;
    let bit_width = header_usize(header.params[0])?;
    let hash_count = header_usize(header.params[1])?;
    let words = read_words(&mut reader, header.payload_len / 8)?;
    let bits = BitSet::from_words(bit_width, words)?;
    Ok(BloomFilter::from_parts(bits, hash_count)?)
}

/// Load a HyperLogLog sketch with validation
pub fn load_hyper_log_log<H: Hashing>(
    path: impl AsRef<Path>,
) -> Result<HyperLogLog<H>, SketchFormatError> {
    let (header, mut reader) = open_sketch(path.as_ref(), Some(SketchKind::HyperLogLog))?;
    let precision = u8::try_from(header.params[0]).unwrap_or(u8::MAX);
    let mut registers = vec![0u8; header_usize(header.payload_len)?];
    reader.read_exact(&mut registers)?;
    Ok(HyperLogLog::from_registers(precision, registers)?)
}

/// Load a MinHash signature with validation
pub fn load_min_hash<H: Hashing>(
    path: impl AsRef<Path>,
) -> Result<MinHash<H>, SketchFormatError> {
    let (header, mut reader) = open_sketch(path.as_ref(), Some(SketchKind::MinHash))?;
    let hash_count = header_usize(header.params[0])?;
    let mut signature = Vec::with_capacity(hash_count);
    for _ in 0..hash_count {
        signature.push(reader.read_u32::<LittleEndian>()?);
    }
    Ok(MinHash::from_signature(signature)?)
}

/// Load a Count-Min sketch with validation
pub fn load_count_min<H: Hashing>(
    path: impl AsRef<Path>,
) -> Result<CountMin<H>, SketchFormatError> {
    let (header, mut reader) = open_sketch(path.as_ref(), Some(SketchKind::CountMin))?;
    let depth = header_usize(header.params[0])?;
    let width = header_usize(header.params[1])?;
    let counts = read_words(&mut reader, header.payload_len / 8)?;
    Ok(CountMin::from_counts(depth, width, counts)?)
}

// =============================================================================
// Kind-erased access
// =============================================================================

/// Any sketch that can be stored in a file, with the default hasher
#[derive(Clone, Debug, PartialEq)]
pub enum AnySketch {
    BitSet(BitSet),
    Bloom(BloomFilter),
    HyperLogLog(HyperLogLog),
    MinHash(MinHash),
    CountMin(CountMin),
}

impl AnySketch {
    /// Kind tag of the held sketch
    pub fn kind(&self) -> SketchKind {
        match self {
            Self::BitSet(_) => SketchKind::BitSet,
            Self::Bloom(_) => SketchKind::Bloom,
            Self::HyperLogLog(_) => SketchKind::HyperLogLog,
            Self::MinHash(_) => SketchKind::MinHash,
            Self::CountMin(_) => SketchKind::CountMin,
        }
    }

    /// Merge a sketch of the same kind into this one
    ///
    /// Bit sets merge by disjunction.
    pub fn merge(&mut self, other: &AnySketch) -> Result<(), SketchFormatError> {
        match (self, other) {
            (Self::BitSet(a), Self::BitSet(b)) => a.form_disjunction(b)?,
            (Self::Bloom(a), Self::Bloom(b)) => a.form_union(b)?,
            (Self::HyperLogLog(a), Self::HyperLogLog(b)) => a.form_union(b)?,
            (Self::MinHash(a), Self::MinHash(b)) => a.form_union(b)?,
            (Self::CountMin(a), Self::CountMin(b)) => a.form_union(b)?,
            (a, b) => {
                return Err(SketchFormatError::KindMismatch {
                    expected: a.kind(),
                    found: b.kind(),
                });
            }
        }
        Ok(())
    }
}

/// Load a sketch of whatever kind the file holds
pub fn load_any(path: impl AsRef<Path>) -> Result<AnySketch, SketchFormatError> {
    let path = path.as_ref();
    Ok(match read_header(path)?.kind {
        SketchKind::BitSet => AnySketch::BitSet(load_bit_set(path)?),
        SketchKind::Bloom => AnySketch::Bloom(load_bloom(path)?),
        SketchKind::HyperLogLog => AnySketch::HyperLogLog(load_hyper_log_log(path)?),
        SketchKind::MinHash => AnySketch::MinHash(load_min_hash(path)?),
        SketchKind::CountMin => AnySketch::CountMin(load_count_min(path)?),
    })
}

/// Save a sketch of any kind
pub fn save_any(path: impl AsRef<Path>, sketch: &AnySketch) -> Result<(), SketchFormatError> {
    match sketch {
        AnySketch::BitSet(s) => save_bit_set(path, s),
        AnySketch::Bloom(s) => save_bloom(path, s),
        AnySketch::HyperLogLog(s) => save_hyper_log_log(path, s),
        AnySketch::MinHash(s) => save_min_hash(path, s),
        AnySketch::CountMin(s) => save_count_min(path, s),
    }
}

// =============================================================================
// Internal helpers
// =============================================================================

fn write_sketch<F>(
    path: &Path,
    header: &SketchHeader,
    write_payload: F,
) -> Result<(), SketchFormatError>
where
    F: FnOnce(&mut BufWriter<File>) -> std::io::Result<()>,
{
    ensure_parent_dir(path)?;

    let file = File::create(path)?;
    let mut writer = BufWriter::new(file);

    writer.write_all(&header.to_bytes())?;
    write_payload(&mut writer)?;

    writer.flush()?;
    Ok(())
}

/// Open a sketch file, checking header, kind and file size
fn open_sketch(
    path: &Path,
    expected_kind: Option<SketchKind>,
) -> Result<(SketchHeader, BufReader<File>), SketchFormatError> {
    let file = File::open(path)?;
    let metadata = file.metadata()?;

    let mut reader = BufReader::new(file);
    let mut header_buf = [0u8; FILE_HEADER_SIZE];
    reader.read_exact(&mut header_buf)?;

    let header = SketchHeader::from_bytes(&header_buf)?;

    if let Some(expected) = expected_kind {
        header.expect_kind(expected)?;
    }
    validate_header(&header)?;

    let expected_size = expected_file_size(&header);
    if metadata.len() != expected_size {
        return Err(SketchFormatError::InvalidFileSize {
            expected: expected_size,
            found: metadata.len(),
        });
    }

    Ok((header, reader))
}

fn write_words<W: Write>(writer: &mut W, words: &[u64]) -> std::io::Result<()> {
    for &word in words {
        writer.write_u64::<LittleEndian>(word)?;
    }
    Ok(())
}

fn read_words<R: Read>(reader: &mut R, count: u64) -> Result<Vec<u64>, SketchFormatError> {
    let count = header_usize(count)?;
    let mut words = Vec::with_capacity(count);
    for _ in 0..count {
        words.push(reader.read_u64::<LittleEndian>()?);
    }
    Ok(words)
}

fn header_usize(value: u64) -> Result<usize, SketchFormatError> {
    usize::try_from(value).map_err(|_| {
        SketchFormatError::Io(format!("header value {} does not fit in memory", value))
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::hash::Fnv1a;
    use tempfile::TempDir;

    #[test]
    fn test_save_and_load_bit_set() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("set.sketch");

        let mut set = BitSet::new(130).unwrap();
        set.set(0, true);
        set.set(64, true);
        set.set(129, true);

        save_bit_set(&path, &set).unwrap();
        assert_eq!(load_bit_set(&path).unwrap(), set);
    }

    #[test]
    fn test_save_creates_parent_dir() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("nested").join("deeper").join("set.sketch");

        save_bit_set(&path, &BitSet::new(8).unwrap()).unwrap();
        assert!(path.exists());
    }

    #[test]
    fn test_load_wrong_kind() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("hll.sketch");

        save_hyper_log_log(&path, &HyperLogLog::<Fnv1a>::new(4).unwrap()).unwrap();
        let result = load_bloom::<Fnv1a>(&path);
        assert_eq!(
            result.unwrap_err(),
            SketchFormatError::KindMismatch {
                expected: SketchKind::Bloom,
                found: SketchKind::HyperLogLog
            }
        );
    }

    #[test]
    fn test_file_size_validation() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("truncated.sketch");

        // Header claims 16 words of payload, none written
        let header = SketchHeader::new(SketchKind::BitSet, [1024, 0, 0], 128);
        let mut file = File::create(&path).unwrap();
        file.write_all(&header.to_bytes()).unwrap();
        file.flush().unwrap();

        assert!(matches!(
            load_bit_set(&path),
            Err(SketchFormatError::InvalidFileSize {
                expected: 192,
                found: 64
            })
        ));
    }

    #[test]
    fn test_invalid_magic() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("garbage.sketch");
        fs::write(&path, [0xAAu8; 128]).unwrap();

        assert_eq!(read_header(&path), Err(SketchFormatError::InvalidMagic));
    }

    #[test]
    fn test_read_header() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("cm.sketch");

        save_count_min(&path, &CountMin::<Fnv1a>::new(3, 16).unwrap()).unwrap();
        let header = read_header(&path).unwrap();
        assert_eq!(header.kind, SketchKind::CountMin);
        assert_eq!(header.params, [3, 16, 0]);
        assert_eq!(header.payload_len, 3 * 16 * 8);
    }

    #[test]
    fn test_missing_file() {
        let dir = TempDir::new().unwrap();
        let result = load_bit_set(dir.path().join("absent.sketch"));
        assert!(matches!(result, Err(SketchFormatError::Io(_))));
    }

    #[test]
    fn test_load_any_and_merge() {
        let dir = TempDir::new().unwrap();
        let a_path = dir.path().join("a.sketch");
        let b_path = dir.path().join("b.sketch");

        let mut a = HyperLogLog::<Fnv1a>::new(8).unwrap();
        a.insert(b"left");
        let mut b = HyperLogLog::<Fnv1a>::new(8).unwrap();
        b.insert(b"right");
        save_hyper_log_log(&a_path, &a).unwrap();
        save_hyper_log_log(&b_path, &b).unwrap();

        let mut merged = load_any(&a_path).unwrap();
        assert_eq!(merged.kind(), SketchKind::HyperLogLog);
        merged.merge(&load_any(&b_path).unwrap()).unwrap();
        assert_eq!(merged, AnySketch::HyperLogLog(a.union(&b).unwrap()));
    }

    #[test]
    fn test_any_merge_kind_mismatch() {
        let mut set = AnySketch::BitSet(BitSet::new(8).unwrap());
        let other = AnySketch::MinHash(MinHash::new(4).unwrap());
        assert_eq!(
            set.merge(&other),
            Err(SketchFormatError::KindMismatch {
                expected: SketchKind::BitSet,
                found: SketchKind::MinHash
            })
        );
    }

    #[test]
    fn test_any_merge_parameter_mismatch() {
        let mut a = AnySketch::CountMin(CountMin::new(2, 8).unwrap());
        let b = AnySketch::CountMin(CountMin::new(2, 9).unwrap());
        assert!(matches!(a.merge(&b), Err(SketchFormatError::Sketch(_))));
    }

    #[test]
    fn test_get_sketch_path() {
        assert_eq!(
            get_sketch_path(".", "visitors"),
            PathBuf::from(".").join("visitors.sketch")
        );
    }
}
