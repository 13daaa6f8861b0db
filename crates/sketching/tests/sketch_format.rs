use sketching::constants::{FILE_FORMAT_VERSION, FILE_HEADER_SIZE, SKETCH_MAGIC};
use sketching::domain::sketch_format::{
    SketchFormatError, SketchHeader, SketchKind, expected_file_size, validate_header,
};

#[test]
fn test_sketch_header_serialization() {
    let header = SketchHeader::new(SketchKind::CountMin, [7, 200, 0], 7 * 200 * 8);
    let bytes = header.to_bytes();
    let restored = SketchHeader::from_bytes(&bytes).unwrap();

    assert_eq!(header, restored);
}

#[test]
fn test_sketch_header_layout() {
    let header = SketchHeader::new(SketchKind::Bloom, [0x0102, 3, 0], 40);
    let bytes = header.to_bytes();

    assert_eq!(bytes.len(), FILE_HEADER_SIZE);
    assert_eq!(&bytes[0..8], &SKETCH_MAGIC);
    assert_eq!(u16::from_le_bytes([bytes[8], bytes[9]]), FILE_FORMAT_VERSION);
    assert_eq!(bytes[10], SketchKind::Bloom as u8);
    assert_eq!(&bytes[16..18], &[0x02, 0x01]);
    assert_eq!(bytes[24], 3);
    assert_eq!(bytes[40], 40);
    assert!(bytes[56..64].iter().all(|&b| b == 0));
}

#[test]
fn test_sketch_header_magic_validation() {
    let mut bytes = [0u8; FILE_HEADER_SIZE];
    bytes[0..8].copy_from_slice(b"INVALID\x00");

    let result = SketchHeader::from_bytes(&bytes);
    assert!(matches!(result, Err(SketchFormatError::InvalidMagic)));
}

#[test]
fn test_sketch_header_version_validation() {
    let mut header = SketchHeader::new(SketchKind::BitSet, [64, 0, 0], 8);
    header.version = FILE_FORMAT_VERSION + 1;
    let bytes = header.to_bytes();

    let result = SketchHeader::from_bytes(&bytes);
    assert!(matches!(
        result,
        Err(SketchFormatError::UnsupportedVersion(_))
    ));
}

#[test]
fn test_sketch_header_unknown_kind() {
    let header = SketchHeader::new(SketchKind::BitSet, [64, 0, 0], 8);
    let mut bytes = header.to_bytes();
    bytes[10] = 0xEE;

    let result = SketchHeader::from_bytes(&bytes);
    assert_eq!(result, Err(SketchFormatError::UnknownKind(0xEE)));
}

#[test]
fn test_validate_header_per_kind() {
    let valid = [
        SketchHeader::new(SketchKind::BitSet, [100, 0, 0], 16),
        SketchHeader::new(SketchKind::Bloom, [9586, 7, 0], 150 * 8),
        SketchHeader::new(SketchKind::HyperLogLog, [12, 0, 0], 4096),
        SketchHeader::new(SketchKind::MinHash, [128, 0, 0], 512),
        SketchHeader::new(SketchKind::CountMin, [4, 10, 0], 320),
    ];
    for header in &valid {
        assert!(validate_header(header).is_ok(), "{:?}", header);
    }

    let invalid = SketchHeader::new(SketchKind::HyperLogLog, [12, 0, 0], 4095);
    assert!(matches!(
        validate_header(&invalid),
        Err(SketchFormatError::InvalidPayloadLength { .. })
    ));
}

#[test]
fn test_expected_file_size() {
    let header = SketchHeader::new(SketchKind::MinHash, [16, 0, 0], 64);
    assert_eq!(expected_file_size(&header), 128);

    // absurd payload lengths must not overflow
    let header = SketchHeader::new(SketchKind::MinHash, [0, 0, 0], u64::MAX);
    assert_eq!(expected_file_size(&header), u64::MAX);
}
