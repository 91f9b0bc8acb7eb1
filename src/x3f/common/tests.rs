use std::io::Write;
use std::sync::Arc;

use super::bytes::{ByteCursor, c_string, u16_at, u32_at};
use super::error::FormatError;
use super::geometry::Rect;
use super::source::{ByteSource, FileSource};

#[test]
fn test_u32_at_reads_little_endian() {
    let data = [0x46, 0x4f, 0x56, 0x62, 0x01];
    assert_eq!(u32_at(&data, 0, "magic").unwrap(), 0x62564f46);
    assert_eq!(u16_at(&data, 3, "pair").unwrap(), 0x0162);
}

#[test]
fn test_truncated_read_reports_context() {
    let data = [0u8; 6];
    let err = u32_at(&data, 4, "row offsets").unwrap_err();
    match err {
        FormatError::Truncated {
            what,
            offset,
            needed,
            available,
        } => {
            assert_eq!(what, "row offsets");
            assert_eq!(offset, 4);
            assert_eq!(needed, 4);
            assert_eq!(available, 2);
        }
        other => panic!("unexpected error {other:?}"),
    }
}

#[test]
fn test_offset_overflow_is_an_error_not_a_panic() {
    let data = [0u8; 4];
    assert!(u32_at(&data, usize::MAX - 1, "huge").is_err());
}

#[test]
fn test_cursor_walks_fields() {
    let mut data = Vec::new();
    data.extend_from_slice(&7u32.to_le_bytes());
    data.extend_from_slice(&3u16.to_le_bytes());
    data.push(9);
    data.extend_from_slice(&1.5f32.to_le_bytes());

    let mut cursor = ByteCursor::new(&data, "test");
    assert_eq!(cursor.u32().unwrap(), 7);
    assert_eq!(cursor.u16().unwrap(), 3);
    assert_eq!(cursor.u8().unwrap(), 9);
    assert_eq!(cursor.f32().unwrap(), 1.5);
    assert_eq!(cursor.remaining(), 0);
    assert!(cursor.u8().is_err());
}

#[test]
fn test_c_string_stops_at_nul() {
    assert_eq!(c_string(b"Auto\0\0garbage"), "Auto");
    assert_eq!(c_string(b"NoTerminator"), "NoTerminator");
    assert_eq!(c_string(b""), "");
}

#[test]
fn test_memory_sources_read_at_offsets() {
    let bytes: Vec<u8> = (0u8..16).collect();
    let mut buf = [0u8; 4];
    bytes.read_at(10, &mut buf).unwrap();
    assert_eq!(buf, [10, 11, 12, 13]);
    assert!(bytes.read_at(14, &mut buf).is_err());

    let shared: Arc<[u8]> = Arc::from(bytes.clone());
    assert_eq!(ByteSource::len(&shared), 16);
    assert_eq!(shared.read_vec(0, 2).unwrap(), vec![0, 1]);
}

#[test]
fn test_file_source_positional_reads() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    file.write_all(b"0123456789").unwrap();
    file.flush().unwrap();

    let source = FileSource::open(file.path()).unwrap();
    assert_eq!(source.len(), 10);
    assert_eq!(source.read_vec(6, 4).unwrap(), b"6789".to_vec());
    assert!(source.read_vec(8, 4).is_err());
}

#[test]
fn test_rect_geometry() {
    let rect = Rect::new(2, 4, 5, 9);
    assert_eq!(rect.columns(), 4);
    assert_eq!(rect.rows(), 6);
    assert!(rect.fits_within(6, 10));
    assert!(!rect.fits_within(5, 10));
    assert_eq!(rect.halved(), Rect::new(1, 2, 2, 4));
    assert_eq!(rect.doubled_within(8, 100), Some(Rect::new(4, 8, 7, 19)));
    assert_eq!(Rect::from_slice(&[1, 2, 3]), None);
}
