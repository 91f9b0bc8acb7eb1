use super::*;
use crate::x3f::common::error::{DataError, DecodeError, X3fError};
use crate::x3f::common::geometry::Rect;
use crate::x3f::test_support::{
    BitWriter, camf_type2_section, matrix_entry, property_entry, push_true_diff, put_u32,
    text_entry, true_table, u32_matrix,
};

fn camf_header(camf_type: u32, decoded_size: u32, bias: u32, block_size: u32, block_count: u32) -> Vec<u8> {
    let mut out = Vec::new();
    put_u32(&mut out, 0x6343_4553);
    put_u32(&mut out, 0x0002_0000);
    put_u32(&mut out, camf_type);
    put_u32(&mut out, decoded_size);
    put_u32(&mut out, bias);
    put_u32(&mut out, block_size);
    put_u32(&mut out, block_count);
    out
}

/// Table bytes padded to the fixed bit-stream offset.
fn huffman_payload(table: &[(u8, u8)], bits: &[u8]) -> Vec<u8> {
    let mut out = Vec::new();
    for &(size, code) in table {
        out.push(size);
        out.push(code);
    }
    out.extend_from_slice(&[0, 0]);
    assert!(out.len() <= 28);
    out.resize(28, 0);
    put_u32(&mut out, 0);
    out.extend_from_slice(bits);
    out
}

fn parse_entries_of(entries: &[Vec<u8>]) -> Camf {
    let joined: Vec<u8> = entries.concat();
    Camf::parse(&camf_type2_section(0x1234_5678, &joined)).unwrap()
}

#[test]
fn test_xor_stream_is_an_involution() {
    let data: Vec<u8> = (0..=255).collect();
    let once = xor_stream(42, &data);
    assert_ne!(once, data);
    assert_eq!(xor_stream(42, &once), data);
    assert_eq!(xor_stream(42, &data), once);
}

#[test]
fn test_xor_stream_depends_on_key() {
    let data = vec![0u8; 64];
    assert_ne!(xor_stream(1, &data), xor_stream(2, &data));
}

#[test]
fn test_accumulator_with_zero_bits_repeats_bias() {
    let mut section = camf_header(5, 4, 10, 0, 0);
    section.extend_from_slice(&huffman_payload(&[(1, 0x80)], &[0, 0, 0, 0]));

    let (header, decoded) = decrypt(&section).unwrap();
    assert_eq!(header.camf_type, 5);
    assert_eq!(decoded, vec![10, 10, 10, 10]);
}

#[test]
fn test_accumulator_wraps_low_byte() {
    let table: Vec<(u8, u8)> = true_table()
        .into_iter()
        .take(13)
        .map(|c| (c.code_size, c.code))
        .collect();
    let mut writer = BitWriter::new();
    for diff in [5, 250, -10] {
        push_true_diff(&mut writer, diff);
    }
    let mut section = camf_header(5, 3, 0, 0, 0);
    section.extend_from_slice(&huffman_payload(&table, &writer.finish()));

    let (_, decoded) = decrypt(&section).unwrap();
    assert_eq!(decoded, vec![5, 255, 245]);
}

#[test]
fn test_twelve_bit_packing() {
    let table: Vec<(u8, u8)> = true_table()
        .into_iter()
        .take(13)
        .map(|c| (c.code_size, c.code))
        .collect();
    let mut writer = BitWriter::new();
    push_true_diff(&mut writer, 0x123 - 0x100);
    push_true_diff(&mut writer, 0x456 - 0x100);
    let mut section = camf_header(4, 3, 0x100, 2, 1);
    section.extend_from_slice(&huffman_payload(&table, &writer.finish()));

    let (_, decoded) = decrypt(&section).unwrap();
    assert_eq!(decoded, vec![0x12, 0x34, 0x56]);
}

#[test]
fn test_huffman_payload_must_extend_past_table() {
    let mut section = camf_header(5, 4, 0, 0, 0);
    section.extend_from_slice(&[1, 0x80, 0, 0]);
    let err = decrypt(&section).unwrap_err();
    assert!(matches!(
        err,
        X3fError::Decode(DecodeError::CamfPayloadTooShort { .. })
    ));
}

#[test]
fn test_unsupported_type() {
    let mut section = camf_header(3, 0, 0, 0, 0);
    section.extend_from_slice(&[0; 8]);
    let err = decrypt(&section).unwrap_err();
    assert!(matches!(
        err,
        X3fError::Decode(DecodeError::UnsupportedCamfType(3))
    ));
}

#[test]
fn test_short_section_is_a_format_error() {
    let err = decrypt(&[0u8; 12]).unwrap_err();
    assert!(matches!(err, X3fError::Format(_)));
}

#[test]
fn test_parses_text_properties_and_matrices() {
    let camf = parse_entries_of(&[
        text_entry("SensorID", "F23"),
        property_entry("WhiteBalanceGains", &[("Sunlight", "WB_Sun"), ("Auto", "WB_Auto")]),
        u32_matrix("KeepImageArea", &[4], &[10, 20, 109, 219]),
    ]);

    assert_eq!(camf.len(), 3);
    assert_eq!(camf.text("SensorID"), Some("F23"));
    assert_eq!(camf.property("WhiteBalanceGains", "Auto"), Some("WB_Auto"));
    assert_eq!(camf.property("WhiteBalanceGains", "Flash"), None);
    assert_eq!(camf.entries()[2].kind(), "matrix");
    assert_eq!(camf.rect("KeepImageArea"), Some(Rect::new(10, 20, 109, 219)));
}

#[test]
fn test_matrix_element_types() {
    let i16_data: Vec<u8> = [-3i16, 7].iter().flat_map(|v| v.to_le_bytes()).collect();
    let f32_data: Vec<u8> = [1.5f32, f32::NAN].iter().flat_map(|v| v.to_le_bytes()).collect();
    let u8_data = [9u8, 200];
    let camf = parse_entries_of(&[
        matrix_entry("Signed", 0, &[(2, "x")], &i16_data),
        matrix_entry("Float", 3, &[(2, "")], &f32_data),
        matrix_entry("Bytes", 5, &[(2, "")], &u8_data),
    ]);

    let signed = camf.matrix("Signed").unwrap();
    assert_eq!(signed.element_type, ElementType::Int16);
    assert_eq!(signed.dims[0].name, "x");
    assert_eq!(camf.i32_vector("Signed", 2), Some(&[-3, 7][..]));
    assert_eq!(camf.f64_vector("Float", 2), Some(vec![1.5, 0.0]));
    assert_eq!(camf.u32_vector("Bytes", 0), Some(&[9, 200][..]));
}

#[test]
fn test_unknown_matrix_type_uses_element_width() {
    let data: Vec<u8> = [2.5f64].iter().flat_map(|v| v.to_le_bytes()).collect();
    let camf = parse_entries_of(&[matrix_entry("Wide", 9, &[(1, "")], &data)]);
    assert_eq!(camf.f64_scalar("Wide"), Some(2.5));
}

#[test]
fn test_short_matrix_payload_is_dropped() {
    let short = u32_matrix("Short", &[4], &[1, 2]);
    let camf = parse_entries_of(&[short, text_entry("After", "ok")]);

    assert!(camf.matrix("Short").is_none());
    assert_eq!(camf.text("After"), Some("ok"));
}

#[test]
fn test_walk_stops_at_padding() {
    let mut entries = text_entry("One", "1");
    entries.extend_from_slice(&[0u8; 24]);
    let camf = Camf::parse(&camf_type2_section(7, &entries)).unwrap();
    assert_eq!(camf.len(), 1);
}

#[test]
fn test_scalar_accessors() {
    let camf = parse_entries_of(&[
        u32_matrix("CAMERAID", &[1], &[15]),
        u32_matrix("Pair", &[2], &[1, 2]),
        u32_matrix("WhiteBalance", &[1], &[3]),
    ]);
    assert_eq!(camf.camera_id(), Some(CAMERA_ID_SDQ));
    assert_eq!(camf.u32_scalar("Pair"), None);
    assert_eq!(camf.u32_vector("Pair", 3), None);
    assert_eq!(camf.white_balance_code().map(white_balance_name), Some("Shadow"));
    assert_eq!(white_balance_name(9), "Auto");
}

#[test]
fn test_matrix_with_dims_wildcard() {
    let camf = parse_entries_of(&[u32_matrix("Grid", &[3, 5], &[0; 15])]);
    assert!(camf.matrix_with_dims("Grid", &[3, 0]).is_ok());
    assert!(matches!(
        camf.matrix_with_dims("Grid", &[2, 0]),
        Err(DataError::DimensionMismatch { .. })
    ));
    assert!(matches!(
        camf.matrix_with_dims("Missing", &[1]),
        Err(DataError::MissingEntry(_))
    ));
}

#[test]
fn test_rect_scaled_relative_to_keep_area() {
    let camf = parse_entries_of(&[
        u32_matrix("KeepImageArea", &[4], &[100, 50, 299, 149]),
        u32_matrix("DarkShieldTop", &[4], &[120, 40, 179, 59]),
        u32_matrix("Outside", &[4], &[0, 0, 10, 10]),
    ]);

    assert_eq!(
        camf.rect_scaled("DarkShieldTop", 200, 100, false),
        Some(Rect::new(20, 0, 79, 9))
    );
    assert_eq!(
        camf.rect_scaled("DarkShieldTop", 100, 50, true),
        Some(Rect::new(10, 0, 39, 4))
    );
    assert_eq!(camf.rect_scaled("Outside", 200, 100, false), None);
}

#[test]
fn test_max_raw_prefers_image_depth() {
    let camf = parse_entries_of(&[u32_matrix("ImageDepth", &[1], &[14])]);
    assert_eq!(camf.max_raw(), Some([16383; 3]));

    let levels: Vec<u8> = [4000i16, 4001, 4002].iter().flat_map(|v| v.to_le_bytes()).collect();
    let camf = parse_entries_of(&[matrix_entry("SaturationLevel", 0, &[(3, "")], &levels)]);
    assert_eq!(camf.max_raw(), Some([4000, 4001, 4002]));
}

#[test]
fn test_true_engine_and_white_balance_matrix() {
    let gains: Vec<u8> = [1.0f32, 1.25, 2.0].iter().flat_map(|v| v.to_le_bytes()).collect();
    let camf = parse_entries_of(&[
        property_entry("WhiteBalanceColorCorrections", &[("Sunlight", "CC_Sun")]),
        property_entry("WhiteBalanceGains", &[("Sunlight", "Gain_Sun")]),
        matrix_entry("Gain_Sun", 3, &[(3, "")], &gains),
    ]);

    assert!(camf.is_true_engine());
    assert_eq!(
        camf.matrix_for_white_balance("WhiteBalanceGains", "Daylight", &[3]),
        Some(vec![1.0, 1.25, 2.0])
    );
    assert_eq!(
        camf.matrix_for_white_balance("WhiteBalanceGains", "Flash", &[3]),
        None
    );
}

#[test]
fn test_sensor_id_from_property_list() {
    let camf = parse_entries_of(&[property_entry("CameraInfo", &[("SensorID", "F20")])]);
    assert_eq!(camf.sensor_id(), Some("F20"));
    assert!(!camf.is_true_engine());
}
