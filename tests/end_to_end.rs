mod common;

use std::io::{Cursor, Write};
use std::sync::Arc;

use tempfile::NamedTempFile;
use tiff::ColorType;
use tiff::decoder::{Decoder, DecodingResult};

use common::{
    FORMAT_QUATTRO, FORMAT_TRUE, Plane, X3fFile, camf_section, property_section, texture,
    true_section, u32_matrix,
};
use x3f_raw_rs::x3f::container::{Container, tags};
use x3f_raw_rs::x3f::levels::black_level;
use x3f_raw_rs::x3f::{
    ChromaMedianDenoiser, DecodeOptions, OutputConfig, PlaneLayout, RawPipeline, TiffCompression,
    TimingDiagnostics, X3fError,
};

fn write_temp(bytes: &[u8]) -> NamedTempFile {
    let mut file = NamedTempFile::new().unwrap();
    file.write_all(bytes).unwrap();
    file.flush().unwrap();
    file
}

/// 16x12 Merrill-style TRUE file with properties, a dark column and one
/// bad pixel.
fn true_file() -> (Vec<u8>, [Vec<u16>; 3]) {
    let (columns, rows) = (16usize, 12usize);
    let mut planes = [texture(columns, rows, 0), texture(columns, rows, 100), texture(columns, rows, 200)];
    for plane in &mut planes {
        // Dark column at x = 0.
        for y in 0..rows {
            plane[y * columns] = 64;
        }
        plane[5 * columns + 6] = 4095;
    }
    let section = true_section(
        FORMAT_TRUE,
        columns as u32,
        rows as u32,
        &planes.clone().map(|values| Plane {
            columns,
            rows,
            values,
            seed: 512,
        }),
    );
    let camf = camf_section(
        0xc0ff_ee00,
        &[
            u32_matrix("KeepImageArea", &[4], &[0, 0, 15, 11]),
            u32_matrix("DarkShieldColRange", &[2, 2], &[0, 0, 15, 15]),
            u32_matrix("ActiveImageArea", &[4], &[2, 1, 13, 10]),
            u32_matrix("BadPixelsF20", &[3, 1], &[5, 6, 0]),
            u32_matrix("WhiteBalance", &[1], &[4]),
        ],
    );
    let bytes = X3fFile::new()
        .section(tags::SECP, property_section(&[("CAMMANUF", "SIGMA"), ("CAMMODEL", "SIGMA DP1 Merrill")]))
        .section(tags::SECC, camf)
        .section(tags::SECI, section)
        .build();
    (bytes, planes)
}

fn quattro_file() -> Vec<u8> {
    let low = |phase| Plane {
        columns: 8,
        rows: 6,
        values: texture(8, 6, phase),
        seed: 1024,
    };
    let top = Plane {
        columns: 16,
        rows: 12,
        values: texture(16, 12, 50),
        seed: 1024,
    };
    let section = true_section(FORMAT_QUATTRO, 16, 12, &[low(0), low(30), top]);
    X3fFile::new().section(tags::SECI, section).build()
}

fn read_tiff(path: &std::path::Path) -> (ColorType, (u32, u32), Vec<u16>) {
    let file = std::fs::File::open(path).unwrap();
    let mut decoder = Decoder::new(std::io::BufReader::new(file)).unwrap();
    let color = decoder.colortype().unwrap();
    let dims = decoder.dimensions().unwrap();
    let DecodingResult::U16(data) = decoder.read_image().unwrap() else {
        panic!("expected 16-bit samples");
    };
    (color, dims, data)
}

#[test]
fn test_inspect_metadata_from_disk() {
    let (bytes, planes) = true_file();
    let file = write_temp(&bytes);
    let container = Container::open(file.path()).unwrap();

    assert_eq!(container.header().version_string(), "4.0");
    assert_eq!(container.directory().len(), 3);
    assert_eq!(container.file_size(), bytes.len() as u64);

    container.load_properties().unwrap();
    assert_eq!(container.property("CAMMODEL"), Some("SIGMA DP1 Merrill"));
    container.load_camf().unwrap();
    assert_eq!(container.white_balance(), "Overcast");

    container.load_images().unwrap();
    let raw = container.raw_image().unwrap();
    let decoded = raw.decode().unwrap();
    assert_eq!(decoded.layout, PlaneLayout::Uniform);
    for (i, pixel) in decoded.image.data.chunks_exact(3).enumerate() {
        assert_eq!(pixel, [planes[0][i], planes[1][i], planes[2][i]]);
    }

    // The left dark column is the only dark area; the right one is scaled
    // onto column 15 of the image and is not dark.
    let level = black_level(&decoded.image, &container);
    assert_eq!(level.samples, 24);
    assert!(level.level.iter().all(|&l| l > 64.0));
}

#[test]
fn test_convert_file_writes_repaired_rgb_tiff() {
    let (bytes, planes) = true_file();
    let input = write_temp(&bytes);
    let output = NamedTempFile::new().unwrap();

    let diagnostics = Arc::new(TimingDiagnostics::new());
    let config = OutputConfig::builder()
        .compression(TiffCompression::DeflateFast)
        .predictor(Some(2))
        .build();
    let pipeline = RawPipeline::new(DecodeOptions::default(), config).with_diagnostics(diagnostics.clone());
    let image = pipeline.convert_file(input.path(), output.path()).unwrap();
    assert_eq!((image.width, image.height, image.channels), (16, 12, 3));

    let (color, dims, data) = read_tiff(output.path());
    assert_eq!(color, ColorType::RGB(16));
    assert_eq!(dims, (16, 12));
    assert_eq!(data, image.data);

    let at = |x: usize, y: usize| y * 16 + x;
    for (c, plane) in planes.iter().enumerate() {
        let neighbours = [at(5, 5), at(7, 5), at(6, 4), at(6, 6)].map(|i| u32::from(plane[i]));
        let expected = (neighbours.iter().sum::<u32>() + 2) / 4;
        assert_eq!(u32::from(data[at(6, 5) * 3 + c]), expected);
    }

    let timings = diagnostics.timings();
    assert!(timings.get_step("decode_raw").is_some());
    assert!(timings.get_step("fix_bad_pixels").is_some());
    assert!(timings.get_step("expand_quattro").is_none());
}

#[test]
fn test_convert_in_memory_with_crop() {
    let (bytes, _) = true_file();
    let options = DecodeOptions::builder().crop_to_active_area(true).build();
    let pipeline = RawPipeline::new(options, OutputConfig::default());
    let mut output = Cursor::new(Vec::new());
    let image = pipeline.convert(&bytes, &mut output).unwrap();
    assert_eq!((image.width, image.height), (12, 10));
    assert!(!output.into_inner().is_empty());
}

#[test]
fn test_quattro_file_expands_with_builtin_denoiser() {
    let input = write_temp(&quattro_file());
    let output = NamedTempFile::new().unwrap();
    let options = DecodeOptions::builder().denoise(true).build();
    let pipeline = RawPipeline::new(options, OutputConfig::default())
        .with_denoiser(Arc::new(ChromaMedianDenoiser));

    let image = pipeline.convert_file(input.path(), output.path()).unwrap();
    assert_eq!((image.width, image.height, image.channels), (16, 12, 3));
    let (_, dims, _) = read_tiff(output.path());
    assert_eq!(dims, (16, 12));
}

#[test]
fn test_empty_directory_reports_missing_sections() {
    let file = write_temp(&X3fFile::new().build());
    let container = Container::open(file.path()).unwrap();
    assert!(container.directory().is_empty());
    for tag in [tags::SECP, tags::SECC, tags::SECI] {
        assert!(matches!(
            container.load_section(tag),
            Err(X3fError::SectionNotFound(t)) if t == tag
        ));
    }
}

#[test]
fn test_truncated_file_is_rejected() {
    let (bytes, _) = true_file();
    let file = write_temp(&bytes[..bytes.len() / 2]);
    assert!(Container::open(file.path()).is_err());
}
