use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result, bail};
use tracing::{info, warn};

use x3f_raw_rs::logger;
use x3f_raw_rs::x3f::camf::CamfValue;
use x3f_raw_rs::x3f::container::{Container, tags};
use x3f_raw_rs::x3f::levels::black_level;
use x3f_raw_rs::x3f::{
    ChromaMedianDenoiser, DecodeOptions, OutputConfig, RawPipeline, TiffCompression,
    TimingDiagnostics, X3fError,
};

const USAGE: &str = "usage: x3f-inspect <file.x3f> [out.tiff]";

fn main() -> Result<()> {
    logger::init();

    let mut args = std::env::args_os().skip(1);
    let Some(input) = args.next().map(PathBuf::from) else {
        bail!(USAGE);
    };
    let output = args.next().map(PathBuf::from);
    if args.next().is_some() {
        bail!(USAGE);
    }

    inspect(&input).with_context(|| format!("inspecting {}", input.display()))?;

    if let Some(output) = output {
        convert(&input, &output)
            .with_context(|| format!("converting {} to {}", input.display(), output.display()))?;
    }
    Ok(())
}

fn inspect(path: &Path) -> Result<()> {
    let container = Container::open(path)?;
    let header = container.header();

    println!("File: {}", path.display());
    println!("  size:     {} bytes", container.file_size());
    println!("  version:  {}", header.version_string());
    if let Some(legacy) = &header.legacy {
        println!("  geometry: {}x{} rotation {}", legacy.columns, legacy.rows, legacy.rotation);
    }

    println!("Directory ({} entries):", container.directory().len());
    for entry in container.directory().entries() {
        println!(
            "  {} offset {:>10} length {:>10} {:?}",
            tags::fourcc(entry.tag),
            entry.offset,
            entry.length,
            entry.kind()
        );
    }

    match container.load_properties() {
        Ok(properties) => {
            println!("Properties ({}):", properties.len());
            for (name, value) in properties.iter() {
                println!("  {name} = {value}");
            }
        }
        Err(X3fError::SectionNotFound(_)) => println!("Properties: none"),
        Err(e) => warn!(error = %e, "Failed to load properties"),
    }

    match container.load_camf() {
        Ok(camf) => {
            let header = camf.header();
            println!(
                "CAMF type {} with {} entries, white balance {}",
                header.camf_type,
                camf.len(),
                container.white_balance()
            );
            for entry in camf.entries() {
                let summary = match &entry.value {
                    CamfValue::Text(text) => format!("text, {} chars", text.chars().count()),
                    CamfValue::Properties(list) => format!("{} properties", list.len()),
                    CamfValue::Matrix(matrix) => format!("matrix {:?}", matrix.dim_sizes()),
                    CamfValue::Other => "unparsed".to_string(),
                };
                println!("  {:<32} {}", entry.name, summary);
            }
        }
        Err(X3fError::SectionNotFound(_)) => println!("CAMF: none"),
        Err(e) => warn!(error = %e, "Failed to load CAMF"),
    }

    let images = container.load_images()?;
    println!("RAW images ({}):", images.len());
    for image in images {
        let header = image.header();
        println!(
            "  #{} {:?} {}x{} layout {:?}",
            image.index(),
            image.codec(),
            header.columns,
            header.rows,
            image.layout()
        );
    }

    let raw = container.raw_image()?;
    let decoded = raw.decode()?;
    let level = black_level(&decoded.image, &container);
    println!(
        "Black level: {:.1} {:.1} {:.1} (deviation {:.2} {:.2} {:.2}, {} samples)",
        level.level[0],
        level.level[1],
        level.level[2],
        level.deviation[0],
        level.deviation[1],
        level.deviation[2],
        level.samples
    );
    Ok(())
}

fn convert(input: &Path, output: &Path) -> Result<()> {
    if input == output {
        bail!("refusing to overwrite the input file");
    }
    let diagnostics = Arc::new(TimingDiagnostics::new());
    let options = DecodeOptions::builder().denoise(true).build();
    let config = OutputConfig::builder()
        .compression(TiffCompression::DeflateBalanced)
        .predictor(Some(2))
        .build();
    let pipeline = RawPipeline::new(options, config)
        .with_denoiser(Arc::new(ChromaMedianDenoiser))
        .with_diagnostics(diagnostics.clone());

    info!(compression = ?pipeline.config().compression, "RAW to TIFF pipeline initialized");
    let image = pipeline.convert_file(input, output)?;
    info!(
        width = image.width,
        height = image.height,
        output = %output.display(),
        "Conversion successful"
    );
    for note in diagnostics.notes() {
        info!("{note}");
    }
    eprint!("{}", diagnostics.timings().summary());
    Ok(())
}
