//! End-to-end tests: source images on disk through to DDS/KTX files.
//!
//! A fake encoder stands in for the ISPC kernels; it produces blocks of the
//! right size so container layout can be checked without real compression.

use std::fs;
use std::path::Path;
use std::time::{Duration, SystemTime};

use filetime::FileTime;
use image::{DynamicImage, GrayImage, Luma, Rgb, Rgb32FImage, RgbImage, Rgba, RgbaImage};
use tempfile::TempDir;

use texbake::compress::{BlockEncoder, EncodeSurface};
use texbake::config::ProcessTexturesParams;
use texbake::container::{read_dds, read_ktx, Container};
use texbake::format::{
    AstcBlock, AstcKind, BcVariant, BlockCodec, ColorSpace, CompressionRequest, TextureFormat,
};
use texbake::mipmap::MipMode;
use texbake::pipeline::{process_directory, FileOutcome, Pipeline, Stage};
use texbake::{ErrorKind, TextureResult};

/// Fills every block with its codec's block size as a marker byte.
struct FakeEncoder;

impl BlockEncoder for FakeEncoder {
    fn encode(
        &self,
        codec: BlockCodec,
        surface: &EncodeSurface<'_>,
        _has_alpha: bool,
    ) -> TextureResult<Vec<u8>> {
        let size = codec.compressed_size(surface.width, surface.height);
        Ok(vec![codec.bytes_per_block() as u8; size])
    }

    fn name(&self) -> &str {
        "fake"
    }
}

fn u32_at(bytes: &[u8], offset: usize) -> u32 {
    u32::from_le_bytes(bytes[offset..offset + 4].try_into().unwrap())
}

fn write_rgba_png(path: &Path, size: u32) {
    RgbaImage::from_fn(size, size, |x, y| Rgba([x as u8, y as u8, 128, 255]))
        .save(path)
        .unwrap();
}

fn write_normal_png(path: &Path, size: u32) {
    RgbImage::from_pixel(size, size, Rgb([128, 128, 255]))
        .save(path)
        .unwrap();
}

fn write_roughness_png(path: &Path, size: u32) {
    DynamicImage::ImageLuma8(GrayImage::from_pixel(size, size, Luma([90])))
        .save(path)
        .unwrap();
}

#[test]
fn test_srgb_albedo_to_bc7_dds() {
    let dir = TempDir::new().unwrap();
    let input = dir.path().join("albedo.png");
    let output = dir.path().join("albedo.tex");
    write_rgba_png(&input, 256);

    let pipeline = Pipeline::new(ProcessTexturesParams::default(), FakeEncoder);
    let FileOutcome::Processed(record) = pipeline.process_file(&input, &output).unwrap() else {
        panic!("expected processed outcome");
    };
    assert_eq!(record.format, TextureFormat::bc(BcVariant::Bc7, true, false));
    assert_eq!(record.mip_count, 9);

    let bytes = fs::read(&output).unwrap();
    assert_eq!(&bytes[0..4], b"DDS ");
    assert_eq!(u32_at(&bytes, 28), 9);
    assert_eq!(&bytes[84..88], b"DX10");
    assert_eq!(u32_at(&bytes, 128), 99);
    assert_eq!(u32_at(&bytes, 140), 1);

    // 256² down to 1², one 16-byte block minimum per level.
    let payload: usize = (0..9)
        .map(|level| {
            let extent = (256u32 >> level).max(1);
            extent.div_ceil(4) as usize * extent.div_ceil(4) as usize * 16
        })
        .sum();
    assert_eq!(bytes.len(), 148 + payload);

    let texture = read_dds(&bytes).unwrap();
    assert_eq!(texture.desc.format, record.format);
    assert_eq!(texture.desc.mip_count, 9);
    assert!(texture.level_bytes()[0].iter().all(|&b| b == 16));
}

#[test]
fn test_hdr_source_to_astc_float() {
    let dir = TempDir::new().unwrap();
    let input = dir.path().join("sky.hdr");
    let output = dir.path().join("sky.tex");
    let image = Rgb32FImage::from_pixel(130, 130, Rgb([1.5, 0.75, 0.25]));
    DynamicImage::ImageRgb32F(image).save(&input).unwrap();

    let params = ProcessTexturesParams::new()
        .with_compression(CompressionRequest::astc())
        .with_container(Container::Ktx);
    let pipeline = Pipeline::new(params, FakeEncoder);
    let FileOutcome::Processed(record) = pipeline.process_file(&input, &output).unwrap() else {
        panic!("expected processed outcome");
    };

    assert_eq!(
        record.format,
        TextureFormat::Astc {
            block: AstcBlock::B6x6,
            kind: AstcKind::Float,
        }
    );
    assert_eq!((record.width, record.height), (132, 132));
    assert_eq!(record.mip_count, 8);

    let texture = read_ktx(&fs::read(&output).unwrap()).unwrap();
    assert_eq!((texture.desc.width, texture.desc.height), (132, 132));
    assert_eq!(texture.level_bytes()[0].len(), 22 * 22 * 16);
    assert_eq!(
        texture.desc.format,
        TextureFormat::Astc {
            block: AstcBlock::B6x6,
            kind: AstcKind::Unorm,
        }
    );
}

#[test]
fn test_vmf_batch_isolates_mismatched_file() {
    let dir = TempDir::new().unwrap();
    let input_dir = dir.path().join("normals");
    let output_dir = dir.path().join("baked");
    fs::create_dir_all(&input_dir).unwrap();
    write_normal_png(&input_dir.join("large.png"), 64);
    write_normal_png(&input_dir.join("small.png"), 32);
    let roughness = dir.path().join("roughness.png");
    write_roughness_png(&roughness, 32);

    let params = ProcessTexturesParams::new()
        .with_color_space(ColorSpace::Linear)
        .with_roughness_path(&roughness);
    let report = process_directory(&input_dir, &output_dir, params, FakeEncoder).unwrap();

    assert_eq!(report.processed, 1);
    assert_eq!(report.failed.len(), 1);
    let failure = &report.failed[0];
    assert_eq!(failure.path, input_dir.join("large.png"));
    assert_eq!(failure.stage, Stage::VmfSynthesis);
    assert_eq!(failure.kind(), ErrorKind::DimensionMismatch);

    assert!(!output_dir.join("large.tex").exists());
    let bytes = fs::read(output_dir.join("small.tex")).unwrap();
    let texture = read_dds(&bytes).unwrap();
    assert_eq!(texture.desc.format, TextureFormat::bc(BcVariant::Bc5, false, false));
    assert_eq!(texture.desc.mip_count, 6);
}

#[test]
fn test_second_run_skips_fresh_outputs() {
    let dir = TempDir::new().unwrap();
    let input_dir = dir.path().join("src");
    let output_dir = dir.path().join("out");
    fs::create_dir_all(input_dir.join("stone")).unwrap();
    let input = input_dir.join("stone/wall.png");
    write_rgba_png(&input, 16);

    let first = process_directory(
        &input_dir,
        &output_dir,
        ProcessTexturesParams::default(),
        FakeEncoder,
    )
    .unwrap();
    assert_eq!(first.processed, 1);

    let output = output_dir.join("stone/wall.tex");
    let now = SystemTime::now()
        .duration_since(SystemTime::UNIX_EPOCH)
        .unwrap()
        .as_secs() as i64;
    let later = FileTime::from_unix_time(now + 60, 0);
    filetime::set_file_mtime(&output, later).unwrap();

    let second = process_directory(
        &input_dir,
        &output_dir,
        ProcessTexturesParams::default(),
        FakeEncoder,
    )
    .unwrap();
    assert_eq!(second.processed, 0);
    assert_eq!(second.skipped, 1);
    let mtime = FileTime::from_last_modification_time(&fs::metadata(&output).unwrap());
    assert_eq!(mtime, later);

    let forced = process_directory(
        &input_dir,
        &output_dir,
        ProcessTexturesParams::new().with_force(true),
        FakeEncoder,
    )
    .unwrap();
    assert_eq!(forced.processed, 1);
}

#[test]
fn test_equal_timestamps_reprocess() {
    let dir = TempDir::new().unwrap();
    let input = dir.path().join("a.png");
    let output = dir.path().join("a.tex");
    write_rgba_png(&input, 8);
    Pipeline::new(ProcessTexturesParams::default(), FakeEncoder)
        .process_file(&input, &output)
        .unwrap();

    let stamp = FileTime::from_unix_time(1_700_000_000, 0);
    filetime::set_file_mtime(&input, stamp).unwrap();
    filetime::set_file_mtime(&output, stamp).unwrap();

    let outcome = Pipeline::new(ProcessTexturesParams::default(), FakeEncoder)
        .process_file(&input, &output)
        .unwrap();
    assert!(matches!(outcome, FileOutcome::Processed(_)));
}

#[test]
fn test_roughness_inside_input_dir_is_not_baked() {
    let dir = TempDir::new().unwrap();
    let input_dir = dir.path().join("normals");
    let output_dir = dir.path().join("baked");
    fs::create_dir_all(&input_dir).unwrap();
    write_normal_png(&input_dir.join("wall.png"), 32);
    let roughness = input_dir.join("roughness.png");
    write_roughness_png(&roughness, 32);

    let params = ProcessTexturesParams::new()
        .with_color_space(ColorSpace::Linear)
        .with_roughness_path(&roughness);
    let report = process_directory(&input_dir, &output_dir, params, FakeEncoder).unwrap();

    assert_eq!(report.processed, 1);
    assert!(report.failed.is_empty());
    assert!(output_dir.join("wall.tex").exists());
    assert!(!output_dir.join("roughness.tex").exists());
}

#[test]
fn test_additional_timestamp_invalidates_outputs() {
    let dir = TempDir::new().unwrap();
    let input = dir.path().join("a.png");
    let output = dir.path().join("a.tex");
    write_rgba_png(&input, 8);
    Pipeline::new(ProcessTexturesParams::default(), FakeEncoder)
        .process_file(&input, &output)
        .unwrap();

    let params = ProcessTexturesParams::new()
        .with_additional_modified_time(SystemTime::now() + Duration::from_secs(3600));
    let outcome = Pipeline::new(params, FakeEncoder)
        .process_file(&input, &output)
        .unwrap();
    assert!(matches!(outcome, FileOutcome::Processed(_)));
}

#[test]
fn test_report_lists_written_textures() {
    let dir = TempDir::new().unwrap();
    let input_dir = dir.path().join("src");
    let output_dir = dir.path().join("out");
    fs::create_dir_all(&input_dir).unwrap();
    write_rgba_png(&input_dir.join("a.png"), 8);
    write_rgba_png(&input_dir.join("b.png"), 4);
    fs::write(input_dir.join("notes.txt"), "ignored").unwrap();

    let params = ProcessTexturesParams::new()
        .with_mip_mode(MipMode::None)
        .with_out_subdir("tex");
    let report = process_directory(&input_dir, &output_dir, params, FakeEncoder).unwrap();
    assert_eq!(report.records.len(), 2);
    assert!(output_dir.join("tex/a.tex").exists());

    let path = dir.path().join("report.json");
    report.write_records(&path).unwrap();
    let json: serde_json::Value = serde_json::from_str(&fs::read_to_string(&path).unwrap()).unwrap();
    assert_eq!(json["processed"], 2);
    assert_eq!(json["failed"], 0);
    assert_eq!(json["records"][0]["format"], "BC7_SRGB");
    assert_eq!(json["records"][0]["mip_count"], 1);
    assert_eq!(json["records"][1]["width"], 4);
}
