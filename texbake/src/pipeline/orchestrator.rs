//! Per-file processing.
//!
//! One input moves through
//! `Scan → Load → (VmfSynthesis) → Mipmap → Swizzle → Compress → Write`
//! and ends either done or failed. A failure removes any partially written
//! output and is reported as a [`PipelineError`] naming the stage; it never
//! affects other files.

use std::fmt;
use std::fs::{self, File};
use std::io::BufWriter;
use std::path::{Path, PathBuf};
use std::time::SystemTime;

use tracing::{debug, error, info, warn};

use crate::compress::{BlockCompressor, BlockEncoder};
use crate::config::ProcessTexturesParams;
use crate::container::{read_container, Container, ContainerWriter};
use crate::error::{ErrorKind, TextureError, TextureResult};
use crate::format::{
    resolve, BcVariant, ColorSpace, CompressionFamily, CompressionRequest, PixelFormat,
    ResolvedFormat, TextureFormat,
};
use crate::mipmap::{build_vmf_layer, BoxMipGenerator, MipGenerator, MipMode, VmfMipGenerator};
use crate::swizzle::swizzle;
use crate::texture::{decode_file, PixelBuffer, Texture, TexturePayload};

use super::record::ProcessedTextureRecord;

/// Processing stages, in order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Stage {
    Scan,
    Load,
    VmfSynthesis,
    Mipmap,
    Swizzle,
    Compress,
    Write,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Stage::Scan => "scan",
            Stage::Load => "load",
            Stage::VmfSynthesis => "vmf synthesis",
            Stage::Mipmap => "mipmap",
            Stage::Swizzle => "swizzle",
            Stage::Compress => "compress",
            Stage::Write => "write",
        };
        f.write_str(name)
    }
}

/// A file that failed, with the stage it failed in.
#[derive(Debug)]
pub struct PipelineError {
    pub path: PathBuf,
    pub stage: Stage,
    pub source: TextureError,
}

impl PipelineError {
    pub fn kind(&self) -> ErrorKind {
        self.source.kind()
    }
}

impl fmt::Display for PipelineError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}: {} failed: {}",
            self.path.display(),
            self.stage,
            self.source
        )
    }
}

impl std::error::Error for PipelineError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        Some(&self.source)
    }
}

/// How a file that did not fail ended.
#[derive(Debug, Clone, PartialEq)]
pub enum FileOutcome {
    /// Output written.
    Processed(ProcessedTextureRecord),
    /// Output already up to date.
    Skipped,
}

type StageResult<T> = Result<T, (Stage, TextureError)>;

fn at(stage: Stage) -> impl FnOnce(TextureError) -> (Stage, TextureError) {
    move |e| (stage, e)
}

fn modified(path: &Path) -> Option<SystemTime> {
    fs::metadata(path).and_then(|m| m.modified()).ok()
}

fn is_container_path(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .and_then(Container::from_extension)
        .is_some()
}

/// Drives single files through every stage.
pub struct Pipeline<E> {
    params: ProcessTexturesParams,
    compressor: BlockCompressor<E>,
    writer: Box<dyn ContainerWriter>,
}

impl<E: BlockEncoder> Pipeline<E> {
    /// Pipeline writing the container selected in `params`.
    pub fn new(params: ProcessTexturesParams, encoder: E) -> Self {
        let writer = params.container.writer();
        Self {
            params,
            compressor: BlockCompressor::new(encoder),
            writer,
        }
    }

    /// Replace the container writer, e.g. one with extra options.
    pub fn with_writer(mut self, writer: Box<dyn ContainerWriter>) -> Self {
        self.writer = writer;
        self
    }

    pub fn params(&self) -> &ProcessTexturesParams {
        &self.params
    }

    /// Process `input` into `output`.
    ///
    /// On failure any partial or stale output at `output` is removed.
    pub fn process_file(&self, input: &Path, output: &Path) -> Result<FileOutcome, PipelineError> {
        if self.is_up_to_date(input, output) {
            debug!(path = %input.display(), "Output up to date, skipping");
            return Ok(FileOutcome::Skipped);
        }

        info!(path = %input.display(), output = %output.display(), "Processing texture");
        match self.run(input, output) {
            Ok(texture) => {
                let desc = &texture.desc;
                info!(
                    path = %output.display(),
                    width = desc.width,
                    height = desc.height,
                    mips = desc.mip_count,
                    format = %desc.format,
                    "Texture written"
                );
                Ok(FileOutcome::Processed(ProcessedTextureRecord::new(
                    output, desc,
                )))
            }
            Err((stage, source)) => {
                remove_output(output);
                error!(path = %input.display(), %stage, error = %source, "Texture failed");
                Err(PipelineError {
                    path: input.to_path_buf(),
                    stage,
                    source,
                })
            }
        }
    }

    /// Whether `output` is strictly newer than `input` and the extra
    /// timestamp from the parameters. Equal timestamps count as stale.
    pub fn is_up_to_date(&self, input: &Path, output: &Path) -> bool {
        if self.params.force {
            return false;
        }
        let (Some(out_time), Some(in_time)) = (modified(output), modified(input)) else {
            return false;
        };
        let newest = match self.params.additional_modified_time {
            Some(extra) => in_time.max(extra),
            None => in_time,
        };
        out_time > newest
    }

    fn run(&self, input: &Path, output: &Path) -> StageResult<Texture> {
        let (mut texture, resolved) = self.load(input).map_err(at(Stage::Load))?;

        let vmf = match &self.params.roughness_path {
            Some(roughness) => Some(
                self.synthesize_vmf(&texture, roughness)
                    .map_err(at(Stage::VmfSynthesis))?,
            ),
            None => None,
        };

        self.generate_mips(&mut texture, vmf)
            .map_err(at(Stage::Mipmap))?;

        if let Some(spec) = &self.params.swizzle {
            swizzle(&mut texture, spec).map_err(at(Stage::Swizzle))?;
        }

        if let Some(ResolvedFormat {
            codec: Some(codec),
            target,
            ..
        }) = resolved
        {
            if !texture.is_compressed() {
                self.compressor
                    .compress(&mut texture, codec, target)
                    .map_err(at(Stage::Compress))?;
            }
        }

        self.write(&texture, output).map_err(at(Stage::Write))?;
        Ok(texture)
    }

    /// Compression request after applying the VMF default.
    fn effective_request(&self) -> CompressionRequest {
        let mut request = self.params.compression;
        if self.params.roughness_path.is_some()
            && request.family == CompressionFamily::Bc
            && request.bc_variant.is_none()
        {
            request.bc_variant = Some(BcVariant::Bc5);
        }
        request
    }

    /// Load the input. Container files are read as-is and carry no
    /// resolved format; images are decoded into their load layout.
    fn load(&self, input: &Path) -> TextureResult<(Texture, Option<ResolvedFormat>)> {
        if is_container_path(input) {
            let texture = read_container(input)?;
            debug!(path = %input.display(), format = %texture.desc.format, "Read container input");
            return Ok((texture, None));
        }

        let decoded = decode_file(input)?;
        let resolved = self.fit_container(resolve(
            &self.effective_request(),
            decoded.info(),
            self.params.color_space,
        )?);
        debug!(
            load = %TextureFormat::Uncompressed(resolved.load),
            target = %resolved.target,
            "Resolved formats"
        );
        let texture = decoded.into_texture(&resolved.load)?;
        Ok((texture, Some(resolved)))
    }

    /// Widen uncompressed three-channel layouts the output container has no
    /// format code for to four channels.
    fn fit_container(&self, mut resolved: ResolvedFormat) -> ResolvedFormat {
        let container = self.params.container;
        if resolved.codec.is_none()
            && resolved.load.channels == 3
            && !container.supports(&resolved.target)
        {
            resolved.load.channels = 4;
            resolved.target = TextureFormat::Uncompressed(resolved.load);
            debug!(%container, format = %resolved.target, "Widened RGB to RGBA for container");
        }
        resolved
    }

    fn synthesize_vmf(&self, texture: &Texture, roughness_path: &Path) -> TextureResult<VmfMipGenerator> {
        let normal = texture.pixels()?.first().ok_or_else(|| {
            TextureError::UnsupportedOperation("texture has no base level".to_string())
        })?;
        let roughness = load_roughness(roughness_path)?;
        let layer = build_vmf_layer(normal, &roughness)?;
        debug!(
            width = layer.width(),
            height = layer.height(),
            roughness = %roughness_path.display(),
            "Built VMF layer"
        );
        Ok(VmfMipGenerator::new(layer))
    }

    fn generate_mips(&self, texture: &mut Texture, vmf: Option<VmfMipGenerator>) -> TextureResult<()> {
        if texture.is_compressed() || texture.desc.mip_count > 1 {
            return Ok(());
        }
        let generator: Box<dyn MipGenerator> = match (self.params.mip_mode, vmf) {
            (MipMode::None, _) => return Ok(()),
            (_, Some(vmf)) => Box::new(vmf),
            (MipMode::Vmf, None) => {
                warn!("VMF mips requested without a roughness map, using box filter");
                Box::new(BoxMipGenerator::new())
            }
            (MipMode::Default, None) => Box::new(BoxMipGenerator::new()),
        };

        if let TexturePayload::Pixels(levels) = &mut texture.payload {
            if let Some(base) = levels.pop() {
                *levels = generator.generate(&mut texture.desc, base)?;
                debug!(
                    generator = generator.name(),
                    mips = texture.desc.mip_count,
                    "Generated mip chain"
                );
            }
        }
        Ok(())
    }

    fn write(&self, texture: &Texture, output: &Path) -> TextureResult<()> {
        if output.exists() {
            fs::remove_file(output).map_err(|e| TextureError::io(output, e))?;
        }
        if let Some(parent) = output.parent() {
            fs::create_dir_all(parent).map_err(|e| TextureError::io(parent, e))?;
        }
        let file = File::create(output).map_err(|e| TextureError::io(output, e))?;
        let mut stream = BufWriter::new(file);
        self.writer
            .write(&mut stream, &texture.desc, &texture.level_bytes())
            .map_err(|e| match e {
                TextureError::Io { path: None, source } => TextureError::io(output, source),
                other => other,
            })
    }
}

/// Roughness is read from its first channel in linear space.
fn load_roughness(path: &Path) -> TextureResult<PixelBuffer> {
    let decoded = decode_file(path)?;
    let info = *decoded.info();
    decoded.into_pixels(&PixelFormat::new(info.element, info.channels, ColorSpace::Linear))
}

fn remove_output(output: &Path) {
    if output.exists() {
        if let Err(e) = fs::remove_file(output) {
            warn!(path = %output.display(), error = %e, "Failed to remove partial output");
        }
    }
}
