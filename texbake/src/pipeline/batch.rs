//! Directory batches.
//!
//! Files are processed one at a time in sorted path order. A failed file is
//! recorded in the [`BatchReport`] and the batch moves on.

use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use serde::Serialize;
use tracing::{debug, info, warn};

use crate::compress::BlockEncoder;
use crate::config::ProcessTexturesParams;
use crate::container::Container;
use crate::error::{TextureError, TextureResult};
use crate::texture::is_image_extension;

use super::orchestrator::{FileOutcome, Pipeline, PipelineError, Stage};
use super::record::ProcessedTextureRecord;

/// Extension of written textures.
pub const OUTPUT_EXTENSION: &str = "tex";

/// Whether `path` is something the pipeline can take as input.
pub fn is_supported_input(path: &Path, extension: Option<&str>) -> bool {
    let Some(ext) = path.extension().and_then(|e| e.to_str()) else {
        return false;
    };
    match extension {
        Some(wanted) => ext.eq_ignore_ascii_case(wanted),
        None => Container::from_extension(ext).is_some() || is_image_extension(ext),
    }
}

/// Every input file under `input_dir`, sorted.
///
/// Only files with `params.input_extension` are taken when it is set. The
/// roughness map named in `params` is never an input of its own.
pub fn scan_inputs(
    input_dir: &Path,
    params: &ProcessTexturesParams,
) -> TextureResult<Vec<PathBuf>> {
    let extension = params.input_extension.as_deref();
    let root = input_dir.to_str().ok_or_else(|| {
        TextureError::UnsupportedOperation(format!(
            "input directory {} is not valid UTF-8",
            input_dir.display()
        ))
    })?;
    let pattern = format!(
        "{}/**/*.{}",
        glob::Pattern::escape(root.trim_end_matches('/')),
        extension.map_or_else(|| "*".to_string(), glob::Pattern::escape)
    );

    let entries = glob::glob(&pattern)
        .map_err(|e| TextureError::UnsupportedOperation(format!("bad input pattern: {}", e)))?;

    let roughness = params.roughness_path.as_deref().map(canonical);
    let mut inputs = Vec::new();
    for entry in entries {
        match entry {
            Ok(path) if path.is_file() && is_supported_input(&path, extension) => {
                if roughness.as_ref() == Some(&canonical(&path)) {
                    debug!(path = %path.display(), "Skipping roughness map");
                    continue;
                }
                inputs.push(path)
            }
            Ok(_) => {}
            Err(e) => warn!(error = %e, "Skipping unreadable path"),
        }
    }
    inputs.sort();
    Ok(inputs)
}

fn canonical(path: &Path) -> PathBuf {
    fs::canonicalize(path).unwrap_or_else(|_| path.to_path_buf())
}

/// Output path for `input`, mirroring its location under `input_root`.
///
/// `textures/stone/albedo.png` under root `textures` becomes
/// `<output_root>/stone/[<out_subdir>/]albedo.tex`.
pub fn output_path_for(
    input_root: &Path,
    input: &Path,
    output_root: &Path,
    out_subdir: Option<&Path>,
) -> PathBuf {
    let relative = input.strip_prefix(input_root).unwrap_or(input);
    let mut path = output_root.to_path_buf();
    if let Some(parent) = relative.parent() {
        if !parent.as_os_str().is_empty() && !parent.is_absolute() {
            path.push(parent);
        }
    }
    if let Some(subdir) = out_subdir {
        path.push(subdir);
    }
    let mut name = relative
        .file_stem()
        .unwrap_or(relative.as_os_str())
        .to_os_string();
    name.push(".");
    name.push(OUTPUT_EXTENSION);
    path.push(name);
    path
}

/// Outcome of a batch.
#[derive(Debug, Default)]
pub struct BatchReport {
    pub processed: usize,
    pub skipped: usize,
    pub failed: Vec<PipelineError>,
    pub records: Vec<ProcessedTextureRecord>,
}

impl BatchReport {
    /// Whether any file failed.
    pub fn had_error(&self) -> bool {
        !self.failed.is_empty()
    }

    /// Write the records as pretty JSON.
    pub fn write_records(&self, path: &Path) -> TextureResult<()> {
        #[derive(Serialize)]
        struct Report<'a> {
            processed: usize,
            skipped: usize,
            failed: usize,
            records: &'a [ProcessedTextureRecord],
        }

        let file = File::create(path).map_err(|e| TextureError::io(path, e))?;
        let mut writer = BufWriter::new(file);
        let report = Report {
            processed: self.processed,
            skipped: self.skipped,
            failed: self.failed.len(),
            records: &self.records,
        };
        serde_json::to_writer_pretty(&mut writer, &report)
            .map_err(|e| TextureError::io(path, e.into()))?;
        writer.flush().map_err(|e| TextureError::io(path, e))
    }
}

impl<E: BlockEncoder> Pipeline<E> {
    /// Process `inputs` in order, mirroring paths under `input_root` into
    /// `output_root`.
    pub fn process_batch(&self, input_root: &Path, inputs: &[PathBuf], output_root: &Path) -> BatchReport {
        self.process_batch_with(input_root, inputs, output_root, |_| {})
    }

    /// [`process_batch`](Self::process_batch), calling `on_file` after each
    /// input finishes.
    pub fn process_batch_with<F>(
        &self,
        input_root: &Path,
        inputs: &[PathBuf],
        output_root: &Path,
        mut on_file: F,
    ) -> BatchReport
    where
        F: FnMut(&Path),
    {
        let mut report = BatchReport::default();
        let out_subdir = self.params().out_subdir.as_deref();

        for input in inputs {
            let output = output_path_for(input_root, input, output_root, out_subdir);
            match self.process_file(input, &output) {
                Ok(FileOutcome::Processed(record)) => {
                    report.processed += 1;
                    if self.params().record_output {
                        report.records.push(record);
                    }
                }
                Ok(FileOutcome::Skipped) => report.skipped += 1,
                Err(e) => report.failed.push(e),
            }
            on_file(input);
        }

        info!(
            processed = report.processed,
            skipped = report.skipped,
            failed = report.failed.len(),
            "Batch complete"
        );
        report
    }
}

/// Process every supported file under `input_dir` into `output_dir`.
///
/// Only a failure to enumerate the directory is returned as an error;
/// per-file failures are collected in the report.
pub fn process_directory<E: BlockEncoder>(
    input_dir: &Path,
    output_dir: &Path,
    params: ProcessTexturesParams,
    encoder: E,
) -> Result<BatchReport, PipelineError> {
    let inputs = scan_inputs(input_dir, &params).map_err(|source| {
        PipelineError {
            path: input_dir.to_path_buf(),
            stage: Stage::Scan,
            source,
        }
    })?;
    info!(
        path = %input_dir.display(),
        files = inputs.len(),
        "Scanned input directory"
    );
    let pipeline = Pipeline::new(params, encoder);
    Ok(pipeline.process_batch(input_dir, &inputs, output_dir))
}
