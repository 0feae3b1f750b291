//! The bake command: process a file or a directory tree.

use std::path::{Path, PathBuf};

use clap::Args;
use indicatif::{ProgressBar, ProgressStyle};
use texbake::compress::IspcBlockEncoder;
use texbake::config::{config_file_path, TexbakeConfig};
use texbake::logging::{default_log_dir, default_log_file, init_logging};
use texbake::pipeline::{scan_inputs, BatchReport, Pipeline};
use tracing::info;

use super::common::{
    resolve_params, AstcBlockArg, BcArg, CompressionArg, ContainerArg, MipmapArg,
};
use crate::error::CliError;

#[derive(Debug, Args)]
pub struct BakeArgs {
    /// Source image, container file, or directory of them
    pub input: PathBuf,

    /// Output directory (defaults to the input's directory)
    pub output: Option<PathBuf>,

    /// Output container
    #[arg(long, value_enum)]
    pub container: Option<ContainerArg>,

    /// Compression family
    #[arg(long, value_enum)]
    pub compression: Option<CompressionArg>,

    /// ASTC block size (default: 4x4 for 2/4 channels, 6x6 otherwise)
    #[arg(long, value_enum)]
    pub astc_block: Option<AstcBlockArg>,

    /// BC variant (default chosen from the channel count)
    #[arg(long, value_enum)]
    pub bc: Option<BcArg>,

    /// Mip generation mode
    #[arg(long, value_enum)]
    pub mipmaps: Option<MipmapArg>,

    /// Channel swizzle, four of r g b a / x y z w, i j k l (inverted), 0, 1
    #[arg(long)]
    pub swizzle: Option<String>,

    /// Treat 8/16-bit sources as linear instead of sRGB
    #[arg(long)]
    pub linear: bool,

    /// Roughness map for VMF-filtered normal map mips
    #[arg(long)]
    pub roughness: Option<PathBuf>,

    /// Reprocess files whose output is up to date
    #[arg(long)]
    pub force: bool,

    /// Only process inputs with this extension
    #[arg(long)]
    pub extension: Option<String>,

    /// Subdirectory inserted before each output file name
    #[arg(long)]
    pub out_subdir: Option<PathBuf>,

    /// Write a JSON report of the written textures
    #[arg(long)]
    pub report: Option<PathBuf>,

    /// Config file (default: ~/.texbake/config.ini)
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Directory for the log file
    #[arg(long)]
    pub log_dir: Option<PathBuf>,

    /// Only print warnings and errors
    #[arg(long, short)]
    pub quiet: bool,
}

/// Run the bake command. Returns whether any file failed.
pub fn run(args: BakeArgs) -> Result<bool, CliError> {
    let log_dir = args
        .log_dir
        .clone()
        .unwrap_or_else(|| PathBuf::from(default_log_dir()));
    let _logging_guard =
        init_logging(&log_dir, default_log_file(), args.quiet).map_err(CliError::LoggingInit)?;

    let config_path = args.config.clone().unwrap_or_else(config_file_path);
    let config = TexbakeConfig::load(&config_path)?;
    let params = resolve_params(&args, &config)?;

    if !args.input.exists() {
        return Err(CliError::InputNotFound(args.input));
    }

    let (root, inputs) = if args.input.is_dir() {
        let inputs = scan_inputs(&args.input, &params).map_err(|error| CliError::Scan {
            path: args.input.clone(),
            error,
        })?;
        (args.input.clone(), inputs)
    } else {
        let root = args.input.parent().unwrap_or(Path::new("")).to_path_buf();
        (root, vec![args.input.clone()])
    };
    let output = args.output.clone().unwrap_or_else(|| root.clone());
    info!(
        input = %args.input.display(),
        output = %output.display(),
        files = inputs.len(),
        "Baking textures"
    );

    let progress = progress_bar(inputs.len(), args.quiet);
    let pipeline = Pipeline::new(params, IspcBlockEncoder::new());
    let report = pipeline.process_batch_with(&root, &inputs, &output, |path| {
        progress.set_message(path.display().to_string());
        progress.inc(1);
    });
    progress.finish_and_clear();

    if let Some(path) = &args.report {
        report.write_records(path).map_err(CliError::Report)?;
        info!(path = %path.display(), records = report.records.len(), "Wrote report");
    }

    print_summary(&report, args.quiet);
    Ok(report.had_error())
}

fn progress_bar(len: usize, quiet: bool) -> ProgressBar {
    if quiet || len < 2 {
        return ProgressBar::hidden();
    }
    let bar = ProgressBar::new(len as u64);
    if let Ok(style) = ProgressStyle::default_bar()
        .template("[{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} {wide_msg}")
    {
        bar.set_style(style.progress_chars("=>-"));
    }
    bar
}

fn print_summary(report: &BatchReport, quiet: bool) {
    for failure in &report.failed {
        eprintln!("FAILED {}", failure);
    }
    if !quiet {
        println!(
            "{} processed, {} up to date, {} failed",
            report.processed,
            report.skipped,
            report.failed.len()
        );
    }
}
