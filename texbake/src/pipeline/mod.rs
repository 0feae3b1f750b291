//! End-to-end texture processing.
//!
//! [`Pipeline`] carries one file from source to container. The batch
//! helpers enumerate a directory, map each input to its output path and
//! fold per-file results into a [`BatchReport`].
//!
//! # Example
//!
//! ```ignore
//! use std::path::Path;
//!
//! use texbake::compress::IspcBlockEncoder;
//! use texbake::config::ProcessTexturesParams;
//! use texbake::pipeline::process_directory;
//!
//! let report = process_directory(
//!     Path::new("assets/textures"),
//!     Path::new("build/textures"),
//!     ProcessTexturesParams::default(),
//!     IspcBlockEncoder::new(),
//! )?;
//! if report.had_error() {
//!     std::process::exit(1);
//! }
//! ```

mod batch;
mod orchestrator;
mod record;

pub use batch::{
    is_supported_input, output_path_for, process_directory, scan_inputs, BatchReport,
    OUTPUT_EXTENSION,
};
pub use orchestrator::{FileOutcome, Pipeline, PipelineError, Stage};
pub use record::ProcessedTextureRecord;
