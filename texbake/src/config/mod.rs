//! Run parameters and the user configuration file.

pub mod file;
mod params;

pub use file::{config_file_path, ConfigFileError, TexbakeConfig};
pub use params::ProcessTexturesParams;
