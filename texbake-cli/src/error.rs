//! CLI error handling with user-friendly messages.
//!
//! Centralizes error handling for the CLI, providing consistent formatting
//! and appropriate exit codes.

use std::fmt;
use std::path::PathBuf;
use std::process;

use texbake::config::ConfigFileError;
use texbake::TextureError;

/// CLI-specific errors with user-friendly messages.
#[derive(Debug)]
pub enum CliError {
    /// Failed to initialize logging
    LoggingInit(std::io::Error),
    /// Configuration file could not be read or holds an invalid value
    Config(ConfigFileError),
    /// A flag value could not be parsed
    InvalidArgument { flag: &'static str, error: TextureError },
    /// Input path does not exist
    InputNotFound(PathBuf),
    /// Input directory could not be enumerated
    Scan { path: PathBuf, error: TextureError },
    /// Failed to write the JSON report
    Report(TextureError),
}

impl CliError {
    /// Exit the process with an appropriate error message and code.
    pub fn exit(&self) -> ! {
        eprintln!("Error: {}", self);

        if let CliError::Config(_) = self {
            eprintln!();
            eprintln!("Check the [texture] section of your config file, or pass");
            eprintln!("--config to point at a different one.");
        }

        process::exit(1)
    }
}

impl fmt::Display for CliError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CliError::LoggingInit(e) => write!(f, "Failed to initialize logging: {}", e),
            CliError::Config(e) => write!(f, "Configuration error: {}", e),
            CliError::InvalidArgument { flag, error } => {
                write!(f, "Invalid value for {}: {}", flag, error)
            }
            CliError::InputNotFound(path) => {
                write!(f, "Input '{}' does not exist", path.display())
            }
            CliError::Scan { path, error } => {
                write!(f, "Failed to scan '{}': {}", path.display(), error)
            }
            CliError::Report(e) => write!(f, "Failed to write report: {}", e),
        }
    }
}

impl std::error::Error for CliError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            CliError::LoggingInit(e) => Some(e),
            CliError::Config(e) => Some(e),
            CliError::InvalidArgument { error, .. } => Some(error),
            CliError::Scan { error, .. } => Some(error),
            CliError::Report(e) => Some(e),
            CliError::InputNotFound(_) => None,
        }
    }
}

impl From<ConfigFileError> for CliError {
    fn from(e: ConfigFileError) -> Self {
        CliError::Config(e)
    }
}
