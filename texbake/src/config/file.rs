//! Configuration file handling for ~/.texbake/config.ini.
//!
//! Only the `[texture]` section is read. Every key is optional; unset keys
//! fall back to the built-in defaults of [`ProcessTexturesParams`].
//!
//! ```ini
//! [texture]
//! container = ktx
//! compression = astc
//! astc_block = 6x6
//! mipmaps = default
//! swizzle = rgb1
//! color_space = linear
//! ```

use std::fmt::Display;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use ini::{Ini, Properties};
use thiserror::Error;
use tracing::debug;

use super::params::ProcessTexturesParams;
use crate::container::Container;
use crate::format::{AstcBlock, BcVariant, ColorSpace, CompressionFamily, CompressionRequest};
use crate::mipmap::MipMode;
use crate::swizzle::ChannelSwizzle;

const TEXTURE_SECTION: &str = "texture";

/// Configuration file errors.
#[derive(Debug, Error)]
pub enum ConfigFileError {
    /// Failed to read config file
    #[error("Failed to read config file: {0}")]
    ReadError(#[from] ini::Error),

    /// Invalid configuration value
    #[error("Invalid configuration: {section}.{key} = '{value}' - {reason}")]
    InvalidValue {
        section: String,
        key: String,
        value: String,
        reason: String,
    },
}

/// Values read from the `[texture]` section.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TexbakeConfig {
    pub container: Option<Container>,
    pub compression: Option<CompressionFamily>,
    pub astc_block: Option<AstcBlock>,
    pub bc_variant: Option<BcVariant>,
    pub mipmaps: Option<MipMode>,
    pub swizzle: Option<ChannelSwizzle>,
    pub color_space: Option<ColorSpace>,
    pub force: Option<bool>,
    pub out_subdir: Option<PathBuf>,
    pub extension: Option<String>,
}

impl TexbakeConfig {
    /// Load configuration from a specific path.
    ///
    /// If the file doesn't exist, returns an empty configuration.
    pub fn load(path: &Path) -> Result<Self, ConfigFileError> {
        if !path.exists() {
            debug!(path = %path.display(), "No config file, using defaults");
            return Ok(Self::default());
        }
        let ini = Ini::load_from_file(path)?;
        parse_ini(&ini)
    }

    /// Load configuration from the default path (~/.texbake/config.ini).
    pub fn load_default() -> Result<Self, ConfigFileError> {
        Self::load(&config_file_path())
    }

    /// Parameters with every configured value applied over the defaults.
    pub fn to_params(&self) -> ProcessTexturesParams {
        let mut params = ProcessTexturesParams::default();
        if let Some(container) = self.container {
            params.container = container;
        }
        let mut compression = match self.compression {
            Some(family) => CompressionRequest {
                family,
                ..Default::default()
            },
            None => params.compression,
        };
        compression.astc_block = self.astc_block;
        compression.bc_variant = self.bc_variant;
        params.compression = compression;
        if let Some(mode) = self.mipmaps {
            params.mip_mode = mode;
        }
        params.swizzle = self.swizzle;
        if let Some(color_space) = self.color_space {
            params.color_space = color_space;
        }
        if let Some(force) = self.force {
            params.force = force;
        }
        params.out_subdir = self.out_subdir.clone();
        if let Some(ext) = &self.extension {
            params = params.with_input_extension(ext.as_str());
        }
        params
    }
}

fn invalid(key: &str, value: &str, reason: impl Display) -> ConfigFileError {
    ConfigFileError::InvalidValue {
        section: TEXTURE_SECTION.to_string(),
        key: key.to_string(),
        value: value.to_string(),
        reason: reason.to_string(),
    }
}

/// Parse `key` with its `FromStr`, treating blank values as unset.
fn parse_key<T>(section: &Properties, key: &str) -> Result<Option<T>, ConfigFileError>
where
    T: FromStr,
    T::Err: Display,
{
    match section.get(key).map(str::trim) {
        None | Some("") => Ok(None),
        Some(v) => v.parse().map(Some).map_err(|e| invalid(key, v, e)),
    }
}

fn parse_color_space(section: &Properties) -> Result<Option<ColorSpace>, ConfigFileError> {
    match section.get("color_space").map(str::trim) {
        None | Some("") => Ok(None),
        Some(v) => match v.to_ascii_lowercase().as_str() {
            "srgb" => Ok(Some(ColorSpace::Srgb)),
            "linear" => Ok(Some(ColorSpace::Linear)),
            _ => Err(invalid("color_space", v, "must be 'srgb' or 'linear'")),
        },
    }
}

fn parse_bool(section: &Properties, key: &str) -> Result<Option<bool>, ConfigFileError> {
    match section.get(key).map(str::trim) {
        None | Some("") => Ok(None),
        Some(v) => match v.to_ascii_lowercase().as_str() {
            "true" | "yes" | "1" | "on" => Ok(Some(true)),
            "false" | "no" | "0" | "off" => Ok(Some(false)),
            _ => Err(invalid(key, v, "must be true or false")),
        },
    }
}

fn parse_ini(ini: &Ini) -> Result<TexbakeConfig, ConfigFileError> {
    let mut config = TexbakeConfig::default();
    let Some(section) = ini.section(Some(TEXTURE_SECTION)) else {
        return Ok(config);
    };

    config.container = parse_key(section, "container")?;
    config.compression = parse_key(section, "compression")?;
    config.astc_block = parse_key(section, "astc_block")?;
    config.bc_variant = parse_key(section, "bc_variant")?;
    config.mipmaps = parse_key(section, "mipmaps")?;
    config.swizzle = parse_key(section, "swizzle")?;
    config.color_space = parse_color_space(section)?;
    config.force = parse_bool(section, "force")?;
    config.out_subdir = parse_key::<String>(section, "out_subdir")?.map(PathBuf::from);
    config.extension = parse_key(section, "extension")?;
    Ok(config)
}

/// Get the path to the config directory (~/.texbake).
pub fn config_directory() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".texbake")
}

/// Get the path to the config file (~/.texbake/config.ini).
pub fn config_file_path() -> PathBuf {
    config_directory().join("config.ini")
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn load_str(contents: &str) -> Result<TexbakeConfig, ConfigFileError> {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("config.ini");
        std::fs::write(&path, contents).unwrap();
        TexbakeConfig::load(&path)
    }

    #[test]
    fn test_load_nonexistent_returns_defaults() {
        let temp_dir = TempDir::new().unwrap();
        let config = TexbakeConfig::load(&temp_dir.path().join("missing.ini")).unwrap();
        assert_eq!(config, TexbakeConfig::default());
        assert_eq!(config.to_params(), ProcessTexturesParams::default());
    }

    #[test]
    fn test_texture_section() {
        let config = load_str(
            r#"
[texture]
container = ktx
compression = astc
astc_block = 8x8
mipmaps = none
swizzle = rgb1
color_space = linear
force = yes
out_subdir = baked
extension = .png
"#,
        )
        .unwrap();

        assert_eq!(config.container, Some(Container::Ktx));
        assert_eq!(config.compression, Some(CompressionFamily::Astc));
        assert_eq!(config.astc_block, Some(AstcBlock::B8x8));
        assert_eq!(config.mipmaps, Some(MipMode::None));
        assert_eq!(config.force, Some(true));

        let params = config.to_params();
        assert_eq!(params.container, Container::Ktx);
        assert_eq!(params.compression.family, CompressionFamily::Astc);
        assert_eq!(params.compression.astc_block, Some(AstcBlock::B8x8));
        assert_eq!(params.mip_mode, MipMode::None);
        assert_eq!(params.swizzle.map(|s| s.to_string()).as_deref(), Some("rgb1"));
        assert_eq!(params.color_space, ColorSpace::Linear);
        assert!(params.force);
        assert_eq!(params.out_subdir, Some(PathBuf::from("baked")));
        assert_eq!(params.input_extension.as_deref(), Some("png"));
    }

    #[test]
    fn test_blank_values_are_unset() {
        let config = load_str("[texture]\nbc_variant =\nswizzle = \n").unwrap();
        assert_eq!(config.bc_variant, None);
        assert_eq!(config.swizzle, None);
    }

    #[test]
    fn test_other_sections_ignored() {
        let config = load_str("[logging]\nlevel = debug\n").unwrap();
        assert_eq!(config, TexbakeConfig::default());
    }

    #[test]
    fn test_invalid_value_reports_key() {
        let err = load_str("[texture]\nbc_variant = bc9\n").unwrap_err();
        match err {
            ConfigFileError::InvalidValue { section, key, value, .. } => {
                assert_eq!(section, "texture");
                assert_eq!(key, "bc_variant");
                assert_eq!(value, "bc9");
            }
            other => panic!("unexpected error: {}", other),
        }
    }

    #[test]
    fn test_invalid_color_space() {
        let err = load_str("[texture]\ncolor_space = p3\n").unwrap_err();
        assert!(err.to_string().contains("color_space"));
    }

    #[test]
    fn test_config_file_path() {
        let path = config_file_path();
        assert!(path.ends_with(".texbake/config.ini"));
    }
}
