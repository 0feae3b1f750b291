//! Argument value types and parameter resolution.

use clap::ValueEnum;
use texbake::config::{ProcessTexturesParams, TexbakeConfig};
use texbake::container::Container;
use texbake::format::{AstcBlock, BcVariant, ColorSpace, CompressionFamily};
use texbake::mipmap::MipMode;
use texbake::swizzle::ChannelSwizzle;

use super::bake::BakeArgs;
use crate::error::CliError;

/// Output container selection.
#[derive(Debug, Clone, Copy, ValueEnum, PartialEq)]
pub enum ContainerArg {
    /// Khronos KTX 1.1
    Ktx,
    /// DirectDraw Surface with DX10 header
    Dds,
}

impl From<ContainerArg> for Container {
    fn from(arg: ContainerArg) -> Self {
        match arg {
            ContainerArg::Ktx => Container::Ktx,
            ContainerArg::Dds => Container::Dds,
        }
    }
}

/// Compression family selection.
#[derive(Debug, Clone, Copy, ValueEnum, PartialEq)]
pub enum CompressionArg {
    /// Keep pixels uncompressed
    None,
    /// ASTC blocks (mobile)
    Astc,
    /// BC1-7 blocks (desktop)
    Bc,
}

impl From<CompressionArg> for CompressionFamily {
    fn from(arg: CompressionArg) -> Self {
        match arg {
            CompressionArg::None => CompressionFamily::None,
            CompressionArg::Astc => CompressionFamily::Astc,
            CompressionArg::Bc => CompressionFamily::Bc,
        }
    }
}

/// ASTC block footprint.
#[derive(Debug, Clone, Copy, ValueEnum, PartialEq)]
pub enum AstcBlockArg {
    #[value(name = "4x4")]
    B4x4,
    #[value(name = "5x5")]
    B5x5,
    #[value(name = "6x6")]
    B6x6,
    #[value(name = "8x8")]
    B8x8,
}

impl From<AstcBlockArg> for AstcBlock {
    fn from(arg: AstcBlockArg) -> Self {
        match arg {
            AstcBlockArg::B4x4 => AstcBlock::B4x4,
            AstcBlockArg::B5x5 => AstcBlock::B5x5,
            AstcBlockArg::B6x6 => AstcBlock::B6x6,
            AstcBlockArg::B8x8 => AstcBlock::B8x8,
        }
    }
}

/// BC variant override.
#[derive(Debug, Clone, Copy, ValueEnum, PartialEq)]
pub enum BcArg {
    /// RGB, 1-bit alpha (8 bytes/block)
    Bc1,
    /// RGBA with interpolated alpha
    Bc3,
    /// Single channel (8 bytes/block)
    Bc4,
    /// Two channels, e.g. normal XY
    Bc5,
    /// HDR RGB; needs a float or 16-bit RGBA source
    Bc6h,
    /// High quality RGB(A)
    Bc7,
}

impl From<BcArg> for BcVariant {
    fn from(arg: BcArg) -> Self {
        match arg {
            BcArg::Bc1 => BcVariant::Bc1,
            BcArg::Bc3 => BcVariant::Bc3,
            BcArg::Bc4 => BcVariant::Bc4,
            BcArg::Bc5 => BcVariant::Bc5,
            BcArg::Bc6h => BcVariant::Bc6h,
            BcArg::Bc7 => BcVariant::Bc7,
        }
    }
}

/// Mip generation mode.
#[derive(Debug, Clone, Copy, ValueEnum, PartialEq)]
pub enum MipmapArg {
    /// Box filter down to 1x1
    Default,
    /// Base level only
    None,
    /// VMF-filtered normal/roughness chain (needs --roughness)
    Vmf,
}

impl From<MipmapArg> for MipMode {
    fn from(arg: MipmapArg) -> Self {
        match arg {
            MipmapArg::Default => MipMode::Default,
            MipmapArg::None => MipMode::None,
            MipmapArg::Vmf => MipMode::Vmf,
        }
    }
}

/// Build run parameters. CLI flags take precedence, then the config file,
/// then built-in defaults.
pub fn resolve_params(
    args: &BakeArgs,
    config: &TexbakeConfig,
) -> Result<ProcessTexturesParams, CliError> {
    let mut params = config.to_params();

    if let Some(container) = args.container {
        params.container = container.into();
    }
    if let Some(compression) = args.compression {
        params.compression.family = compression.into();
    }
    if let Some(block) = args.astc_block {
        params.compression.astc_block = Some(block.into());
    }
    if let Some(variant) = args.bc {
        params.compression.bc_variant = Some(variant.into());
    }
    if let Some(swizzle) = &args.swizzle {
        let swizzle: ChannelSwizzle = swizzle
            .parse()
            .map_err(|error| CliError::InvalidArgument {
                flag: "--swizzle",
                error,
            })?;
        params.swizzle = Some(swizzle);
    }
    if args.linear {
        params.color_space = ColorSpace::Linear;
    }
    if let Some(roughness) = &args.roughness {
        params = params.with_roughness_path(roughness);
    }
    // An explicit --mipmaps wins even over the VMF default of --roughness.
    if let Some(mode) = args.mipmaps {
        params.mip_mode = mode.into();
    }
    if args.force {
        params.force = true;
    }
    if let Some(ext) = &args.extension {
        params = params.with_input_extension(ext.as_str());
    }
    if let Some(subdir) = &args.out_subdir {
        params.out_subdir = Some(subdir.clone());
    }
    params.record_output = args.report.is_some();

    Ok(params)
}
