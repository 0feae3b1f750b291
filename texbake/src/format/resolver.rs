//! Chooses the load format and the target format for a source image.
//!
//! Resolution is a pure function of the request and the decoder's view of
//! the source. The result is fixed for the rest of one file's processing.

use tracing::debug;

use crate::error::{TextureError, TextureResult};

use super::codec::{BlockCodec, CompressionFamily, CompressionRequest};
use super::types::{
    AstcBlock, AstcKind, BcVariant, ColorSpace, ElementType, PixelFormat, TextureFormat,
};

/// What the decoder reports about a source image.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SourceInfo {
    pub channels: u8,
    pub element: ElementType,
    pub is_signed: bool,
}

impl SourceInfo {
    pub fn new(channels: u8, element: ElementType) -> Self {
        Self {
            channels,
            element,
            is_signed: false,
        }
    }

    pub fn is_float(&self) -> bool {
        self.element == ElementType::F32
    }

    pub fn bits_per_pixel(&self) -> u32 {
        (self.element.size() * 8) as u32 * self.channels as u32
    }
}

/// Outcome of format resolution.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResolvedFormat {
    /// Layout the decoder must produce.
    pub load: PixelFormat,
    /// Format of the written texture.
    pub target: TextureFormat,
    /// Block codec, absent when no compression was requested.
    pub codec: Option<BlockCodec>,
}

/// Default ASTC footprint for a channel count.
///
/// One- and three-channel content tolerates the larger block; two- and
/// four-channel content (normal maps, full RGBA) keeps 4×4.
pub fn default_astc_block(channels: u8) -> AstcBlock {
    match channels {
        2 | 4 => AstcBlock::B4x4,
        _ => AstcBlock::B6x6,
    }
}

/// Default BC variant for a channel count.
pub fn default_bc_variant(channels: u8, is_float: bool) -> BcVariant {
    match channels {
        1 => BcVariant::Bc4,
        2 => BcVariant::Bc5,
        3 if is_float => BcVariant::Bc6h,
        3 => BcVariant::Bc1,
        _ => BcVariant::Bc7,
    }
}

/// Resolve load and target formats.
///
/// Float (HDR) sources are always treated as linear, whatever
/// `color_space` says. An sRGB source is loaded as 8-bit RGBA.
pub fn resolve(
    request: &CompressionRequest,
    source: &SourceInfo,
    color_space: ColorSpace,
) -> TextureResult<ResolvedFormat> {
    if source.channels == 0 || source.channels > 4 {
        return Err(TextureError::UndefinedFormat(format!(
            "cannot process a source with {} channels",
            source.channels
        )));
    }

    let color_space = if source.is_float() {
        ColorSpace::Linear
    } else {
        color_space
    };
    let srgb = color_space == ColorSpace::Srgb;

    let resolved = match request.family {
        CompressionFamily::None => {
            let load = if srgb {
                PixelFormat::rgba8_srgb()
            } else {
                PixelFormat::new(source.element, source.channels, color_space)
            };
            ResolvedFormat {
                load,
                target: TextureFormat::Uncompressed(load),
                codec: None,
            }
        }
        CompressionFamily::Astc => {
            let block = request
                .astc_block
                .unwrap_or_else(|| default_astc_block(source.channels));
            let kind = if srgb {
                AstcKind::Srgb
            } else if source.is_float() {
                AstcKind::Float
            } else {
                AstcKind::Unorm
            };
            let element = if kind == AstcKind::Float {
                ElementType::F32
            } else {
                ElementType::U8
            };
            ResolvedFormat {
                load: PixelFormat::new(element, 4, color_space),
                target: TextureFormat::Astc { block, kind },
                codec: Some(BlockCodec::Astc(block)),
            }
        }
        CompressionFamily::Bc => {
            let variant = request
                .bc_variant
                .unwrap_or_else(|| default_bc_variant(source.channels, source.is_float()));

            if variant == BcVariant::Bc6h && !(source.is_float() || source.bits_per_pixel() == 64)
            {
                return Err(TextureError::UnknownCompression(format!(
                    "BC6H needs a float or 64 bpp source, got {} bpp {:?}",
                    source.bits_per_pixel(),
                    source.element
                )));
            }

            let element = if variant == BcVariant::Bc6h {
                ElementType::F32
            } else {
                ElementType::U8
            };
            let channels = if srgb {
                4
            } else {
                source.channels.max(variant.required_channels())
            };
            ResolvedFormat {
                load: PixelFormat::new(element, channels, color_space),
                target: TextureFormat::bc(variant, srgb, source.is_signed),
                codec: Some(BlockCodec::Bc(variant)),
            }
        }
    };

    debug!(
        channels = source.channels,
        element = ?source.element,
        target = %resolved.target,
        "Resolved texture format"
    );
    Ok(resolved)
}
