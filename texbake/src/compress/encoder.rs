//! Block encoder seam.
//!
//! The compressor hands block-aligned surfaces to a [`BlockEncoder`]. The
//! production implementation wraps the ISPC kernels from `intel_tex_2`;
//! tests substitute a deterministic encoder.

use std::sync::Arc;

use intel_tex_2::{astc, bc1, bc3, bc4, bc5, bc6h, bc7, RSurface, RgSurface, RgbaSurface};

use crate::error::{TextureError, TextureResult};
use crate::format::{BcVariant, BlockCodec};

/// A block-aligned slice ready for encoding.
///
/// Pixel layout depends on the codec: one byte per texel for BC4, two for
/// BC5, RGBA half floats for BC6H and RGBA8 for everything else.
#[derive(Debug, Clone, Copy)]
pub struct EncodeSurface<'a> {
    pub data: &'a [u8],
    pub width: u32,
    pub height: u32,
    /// Bytes per row.
    pub stride: u32,
}

/// Bytes per texel the encoder expects for `codec`.
pub fn surface_bytes_per_pixel(codec: BlockCodec) -> usize {
    match codec {
        BlockCodec::Bc(BcVariant::Bc4) => 1,
        BlockCodec::Bc(BcVariant::Bc5) => 2,
        BlockCodec::Bc(BcVariant::Bc6h) => 8,
        BlockCodec::Bc(_) | BlockCodec::Astc(_) => 4,
    }
}

/// Encodes one surface into blocks.
pub trait BlockEncoder: Send + Sync {
    /// Encode `surface`, whose dimensions are multiples of the codec's
    /// block footprint. `has_alpha` selects alpha-aware encoder profiles.
    fn encode(
        &self,
        codec: BlockCodec,
        surface: &EncodeSurface<'_>,
        has_alpha: bool,
    ) -> TextureResult<Vec<u8>>;

    /// Human-readable name of this encoder.
    fn name(&self) -> &str;
}

impl<T: BlockEncoder + ?Sized> BlockEncoder for Arc<T> {
    fn encode(
        &self,
        codec: BlockCodec,
        surface: &EncodeSurface<'_>,
        has_alpha: bool,
    ) -> TextureResult<Vec<u8>> {
        (**self).encode(codec, surface, has_alpha)
    }

    fn name(&self) -> &str {
        (**self).name()
    }
}

/// Check block alignment and data length of a surface.
pub fn validate_surface(codec: BlockCodec, surface: &EncodeSurface<'_>) -> TextureResult<()> {
    let (bw, bh) = codec.block_dims();
    if surface.width == 0
        || surface.height == 0
        || surface.width % bw != 0
        || surface.height % bh != 0
    {
        return Err(TextureError::UnsupportedOperation(format!(
            "surface {}×{} is not aligned to {}×{} blocks",
            surface.width, surface.height, bw, bh
        )));
    }
    let row = surface.width as usize * surface_bytes_per_pixel(codec);
    let needed = surface.stride as usize * (surface.height as usize - 1) + row;
    if (surface.stride as usize) < row || surface.data.len() < needed {
        return Err(TextureError::UnsupportedOperation(format!(
            "surface data holds {} bytes, {} needed",
            surface.data.len(),
            needed
        )));
    }
    Ok(())
}

/// ISPC texture compressor, fast profiles.
#[derive(Debug, Clone, Copy, Default)]
pub struct IspcBlockEncoder;

impl IspcBlockEncoder {
    pub fn new() -> Self {
        Self
    }
}

impl BlockEncoder for IspcBlockEncoder {
    fn encode(
        &self,
        codec: BlockCodec,
        surface: &EncodeSurface<'_>,
        has_alpha: bool,
    ) -> TextureResult<Vec<u8>> {
        validate_surface(codec, surface)?;
        let EncodeSurface {
            data,
            width,
            height,
            stride,
        } = *surface;
        let rgba = RgbaSurface {
            data,
            width,
            height,
            stride,
        };

        let blocks = match codec {
            BlockCodec::Bc(BcVariant::Bc1) => bc1::compress_blocks(&rgba),
            BlockCodec::Bc(BcVariant::Bc3) => bc3::compress_blocks(&rgba),
            BlockCodec::Bc(BcVariant::Bc4) => bc4::compress_blocks(&RSurface {
                data,
                width,
                height,
                stride,
            }),
            BlockCodec::Bc(BcVariant::Bc5) => bc5::compress_blocks(&RgSurface {
                data,
                width,
                height,
                stride,
            }),
            BlockCodec::Bc(BcVariant::Bc6h) => {
                bc6h::compress_blocks(&bc6h::fast_settings(), &rgba)
            }
            BlockCodec::Bc(BcVariant::Bc7) => {
                let settings = if has_alpha {
                    bc7::alpha_fast_settings()
                } else {
                    bc7::opaque_fast_settings()
                };
                bc7::compress_blocks(&settings, &rgba)
            }
            BlockCodec::Astc(block) => {
                let (bw, bh) = block.dims();
                let settings = if has_alpha {
                    astc::alpha_fast_settings(bw, bh)
                } else {
                    astc::opaque_fast_settings(bw, bh)
                };
                astc::compress_blocks(&settings, &rgba)
            }
        };
        Ok(blocks)
    }

    fn name(&self) -> &str {
        "ispc"
    }
}
