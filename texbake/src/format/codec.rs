//! Compression requests and the resolved block codec.

use std::str::FromStr;

use crate::error::TextureError;

use super::types::{AstcBlock, BcVariant};

/// Compression family requested by the caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum CompressionFamily {
    None,
    Astc,
    #[default]
    Bc,
}

impl FromStr for CompressionFamily {
    type Err = TextureError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "none" => Ok(CompressionFamily::None),
            "astc" => Ok(CompressionFamily::Astc),
            "bc" | "dxt" => Ok(CompressionFamily::Bc),
            other => Err(TextureError::UnknownCompression(format!(
                "unknown compression family '{}'",
                other
            ))),
        }
    }
}

/// Compression family plus optional explicit block overrides.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct CompressionRequest {
    pub family: CompressionFamily,
    pub astc_block: Option<AstcBlock>,
    pub bc_variant: Option<BcVariant>,
}

impl CompressionRequest {
    pub fn none() -> Self {
        Self {
            family: CompressionFamily::None,
            ..Default::default()
        }
    }

    pub fn astc() -> Self {
        Self {
            family: CompressionFamily::Astc,
            ..Default::default()
        }
    }

    pub fn bc() -> Self {
        Self {
            family: CompressionFamily::Bc,
            ..Default::default()
        }
    }

    pub fn with_astc_block(mut self, block: AstcBlock) -> Self {
        self.astc_block = Some(block);
        self
    }

    pub fn with_bc_variant(mut self, variant: BcVariant) -> Self {
        self.bc_variant = Some(variant);
        self
    }
}

/// A concrete block codec, carrying the metadata the compressor needs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BlockCodec {
    Bc(BcVariant),
    Astc(AstcBlock),
}

impl BlockCodec {
    pub fn block_dims(self) -> (u32, u32) {
        match self {
            BlockCodec::Bc(_) => (4, 4),
            BlockCodec::Astc(block) => block.dims(),
        }
    }

    /// ASTC blocks are always 128 bits regardless of footprint.
    pub fn bytes_per_block(self) -> usize {
        match self {
            BlockCodec::Bc(variant) => variant.bytes_per_block(),
            BlockCodec::Astc(_) => 16,
        }
    }

    pub fn required_channels(self) -> u8 {
        match self {
            BlockCodec::Bc(variant) => variant.required_channels(),
            BlockCodec::Astc(_) => 4,
        }
    }

    /// Whether the encoder consumes half-float input.
    pub fn is_hdr(self) -> bool {
        matches!(self, BlockCodec::Bc(BcVariant::Bc6h))
    }

    /// Compressed size of one `width`×`height` slice.
    pub fn compressed_size(self, width: u32, height: u32) -> usize {
        let (bw, bh) = self.block_dims();
        width.div_ceil(bw) as usize * height.div_ceil(bh) as usize * self.bytes_per_block()
    }
}
