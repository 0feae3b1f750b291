//! Pixel and block-compressed format descriptions.

use std::fmt;
use std::str::FromStr;

use serde::{Serialize, Serializer};

use crate::error::TextureError;

/// Storage type of a single channel value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ElementType {
    U8,
    U16,
    F32,
}

impl ElementType {
    /// Size of one channel value in bytes.
    pub fn size(self) -> usize {
        match self {
            ElementType::U8 => 1,
            ElementType::U16 => 2,
            ElementType::F32 => 4,
        }
    }
}

/// Interpretation of the colour channels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum ColorSpace {
    Linear,
    #[default]
    Srgb,
}

/// Layout of an uncompressed pixel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PixelFormat {
    pub element: ElementType,
    pub channels: u8,
    pub color_space: ColorSpace,
}

impl PixelFormat {
    pub fn new(element: ElementType, channels: u8, color_space: ColorSpace) -> Self {
        Self {
            element,
            channels,
            color_space,
        }
    }

    /// 8-bit RGBA in sRGB space, the format every sRGB source is loaded as.
    pub fn rgba8_srgb() -> Self {
        Self::new(ElementType::U8, 4, ColorSpace::Srgb)
    }

    pub fn bytes_per_pixel(&self) -> usize {
        self.element.size() * self.channels as usize
    }

    pub fn is_srgb(&self) -> bool {
        self.color_space == ColorSpace::Srgb
    }
}

/// BC (DXT) block variants.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BcVariant {
    Bc1,
    Bc3,
    Bc4,
    Bc5,
    Bc6h,
    Bc7,
}

impl BcVariant {
    pub const ALL: [BcVariant; 6] = [
        BcVariant::Bc1,
        BcVariant::Bc3,
        BcVariant::Bc4,
        BcVariant::Bc5,
        BcVariant::Bc6h,
        BcVariant::Bc7,
    ];

    /// Encoded size of one 4×4 block.
    pub fn bytes_per_block(self) -> usize {
        match self {
            BcVariant::Bc1 | BcVariant::Bc4 => 8,
            BcVariant::Bc3 | BcVariant::Bc5 | BcVariant::Bc6h | BcVariant::Bc7 => 16,
        }
    }

    /// Channel count of the surface the block encoder consumes.
    pub fn required_channels(self) -> u8 {
        match self {
            BcVariant::Bc4 => 1,
            BcVariant::Bc5 => 2,
            BcVariant::Bc1 | BcVariant::Bc3 | BcVariant::Bc6h | BcVariant::Bc7 => 4,
        }
    }

    /// Whether the variant has an sRGB flavour.
    pub fn has_srgb(self) -> bool {
        matches!(self, BcVariant::Bc1 | BcVariant::Bc3 | BcVariant::Bc7)
    }

    /// Whether the variant has a signed flavour.
    pub fn has_signed(self) -> bool {
        matches!(self, BcVariant::Bc4 | BcVariant::Bc5 | BcVariant::Bc6h)
    }

    pub fn name(self) -> &'static str {
        match self {
            BcVariant::Bc1 => "bc1",
            BcVariant::Bc3 => "bc3",
            BcVariant::Bc4 => "bc4",
            BcVariant::Bc5 => "bc5",
            BcVariant::Bc6h => "bc6h",
            BcVariant::Bc7 => "bc7",
        }
    }
}

impl FromStr for BcVariant {
    type Err = TextureError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "bc1" | "dxt1" => Ok(BcVariant::Bc1),
            "bc3" | "dxt5" => Ok(BcVariant::Bc3),
            "bc4" => Ok(BcVariant::Bc4),
            "bc5" => Ok(BcVariant::Bc5),
            "bc6" | "bc6h" => Ok(BcVariant::Bc6h),
            "bc7" => Ok(BcVariant::Bc7),
            other => Err(TextureError::UnknownCompression(format!(
                "unknown BC variant '{}'",
                other
            ))),
        }
    }
}

/// ASTC block footprints.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AstcBlock {
    B4x4,
    B5x5,
    B6x6,
    B8x8,
}

impl AstcBlock {
    pub const ALL: [AstcBlock; 4] = [
        AstcBlock::B4x4,
        AstcBlock::B5x5,
        AstcBlock::B6x6,
        AstcBlock::B8x8,
    ];

    /// Block footprint in texels (width, height).
    pub fn dims(self) -> (u32, u32) {
        match self {
            AstcBlock::B4x4 => (4, 4),
            AstcBlock::B5x5 => (5, 5),
            AstcBlock::B6x6 => (6, 6),
            AstcBlock::B8x8 => (8, 8),
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            AstcBlock::B4x4 => "4x4",
            AstcBlock::B5x5 => "5x5",
            AstcBlock::B6x6 => "6x6",
            AstcBlock::B8x8 => "8x8",
        }
    }
}

impl FromStr for AstcBlock {
    type Err = TextureError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "4x4" => Ok(AstcBlock::B4x4),
            "5x5" => Ok(AstcBlock::B5x5),
            "6x6" => Ok(AstcBlock::B6x6),
            "8x8" => Ok(AstcBlock::B8x8),
            other => Err(TextureError::UnknownCompression(format!(
                "unsupported ASTC block '{}'",
                other
            ))),
        }
    }
}

/// Numeric flavour of an ASTC target.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AstcKind {
    Unorm,
    Srgb,
    Float,
}

/// Any format a texture can be stored in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TextureFormat {
    Uncompressed(PixelFormat),
    Bc {
        variant: BcVariant,
        srgb: bool,
        signed: bool,
    },
    Astc {
        block: AstcBlock,
        kind: AstcKind,
    },
}

impl TextureFormat {
    /// BC format with the flags the variant cannot express dropped.
    pub fn bc(variant: BcVariant, srgb: bool, signed: bool) -> Self {
        TextureFormat::Bc {
            variant,
            srgb: srgb && variant.has_srgb(),
            signed: signed && variant.has_signed(),
        }
    }

    pub fn is_compressed(&self) -> bool {
        !matches!(self, TextureFormat::Uncompressed(_))
    }

    pub fn is_srgb(&self) -> bool {
        match self {
            TextureFormat::Uncompressed(pf) => pf.is_srgb(),
            TextureFormat::Bc { srgb, .. } => *srgb,
            TextureFormat::Astc { kind, .. } => *kind == AstcKind::Srgb,
        }
    }

    /// Block footprint; uncompressed formats are 1×1.
    pub fn block_dims(&self) -> (u32, u32) {
        match self {
            TextureFormat::Uncompressed(_) => (1, 1),
            TextureFormat::Bc { .. } => (4, 4),
            TextureFormat::Astc { block, .. } => block.dims(),
        }
    }

    /// Bytes per block, or per pixel for uncompressed formats.
    pub fn bytes_per_block(&self) -> usize {
        match self {
            TextureFormat::Uncompressed(pf) => pf.bytes_per_pixel(),
            TextureFormat::Bc { variant, .. } => variant.bytes_per_block(),
            TextureFormat::Astc { .. } => 16,
        }
    }

    /// Byte size of one slice of `width`×`height` texels.
    pub fn surface_size(&self, width: u32, height: u32) -> usize {
        let (bw, bh) = self.block_dims();
        width.div_ceil(bw) as usize * height.div_ceil(bh) as usize * self.bytes_per_block()
    }

    /// Every format a container may carry, used for reverse lookups.
    pub fn all() -> Vec<TextureFormat> {
        let mut formats = Vec::new();
        for element in [ElementType::U8, ElementType::U16, ElementType::F32] {
            for channels in 1..=4u8 {
                formats.push(TextureFormat::Uncompressed(PixelFormat::new(
                    element,
                    channels,
                    ColorSpace::Linear,
                )));
            }
        }
        formats.push(TextureFormat::Uncompressed(PixelFormat::rgba8_srgb()));
        for variant in BcVariant::ALL {
            formats.push(TextureFormat::bc(variant, false, false));
            if variant.has_srgb() {
                formats.push(TextureFormat::bc(variant, true, false));
            }
            if variant.has_signed() {
                formats.push(TextureFormat::bc(variant, false, true));
            }
        }
        for block in AstcBlock::ALL {
            for kind in [AstcKind::Unorm, AstcKind::Srgb, AstcKind::Float] {
                formats.push(TextureFormat::Astc { block, kind });
            }
        }
        formats
    }
}

impl fmt::Display for TextureFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TextureFormat::Uncompressed(pf) => {
                let names = ["R", "G", "B", "A"];
                let bits = pf.element.size() * 8;
                for name in names.iter().take(pf.channels as usize) {
                    write!(f, "{}{}", name, bits)?;
                }
                let suffix = match (pf.element, pf.color_space) {
                    (ElementType::F32, _) => "SFLOAT",
                    (_, ColorSpace::Srgb) => "SRGB",
                    (_, ColorSpace::Linear) => "UNORM",
                };
                write!(f, "_{}", suffix)
            }
            TextureFormat::Bc {
                variant,
                srgb,
                signed,
            } => {
                let suffix = match (variant, srgb, signed) {
                    (BcVariant::Bc6h, _, true) => "SFLOAT",
                    (BcVariant::Bc6h, _, false) => "UFLOAT",
                    (_, true, _) => "SRGB",
                    (_, _, true) => "SNORM",
                    _ => "UNORM",
                };
                write!(f, "{}_{}", variant.name().to_ascii_uppercase(), suffix)
            }
            TextureFormat::Astc { block, kind } => {
                let suffix = match kind {
                    AstcKind::Unorm => "UNORM",
                    AstcKind::Srgb => "SRGB",
                    AstcKind::Float => "SFLOAT",
                };
                write!(f, "ASTC_{}_{}", block.name(), suffix)
            }
        }
    }
}

impl Serialize for TextureFormat {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}
