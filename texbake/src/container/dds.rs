//! DirectDraw Surface (DDS) writer and reader.
//!
//! Files are written with the DX10 extension header so every format,
//! including ASTC, texture arrays and sRGB variants, has an exact DXGI code.
//! Legacy FourCC headers can be requested for BC1/3/4/5 single textures.
//! Linear 8-bit RGB, which has no DXGI code, is written with a legacy
//! 24-bit RGB pixel format and channel masks.

use std::io::Write;

use tracing::debug;

use crate::error::{TextureError, TextureResult};
use crate::format::{
    AstcBlock, AstcKind, BcVariant, ColorSpace, ElementType, PixelFormat, TextureFormat,
};
use crate::texture::{CompressedMipSet, ImageDesc, Texture, TexturePayload};

use super::{check_levels, ByteReader, Container, ContainerWriter};

const DDS_MAGIC: [u8; 4] = *b"DDS ";
const DDS_HEADER_SIZE: u32 = 124;
const DDS_PIXELFORMAT_SIZE: u32 = 32;

const DDSD_CAPS: u32 = 0x1;
const DDSD_HEIGHT: u32 = 0x2;
const DDSD_WIDTH: u32 = 0x4;
const DDSD_PITCH: u32 = 0x8;
const DDSD_PIXELFORMAT: u32 = 0x1000;
const DDSD_MIPMAPCOUNT: u32 = 0x20000;
const DDSD_LINEARSIZE: u32 = 0x80000;
const DDSD_DEPTH: u32 = 0x80_0000;

const DDPF_FOURCC: u32 = 0x4;
const DDPF_RGB: u32 = 0x40;

/// Bit count and R, G, B, A masks of tightly packed 8-bit RGB.
const RGB8_BIT_COUNT: u32 = 24;
const RGB8_MASKS: [u32; 4] = [0x0000_00FF, 0x0000_FF00, 0x00FF_0000, 0];

const DDSCAPS_COMPLEX: u32 = 0x8;
const DDSCAPS_TEXTURE: u32 = 0x1000;
const DDSCAPS_MIPMAP: u32 = 0x40_0000;

const DDSCAPS2_CUBEMAP: u32 = 0x200;
const DDSCAPS2_CUBEMAP_ALLFACES: u32 = 0xFC00;
const DDSCAPS2_VOLUME: u32 = 0x20_0000;

const DX10_FOURCC: [u8; 4] = *b"DX10";
const D3D10_RESOURCE_DIMENSION_TEXTURE2D: u32 = 3;
const D3D10_RESOURCE_DIMENSION_TEXTURE3D: u32 = 4;
const D3D10_RESOURCE_MISC_TEXTURECUBE: u32 = 0x4;

/// DXGI format code for `format`, if DDS can express it.
///
/// ASTC float targets are stored LDR and share the UNORM code.
pub fn dxgi_format(format: &TextureFormat) -> Option<u32> {
    let code = match format {
        TextureFormat::Uncompressed(pf) => match (pf.element, pf.channels, pf.is_srgb()) {
            (ElementType::U8, 4, true) => 29,
            (_, _, true) => return None,
            (ElementType::U8, 1, _) => 61,
            (ElementType::U8, 2, _) => 49,
            (ElementType::U8, 4, _) => 28,
            (ElementType::U16, 1, _) => 56,
            (ElementType::U16, 2, _) => 35,
            (ElementType::U16, 4, _) => 11,
            (ElementType::F32, 1, _) => 41,
            (ElementType::F32, 2, _) => 16,
            (ElementType::F32, 3, _) => 6,
            (ElementType::F32, 4, _) => 2,
            _ => return None,
        },
        TextureFormat::Bc {
            variant,
            srgb,
            signed,
        } => match variant {
            BcVariant::Bc1 => 71 + *srgb as u32,
            BcVariant::Bc3 => 77 + *srgb as u32,
            BcVariant::Bc4 => 80 + *signed as u32,
            BcVariant::Bc5 => 83 + *signed as u32,
            BcVariant::Bc6h => 95 + *signed as u32,
            BcVariant::Bc7 => 98 + *srgb as u32,
        },
        TextureFormat::Astc { block, kind } => {
            let base = match block {
                AstcBlock::B4x4 => 134,
                AstcBlock::B5x5 => 142,
                AstcBlock::B6x6 => 150,
                AstcBlock::B8x8 => 162,
            };
            base + (*kind == AstcKind::Srgb) as u32
        }
    };
    Some(code)
}

fn is_rgb8(format: &TextureFormat) -> bool {
    matches!(
        format,
        TextureFormat::Uncompressed(pf)
            if pf.element == ElementType::U8 && pf.channels == 3 && !pf.is_srgb()
    )
}

/// Whether a DDS file can carry `format`.
pub fn dds_supports(format: &TextureFormat) -> bool {
    dxgi_format(format).is_some() || is_rgb8(format)
}

fn format_from_dxgi(code: u32) -> Option<TextureFormat> {
    TextureFormat::all()
        .into_iter()
        .find(|f| dxgi_format(f) == Some(code))
}

fn legacy_fourcc(format: &TextureFormat) -> Option<[u8; 4]> {
    match format {
        TextureFormat::Bc {
            variant,
            srgb: false,
            signed: false,
        } => match variant {
            BcVariant::Bc1 => Some(*b"DXT1"),
            BcVariant::Bc3 => Some(*b"DXT5"),
            BcVariant::Bc4 => Some(*b"ATI1"),
            BcVariant::Bc5 => Some(*b"ATI2"),
            _ => None,
        },
        _ => None,
    }
}

fn format_from_legacy(fourcc: &[u8; 4]) -> Option<TextureFormat> {
    let variant = match fourcc {
        b"DXT1" => BcVariant::Bc1,
        b"DXT5" => BcVariant::Bc3,
        b"ATI1" | b"BC4U" => BcVariant::Bc4,
        b"ATI2" | b"BC5U" => BcVariant::Bc5,
        _ => return None,
    };
    Some(TextureFormat::bc(variant, false, false))
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Dx10Header {
    dxgi_format: u32,
    resource_dimension: u32,
    misc_flag: u32,
    array_size: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct DdsHeader {
    flags: u32,
    height: u32,
    width: u32,
    pitch_or_linear_size: u32,
    depth: u32,
    mipmap_count: u32,
    pixel_format_flags: u32,
    fourcc: [u8; 4],
    rgb_bit_count: u32,
    masks: [u32; 4],
    caps: u32,
    caps2: u32,
    dx10: Option<Dx10Header>,
}

impl DdsHeader {
    fn to_bytes(&self) -> Vec<u8> {
        let mut bytes = Vec::with_capacity(148);
        bytes.extend_from_slice(&DDS_MAGIC);
        for value in [
            DDS_HEADER_SIZE,
            self.flags,
            self.height,
            self.width,
            self.pitch_or_linear_size,
            self.depth,
            self.mipmap_count,
        ] {
            bytes.extend_from_slice(&value.to_le_bytes());
        }
        // reserved1
        bytes.extend_from_slice(&[0u8; 11 * 4]);

        bytes.extend_from_slice(&DDS_PIXELFORMAT_SIZE.to_le_bytes());
        bytes.extend_from_slice(&self.pixel_format_flags.to_le_bytes());
        bytes.extend_from_slice(&self.fourcc);
        bytes.extend_from_slice(&self.rgb_bit_count.to_le_bytes());
        for mask in self.masks {
            bytes.extend_from_slice(&mask.to_le_bytes());
        }

        for value in [self.caps, self.caps2, 0, 0, 0] {
            bytes.extend_from_slice(&value.to_le_bytes());
        }

        if let Some(dx10) = &self.dx10 {
            for value in [
                dx10.dxgi_format,
                dx10.resource_dimension,
                dx10.misc_flag,
                dx10.array_size,
                0,
            ] {
                bytes.extend_from_slice(&value.to_le_bytes());
            }
        }
        bytes
    }

    fn parse(reader: &mut ByteReader<'_>) -> TextureResult<Self> {
        if reader.take(4)? != DDS_MAGIC {
            return Err(TextureError::Decode("missing DDS magic".to_string()));
        }
        let size = reader.u32()?;
        if size != DDS_HEADER_SIZE {
            return Err(TextureError::Decode(format!("bad DDS header size {}", size)));
        }
        let flags = reader.u32()?;
        let height = reader.u32()?;
        let width = reader.u32()?;
        let pitch_or_linear_size = reader.u32()?;
        let depth = reader.u32()?;
        let mipmap_count = reader.u32()?;
        reader.skip(11 * 4)?;

        let _pf_size = reader.u32()?;
        let pixel_format_flags = reader.u32()?;
        let mut fourcc = [0u8; 4];
        fourcc.copy_from_slice(reader.take(4)?);
        let rgb_bit_count = reader.u32()?;
        let masks = [reader.u32()?, reader.u32()?, reader.u32()?, reader.u32()?];

        let caps = reader.u32()?;
        let caps2 = reader.u32()?;
        reader.skip(3 * 4)?;

        let dx10 = if pixel_format_flags & DDPF_FOURCC != 0 && fourcc == DX10_FOURCC {
            let header = Dx10Header {
                dxgi_format: reader.u32()?,
                resource_dimension: reader.u32()?,
                misc_flag: reader.u32()?,
                array_size: reader.u32()?,
            };
            reader.skip(4)?;
            Some(header)
        } else {
            None
        };

        Ok(Self {
            flags,
            height,
            width,
            pitch_or_linear_size,
            depth,
            mipmap_count,
            pixel_format_flags,
            fourcc,
            rgb_bit_count,
            masks,
            caps,
            caps2,
            dx10,
        })
    }
}

/// DDS container writer.
#[derive(Debug, Clone, Copy, Default)]
pub struct DdsWriter {
    legacy_fourcc: bool,
}

impl DdsWriter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Prefer a legacy FourCC header (no DX10 extension) when the format
    /// and shape allow it.
    pub fn with_legacy_fourcc(mut self, legacy: bool) -> Self {
        self.legacy_fourcc = legacy;
        self
    }

    fn header(&self, desc: &ImageDesc, levels: &[Vec<u8>]) -> TextureResult<DdsHeader> {
        let layers = desc.layer_count() as usize;
        let volume = desc.depth > 1;

        let mut flags = DDSD_CAPS | DDSD_HEIGHT | DDSD_WIDTH | DDSD_PIXELFORMAT;
        if desc.mip_count > 1 {
            flags |= DDSD_MIPMAPCOUNT;
        }
        if volume {
            flags |= DDSD_DEPTH;
        }
        let pitch_or_linear_size = if desc.format.is_compressed() {
            flags |= DDSD_LINEARSIZE;
            (levels[0].len() / layers) as u32
        } else {
            flags |= DDSD_PITCH;
            (desc.width as usize * desc.format.bytes_per_block()) as u32
        };

        let mut caps = DDSCAPS_TEXTURE;
        if desc.mip_count > 1 {
            caps |= DDSCAPS_COMPLEX | DDSCAPS_MIPMAP;
        }
        if desc.cube || desc.array_size > 1 || volume {
            caps |= DDSCAPS_COMPLEX;
        }
        let caps2 = if desc.cube {
            DDSCAPS2_CUBEMAP | DDSCAPS2_CUBEMAP_ALLFACES
        } else if volume {
            DDSCAPS2_VOLUME
        } else {
            0
        };

        let single = desc.container_array_size() == 1;
        if is_rgb8(&desc.format) {
            if !single {
                return Err(TextureError::UndefinedFormat(format!(
                    "{} arrays have no DDS format",
                    desc.format
                )));
            }
            return Ok(DdsHeader {
                flags,
                height: desc.height,
                width: desc.width,
                pitch_or_linear_size,
                depth: if volume { desc.depth } else { 0 },
                mipmap_count: desc.mip_count,
                pixel_format_flags: DDPF_RGB,
                fourcc: [0; 4],
                rgb_bit_count: RGB8_BIT_COUNT,
                masks: RGB8_MASKS,
                caps,
                caps2,
                dx10: None,
            });
        }

        let legacy = if self.legacy_fourcc && single {
            legacy_fourcc(&desc.format)
        } else {
            None
        };
        let (fourcc, dx10) = match legacy {
            Some(fourcc) => (fourcc, None),
            None => {
                let dxgi_format = dxgi_format(&desc.format).ok_or_else(|| {
                    TextureError::UndefinedFormat(format!("{} has no DXGI format", desc.format))
                })?;
                let dx10 = Dx10Header {
                    dxgi_format,
                    resource_dimension: if volume {
                        D3D10_RESOURCE_DIMENSION_TEXTURE3D
                    } else {
                        D3D10_RESOURCE_DIMENSION_TEXTURE2D
                    },
                    misc_flag: if desc.cube {
                        D3D10_RESOURCE_MISC_TEXTURECUBE
                    } else {
                        0
                    },
                    array_size: desc.container_array_size(),
                };
                (DX10_FOURCC, Some(dx10))
            }
        };

        Ok(DdsHeader {
            flags,
            height: desc.height,
            width: desc.width,
            pitch_or_linear_size,
            depth: if volume { desc.depth } else { 0 },
            mipmap_count: desc.mip_count,
            pixel_format_flags: DDPF_FOURCC,
            fourcc,
            rgb_bit_count: 0,
            masks: [0; 4],
            caps,
            caps2,
            dx10,
        })
    }
}

impl ContainerWriter for DdsWriter {
    fn write(&self, stream: &mut dyn Write, desc: &ImageDesc, levels: &[Vec<u8>]) -> TextureResult<()> {
        check_levels(desc, levels)?;
        let header = self.header(desc, levels)?;
        stream.write_all(&header.to_bytes())?;

        // DDS stores each slice's full mip chain before the next slice.
        let layers = desc.layer_count() as usize;
        for layer in 0..layers {
            for level in levels {
                let slice = level.len() / layers;
                stream.write_all(&level[layer * slice..(layer + 1) * slice])?;
            }
        }
        stream.flush()?;

        debug!(
            width = desc.width,
            height = desc.height,
            mips = desc.mip_count,
            format = %desc.format,
            "Wrote DDS"
        );
        Ok(())
    }

    fn container(&self) -> Container {
        Container::Dds
    }
}

/// Parse a DDS file into an encoded texture.
pub fn read_dds(bytes: &[u8]) -> TextureResult<Texture> {
    let mut reader = ByteReader::new(bytes);
    let header = DdsHeader::parse(&mut reader)?;

    let rgb8 = header.pixel_format_flags & DDPF_RGB != 0
        && header.rgb_bit_count == RGB8_BIT_COUNT
        && header.masks == RGB8_MASKS;
    if header.pixel_format_flags & DDPF_FOURCC == 0 && !rgb8 {
        return Err(TextureError::UndefinedFormat(
            "only FourCC and 24-bit RGB DDS pixel formats are supported".to_string(),
        ));
    }

    let (format, array_size, cube) = match header.dx10 {
        Some(dx10) => {
            let format = format_from_dxgi(dx10.dxgi_format).ok_or_else(|| {
                TextureError::UndefinedFormat(format!("unsupported DXGI format {}", dx10.dxgi_format))
            })?;
            let cube = dx10.misc_flag & D3D10_RESOURCE_MISC_TEXTURECUBE != 0;
            let array_size = dx10.array_size.max(1) * if cube { 6 } else { 1 };
            (format, array_size, cube)
        }
        None if rgb8 => {
            let cube = header.caps2 & DDSCAPS2_CUBEMAP != 0;
            let format = TextureFormat::Uncompressed(PixelFormat::new(
                ElementType::U8,
                3,
                ColorSpace::Linear,
            ));
            (format, if cube { 6 } else { 1 }, cube)
        }
        None => {
            let format = format_from_legacy(&header.fourcc).ok_or_else(|| {
                TextureError::UndefinedFormat(format!(
                    "unsupported DDS FourCC {:?}",
                    String::from_utf8_lossy(&header.fourcc)
                ))
            })?;
            let cube = header.caps2 & DDSCAPS2_CUBEMAP != 0;
            (format, if cube { 6 } else { 1 }, cube)
        }
    };

    let depth = if header.flags & DDSD_DEPTH != 0 {
        header.depth.max(1)
    } else {
        1
    };
    let desc = ImageDesc::new(header.width, header.height, format)
        .with_depth(depth)
        .with_array_size(array_size)
        .with_mip_count(header.mipmap_count.max(1))
        .with_cube(cube);
    desc.validate()?;

    let mut set = CompressedMipSet::new();
    for _ in 0..desc.layer_count() {
        for level in 0..desc.mip_count {
            let (w, h) = desc.mip_extent(level);
            let slice = reader.take(format.surface_size(w, h))?;
            set.append(level as usize, slice);
        }
    }

    Ok(Texture {
        desc,
        payload: TexturePayload::Blocks(set),
    })
}
