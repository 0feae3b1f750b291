//! Khronos KTX (version 1) writer and reader.
//!
//! Little-endian only. Uncompressed rows are padded to 4 bytes as the
//! format requires; the reader strips that padding again so payloads match
//! the in-memory tightly packed layout.

use std::io::Write;

use tracing::debug;

use crate::error::{TextureError, TextureResult};
use crate::format::{AstcBlock, AstcKind, BcVariant, ElementType, TextureFormat};
use crate::texture::{CompressedMipSet, ImageDesc, Texture, TexturePayload};

use super::{check_levels, ByteReader, Container, ContainerWriter};

const KTX_IDENTIFIER: [u8; 12] = [
    0xAB, 0x4B, 0x54, 0x58, 0x20, 0x31, 0x31, 0xBB, 0x0D, 0x0A, 0x1A, 0x0A,
];
const KTX_ENDIANNESS: u32 = 0x0403_0201;

const GL_UNSIGNED_BYTE: u32 = 0x1401;
const GL_UNSIGNED_SHORT: u32 = 0x1403;
const GL_FLOAT: u32 = 0x1406;

const GL_RED: u32 = 0x1903;
const GL_RG: u32 = 0x8227;
const GL_RGB: u32 = 0x1907;
const GL_RGBA: u32 = 0x1908;

fn pad4(len: usize) -> usize {
    (4 - len % 4) % 4
}

/// OpenGL internal format for `format`, if KTX can express it.
pub fn gl_internal_format(format: &TextureFormat) -> Option<u32> {
    let code = match format {
        TextureFormat::Uncompressed(pf) => match (pf.element, pf.channels, pf.is_srgb()) {
            (ElementType::U8, 4, true) => 0x8C43,
            (_, _, true) => return None,
            (ElementType::U8, 1, _) => 0x8229,
            (ElementType::U8, 2, _) => 0x822B,
            (ElementType::U8, 3, _) => 0x8051,
            (ElementType::U8, 4, _) => 0x8058,
            (ElementType::U16, 1, _) => 0x822A,
            (ElementType::U16, 2, _) => 0x822C,
            (ElementType::U16, 3, _) => 0x8054,
            (ElementType::U16, 4, _) => 0x805B,
            (ElementType::F32, 1, _) => 0x822E,
            (ElementType::F32, 2, _) => 0x8230,
            (ElementType::F32, 3, _) => 0x8815,
            (ElementType::F32, 4, _) => 0x8814,
            _ => return None,
        },
        TextureFormat::Bc {
            variant,
            srgb,
            signed,
        } => match (variant, srgb, signed) {
            (BcVariant::Bc1, false, _) => 0x83F1,
            (BcVariant::Bc1, true, _) => 0x8C4D,
            (BcVariant::Bc3, false, _) => 0x83F3,
            (BcVariant::Bc3, true, _) => 0x8C4F,
            (BcVariant::Bc4, _, false) => 0x8DBB,
            (BcVariant::Bc4, _, true) => 0x8DBC,
            (BcVariant::Bc5, _, false) => 0x8DBD,
            (BcVariant::Bc5, _, true) => 0x8DBE,
            (BcVariant::Bc6h, _, false) => 0x8E8F,
            (BcVariant::Bc6h, _, true) => 0x8E8E,
            (BcVariant::Bc7, false, _) => 0x8E8C,
            (BcVariant::Bc7, true, _) => 0x8E8D,
        },
        TextureFormat::Astc { block, kind } => {
            let (unorm, srgb) = match block {
                AstcBlock::B4x4 => (0x93B0, 0x93D0),
                AstcBlock::B5x5 => (0x93B2, 0x93D2),
                AstcBlock::B6x6 => (0x93B4, 0x93D4),
                AstcBlock::B8x8 => (0x93B7, 0x93D7),
            };
            if *kind == AstcKind::Srgb {
                srgb
            } else {
                unorm
            }
        }
    };
    Some(code)
}

fn channel_format(channels: u8) -> u32 {
    match channels {
        1 => GL_RED,
        2 => GL_RG,
        3 => GL_RGB,
        _ => GL_RGBA,
    }
}

fn gl_type(format: &TextureFormat) -> u32 {
    match format {
        TextureFormat::Uncompressed(pf) => match pf.element {
            ElementType::U8 => GL_UNSIGNED_BYTE,
            ElementType::U16 => GL_UNSIGNED_SHORT,
            ElementType::F32 => GL_FLOAT,
        },
        _ => 0,
    }
}

fn gl_type_size(format: &TextureFormat) -> u32 {
    match format {
        TextureFormat::Uncompressed(pf) => pf.element.size() as u32,
        _ => 1,
    }
}

fn gl_format(format: &TextureFormat) -> u32 {
    match format {
        TextureFormat::Uncompressed(pf) => channel_format(pf.channels),
        _ => 0,
    }
}

fn gl_base_internal_format(format: &TextureFormat) -> u32 {
    match format {
        TextureFormat::Uncompressed(pf) => channel_format(pf.channels),
        TextureFormat::Bc { variant, .. } => match variant {
            BcVariant::Bc4 => GL_RED,
            BcVariant::Bc5 => GL_RG,
            BcVariant::Bc6h => GL_RGB,
            _ => GL_RGBA,
        },
        TextureFormat::Astc { .. } => GL_RGBA,
    }
}

fn format_from_gl(gl_type: u32, internal_format: u32) -> Option<TextureFormat> {
    TextureFormat::all().into_iter().find(|f| {
        f.is_compressed() == (gl_type == 0) && gl_internal_format(f) == Some(internal_format)
    })
}

/// Unpadded row length of an uncompressed slice, `None` for block formats.
fn row_bytes(format: &TextureFormat, width: u32) -> Option<usize> {
    match format {
        TextureFormat::Uncompressed(pf) => Some(width as usize * pf.bytes_per_pixel()),
        _ => None,
    }
}

/// Append `slice` to `out`, padding each row to 4 bytes when needed.
fn write_rows(out: &mut Vec<u8>, slice: &[u8], row: Option<usize>) {
    match row {
        Some(row) if pad4(row) != 0 => {
            for chunk in slice.chunks(row) {
                out.extend_from_slice(chunk);
                out.extend(std::iter::repeat(0u8).take(pad4(row)));
            }
        }
        _ => out.extend_from_slice(slice),
    }
}

/// KTX1 container writer.
#[derive(Debug, Clone, Default)]
pub struct KtxWriter {
    key_values: Vec<(String, String)>,
}

impl KtxWriter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a key/value metadata entry, e.g. `KTXorientation`.
    pub fn with_key_value(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.key_values.push((key.into(), value.into()));
        self
    }

    fn key_value_bytes(&self) -> Vec<u8> {
        let mut bytes = Vec::new();
        for (key, value) in &self.key_values {
            let mut entry = Vec::with_capacity(key.len() + value.len() + 2);
            entry.extend_from_slice(key.as_bytes());
            entry.push(0);
            entry.extend_from_slice(value.as_bytes());
            entry.push(0);
            bytes.extend_from_slice(&(entry.len() as u32).to_le_bytes());
            let padding = pad4(entry.len());
            bytes.extend_from_slice(&entry);
            bytes.extend(std::iter::repeat(0u8).take(padding));
        }
        bytes
    }

    fn header(&self, desc: &ImageDesc, kv_len: usize) -> TextureResult<Vec<u8>> {
        let internal = gl_internal_format(&desc.format).ok_or_else(|| {
            TextureError::UndefinedFormat(format!("{} has no KTX internal format", desc.format))
        })?;
        let array_elements = match desc.container_array_size() {
            1 => 0,
            n => n,
        };

        let mut bytes = Vec::with_capacity(64 + kv_len);
        bytes.extend_from_slice(&KTX_IDENTIFIER);
        for value in [
            KTX_ENDIANNESS,
            gl_type(&desc.format),
            gl_type_size(&desc.format),
            gl_format(&desc.format),
            internal,
            gl_base_internal_format(&desc.format),
            desc.width,
            desc.height,
            if desc.depth > 1 { desc.depth } else { 0 },
            array_elements,
            if desc.cube { 6 } else { 1 },
            desc.mip_count,
            kv_len as u32,
        ] {
            bytes.extend_from_slice(&value.to_le_bytes());
        }
        Ok(bytes)
    }
}

impl ContainerWriter for KtxWriter {
    fn write(&self, stream: &mut dyn Write, desc: &ImageDesc, levels: &[Vec<u8>]) -> TextureResult<()> {
        check_levels(desc, levels)?;
        let kv = self.key_value_bytes();
        stream.write_all(&self.header(desc, kv.len())?)?;
        stream.write_all(&kv)?;

        let layers = desc.layer_count() as usize;
        let single_cube = desc.cube && desc.container_array_size() == 1;

        for (mip, level) in levels.iter().enumerate() {
            let (w, h) = desc.mip_extent(mip as u32);
            let row = row_bytes(&desc.format, w);
            let slice_len = level.len() / layers;
            if let Some(row) = row {
                if row * h as usize != slice_len {
                    return Err(TextureError::UndefinedFormat(format!(
                        "mip {} slice holds {} bytes, expected {}",
                        mip,
                        slice_len,
                        row * h as usize
                    )));
                }
            }

            let mut body = Vec::with_capacity(level.len());
            for slice in level.chunks(slice_len.max(1)) {
                write_rows(&mut body, slice, row);
            }

            if single_cube {
                // imageSize covers one face; each face carries its own padding.
                let face = body.len() / 6;
                stream.write_all(&(face as u32).to_le_bytes())?;
                for chunk in body.chunks(face.max(1)) {
                    stream.write_all(chunk)?;
                    stream.write_all(&[0u8; 3][..pad4(chunk.len())])?;
                }
            } else {
                stream.write_all(&(body.len() as u32).to_le_bytes())?;
                stream.write_all(&body)?;
                stream.write_all(&[0u8; 3][..pad4(body.len())])?;
            }
        }
        stream.flush()?;

        debug!(
            width = desc.width,
            height = desc.height,
            mips = desc.mip_count,
            format = %desc.format,
            "Wrote KTX"
        );
        Ok(())
    }

    fn container(&self) -> Container {
        Container::Ktx
    }
}

/// Strip row padding from one slice of an uncompressed level.
fn read_rows(out: &mut Vec<u8>, data: &[u8], row: Option<usize>) {
    match row {
        Some(row) if pad4(row) != 0 => {
            for chunk in data.chunks(row + pad4(row)) {
                out.extend_from_slice(&chunk[..row.min(chunk.len())]);
            }
        }
        _ => out.extend_from_slice(data),
    }
}

/// Parse a KTX1 file into an encoded texture.
pub fn read_ktx(bytes: &[u8]) -> TextureResult<Texture> {
    let mut reader = ByteReader::new(bytes);
    if reader.take(12)? != KTX_IDENTIFIER {
        return Err(TextureError::Decode("missing KTX identifier".to_string()));
    }
    let endianness = reader.u32()?;
    if endianness != KTX_ENDIANNESS {
        return Err(TextureError::Decode(
            "big-endian KTX files are not supported".to_string(),
        ));
    }
    let gl_type = reader.u32()?;
    let _type_size = reader.u32()?;
    let _gl_format = reader.u32()?;
    let internal = reader.u32()?;
    let _base_internal = reader.u32()?;
    let width = reader.u32()?;
    let height = reader.u32()?;
    let depth = reader.u32()?;
    let array_elements = reader.u32()?;
    let faces = reader.u32()?;
    let mip_count = reader.u32()?;
    let kv_len = reader.u32()?;
    reader.skip(kv_len as usize)?;

    let format = format_from_gl(gl_type, internal).ok_or_else(|| {
        TextureError::UndefinedFormat(format!("unsupported GL internal format {:#06x}", internal))
    })?;
    let cube = faces == 6;
    let desc = ImageDesc::new(width, height.max(1), format)
        .with_depth(depth.max(1))
        .with_array_size(array_elements.max(1) * if cube { 6 } else { 1 })
        .with_mip_count(mip_count.max(1))
        .with_cube(cube);
    desc.validate()?;

    let layers = desc.layer_count() as usize;
    let single_cube = cube && array_elements == 0;
    let mut set = CompressedMipSet::new();

    for mip in 0..desc.mip_count {
        let (w, h) = desc.mip_extent(mip);
        let row = row_bytes(&format, w);
        let image_size = reader.u32()? as usize;
        let mut level = Vec::new();

        if single_cube {
            for _ in 0..6 {
                read_rows(&mut level, reader.take(image_size)?, row);
                reader.skip(pad4(image_size))?;
            }
        } else {
            let data = reader.take(image_size)?;
            let slice = image_size / layers;
            for chunk in data.chunks(slice.max(1)) {
                read_rows(&mut level, chunk, row);
            }
            reader.skip(pad4(image_size))?;
        }

        if let Some(row) = row {
            let expected = row * h as usize * layers;
            if level.len() != expected {
                return Err(TextureError::Decode(format!(
                    "KTX mip {} holds {} bytes, expected {}",
                    mip,
                    level.len(),
                    expected
                )));
            }
        }
        set.append(mip as usize, &level);
    }

    Ok(Texture {
        desc,
        payload: TexturePayload::Blocks(set),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use crate::format::{ColorSpace, PixelFormat};

    fn u32_at(bytes: &[u8], offset: usize) -> u32 {
        u32::from_le_bytes(bytes[offset..offset + 4].try_into().unwrap())
    }

    fn levels_for(desc: &ImageDesc) -> Vec<Vec<u8>> {
        (0..desc.mip_count)
            .map(|l| {
                (0..desc.level_size(l))
                    .map(|i| (i as u32 * 13 + l) as u8)
                    .collect()
            })
            .collect()
    }

    fn write(writer: &KtxWriter, desc: &ImageDesc, levels: &[Vec<u8>]) -> Vec<u8> {
        let mut out = Vec::new();
        writer.write(&mut out, desc, levels).unwrap();
        out
    }

    #[test]
    fn test_header_fields() {
        let desc = ImageDesc::new(256, 128, TextureFormat::bc(BcVariant::Bc7, true, false))
            .with_mip_count(9);
        let bytes = write(&KtxWriter::new(), &desc, &levels_for(&desc));

        assert_eq!(&bytes[0..12], &KTX_IDENTIFIER);
        assert_eq!(u32_at(&bytes, 12), KTX_ENDIANNESS);
        assert_eq!(u32_at(&bytes, 16), 0); // glType
        assert_eq!(u32_at(&bytes, 20), 1); // glTypeSize
        assert_eq!(u32_at(&bytes, 24), 0); // glFormat
        assert_eq!(u32_at(&bytes, 28), 0x8E8D);
        assert_eq!(u32_at(&bytes, 32), GL_RGBA);
        assert_eq!(u32_at(&bytes, 36), 256);
        assert_eq!(u32_at(&bytes, 40), 128);
        assert_eq!(u32_at(&bytes, 44), 0);
        assert_eq!(u32_at(&bytes, 48), 0);
        assert_eq!(u32_at(&bytes, 52), 1);
        assert_eq!(u32_at(&bytes, 56), 9);
        assert_eq!(u32_at(&bytes, 60), 0);
        // first imageSize follows the 64-byte header
        assert_eq!(u32_at(&bytes, 64), 64 * 32 * 16);
    }

    #[test]
    fn test_gl_codes() {
        assert_eq!(
            gl_internal_format(&TextureFormat::bc(BcVariant::Bc5, false, false)),
            Some(0x8DBD)
        );
        assert_eq!(gl_base_internal_format(&TextureFormat::bc(BcVariant::Bc5, false, false)), GL_RG);
        let rgb16 = TextureFormat::Uncompressed(PixelFormat::new(
            ElementType::U16,
            3,
            ColorSpace::Linear,
        ));
        assert_eq!(gl_internal_format(&rgb16), Some(0x8054));
        assert_eq!(gl_type(&rgb16), GL_UNSIGNED_SHORT);
        assert_eq!(gl_format(&rgb16), GL_RGB);
        assert_eq!(gl_type_size(&rgb16), 2);
    }

    #[test]
    fn test_uncompressed_rows_are_padded() {
        let rgb8 = TextureFormat::Uncompressed(PixelFormat::new(
            ElementType::U8,
            3,
            ColorSpace::Linear,
        ));
        let desc = ImageDesc::new(3, 2, rgb8);
        let levels = levels_for(&desc);
        let bytes = write(&KtxWriter::new(), &desc, &levels);

        // 9-byte rows padded to 12
        assert_eq!(u32_at(&bytes, 64), 24);
        assert_eq!(&bytes[68..77], &levels[0][0..9]);
        assert_eq!(&bytes[77..80], &[0, 0, 0]);

        let texture = read_ktx(&bytes).unwrap();
        assert_eq!(texture.desc, desc);
        assert_eq!(texture.level_bytes(), levels);
    }

    #[test]
    fn test_single_cube_image_size_is_one_face() {
        let desc = ImageDesc::new(8, 8, TextureFormat::bc(BcVariant::Bc1, false, false))
            .with_array_size(6)
            .with_cube(true)
            .with_mip_count(4);
        let levels = levels_for(&desc);
        let bytes = write(&KtxWriter::new(), &desc, &levels);

        assert_eq!(u32_at(&bytes, 48), 0);
        assert_eq!(u32_at(&bytes, 52), 6);
        assert_eq!(u32_at(&bytes, 64), 4 * 8);

        let texture = read_ktx(&bytes).unwrap();
        assert_eq!(texture.desc, desc);
        assert_eq!(texture.level_bytes(), levels);
    }

    #[test]
    fn test_cube_array_reports_cubes() {
        let desc = ImageDesc::new(4, 4, TextureFormat::bc(BcVariant::Bc7, false, false))
            .with_array_size(12)
            .with_cube(true);
        let levels = levels_for(&desc);
        let bytes = write(&KtxWriter::new(), &desc, &levels);
        assert_eq!(u32_at(&bytes, 48), 2);
        assert_eq!(u32_at(&bytes, 64), 12 * 16);

        let texture = read_ktx(&bytes).unwrap();
        assert_eq!(texture.desc, desc);
        assert_eq!(texture.level_bytes(), levels);
    }

    #[test]
    fn test_key_values_are_padded() {
        let desc = ImageDesc::new(4, 4, TextureFormat::bc(BcVariant::Bc4, false, false));
        let levels = levels_for(&desc);
        let writer = KtxWriter::new().with_key_value("KTXorientation", "S=r,T=d");
        let bytes = write(&writer, &desc, &levels);

        // 4-byte length + "KTXorientation\0S=r,T=d\0" (23 bytes) + 1 pad
        assert_eq!(u32_at(&bytes, 60), 28);
        assert_eq!(u32_at(&bytes, 64), 23);
        assert_eq!(&bytes[68..82], b"KTXorientation");

        let texture = read_ktx(&bytes).unwrap();
        assert_eq!(texture.level_bytes(), levels);
    }

    #[test]
    fn test_astc_float_reads_back_as_unorm() {
        let desc = ImageDesc::new(
            12,
            12,
            TextureFormat::Astc {
                block: AstcBlock::B6x6,
                kind: AstcKind::Float,
            },
        );
        let bytes = write(&KtxWriter::new(), &desc, &levels_for(&desc));
        assert_eq!(u32_at(&bytes, 28), 0x93B4);
        let texture = read_ktx(&bytes).unwrap();
        assert_eq!(
            texture.desc.format,
            TextureFormat::Astc {
                block: AstcBlock::B6x6,
                kind: AstcKind::Unorm
            }
        );
    }

    #[test]
    fn test_read_rejects_bad_identifier() {
        let err = read_ktx(&[0u8; 80]).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::DecodeError);
    }

    #[test]
    fn test_inexpressible_format_is_undefined() {
        let srgb_r8 = TextureFormat::Uncompressed(PixelFormat::new(
            ElementType::U8,
            1,
            ColorSpace::Srgb,
        ));
        let desc = ImageDesc::new(4, 4, srgb_r8);
        let mut out = Vec::new();
        let err = KtxWriter::new()
            .write(&mut out, &desc, &[vec![0; 16]])
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::UndefinedFormat);
    }
}
