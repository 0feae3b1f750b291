//! Texture container files.
//!
//! Writers implement [`ContainerWriter`] and stream a header followed by the
//! mip payloads to any [`std::io::Write`]. Each writer instance carries its
//! own options; there is no shared writer state. The matching readers parse
//! what the writers produce and return a [`Texture`] with an encoded payload.
//!
//! Cube maps are described internally with one array slice per face; both
//! containers report the number of cubes (`array_size / 6`).

mod dds;
mod ktx;

pub use dds::{dds_supports, dxgi_format, read_dds, DdsWriter};
pub use ktx::{gl_internal_format, read_ktx, KtxWriter};

use std::fmt;
use std::io::Write;
use std::path::Path;
use std::str::FromStr;

use crate::error::{TextureError, TextureResult};
use crate::format::TextureFormat;
use crate::texture::{ImageDesc, Texture};

/// Supported container kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Container {
    Ktx,
    #[default]
    Dds,
}

impl Container {
    /// Container for a file extension, if it is one we read.
    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext.to_ascii_lowercase().as_str() {
            "ktx" => Some(Container::Ktx),
            "dds" => Some(Container::Dds),
            _ => None,
        }
    }

    /// Whether this container has a format code for `format`.
    pub fn supports(self, format: &TextureFormat) -> bool {
        match self {
            Container::Ktx => gl_internal_format(format).is_some(),
            Container::Dds => dds_supports(format),
        }
    }

    /// A writer with default options.
    pub fn writer(self) -> Box<dyn ContainerWriter> {
        match self {
            Container::Ktx => Box::new(KtxWriter::new()),
            Container::Dds => Box::new(DdsWriter::new()),
        }
    }
}

impl FromStr for Container {
    type Err = TextureError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "ktx" | "0" => Ok(Container::Ktx),
            "dds" | "1" => Ok(Container::Dds),
            other => Err(TextureError::UnsupportedOperation(format!(
                "unknown container '{}'",
                other
            ))),
        }
    }
}

impl fmt::Display for Container {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Container::Ktx => write!(f, "ktx"),
            Container::Dds => write!(f, "dds"),
        }
    }
}

/// Serialises a texture into a container format.
pub trait ContainerWriter: Send + Sync {
    /// Write the header and every mip of `levels` (one buffer per mip, each
    /// holding all slices in slice order).
    fn write(&self, stream: &mut dyn Write, desc: &ImageDesc, levels: &[Vec<u8>]) -> TextureResult<()>;

    fn container(&self) -> Container;
}

/// Read a container file into an encoded texture.
pub fn read_container(path: &Path) -> TextureResult<Texture> {
    let container = path
        .extension()
        .and_then(|e| e.to_str())
        .and_then(Container::from_extension)
        .ok_or_else(|| {
            TextureError::UndefinedFormat(format!("{} is not a container file", path.display()))
        })?;
    let bytes = std::fs::read(path).map_err(|e| TextureError::io(path, e))?;
    match container {
        Container::Dds => read_dds(&bytes),
        Container::Ktx => read_ktx(&bytes),
    }
}

/// Check that `levels` matches the shape in `desc`.
fn check_levels(desc: &ImageDesc, levels: &[Vec<u8>]) -> TextureResult<()> {
    desc.validate()?;
    if levels.len() != desc.mip_count as usize {
        return Err(TextureError::UndefinedFormat(format!(
            "descriptor has {} mips but {} levels were supplied",
            desc.mip_count,
            levels.len()
        )));
    }
    let layers = desc.layer_count() as usize;
    if let Some((i, level)) = levels.iter().enumerate().find(|(_, l)| l.len() % layers != 0) {
        return Err(TextureError::UndefinedFormat(format!(
            "mip {} holds {} bytes, not divisible into {} slices",
            i,
            level.len(),
            layers
        )));
    }
    Ok(())
}

/// Little-endian cursor over container bytes.
struct ByteReader<'a> {
    data: &'a [u8],
    pos: usize,
}

impl<'a> ByteReader<'a> {
    fn new(data: &'a [u8]) -> Self {
        Self { data, pos: 0 }
    }

    fn take(&mut self, len: usize) -> TextureResult<&'a [u8]> {
        let end = self.pos.checked_add(len).filter(|&e| e <= self.data.len());
        match end {
            Some(end) => {
                let slice = &self.data[self.pos..end];
                self.pos = end;
                Ok(slice)
            }
            None => Err(TextureError::Decode(format!(
                "container truncated: wanted {} bytes at offset {}, file has {}",
                len,
                self.pos,
                self.data.len()
            ))),
        }
    }

    fn u32(&mut self) -> TextureResult<u32> {
        let bytes = self.take(4)?;
        Ok(u32::from_le_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]))
    }

    fn skip(&mut self, len: usize) -> TextureResult<()> {
        self.take(len).map(|_| ())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use crate::format::{BcVariant, TextureFormat};

    #[test]
    fn test_container_parse() {
        assert_eq!("KTX".parse::<Container>().unwrap(), Container::Ktx);
        assert_eq!("1".parse::<Container>().unwrap(), Container::Dds);
        assert!("gnf".parse::<Container>().is_err());
        assert_eq!(Container::from_extension("DDS"), Some(Container::Dds));
        assert_eq!(Container::from_extension("png"), None);
    }

    #[test]
    fn test_supports_uncompressed_rgb() {
        use crate::format::{ColorSpace, ElementType, PixelFormat};

        let rgb = |element| {
            TextureFormat::Uncompressed(PixelFormat::new(element, 3, ColorSpace::Linear))
        };
        assert!(Container::Dds.supports(&rgb(ElementType::U8)));
        assert!(Container::Dds.supports(&rgb(ElementType::F32)));
        assert!(!Container::Dds.supports(&rgb(ElementType::U16)));
        assert!(Container::Ktx.supports(&rgb(ElementType::U16)));
    }

    #[test]
    fn test_writer_for_container() {
        assert_eq!(Container::Ktx.writer().container(), Container::Ktx);
        assert_eq!(Container::Dds.writer().container(), Container::Dds);
    }

    #[test]
    fn test_check_levels_counts_mips() {
        let desc = ImageDesc::new(4, 4, TextureFormat::bc(BcVariant::Bc1, false, false))
            .with_mip_count(2);
        let err = check_levels(&desc, &[vec![0; 8]]).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::UndefinedFormat);
        assert!(check_levels(&desc, &[vec![0; 8], vec![0; 8]]).is_ok());
    }

    #[test]
    fn test_byte_reader_truncation() {
        let mut reader = ByteReader::new(&[1, 0, 0, 0, 2]);
        assert_eq!(reader.u32().unwrap(), 1);
        let err = reader.u32().unwrap_err();
        assert_eq!(err.kind(), ErrorKind::DecodeError);
    }

    #[test]
    fn test_read_container_rejects_other_extensions() {
        let err = read_container(Path::new("texture.png")).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::UndefinedFormat);
    }
}
