//! In-memory texture model.
//!
//! A [`Texture`] is an [`ImageDesc`] plus its payload, which is either one
//! uncompressed [`PixelBuffer`] per mip or a [`CompressedMipSet`]. Stages
//! take the texture by value or `&mut` and replace the payload; the previous
//! buffers are dropped as soon as the next stage has consumed them.

mod buffer;
mod desc;
mod source;

pub use buffer::{PixelBuffer, PixelData};
pub use desc::{full_mip_count, mip_extent, ImageDesc};
pub use source::{decode_file, is_image_extension, DecodedImage};

use crate::error::{TextureError, TextureResult};

/// Per-mip encoded bytes, each level holding every slice in slice order.
///
/// Levels grow as slices are appended; read sizes from [`sizes`] rather
/// than assuming a per-slice stride.
///
/// [`sizes`]: CompressedMipSet::sizes
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CompressedMipSet {
    levels: Vec<Vec<u8>>,
}

impl CompressedMipSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_levels(levels: Vec<Vec<u8>>) -> Self {
        Self { levels }
    }

    /// Append encoded bytes to `level`, creating it if needed.
    pub fn append(&mut self, level: usize, bytes: &[u8]) {
        if self.levels.len() <= level {
            self.levels.resize_with(level + 1, Vec::new);
        }
        self.levels[level].extend_from_slice(bytes);
    }

    pub fn level(&self, level: usize) -> Option<&[u8]> {
        self.levels.get(level).map(Vec::as_slice)
    }

    pub fn levels(&self) -> &[Vec<u8>] {
        &self.levels
    }

    pub fn sizes(&self) -> Vec<usize> {
        self.levels.iter().map(Vec::len).collect()
    }

    pub fn len(&self) -> usize {
        self.levels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.levels.is_empty()
    }
}

/// Texture data in whichever form the last stage left it.
#[derive(Debug, Clone, PartialEq)]
pub enum TexturePayload {
    /// Uncompressed, one buffer per mip.
    Pixels(Vec<PixelBuffer>),
    /// Encoded bytes, either from the block compressor or read from a
    /// container file as-is.
    Blocks(CompressedMipSet),
}

/// A texture moving through the pipeline.
#[derive(Debug, Clone, PartialEq)]
pub struct Texture {
    pub desc: ImageDesc,
    pub payload: TexturePayload,
}

impl Texture {
    pub fn is_compressed(&self) -> bool {
        matches!(self.payload, TexturePayload::Blocks(_))
    }

    /// Pixel buffers, or `UnsupportedOperation` for an encoded payload.
    pub fn pixels(&self) -> TextureResult<&[PixelBuffer]> {
        match &self.payload {
            TexturePayload::Pixels(levels) => Ok(levels),
            TexturePayload::Blocks(_) => Err(TextureError::UnsupportedOperation(
                "texture data is already encoded".to_string(),
            )),
        }
    }

    /// Bytes of every mip as a container stores them.
    pub fn level_bytes(&self) -> Vec<Vec<u8>> {
        match &self.payload {
            TexturePayload::Pixels(levels) => levels.iter().map(PixelBuffer::to_le_bytes).collect(),
            TexturePayload::Blocks(set) => set.levels().to_vec(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use crate::format::{BcVariant, TextureFormat};

    #[test]
    fn test_mip_set_grows_per_slice() {
        let mut set = CompressedMipSet::new();
        set.append(0, &[1, 2, 3]);
        set.append(0, &[4, 5]);
        set.append(2, &[9]);
        assert_eq!(set.sizes(), vec![5, 0, 1]);
        assert_eq!(set.level(0), Some(&[1, 2, 3, 4, 5][..]));
        assert_eq!(set.level(3), None);
    }

    #[test]
    fn test_pixels_on_encoded_payload_fails() {
        let tex = Texture {
            desc: ImageDesc::new(4, 4, TextureFormat::bc(BcVariant::Bc1, false, false)),
            payload: TexturePayload::Blocks(CompressedMipSet::from_levels(vec![vec![0; 8]])),
        };
        assert!(tex.is_compressed());
        assert_eq!(tex.pixels().unwrap_err().kind(), ErrorKind::UnsupportedOperation);
        assert_eq!(tex.level_bytes(), vec![vec![0; 8]]);
    }
}
