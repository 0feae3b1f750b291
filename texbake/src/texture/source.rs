//! Raster decoding through the `image` crate.

use std::path::Path;

use image::{ColorType, DynamicImage, ImageFormat};
use tracing::debug;

use crate::error::{TextureError, TextureResult};
use crate::format::{ElementType, PixelFormat, SourceInfo, TextureFormat};

use super::buffer::{PixelBuffer, PixelData};
use super::desc::ImageDesc;
use super::{Texture, TexturePayload};

/// Whether the `image` crate can decode files with this extension.
pub fn is_image_extension(ext: &str) -> bool {
    ImageFormat::from_extension(ext).is_some_and(|f| f.reading_enabled())
}

/// A decoded source image awaiting conversion to its load format.
#[derive(Debug)]
pub struct DecodedImage {
    image: DynamicImage,
    info: SourceInfo,
}

/// Decode an image file.
pub fn decode_file(path: &Path) -> TextureResult<DecodedImage> {
    let image = image::open(path).map_err(|e| match TextureError::from(e) {
        TextureError::Io { source, .. } => TextureError::io(path, source),
        TextureError::Decode(msg) => {
            TextureError::Decode(format!("{}: {}", path.display(), msg))
        }
        other => other,
    })?;
    let decoded = DecodedImage::from_image(image)?;
    debug!(
        path = %path.display(),
        width = decoded.width(),
        height = decoded.height(),
        channels = decoded.info.channels,
        "Decoded source image"
    );
    Ok(decoded)
}

impl DecodedImage {
    pub fn from_image(image: DynamicImage) -> TextureResult<Self> {
        let color = image.color();
        let element = match color {
            ColorType::L8 | ColorType::La8 | ColorType::Rgb8 | ColorType::Rgba8 => ElementType::U8,
            ColorType::L16 | ColorType::La16 | ColorType::Rgb16 | ColorType::Rgba16 => {
                ElementType::U16
            }
            ColorType::Rgb32F | ColorType::Rgba32F => ElementType::F32,
            other => {
                return Err(TextureError::Decode(format!(
                    "unsupported source colour type {:?}",
                    other
                )))
            }
        };
        let info = SourceInfo::new(color.channel_count(), element);
        Ok(Self { image, info })
    }

    pub fn info(&self) -> &SourceInfo {
        &self.info
    }

    pub fn width(&self) -> u32 {
        self.image.width()
    }

    pub fn height(&self) -> u32 {
        self.image.height()
    }

    /// Convert to the requested load layout.
    ///
    /// Two-channel layouts are luminance plus alpha; channels the source
    /// lacks are filled by the decoder's expansion rules.
    pub fn into_pixels(self, load: &PixelFormat) -> TextureResult<PixelBuffer> {
        let (width, height) = (self.image.width(), self.image.height());
        let img = self.image;
        let data = match (load.element, load.channels) {
            (ElementType::U8, 1) => PixelData::U8(img.to_luma8().into_raw()),
            (ElementType::U8, 2) => PixelData::U8(img.to_luma_alpha8().into_raw()),
            (ElementType::U8, 3) => PixelData::U8(img.to_rgb8().into_raw()),
            (ElementType::U8, 4) => PixelData::U8(img.to_rgba8().into_raw()),
            (ElementType::U16, 1) => PixelData::U16(img.to_luma16().into_raw()),
            (ElementType::U16, 2) => PixelData::U16(img.to_luma_alpha16().into_raw()),
            (ElementType::U16, 3) => PixelData::U16(img.to_rgb16().into_raw()),
            (ElementType::U16, 4) => PixelData::U16(img.to_rgba16().into_raw()),
            (ElementType::F32, 3) => PixelData::F32(img.to_rgb32f().into_raw()),
            (ElementType::F32, 4) => PixelData::F32(img.to_rgba32f().into_raw()),
            (ElementType::F32, 1) => PixelData::F32(
                img.to_rgba32f().pixels().map(|p| p.0[0]).collect(),
            ),
            (ElementType::F32, 2) => PixelData::F32(
                img.to_rgba32f()
                    .pixels()
                    .flat_map(|p| [p.0[0], p.0[3]])
                    .collect(),
            ),
            (_, channels) => {
                return Err(TextureError::UndefinedFormat(format!(
                    "cannot load {} channels",
                    channels
                )))
            }
        };
        PixelBuffer::new(width, height, 1, load.channels, data)
    }

    /// Convert to a single-mip texture in the load layout.
    pub fn into_texture(self, load: &PixelFormat) -> TextureResult<Texture> {
        let buffer = self.into_pixels(load)?;
        let desc = ImageDesc::new(
            buffer.width(),
            buffer.height(),
            TextureFormat::Uncompressed(*load),
        );
        Ok(Texture {
            desc,
            payload: TexturePayload::Pixels(vec![buffer]),
        })
    }
}
