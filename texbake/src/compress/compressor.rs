//! Per-mip, per-slice block compression.

use std::borrow::Cow;

use half::f16;
use tracing::{debug, info, warn};

use crate::error::{TextureError, TextureResult};
use crate::format::{BlockCodec, TextureFormat};
use crate::texture::{
    mip_extent, CompressedMipSet, ImageDesc, PixelBuffer, PixelData, Texture, TexturePayload,
};

use super::encoder::{surface_bytes_per_pixel, BlockEncoder, EncodeSurface};
use super::padding::{pad_to_extent, padded_extent};

/// Lay out one slice the way the encoder expects for `codec`.
///
/// BC4 and BC5 keep only the first one or two channels; RGBA codecs fill
/// missing channels with 0 (alpha with 1). BC6H gets half floats.
pub fn surface_bytes(buffer: &PixelBuffer, layer: usize, codec: BlockCodec) -> Cow<'_, [u8]> {
    let channels = buffer.channels() as usize;
    let start = layer * buffer.layer_len();
    let end = start + buffer.layer_len();
    let pixel_count = buffer.width() as usize * buffer.height() as usize;
    let default_value = |c: usize| if c == 3 { 1.0f32 } else { 0.0 };

    if codec.is_hdr() {
        let mut out = Vec::with_capacity(pixel_count * 8);
        for px in 0..pixel_count {
            for c in 0..4 {
                let v = if c < channels {
                    buffer.unit_value(start + px * channels + c)
                } else {
                    default_value(c)
                };
                out.extend_from_slice(&f16::from_f32(v).to_le_bytes());
            }
        }
        return Cow::Owned(out);
    }

    let required = codec.required_channels() as usize;
    match buffer.data() {
        PixelData::U8(values) if channels == required => Cow::Borrowed(&values[start..end]),
        PixelData::U8(values) => {
            let mut out = Vec::with_capacity(pixel_count * required);
            for pixel in values[start..end].chunks_exact(channels) {
                for c in 0..required {
                    out.push(match pixel.get(c) {
                        Some(v) => *v,
                        None if c == 3 => u8::MAX,
                        None => 0,
                    });
                }
            }
            Cow::Owned(out)
        }
        _ => {
            let mut out = Vec::with_capacity(pixel_count * required);
            for px in 0..pixel_count {
                for c in 0..required {
                    let v = if c < channels {
                        buffer.unit_value(start + px * channels + c)
                    } else {
                        default_value(c)
                    };
                    out.push((v.clamp(0.0, 1.0) * 255.0 + 0.5) as u8);
                }
            }
            Cow::Owned(out)
        }
    }
}

/// Drives a [`BlockEncoder`] over every slice of every mip.
#[derive(Debug, Clone)]
pub struct BlockCompressor<E> {
    encoder: E,
}

impl<E: BlockEncoder> BlockCompressor<E> {
    pub fn new(encoder: E) -> Self {
        Self { encoder }
    }

    pub fn encoder(&self) -> &E {
        &self.encoder
    }

    /// Compress an uncompressed texture in place.
    ///
    /// The pixel buffers are consumed; on success the payload holds the
    /// encoded mips and `desc.format` is `target`.
    pub fn compress(
        &self,
        texture: &mut Texture,
        codec: BlockCodec,
        target: TextureFormat,
    ) -> TextureResult<()> {
        let levels = match std::mem::replace(&mut texture.payload, TexturePayload::Pixels(Vec::new()))
        {
            TexturePayload::Pixels(levels) => levels,
            blocks @ TexturePayload::Blocks(_) => {
                texture.payload = blocks;
                return Err(TextureError::UnsupportedOperation(
                    "texture is already block-compressed".to_string(),
                ));
            }
        };
        let set = self.compress_levels(&mut texture.desc, levels, codec)?;
        texture.desc.format = target;
        texture.payload = TexturePayload::Blocks(set);
        Ok(())
    }

    /// Compress mip levels, padding each slice to whole blocks.
    ///
    /// Mip 0 is padded to the next block multiple and that extent is written
    /// back into `desc`. Every higher level is padded to the block-rounded
    /// extent readers derive from the padded base, so level sizes always
    /// follow `desc`.
    pub fn compress_levels(
        &self,
        desc: &mut ImageDesc,
        levels: Vec<PixelBuffer>,
        codec: BlockCodec,
    ) -> TextureResult<CompressedMipSet> {
        let (bw, bh) = codec.block_dims();
        let bpp = surface_bytes_per_pixel(codec);
        let mut set = CompressedMipSet::new();
        let Some(base) = levels.first() else {
            return Ok(set);
        };
        let base_extent = (padded_extent(base.width(), bw), padded_extent(base.height(), bh));
        let mut clamped_peak: Option<f32> = None;

        for (level, buffer) in levels.into_iter().enumerate() {
            let (w, h) = mip_extent(base_extent.0, base_extent.1, level as u32);
            let target = (padded_extent(w, bw), padded_extent(h, bh));
            let has_alpha = buffer.channels() > 3;
            for layer in 0..buffer.layers() as usize {
                if !codec.is_hdr() {
                    if let Some(peak) = out_of_range_peak(&buffer, layer) {
                        clamped_peak = Some(clamped_peak.map_or(peak, |p| p.max(peak)));
                    }
                }
                let bytes = surface_bytes(&buffer, layer, codec);
                let padded = pad_to_extent(&bytes, buffer.width(), buffer.height(), bpp, target);
                let surface = EncodeSurface {
                    data: &padded.data,
                    width: padded.width,
                    height: padded.height,
                    stride: padded.width * bpp as u32,
                };
                let encoded = self.encoder.encode(codec, &surface, has_alpha)?;
                let expected = codec.compressed_size(padded.width, padded.height);
                if encoded.len() != expected {
                    return Err(TextureError::UnsupportedOperation(format!(
                        "{} encoder produced {} bytes for mip {}, expected {}",
                        self.encoder.name(),
                        encoded.len(),
                        level,
                        expected
                    )));
                }
                set.append(level, &encoded);
            }
            debug!(
                level,
                width = buffer.width(),
                height = buffer.height(),
                bytes = set.level(level).map_or(0, <[u8]>::len),
                "Compressed mip level"
            );
        }

        if let Some(peak) = clamped_peak {
            warn!(
                peak,
                codec = ?codec,
                "HDR values above 1.0 clamped to the LDR range for encoding"
            );
        }
        if base_extent != (desc.width, desc.height) {
            info!(
                from_width = desc.width,
                from_height = desc.height,
                width = base_extent.0,
                height = base_extent.1,
                "Padded base level to block multiple"
            );
        }
        desc.width = base_extent.0;
        desc.height = base_extent.1;
        Ok(set)
    }
}

/// Largest float sample above 1.0 in one slice, if any.
///
/// LDR codecs see such values clamped to 1.
pub fn out_of_range_peak(buffer: &PixelBuffer, layer: usize) -> Option<f32> {
    let PixelData::F32(values) = buffer.data() else {
        return None;
    };
    let start = layer * buffer.layer_len();
    values[start..start + buffer.layer_len()]
        .iter()
        .copied()
        .filter(|v| *v > 1.0)
        .reduce(f32::max)
}
