//! 2×2 box downsampling with sRGB-aware averaging.

use rayon::prelude::*;

use crate::error::TextureResult;
use crate::format::ColorSpace;
use crate::texture::{full_mip_count, mip_extent, ImageDesc, PixelBuffer};

use super::MipGenerator;

fn srgb_to_linear(v: f32) -> f32 {
    if v <= 0.04045 {
        v / 12.92
    } else {
        ((v + 0.055) / 1.055).powf(2.4)
    }
}

fn linear_to_srgb(v: f32) -> f32 {
    if v <= 0.003_130_8 {
        v * 12.92
    } else {
        1.055 * v.powf(1.0 / 2.4) - 0.055
    }
}

/// Box-filter mip generator.
///
/// Each level averages the 2×2 footprint of the previous level, clamping at
/// the edges. For sRGB data the colour channels are averaged in linear space;
/// alpha is always averaged as stored.
#[derive(Debug, Clone, Copy, Default)]
pub struct BoxMipGenerator;

impl BoxMipGenerator {
    pub fn new() -> Self {
        Self
    }

    /// Halve one level to `dst_w`×`dst_h`.
    pub fn downsample(
        &self,
        src: &PixelBuffer,
        dst_w: u32,
        dst_h: u32,
        color_space: ColorSpace,
    ) -> TextureResult<PixelBuffer> {
        let channels = src.channels() as usize;
        let (src_w, src_h) = (src.width() as usize, src.height() as usize);
        let (dst_w_us, dst_h_us) = (dst_w as usize, dst_h as usize);
        let srgb = color_space == ColorSpace::Srgb;
        let has_alpha = channels == 2 || channels == 4;
        let is_color = |c: usize| srgb && !(has_alpha && c == channels - 1);

        let mut values = src.to_unit_floats();
        if srgb {
            for (i, v) in values.iter_mut().enumerate() {
                if is_color(i % channels) {
                    *v = srgb_to_linear(*v);
                }
            }
        }

        let src_layer = src_w * src_h * channels;
        let dst_row = dst_w_us * channels;
        let mut out = vec![0.0f32; dst_row * dst_h_us * src.layers() as usize];

        out.par_chunks_mut(dst_row)
            .enumerate()
            .for_each(|(row_index, row)| {
                let layer = row_index / dst_h_us;
                let y = row_index % dst_h_us;
                let base = &values[layer * src_layer..(layer + 1) * src_layer];
                let y0 = (2 * y).min(src_h - 1);
                let y1 = (2 * y + 1).min(src_h - 1);
                for x in 0..dst_w_us {
                    let x0 = (2 * x).min(src_w - 1);
                    let x1 = (2 * x + 1).min(src_w - 1);
                    for c in 0..channels {
                        let at = |sx: usize, sy: usize| base[(sy * src_w + sx) * channels + c];
                        let avg = (at(x0, y0) + at(x1, y0) + at(x0, y1) + at(x1, y1)) * 0.25;
                        row[x * channels + c] = if is_color(c) { linear_to_srgb(avg) } else { avg };
                    }
                }
            });

        PixelBuffer::from_unit_floats(
            src.element(),
            dst_w,
            dst_h,
            src.layers(),
            src.channels(),
            &out,
        )
    }
}

impl MipGenerator for BoxMipGenerator {
    fn generate(&self, desc: &mut ImageDesc, base: PixelBuffer) -> TextureResult<Vec<PixelBuffer>> {
        let color_space = if desc.format.is_srgb() {
            ColorSpace::Srgb
        } else {
            ColorSpace::Linear
        };
        let count = full_mip_count(desc.width, desc.height);
        let mut levels = Vec::with_capacity(count as usize);
        levels.push(base);
        for level in 1..count {
            let (w, h) = mip_extent(desc.width, desc.height, level);
            let next = self.downsample(&levels[level as usize - 1], w, h, color_space)?;
            levels.push(next);
        }
        desc.mip_count = count;
        Ok(levels)
    }

    fn name(&self) -> &str {
        "box"
    }
}
