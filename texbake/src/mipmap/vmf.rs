//! von Mises–Fisher filtering of combined normal and roughness maps.
//!
//! Each texel's normal is scaled by a factor derived from its roughness so
//! the vector length encodes lobe concentration. Averaging these lobes when
//! downsampling keeps that information: the direction of the filtered lobe is
//! the mip normal, its length is decoded back into roughness by the consumer.

use rayon::prelude::*;
use tracing::debug;

use crate::error::{TextureError, TextureResult};
use crate::texture::{full_mip_count, mip_extent, ImageDesc, PixelBuffer};

use super::MipGenerator;

/// Per-texel lobe vectors for mip 0.
#[derive(Debug, Clone, PartialEq)]
pub struct VmfLayer {
    width: u32,
    height: u32,
    lobes: Vec<[f32; 3]>,
}

impl VmfLayer {
    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn lobes(&self) -> &[[f32; 3]] {
        &self.lobes
    }
}

/// Length scale of the lobe for a roughness in [0, 1].
pub fn lobe_scale(roughness: f32) -> f32 {
    let inv_lambda = 0.5 * roughness * roughness;
    let coth_lambda = if inv_lambda > 0.1 {
        let exp2l = (-2.0 / inv_lambda).exp();
        (1.0 + exp2l) / (1.0 - exp2l)
    } else {
        1.0
    };
    coth_lambda - inv_lambda
}

/// Combine a normal map and a roughness map into lobe vectors.
///
/// The normal is read from the first three channels of `normal` and mapped
/// from [0, 1] to [-1, 1]; roughness is the first channel of `roughness`.
pub fn build_vmf_layer(normal: &PixelBuffer, roughness: &PixelBuffer) -> TextureResult<VmfLayer> {
    if normal.width() != roughness.width() || normal.height() != roughness.height() {
        return Err(TextureError::DimensionMismatch {
            expected: (normal.width(), normal.height()),
            actual: (roughness.width(), roughness.height()),
        });
    }
    if normal.channels() < 3 {
        return Err(TextureError::InsufficientChannels {
            required: 3,
            actual: normal.channels(),
        });
    }

    let n_channels = normal.channels() as usize;
    let r_channels = roughness.channels() as usize;
    let pixel_count = normal.width() as usize * normal.height() as usize;

    let lobes: Vec<[f32; 3]> = (0..pixel_count)
        .into_par_iter()
        .map(|i| {
            let n = i * n_channels;
            let scale = lobe_scale(roughness.unit_value(i * r_channels));
            [
                (normal.unit_value(n) * 2.0 - 1.0) * scale,
                (normal.unit_value(n + 1) * 2.0 - 1.0) * scale,
                (normal.unit_value(n + 2) * 2.0 - 1.0) * scale,
            ]
        })
        .collect();

    debug!(
        width = normal.width(),
        height = normal.height(),
        "Built VMF lobe layer"
    );
    Ok(VmfLayer {
        width: normal.width(),
        height: normal.height(),
        lobes,
    })
}

/// Linear interpolation weights of the two texels around `center`.
fn axis_taps(center: f32) -> (usize, usize, f32, f32) {
    let lo = center.floor();
    let hi = center.ceil();
    if hi == lo {
        (lo as usize, lo as usize, 1.0, 0.0)
    } else {
        (lo as usize, hi as usize, (hi - center) / (hi - lo), (center - lo) / (hi - lo))
    }
}

/// Bilinearly filter one lobe level down to `dst_w`×`dst_h`.
pub fn filter_lobes(
    src: &[[f32; 3]],
    src_w: u32,
    src_h: u32,
    dst_w: u32,
    dst_h: u32,
) -> Vec<[f32; 3]> {
    let (src_w, src_h) = (src_w as usize, src_h as usize);
    let dst_w = dst_w as usize;
    let mut out = vec![[0.0f32; 3]; dst_w * dst_h as usize];

    out.par_chunks_mut(dst_w).enumerate().for_each(|(y, row)| {
        let y_center = ((y * 2) as f32 + 0.5).clamp(0.0, src_h as f32 - 1.0);
        let (yl, yu, wyl, wyu) = axis_taps(y_center);
        for (x, texel) in row.iter_mut().enumerate() {
            let x_center = ((x * 2) as f32 + 0.5).clamp(0.0, src_w as f32 - 1.0);
            let (xl, xu, wxl, wxu) = axis_taps(x_center);
            let at = |sx: usize, sy: usize| src[sy * src_w + sx];
            for c in 0..3 {
                let top = at(xl, yl)[c] * wxl + at(xu, yl)[c] * wxu;
                let bottom = at(xl, yu)[c] * wxl + at(xu, yu)[c] * wxu;
                texel[c] = top * wyl + bottom * wyu;
            }
        }
    });
    out
}

fn normalize(v: [f32; 3]) -> [f32; 3] {
    let len = (v[0] * v[0] + v[1] * v[1] + v[2] * v[2]).sqrt();
    if len > 0.0 {
        [v[0] / len, v[1] / len, v[2] / len]
    } else {
        [0.0, 0.0, 1.0]
    }
}

/// Mip generator that filters lobe vectors instead of stored normals.
///
/// Level 0 is the loaded normal map unchanged. Every further level holds the
/// renormalised filtered lobe direction packed to [0, 1]; a fourth channel,
/// if present, is set to one.
#[derive(Debug, Clone)]
pub struct VmfMipGenerator {
    layer: VmfLayer,
}

impl VmfMipGenerator {
    pub fn new(layer: VmfLayer) -> Self {
        Self { layer }
    }
}

impl MipGenerator for VmfMipGenerator {
    fn generate(&self, desc: &mut ImageDesc, base: PixelBuffer) -> TextureResult<Vec<PixelBuffer>> {
        if base.channels() < 3 {
            return Err(TextureError::InsufficientChannels {
                required: 3,
                actual: base.channels(),
            });
        }
        if (self.layer.width, self.layer.height) != (desc.width, desc.height) {
            return Err(TextureError::DimensionMismatch {
                expected: (desc.width, desc.height),
                actual: (self.layer.width, self.layer.height),
            });
        }

        let channels = base.channels() as usize;
        let element = base.element();
        let count = full_mip_count(desc.width, desc.height);
        let mut levels = Vec::with_capacity(count as usize);
        levels.push(base);

        let mut lobes = self.layer.lobes.clone();
        let (mut prev_w, mut prev_h) = (desc.width, desc.height);
        for level in 1..count {
            let (w, h) = mip_extent(desc.width, desc.height, level);
            lobes = filter_lobes(&lobes, prev_w, prev_h, w, h);

            let mut values = Vec::with_capacity(lobes.len() * channels);
            for lobe in &lobes {
                let n = normalize(*lobe);
                values.extend(n.iter().map(|v| v * 0.5 + 0.5));
                values.extend(std::iter::repeat(1.0).take(channels - 3));
            }
            levels.push(PixelBuffer::from_unit_floats(
                element,
                w,
                h,
                1,
                channels as u8,
                &values,
            )?);
            (prev_w, prev_h) = (w, h);
        }

        desc.mip_count = count;
        Ok(levels)
    }

    fn name(&self) -> &str {
        "vmf"
    }
}
