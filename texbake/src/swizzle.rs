//! Per-pixel channel remapping.
//!
//! A [`ChannelSwizzle`] is four selectors, one per output channel. The
//! output is always four channels, whatever the input channel count.
//!
//! | Selector        | Output value                         |
//! |-----------------|--------------------------------------|
//! | `r g b a`/`x y z w` | source channel 0..3              |
//! | `i j k l`       | complement of source channel 0..3    |
//! | `0`             | zero                                 |
//! | `1`             | the element type's one               |
//!
//! Complement is `255 - v` for u8 and `65535 - v` for u16. Floats have no
//! complement; inverted selectors pass the value through.

use std::fmt;
use std::str::FromStr;

use tracing::debug;

use crate::error::{TextureError, TextureResult};
use crate::format::{PixelFormat, TextureFormat};
use crate::texture::{PixelBuffer, PixelData, Texture, TexturePayload};

/// Source of one output channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ChannelSelector {
    Channel(u8),
    Inverted(u8),
    Zero,
    One,
}

impl ChannelSelector {
    fn from_char(c: char) -> Option<Self> {
        let selector = match c.to_ascii_lowercase() {
            'r' | 'x' => ChannelSelector::Channel(0),
            'g' | 'y' => ChannelSelector::Channel(1),
            'b' | 'z' => ChannelSelector::Channel(2),
            'a' | 'w' => ChannelSelector::Channel(3),
            'i' => ChannelSelector::Inverted(0),
            'j' => ChannelSelector::Inverted(1),
            'k' => ChannelSelector::Inverted(2),
            'l' => ChannelSelector::Inverted(3),
            '0' => ChannelSelector::Zero,
            '1' => ChannelSelector::One,
            _ => return None,
        };
        Some(selector)
    }

    fn as_char(self) -> char {
        match self {
            ChannelSelector::Channel(c) => ['r', 'g', 'b', 'a'][c as usize & 3],
            ChannelSelector::Inverted(c) => ['i', 'j', 'k', 'l'][c as usize & 3],
            ChannelSelector::Zero => '0',
            ChannelSelector::One => '1',
        }
    }
}

/// Four channel selectors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ChannelSwizzle([ChannelSelector; 4]);

impl ChannelSwizzle {
    pub fn new(selectors: [ChannelSelector; 4]) -> Self {
        Self(selectors)
    }

    pub fn identity() -> Self {
        Self([
            ChannelSelector::Channel(0),
            ChannelSelector::Channel(1),
            ChannelSelector::Channel(2),
            ChannelSelector::Channel(3),
        ])
    }

    pub fn selectors(&self) -> &[ChannelSelector; 4] {
        &self.0
    }
}

impl FromStr for ChannelSwizzle {
    type Err = TextureError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let chars: Vec<char> = s.trim().chars().collect();
        if chars.len() != 4 {
            return Err(TextureError::UndefinedFormat(format!(
                "swizzle '{}' must have exactly 4 selectors",
                s
            )));
        }
        let mut selectors = [ChannelSelector::Zero; 4];
        for (slot, c) in selectors.iter_mut().zip(chars) {
            *slot = ChannelSelector::from_char(c).ok_or_else(|| {
                TextureError::UndefinedFormat(format!("invalid swizzle selector '{}' in '{}'", c, s))
            })?;
        }
        Ok(Self(selectors))
    }
}

impl fmt::Display for ChannelSwizzle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for selector in self.0 {
            write!(f, "{}", selector.as_char())?;
        }
        Ok(())
    }
}

trait Element: Copy {
    const ZERO: Self;
    const ONE: Self;
    fn complement(self) -> Self;
}

impl Element for u8 {
    const ZERO: Self = 0;
    const ONE: Self = u8::MAX;
    fn complement(self) -> Self {
        u8::MAX - self
    }
}

impl Element for u16 {
    const ZERO: Self = 0;
    const ONE: Self = u16::MAX;
    fn complement(self) -> Self {
        u16::MAX - self
    }
}

impl Element for f32 {
    const ZERO: Self = 0.0;
    const ONE: Self = 1.0;
    fn complement(self) -> Self {
        self
    }
}

fn swizzle_values<T: Element>(src: &[T], channels: usize, swizzle: &ChannelSwizzle) -> Vec<T> {
    let read = |pixel: &[T], c: u8| -> T {
        match pixel.get(c as usize) {
            Some(v) => *v,
            None if c == 3 => T::ONE,
            None => T::ZERO,
        }
    };

    let mut out = Vec::with_capacity(src.len() / channels.max(1) * 4);
    for pixel in src.chunks_exact(channels) {
        for selector in swizzle.0 {
            let value = match selector {
                ChannelSelector::Channel(c) => read(pixel, c),
                ChannelSelector::Inverted(c) => read(pixel, c).complement(),
                ChannelSelector::Zero => T::ZERO,
                ChannelSelector::One => T::ONE,
            };
            out.push(value);
        }
    }
    out
}

/// Swizzle one buffer into a new 4-channel buffer.
pub fn swizzle_buffer(buffer: &PixelBuffer, swizzle: &ChannelSwizzle) -> TextureResult<PixelBuffer> {
    let channels = buffer.channels() as usize;
    let data = match buffer.data() {
        PixelData::U8(v) => PixelData::U8(swizzle_values(v, channels, swizzle)),
        PixelData::U16(v) => PixelData::U16(swizzle_values(v, channels, swizzle)),
        PixelData::F32(v) => PixelData::F32(swizzle_values(v, channels, swizzle)),
    };
    PixelBuffer::new(buffer.width(), buffer.height(), buffer.layers(), 4, data)
}

/// Swizzle every mip of an uncompressed texture in place.
pub fn swizzle(texture: &mut Texture, swizzle: &ChannelSwizzle) -> TextureResult<()> {
    let levels = match &mut texture.payload {
        TexturePayload::Pixels(levels) => levels,
        TexturePayload::Blocks(_) => {
            return Err(TextureError::UnsupportedOperation(
                "cannot swizzle a block-compressed texture".to_string(),
            ))
        }
    };

    for level in levels.iter_mut() {
        *level = swizzle_buffer(level, swizzle)?;
    }

    if let TextureFormat::Uncompressed(pf) = texture.desc.format {
        texture.desc.format =
            TextureFormat::Uncompressed(PixelFormat::new(pf.element, 4, pf.color_space));
    }
    debug!(swizzle = %swizzle, "Applied channel swizzle");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use crate::format::{BcVariant, ElementType};
    use crate::texture::{CompressedMipSet, ImageDesc};
    use proptest::prelude::*;

    fn rgba8(pixels: Vec<u8>) -> PixelBuffer {
        let count = (pixels.len() / 4) as u32;
        PixelBuffer::new(count, 1, 1, 4, PixelData::U8(pixels)).unwrap()
    }

    #[test]
    fn test_parse_and_display() {
        let sw: ChannelSwizzle = "xyz1".parse().unwrap();
        assert_eq!(sw.to_string(), "rgb1");
        assert_eq!(
            sw.selectors()[3],
            ChannelSelector::One
        );
        assert!("rgb".parse::<ChannelSwizzle>().is_err());
        assert!("rgbq".parse::<ChannelSwizzle>().is_err());
    }

    #[test]
    fn test_identity_is_noop_for_rgba() {
        let buf = rgba8(vec![1, 2, 3, 4, 5, 6, 7, 8]);
        let out = swizzle_buffer(&buf, &ChannelSwizzle::identity()).unwrap();
        assert_eq!(out, buf);
    }

    #[test]
    fn test_reorder_and_invert_u8() {
        let buf = rgba8(vec![10, 20, 30, 40]);
        let sw: ChannelSwizzle = "bi01".parse().unwrap();
        let out = swizzle_buffer(&buf, &sw).unwrap();
        assert_eq!(out.data(), &PixelData::U8(vec![30, 245, 0, 255]));
    }

    #[test]
    fn test_invert_u16() {
        let buf = PixelBuffer::new(1, 1, 1, 1, PixelData::U16(vec![1000])).unwrap();
        let out = swizzle_buffer(&buf, &"iiii".parse().unwrap()).unwrap();
        assert_eq!(out.data(), &PixelData::U16(vec![64535; 4]));
    }

    #[test]
    fn test_float_inversion_passes_through() {
        let buf = PixelBuffer::new(1, 1, 1, 2, PixelData::F32(vec![0.25, 2.0])).unwrap();
        let out = swizzle_buffer(&buf, &"ij01".parse().unwrap()).unwrap();
        assert_eq!(out.data(), &PixelData::F32(vec![0.25, 2.0, 0.0, 1.0]));
    }

    #[test]
    fn test_missing_channels_read_as_defaults() {
        let buf = PixelBuffer::new(1, 1, 1, 2, PixelData::U8(vec![7, 9])).unwrap();
        let out = swizzle_buffer(&buf, &ChannelSwizzle::identity()).unwrap();
        assert_eq!(out.data(), &PixelData::U8(vec![7, 9, 0, 255]));
    }

    #[test]
    fn test_swizzle_texture_updates_format() {
        let buf = PixelBuffer::new(2, 2, 1, 3, PixelData::U8(vec![0; 12])).unwrap();
        let mut tex = Texture {
            desc: ImageDesc::new(
                2,
                2,
                TextureFormat::Uncompressed(buf.format(crate::format::ColorSpace::Linear)),
            ),
            payload: TexturePayload::Pixels(vec![buf]),
        };
        swizzle(&mut tex, &"rgb1".parse().unwrap()).unwrap();
        match tex.desc.format {
            TextureFormat::Uncompressed(pf) => {
                assert_eq!(pf.channels, 4);
                assert_eq!(pf.element, ElementType::U8);
            }
            other => panic!("unexpected format {}", other),
        }
        assert_eq!(tex.pixels().unwrap()[0].byte_size(), 16);
    }

    #[test]
    fn test_swizzle_compressed_texture_fails() {
        let mut tex = Texture {
            desc: ImageDesc::new(4, 4, TextureFormat::bc(BcVariant::Bc7, false, false)),
            payload: TexturePayload::Blocks(CompressedMipSet::from_levels(vec![vec![0; 16]])),
        };
        let err = swizzle(&mut tex, &ChannelSwizzle::identity()).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::UnsupportedOperation);
    }

    fn selector_strategy() -> impl Strategy<Value = ChannelSelector> {
        prop_oneof![
            (0u8..4).prop_map(ChannelSelector::Channel),
            (0u8..4).prop_map(ChannelSelector::Inverted),
            Just(ChannelSelector::Zero),
            Just(ChannelSelector::One),
        ]
    }

    proptest! {
        #[test]
        fn prop_swizzle_output_is_determined_by_selector(
            selectors in prop::array::uniform4(selector_strategy()),
            channels in 1u8..=4,
            pixels in prop::collection::vec(any::<u8>(), 1..16),
        ) {
            let values: Vec<u8> = pixels
                .iter()
                .flat_map(|p| std::iter::repeat(*p).take(channels as usize))
                .enumerate()
                .map(|(i, p)| p.wrapping_add(i as u8))
                .collect();
            let buf = PixelBuffer::new(pixels.len() as u32, 1, 1, channels, PixelData::U8(values.clone())).unwrap();
            let sw = ChannelSwizzle::new(selectors);
            let out = swizzle_buffer(&buf, &sw).unwrap();
            let PixelData::U8(out) = out.data() else { panic!("element changed") };
            prop_assert_eq!(out.len(), pixels.len() * 4);

            for (px, chunk) in out.chunks_exact(4).enumerate() {
                let src = &values[px * channels as usize..(px + 1) * channels as usize];
                for (slot, selector) in selectors.iter().enumerate() {
                    let read = |c: u8| src.get(c as usize).copied().unwrap_or(if c == 3 { 255 } else { 0 });
                    let expected = match selector {
                        ChannelSelector::Channel(c) => read(*c),
                        ChannelSelector::Inverted(c) => 255 - read(*c),
                        ChannelSelector::Zero => 0,
                        ChannelSelector::One => 255,
                    };
                    prop_assert_eq!(chunk[slot], expected);
                }
            }
        }

        #[test]
        fn prop_swizzle_f32_always_four_channels(
            selectors in prop::array::uniform4(selector_strategy()),
            channels in 1u8..=4,
        ) {
            let buf = PixelBuffer::new(3, 1, 1, channels, PixelData::F32(vec![0.5; 3 * channels as usize])).unwrap();
            let out = swizzle_buffer(&buf, &ChannelSwizzle::new(selectors)).unwrap();
            prop_assert_eq!(out.channels(), 4);
            prop_assert_eq!(out.data().len(), 12);
        }
    }
}
