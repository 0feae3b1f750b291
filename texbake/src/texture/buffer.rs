//! Uncompressed pixel storage for one mip level.

use crate::error::{TextureError, TextureResult};
use crate::format::{ColorSpace, ElementType, PixelFormat};

/// Channel values, tagged by element type.
#[derive(Debug, Clone, PartialEq)]
pub enum PixelData {
    U8(Vec<u8>),
    U16(Vec<u16>),
    F32(Vec<f32>),
}

impl PixelData {
    pub fn element(&self) -> ElementType {
        match self {
            PixelData::U8(_) => ElementType::U8,
            PixelData::U16(_) => ElementType::U16,
            PixelData::F32(_) => ElementType::F32,
        }
    }

    pub fn len(&self) -> usize {
        match self {
            PixelData::U8(v) => v.len(),
            PixelData::U16(v) => v.len(),
            PixelData::F32(v) => v.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// One mip level: every slice of the texture, slice-major, pixels
/// interleaved.
#[derive(Debug, Clone, PartialEq)]
pub struct PixelBuffer {
    width: u32,
    height: u32,
    layers: u32,
    channels: u8,
    data: PixelData,
}

impl PixelBuffer {
    /// Wrap pixel data, checking its length against the shape.
    pub fn new(
        width: u32,
        height: u32,
        layers: u32,
        channels: u8,
        data: PixelData,
    ) -> TextureResult<Self> {
        let expected = width as usize * height as usize * layers as usize * channels as usize;
        if data.len() != expected {
            return Err(TextureError::UndefinedFormat(format!(
                "pixel buffer holds {} values, {}×{}×{} with {} channels needs {}",
                data.len(),
                width,
                height,
                layers,
                channels,
                expected
            )));
        }
        Ok(Self {
            width,
            height,
            layers,
            channels,
            data,
        })
    }

    /// Build a buffer from normalised values.
    ///
    /// Integer element types clamp to [0, 1] and round; `F32` stores the
    /// values unchanged.
    pub fn from_unit_floats(
        element: ElementType,
        width: u32,
        height: u32,
        layers: u32,
        channels: u8,
        values: &[f32],
    ) -> TextureResult<Self> {
        let data = match element {
            ElementType::U8 => PixelData::U8(
                values
                    .iter()
                    .map(|v| (v.clamp(0.0, 1.0) * 255.0 + 0.5) as u8)
                    .collect(),
            ),
            ElementType::U16 => PixelData::U16(
                values
                    .iter()
                    .map(|v| (v.clamp(0.0, 1.0) * 65535.0 + 0.5) as u16)
                    .collect(),
            ),
            ElementType::F32 => PixelData::F32(values.to_vec()),
        };
        Self::new(width, height, layers, channels, data)
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn layers(&self) -> u32 {
        self.layers
    }

    pub fn channels(&self) -> u8 {
        self.channels
    }

    pub fn element(&self) -> ElementType {
        self.data.element()
    }

    pub fn data(&self) -> &PixelData {
        &self.data
    }

    pub fn into_data(self) -> PixelData {
        self.data
    }

    pub fn format(&self, color_space: ColorSpace) -> PixelFormat {
        PixelFormat::new(self.element(), self.channels, color_space)
    }

    /// Values per slice.
    pub fn layer_len(&self) -> usize {
        self.width as usize * self.height as usize * self.channels as usize
    }

    pub fn byte_size(&self) -> usize {
        self.data.len() * self.element().size()
    }

    /// Normalised value of one channel; integers map to [0, 1].
    pub fn unit_value(&self, index: usize) -> f32 {
        match &self.data {
            PixelData::U8(v) => v[index] as f32 / 255.0,
            PixelData::U16(v) => v[index] as f32 / 65535.0,
            PixelData::F32(v) => v[index],
        }
    }

    /// All values normalised, see [`PixelBuffer::unit_value`].
    pub fn to_unit_floats(&self) -> Vec<f32> {
        match &self.data {
            PixelData::U8(v) => v.iter().map(|&x| x as f32 / 255.0).collect(),
            PixelData::U16(v) => v.iter().map(|&x| x as f32 / 65535.0).collect(),
            PixelData::F32(v) => v.clone(),
        }
    }

    /// Raw little-endian bytes as written to a container.
    pub fn to_le_bytes(&self) -> Vec<u8> {
        match &self.data {
            PixelData::U8(v) => v.clone(),
            PixelData::U16(v) => v.iter().flat_map(|x| x.to_le_bytes()).collect(),
            PixelData::F32(v) => v.iter().flat_map(|x| x.to_le_bytes()).collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_checks_length() {
        let err = PixelBuffer::new(2, 2, 1, 4, PixelData::U8(vec![0; 15])).unwrap_err();
        assert!(err.to_string().contains("needs 16"));
        assert!(PixelBuffer::new(2, 2, 1, 4, PixelData::U8(vec![0; 16])).is_ok());
    }

    #[test]
    fn test_byte_size_per_element() {
        let buf = PixelBuffer::new(2, 1, 1, 3, PixelData::U16(vec![0; 6])).unwrap();
        assert_eq!(buf.byte_size(), 12);
        assert_eq!(buf.layer_len(), 6);
        assert_eq!(buf.to_le_bytes().len(), 12);
    }

    #[test]
    fn test_unit_round_trip_u8() {
        let values = [0.0, 0.5, 1.0, 1.5];
        let buf = PixelBuffer::from_unit_floats(ElementType::U8, 1, 1, 1, 4, &values).unwrap();
        assert_eq!(buf.data(), &PixelData::U8(vec![0, 128, 255, 255]));
        assert!((buf.unit_value(1) - 128.0 / 255.0).abs() < 1e-6);
    }

    #[test]
    fn test_f32_values_are_not_clamped() {
        let buf = PixelBuffer::from_unit_floats(ElementType::F32, 1, 1, 1, 1, &[4.5]).unwrap();
        assert_eq!(buf.unit_value(0), 4.5);
    }

    #[test]
    fn test_u16_le_bytes() {
        let buf = PixelBuffer::new(1, 1, 1, 1, PixelData::U16(vec![0x1234])).unwrap();
        assert_eq!(buf.to_le_bytes(), vec![0x34, 0x12]);
    }
}
