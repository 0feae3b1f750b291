//! Texture shape description.

use crate::error::{TextureError, TextureResult};
use crate::format::TextureFormat;

/// Number of levels in a full chain down to 1×1.
pub fn full_mip_count(width: u32, height: u32) -> u32 {
    let largest = width.max(height).max(1);
    32 - largest.leading_zeros()
}

/// Extent of mip `level` for a base of `width`×`height`.
pub fn mip_extent(width: u32, height: u32, level: u32) -> (u32, u32) {
    (
        width.checked_shr(level).unwrap_or(0).max(1),
        height.checked_shr(level).unwrap_or(0).max(1),
    )
}

/// Shape and format of a texture.
///
/// For cube maps `array_size` counts faces (6 per cube); containers divide
/// by 6 on emission.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ImageDesc {
    pub width: u32,
    pub height: u32,
    pub depth: u32,
    pub array_size: u32,
    pub mip_count: u32,
    pub format: TextureFormat,
    pub cube: bool,
}

impl ImageDesc {
    /// Single 2D texture with one mip.
    pub fn new(width: u32, height: u32, format: TextureFormat) -> Self {
        Self {
            width,
            height,
            depth: 1,
            array_size: 1,
            mip_count: 1,
            format,
            cube: false,
        }
    }

    pub fn with_depth(mut self, depth: u32) -> Self {
        self.depth = depth;
        self
    }

    pub fn with_array_size(mut self, array_size: u32) -> Self {
        self.array_size = array_size;
        self
    }

    pub fn with_mip_count(mut self, mip_count: u32) -> Self {
        self.mip_count = mip_count;
        self
    }

    /// Mark as cube map(s); `array_size` must count faces.
    pub fn with_cube(mut self, cube: bool) -> Self {
        self.cube = cube;
        self
    }

    /// Check the shape invariants.
    pub fn validate(&self) -> TextureResult<()> {
        if self.width == 0 || self.height == 0 || self.depth == 0 {
            return Err(TextureError::UndefinedFormat(format!(
                "empty texture {}×{}×{}",
                self.width, self.height, self.depth
            )));
        }
        if self.mip_count == 0 || self.array_size == 0 {
            return Err(TextureError::UndefinedFormat(
                "mip count and array size must be at least 1".to_string(),
            ));
        }
        if self.cube && self.array_size % 6 != 0 {
            return Err(TextureError::UndefinedFormat(format!(
                "cube texture with {} faces",
                self.array_size
            )));
        }
        Ok(())
    }

    /// Slices stored per mip level.
    pub fn layer_count(&self) -> u32 {
        self.array_size * self.depth
    }

    /// Array size as containers report it (cubes, not faces).
    pub fn container_array_size(&self) -> u32 {
        if self.cube {
            self.array_size / 6
        } else {
            self.array_size
        }
    }

    pub fn mip_extent(&self, level: u32) -> (u32, u32) {
        mip_extent(self.width, self.height, level)
    }

    /// Byte size of mip `level` across all slices.
    pub fn level_size(&self, level: u32) -> usize {
        let (w, h) = self.mip_extent(level);
        self.format.surface_size(w, h) * self.layer_count() as usize
    }
}
