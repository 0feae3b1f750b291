//! Mip chain generation.
//!
//! Two generators implement [`MipGenerator`]:
//!
//! - [`BoxMipGenerator`] averages 2×2 footprints, honouring sRGB.
//! - [`VmfMipGenerator`] filters von Mises–Fisher lobes built by
//!   [`build_vmf_layer`] from a normal map and a roughness map.
//!
//! Both produce the full chain down to 1×1 and update
//! [`ImageDesc::mip_count`](crate::texture::ImageDesc).

mod box_filter;
mod vmf;

pub use box_filter::BoxMipGenerator;
pub use vmf::{build_vmf_layer, filter_lobes, lobe_scale, VmfLayer, VmfMipGenerator};

use std::fmt;
use std::str::FromStr;

use crate::error::{TextureError, TextureResult};
use crate::texture::{ImageDesc, PixelBuffer};

/// How mips are produced for a texture that has only a base level.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MipMode {
    #[default]
    Default,
    None,
    /// VMF-filtered normal/roughness chain; needs a roughness input.
    Vmf,
}

impl FromStr for MipMode {
    type Err = TextureError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "default" | "box" => Ok(MipMode::Default),
            "none" => Ok(MipMode::None),
            "vmf" | "custom" => Ok(MipMode::Vmf),
            other => Err(TextureError::UnsupportedOperation(format!(
                "unknown mip mode '{}'",
                other
            ))),
        }
    }
}

impl fmt::Display for MipMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MipMode::Default => write!(f, "default"),
            MipMode::None => write!(f, "none"),
            MipMode::Vmf => write!(f, "vmf"),
        }
    }
}

/// Builds mip levels 1.. from level 0.
pub trait MipGenerator: Send + Sync {
    /// Return the full chain starting with `base`, setting
    /// `desc.mip_count`.
    fn generate(&self, desc: &mut ImageDesc, base: PixelBuffer) -> TextureResult<Vec<PixelBuffer>>;

    /// Short name for logging.
    fn name(&self) -> &str;
}
