//! Texbake - texture asset baking.
//!
//! Turns source rasters (PNG, TGA, HDR, ...) into GPU-ready textures:
//! mip chains (box filtered, or VMF filtered for normal/roughness pairs),
//! optional channel swizzling, BC1-7 or ASTC block compression, and DDS or
//! KTX containers.
//!
//! The [`pipeline`] module drives the stages; each stage is usable on its
//! own through its module.

pub mod compress;
pub mod config;
pub mod container;
pub mod error;
pub mod format;
pub mod logging;
pub mod mipmap;
pub mod pipeline;
pub mod swizzle;
pub mod texture;

pub use error::{ErrorKind, TextureError, TextureResult};
