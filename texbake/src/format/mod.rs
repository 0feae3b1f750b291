//! Texture format model and format resolution.
//!
//! [`TextureFormat`] is a tagged enum over uncompressed pixel layouts and the
//! BC and ASTC block formats. [`resolve`] maps a compression request and the
//! decoder's description of a source to the format the source is loaded in
//! and the format it is written as.

mod codec;
mod resolver;
mod types;

pub use codec::{BlockCodec, CompressionFamily, CompressionRequest};
pub use resolver::{
    default_astc_block, default_bc_variant, resolve, ResolvedFormat, SourceInfo,
};
pub use types::{
    AstcBlock, AstcKind, BcVariant, ColorSpace, ElementType, PixelFormat, TextureFormat,
};
