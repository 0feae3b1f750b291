//! Block compression.
//!
//! [`BlockCompressor`] walks every mip and slice, lays the pixels out for the
//! codec, pads to whole blocks by border replication and hands the surface to
//! a [`BlockEncoder`]. Encoded bytes accumulate per mip level in a
//! [`CompressedMipSet`](crate::texture::CompressedMipSet).

mod compressor;
mod encoder;
mod padding;

pub use compressor::{out_of_range_peak, surface_bytes, BlockCompressor};
pub use encoder::{
    surface_bytes_per_pixel, validate_surface, BlockEncoder, EncodeSurface, IspcBlockEncoder,
};
pub use padding::{pad_to_blocks, pad_to_extent, padded_extent, PaddedSlice};
