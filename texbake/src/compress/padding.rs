//! Border-replicating padding to block multiples.

use std::borrow::Cow;

/// Smallest multiple of `block` that is at least `extent`.
pub fn padded_extent(extent: u32, block: u32) -> u32 {
    extent.div_ceil(block) * block
}

/// A slice padded to whole blocks.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PaddedSlice<'a> {
    pub data: Cow<'a, [u8]>,
    pub width: u32,
    pub height: u32,
}

/// Pad a tightly packed slice so both dimensions are block multiples.
///
/// The pad region repeats the last column and the last row outward, so the
/// encoder never sees a hard edge against zeros. Already aligned input is
/// borrowed unchanged.
pub fn pad_to_blocks(
    data: &[u8],
    width: u32,
    height: u32,
    bytes_per_pixel: usize,
    block: (u32, u32),
) -> PaddedSlice<'_> {
    let target = (padded_extent(width, block.0), padded_extent(height, block.1));
    pad_to_extent(data, width, height, bytes_per_pixel, target)
}

/// Pad a tightly packed slice out to `target` by border replication.
///
/// A target smaller than the slice in either dimension is raised to the
/// slice's own extent.
pub fn pad_to_extent(
    data: &[u8],
    width: u32,
    height: u32,
    bytes_per_pixel: usize,
    target: (u32, u32),
) -> PaddedSlice<'_> {
    let padded_w = target.0.max(width);
    let padded_h = target.1.max(height);
    if padded_w == width && padded_h == height {
        return PaddedSlice {
            data: Cow::Borrowed(data),
            width,
            height,
        };
    }

    let src_row = width as usize * bytes_per_pixel;
    let dst_row = padded_w as usize * bytes_per_pixel;
    let mut out = Vec::with_capacity(dst_row * padded_h as usize);
    for y in 0..padded_h as usize {
        let sy = y.min(height as usize - 1);
        let row = &data[sy * src_row..(sy + 1) * src_row];
        out.extend_from_slice(row);
        let edge = &row[src_row - bytes_per_pixel..];
        for _ in width..padded_w {
            out.extend_from_slice(edge);
        }
    }

    PaddedSlice {
        data: Cow::Owned(out),
        width: padded_w,
        height: padded_h,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_padded_extent() {
        assert_eq!(padded_extent(130, 6), 132);
        assert_eq!(padded_extent(128, 4), 128);
        assert_eq!(padded_extent(1, 4), 4);
        assert_eq!(padded_extent(9, 8), 16);
    }

    #[test]
    fn test_aligned_input_is_borrowed() {
        let data = vec![1u8; 4 * 4];
        let padded = pad_to_blocks(&data, 4, 4, 1, (4, 4));
        assert!(matches!(padded.data, Cow::Borrowed(_)));
    }

    #[test]
    fn test_border_replication() {
        // 2×2, one byte per pixel:
        // 1 2
        // 3 4
        let data = [1u8, 2, 3, 4];
        let padded = pad_to_blocks(&data, 2, 2, 1, (4, 4));
        assert_eq!((padded.width, padded.height), (4, 4));
        assert_eq!(
            padded.data.as_ref(),
            &[
                1, 2, 2, 2, //
                3, 4, 4, 4, //
                3, 4, 4, 4, //
                3, 4, 4, 4,
            ]
        );
    }

    #[test]
    fn test_pad_to_extent_beyond_block_multiple() {
        // 4×4 mip of an 18×18 base padded to 20×20: 5×5 rounds to 8×8
        let data = vec![7u8; 4 * 4];
        let padded = pad_to_extent(&data, 4, 4, 1, (8, 8));
        assert_eq!((padded.width, padded.height), (8, 8));
        assert!(padded.data.iter().all(|&b| b == 7));

        let smaller = pad_to_extent(&data, 4, 4, 1, (2, 2));
        assert!(matches!(smaller.data, Cow::Borrowed(_)));
    }

    #[test]
    fn test_multi_byte_pixels_replicate_whole_texel() {
        let data = [10u8, 11, 20, 21];
        let padded = pad_to_blocks(&data, 2, 1, 2, (4, 1));
        assert_eq!(padded.data.as_ref(), &[10, 11, 20, 21, 20, 21, 20, 21]);
    }

    proptest! {
        #[test]
        fn prop_padding_is_block_aligned_and_preserves_source(
            width in 1u32..40,
            height in 1u32..40,
            bpp in 1usize..=8,
            block in prop::sample::select(vec![4u32, 5, 6, 8]),
        ) {
            let data: Vec<u8> = (0..width as usize * height as usize * bpp)
                .map(|i| (i % 251) as u8)
                .collect();
            let padded = pad_to_blocks(&data, width, height, bpp, (block, block));
            prop_assert_eq!(padded.width % block, 0);
            prop_assert_eq!(padded.height % block, 0);
            prop_assert!(padded.width >= width && padded.width < width + block);
            prop_assert_eq!(
                padded.data.len(),
                padded.width as usize * padded.height as usize * bpp
            );

            let src_row = width as usize * bpp;
            let dst_row = padded.width as usize * bpp;
            for y in 0..height as usize {
                prop_assert_eq!(
                    &padded.data[y * dst_row..y * dst_row + src_row],
                    &data[y * src_row..(y + 1) * src_row]
                );
            }
        }
    }
}
