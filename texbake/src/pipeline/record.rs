//! Per-file output records.

use std::path::PathBuf;

use serde::Serialize;

use crate::format::TextureFormat;
use crate::texture::ImageDesc;

/// What was written for one input file.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProcessedTextureRecord {
    pub output_path: PathBuf,
    pub width: u32,
    pub height: u32,
    pub depth: u32,
    pub array_size: u32,
    pub mip_count: u32,
    pub format: TextureFormat,
    pub cube: bool,
}

impl ProcessedTextureRecord {
    pub fn new(output_path: impl Into<PathBuf>, desc: &ImageDesc) -> Self {
        Self {
            output_path: output_path.into(),
            width: desc.width,
            height: desc.height,
            depth: desc.depth,
            array_size: desc.array_size,
            mip_count: desc.mip_count,
            format: desc.format,
            cube: desc.cube,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::format::BcVariant;

    #[test]
    fn test_record_serializes_format_name() {
        let desc = ImageDesc::new(256, 256, TextureFormat::bc(BcVariant::Bc7, true, false))
            .with_mip_count(9);
        let record = ProcessedTextureRecord::new("out/a.tex", &desc);
        let json = serde_json::to_value(&record).unwrap();
        assert_eq!(json["format"], "BC7_SRGB");
        assert_eq!(json["mip_count"], 9);
        assert_eq!(json["output_path"], "out/a.tex");
        assert_eq!(json["cube"], false);
    }
}
