//! Per-run processing parameters.

use std::path::PathBuf;
use std::time::SystemTime;

use crate::container::Container;
use crate::format::{ColorSpace, CompressionRequest};
use crate::mipmap::MipMode;
use crate::swizzle::ChannelSwizzle;

/// Parameters shared by every file of one processing run.
#[derive(Debug, Clone, PartialEq)]
pub struct ProcessTexturesParams {
    /// Only process files with this extension (without the dot).
    ///
    /// `None` accepts every image or container extension we can read.
    pub input_extension: Option<String>,

    /// Output container.
    pub container: Container,

    /// Compression family and optional block overrides.
    pub compression: CompressionRequest,

    /// How mips are produced for single-level inputs.
    pub mip_mode: MipMode,

    /// Channel remapping applied after mip generation.
    pub swizzle: Option<ChannelSwizzle>,

    /// Colour space of 8/16-bit inputs. Float inputs are always linear.
    pub color_space: ColorSpace,

    /// Companion roughness map; enables VMF synthesis.
    pub roughness_path: Option<PathBuf>,

    /// Reprocess even when the output is up to date.
    pub force: bool,

    /// Extra timestamp an output must be newer than, e.g. the time the
    /// calling tool's settings last changed.
    pub additional_modified_time: Option<SystemTime>,

    /// Subdirectory inserted between the output directory and file name.
    pub out_subdir: Option<PathBuf>,

    /// Collect a [`ProcessedTextureRecord`](crate::pipeline::ProcessedTextureRecord)
    /// per written file.
    pub record_output: bool,
}

impl Default for ProcessTexturesParams {
    fn default() -> Self {
        Self {
            input_extension: None,
            container: Container::Dds,
            compression: CompressionRequest::bc(),
            mip_mode: MipMode::Default,
            swizzle: None,
            color_space: ColorSpace::Srgb,
            roughness_path: None,
            force: false,
            additional_modified_time: None,
            out_subdir: None,
            record_output: true,
        }
    }
}

impl ProcessTexturesParams {
    pub fn new() -> Self {
        Self::default()
    }

    /// Restrict inputs to one extension. A leading dot is ignored.
    pub fn with_input_extension(mut self, ext: impl Into<String>) -> Self {
        let ext = ext.into();
        self.input_extension = Some(ext.trim_start_matches('.').to_ascii_lowercase());
        self
    }

    pub fn with_container(mut self, container: Container) -> Self {
        self.container = container;
        self
    }

    pub fn with_compression(mut self, compression: CompressionRequest) -> Self {
        self.compression = compression;
        self
    }

    pub fn with_mip_mode(mut self, mode: MipMode) -> Self {
        self.mip_mode = mode;
        self
    }

    pub fn with_swizzle(mut self, swizzle: ChannelSwizzle) -> Self {
        self.swizzle = Some(swizzle);
        self
    }

    pub fn with_color_space(mut self, color_space: ColorSpace) -> Self {
        self.color_space = color_space;
        self
    }

    /// Set the roughness map and switch to VMF-filtered mips.
    pub fn with_roughness_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.roughness_path = Some(path.into());
        self.mip_mode = MipMode::Vmf;
        self
    }

    pub fn with_force(mut self, force: bool) -> Self {
        self.force = force;
        self
    }

    pub fn with_additional_modified_time(mut self, time: SystemTime) -> Self {
        self.additional_modified_time = Some(time);
        self
    }

    pub fn with_out_subdir(mut self, subdir: impl Into<PathBuf>) -> Self {
        self.out_subdir = Some(subdir.into());
        self
    }

    pub fn with_record_output(mut self, record: bool) -> Self {
        self.record_output = record;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::format::{AstcBlock, CompressionFamily};

    #[test]
    fn test_default_params() {
        let params = ProcessTexturesParams::default();
        assert_eq!(params.container, Container::Dds);
        assert_eq!(params.compression.family, CompressionFamily::Bc);
        assert_eq!(params.mip_mode, MipMode::Default);
        assert_eq!(params.color_space, ColorSpace::Srgb);
        assert!(params.swizzle.is_none());
        assert!(!params.force);
        assert!(params.record_output);
    }

    #[test]
    fn test_builder_pattern() {
        let params = ProcessTexturesParams::new()
            .with_input_extension(".PNG")
            .with_container(Container::Ktx)
            .with_compression(CompressionRequest::astc().with_astc_block(AstcBlock::B8x8))
            .with_swizzle("bgra".parse().unwrap())
            .with_color_space(ColorSpace::Linear)
            .with_force(true)
            .with_out_subdir("baked");

        assert_eq!(params.input_extension.as_deref(), Some("png"));
        assert_eq!(params.container, Container::Ktx);
        assert_eq!(params.compression.astc_block, Some(AstcBlock::B8x8));
        assert_eq!(params.swizzle.unwrap().to_string(), "bgra");
        assert!(params.force);
        assert_eq!(params.out_subdir, Some(PathBuf::from("baked")));
    }

    #[test]
    fn test_roughness_selects_vmf() {
        let params = ProcessTexturesParams::new().with_roughness_path("rough.png");
        assert_eq!(params.mip_mode, MipMode::Vmf);
        assert_eq!(params.roughness_path, Some(PathBuf::from("rough.png")));
    }
}
