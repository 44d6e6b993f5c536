use std::fmt;
use std::str::FromStr;

use crate::shared::error::PipelineError;
use crate::shared::frame::Frame;
use crate::shared::output_size::OutputSize;

/// Interpolation used when scaling a crop to the output size.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum ResizeFilter {
    Nearest,
    #[default]
    Bilinear,
    CatmullRom,
    Lanczos3,
}

impl fmt::Display for ResizeFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ResizeFilter::Nearest => "nearest",
            ResizeFilter::Bilinear => "bilinear",
            ResizeFilter::CatmullRom => "catmull-rom",
            ResizeFilter::Lanczos3 => "lanczos3",
        };
        f.write_str(name)
    }
}

impl FromStr for ResizeFilter {
    type Err = PipelineError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "nearest" => Ok(ResizeFilter::Nearest),
            "bilinear" | "linear" | "triangle" => Ok(ResizeFilter::Bilinear),
            "catmull-rom" | "cubic" => Ok(ResizeFilter::CatmullRom),
            "lanczos3" | "lanczos" => Ok(ResizeFilter::Lanczos3),
            other => Err(PipelineError::InvalidConfig(format!(
                "resize filter must be one of: nearest, bilinear, catmull-rom, lanczos3, got '{other}'"
            ))),
        }
    }
}

/// Scales a cropped frame to a fixed size.
///
/// The result must be exactly `size`, whatever the input aspect ratio,
/// and keep the source frame index.
pub trait FrameResizer: Send {
    fn resize(
        &self,
        frame: &Frame,
        size: OutputSize,
    ) -> Result<Frame, Box<dyn std::error::Error>>;
}
