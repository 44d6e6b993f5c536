use std::fmt;
use std::str::FromStr;

use crate::shared::error::PipelineError;

/// Codec used for the output video.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum VideoCodec {
    /// MPEG-4 Part 2, tagged `DIVX` inside AVI.
    #[default]
    Mpeg4,
    /// Motion JPEG, tagged `MJPG` inside AVI.
    Mjpeg,
}

impl VideoCodec {
    /// Four-character code written into AVI stream headers.
    pub fn fourcc(&self) -> [u8; 4] {
        match self {
            VideoCodec::Mpeg4 => *b"DIVX",
            VideoCodec::Mjpeg => *b"MJPG",
        }
    }
}

impl fmt::Display for VideoCodec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            VideoCodec::Mpeg4 => f.write_str("divx"),
            VideoCodec::Mjpeg => f.write_str("mjpeg"),
        }
    }
}

impl FromStr for VideoCodec {
    type Err = PipelineError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "divx" | "mpeg4" | "xvid" => Ok(VideoCodec::Mpeg4),
            "mjpg" | "mjpeg" => Ok(VideoCodec::Mjpeg),
            other => Err(PipelineError::InvalidConfig(format!(
                "codec must be one of: divx, mpeg4, xvid, mjpg, mjpeg, got '{other}'"
            ))),
        }
    }
}

/// Everything a [`VideoWriter`](super::video_writer::VideoWriter) needs to
/// open an encoder. Every frame written must be `width` x `height`.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct OutputFormat {
    pub width: u32,
    pub height: u32,
    pub fps: f64,
    pub codec: VideoCodec,
}
