use std::path::PathBuf;

/// Properties of an opened input video.
///
/// `total_frames` is 0 when the container does not report a frame count.
#[derive(Clone, Debug, PartialEq)]
pub struct VideoMetadata {
    pub width: u32,
    pub height: u32,
    pub fps: f64,
    pub total_frames: usize,
    pub codec: String,
    pub source_path: Option<PathBuf>,
}
