use std::path::Path;

use crate::shared::frame::Frame;
use crate::shared::video_metadata::VideoMetadata;

/// Lazily decoded frames; `None` marks a clean end of stream.
pub type FrameIter<'a> = Box<dyn Iterator<Item = Result<Frame, Box<dyn std::error::Error>>> + 'a>;

/// Reads frames from a video source in presentation order.
///
/// Implementations handle I/O details (codec, container format, etc.)
/// while the pipeline works with the abstract `Frame` and `VideoMetadata`
/// types. Prefer [`FrameSource`](super::frame_source::FrameSource) over
/// calling `open`/`close` by hand.
pub trait VideoReader: Send {
    /// Opens a video file and returns its metadata.
    fn open(&mut self, path: &Path) -> Result<VideoMetadata, Box<dyn std::error::Error>>;

    /// Returns an iterator over frames in decode order.
    fn frames(&mut self) -> FrameIter<'_>;

    /// Releases any resources held by the reader. Safe to call repeatedly.
    fn close(&mut self);
}
