use crate::shared::error::PipelineError;
use crate::shared::frame::Frame;

/// Processed frames in arrival order, all of one size.
///
/// Append-only: frames are never removed or reordered, and the first frame
/// pushed fixes the dimensions every later frame must match.
#[derive(Debug, Default)]
pub struct FrameBuffer {
    frames: Vec<Frame>,
}

impl FrameBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, frame: Frame) -> Result<(), PipelineError> {
        if let Some(expected) = self.dimensions() {
            if frame.dimensions() != expected {
                return Err(PipelineError::DimensionMismatch {
                    frame_index: frame.index(),
                    expected,
                    actual: frame.dimensions(),
                });
            }
        }
        self.frames.push(frame);
        Ok(())
    }

    /// Shared `(width, height)` of the buffered frames, `None` while empty.
    pub fn dimensions(&self) -> Option<(u32, u32)> {
        self.frames.first().map(Frame::dimensions)
    }

    pub fn len(&self) -> usize {
        self.frames.len()
    }

    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Frame> {
        self.frames.iter()
    }
}

impl<'a> IntoIterator for &'a FrameBuffer {
    type Item = &'a Frame;
    type IntoIter = std::slice::Iter<'a, Frame>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}
