use std::path::Path;

use crate::shared::error::PipelineError;
use crate::shared::video_metadata::VideoMetadata;
use crate::video::domain::video_reader::{FrameIter, VideoReader};

/// An opened [`VideoReader`], closed when this guard is dropped.
///
/// Holding the reader through the guard ties the input handle's lifetime
/// to a scope, so it is released on completion and on early return alike.
pub struct FrameSource<'a> {
    reader: &'a mut dyn VideoReader,
    metadata: VideoMetadata,
}

impl<'a> FrameSource<'a> {
    pub fn open(reader: &'a mut dyn VideoReader, path: &Path) -> Result<Self, PipelineError> {
        let metadata = reader.open(path).map_err(|source| PipelineError::MediaOpen {
            path: path.to_path_buf(),
            source,
        })?;
        Ok(Self { reader, metadata })
    }

    pub fn metadata(&self) -> &VideoMetadata {
        &self.metadata
    }

    pub fn frames(&mut self) -> FrameIter<'_> {
        self.reader.frames()
    }
}

impl Drop for FrameSource<'_> {
    fn drop(&mut self) {
        self.reader.close();
    }
}
