use std::path::{Path, PathBuf};

use crate::shared::constants::{DEFAULT_OUTPUT_FPS, OUTPUT_FILE_NAME};
use crate::shared::error::{PipelineError, WriteError};
use crate::video::domain::output_format::{OutputFormat, VideoCodec};
use crate::video::domain::video_writer::VideoWriter;

use super::frame_buffer::FrameBuffer;

/// Encoding parameters for the output video.
#[derive(Clone, Debug, PartialEq)]
pub struct SinkSettings {
    fps: f64,
    codec: VideoCodec,
}

impl SinkSettings {
    pub fn new(fps: f64, codec: VideoCodec) -> Result<Self, PipelineError> {
        if !is_whole_rate(fps) {
            return Err(PipelineError::InvalidConfig(format!(
                "output fps must be a whole number of at least 1, got {fps}"
            )));
        }
        Ok(Self { fps, codec })
    }

    pub fn fps(&self) -> f64 {
        self.fps
    }

    pub fn codec(&self) -> VideoCodec {
        self.codec
    }
}

impl Default for SinkSettings {
    fn default() -> Self {
        Self {
            fps: DEFAULT_OUTPUT_FPS,
            codec: VideoCodec::default(),
        }
    }
}

/// Encoders take an integer time base, so only whole rates are exact.
fn is_whole_rate(fps: f64) -> bool {
    fps.is_finite() && fps >= 1.0 && fps.fract() == 0.0 && fps <= i32::MAX as f64
}

/// Writes a filled [`FrameBuffer`] out as a single video file.
pub struct VideoSink {
    writer: Box<dyn VideoWriter>,
    settings: SinkSettings,
}

impl VideoSink {
    pub fn new(writer: Box<dyn VideoWriter>, settings: SinkSettings) -> Self {
        Self { writer, settings }
    }

    /// Encodes every buffered frame, in order, into
    /// `<output_dir>/output.avi` and returns that path.
    ///
    /// An empty buffer is rejected before anything is created on disk. The
    /// writer is closed whether or not encoding succeeded.
    pub fn write_all(
        &mut self,
        buffer: &FrameBuffer,
        output_dir: &Path,
    ) -> Result<PathBuf, WriteError> {
        let (width, height) = buffer.dimensions().ok_or(WriteError::EmptyBuffer)?;

        std::fs::create_dir_all(output_dir).map_err(|source| WriteError::CreateDir {
            path: output_dir.to_path_buf(),
            source,
        })?;

        let path = output_dir.join(OUTPUT_FILE_NAME);
        let format = OutputFormat {
            width,
            height,
            fps: self.settings.fps,
            codec: self.settings.codec,
        };

        let encoded = self.encode(&path, &format, buffer);
        let closed = self.writer.close();

        encoded
            .and(closed)
            .map_err(|source| WriteError::Encoder {
                path: path.clone(),
                source,
            })?;

        log::info!(
            "Wrote {} frames ({width}x{height} @ {} fps) to {}",
            buffer.len(),
            self.settings.fps,
            path.display()
        );
        Ok(path)
    }

    fn encode(
        &mut self,
        path: &Path,
        format: &OutputFormat,
        buffer: &FrameBuffer,
    ) -> Result<(), Box<dyn std::error::Error>> {
        self.writer.open(path, format)?;
        for frame in buffer {
            self.writer.write(frame)?;
        }
        Ok(())
    }
}
