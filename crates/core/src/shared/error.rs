use std::path::PathBuf;

use thiserror::Error;

use crate::cropping::domain::crop_rect::CropRect;

/// Failures of the video sink. Always fatal for the run.
#[derive(Error, Debug)]
pub enum WriteError {
    #[error("no frames were buffered, refusing to write an empty video")]
    EmptyBuffer,
    #[error("failed to create output directory {path}: {source}")]
    CreateDir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to encode {path}: {source}")]
    Encoder {
        path: PathBuf,
        #[source]
        source: Box<dyn std::error::Error>,
    },
    #[error("failed to export frame to {path}: {source}")]
    Export {
        path: PathBuf,
        #[source]
        source: Box<dyn std::error::Error>,
    },
}

/// Everything that can go wrong while turning an input video into a
/// face-cropped output video.
///
/// `NoFaceDetected` and `CropOutOfBounds` only concern a single frame; the
/// pipeline recovers from them by skipping that frame.
#[derive(Error, Debug)]
pub enum PipelineError {
    #[error("failed to open input video {path}: {source}")]
    MediaOpen {
        path: PathBuf,
        #[source]
        source: Box<dyn std::error::Error>,
    },
    #[error("failed to decode frame: {0}")]
    Decode(#[source] Box<dyn std::error::Error>),
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
    #[error("failed to initialize face detector: {0}")]
    DetectorInit(#[source] Box<dyn std::error::Error>),
    #[error("face detector failed on frame {frame_index}: {source}")]
    Detection {
        frame_index: usize,
        #[source]
        source: Box<dyn std::error::Error>,
    },
    #[error("no face detected in frame {frame_index}")]
    NoFaceDetected { frame_index: usize },
    #[error("crop {rect:?} has no area inside frame {frame_index}")]
    CropOutOfBounds { frame_index: usize, rect: CropRect },
    #[error("failed to resize frame {frame_index}: {source}")]
    Resize {
        frame_index: usize,
        #[source]
        source: Box<dyn std::error::Error>,
    },
    #[error("frame {frame_index} is {actual:?}, buffer holds {expected:?} frames")]
    DimensionMismatch {
        frame_index: usize,
        expected: (u32, u32),
        actual: (u32, u32),
    },
    #[error("pipeline already finalized")]
    AlreadyFinalized,
    #[error(transparent)]
    Write(#[from] WriteError),
}

impl PipelineError {
    /// Process exit code: 1 = open failure, 2 = detection/crop failure,
    /// 3 = write failure.
    pub fn exit_code(&self) -> i32 {
        match self {
            PipelineError::MediaOpen { .. }
            | PipelineError::Decode(_)
            | PipelineError::InvalidConfig(_) => 1,
            PipelineError::DetectorInit(_)
            | PipelineError::Detection { .. }
            | PipelineError::NoFaceDetected { .. }
            | PipelineError::CropOutOfBounds { .. }
            | PipelineError::Resize { .. }
            | PipelineError::DimensionMismatch { .. }
            | PipelineError::AlreadyFinalized => 2,
            PipelineError::Write(_) => 3,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exit_codes() {
        let open = PipelineError::MediaOpen {
            path: PathBuf::from("in.mp4"),
            source: "missing".into(),
        };
        assert_eq!(open.exit_code(), 1);
        assert_eq!(PipelineError::InvalidConfig("x".into()).exit_code(), 1);
        assert_eq!(PipelineError::DetectorInit("x".into()).exit_code(), 2);
        assert_eq!(PipelineError::AlreadyFinalized.exit_code(), 2);
        assert_eq!(PipelineError::Write(WriteError::EmptyBuffer).exit_code(), 3);
    }

    #[test]
    fn test_write_error_message_is_transparent() {
        let err = PipelineError::from(WriteError::EmptyBuffer);
        assert_eq!(
            err.to_string(),
            "no frames were buffered, refusing to write an empty video"
        );
    }

    #[test]
    fn test_media_open_message_includes_path() {
        let err = PipelineError::MediaOpen {
            path: PathBuf::from("/videos/in.mp4"),
            source: "No such file".into(),
        };
        assert!(err.to_string().contains("/videos/in.mp4"));
        assert!(err.to_string().contains("No such file"));
    }
}
