use std::fmt;
use std::path::{Path, PathBuf};
use std::time::Instant;

use crate::cropping::domain::crop_rect::CropRect;
use crate::cropping::domain::frame_cropper::FrameCropper;
use crate::cropping::domain::frame_resizer::FrameResizer;
use crate::detection::domain::detection::Detection;
use crate::detection::domain::face_detector::FaceDetector;
use crate::shared::constants::DEFAULT_MARGIN;
use crate::shared::error::PipelineError;
use crate::shared::frame::Frame;
use crate::shared::output_size::OutputSize;

use super::frame_buffer::FrameBuffer;
use super::video_sink::VideoSink;

/// Crop margin and target size, fixed for the lifetime of a pipeline.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct CropSettings {
    margin: u32,
    output_size: OutputSize,
}

impl CropSettings {
    pub fn new(margin: u32, output_size: OutputSize) -> Self {
        Self {
            margin,
            output_size,
        }
    }

    pub fn margin(&self) -> u32 {
        self.margin
    }

    pub fn output_size(&self) -> OutputSize {
        self.output_size
    }
}

impl Default for CropSettings {
    fn default() -> Self {
        Self::new(DEFAULT_MARGIN, OutputSize::default())
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PipelineState {
    Idle,
    Processing,
    Finalized,
}

/// Why a frame was left out of the output.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SkipReason {
    NoFace,
    CropOutOfBounds(CropRect),
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SkipReason::NoFace => write!(f, "no face detected"),
            SkipReason::CropOutOfBounds(rect) => write!(
                f,
                "crop {}x{} at ({}, {}) lies outside the frame",
                rect.width, rect.height, rect.x, rect.y
            ),
        }
    }
}

impl SkipReason {
    /// The only errors that drop a frame instead of ending the run.
    fn from_error(err: &PipelineError) -> Option<Self> {
        match err {
            PipelineError::NoFaceDetected { .. } => Some(SkipReason::NoFace),
            PipelineError::CropOutOfBounds { rect, .. } => Some(SkipReason::CropOutOfBounds(*rect)),
            _ => None,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FrameOutcome {
    Buffered,
    Skipped(SkipReason),
}

/// Wall-clock time spent in each stage for the most recent frame.
///
/// Stages that did not run (e.g. resize after a skipped crop) stay at zero.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct StageTimings {
    pub detect_ms: f64,
    pub crop_ms: f64,
    pub resize_ms: f64,
}

/// Per-frame detect, crop, resize and buffer, followed by a single write.
///
/// State moves `Idle -> Processing` on the first frame and to `Finalized`
/// once [`finalize`](Self::finalize) has been attempted. A finalized
/// pipeline rejects further frames and further finalize calls.
pub struct FaceCropPipeline {
    detector: Box<dyn FaceDetector>,
    resizer: Box<dyn FrameResizer>,
    cropper: FrameCropper,
    output_size: OutputSize,
    buffer: FrameBuffer,
    state: PipelineState,
    skipped: usize,
    last_timings: StageTimings,
}

impl FaceCropPipeline {
    pub fn new(
        detector: Box<dyn FaceDetector>,
        resizer: Box<dyn FrameResizer>,
        settings: CropSettings,
    ) -> Self {
        Self {
            detector,
            resizer,
            cropper: FrameCropper::new(settings.margin()),
            output_size: settings.output_size(),
            buffer: FrameBuffer::new(),
            state: PipelineState::Idle,
            skipped: 0,
            last_timings: StageTimings::default(),
        }
    }

    pub fn state(&self) -> PipelineState {
        self.state
    }

    pub fn buffer(&self) -> &FrameBuffer {
        &self.buffer
    }

    pub fn skipped_count(&self) -> usize {
        self.skipped
    }

    pub fn last_timings(&self) -> StageTimings {
        self.last_timings
    }

    /// Runs one frame through detection, crop and resize, appending the
    /// result to the buffer.
    ///
    /// Frames without a face, or whose crop has no area inside the frame,
    /// are skipped. Every other failure is returned.
    pub fn process_frame(&mut self, frame: &Frame) -> Result<FrameOutcome, PipelineError> {
        if self.state == PipelineState::Finalized {
            return Err(PipelineError::AlreadyFinalized);
        }
        self.state = PipelineState::Processing;
        self.last_timings = StageTimings::default();

        match self.crop_face(frame) {
            Ok(resized) => {
                self.buffer.push(resized)?;
                Ok(FrameOutcome::Buffered)
            }
            Err(err) => match SkipReason::from_error(&err) {
                Some(reason) => {
                    log::warn!("Skipping frame {}: {reason}", frame.index());
                    self.skipped += 1;
                    Ok(FrameOutcome::Skipped(reason))
                }
                None => Err(err),
            },
        }
    }

    /// Writes the buffer through `sink` into `output_dir`.
    ///
    /// Only the first call does any work; the pipeline is finalized even if
    /// writing fails.
    pub fn finalize(
        &mut self,
        sink: &mut VideoSink,
        output_dir: &Path,
    ) -> Result<PathBuf, PipelineError> {
        if self.state == PipelineState::Finalized {
            return Err(PipelineError::AlreadyFinalized);
        }
        self.state = PipelineState::Finalized;
        Ok(sink.write_all(&self.buffer, output_dir)?)
    }

    fn crop_face(&mut self, frame: &Frame) -> Result<Frame, PipelineError> {
        let frame_index = frame.index();

        let t0 = Instant::now();
        let candidates = self
            .detector
            .detect(frame)
            .map_err(|source| PipelineError::Detection {
                frame_index,
                source,
            })?;
        self.last_timings.detect_ms = elapsed_ms(t0);

        let bbox = match Detection::from_ranked(&candidates) {
            Detection::Detected(bbox) => bbox,
            Detection::NoFace => return Err(PipelineError::NoFaceDetected { frame_index }),
        };

        let t1 = Instant::now();
        let cropped = self.cropper.crop(frame, &bbox)?;
        self.last_timings.crop_ms = elapsed_ms(t1);

        let t2 = Instant::now();
        let resized = self
            .resizer
            .resize(&cropped, self.output_size)
            .map_err(|source| PipelineError::Resize {
                frame_index,
                source,
            })?;
        self.last_timings.resize_ms = elapsed_ms(t2);

        Ok(resized)
    }
}

fn elapsed_ms(start: Instant) -> f64 {
    start.elapsed().as_secs_f64() * 1000.0
}
