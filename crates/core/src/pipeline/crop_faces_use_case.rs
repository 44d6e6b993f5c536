use std::path::{Path, PathBuf};
use std::time::Instant;

use crate::shared::error::{PipelineError, WriteError};
use crate::video::domain::frame_source::FrameSource;
use crate::video::domain::image_writer::ImageWriter;
use crate::video::domain::video_reader::VideoReader;

use super::face_crop_pipeline::{FaceCropPipeline, FrameOutcome};
use super::pipeline_logger::PipelineLogger;
use super::video_sink::VideoSink;

/// Result of a completed run.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CropSummary {
    pub output_path: PathBuf,
    pub frames_read: usize,
    pub frames_buffered: usize,
    pub frames_skipped: usize,
}

struct FrameExport {
    writer: Box<dyn ImageWriter>,
    dir: PathBuf,
}

/// Reads an input video, crops the face out of every frame and writes the
/// crops as one output video.
///
/// Single-use: the pipeline is finalized by `execute`, so a second call
/// fails with `AlreadyFinalized`.
pub struct CropFacesUseCase {
    reader: Box<dyn VideoReader>,
    pipeline: FaceCropPipeline,
    sink: VideoSink,
    logger: Box<dyn PipelineLogger>,
    export: Option<FrameExport>,
}

impl CropFacesUseCase {
    pub fn new(
        reader: Box<dyn VideoReader>,
        pipeline: FaceCropPipeline,
        sink: VideoSink,
        logger: Box<dyn PipelineLogger>,
    ) -> Self {
        Self {
            reader,
            pipeline,
            sink,
            logger,
            export: None,
        }
    }

    /// Also save every buffered frame as `frame_<index>.png` under `dir`.
    pub fn with_frame_export(mut self, writer: Box<dyn ImageWriter>, dir: PathBuf) -> Self {
        self.export = Some(FrameExport { writer, dir });
        self
    }

    pub fn execute(
        &mut self,
        input: &Path,
        output_dir: &Path,
    ) -> Result<CropSummary, PipelineError> {
        let frames_read = self.process_input(input)?;

        let t0 = Instant::now();
        let output_path = self.pipeline.finalize(&mut self.sink, output_dir)?;
        self.logger.timing("write", elapsed_ms(t0));

        // Export runs after the video is on disk; a failure here leaves it intact.
        if let Some(export) = &self.export {
            let t0 = Instant::now();
            for frame in self.pipeline.buffer() {
                let path = export.dir.join(format!("frame_{}.png", frame.index()));
                export
                    .writer
                    .write(&path, frame)
                    .map_err(|source| WriteError::Export { path, source })?;
            }
            self.logger.info(&format!(
                "Exported {} frames to {} in {:.0}ms",
                self.pipeline.buffer().len(),
                export.dir.display(),
                elapsed_ms(t0)
            ));
        }

        let summary = CropSummary {
            output_path,
            frames_read,
            frames_buffered: self.pipeline.buffer().len(),
            frames_skipped: self.pipeline.skipped_count(),
        };
        self.logger.info(&format!(
            "Output: {} ({} of {} frames kept)",
            summary.output_path.display(),
            summary.frames_buffered,
            summary.frames_read
        ));
        self.logger.summary();
        Ok(summary)
    }

    /// Feeds every decoded frame to the pipeline. The input is closed when
    /// this returns, on success or error.
    fn process_input(&mut self, input: &Path) -> Result<usize, PipelineError> {
        let mut source = FrameSource::open(self.reader.as_mut(), input)?;
        let meta = source.metadata().clone();
        self.logger.info(&format!(
            "Input: {} ({}x{}, {:.2} fps, {} frames, {})",
            input.display(),
            meta.width,
            meta.height,
            meta.fps,
            meta.total_frames,
            meta.codec
        ));

        let mut frames = source.frames();
        let mut frames_read = 0;
        loop {
            let t0 = Instant::now();
            let Some(next) = frames.next() else {
                break;
            };
            let frame = next.map_err(PipelineError::Decode)?;
            self.logger.timing("decode", elapsed_ms(t0));
            frames_read += 1;

            if let FrameOutcome::Skipped(reason) = self.pipeline.process_frame(&frame)? {
                self.logger.skip(frame.index(), &reason);
            }

            let timings = self.pipeline.last_timings();
            self.logger.timing("detect", timings.detect_ms);
            self.logger.timing("crop", timings.crop_ms);
            self.logger.timing("resize", timings.resize_ms);
            self.logger.progress(frames_read, meta.total_frames);
        }

        Ok(frames_read)
    }
}

fn elapsed_ms(start: Instant) -> f64 {
    start.elapsed().as_secs_f64() * 1000.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cropping::infrastructure::image_frame_resizer::ImageFrameResizer;
    use crate::detection::domain::face_detector::FaceDetector;
    use crate::pipeline::face_crop_pipeline::{CropSettings, SkipReason};
    use crate::pipeline::pipeline_logger::NullPipelineLogger;
    use crate::pipeline::video_sink::SinkSettings;
    use crate::shared::bounding_box::BoundingBox;
    use crate::shared::frame::Frame;
    use crate::shared::output_size::OutputSize;
    use crate::shared::video_metadata::VideoMetadata;
    use crate::video::domain::output_format::OutputFormat;
    use crate::video::domain::video_reader::FrameIter;
    use crate::video::domain::video_writer::VideoWriter;
    use std::collections::HashSet;
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::sync::{Arc, Mutex};

    // --- Stubs ---

    struct StubReader {
        frames: Vec<Result<Frame, String>>,
        closed: Arc<AtomicBool>,
        fail_open: bool,
    }

    impl StubReader {
        fn new(frames: Vec<Frame>) -> Self {
            Self {
                frames: frames.into_iter().map(Ok).collect(),
                closed: Arc::new(AtomicBool::new(false)),
                fail_open: false,
            }
        }
    }

    impl VideoReader for StubReader {
        fn open(&mut self, path: &Path) -> Result<VideoMetadata, Box<dyn std::error::Error>> {
            if self.fail_open {
                return Err("no such file".into());
            }
            Ok(VideoMetadata {
                width: 200,
                height: 200,
                fps: 30.0,
                total_frames: self.frames.len(),
                codec: "stub".into(),
                source_path: Some(path.to_path_buf()),
            })
        }

        fn frames(&mut self) -> FrameIter<'_> {
            Box::new(
                self.frames
                    .drain(..)
                    .map(|f| f.map_err(|msg| -> Box<dyn std::error::Error> { msg.into() })),
            )
        }

        fn close(&mut self) {
            self.closed.store(true, Ordering::SeqCst);
        }
    }

    struct StubDetector {
        bbox: BoundingBox,
        no_face: HashSet<usize>,
    }

    impl FaceDetector for StubDetector {
        fn detect(&mut self, frame: &Frame) -> Result<Vec<BoundingBox>, Box<dyn std::error::Error>> {
            if self.no_face.contains(&frame.index()) {
                Ok(vec![])
            } else {
                Ok(vec![self.bbox])
            }
        }
    }

    #[derive(Default)]
    struct Recorded {
        format: Option<OutputFormat>,
        frames: Vec<Frame>,
        closed: bool,
    }

    struct StubWriter {
        recorded: Arc<Mutex<Recorded>>,
    }

    impl VideoWriter for StubWriter {
        fn open(
            &mut self,
            path: &Path,
            format: &OutputFormat,
        ) -> Result<(), Box<dyn std::error::Error>> {
            std::fs::write(path, b"")?;
            self.recorded.lock().unwrap().format = Some(*format);
            Ok(())
        }

        fn write(&mut self, frame: &Frame) -> Result<(), Box<dyn std::error::Error>> {
            self.recorded.lock().unwrap().frames.push(frame.clone());
            Ok(())
        }

        fn close(&mut self) -> Result<(), Box<dyn std::error::Error>> {
            self.recorded.lock().unwrap().closed = true;
            Ok(())
        }
    }

    struct StubImageWriter {
        paths: Arc<Mutex<Vec<PathBuf>>>,
    }

    impl ImageWriter for StubImageWriter {
        fn write(&self, path: &Path, _frame: &Frame) -> Result<(), Box<dyn std::error::Error>> {
            self.paths.lock().unwrap().push(path.to_path_buf());
            Ok(())
        }
    }

    struct FailingImageWriter;

    impl ImageWriter for FailingImageWriter {
        fn write(&self, _path: &Path, _frame: &Frame) -> Result<(), Box<dyn std::error::Error>> {
            Err("disk full".into())
        }
    }

    // --- Helpers ---

    fn frames(count: usize) -> Vec<Frame> {
        (0..count)
            .map(|i| Frame::new(vec![i as u8; 200 * 200 * 3], 200, 200, 3, i))
            .collect()
    }

    /// A centered 50x50 face, margin 10, 100x100 output.
    fn use_case(
        reader: StubReader,
        no_face: &[usize],
    ) -> (CropFacesUseCase, Arc<Mutex<Recorded>>) {
        let detector = StubDetector {
            bbox: BoundingBox::new(75, 75, 50, 50),
            no_face: no_face.iter().copied().collect(),
        };
        let pipeline = FaceCropPipeline::new(
            Box::new(detector),
            Box::new(ImageFrameResizer::default()),
            CropSettings::new(10, OutputSize::new(100, 100).unwrap()),
        );
        let recorded = Arc::new(Mutex::new(Recorded::default()));
        let sink = VideoSink::new(
            Box::new(StubWriter {
                recorded: recorded.clone(),
            }),
            SinkSettings::default(),
        );
        (
            CropFacesUseCase::new(
                Box::new(reader),
                pipeline,
                sink,
                Box::new(NullPipelineLogger),
            ),
            recorded,
        )
    }

    // --- Tests ---

    #[test]
    fn test_every_frame_cropped_and_written() {
        let dir = tempfile::tempdir().unwrap();
        let output_dir = dir.path().join("cropped_vids");
        let reader = StubReader::new(frames(10));
        let closed = reader.closed.clone();
        let (mut uc, recorded) = use_case(reader, &[]);

        let summary = uc.execute(Path::new("in.mp4"), &output_dir).unwrap();

        assert_eq!(
            summary,
            CropSummary {
                output_path: output_dir.join("output.avi"),
                frames_read: 10,
                frames_buffered: 10,
                frames_skipped: 0,
            }
        );
        assert!(summary.output_path.exists());
        assert!(closed.load(Ordering::SeqCst));

        let rec = recorded.lock().unwrap();
        assert!(rec.closed);
        assert_eq!(rec.frames.len(), 10);
        assert!(rec.frames.iter().all(|f| f.dimensions() == (100, 100)));
        let format = rec.format.unwrap();
        assert_eq!((format.width, format.height), (100, 100));
        assert_eq!(format.fps, 15.0);
    }

    #[test]
    fn test_frame_without_face_is_dropped() {
        let dir = tempfile::tempdir().unwrap();
        let (mut uc, recorded) = use_case(StubReader::new(frames(5)), &[2]);

        let summary = uc.execute(Path::new("in.mp4"), dir.path()).unwrap();

        assert_eq!(summary.frames_read, 5);
        assert_eq!(summary.frames_buffered, 4);
        assert_eq!(summary.frames_skipped, 1);
        let indices: Vec<usize> = recorded
            .lock()
            .unwrap()
            .frames
            .iter()
            .map(Frame::index)
            .collect();
        assert_eq!(indices, vec![0, 1, 3, 4]);
    }

    #[test]
    fn test_no_faces_at_all_writes_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let output_dir = dir.path().join("cropped_vids");
        let (mut uc, recorded) = use_case(StubReader::new(frames(3)), &[0, 1, 2]);

        let err = uc.execute(Path::new("in.mp4"), &output_dir).unwrap_err();

        assert!(matches!(err, PipelineError::Write(WriteError::EmptyBuffer)));
        assert_eq!(err.exit_code(), 3);
        assert!(!output_dir.exists());
        assert!(recorded.lock().unwrap().format.is_none());
    }

    #[test]
    fn test_open_failure_is_media_open() {
        let dir = tempfile::tempdir().unwrap();
        let mut reader = StubReader::new(frames(1));
        reader.fail_open = true;
        let (mut uc, _) = use_case(reader, &[]);

        let err = uc.execute(Path::new("missing.mp4"), dir.path()).unwrap_err();
        assert!(matches!(err, PipelineError::MediaOpen { .. }));
        assert_eq!(err.exit_code(), 1);
    }

    #[test]
    fn test_decode_error_aborts_and_closes_input() {
        let dir = tempfile::tempdir().unwrap();
        let mut reader = StubReader::new(frames(2));
        reader.frames.push(Err("corrupt packet".into()));
        let closed = reader.closed.clone();
        let (mut uc, recorded) = use_case(reader, &[]);

        let err = uc.execute(Path::new("in.mp4"), dir.path()).unwrap_err();

        assert!(matches!(err, PipelineError::Decode(_)));
        assert!(closed.load(Ordering::SeqCst));
        assert!(recorded.lock().unwrap().frames.is_empty());
    }

    #[test]
    fn test_second_execute_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let (mut uc, _) = use_case(StubReader::new(frames(2)), &[]);

        uc.execute(Path::new("in.mp4"), dir.path()).unwrap();
        let err = uc.execute(Path::new("in.mp4"), dir.path()).unwrap_err();
        assert!(matches!(err, PipelineError::AlreadyFinalized));
    }

    #[test]
    fn test_frame_export_names_by_source_index() {
        let dir = tempfile::tempdir().unwrap();
        let export_dir = dir.path().join("frames");
        let paths = Arc::new(Mutex::new(Vec::new()));
        let (uc, _) = use_case(StubReader::new(frames(4)), &[1]);
        let mut uc = uc.with_frame_export(
            Box::new(StubImageWriter {
                paths: paths.clone(),
            }),
            export_dir.clone(),
        );

        uc.execute(Path::new("in.mp4"), dir.path()).unwrap();

        let paths = paths.lock().unwrap();
        assert_eq!(
            *paths,
            vec![
                export_dir.join("frame_0.png"),
                export_dir.join("frame_2.png"),
                export_dir.join("frame_3.png"),
            ]
        );
    }

    #[test]
    fn test_export_failure_keeps_written_video() {
        let dir = tempfile::tempdir().unwrap();
        let output_dir = dir.path().join("cropped_vids");
        let (uc, recorded) = use_case(StubReader::new(frames(3)), &[]);
        let mut uc = uc.with_frame_export(Box::new(FailingImageWriter), dir.path().join("frames"));

        let err = uc.execute(Path::new("in.mp4"), &output_dir).unwrap_err();

        assert!(matches!(err, PipelineError::Write(WriteError::Export { .. })));
        assert_eq!(err.exit_code(), 3);
        assert!(output_dir.join("output.avi").exists());
        let rec = recorded.lock().unwrap();
        assert!(rec.closed);
        assert_eq!(rec.frames.len(), 3);
    }

    #[test]
    fn test_skips_reported_to_logger() {
        struct RecordingLogger(Arc<Mutex<Vec<(usize, SkipReason)>>>);

        impl PipelineLogger for RecordingLogger {
            fn progress(&mut self, _current: usize, _total: usize) {}
            fn timing(&mut self, _stage: &str, _duration_ms: f64) {}
            fn skip(&mut self, frame_index: usize, reason: &SkipReason) {
                self.0.lock().unwrap().push((frame_index, *reason));
            }
            fn info(&mut self, _message: &str) {}
        }

        let dir = tempfile::tempdir().unwrap();
        let skips = Arc::new(Mutex::new(Vec::new()));
        let (uc, _) = use_case(StubReader::new(frames(4)), &[0, 3]);
        let CropFacesUseCase {
            reader,
            pipeline,
            sink,
            ..
        } = uc;
        let mut uc = CropFacesUseCase::new(
            reader,
            pipeline,
            sink,
            Box::new(RecordingLogger(skips.clone())),
        );

        uc.execute(Path::new("in.mp4"), dir.path()).unwrap();

        assert_eq!(
            *skips.lock().unwrap(),
            vec![(0, SkipReason::NoFace), (3, SkipReason::NoFace)]
        );
    }

    #[test]
    fn test_end_to_end_with_ffmpeg() {
        use crate::video::infrastructure::ffmpeg_reader::test_support::create_test_video;
        use crate::video::infrastructure::ffmpeg_reader::FfmpegReader;
        use crate::video::infrastructure::ffmpeg_writer::FfmpegWriter;

        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("input.mp4");
        create_test_video(&input, 10, 200, 200, 30);
        let output_dir = dir.path().join("cropped_vids");

        let detector = StubDetector {
            bbox: BoundingBox::new(75, 75, 50, 50),
            no_face: HashSet::new(),
        };
        let pipeline = FaceCropPipeline::new(
            Box::new(detector),
            Box::new(ImageFrameResizer::default()),
            CropSettings::new(10, OutputSize::new(100, 100).unwrap()),
        );
        let sink = VideoSink::new(Box::new(FfmpegWriter::new()), SinkSettings::default());
        let mut uc = CropFacesUseCase::new(
            Box::new(FfmpegReader::new()),
            pipeline,
            sink,
            Box::new(NullPipelineLogger),
        );

        let summary = uc.execute(&input, &output_dir).unwrap();
        assert_eq!(summary.frames_buffered, 10);

        let mut reader = FfmpegReader::new();
        let meta = reader.open(&summary.output_path).unwrap();
        assert_eq!((meta.width, meta.height), (100, 100));
        approx::assert_relative_eq!(meta.fps, 15.0, epsilon = 0.01);
        assert_eq!(reader.frames().count(), 10);
    }
}
