use std::path::{Path, PathBuf};
use std::process;

use clap::error::ErrorKind;
use clap::Parser;

use facecrop_core::cropping::domain::frame_resizer::ResizeFilter;
use facecrop_core::cropping::infrastructure::image_frame_resizer::ImageFrameResizer;
use facecrop_core::detection::domain::face_detector::FaceDetector;
use facecrop_core::detection::infrastructure::model_resolver::ModelResolver;
use facecrop_core::detection::infrastructure::onnx_yolo_detector::OnnxYoloFaceDetector;
use facecrop_core::pipeline::crop_faces_use_case::CropFacesUseCase;
use facecrop_core::pipeline::face_crop_pipeline::{CropSettings, FaceCropPipeline};
use facecrop_core::pipeline::pipeline_logger::StdoutPipelineLogger;
use facecrop_core::pipeline::video_sink::{SinkSettings, VideoSink};
use facecrop_core::shared::constants::{
    DEFAULT_MARGIN, DEFAULT_OUTPUT_DIR, DEFAULT_OUTPUT_FPS, YOLO_MODEL_NAME,
};
use facecrop_core::shared::error::PipelineError;
use facecrop_core::shared::output_size::OutputSize;
use facecrop_core::video::domain::output_format::VideoCodec;
use facecrop_core::video::infrastructure::ffmpeg_reader::FfmpegReader;
use facecrop_core::video::infrastructure::ffmpeg_writer::FfmpegWriter;
use facecrop_core::video::infrastructure::image_file_writer::ImageFileWriter;

/// Crop the face out of every frame of a video into a fixed-size clip.
#[derive(Parser)]
#[command(name = "facecrop")]
struct Cli {
    /// Input video file.
    input: PathBuf,

    /// Directory that receives output.avi (created if missing).
    #[arg(long, default_value = DEFAULT_OUTPUT_DIR)]
    output_dir: PathBuf,

    /// Pixels added to the right and bottom of each face box.
    #[arg(long, default_value_t = DEFAULT_MARGIN)]
    margin: u32,

    /// Output frame size as WIDTHxHEIGHT.
    #[arg(long, default_value = "300x300")]
    size: String,

    /// Output frame rate.
    #[arg(long, default_value_t = DEFAULT_OUTPUT_FPS)]
    fps: f64,

    /// Output codec: divx or mjpeg.
    #[arg(long, default_value = "divx")]
    codec: String,

    /// Resize filter: nearest, bilinear, catmull-rom or lanczos3.
    #[arg(long, default_value = "bilinear")]
    filter: String,

    /// ONNX face model to use instead of the one in the model cache.
    #[arg(long)]
    model: Option<PathBuf>,

    /// Also save every cropped frame as a PNG into this directory.
    #[arg(long)]
    save_frames: Option<PathBuf>,
}

/// Parsed and validated command-line settings.
struct Settings {
    crop: CropSettings,
    sink: SinkSettings,
    filter: ResizeFilter,
}

fn main() {
    env_logger::init();

    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(e) => {
            let code = usage_exit_code(&e);
            let _ = e.print();
            process::exit(code);
        }
    };

    if let Err(e) = run(cli) {
        eprintln!("Error: {e}");
        process::exit(e.exit_code());
    }
}

/// Help and version output succeed; any other usage error is a
/// configuration failure.
fn usage_exit_code(err: &clap::Error) -> i32 {
    match err.kind() {
        ErrorKind::DisplayHelp | ErrorKind::DisplayVersion => 0,
        _ => 1,
    }
}

fn run(cli: Cli) -> Result<(), PipelineError> {
    let settings = validate(&cli)?;

    let detector = build_detector(cli.model.as_deref())?;
    let pipeline = FaceCropPipeline::new(
        detector,
        Box::new(ImageFrameResizer::new(settings.filter)),
        settings.crop,
    );
    let sink = VideoSink::new(Box::new(FfmpegWriter::new()), settings.sink);

    let mut use_case = CropFacesUseCase::new(
        Box::new(FfmpegReader::new()),
        pipeline,
        sink,
        Box::new(StdoutPipelineLogger::default()),
    );
    if let Some(dir) = cli.save_frames {
        use_case = use_case.with_frame_export(Box::new(ImageFileWriter::new()), dir);
    }

    let summary = use_case.execute(&cli.input, &cli.output_dir)?;
    log::info!(
        "Output written to {} ({} frames, {} skipped)",
        summary.output_path.display(),
        summary.frames_buffered,
        summary.frames_skipped
    );
    Ok(())
}

fn validate(cli: &Cli) -> Result<Settings, PipelineError> {
    let output_size: OutputSize = cli.size.parse()?;
    let codec: VideoCodec = cli.codec.parse()?;
    let filter: ResizeFilter = cli.filter.parse()?;
    let sink = SinkSettings::new(cli.fps, codec)?;

    if !cli.input.is_file() {
        return Err(PipelineError::MediaOpen {
            path: cli.input.clone(),
            source: "file not found".into(),
        });
    }
    if let Some(model) = &cli.model {
        if !model.is_file() {
            return Err(PipelineError::InvalidConfig(format!(
                "model file not found: {}",
                model.display()
            )));
        }
    }

    Ok(Settings {
        crop: CropSettings::new(cli.margin, output_size),
        sink,
        filter,
    })
}

fn build_detector(model: Option<&Path>) -> Result<Box<dyn FaceDetector>, PipelineError> {
    let model_path = match model {
        Some(path) => path.to_path_buf(),
        None => resolve_model().map_err(PipelineError::DetectorInit)?,
    };
    let detector = OnnxYoloFaceDetector::new(&model_path).map_err(PipelineError::DetectorInit)?;
    Ok(Box::new(detector))
}

fn resolve_model() -> Result<PathBuf, Box<dyn std::error::Error>> {
    let path = ModelResolver::user_cache()?.resolve(YOLO_MODEL_NAME)?;
    log::info!("Using model {}", path.display());
    Ok(path)
}
