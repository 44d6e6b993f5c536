pub const YOLO_MODEL_NAME: &str = "yolo11n-pose_widerface.onnx";

/// Extra pixels added to the right and bottom of every detected face box.
pub const DEFAULT_MARGIN: u32 = 30;
pub const DEFAULT_OUTPUT_WIDTH: u32 = 300;
pub const DEFAULT_OUTPUT_HEIGHT: u32 = 300;
pub const DEFAULT_OUTPUT_FPS: f64 = 15.0;

pub const DEFAULT_OUTPUT_DIR: &str = "cropped_vids";
pub const OUTPUT_FILE_NAME: &str = "output.avi";

/// Log progress every N frames.
pub const PROGRESS_THROTTLE_FRAMES: usize = 25;
