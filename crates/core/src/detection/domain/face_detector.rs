use crate::shared::bounding_box::BoundingBox;
use crate::shared::frame::Frame;

/// Domain interface for face detection.
///
/// Returns candidate boxes ranked by the detector's own confidence,
/// best first. "No face" is an empty list, never an error; `Err` is
/// reserved for the detector itself breaking.
///
/// Implementations may keep per-run state, hence `&mut self`.
pub trait FaceDetector: Send {
    fn detect(&mut self, frame: &Frame) -> Result<Vec<BoundingBox>, Box<dyn std::error::Error>>;
}
