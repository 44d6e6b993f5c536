use crate::shared::bounding_box::BoundingBox;

/// Outcome of running the detector on one frame.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Detection {
    Detected(BoundingBox),
    NoFace,
}

impl Detection {
    /// Keeps the top-ranked candidate; only one face per frame is used.
    pub fn from_ranked(candidates: &[BoundingBox]) -> Self {
        candidates
            .first()
            .copied()
            .map_or(Detection::NoFace, Detection::Detected)
    }
}
