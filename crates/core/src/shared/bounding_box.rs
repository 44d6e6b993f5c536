/// A detected face rectangle in frame pixel coordinates.
///
/// Detectors may report boxes that start left of or above the frame, so
/// the origin is signed.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct BoundingBox {
    pub xmin: i32,
    pub ymin: i32,
    pub width: i32,
    pub height: i32,
}

impl BoundingBox {
    pub fn new(xmin: i32, ymin: i32, width: i32, height: i32) -> Self {
        Self {
            xmin,
            ymin,
            width,
            height,
        }
    }

    /// Builds a box from floating-point corners, truncating toward zero.
    pub fn from_corners(x1: f64, y1: f64, x2: f64, y2: f64) -> Self {
        let xmin = x1 as i32;
        let ymin = y1 as i32;
        Self {
            xmin,
            ymin,
            width: (x2 as i32 - xmin).max(0),
            height: (y2 as i32 - ymin).max(0),
        }
    }

    pub fn area(&self) -> i64 {
        self.width.max(0) as i64 * self.height.max(0) as i64
    }
}
