use crate::shared::bounding_box::BoundingBox;

/// Rectangle to cut out of a frame, in pixel coordinates.
///
/// Built from a face box plus margin, then clamped against the frame
/// before any pixels are touched.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct CropRect {
    pub x: i32,
    pub y: i32,
    pub width: i32,
    pub height: i32,
}

impl CropRect {
    pub fn new(x: i32, y: i32, width: i32, height: i32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// Spans `(xmin, ymin)` to `(xmin + width + margin, ymin + height + margin)`.
    ///
    /// The margin only grows the right and bottom edges.
    pub fn around(bbox: &BoundingBox, margin: u32) -> Self {
        let margin = i32::try_from(margin).unwrap_or(i32::MAX);
        Self {
            x: bbox.xmin,
            y: bbox.ymin,
            width: bbox.width.max(0).saturating_add(margin),
            height: bbox.height.max(0).saturating_add(margin),
        }
    }

    pub fn right(&self) -> i32 {
        self.x.saturating_add(self.width)
    }

    pub fn bottom(&self) -> i32 {
        self.y.saturating_add(self.height)
    }

    pub fn is_empty(&self) -> bool {
        self.width <= 0 || self.height <= 0
    }

    /// Intersects the rectangle with a `frame_width` x `frame_height` frame.
    ///
    /// Returns `None` when nothing of the rectangle lies inside the frame.
    pub fn clamp(&self, frame_width: u32, frame_height: u32) -> Option<CropRect> {
        let fw = i32::try_from(frame_width).unwrap_or(i32::MAX);
        let fh = i32::try_from(frame_height).unwrap_or(i32::MAX);

        let x1 = self.x.clamp(0, fw);
        let y1 = self.y.clamp(0, fh);
        let x2 = self.right().clamp(0, fw);
        let y2 = self.bottom().clamp(0, fh);

        let clamped = CropRect::new(x1, y1, x2 - x1, y2 - y1);
        if clamped.is_empty() {
            None
        } else {
            Some(clamped)
        }
    }
}
