use ndarray::s;

use crate::cropping::domain::crop_rect::CropRect;
use crate::shared::bounding_box::BoundingBox;
use crate::shared::error::PipelineError;
use crate::shared::frame::Frame;

/// Cuts the face region, grown by a fixed margin, out of a frame.
#[derive(Clone, Copy, Debug)]
pub struct FrameCropper {
    margin: u32,
}

impl FrameCropper {
    pub fn new(margin: u32) -> Self {
        Self { margin }
    }

    pub fn margin(&self) -> u32 {
        self.margin
    }

    /// Crops `frame` around `bbox`, clamping the rectangle to the frame.
    ///
    /// Fails with `CropOutOfBounds` when the clamped rectangle is empty.
    pub fn crop(&self, frame: &Frame, bbox: &BoundingBox) -> Result<Frame, PipelineError> {
        let rect = CropRect::around(bbox, self.margin);
        let clamped =
            rect.clamp(frame.width(), frame.height())
                .ok_or(PipelineError::CropOutOfBounds {
                    frame_index: frame.index(),
                    rect,
                })?;
        Ok(slice(frame, &clamped))
    }
}

/// Copies the pixels of an in-bounds rectangle into a new frame.
fn slice(frame: &Frame, rect: &CropRect) -> Frame {
    let x1 = rect.x as usize;
    let y1 = rect.y as usize;
    let x2 = rect.right() as usize;
    let y2 = rect.bottom() as usize;

    let view = frame.as_ndarray();
    let data: Vec<u8> = view.slice(s![y1..y2, x1..x2, ..]).iter().copied().collect();

    Frame::new(
        data,
        (x2 - x1) as u32,
        (y2 - y1) as u32,
        frame.channels(),
        frame.index(),
    )
}
