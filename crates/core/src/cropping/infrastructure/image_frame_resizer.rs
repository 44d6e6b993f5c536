use image::imageops::FilterType;

use crate::cropping::domain::frame_resizer::{FrameResizer, ResizeFilter};
use crate::shared::frame::Frame;
use crate::shared::output_size::OutputSize;

/// Resizes RGB frames with `image::imageops::resize`.
pub struct ImageFrameResizer {
    filter: ResizeFilter,
}

impl ImageFrameResizer {
    pub fn new(filter: ResizeFilter) -> Self {
        Self { filter }
    }
}

impl Default for ImageFrameResizer {
    fn default() -> Self {
        Self::new(ResizeFilter::default())
    }
}

impl FrameResizer for ImageFrameResizer {
    fn resize(
        &self,
        frame: &Frame,
        size: OutputSize,
    ) -> Result<Frame, Box<dyn std::error::Error>> {
        if frame.is_empty() {
            return Err("cannot resize an empty frame".into());
        }
        if frame.channels() != 3 {
            return Err(format!("expected 3 channels, got {}", frame.channels()).into());
        }

        let (w, h) = size.as_tuple();
        if frame.dimensions() == (w, h) {
            return Ok(frame.clone());
        }

        let img = image::RgbImage::from_raw(frame.width(), frame.height(), frame.data().to_vec())
            .ok_or("Failed to create image from frame data")?;
        let resized = image::imageops::resize(&img, w, h, filter_type(self.filter));

        Ok(Frame::new(resized.into_raw(), w, h, 3, frame.index()))
    }
}

fn filter_type(filter: ResizeFilter) -> FilterType {
    match filter {
        ResizeFilter::Nearest => FilterType::Nearest,
        ResizeFilter::Bilinear => FilterType::Triangle,
        ResizeFilter::CatmullRom => FilterType::CatmullRom,
        ResizeFilter::Lanczos3 => FilterType::Lanczos3,
    }
}
