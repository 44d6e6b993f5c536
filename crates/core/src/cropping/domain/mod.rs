pub mod crop_rect;
pub mod frame_cropper;
pub mod frame_resizer;
