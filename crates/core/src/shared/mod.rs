pub mod bounding_box;
pub mod constants;
pub mod error;
pub mod frame;
pub mod output_size;
pub mod video_metadata;
