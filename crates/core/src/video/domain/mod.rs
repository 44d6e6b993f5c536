pub mod frame_source;
pub mod image_writer;
pub mod output_format;
pub mod video_reader;
pub mod video_writer;
