pub mod crop_faces_use_case;
pub mod face_crop_pipeline;
pub mod frame_buffer;
pub mod pipeline_logger;
pub mod video_sink;
