pub mod image_frame_resizer;
