use std::path::Path;

use ffmpeg_next::format::Pixel;
use ffmpeg_next::Rational;

use crate::shared::frame::Frame;
use crate::video::domain::output_format::{OutputFormat, VideoCodec};
use crate::video::domain::video_writer::VideoWriter;

/// Everything that only exists between `open` and `close`.
struct OpenEncoder {
    octx: ffmpeg_next::format::context::Output,
    encoder: ffmpeg_next::codec::encoder::video::Encoder,
    scaler: ffmpeg_next::software::scaling::Context,
    encoder_time_base: Rational,
    width: u32,
    height: u32,
    frame_count: usize,
}

/// Encodes RGB frames into a video file via ffmpeg-next.
///
/// The container is chosen from the output extension. AVI outputs get the
/// codec's FourCC (`DIVX`, `MJPG`) written into the stream header.
pub struct FfmpegWriter {
    state: Option<OpenEncoder>,
}

// Safety: FfmpegWriter is only used from a single thread at a time.
// The raw pointers inside ffmpeg types are not shared across threads.
unsafe impl Send for FfmpegWriter {}

impl FfmpegWriter {
    pub fn new() -> Self {
        Self { state: None }
    }
}

impl Default for FfmpegWriter {
    fn default() -> Self {
        Self::new()
    }
}

impl VideoWriter for FfmpegWriter {
    fn open(&mut self, path: &Path, format: &OutputFormat) -> Result<(), Box<dyn std::error::Error>> {
        if self.state.is_some() {
            return Err("FfmpegWriter: already open".into());
        }
        let fps = integer_fps(format.fps)
            .ok_or_else(|| format!("encoder needs a whole frame rate, got {}", format.fps))?;
        ffmpeg_next::init()?;

        let mut octx = ffmpeg_next::format::output(path)?;
        let global_header = octx
            .format()
            .flags()
            .contains(ffmpeg_next::format::Flags::GLOBAL_HEADER);

        let codec = ffmpeg_next::encoder::find(codec_id(format.codec))
            .ok_or_else(|| format!("{} encoder not available", format.codec))?;
        let mut ost = octx.add_stream(Some(codec))?;

        let mut encoder_ctx = ffmpeg_next::codec::context::Context::new_with_codec(codec)
            .encoder()
            .video()?;

        let pixel_format = pixel_format(format.codec);
        let encoder_time_base = Rational(1, fps);

        encoder_ctx.set_width(format.width);
        encoder_ctx.set_height(format.height);
        encoder_ctx.set_format(pixel_format);
        encoder_ctx.set_time_base(encoder_time_base);
        encoder_ctx.set_frame_rate(Some(Rational(fps, 1)));
        if global_header {
            encoder_ctx.set_flags(ffmpeg_next::codec::Flags::GLOBAL_HEADER);
        }

        let encoder = encoder_ctx.open_with(ffmpeg_next::Dictionary::new())?;
        ost.set_parameters(&encoder);
        ost.set_time_base(encoder_time_base);
        if is_avi(path) {
            let tag = u32::from_le_bytes(format.codec.fourcc());
            unsafe {
                (*ost.parameters().as_mut_ptr()).codec_tag = tag;
            }
        }

        octx.write_header()?;

        let scaler = ffmpeg_next::software::scaling::Context::get(
            Pixel::RGB24,
            format.width,
            format.height,
            pixel_format,
            format.width,
            format.height,
            ffmpeg_next::software::scaling::Flags::BILINEAR,
        )?;

        log::debug!(
            "Encoding {} as {} {}x{} @ {fps} fps",
            path.display(),
            format.codec,
            format.width,
            format.height
        );

        self.state = Some(OpenEncoder {
            octx,
            encoder,
            scaler,
            encoder_time_base,
            width: format.width,
            height: format.height,
            frame_count: 0,
        });
        Ok(())
    }

    fn write(&mut self, frame: &Frame) -> Result<(), Box<dyn std::error::Error>> {
        let state = self.state.as_mut().ok_or("FfmpegWriter: not opened")?;

        if frame.dimensions() != (state.width, state.height) {
            return Err(format!(
                "frame {} is {}x{}, encoder expects {}x{}",
                frame.index(),
                frame.width(),
                frame.height(),
                state.width,
                state.height
            )
            .into());
        }
        if frame.channels() != 3 {
            return Err(format!("expected RGB frame, got {} channels", frame.channels()).into());
        }

        let mut rgb_frame =
            ffmpeg_next::util::frame::video::Video::new(Pixel::RGB24, state.width, state.height);
        let stride = rgb_frame.stride(0);
        let row_len = state.width as usize * 3;
        let dst = rgb_frame.data_mut(0);
        for (row, src_row) in frame.data().chunks_exact(row_len).enumerate() {
            let start = row * stride;
            dst[start..start + row_len].copy_from_slice(src_row);
        }

        let mut yuv_frame = ffmpeg_next::util::frame::video::Video::empty();
        state.scaler.run(&rgb_frame, &mut yuv_frame)?;
        yuv_frame.set_pts(Some(state.frame_count as i64));

        state.encoder.send_frame(&yuv_frame)?;
        state.drain_packets()?;

        state.frame_count += 1;
        Ok(())
    }

    fn close(&mut self) -> Result<(), Box<dyn std::error::Error>> {
        let Some(mut state) = self.state.take() else {
            return Ok(());
        };
        state.encoder.send_eof()?;
        state.drain_packets()?;
        state.octx.write_trailer()?;
        log::debug!("Encoder closed after {} frames", state.frame_count);
        Ok(())
    }
}

impl OpenEncoder {
    fn drain_packets(&mut self) -> Result<(), ffmpeg_next::Error> {
        let ost_time_base = self
            .octx
            .stream(0)
            .map(|s| s.time_base())
            .unwrap_or(self.encoder_time_base);

        let mut encoded = ffmpeg_next::Packet::empty();
        while self.encoder.receive_packet(&mut encoded).is_ok() {
            encoded.set_stream(0);
            encoded.rescale_ts(self.encoder_time_base, ost_time_base);
            encoded.write_interleaved(&mut self.octx)?;
        }
        Ok(())
    }
}

fn codec_id(codec: VideoCodec) -> ffmpeg_next::codec::Id {
    match codec {
        VideoCodec::Mpeg4 => ffmpeg_next::codec::Id::MPEG4,
        VideoCodec::Mjpeg => ffmpeg_next::codec::Id::MJPEG,
    }
}

fn pixel_format(codec: VideoCodec) -> Pixel {
    match codec {
        VideoCodec::Mpeg4 => Pixel::YUV420P,
        VideoCodec::Mjpeg => Pixel::YUVJ420P,
    }
}

/// The frame rate as an exact integer, or `None` if it has a fraction or is
/// below 1.
fn integer_fps(fps: f64) -> Option<i32> {
    if fps.is_finite() && fps >= 1.0 && fps.fract() == 0.0 && fps <= i32::MAX as f64 {
        Some(fps as i32)
    } else {
        None
    }
}

fn is_avi(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| e.eq_ignore_ascii_case("avi"))
}
