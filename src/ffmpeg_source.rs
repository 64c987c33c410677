// RTSP frame source using ffmpeg-next
// Requires FFmpeg libraries: libavcodec, libavformat, libavutil, libswscale
//
// To install FFmpeg development libraries:
// - Ubuntu/Debian: sudo apt install libavcodec-dev libavformat-dev libavutil-dev libswscale-dev libavdevice-dev
// - Fedora: sudo dnf install ffmpeg-devel
// - macOS: brew install ffmpeg
// - Windows: Download from https://ffmpeg.org and set FFMPEG_DIR environment variable

#[cfg(feature = "ffmpeg")]
mod source_impl {
    extern crate ffmpeg_next as ffmpeg;
    use ffmpeg::format::Pixel;
    use ffmpeg::media::Type;
    use ffmpeg::software::scaling::{context::Context as ScalingContext, flag::Flags};
    use ffmpeg::util::frame::video::Video as VideoFrame;
    use tracing::{debug, warn};

    use crate::error::SourceError;
    use crate::models::Frame;
    use crate::source::{FrameSource, SourceOpener};

    /// Packets read per `read_frame` call before giving up on this tick
    const MAX_PACKETS_PER_READ: usize = 512;

    pub struct FfmpegOpener;

    impl FfmpegOpener {
        pub fn new() -> Self {
            // Initialize FFmpeg
            ffmpeg::init().ok();
            Self
        }
    }

    impl SourceOpener for FfmpegOpener {
        fn open(&mut self, url: &str) -> Result<Box<dyn FrameSource>, SourceError> {
            // Set options for network streams
            let mut options = ffmpeg::Dictionary::new();
            options.set("rtsp_transport", "tcp");
            options.set("timeout", "5000000"); // 5 second timeout
            options.set("buffer_size", "1024000");

            let input = ffmpeg::format::input_with_dictionary(&url, options)
                .map_err(|e| SourceError::Open(e.to_string()))?;

            // Find video stream
            let (video_stream_index, decoder) = {
                let stream = input
                    .streams()
                    .best(Type::Video)
                    .ok_or(SourceError::NoVideoStream)?;
                let context = ffmpeg::codec::context::Context::from_parameters(stream.parameters())
                    .map_err(|e| SourceError::Decoder(e.to_string()))?;
                let decoder = context
                    .decoder()
                    .video()
                    .map_err(|e| SourceError::Decoder(e.to_string()))?;
                (stream.index(), decoder)
            };

            debug!("Opened {} (video stream #{})", url, video_stream_index);

            Ok(Box::new(FfmpegSource {
                stream: Some(OpenStream {
                    input,
                    decoder,
                    video_stream_index,
                    scaler: None,
                }),
            }))
        }
    }

    struct OpenStream {
        input: ffmpeg::format::context::Input,
        decoder: ffmpeg::decoder::Video,
        video_stream_index: usize,
        scaler: Option<(ScalingContext, u32, u32)>,
    }

    impl OpenStream {
        fn to_rgb(&mut self, decoded: &VideoFrame) -> Option<Frame> {
            let width = decoded.width();
            let height = decoded.height();

            // Recreate the scaler when the stream changes resolution
            let stale = !matches!(&self.scaler, Some((_, w, h)) if *w == width && *h == height);
            if stale {
                match ScalingContext::get(
                    decoded.format(),
                    width,
                    height,
                    Pixel::RGB24,
                    width,
                    height,
                    Flags::BILINEAR,
                ) {
                    Ok(s) => self.scaler = Some((s, width, height)),
                    Err(e) => {
                        warn!("Failed to create scaler: {}", e);
                        return None;
                    }
                }
            }
            let (scaler, _, _) = self.scaler.as_mut()?;

            let mut rgb_frame = VideoFrame::empty();
            if scaler.run(decoded, &mut rgb_frame).is_err() {
                return None;
            }

            let data = rgb_frame.data(0);
            let stride = rgb_frame.stride(0);
            let row_len = width as usize * 3;

            // Copy frame data (handling stride)
            let mut frame_data = Vec::with_capacity(row_len * height as usize);
            for y in 0..height as usize {
                let row_start = y * stride;
                frame_data.extend_from_slice(&data[row_start..row_start + row_len]);
            }

            Some(Frame {
                width,
                height,
                data: frame_data,
            })
        }
    }

    pub struct FfmpegSource {
        stream: Option<OpenStream>,
    }

    impl FrameSource for FfmpegSource {
        fn read_frame(&mut self) -> Option<Frame> {
            let stream = self.stream.as_mut()?;

            for _ in 0..MAX_PACKETS_PER_READ {
                let mut decoded = VideoFrame::empty();
                if stream.decoder.receive_frame(&mut decoded).is_ok() {
                    return stream.to_rgb(&decoded);
                }

                let mut packet = ffmpeg::Packet::empty();
                match packet.read(&mut stream.input) {
                    Ok(()) => {}
                    Err(ffmpeg::Error::Eof) => {
                        // Flush whatever the decoder still holds before giving up
                        if stream.decoder.send_eof().is_ok()
                            && stream.decoder.receive_frame(&mut decoded).is_ok()
                        {
                            return stream.to_rgb(&decoded);
                        }
                        debug!("End of stream, decoder drained");
                        return None;
                    }
                    Err(e) => {
                        warn!("Failed to read packet: {}", e);
                        return None;
                    }
                }

                // Only process video packets
                if packet.stream() != stream.video_stream_index {
                    continue;
                }
                if stream.decoder.send_packet(&packet).is_err() {
                    continue;
                }
            }

            warn!("No frame decoded after {} packets", MAX_PACKETS_PER_READ);
            None
        }

        fn close(&mut self) {
            self.stream = None;
        }
    }
}

// Stub implementation when the ffmpeg feature is disabled
#[cfg(not(feature = "ffmpeg"))]
mod source_impl {
    use crate::error::SourceError;
    use crate::source::{FrameSource, SourceOpener};

    pub struct FfmpegOpener;

    impl FfmpegOpener {
        pub fn new() -> Self {
            Self
        }
    }

    impl SourceOpener for FfmpegOpener {
        fn open(&mut self, _url: &str) -> Result<Box<dyn FrameSource>, SourceError> {
            Err(SourceError::Unavailable)
        }
    }
}

// Re-export
pub use source_impl::*;

impl Default for FfmpegOpener {
    fn default() -> Self {
        Self::new()
    }
}
