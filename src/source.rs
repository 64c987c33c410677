//! Frame source capability.
//!
//! The controller never speaks RTSP itself. It asks a `SourceOpener` for a
//! `FrameSource` and pulls frames from it one at a time.

use crate::error::SourceError;
use crate::models::Frame;

/// RTSP port every camera is expected to listen on.
pub const RTSP_PORT: u16 = 554;

/// Stream URL for a camera address (`host[:port]`).
pub fn stream_url(address: &str) -> String {
    format!("rtsp://{}:{}/video", address, RTSP_PORT)
}

/// An open stream. Reads may fail at any call.
pub trait FrameSource {
    /// Next decoded frame, or `None` when nothing could be read.
    fn read_frame(&mut self) -> Option<Frame>;

    /// Release the underlying stream. Reads after close return `None`.
    fn close(&mut self);
}

pub trait SourceOpener {
    fn open(&mut self, url: &str) -> Result<Box<dyn FrameSource>, SourceError>;
}
