//! Error types for the stream viewer.
//!
//! `StreamError` is what the window shows to the user in a blocking dialog.
//! `SourceError` comes back from a frame source that could not be opened, and
//! `ConfigError` never leaves the config store: it is logged and the store
//! falls back to defaults or its in-memory state.

use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum StreamError {
    #[error("Please enter a camera address")]
    EmptyAddress,

    #[error(
        "Could not connect to the camera at {url}.\n\nPlease check that the camera is powered on, \
         connected to the network, and has streaming enabled.\n\n({reason})"
    )]
    SourceUnreachable { url: String, reason: String },

    #[error(
        "Connected to {url} but could not read video frames.\n\n\
         Please check that the camera is functioning properly."
    )]
    NoFrame { url: String },

    #[error("No video stream is active")]
    NotStreaming,

    #[error("Failed to prepare snapshot folder {}: {source}", path.display())]
    SnapshotDir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to create snapshot {}: {source}", path.display())]
    SnapshotFile {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to save snapshot {}: {source}", path.display())]
    SnapshotWrite {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },
}

impl StreamError {
    /// Dialog title for this error.
    pub fn title(&self) -> &'static str {
        match self {
            StreamError::EmptyAddress => "Error",
            StreamError::SourceUnreachable { .. } => "Connection Error",
            StreamError::NoFrame { .. } => "Video Error",
            StreamError::NotStreaming
            | StreamError::SnapshotDir { .. }
            | StreamError::SnapshotFile { .. }
            | StreamError::SnapshotWrite { .. } => "Snapshot Error",
        }
    }
}

#[derive(Error, Debug)]
pub enum SourceError {
    #[error("failed to open stream: {0}")]
    Open(String),

    #[error("no video stream found")]
    NoVideoStream,

    #[error("failed to create decoder: {0}")]
    Decoder(String),

    #[error("streaming support not enabled. Build with --features ffmpeg")]
    Unavailable,
}

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("config I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("config parse error: {0}")]
    Json(#[from] serde_json::Error),
}
