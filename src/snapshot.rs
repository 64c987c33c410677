//! Snapshot naming and PNG output.
//!
//! Snapshot numbers are recomputed from the directory listing on every call,
//! so numbering survives restarts and files deleted or added behind our back.

use crate::error::StreamError;
use crate::models::Frame;
use image::codecs::png::PngEncoder;
use image::{ColorType, ImageEncoder};
use regex::Regex;
use std::fs::{self, OpenOptions};
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};
use std::sync::OnceLock;

fn snapshot_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"^streamy-(\d+)\.png$").expect("valid snapshot regex"))
}

/// Default snapshot folder: the desktop, else home, else the working directory.
pub fn default_snapshot_dir() -> PathBuf {
    dirs::desktop_dir()
        .or_else(dirs::home_dir)
        .unwrap_or_else(|| PathBuf::from("."))
}

/// `streamy-NNNN.png`, zero padded to four digits and widening past 9999.
pub fn snapshot_file_name(index: u64) -> String {
    format!("streamy-{:04}.png", index)
}

/// Next free snapshot number in `directory`; an empty directory starts at 1.
/// A listing failure is an error, never "no snapshots yet".
pub fn next_index(directory: &Path) -> io::Result<u64> {
    let mut max: Option<u64> = None;
    for entry in fs::read_dir(directory)? {
        let name = entry?.file_name();
        let Some(index) = name.to_str().and_then(parse_index) else {
            continue;
        };
        max = max.max(Some(index));
    }
    Ok(max.map_or(1, |max| max.saturating_add(1)))
}

fn parse_index(name: &str) -> Option<u64> {
    let caps = snapshot_pattern().captures(name)?;
    caps.get(1)?.as_str().parse::<u64>().ok()
}

pub fn next_path(directory: &Path) -> io::Result<PathBuf> {
    Ok(directory.join(snapshot_file_name(next_index(directory)?)))
}

/// Encode `frame` as PNG into a file that must not exist yet.
fn write_new_png(frame: &Frame, path: &Path) -> Result<(), StreamError> {
    let file = OpenOptions::new()
        .write(true)
        .create_new(true)
        .open(path)
        .map_err(|source| StreamError::SnapshotFile {
            path: path.to_path_buf(),
            source,
        })?;

    let mut writer = BufWriter::new(file);
    let encoded = PngEncoder::new(&mut writer).write_image(
        &frame.data,
        frame.width,
        frame.height,
        ColorType::Rgb8.into(),
    );
    let result = match encoded {
        Ok(()) => writer.flush().map_err(|source| StreamError::SnapshotFile {
            path: path.to_path_buf(),
            source,
        }),
        Err(source) => Err(StreamError::SnapshotWrite {
            path: path.to_path_buf(),
            source,
        }),
    };
    if result.is_err() {
        // Only remove what this call created
        drop(writer);
        let _ = fs::remove_file(path);
    }
    result
}

/// Write `frame` as a PNG to the next free path in `directory` and return it.
pub fn save_snapshot(frame: &Frame, directory: &Path) -> Result<PathBuf, StreamError> {
    let dir_error = |source: io::Error| StreamError::SnapshotDir {
        path: directory.to_path_buf(),
        source,
    };
    fs::create_dir_all(directory).map_err(dir_error)?;

    let path = next_path(directory).map_err(dir_error)?;
    write_new_png(frame, &path)?;

    Ok(path)
}
