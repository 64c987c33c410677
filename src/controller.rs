//! Stream session controller.
//!
//! Owns at most one open `FrameSource`, the connection status state machine,
//! and the transient status line. Every method runs on the caller's thread;
//! the window's update loop is the single scheduling context and drives
//! polling through [`StreamController::tick`].
//!
//! State transitions:
//!
//! - `connect` tears down any current session, then ends in exactly one of
//!   `Connected`, `Degraded` (opened, first read failed) or `Error` (open failed).
//! - `poll` failing while `Connected` tears down and ends in `Degraded`.
//! - `disconnect` ends in `Disconnected` and publishes the placeholder frame.
//!
//! There is no automatic reconnect.

use std::path::PathBuf;
use std::sync::mpsc::{channel, Receiver, Sender};
use std::time::{Duration, Instant};

use tracing::{debug, info, warn};

use crate::config::RecentSourceStore;
use crate::error::StreamError;
use crate::models::{ConnectionStatus, ControllerEvent, Frame};
use crate::overlay;
use crate::snapshot;
use crate::source::{stream_url, FrameSource, SourceOpener};

/// Poll cadence while connected (~30 fps)
pub const POLL_INTERVAL: Duration = Duration::from_millis(33);

/// How long a transient status message stays up
pub const TRANSIENT_STATUS_DURATION: Duration = Duration::from_millis(5000);

/// Live binding to one open source
struct Session {
    address: String,
    url: String,
    generation: u64,
    source: Box<dyn FrameSource>,
    frame_width: u32,
    frame_height: u32,
    /// Most recent decoded frame, without overlays
    last_frame: Option<Frame>,
}

struct TransientStatus {
    message: String,
    previous: String,
    expires_at: Instant,
}

pub struct StreamController<O: SourceOpener> {
    opener: O,
    store: RecentSourceStore,
    snapshot_dir: PathBuf,
    session: Option<Session>,
    status: ConnectionStatus,
    transient: Option<TransientStatus>,
    generation: u64,
    next_poll: Option<Instant>,
    events: Sender<ControllerEvent>,
}

impl<O: SourceOpener> StreamController<O> {
    /// Build a controller and the receiver its updates are published on.
    pub fn new(
        opener: O,
        store: RecentSourceStore,
        snapshot_dir: impl Into<PathBuf>,
    ) -> (Self, Receiver<ControllerEvent>) {
        let (events, receiver) = channel();
        let controller = Self {
            opener,
            store,
            snapshot_dir: snapshot_dir.into(),
            session: None,
            status: ConnectionStatus::Disconnected,
            transient: None,
            generation: 0,
            next_poll: None,
            events,
        };
        controller.publish_status();
        controller.publish_recent();
        controller.publish_frame(overlay::placeholder_frame());
        (controller, receiver)
    }

    pub fn status(&self) -> &ConnectionStatus {
        &self.status
    }

    /// Text currently shown on the status line
    pub fn status_message(&self) -> String {
        match &self.transient {
            Some(t) => t.message.clone(),
            None => self.status.label(),
        }
    }

    pub fn is_connected(&self) -> bool {
        self.status.is_connected()
    }

    pub fn has_session(&self) -> bool {
        self.session.is_some()
    }

    pub fn address(&self) -> Option<&str> {
        self.session.as_ref().map(|s| s.address.as_str())
    }

    pub fn frame_size(&self) -> Option<(u32, u32)> {
        self.session
            .as_ref()
            .map(|s| (s.frame_width, s.frame_height))
    }

    pub fn last_frame(&self) -> Option<&Frame> {
        self.session.as_ref().and_then(|s| s.last_frame.as_ref())
    }

    pub fn recent_addresses(&self) -> &[String] {
        self.store.recent_addresses()
    }

    pub fn last_used_address(&self) -> &str {
        self.store.last_used_address()
    }

    pub fn include_timestamp(&self) -> bool {
        self.store.include_timestamp()
    }

    /// Open `address` and start streaming. Any current session is closed first.
    pub fn connect(&mut self, address: &str) -> Result<(), StreamError> {
        let address = address.trim();
        if address.is_empty() {
            return Err(StreamError::EmptyAddress);
        }

        if self.session.is_some() {
            self.disconnect();
        }

        let url = stream_url(address);
        info!("Connecting to {}", url);
        self.set_status(ConnectionStatus::Connecting);

        let mut source = match self.opener.open(&url) {
            Ok(source) => source,
            Err(e) => {
                warn!("Could not open {}: {}", url, e);
                self.set_status(ConnectionStatus::Error(e.to_string()));
                return Err(StreamError::SourceUnreachable {
                    url,
                    reason: e.to_string(),
                });
            }
        };

        let Some(first) = source.read_frame() else {
            warn!("Opened {} but could not read a frame", url);
            source.close();
            self.set_status(ConnectionStatus::Degraded);
            return Err(StreamError::NoFrame { url });
        };

        self.generation += 1;
        info!(
            "Connected to {} ({}x{})",
            url, first.width, first.height
        );

        self.session = Some(Session {
            address: address.to_string(),
            url,
            generation: self.generation,
            source,
            frame_width: first.width,
            frame_height: first.height,
            last_frame: Some(first.clone()),
        });
        self.store.add_address(address);
        self.publish_recent();
        self.set_status(ConnectionStatus::Connected);
        self.publish_display(first);
        self.next_poll = Some(Instant::now() + POLL_INTERVAL);

        Ok(())
    }

    /// Close the current session, if any.
    pub fn disconnect(&mut self) {
        if self.teardown() {
            info!("Disconnected");
            self.set_status(ConnectionStatus::Disconnected);
        }
    }

    /// Read one frame. Does nothing unless connected.
    pub fn poll(&mut self) {
        if !self.is_connected() {
            return;
        }
        let Some(session) = self.session.as_mut() else {
            return;
        };

        let generation = session.generation;
        let frame = session.source.read_frame();

        // The read borrows the session, so this cannot fire while reads are
        // synchronous. It guards a read moved onto a background worker, whose
        // result may arrive after a teardown or reconnect.
        if self.session.as_ref().map(|s| s.generation) != Some(generation) {
            debug!("Dropping frame for stale session #{}", generation);
            return;
        }

        let Some(frame) = frame else {
            let url = self.session.as_ref().map(|s| s.url.clone()).unwrap_or_default();
            warn!("Stream from {} interrupted", url);
            self.teardown();
            self.set_status(ConnectionStatus::Degraded);
            return;
        };

        if let Some(session) = self.session.as_mut() {
            session.last_frame = Some(frame.clone());
        }
        self.publish_display(frame);

        if !self.is_connected() {
            self.set_status(ConnectionStatus::Connected);
        }
    }

    /// Save the last frame as the next `streamy-NNNN.png` in the snapshot folder.
    pub fn take_snapshot(&mut self) -> Result<PathBuf, StreamError> {
        if !self.is_connected() {
            return Err(StreamError::NotStreaming);
        }
        let mut frame = self.last_frame().cloned().ok_or(StreamError::NotStreaming)?;

        if self.store.include_timestamp() {
            overlay::stamp_timestamp(&mut frame, &overlay::capture_timestamp());
        }

        let path = snapshot::save_snapshot(&frame, &self.snapshot_dir).map_err(|e| {
            warn!("Error saving snapshot: {}", e);
            e
        })?;
        info!("Snapshot saved to: {}", path.display());

        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        self.show_transient(format!("Snapshot saved: {}", name), Instant::now());

        Ok(path)
    }

    pub fn set_include_timestamp(&mut self, value: bool) {
        info!("Timestamp setting changed to: {}", value);
        self.store.set_include_timestamp(value);
    }

    /// Scheduler entry point: expire the transient message and poll when due.
    pub fn tick(&mut self, now: Instant) {
        self.expire_transient(now);

        if !self.is_connected() {
            self.next_poll = None;
            return;
        }

        match self.next_poll {
            Some(due) if now < due => {}
            _ => {
                self.next_poll = Some(now + POLL_INTERVAL);
                self.poll();
            }
        }
    }

    /// Earliest instant at which `tick` has work to do.
    pub fn next_wakeup(&self) -> Option<Instant> {
        let poll = self.next_poll.filter(|_| self.is_connected());
        let revert = self.transient.as_ref().map(|t| t.expires_at);
        match (poll, revert) {
            (Some(a), Some(b)) => Some(a.min(b)),
            (a, b) => a.or(b),
        }
    }

    /// Show `message` until `now + TRANSIENT_STATUS_DURATION`, then fall back
    /// to the status line that was showing before it. A newer message
    /// replaces this one and restarts the timer.
    fn show_transient(&mut self, message: String, now: Instant) {
        let previous = self.status.label();
        debug!("Setting temporary status: {} (Previous: {})", message, previous);
        self.transient = Some(TransientStatus {
            message,
            previous,
            expires_at: now + TRANSIENT_STATUS_DURATION,
        });
        self.publish_status();
    }

    fn expire_transient(&mut self, now: Instant) {
        let expired = matches!(&self.transient, Some(t) if now >= t.expires_at);
        if !expired {
            return;
        }
        if let Some(t) = self.transient.take() {
            debug!("Status reset to: {}", t.previous);
            self.publish_status();
        }
    }

    fn set_status(&mut self, status: ConnectionStatus) {
        // A real status change replaces any transient message
        self.transient = None;
        self.status = status;
        self.publish_status();
    }

    /// Stop polling, release the source and show the placeholder. Returns
    /// whether there was a session to tear down.
    fn teardown(&mut self) -> bool {
        let Some(mut session) = self.session.take() else {
            return false;
        };
        self.next_poll = None;
        session.source.close();
        debug!("Closed session #{} ({})", session.generation, session.url);
        self.publish_frame(overlay::placeholder_frame());
        true
    }

    fn publish_status(&self) {
        let _ = self.events.send(ControllerEvent::Status {
            status: self.status.clone(),
            message: self.status_message(),
        });
    }

    fn publish_recent(&self) {
        let _ = self.events.send(ControllerEvent::RecentSources {
            addresses: self.store.recent_addresses().to_vec(),
            last_used: self.store.last_used_address().to_string(),
        });
    }

    /// Stamp the capture time on a display copy and publish it.
    fn publish_display(&self, mut frame: Frame) {
        overlay::stamp_timestamp(&mut frame, &overlay::capture_timestamp());
        self.publish_frame(frame);
    }

    fn publish_frame(&self, frame: Frame) {
        let _ = self.events.send(ControllerEvent::Frame(frame));
    }
}

impl<O: SourceOpener> Drop for StreamController<O> {
    fn drop(&mut self) {
        if let Some(mut session) = self.session.take() {
            session.source.close();
        }
    }
}

#[cfg(test)]
#[path = "controller_tests.rs"]
mod tests;
