//! Data models for Streamy

/// Connection status of the stream session
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum ConnectionStatus {
    #[default]
    Disconnected,
    Connecting,
    Connected,
    /// Source opened but frames are unreadable
    Degraded,
    Error(String),
}

/// Indicator dot colour shown next to the status text
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Indicator {
    Gray,
    Yellow,
    Green,
    Red,
}

impl ConnectionStatus {
    /// Human-readable status line
    pub fn label(&self) -> String {
        match self {
            ConnectionStatus::Disconnected => "Not connected".to_string(),
            ConnectionStatus::Connecting => "Connecting...".to_string(),
            ConnectionStatus::Connected => "Connected".to_string(),
            ConnectionStatus::Degraded => "Connected but not able to stream".to_string(),
            ConnectionStatus::Error(msg) => format!("Error: {}", msg),
        }
    }

    pub fn indicator(&self) -> Indicator {
        match self {
            ConnectionStatus::Disconnected => Indicator::Gray,
            ConnectionStatus::Connecting | ConnectionStatus::Degraded => Indicator::Yellow,
            ConnectionStatus::Connected => Indicator::Green,
            ConnectionStatus::Error(_) => Indicator::Red,
        }
    }

    pub fn is_connected(&self) -> bool {
        matches!(self, ConnectionStatus::Connected)
    }
}

/// Decoded video frame, tightly packed RGB24
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame {
    pub width: u32,
    pub height: u32,
    pub data: Vec<u8>,
}

impl Frame {
    /// Solid-colour frame
    pub fn filled(width: u32, height: u32, rgb: [u8; 3]) -> Self {
        let pixels = width as usize * height as usize;
        let mut data = Vec::with_capacity(pixels * 3);
        for _ in 0..pixels {
            data.extend_from_slice(&rgb);
        }
        Self { width, height, data }
    }

    pub fn put_pixel(&mut self, x: u32, y: u32, rgb: [u8; 3]) {
        if x >= self.width || y >= self.height {
            return;
        }
        let idx = (y as usize * self.width as usize + x as usize) * 3;
        self.data[idx..idx + 3].copy_from_slice(&rgb);
    }

    pub fn pixel(&self, x: u32, y: u32) -> Option<[u8; 3]> {
        if x >= self.width || y >= self.height {
            return None;
        }
        let idx = (y as usize * self.width as usize + x as usize) * 3;
        Some([self.data[idx], self.data[idx + 1], self.data[idx + 2]])
    }

    pub fn to_color_image(&self) -> egui::ColorImage {
        egui::ColorImage::from_rgb([self.width as usize, self.height as usize], &self.data)
    }
}

/// Updates published by the controller for the window to mirror
#[derive(Debug, Clone)]
pub enum ControllerEvent {
    Status {
        status: ConnectionStatus,
        message: String,
    },
    Frame(Frame),
    RecentSources {
        addresses: Vec<String>,
        last_used: String,
    },
}
