//! Main window: address picker, status line, video area and snapshot controls.
//!
//! The window owns no connection state of its own. It forwards user commands
//! to the controller and mirrors whatever the controller publishes.

use eframe::egui;
use std::sync::mpsc::Receiver;
use std::time::Instant;

use crate::controller::StreamController;
use crate::error::StreamError;
use crate::ffmpeg_source::FfmpegOpener;
use crate::models::{ConnectionStatus, ControllerEvent, Indicator};

pub const APP_VERSION: &str = env!("CARGO_PKG_VERSION");

struct Alert {
    title: &'static str,
    message: String,
}

pub struct StreamyApp {
    controller: StreamController<FfmpegOpener>,
    events: Receiver<ControllerEvent>,

    // Mirrored controller state
    status: ConnectionStatus,
    status_message: String,
    recent_addresses: Vec<String>,
    texture: Option<egui::TextureHandle>,

    // Inputs
    address_input: String,
    include_timestamp: bool,
    pending_connect: Option<String>,

    alert: Option<Alert>,
}

impl StreamyApp {
    pub fn new(
        controller: StreamController<FfmpegOpener>,
        events: Receiver<ControllerEvent>,
        startup_address: Option<String>,
    ) -> Self {
        let address_input = startup_address
            .clone()
            .unwrap_or_else(|| controller.last_used_address().to_string());
        let include_timestamp = controller.include_timestamp();
        let status_message = controller.status_message();
        let recent_addresses = controller.recent_addresses().to_vec();

        Self {
            controller,
            events,
            status: ConnectionStatus::Disconnected,
            status_message,
            recent_addresses,
            texture: None,
            address_input,
            include_timestamp,
            pending_connect: startup_address,
            alert: None,
        }
    }

    fn connect(&mut self) {
        let address = self.address_input.trim().to_string();
        let result = self.controller.connect(&address);
        self.report(result);
    }

    fn report<T>(&mut self, result: Result<T, StreamError>) {
        if let Err(e) = result {
            self.alert = Some(Alert {
                title: e.title(),
                message: e.to_string(),
            });
        }
    }

    fn process_events(&mut self, ctx: &egui::Context) {
        while let Ok(event) = self.events.try_recv() {
            match event {
                ControllerEvent::Status { status, message } => {
                    self.status = status;
                    self.status_message = message;
                }
                ControllerEvent::Frame(frame) => {
                    let image = frame.to_color_image();
                    match &mut self.texture {
                        Some(texture) => texture.set(image, egui::TextureOptions::LINEAR),
                        None => {
                            self.texture = Some(ctx.load_texture(
                                "video_frame",
                                image,
                                egui::TextureOptions::LINEAR,
                            ));
                        }
                    }
                }
                ControllerEvent::RecentSources { addresses, .. } => {
                    self.recent_addresses = addresses;
                }
            }
        }
    }

    fn show_controls(&mut self, ui: &mut egui::Ui) {
        ui.horizontal(|ui| {
            ui.label("Camera Address:");

            let response = ui.add(
                egui::TextEdit::singleline(&mut self.address_input)
                    .hint_text("192.168.1.50")
                    .desired_width(200.0),
            );
            if response.lost_focus() && ui.input(|i| i.key_pressed(egui::Key::Enter)) {
                self.connect();
            }

            egui::ComboBox::from_id_salt("recent_addresses")
                .selected_text("Recent")
                .show_ui(ui, |ui| {
                    for address in &self.recent_addresses {
                        ui.selectable_value(&mut self.address_input, address.clone(), address);
                    }
                });

            if ui.button("Connect").clicked() {
                self.connect();
            }
            if ui.button("Disconnect").clicked() {
                self.controller.disconnect();
            }

            ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                ui.label(&self.status_message);
                status_dot(ui, self.status.indicator());
            });
        });
    }

    fn show_bottom_bar(&mut self, ui: &mut egui::Ui) {
        ui.horizontal(|ui| {
            let snapshot = ui.add_enabled(self.status.is_connected(), egui::Button::new("Snapshot"));
            if snapshot.clicked() {
                let result = self.controller.take_snapshot();
                self.report(result);
            }

            if ui
                .checkbox(&mut self.include_timestamp, "Include Timestamp")
                .changed()
            {
                self.controller.set_include_timestamp(self.include_timestamp);
            }

            ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                ui.colored_label(egui::Color32::GRAY, format!("Streamy v{}", APP_VERSION));
            });
        });
    }

    fn show_video(&self, ui: &mut egui::Ui) {
        ui.vertical_centered(|ui| {
            let Some(texture) = &self.texture else {
                return;
            };
            let available = ui.available_size();
            let tex_size = texture.size_vec2();
            let aspect = tex_size.x / tex_size.y;

            // Fit while keeping aspect ratio
            let (width, height) = if available.x / available.y > aspect {
                (available.y * aspect, available.y)
            } else {
                (available.x, available.x / aspect)
            };

            ui.image((texture.id(), egui::vec2(width, height)));
        });
    }

    fn show_alert(&mut self, ctx: &egui::Context) {
        let Some(alert) = &self.alert else {
            return;
        };
        let mut dismissed = false;
        egui::Window::new(alert.title)
            .collapsible(false)
            .resizable(false)
            .anchor(egui::Align2::CENTER_CENTER, [0.0, 0.0])
            .show(ctx, |ui| {
                ui.label(&alert.message);
                ui.add_space(8.0);
                if ui.button("OK").clicked() {
                    dismissed = true;
                }
            });
        if dismissed {
            self.alert = None;
        }
    }
}

fn status_dot(ui: &mut egui::Ui, indicator: Indicator) {
    let color = match indicator {
        Indicator::Gray => egui::Color32::from_rgb(150, 150, 150),
        Indicator::Yellow => egui::Color32::from_rgb(255, 200, 60),
        Indicator::Green => egui::Color32::from_rgb(60, 200, 60),
        Indicator::Red => egui::Color32::from_rgb(255, 60, 60),
    };
    let (rect, _) = ui.allocate_exact_size(egui::vec2(16.0, 16.0), egui::Sense::hover());
    ui.painter().circle_filled(rect.center(), 6.0, color);
    ui.painter().circle_stroke(
        rect.center(),
        6.0,
        egui::Stroke::new(1.0, egui::Color32::from_rgba_unmultiplied(80, 80, 80, 100)),
    );
}

impl eframe::App for StreamyApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        if let Some(address) = self.pending_connect.take() {
            self.address_input = address;
            self.connect();
        }

        let now = Instant::now();
        self.controller.tick(now);
        self.process_events(ctx);

        egui::TopBottomPanel::top("controls").show(ctx, |ui| self.show_controls(ui));
        egui::TopBottomPanel::bottom("bottom_bar").show(ctx, |ui| self.show_bottom_bar(ui));
        egui::CentralPanel::default().show(ctx, |ui| self.show_video(ui));
        self.show_alert(ctx);

        // Commands issued this frame may have queued more updates
        self.process_events(ctx);

        if let Some(wakeup) = self.controller.next_wakeup() {
            ctx.request_repaint_after(wakeup.saturating_duration_since(now));
        }
    }
}
