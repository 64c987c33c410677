//! Streamy - network camera stream viewer
//! Shows one live RTSP stream, takes numbered PNG snapshots and remembers
//! recently used cameras.

// Hide console window on Windows release builds
#![cfg_attr(not(debug_assertions), windows_subsystem = "windows")]

// Use mimalloc for faster memory allocation (Linux, macOS)
#[cfg(not(target_env = "msvc"))]
#[global_allocator]
static GLOBAL: mimalloc::MiMalloc = mimalloc::MiMalloc;

use clap::Parser;
use eframe::egui;
use std::path::PathBuf;
use tracing::info;
use tracing_subscriber::EnvFilter;

mod app;
mod config;
mod controller;
mod error;
mod ffmpeg_source;
mod models;
mod overlay;
mod snapshot;
mod source;

use app::{StreamyApp, APP_VERSION};
use config::RecentSourceStore;
use controller::StreamController;
use ffmpeg_source::FfmpegOpener;

#[derive(Parser, Debug)]
#[command(name = "streamy", version, about = "RTSP Stream Viewer")]
struct Args {
    /// Camera address (host[:port]) to connect to on startup
    #[arg(long)]
    ip: Option<String>,

    /// Folder snapshots are written to (default: desktop)
    #[arg(long)]
    snapshot_dir: Option<PathBuf>,

    /// Config file to use instead of the per-user default
    #[arg(long)]
    config: Option<PathBuf>,
}

fn init_logging() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("streamy=info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();
}

fn main() -> Result<(), eframe::Error> {
    init_logging();
    let args = Args::parse();

    info!("Streamy v{} starting", APP_VERSION);

    let store = match &args.config {
        Some(path) => RecentSourceStore::load_from(path),
        None => RecentSourceStore::load(),
    };
    info!("Using config {}", store.path().display());

    let snapshot_dir = args
        .snapshot_dir
        .unwrap_or_else(snapshot::default_snapshot_dir);
    let (controller, events) = StreamController::new(FfmpegOpener::new(), store, snapshot_dir);

    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_inner_size([1000.0, 700.0])
            .with_min_inner_size([800.0, 600.0]),
        vsync: true,
        hardware_acceleration: eframe::HardwareAcceleration::Preferred,
        ..Default::default()
    };

    eframe::run_native(
        &format!("Streamy v{}", APP_VERSION),
        options,
        Box::new(move |cc| {
            cc.egui_ctx.set_visuals(egui::Visuals::dark());
            Ok(Box::new(StreamyApp::new(controller, events, args.ip)))
        }),
    )
}
