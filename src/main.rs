// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! Photo Note - photo annotation with selection notes
//!
//! A desktop application for drawing on a photo, marking areas with
//! selection boxes, writing a note per area, and exporting the notes and
//! the annotated photo.

mod app;
mod config;
mod error;
mod io;
mod models;
mod render;
mod session;
mod ui;
mod util;

use anyhow::{Context, Result};
use app::PhotoNoteApp;
use config::{AppConfig, DEFAULT_CONFIG_FILE};
use std::path::PathBuf;

fn main() -> Result<()> {
    let config_path = std::env::args()
        .nth(1)
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_FILE));
    let config = AppConfig::load(&config_path)
        .with_context(|| format!("Failed to load config from {}", config_path.display()))?;

    // Initialize logging, RUST_LOG overrides the configured level
    env_logger::Builder::new()
        .filter_level(config.log_level.to_level_filter())
        .parse_default_env()
        .init();

    log::info!("Using project '{}' ({:?})", config.project, config.persistence);
    let snapshots = io::serialization::open_store(&config.persistence, &config.project);

    // Configure egui options
    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_inner_size([1280.0, 720.0])
            .with_min_inner_size([800.0, 600.0])
            .with_title("Photo Note"),
        ..Default::default()
    };

    // Run the application
    eframe::run_native(
        "Photo Note",
        options,
        Box::new(move |_cc| Ok(Box::new(PhotoNoteApp::new(&config, snapshots)))),
    )
    .map_err(|e| anyhow::anyhow!("Application error: {}", e))?;

    Ok(())
}
