// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! Main application state and egui App implementation.
//!
//! This module wires the session store to the UI: panel actions become
//! session events, and every frame runs one refresh cycle of the canvas.

use crate::config::AppConfig;
use crate::io::export::{Artifact, ExportService};
use crate::io::serialization::SnapshotStore;
use crate::models::project::SessionKey;
use crate::models::tool::ToolSettings;
use crate::session::{Event, SessionStore, Upload};
use crate::ui::canvas::DrawingCanvas;
use crate::ui::notes::{self, NotesAction};
use crate::ui::sidebar::{self, SidebarAction};
use crate::ui::toolbar;
use anyhow::Context;
use image::RgbaImage;
use std::path::{Path, PathBuf};
use std::sync::mpsc::{channel, Receiver};
use std::sync::Arc;

/// Message shown in the status bar.
enum Message {
    Info(String),
    Error(String),
}

/// Main application state.
pub struct PhotoNoteApp {
    project_name: String,
    exporter: ExportService,
    store: SessionStore,
    tools: ToolSettings,
    canvas: DrawingCanvas,

    /// Photo texture and the image it was made from
    texture: Option<(SessionKey, egui::TextureHandle)>,

    /// Overlay reported by the last refresh
    overlay: Option<Arc<RgbaImage>>,

    /// Receiver for background file reading
    upload_loader: Option<Receiver<Result<Vec<u8>, String>>>,

    /// Loading state message
    loading_message: Option<String>,

    message: Option<Message>,
}

impl PhotoNoteApp {
    /// Create the application, restoring the configured project.
    pub fn new(config: &AppConfig, snapshots: Box<dyn SnapshotStore>) -> Self {
        let store = SessionStore::open(snapshots);
        if store.project().image.is_some() {
            log::info!(
                "Restored project '{}' with {} shapes",
                config.project,
                store.project().shapes.len()
            );
        }

        Self {
            project_name: config.project.clone(),
            exporter: config.export_service(),
            store,
            tools: ToolSettings::default(),
            canvas: DrawingCanvas::new(),
            texture: None,
            overlay: None,
            upload_loader: None,
            loading_message: None,
            message: None,
        }
    }

    /// Read an image file on a background thread.
    fn start_upload(&mut self, path: PathBuf) {
        let (sender, receiver) = channel();
        self.upload_loader = Some(receiver);
        self.loading_message = Some("Loading image...".to_string());

        std::thread::spawn(move || {
            let result = std::fs::read(&path)
                .with_context(|| format!("Failed to read {}", path.display()))
                .map_err(|e| format!("{:#}", e));
            if let Ok(bytes) = &result {
                log::info!("Read {} ({} bytes)", path.display(), bytes.len());
            }
            let _ = sender.send(result);
        });
    }

    fn poll_upload(&mut self) {
        let Some(receiver) = &self.upload_loader else {
            return;
        };
        let Ok(result) = receiver.try_recv() else {
            return;
        };
        self.upload_loader = None;
        self.loading_message = None;

        let outcome = result.and_then(|bytes| {
            self.store
                .dispatch(Event::ImageUploaded(Upload::new(bytes)))
                .map_err(|e| e.to_string())
        });
        match outcome {
            Ok(()) => {
                self.message = None;
                log::info!("Image loaded successfully");
            }
            Err(e) => {
                log::error!("Failed to load image: {}", e);
                self.message = Some(Message::Error(format!("Could not load image: {e}")));
            }
        }
    }

    /// Keep the photo texture in step with the project image.
    fn sync_texture(&mut self, ctx: &egui::Context) {
        let Some(image) = &self.store.project().image else {
            self.texture = None;
            return;
        };
        if matches!(&self.texture, Some((key, _)) if key == &image.key) {
            return;
        }

        let size = [image.width() as usize, image.height() as usize];
        let color_image = egui::ColorImage::from_rgba_unmultiplied(size, image.bitmap.as_raw());
        let texture = ctx.load_texture("photo", color_image, egui::TextureOptions::LINEAR);
        log::debug!("Uploaded texture for image {}", image.key);
        self.texture = Some((image.key.clone(), texture));
    }

    /// Commit the canvas content. Returns whether the shape list changed.
    fn refresh_canvas(&mut self) -> bool {
        let brush = self.tools.brush();
        let before = self.store.project().shapes.clone();
        match self.store.refresh(self.canvas.surface_mut(), brush) {
            Ok(output) => {
                self.overlay = output.overlay;
                self.store.project().shapes != before
            }
            Err(e) => {
                log::error!("Failed to commit drawing: {}", e);
                self.message = Some(Message::Error(e.to_string()));
                false
            }
        }
    }

    fn reset(&mut self) {
        match self.store.dispatch(Event::Reset) {
            Ok(()) => {
                self.overlay = None;
                self.message = Some(Message::Info("Project reset.".to_string()));
                log::info!("Project '{}' reset", self.project_name);
            }
            Err(e) => {
                log::error!("Failed to reset project: {}", e);
                self.message = Some(Message::Error(format!("Could not reset project: {e}")));
            }
        }
    }

    fn save_text(&mut self) {
        match self.exporter.text(self.store.project()) {
            Some(artifact) => self.save(&artifact),
            None => self.message = Some(Message::Error("No image loaded.".to_string())),
        }
    }

    fn save_image(&mut self) {
        match self.exporter.image(self.store.project(), self.overlay.as_deref()) {
            Ok(artifact) => self.save(&artifact),
            Err(e) => {
                log::error!("Image export failed: {}", e);
                self.message = Some(Message::Error(e.to_string()));
            }
        }
    }

    fn save(&mut self, artifact: &Artifact) {
        match save_artifact(artifact) {
            Ok(Some(path)) => {
                log::info!("Saved {} to {}", artifact.mime, path.display());
                self.message = Some(Message::Info(format!("Saved {}", path.display())));
            }
            Ok(None) => {}
            Err(e) => {
                log::error!("{:#}", e);
                self.message = Some(Message::Error(format!("{:#}", e)));
            }
        }
    }
}

/// Ask for a destination and write the artifact there.
fn save_artifact(artifact: &Artifact) -> anyhow::Result<Option<PathBuf>> {
    let (filter, extensions): (&str, &[&str]) = match artifact.mime {
        "image/jpeg" => ("JPEG", &["jpg", "jpeg"][..]),
        _ => ("Text", &["txt"][..]),
    };
    let Some(path) = rfd::FileDialog::new()
        .add_filter(filter, extensions)
        .set_file_name(&artifact.file_name)
        .save_file()
    else {
        return Ok(None);
    };
    write_artifact(artifact, &path)?;
    Ok(Some(path))
}

fn write_artifact(artifact: &Artifact, path: &Path) -> anyhow::Result<()> {
    std::fs::write(path, &artifact.bytes).with_context(|| format!("Failed to write {}", path.display()))
}

impl eframe::App for PhotoNoteApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        self.poll_upload();

        // Request repaint if still loading (to update spinner)
        if self.loading_message.is_some() {
            ctx.request_repaint();
        }

        // Top menu bar
        egui::TopBottomPanel::top("menu_bar").show(ctx, |ui| {
            egui::menu::bar(ui, |ui| {
                ui.menu_button("File", |ui| {
                    if ui.button("Save Notes...").clicked() {
                        self.save_text();
                        ui.close_menu();
                    }
                    if ui.button("Save Image...").clicked() {
                        self.save_image();
                        ui.close_menu();
                    }
                    ui.separator();
                    if ui.button("Quit").clicked() {
                        ctx.send_viewport_cmd(egui::ViewportCommand::Close);
                    }
                });

                ui.menu_button("Edit", |ui| {
                    let can_undo = self.canvas.surface().can_undo();
                    if ui.add_enabled(can_undo, egui::Button::new("Undo (Ctrl+Z)")).clicked() {
                        self.canvas.surface_mut().undo();
                        log::info!("Undo from menu");
                        ui.close_menu();
                    }

                    let can_redo = self.canvas.surface().can_redo();
                    if ui.add_enabled(can_redo, egui::Button::new("Redo (Ctrl+Shift+Z)")).clicked() {
                        self.canvas.surface_mut().redo();
                        log::info!("Redo from menu");
                        ui.close_menu();
                    }
                });
            });
        });

        // Toolbar
        egui::TopBottomPanel::top("toolbar").show(ctx, |ui| {
            toolbar::show(ui, &mut self.tools);
        });

        // Settings panel (left side)
        let busy = self.loading_message.is_some();
        let sidebar_action = egui::SidePanel::left("settings")
            .default_width(200.0)
            .show(ctx, |ui| sidebar::show(ui, &self.project_name, busy))
            .inner;

        match sidebar_action {
            SidebarAction::Upload(path) => self.start_upload(path),
            SidebarAction::Reset => self.reset(),
            SidebarAction::None => {}
        }

        // Notes panel (right side)
        let annotations = self.store.annotations();
        let has_overlay = self.overlay.is_some();
        let notes_action = egui::SidePanel::right("notes")
            .default_width(280.0)
            .show(ctx, |ui| notes::show(ui, self.store.project(), &annotations, has_overlay))
            .inner;

        let edit = match notes_action {
            NotesAction::GeneralEdited(text) => Some(Event::GeneralNoteEdited(text)),
            NotesAction::SelectionEdited { index, text } => Some(Event::SelectionNoteEdited { index, text }),
            NotesAction::SaveText => {
                self.save_text();
                None
            }
            NotesAction::SaveImage => {
                self.save_image();
                None
            }
            NotesAction::None => None,
        };
        if let Some(event) = edit {
            if let Err(e) = self.store.dispatch(event) {
                log::error!("Failed to apply note edit: {}", e);
            }
        }

        // Status bar
        egui::TopBottomPanel::bottom("status").show(ctx, |ui| match &self.message {
            Some(Message::Info(text)) => {
                ui.label(text);
            }
            Some(Message::Error(text)) => {
                ui.colored_label(egui::Color32::from_rgb(220, 80, 80), text);
            }
            None => {
                ui.label(egui::RichText::new("Ready").weak());
            }
        });

        // Main canvas (center)
        self.sync_texture(ctx);
        let brush = self.tools.brush();
        let spec = self.store.render_spec(brush);
        let texture = self.texture.as_ref().map(|(_, texture)| texture);
        let canvas = &mut self.canvas;
        let loading_message = &self.loading_message;

        egui::CentralPanel::default().show(ctx, |ui| {
            // Show loading overlay if loading
            if let Some(message) = loading_message {
                ui.centered_and_justified(|ui| {
                    ui.vertical_centered(|ui| {
                        ui.add_space(20.0);
                        ui.spinner();
                        ui.add_space(10.0);
                        ui.label(
                            egui::RichText::new(message)
                                .size(16.0)
                                .color(egui::Color32::from_gray(200)),
                        );
                    });
                });
            } else {
                canvas.show(ui, &spec, texture);
            }
        });

        // The side panels were built before this commit
        if self.refresh_canvas() {
            ctx.request_repaint();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::io::serialization::EphemeralStore;
    use crate::models::shape::{Color, Rect, Shape, ShapeKind};

    #[test]
    fn test_write_artifact() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("project_notes.txt");
        let artifact = Artifact {
            file_name: "project_notes.txt".to_string(),
            mime: "text/plain",
            bytes: b"GENERAL NOTES:\nhi\n\n".to_vec(),
        };
        write_artifact(&artifact, &path).unwrap();
        assert_eq!(std::fs::read(&path).unwrap(), artifact.bytes);
    }

    #[test]
    fn test_write_artifact_reports_path() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("missing").join("annotated_image.jpg");
        let artifact = Artifact {
            file_name: "annotated_image.jpg".to_string(),
            mime: "image/jpeg",
            bytes: vec![0xFF, 0xD8],
        };
        let err = write_artifact(&artifact, &path).unwrap_err();
        assert!(format!("{:#}", err).contains("annotated_image.jpg"));
    }

    fn png(width: u32, height: u32) -> Vec<u8> {
        let mut bytes = Vec::new();
        image::DynamicImage::ImageRgba8(RgbaImage::new(width, height))
            .write_to(&mut std::io::Cursor::new(&mut bytes), image::ImageFormat::Png)
            .unwrap();
        bytes
    }

    #[test]
    fn test_canvas_commit_reports_change() {
        let mut app = PhotoNoteApp::new(&AppConfig::default(), Box::new(EphemeralStore::default()));
        app.store.dispatch(Event::ImageUploaded(Upload::new(png(40, 30)))).unwrap();
        assert!(!app.refresh_canvas());
        assert!(app.overlay.is_some());

        app.canvas.surface_mut().add(Shape {
            kind: ShapeKind::Rectangle(Rect::new(2.0, 3.0, 10.0, 8.0)),
            stroke_color: Color::rgb(0, 122, 255),
            stroke_width: 2.0,
            fill_color: Color::TRANSPARENT,
        });
        assert!(app.refresh_canvas());
        assert_eq!(app.store.annotations().len(), 1);
        assert!(!app.refresh_canvas());

        app.canvas.surface_mut().remove(0);
        assert!(app.refresh_canvas());
        assert!(app.store.annotations().is_empty());
    }

    #[test]
    fn test_new_app_uses_config() {
        let config = AppConfig::from_yaml("project: garden\nexport:\n  jpeg_quality: 70\n").unwrap();
        let app = PhotoNoteApp::new(&config, Box::new(EphemeralStore::default()));
        assert_eq!(app.project_name, "garden");
        assert_eq!(app.exporter.jpeg_quality, 70);
        assert!(app.store.project().is_empty());
    }
}
