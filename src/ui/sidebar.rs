// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! Settings sidebar: image upload, help and project reset.

use std::path::PathBuf;

/// Action requested from the sidebar.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SidebarAction {
    None,
    Upload(PathBuf),
    Reset,
}

/// Display the sidebar.
pub fn show(ui: &mut egui::Ui, project_name: &str, busy: bool) -> SidebarAction {
    let mut action = SidebarAction::None;

    ui.heading("Settings");
    ui.label(egui::RichText::new(format!("Project: {project_name}")).weak());
    ui.separator();

    if ui
        .add_enabled(!busy, egui::Button::new("📂 Upload New Image..."))
        .clicked()
    {
        // Open native file picker
        if let Some(path) = rfd::FileDialog::new()
            .add_filter("Images", &["png", "jpg", "jpeg"])
            .pick_file()
        {
            action = SidebarAction::Upload(path);
        }
    }

    ui.add_space(8.0);

    egui::CollapsingHeader::new("Shortcuts & Help")
        .default_open(false)
        .show(ui, |ui| {
            ui.label("Free Draw and Highlighter: drag on the photo.");
            ui.label("Selection Box: drag to mark an area. Each box gets a note field.");
            ui.label("Edit / Delete: click a shape to select it, drag to move it.");
            ui.label("Delete or Backspace removes the selected shape.");
            ui.label("Ctrl+Z undo, Ctrl+Shift+Z or Ctrl+Y redo.");
            ui.label("Selection notes follow box order, top to bottom then left to right.");
        });

    ui.add_space(8.0);
    ui.separator();

    if ui
        .button(egui::RichText::new("🗑 Reset Project").color(egui::Color32::from_rgb(220, 80, 80)))
        .clicked()
    {
        action = SidebarAction::Reset;
    }

    action
}
