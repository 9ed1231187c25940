// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! Notes panel.
//!
//! Shows the general note, one note field per selection rectangle in rank
//! order, and the download buttons.

use crate::models::annotation::Annotation;
use crate::models::project::Project;

/// Action requested from the notes panel.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NotesAction {
    None,
    GeneralEdited(String),
    SelectionEdited { index: usize, text: String },
    SaveText,
    SaveImage,
}

/// Display the notes panel.
///
/// `has_overlay` tells whether anything has been drawn yet, which is needed
/// for the image download.
pub fn show(ui: &mut egui::Ui, project: &Project, annotations: &[Annotation], has_overlay: bool) -> NotesAction {
    let mut action = NotesAction::None;

    ui.heading("Notes & Plan");
    ui.separator();

    if project.image.is_none() {
        ui.label(egui::RichText::new("No image loaded").italics().weak());
        return action;
    }

    egui::ScrollArea::vertical()
        .auto_shrink([false, true])
        .show(ui, |ui| {
            ui.label(egui::RichText::new("General Notes").strong());
            let mut general = project.general_note.clone();
            let response = ui.add(
                egui::TextEdit::multiline(&mut general)
                    .desired_rows(6)
                    .desired_width(f32::INFINITY)
                    .hint_text("Start typing..."),
            );
            if response.changed() {
                action = NotesAction::GeneralEdited(general);
            }

            ui.add_space(8.0);
            ui.label(egui::RichText::new(format!("Selection Notes ({})", annotations.len())).strong());

            if annotations.is_empty() {
                ui.label(
                    egui::RichText::new("Use Selection Box to add notes for specific areas.")
                        .italics()
                        .weak(),
                );
            }

            for annotation in annotations {
                ui.label(format!("#{} Selection Note", annotation.number()));
                let mut text = annotation.note.clone();
                let response = ui.add(egui::TextEdit::singleline(&mut text).desired_width(f32::INFINITY));
                if response.changed() {
                    action = NotesAction::SelectionEdited {
                        index: annotation.rectangle_index,
                        text,
                    };
                }
            }
        });

    ui.separator();
    ui.label(egui::RichText::new("Downloads").strong());

    if ui.button("📄 Download Text").clicked() {
        action = NotesAction::SaveText;
    }
    if has_overlay {
        if ui.button("🖼 Download Image").clicked() {
            action = NotesAction::SaveImage;
        }
    } else {
        ui.label(egui::RichText::new("Draw to download image.").italics().weak());
    }

    action
}
