// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! Toolbar and tool selection UI.
//!
//! This module provides the toolbar above the canvas: the drawing tool,
//! its color and its stroke width.

use crate::models::shape::Color;
use crate::models::tool::{Tool, ToolSettings};

/// Display the toolbar with tool selection and brush controls.
pub fn show(ui: &mut egui::Ui, settings: &mut ToolSettings) {
    ui.horizontal(|ui| {
        ui.spacing_mut().item_spacing.x = 8.0;

        ui.label("Tool:");

        for tool in Tool::ALL {
            if ui.selectable_label(settings.tool() == tool, tool.label()).clicked() {
                settings.select(tool);
            }
        }

        ui.separator();

        let editing = settings.tool() == Tool::Edit;
        ui.add_enabled_ui(!editing, |ui| {
            let mut rgb = [settings.color.r, settings.color.g, settings.color.b];
            ui.label("Color");
            if ui.color_edit_button_srgb(&mut rgb).changed() {
                settings.color = Color::rgb(rgb[0], rgb[1], rgb[2]);
            }

            ui.label("Width");
            ui.add(egui::Slider::new(
                &mut settings.width,
                ToolSettings::MIN_WIDTH..=ToolSettings::MAX_WIDTH,
            ));
        });

        ui.separator();

        // Tool description
        let tool_text = match settings.tool() {
            Tool::FreeDraw => "Drag to draw",
            Tool::Highlighter => "Drag to highlight",
            Tool::SelectionBox => "Drag to mark an area, then add its note on the right",
            Tool::Edit => "Click to select, drag to move, Delete to remove",
        };

        ui.label(egui::RichText::new(tool_text).italics().weak());
    });
}
