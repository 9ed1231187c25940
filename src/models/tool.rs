// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! Drawing tools and the brush they configure.

use super::shape::Color;

/// Interaction mode of the drawing surface.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DrawingMode {
    /// Dragging draws a freehand stroke
    Freedraw,
    /// Dragging draws a selection rectangle
    Rect,
    /// Click selects, drag moves, Delete removes
    Transform,
}

/// Current drawing tool selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tool {
    FreeDraw,
    Highlighter,
    SelectionBox,
    Edit,
}

/// Alpha appended to the highlighter color.
const HIGHLIGHTER_ALPHA: u8 = 0x50;

impl Tool {
    pub const ALL: [Tool; 4] = [Tool::FreeDraw, Tool::Highlighter, Tool::SelectionBox, Tool::Edit];

    pub fn label(&self) -> &'static str {
        match self {
            Tool::FreeDraw => "Free Draw",
            Tool::Highlighter => "Highlighter",
            Tool::SelectionBox => "Selection Box",
            Tool::Edit => "Edit / Delete",
        }
    }

    pub fn mode(&self) -> DrawingMode {
        match self {
            Tool::FreeDraw | Tool::Highlighter => DrawingMode::Freedraw,
            Tool::SelectionBox => DrawingMode::Rect,
            Tool::Edit => DrawingMode::Transform,
        }
    }

    pub fn default_color(&self) -> Color {
        match self {
            Tool::SelectionBox => Color::rgb(0x00, 0x7A, 0xFF),
            Tool::Highlighter => Color::rgb(0xFF, 0xFF, 0x00),
            Tool::FreeDraw | Tool::Edit => Color::rgb(0xFF, 0x00, 0x00),
        }
    }

    pub fn default_width(&self) -> u32 {
        match self {
            Tool::Highlighter => 20,
            Tool::SelectionBox => 2,
            Tool::FreeDraw | Tool::Edit => 3,
        }
    }
}

/// Style applied to newly drawn shapes.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Brush {
    pub stroke_color: Color,
    pub stroke_width: f32,
    pub fill_color: Color,
    pub mode: DrawingMode,
}

/// Toolbar state: the active tool and the user's color/width choices.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ToolSettings {
    tool: Tool,
    /// Opaque color picked by the user
    pub color: Color,
    pub width: u32,
}

impl ToolSettings {
    pub const MIN_WIDTH: u32 = 1;
    pub const MAX_WIDTH: u32 = 30;

    pub fn new(tool: Tool) -> Self {
        Self {
            tool,
            color: tool.default_color(),
            width: tool.default_width(),
        }
    }

    pub fn tool(&self) -> Tool {
        self.tool
    }

    /// Switch tools, restoring the new tool's default color and width.
    pub fn select(&mut self, tool: Tool) {
        if tool != self.tool {
            *self = Self::new(tool);
        }
    }

    /// Brush for the drawing surface.
    pub fn brush(&self) -> Brush {
        let stroke_color = match self.tool {
            Tool::Highlighter => self.color.with_alpha(HIGHLIGHTER_ALPHA),
            _ => self.color.with_alpha(255),
        };
        let fill_color = match self.tool {
            Tool::SelectionBox => Color::rgba(0, 122, 255, 26),
            _ => Color::TRANSPARENT,
        };
        Brush {
            stroke_color,
            stroke_width: self.width.clamp(Self::MIN_WIDTH, Self::MAX_WIDTH) as f32,
            fill_color,
            mode: self.tool.mode(),
        }
    }
}

impl Default for ToolSettings {
    fn default() -> Self {
        Self::new(Tool::FreeDraw)
    }
}
