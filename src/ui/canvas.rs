// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! Drawing canvas for the photo and the shapes over it.
//!
//! This is the egui front of the drawing surface: it turns pointer and
//! keyboard input into edits on a [`Surface`] and paints the surface content
//! over the scaled photo.

use crate::models::shape::{Color, Point, Rect, Shape, ShapeKind};
use crate::models::tool::{Brush, DrawingMode};
use crate::render::{RenderSpec, Surface};
use crate::util::geometry::{display_to_image, fit_size, image_to_display};

/// Extra screen pixels accepted around a shape when clicking it.
const HIT_TOLERANCE: f32 = 4.0;

/// Pointer gesture in progress.
#[derive(Debug, Clone)]
enum DragState {
    None,
    /// Freehand stroke being drawn
    Stroke(Vec<Point>),
    /// Selection rectangle being dragged out
    Box { start: Point, current: Point },
    /// Shape being moved in transform mode
    Move { index: usize, start: Point, current: Point },
}

/// Canvas widget state.
pub struct DrawingCanvas {
    surface: Surface,
    drag: DragState,
    selected: Option<usize>,
}

impl Default for DrawingCanvas {
    fn default() -> Self {
        Self::new()
    }
}

/// Mapping between the on-screen image rectangle and image pixels.
struct View {
    rect: egui::Rect,
    image_size: (u32, u32),
}

impl View {
    fn to_image(&self, pos: egui::Pos2) -> Point {
        let offset = pos - self.rect.min;
        display_to_image(
            offset.x,
            offset.y,
            (self.rect.width(), self.rect.height()),
            self.image_size,
        )
    }

    fn to_screen(&self, point: &Point) -> egui::Pos2 {
        let (x, y) = image_to_display(point, (self.rect.width(), self.rect.height()), self.image_size);
        self.rect.min + egui::vec2(x, y)
    }

    /// Screen pixels per image pixel.
    fn scale(&self) -> f32 {
        self.rect.width() / self.image_size.0 as f32
    }

    fn rect_to_screen(&self, rect: &Rect) -> egui::Rect {
        egui::Rect::from_min_max(
            self.to_screen(&Point::new(rect.left, rect.top)),
            self.to_screen(&Point::new(rect.right(), rect.bottom())),
        )
    }
}

fn color32(color: Color) -> egui::Color32 {
    egui::Color32::from_rgba_unmultiplied(color.r, color.g, color.b, color.a)
}

fn new_shape(kind: ShapeKind, brush: &Brush) -> Shape {
    Shape {
        kind,
        stroke_color: brush.stroke_color,
        stroke_width: brush.stroke_width,
        fill_color: match brush.mode {
            DrawingMode::Rect => brush.fill_color,
            _ => Color::TRANSPARENT,
        },
    }
}

impl DrawingCanvas {
    pub fn new() -> Self {
        Self {
            surface: Surface::new(),
            drag: DragState::None,
            selected: None,
        }
    }

    pub fn surface(&self) -> &Surface {
        &self.surface
    }

    pub fn surface_mut(&mut self) -> &mut Surface {
        &mut self.surface
    }

    /// Display the canvas and apply this frame's input to the surface.
    pub fn show(&mut self, ui: &mut egui::Ui, spec: &RenderSpec, texture: Option<&egui::TextureHandle>) {
        if self.surface.sync(spec) {
            self.drag = DragState::None;
            self.selected = None;
        }
        if spec.brush.mode != DrawingMode::Transform {
            self.selected = None;
        }

        // Set background color
        ui.style_mut().visuals.extreme_bg_color = egui::Color32::from_gray(40);
        let available_size = ui.available_size();

        egui::Frame::canvas(ui.style()).show(ui, |ui| {
            ui.set_min_size(available_size - egui::vec2(0.0, 32.0));

            let (Some(background), Some(texture)) = (&spec.background, texture) else {
                ui.centered_and_justified(|ui| {
                    ui.label(
                        egui::RichText::new("Please upload an image in the sidebar to start.")
                            .color(egui::Color32::from_gray(180)),
                    );
                });
                return;
            };

            let image_size = background.dimensions();
            let available = ui.available_size();
            let (display_width, display_height) = fit_size(image_size, (available.x, available.y));

            // Center the image
            let x_offset = (available.x - display_width) / 2.0;
            let y_offset = (available.y - display_height) / 2.0;
            let view = View {
                rect: egui::Rect::from_min_size(
                    ui.min_rect().min + egui::vec2(x_offset, y_offset),
                    egui::vec2(display_width, display_height),
                ),
                image_size,
            };

            ui.painter().image(
                texture.id(),
                view.rect,
                egui::Rect::from_min_max(egui::pos2(0.0, 0.0), egui::pos2(1.0, 1.0)),
                egui::Color32::WHITE,
            );

            let response = ui.allocate_rect(view.rect, egui::Sense::click_and_drag());
            self.handle_pointer(&response, &view, &spec.brush);
            self.handle_keys(ui.ctx());
            self.paint(&ui.painter_at(view.rect), &view);
        });

        // Status line under the canvas
        ui.horizontal(|ui| {
            ui.label(format!("{} shapes", self.surface.shapes().len()));
            if let Some(idx) = self.selected {
                ui.separator();
                ui.label(format!("Selected #{} (Delete to remove)", idx + 1));
            }
        });
    }

    fn handle_pointer(&mut self, response: &egui::Response, view: &View, brush: &Brush) {
        let pointer = response.interact_pointer_pos().map(|pos| view.to_image(pos));

        if brush.mode == DrawingMode::Transform && response.clicked() {
            self.selected = pointer.and_then(|p| {
                self.surface.hit_test(p, HIT_TOLERANCE / view.scale())
            });
        }

        if response.drag_started() {
            if let Some(p) = pointer {
                self.drag = match brush.mode {
                    DrawingMode::Freedraw => DragState::Stroke(vec![p]),
                    DrawingMode::Rect => DragState::Box { start: p, current: p },
                    DrawingMode::Transform => match self.surface.hit_test(p, HIT_TOLERANCE / view.scale()) {
                        Some(index) => {
                            self.selected = Some(index);
                            DragState::Move {
                                index,
                                start: p,
                                current: p,
                            }
                        }
                        None => DragState::None,
                    },
                };
            }
        } else if response.dragged() {
            if let Some(p) = pointer {
                match &mut self.drag {
                    DragState::Stroke(points) => {
                        if points.last() != Some(&p) {
                            points.push(p);
                        }
                    }
                    DragState::Box { current, .. } | DragState::Move { current, .. } => *current = p,
                    DragState::None => {}
                }
            }
        }

        if response.drag_stopped() {
            match std::mem::replace(&mut self.drag, DragState::None) {
                DragState::Stroke(points) => {
                    log::debug!("Finished stroke with {} points", points.len());
                    self.surface.add(new_shape(ShapeKind::Freehand { points }, brush));
                }
                DragState::Box { start, current } => {
                    let rect = Rect::from_corners(start, current);
                    if rect.width >= 1.0 && rect.height >= 1.0 {
                        log::debug!("Finished selection at ({:.0}, {:.0})", rect.left, rect.top);
                        self.surface.add(new_shape(ShapeKind::Rectangle(rect), brush));
                    }
                }
                DragState::Move { index, start, current } => {
                    self.surface.move_shape(index, current.x - start.x, current.y - start.y);
                }
                DragState::None => {}
            }
        }
    }

    fn handle_keys(&mut self, ctx: &egui::Context) {
        // Only process if no text field is focused (to avoid deleting while typing notes)
        if ctx.wants_keyboard_input() {
            return;
        }

        if ctx.input(|i| i.key_pressed(egui::Key::Delete) || i.key_pressed(egui::Key::Backspace)) {
            if let Some(idx) = self.selected.take() {
                if self.surface.remove(idx) {
                    log::info!("Deleted shape, total: {}", self.surface.shapes().len());
                }
            }
        }

        // Handle redo (Ctrl+Shift+Z or Ctrl+Y)
        if ctx.input(|i| {
            (i.modifiers.command && i.modifiers.shift && i.key_pressed(egui::Key::Z))
                || (i.modifiers.command && i.key_pressed(egui::Key::Y))
        }) {
            if self.surface.redo() {
                self.selected = None;
                log::info!("Redo");
            }
        } else if ctx.input(|i| i.modifiers.command && !i.modifiers.shift && i.key_pressed(egui::Key::Z))
            && self.surface.undo()
        {
            self.selected = None;
            log::info!("Undo");
        }
    }

    fn paint(&self, painter: &egui::Painter, view: &View) {
        let scale = view.scale();

        for (index, shape) in self.surface.shapes().iter().enumerate() {
            let offset = match &self.drag {
                DragState::Move { index: moving, start, current } if *moving == index => {
                    egui::vec2(current.x - start.x, current.y - start.y) * scale
                }
                _ => egui::Vec2::ZERO,
            };
            paint_shape(painter, view, shape, offset);

            if self.selected == Some(index) {
                let bounds = view.rect_to_screen(&shape.bounds()).translate(offset);
                painter.rect_stroke(
                    bounds.expand(shape.stroke_width * scale / 2.0 + 4.0),
                    2.0,
                    egui::Stroke::new(1.5, egui::Color32::from_rgb(0, 120, 255)),
                );
            }
        }

        match &self.drag {
            DragState::Stroke(points) => {
                let preview = Shape {
                    kind: ShapeKind::Freehand {
                        points: points.clone(),
                    },
                    stroke_color: Color::rgba(255, 255, 255, 200),
                    stroke_width: 2.0 / scale,
                    fill_color: Color::TRANSPARENT,
                };
                paint_shape(painter, view, &preview, egui::Vec2::ZERO);
            }
            DragState::Box { start, current } => {
                let rect = view.rect_to_screen(&Rect::from_corners(*start, *current));
                painter.rect_stroke(rect, 0.0, egui::Stroke::new(1.0, egui::Color32::WHITE));
            }
            DragState::Move { .. } | DragState::None => {}
        }
    }
}

/// Paint one shape, shifted by a screen-space offset.
fn paint_shape(painter: &egui::Painter, view: &View, shape: &Shape, offset: egui::Vec2) {
    let width = (shape.stroke_width * view.scale()).max(1.0);
    let stroke = egui::Stroke::new(width, color32(shape.stroke_color));

    match &shape.kind {
        ShapeKind::Rectangle(rect) => {
            let screen = view.rect_to_screen(rect).translate(offset);
            painter.rect(screen, 0.0, color32(shape.fill_color), stroke);
        }
        ShapeKind::Freehand { points } => {
            let screen: Vec<egui::Pos2> = points.iter().map(|p| view.to_screen(p) + offset).collect();
            match screen.as_slice() {
                [] => {}
                [single] => {
                    painter.circle_filled(*single, width / 2.0, stroke.color);
                }
                _ => {
                    painter.add(egui::Shape::line(screen, stroke));
                }
            }
        }
    }
}
