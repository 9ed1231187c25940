// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! Drawing surface.
//!
//! The session core talks to the canvas through [`DrawingSurface`]: it hands
//! over a [`RenderSpec`] each refresh and gets back the complete shape list
//! and the rasterized overlay. [`Surface`] holds the canvas content and its
//! undo history independently of any UI toolkit; the egui canvas drives it
//! with pointer input.

pub mod raster;

use crate::models::shape::{Point, RawShape, Shape, ShapeKind};
use crate::models::tool::Brush;
use crate::session::{should_reseed, WidgetKey};
use crate::util::geometry::point_to_segment_distance;
use image::RgbaImage;
use std::sync::Arc;

/// Everything the surface needs to draw one refresh.
#[derive(Debug, Clone)]
pub struct RenderSpec {
    pub brush: Brush,
    /// Photo under the drawing, `None` when no image is loaded
    pub background: Option<Arc<RgbaImage>>,
    /// Drawing loaded into the surface when it (re)initializes
    pub seed_drawing: Option<Arc<[Shape]>>,
    /// Changes whenever the surface must discard its content
    pub widget_key: WidgetKey,
}

/// What the surface reports back after a refresh.
#[derive(Debug, Clone, Default)]
pub struct SurfaceOutput {
    /// Complete current shape list, in drawing order
    pub shapes: Vec<RawShape>,
    /// Shapes rasterized at background resolution
    pub overlay: Option<Arc<RgbaImage>>,
}

/// Capability the session depends on to display and rasterize the drawing.
pub trait DrawingSurface {
    fn render(&mut self, spec: &RenderSpec) -> SurfaceOutput;
}

/// History system for undo/redo of canvas edits.
#[derive(Debug)]
struct History {
    /// Undo stack (past states)
    undo_stack: Vec<Vec<Shape>>,
    /// Redo stack (future states after undo)
    redo_stack: Vec<Vec<Shape>>,
    /// Maximum history size
    max_size: usize,
}

impl History {
    fn new() -> Self {
        Self {
            undo_stack: Vec::new(),
            redo_stack: Vec::new(),
            max_size: 50,
        }
    }

    /// Save current state before making a change
    fn push(&mut self, shapes: Vec<Shape>) {
        self.undo_stack.push(shapes);
        if self.undo_stack.len() > self.max_size {
            self.undo_stack.remove(0);
        }
        self.redo_stack.clear();
    }

    fn undo(&mut self, current: Vec<Shape>) -> Option<Vec<Shape>> {
        let previous = self.undo_stack.pop()?;
        self.redo_stack.push(current);
        Some(previous)
    }

    fn redo(&mut self, current: Vec<Shape>) -> Option<Vec<Shape>> {
        let next = self.redo_stack.pop()?;
        self.undo_stack.push(current);
        Some(next)
    }

    fn can_undo(&self) -> bool {
        !self.undo_stack.is_empty()
    }

    fn can_redo(&self) -> bool {
        !self.redo_stack.is_empty()
    }

    fn clear(&mut self) {
        self.undo_stack.clear();
        self.redo_stack.clear();
    }
}

/// Canvas content: shapes, undo history and the cached overlay.
#[derive(Debug)]
pub struct Surface {
    /// Key the content was initialized under
    key: Option<WidgetKey>,
    shapes: Vec<Shape>,
    history: History,
    /// Last rasterized overlay, valid while `overlay_dirty` is false
    overlay: Option<Arc<RgbaImage>>,
    overlay_dirty: bool,
}

impl Default for Surface {
    fn default() -> Self {
        Self::new()
    }
}

impl Surface {
    pub fn new() -> Self {
        Self {
            key: None,
            shapes: Vec::new(),
            history: History::new(),
            overlay: None,
            overlay_dirty: true,
        }
    }

    /// Reinitialize from the seed drawing if the widget key changed.
    ///
    /// Returns whether the content was replaced. With an unchanged key the
    /// shapes and history are left exactly as they are.
    pub fn sync(&mut self, spec: &RenderSpec) -> bool {
        if !should_reseed(&spec.widget_key, self.key.as_ref()) {
            return false;
        }

        self.shapes = spec
            .seed_drawing
            .as_deref()
            .map(<[Shape]>::to_vec)
            .unwrap_or_default();
        self.history.clear();
        self.key = Some(spec.widget_key.clone());
        self.overlay_dirty = true;
        log::info!(
            "Surface reset for {} with {} seeded shapes",
            spec.widget_key,
            self.shapes.len()
        );
        true
    }

    pub fn shapes(&self) -> &[Shape] {
        &self.shapes
    }

    fn record(&mut self) {
        self.history.push(self.shapes.clone());
        self.overlay_dirty = true;
    }

    /// Append a finished shape.
    pub fn add(&mut self, shape: Shape) {
        self.record();
        self.shapes.push(shape);
    }

    /// Move a shape by an offset in image pixels.
    pub fn move_shape(&mut self, index: usize, dx: f32, dy: f32) -> bool {
        if index >= self.shapes.len() || (dx == 0.0 && dy == 0.0) {
            return false;
        }
        self.record();
        self.shapes[index].translate(dx, dy);
        true
    }

    pub fn remove(&mut self, index: usize) -> bool {
        if index >= self.shapes.len() {
            return false;
        }
        self.record();
        self.shapes.remove(index);
        true
    }

    pub fn undo(&mut self) -> bool {
        let current = self.shapes.clone();
        match self.history.undo(current) {
            Some(previous) => {
                self.shapes = previous;
                self.overlay_dirty = true;
                true
            }
            None => false,
        }
    }

    pub fn redo(&mut self) -> bool {
        let current = self.shapes.clone();
        match self.history.redo(current) {
            Some(next) => {
                self.shapes = next;
                self.overlay_dirty = true;
                true
            }
            None => false,
        }
    }

    pub fn can_undo(&self) -> bool {
        self.history.can_undo()
    }

    pub fn can_redo(&self) -> bool {
        self.history.can_redo()
    }

    /// Topmost shape under `point`, with `tolerance` extra pixels of slack.
    pub fn hit_test(&self, point: Point, tolerance: f32) -> Option<usize> {
        self.shapes.iter().enumerate().rev().find_map(|(index, shape)| {
            let slack = shape.stroke_width / 2.0 + tolerance;
            let hit = match &shape.kind {
                ShapeKind::Rectangle(rect) => rect.contains(point, slack),
                ShapeKind::Freehand { points } => match points.as_slice() {
                    [single] => point_to_segment_distance(point, *single, *single) <= slack,
                    _ => points
                        .windows(2)
                        .any(|w| point_to_segment_distance(point, w[0], w[1]) <= slack),
                },
            };
            hit.then_some(index)
        })
    }

    fn overlay_for(&mut self, width: u32, height: u32) -> Option<Arc<RgbaImage>> {
        let size_changed = self
            .overlay
            .as_ref()
            .map_or(true, |o| o.dimensions() != (width, height));
        if self.overlay_dirty || size_changed {
            self.overlay = raster::rasterize(&self.shapes, width, height).map(Arc::new);
            self.overlay_dirty = false;
        }
        self.overlay.clone()
    }
}

impl DrawingSurface for Surface {
    fn render(&mut self, spec: &RenderSpec) -> SurfaceOutput {
        self.sync(spec);
        let overlay = spec
            .background
            .as_ref()
            .and_then(|bg| self.overlay_for(bg.width(), bg.height()));
        SurfaceOutput {
            shapes: self.shapes.iter().map(Shape::to_raw).collect(),
            overlay,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::project::SessionKey;
    use crate::models::shape::{Color, Rect};
    use crate::models::tool::{Tool, ToolSettings};

    fn spec(key: WidgetKey, seed: Option<Vec<Shape>>) -> RenderSpec {
        RenderSpec {
            brush: ToolSettings::new(Tool::SelectionBox).brush(),
            background: Some(Arc::new(RgbaImage::new(100, 80))),
            seed_drawing: seed.map(Arc::from),
            widget_key: key,
        }
    }

    fn key(name: &str, generation: u64) -> WidgetKey {
        WidgetKey::new(Some(SessionKey::from_token(name)), generation)
    }

    fn rect(left: f32, top: f32) -> Shape {
        Shape {
            kind: ShapeKind::Rectangle(Rect::new(left, top, 20.0, 10.0)),
            stroke_color: Color::rgb(0, 122, 255),
            stroke_width: 2.0,
            fill_color: Color::TRANSPARENT,
        }
    }

    #[test]
    fn test_seed_applied_once_per_key() {
        let mut surface = Surface::new();
        let spec_a = spec(key("a", 0), Some(vec![rect(1.0, 1.0)]));

        assert!(surface.sync(&spec_a));
        assert_eq!(surface.shapes().len(), 1);

        surface.add(rect(50.0, 50.0));
        assert!(!surface.sync(&spec_a));
        assert_eq!(surface.shapes().len(), 2);
    }

    #[test]
    fn test_new_key_discards_content() {
        let mut surface = Surface::new();
        surface.sync(&spec(key("a", 0), None));
        surface.add(rect(0.0, 0.0));

        assert!(surface.sync(&spec(key("b", 0), None)));
        assert!(surface.shapes().is_empty());
        assert!(!surface.can_undo());

        // Same image after a reset: the generation alone forces a reset.
        surface.add(rect(0.0, 0.0));
        assert!(surface.sync(&spec(key("b", 1), None)));
        assert!(surface.shapes().is_empty());
    }

    #[test]
    fn test_render_twice_is_identical() {
        let mut surface = Surface::new();
        let spec = spec(key("a", 0), Some(vec![rect(5.0, 5.0), rect(30.0, 40.0)]));

        let first = surface.render(&spec);
        let second = surface.render(&spec);
        assert_eq!(first.shapes, second.shapes);
        let (a, b) = (first.overlay.unwrap(), second.overlay.unwrap());
        assert_eq!(a.as_raw(), b.as_raw());
        assert_eq!(a.dimensions(), (100, 80));
    }

    #[test]
    fn test_no_overlay_without_background() {
        let mut surface = Surface::new();
        let mut spec = spec(WidgetKey::new(None, 0), None);
        spec.background = None;
        assert!(surface.render(&spec).overlay.is_none());
    }

    #[test]
    fn test_overlay_tracks_edits() {
        let mut surface = Surface::new();
        let spec = spec(key("a", 0), None);
        let empty = surface.render(&spec).overlay.unwrap();
        assert!(empty.pixels().all(|p| p[3] == 0));

        surface.add(rect(10.0, 10.0));
        let drawn = surface.render(&spec).overlay.unwrap();
        assert!(drawn.pixels().any(|p| p[3] > 0));
    }

    #[test]
    fn test_undo_redo_and_remove() {
        let mut surface = Surface::new();
        surface.sync(&spec(key("a", 0), None));
        surface.add(rect(0.0, 0.0));
        surface.add(rect(40.0, 0.0));
        assert!(surface.remove(0));
        assert_eq!(surface.shapes().len(), 1);

        assert!(surface.undo());
        assert_eq!(surface.shapes().len(), 2);
        assert!(surface.redo());
        assert_eq!(surface.shapes().len(), 1);
        assert!(!surface.remove(5));
    }

    #[test]
    fn test_move_and_hit_test() {
        let mut surface = Surface::new();
        surface.sync(&spec(key("a", 0), None));
        surface.add(rect(0.0, 0.0));
        surface.add(rect(10.0, 5.0));

        // Overlap: the later shape is on top.
        assert_eq!(surface.hit_test(Point::new(15.0, 8.0), 0.0), Some(1));
        assert_eq!(surface.hit_test(Point::new(90.0, 70.0), 0.0), None);

        assert!(surface.move_shape(1, 50.0, 50.0));
        assert_eq!(surface.hit_test(Point::new(15.0, 8.0), 0.0), Some(0));
        assert!(!surface.move_shape(0, 0.0, 0.0));
    }

    #[test]
    fn test_hit_test_freehand() {
        let mut surface = Surface::new();
        surface.sync(&spec(key("a", 0), None));
        surface.add(Shape {
            kind: ShapeKind::Freehand {
                points: vec![Point::new(0.0, 0.0), Point::new(40.0, 0.0)],
            },
            stroke_color: Color::rgb(255, 0, 0),
            stroke_width: 4.0,
            fill_color: Color::TRANSPARENT,
        });
        assert_eq!(surface.hit_test(Point::new(20.0, 1.5), 0.0), Some(0));
        assert_eq!(surface.hit_test(Point::new(20.0, 10.0), 0.0), None);
    }
}
