// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! Overlay rasterization using tiny-skia.
//!
//! Produces the transparent layer holding every shape, at image resolution,
//! which the export flattens onto the photo.

use crate::models::shape::{Color, Shape, ShapeKind};
use image::{Rgba, RgbaImage};
use tiny_skia::{FillRule, LineCap, LineJoin, Paint, PathBuilder, Pixmap, Stroke, Transform};

fn paint(color: Color) -> Paint<'static> {
    let mut paint = Paint::default();
    paint.set_color_rgba8(color.r, color.g, color.b, color.a);
    paint.anti_alias = true;
    paint
}

fn build_path(shape: &Shape) -> Option<tiny_skia::Path> {
    match &shape.kind {
        ShapeKind::Rectangle(rect) => {
            let rect = tiny_skia::Rect::from_xywh(rect.left, rect.top, rect.width, rect.height)?;
            Some(PathBuilder::from_rect(rect))
        }
        ShapeKind::Freehand { points } => {
            let (first, rest) = points.split_first()?;
            let mut pb = PathBuilder::new();
            pb.move_to(first.x, first.y);
            if rest.is_empty() {
                // A click without movement still leaves a dot.
                pb.line_to(first.x + 0.01, first.y);
            }
            for p in rest {
                pb.line_to(p.x, p.y);
            }
            pb.finish()
        }
    }
}

/// Rasterize the shapes, in list order, onto a transparent bitmap.
///
/// Returns `None` when the size is zero.
pub fn rasterize(shapes: &[Shape], width: u32, height: u32) -> Option<RgbaImage> {
    let mut pixmap = Pixmap::new(width, height)?;

    for shape in shapes {
        let Some(path) = build_path(shape) else {
            log::trace!("Nothing to rasterize for degenerate shape {:?}", shape.kind);
            continue;
        };

        if shape.fill_color.a > 0 {
            pixmap.fill_path(
                &path,
                &paint(shape.fill_color),
                FillRule::Winding,
                Transform::identity(),
                None,
            );
        }

        let stroke = Stroke {
            width: shape.stroke_width,
            line_cap: LineCap::Round,
            line_join: LineJoin::Round,
            ..Default::default()
        };
        pixmap.stroke_path(
            &path,
            &paint(shape.stroke_color),
            &stroke,
            Transform::identity(),
            None,
        );
    }

    // tiny-skia stores premultiplied alpha; bitmaps elsewhere are straight.
    let mut overlay = RgbaImage::new(width, height);
    for (dst, src) in overlay.pixels_mut().zip(pixmap.pixels()) {
        let c = src.demultiply();
        *dst = Rgba([c.red(), c.green(), c.blue(), c.alpha()]);
    }
    Some(overlay)
}
