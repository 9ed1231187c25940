// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! Geometric utility functions.
//!
//! This module provides conversions between the scaled image shown on screen
//! and image pixel coordinates, plus the distance helper used for hit testing.

use crate::models::shape::Point;

/// Convert an offset inside the displayed image to image pixel coordinates.
pub fn display_to_image(
    display_x: f32,
    display_y: f32,
    display_size: (f32, f32),
    image_size: (u32, u32),
) -> Point {
    Point {
        x: display_x / display_size.0 * image_size.0 as f32,
        y: display_y / display_size.1 * image_size.1 as f32,
    }
}

/// Convert image pixel coordinates to an offset inside the displayed image.
pub fn image_to_display(point: &Point, display_size: (f32, f32), image_size: (u32, u32)) -> (f32, f32) {
    (
        point.x / image_size.0 as f32 * display_size.0,
        point.y / image_size.1 as f32 * display_size.1,
    )
}

/// Largest size with the image's aspect ratio that fits the available area.
pub fn fit_size(image_size: (u32, u32), available: (f32, f32)) -> (f32, f32) {
    let img_aspect = image_size.0 as f32 / image_size.1 as f32;
    let available_aspect = available.0 / available.1;

    if img_aspect > available_aspect {
        // Image is wider - fit to width
        (available.0, available.0 / img_aspect)
    } else {
        // Image is taller - fit to height
        (available.1 * img_aspect, available.1)
    }
}

/// Distance from `p` to the segment `a`-`b`.
pub fn point_to_segment_distance(p: Point, a: Point, b: Point) -> f32 {
    let (abx, aby) = (b.x - a.x, b.y - a.y);
    let len_sq = abx * abx + aby * aby;
    let t = if len_sq == 0.0 {
        0.0
    } else {
        (((p.x - a.x) * abx + (p.y - a.y) * aby) / len_sq).clamp(0.0, 1.0)
    };
    let (cx, cy) = (a.x + t * abx, a.y + t * aby);
    ((p.x - cx).powi(2) + (p.y - cy).powi(2)).sqrt()
}
