// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! Shapes drawn over the photo.
//!
//! The drawing surface reports its content as loosely-typed [`RawShape`]
//! entries (the same object format that is persisted in the snapshot file).
//! [`Shape`] is the validated form the rest of the crate works with.
//! All coordinates are image pixels with the origin at the top-left corner.

use crate::error::AdapterError;
use serde::{Deserialize, Serialize};

/// A point in image pixel coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Point {
    pub x: f32,
    pub y: f32,
}

impl Point {
    pub fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }
}

/// Axis-aligned rectangle in image pixel coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Rect {
    pub left: f32,
    pub top: f32,
    pub width: f32,
    pub height: f32,
}

impl Rect {
    pub fn new(left: f32, top: f32, width: f32, height: f32) -> Self {
        Self {
            left,
            top,
            width,
            height,
        }
    }

    /// Build a rectangle spanning two opposite corners, in any order.
    pub fn from_corners(a: Point, b: Point) -> Self {
        Self {
            left: a.x.min(b.x),
            top: a.y.min(b.y),
            width: (a.x - b.x).abs(),
            height: (a.y - b.y).abs(),
        }
    }

    pub fn right(&self) -> f32 {
        self.left + self.width
    }

    pub fn bottom(&self) -> f32 {
        self.top + self.height
    }

    /// Check whether the point lies inside the rectangle, grown by `margin` on every side.
    pub fn contains(&self, point: Point, margin: f32) -> bool {
        point.x >= self.left - margin
            && point.x <= self.right() + margin
            && point.y >= self.top - margin
            && point.y <= self.bottom() + margin
    }
}

/// RGBA color with straight (non-premultiplied) alpha.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl Color {
    pub const BLACK: Color = Color::rgb(0, 0, 0);
    pub const TRANSPARENT: Color = Color::rgba(0, 0, 0, 0);

    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b, a: 255 }
    }

    pub const fn rgba(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self { r, g, b, a }
    }

    pub fn with_alpha(self, a: u8) -> Self {
        Self { a, ..self }
    }

    /// Parse a CSS color: `#rrggbb`, `#rrggbbaa`, `rgb(r,g,b)` or `rgba(r,g,b,a)`
    /// where `a` is a fraction between 0 and 1.
    pub fn parse(text: &str) -> Option<Self> {
        let text = text.trim();
        if let Some(hex) = text.strip_prefix('#') {
            return Self::parse_hex(hex);
        }

        let (args, has_alpha) = if let Some(rest) = text.strip_prefix("rgba(") {
            (rest.strip_suffix(')')?, true)
        } else if let Some(rest) = text.strip_prefix("rgb(") {
            (rest.strip_suffix(')')?, false)
        } else {
            return None;
        };

        let parts: Vec<&str> = args.split(',').map(str::trim).collect();
        if parts.len() != if has_alpha { 4 } else { 3 } {
            return None;
        }
        let r = parts[0].parse().ok()?;
        let g = parts[1].parse().ok()?;
        let b = parts[2].parse().ok()?;
        let a = if has_alpha {
            let fraction: f32 = parts[3].parse().ok()?;
            (fraction.clamp(0.0, 1.0) * 255.0).round() as u8
        } else {
            255
        };
        Some(Self::rgba(r, g, b, a))
    }

    fn parse_hex(hex: &str) -> Option<Self> {
        if !hex.is_ascii() || !(hex.len() == 6 || hex.len() == 8) {
            return None;
        }
        let channel = |i: usize| u8::from_str_radix(&hex[i..i + 2], 16).ok();
        let a = if hex.len() == 8 { channel(6)? } else { 255 };
        Some(Self::rgba(channel(0)?, channel(2)?, channel(4)?, a))
    }

    /// Format as `#rrggbb`, or `#rrggbbaa` when not fully opaque.
    pub fn to_css(&self) -> String {
        if self.a == 255 {
            format!("#{:02x}{:02x}{:02x}", self.r, self.g, self.b)
        } else {
            format!("#{:02x}{:02x}{:02x}{:02x}", self.r, self.g, self.b, self.a)
        }
    }
}

/// Geometry of a shape.
#[derive(Debug, Clone, PartialEq)]
pub enum ShapeKind {
    /// A freehand stroke through the given points
    Freehand { points: Vec<Point> },
    /// A selection rectangle
    Rectangle(Rect),
}

/// A validated shape as drawn on the surface.
#[derive(Debug, Clone, PartialEq)]
pub struct Shape {
    pub kind: ShapeKind,
    pub stroke_color: Color,
    pub stroke_width: f32,
    pub fill_color: Color,
}

impl Shape {
    /// Return the rectangle geometry if this is a selection rectangle.
    pub fn as_rectangle(&self) -> Option<&Rect> {
        match &self.kind {
            ShapeKind::Rectangle(rect) => Some(rect),
            ShapeKind::Freehand { .. } => None,
        }
    }

    /// Bounding box of the geometry (stroke width not included).
    pub fn bounds(&self) -> Rect {
        match &self.kind {
            ShapeKind::Rectangle(rect) => *rect,
            ShapeKind::Freehand { points } => {
                let mut min = Point::new(f32::MAX, f32::MAX);
                let mut max = Point::new(f32::MIN, f32::MIN);
                for p in points {
                    min.x = min.x.min(p.x);
                    min.y = min.y.min(p.y);
                    max.x = max.x.max(p.x);
                    max.y = max.y.max(p.y);
                }
                if points.is_empty() {
                    Rect::new(0.0, 0.0, 0.0, 0.0)
                } else {
                    Rect::from_corners(min, max)
                }
            }
        }
    }

    /// Move the shape by the given offset.
    pub fn translate(&mut self, dx: f32, dy: f32) {
        match &mut self.kind {
            ShapeKind::Rectangle(rect) => {
                rect.left += dx;
                rect.top += dy;
            }
            ShapeKind::Freehand { points } => {
                for p in points {
                    p.x += dx;
                    p.y += dy;
                }
            }
        }
    }

    /// Convert to the surface's object format.
    pub fn to_raw(&self) -> RawShape {
        let bounds = self.bounds();
        let (kind, path) = match &self.kind {
            ShapeKind::Rectangle(_) => (RawShape::RECT, None),
            ShapeKind::Freehand { points } => (
                RawShape::PATH,
                Some(points.iter().map(|p| [p.x, p.y]).collect()),
            ),
        };
        RawShape {
            kind: Some(kind.to_string()),
            left: Some(bounds.left),
            top: Some(bounds.top),
            width: Some(bounds.width),
            height: Some(bounds.height),
            path,
            stroke: Some(self.stroke_color.to_css()),
            stroke_width: Some(self.stroke_width),
            fill: Some(self.fill_color.to_css()),
        }
    }
}

/// One entry of the surface's shape list, as reported or persisted.
///
/// Every field is optional so a damaged entry can be read and rejected on its
/// own without failing the whole list.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RawShape {
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub left: Option<f32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub top: Option<f32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub width: Option<f32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub height: Option<f32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<Vec<[f32; 2]>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stroke: Option<String>,
    #[serde(
        rename = "strokeWidth",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub stroke_width: Option<f32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fill: Option<String>,
}

impl RawShape {
    pub const RECT: &'static str = "rect";
    pub const PATH: &'static str = "path";
}

fn required(kind: &str, field: &'static str, value: Option<f32>) -> Result<f32, AdapterError> {
    let value = value.ok_or_else(|| AdapterError::MissingField {
        kind: kind.to_string(),
        field,
    })?;
    if !value.is_finite() {
        return Err(AdapterError::NonFinite {
            kind: kind.to_string(),
            field,
        });
    }
    Ok(value)
}

impl TryFrom<&RawShape> for Shape {
    type Error = AdapterError;

    fn try_from(raw: &RawShape) -> Result<Self, Self::Error> {
        let kind_name = raw.kind.as_deref().ok_or(AdapterError::MissingKind)?;

        let kind = match kind_name {
            RawShape::RECT => {
                let left = required(kind_name, "left", raw.left)?;
                let top = required(kind_name, "top", raw.top)?;
                let width = required(kind_name, "width", raw.width)?;
                let height = required(kind_name, "height", raw.height)?;
                ShapeKind::Rectangle(Rect::from_corners(
                    Point::new(left, top),
                    Point::new(left + width, top + height),
                ))
            }
            RawShape::PATH => {
                let path = raw
                    .path
                    .as_ref()
                    .filter(|path| !path.is_empty())
                    .ok_or_else(|| AdapterError::MissingField {
                        kind: kind_name.to_string(),
                        field: "path",
                    })?;
                if path.iter().flatten().any(|v| !v.is_finite()) {
                    return Err(AdapterError::NonFinite {
                        kind: kind_name.to_string(),
                        field: "path",
                    });
                }
                ShapeKind::Freehand {
                    points: path.iter().map(|[x, y]| Point::new(*x, *y)).collect(),
                }
            }
            other => return Err(AdapterError::UnknownKind(other.to_string())),
        };

        Ok(Shape {
            kind,
            stroke_color: raw
                .stroke
                .as_deref()
                .and_then(Color::parse)
                .unwrap_or(Color::BLACK),
            stroke_width: raw
                .stroke_width
                .filter(|w| w.is_finite() && *w > 0.0)
                .unwrap_or(1.0),
            fill_color: raw
                .fill
                .as_deref()
                .and_then(Color::parse)
                .unwrap_or(Color::TRANSPARENT),
        })
    }
}

/// Validate a reported shape list, skipping unusable entries.
///
/// Order of the surviving shapes is the order the surface reported them in.
pub fn parse_shapes(raw: &[RawShape]) -> Vec<Shape> {
    raw.iter()
        .enumerate()
        .filter_map(|(index, entry)| match Shape::try_from(entry) {
            Ok(shape) => Some(shape),
            Err(e) => {
                log::warn!("Skipping shape #{}: {}", index, e);
                None
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn raw_rect(left: f32, top: f32) -> RawShape {
        RawShape {
            kind: Some("rect".to_string()),
            left: Some(left),
            top: Some(top),
            width: Some(40.0),
            height: Some(30.0),
            ..Default::default()
        }
    }

    #[test]
    fn test_color_parse_hex() {
        assert_eq!(Color::parse("#007AFF"), Some(Color::rgb(0, 122, 255)));
        assert_eq!(
            Color::parse("#FFFF0050"),
            Some(Color::rgba(255, 255, 0, 0x50))
        );
        assert_eq!(Color::parse("#12345"), None);
        assert_eq!(Color::parse("#gg0000"), None);
    }

    #[test]
    fn test_color_parse_rgba_function() {
        let selection = Color::parse("rgba(0, 122, 255, 0.1)").unwrap();
        assert_eq!((selection.r, selection.g, selection.b), (0, 122, 255));
        assert!((25..=26).contains(&selection.a));
        assert_eq!(Color::parse("rgba(0,0,0,0)"), Some(Color::TRANSPARENT));
        assert_eq!(Color::parse("rgb(1,2,3)"), Some(Color::rgb(1, 2, 3)));
        assert_eq!(Color::parse("rgba(1,2,3)"), None);
        assert_eq!(Color::parse("hsl(0, 0%, 0%)"), None);
    }

    #[test]
    fn test_color_css_output() {
        assert_eq!(Color::rgb(255, 0, 0).to_css(), "#ff0000");
        assert_eq!(Color::rgba(255, 255, 0, 0x50).to_css(), "#ffff0050");
    }

    #[test]
    fn test_rect_from_corners_normalizes() {
        let rect = Rect::from_corners(Point::new(50.0, 40.0), Point::new(10.0, 60.0));
        assert_eq!(rect, Rect::new(10.0, 40.0, 40.0, 20.0));
    }

    #[test]
    fn test_parse_rect_with_negative_size() {
        let raw = RawShape {
            width: Some(-20.0),
            ..raw_rect(100.0, 50.0)
        };
        let shape = Shape::try_from(&raw).unwrap();
        assert_eq!(shape.as_rectangle(), Some(&Rect::new(80.0, 50.0, 20.0, 30.0)));
    }

    #[test]
    fn test_parse_defaults_for_style() {
        let shape = Shape::try_from(&raw_rect(0.0, 0.0)).unwrap();
        assert_eq!(shape.stroke_color, Color::BLACK);
        assert_eq!(shape.fill_color, Color::TRANSPARENT);
        assert_eq!(shape.stroke_width, 1.0);
    }

    #[test]
    fn test_parse_rejects_missing_geometry() {
        let raw = RawShape {
            top: None,
            ..raw_rect(0.0, 0.0)
        };
        assert_eq!(
            Shape::try_from(&raw),
            Err(AdapterError::MissingField {
                kind: "rect".to_string(),
                field: "top"
            })
        );

        let path = RawShape {
            kind: Some("path".to_string()),
            path: Some(Vec::new()),
            ..Default::default()
        };
        assert!(Shape::try_from(&path).is_err());
    }

    #[test]
    fn test_parse_shapes_skips_malformed_entries() {
        let raw = vec![
            raw_rect(10.0, 10.0),
            RawShape::default(),
            RawShape {
                kind: Some("circle".to_string()),
                ..Default::default()
            },
            RawShape {
                left: Some(f32::NAN),
                ..raw_rect(0.0, 0.0)
            },
            raw_rect(20.0, 5.0),
        ];
        let shapes = parse_shapes(&raw);
        assert_eq!(shapes.len(), 2);
        assert_eq!(shapes[0].as_rectangle().map(|r| r.left), Some(10.0));
        assert_eq!(shapes[1].as_rectangle().map(|r| r.left), Some(20.0));
    }

    #[test]
    fn test_raw_json_field_names() {
        let shape = Shape {
            kind: ShapeKind::Freehand {
                points: vec![Point::new(1.0, 2.0), Point::new(5.0, 8.0)],
            },
            stroke_color: Color::rgb(255, 0, 0),
            stroke_width: 3.0,
            fill_color: Color::TRANSPARENT,
        };
        let json = serde_json::to_value(shape.to_raw()).unwrap();
        assert_eq!(json["type"], "path");
        assert_eq!(json["strokeWidth"], 3.0);
        assert_eq!(json["left"], 1.0);
        assert_eq!(json["height"], 6.0);

        let back: RawShape = serde_json::from_value(json).unwrap();
        assert_eq!(Shape::try_from(&back).unwrap(), shape);
    }

    #[test]
    fn test_translate_freehand() {
        let mut shape = Shape {
            kind: ShapeKind::Freehand {
                points: vec![Point::new(1.0, 1.0)],
            },
            stroke_color: Color::BLACK,
            stroke_width: 1.0,
            fill_color: Color::TRANSPARENT,
        };
        shape.translate(2.0, -1.0);
        assert_eq!(shape.bounds().left, 3.0);
        assert_eq!(shape.bounds().top, 0.0);
    }
}
