// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! Selection notes bound to rectangles.
//!
//! Rectangles are ranked by position (top first, then left) and each rank
//! owns one note slot. The binding follows the rank, not the rectangle: a
//! rectangle dragged above another one takes over that one's note.

use super::shape::{Rect, Shape};
use std::collections::BTreeMap;

/// Note text per rectangle rank.
///
/// A slot keeps its text while no rectangle occupies its rank, so a note
/// comes back when a rectangle reappears at that rank.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NoteSlots {
    slots: BTreeMap<usize, String>,
}

impl NoteSlots {
    pub fn new() -> Self {
        Self::default()
    }

    /// Text of slot `index`, empty when never written.
    pub fn get(&self, index: usize) -> &str {
        self.slots.get(&index).map(String::as_str).unwrap_or("")
    }

    pub fn set(&mut self, index: usize, text: impl Into<String>) {
        self.slots.insert(index, text.into());
    }

    pub fn is_empty(&self) -> bool {
        self.slots.values().all(String::is_empty)
    }
}

/// A selection rectangle together with the note bound to its rank.
#[derive(Debug, Clone, PartialEq)]
pub struct Annotation {
    /// Zero-based rank in (top, left) order
    pub rectangle_index: usize,
    pub rect: Rect,
    pub note: String,
}

impl Annotation {
    /// One-based label shown to the user and used in the export.
    pub fn number(&self) -> usize {
        self.rectangle_index + 1
    }
}

/// Rectangles of the shape list ordered by (top, left).
///
/// The sort is stable, so rectangles at the same position keep the order the
/// drawing surface reported them in.
pub fn ordered_rectangles(shapes: &[Shape]) -> Vec<Rect> {
    let mut rects: Vec<Rect> = shapes.iter().filter_map(Shape::as_rectangle).copied().collect();
    rects.sort_by(|a, b| a.top.total_cmp(&b.top).then(a.left.total_cmp(&b.left)));
    rects
}

/// Pair each ranked rectangle with its note slot.
pub fn bind_notes(shapes: &[Shape], notes: &NoteSlots) -> Vec<Annotation> {
    ordered_rectangles(shapes)
        .into_iter()
        .enumerate()
        .map(|(rectangle_index, rect)| Annotation {
            rectangle_index,
            rect,
            note: notes.get(rectangle_index).to_string(),
        })
        .collect()
}
