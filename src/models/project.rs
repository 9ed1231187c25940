// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! Project state.
//!
//! A project is everything the user has produced in one session: the photo,
//! the drawing over it, and the notes.

use super::annotation::{bind_notes, Annotation, NoteSlots};
use super::shape::Shape;
use image::RgbaImage;
use sha2::{Digest, Sha256};
use std::fmt;
use std::sync::Arc;

/// Identity of an uploaded image.
///
/// Derived from the image content (or a stable upload id), so re-reading the
/// same file yields the same key.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SessionKey(String);

impl SessionKey {
    /// Key an image by the SHA-256 of its encoded bytes.
    pub fn from_bytes(bytes: &[u8]) -> Self {
        Self(format!("{:x}", Sha256::digest(bytes)))
    }

    /// Key an image by an upload id supplied by the host.
    pub fn from_token(token: impl Into<String>) -> Self {
        Self(token.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SessionKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // Hashes are long; the prefix is enough to tell images apart in logs.
        let short: String = self.0.chars().take(12).collect();
        f.write_str(&short)
    }
}

/// The photo being annotated.
#[derive(Debug, Clone)]
pub struct ProjectImage {
    pub key: SessionKey,
    /// Decoded, orientation-corrected RGBA pixels
    pub bitmap: Arc<RgbaImage>,
    /// Bytes as uploaded, kept for the snapshot
    pub bytes: Arc<[u8]>,
}

impl ProjectImage {
    pub fn width(&self) -> u32 {
        self.bitmap.width()
    }

    pub fn height(&self) -> u32 {
        self.bitmap.height()
    }
}

impl PartialEq for ProjectImage {
    fn eq(&self, other: &Self) -> bool {
        self.key == other.key && self.bitmap.as_raw() == other.bitmap.as_raw()
    }
}

/// Complete session data.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Project {
    pub image: Option<ProjectImage>,
    /// Complete shape list last reported by the drawing surface
    pub shapes: Vec<Shape>,
    pub general_note: String,
    pub notes: NoteSlots,
}

impl Project {
    /// Whether the project holds nothing at all (the state right after a reset).
    pub fn is_empty(&self) -> bool {
        self.image.is_none()
            && self.shapes.is_empty()
            && self.general_note.is_empty()
            && self.notes.is_empty()
    }

    /// Selection rectangles in rank order with their notes.
    pub fn annotations(&self) -> Vec<Annotation> {
        bind_notes(&self.shapes, &self.notes)
    }
}
