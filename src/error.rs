// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! Error types for the annotation session core.
//!
//! Each stage of the pipeline has its own error so callers can decide how far
//! a failure is allowed to travel: decode and composite failures stop at the
//! export/pipeline boundary, malformed shapes are skipped one by one.

use std::path::PathBuf;
use thiserror::Error;

/// Uploaded bytes could not be turned into a bitmap.
#[derive(Error, Debug)]
pub enum DecodeError {
    /// The bytes do not start with the signature of any supported format
    #[error("Unsupported image format")]
    UnsupportedFormat,

    /// The format was recognized but the data is corrupt
    #[error("Failed to decode image: {0}")]
    Image(#[from] image::ImageError),

    /// Reading the byte stream failed
    #[error("Failed to read image data: {0}")]
    Io(#[from] std::io::Error),
}

/// The overlay could not be flattened onto the base image.
#[derive(Error, Debug)]
pub enum CompositeError {
    /// One of the bitmaps has no pixels
    #[error("Cannot composite an empty {layer} bitmap ({width}x{height})")]
    EmptyBitmap {
        /// Which layer was empty ("base" or "overlay")
        layer: &'static str,
        /// Width of the offending bitmap
        width: u32,
        /// Height of the offending bitmap
        height: u32,
    },
}

/// A shape entry reported by the drawing surface is unusable.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum AdapterError {
    /// The entry has no `type` field
    #[error("Shape entry has no type")]
    MissingKind,

    /// The entry names a shape type the annotation model does not know
    #[error("Unknown shape type '{0}'")]
    UnknownKind(String),

    /// A geometry field required by the shape type is absent
    #[error("Shape '{kind}' is missing required field '{field}'")]
    MissingField {
        /// Shape type of the entry
        kind: String,
        /// Name of the missing field
        field: &'static str,
    },

    /// A geometry field holds NaN or infinity
    #[error("Shape '{kind}' has a non-finite value in '{field}'")]
    NonFinite {
        /// Shape type of the entry
        kind: String,
        /// Name of the offending field
        field: &'static str,
    },
}

/// Producing one of the downloadable artifacts failed.
#[derive(Error, Debug)]
pub enum ExportError {
    /// Nothing to export until an image is loaded
    #[error("No image loaded")]
    NoProject,

    /// The drawing surface has not produced an overlay yet
    #[error("Draw to download image.")]
    NoOverlay,

    /// Flattening failed
    #[error("Could not process image: {0}")]
    Composite(#[from] CompositeError),

    /// JPEG encoding failed
    #[error("Could not encode image: {0}")]
    Encode(#[source] image::ImageError),
}

/// Reading or writing the project snapshot failed.
#[derive(Error, Debug)]
pub enum StoreError {
    /// Filesystem operation failed
    #[error("Snapshot I/O error at {path:?}: {source}")]
    Io {
        /// Path being accessed
        path: PathBuf,
        /// Underlying error
        #[source]
        source: std::io::Error,
    },

    /// Drawing document could not be serialized
    #[error("Snapshot JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl StoreError {
    /// Create an I/O error bound to a path.
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}

/// A session event could not be applied. The session state is left as it was.
#[derive(Error, Debug)]
pub enum SessionError {
    /// Uploaded image was rejected
    #[error(transparent)]
    Decode(#[from] DecodeError),

    /// A destructive snapshot operation failed
    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Configuration file could not be used.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// The file exists but could not be read
    #[error("Failed to read config {path:?}: {source}")]
    Io {
        /// Config file path
        path: PathBuf,
        /// Underlying error
        #[source]
        source: std::io::Error,
    },

    /// The file is not valid YAML for the config schema
    #[error("Invalid config syntax: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// A value is outside its allowed range
    #[error("Invalid config value for '{field}': {message}")]
    Invalid {
        /// Offending field
        field: &'static str,
        /// What is wrong with it
        message: String,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_no_overlay_message_matches_ui_text() {
        assert_eq!(ExportError::NoOverlay.to_string(), "Draw to download image.");
    }

    #[test]
    fn test_session_error_is_transparent() {
        let err: SessionError = DecodeError::UnsupportedFormat.into();
        assert_eq!(err.to_string(), "Unsupported image format");
    }

    #[test]
    fn test_adapter_error_names_field() {
        let err = AdapterError::MissingField {
            kind: "rect".to_string(),
            field: "top",
        };
        assert!(err.to_string().contains("'top'"));
    }
}
