// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! Export service.
//!
//! Builds the two downloadable artifacts: the notes as plain text and the
//! photo with the drawing flattened onto it. The two are produced
//! independently so a failing image export never hides the notes.

use super::media;
use crate::error::ExportError;
use crate::models::annotation::Annotation;
use crate::models::project::Project;
use image::codecs::jpeg::JpegEncoder;
use image::{RgbImage, RgbaImage};

/// A file ready to be saved or offered for download.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Artifact {
    pub file_name: String,
    pub mime: &'static str,
    pub bytes: Vec<u8>,
}

/// Both artifacts of one export request.
#[derive(Debug)]
pub struct Exports {
    /// `None` until an image is loaded
    pub text: Option<Artifact>,
    pub image: Result<Artifact, ExportError>,
}

/// Render the notes document.
///
/// The general note always comes first; each selection follows in rank order.
pub fn render_notes(general_note: &str, annotations: &[Annotation]) -> String {
    let mut text = format!("GENERAL NOTES:\n{general_note}\n\n");
    for annotation in annotations {
        text.push_str(&format!(
            "SELECTION #{}:\n{}\n\n",
            annotation.number(),
            annotation.note
        ));
    }
    text
}

/// Encode an RGB bitmap as baseline JPEG.
pub fn encode_jpeg(image: &RgbImage, quality: u8) -> Result<Vec<u8>, ExportError> {
    let mut bytes = Vec::new();
    JpegEncoder::new_with_quality(&mut bytes, quality)
        .encode_image(image)
        .map_err(ExportError::Encode)?;
    Ok(bytes)
}

/// Produces export artifacts with the configured file names and quality.
#[derive(Debug, Clone)]
pub struct ExportService {
    pub notes_file_name: String,
    pub image_file_name: String,
    pub jpeg_quality: u8,
}

impl Default for ExportService {
    fn default() -> Self {
        Self {
            notes_file_name: "project_notes.txt".to_string(),
            image_file_name: "annotated_image.jpg".to_string(),
            jpeg_quality: 90,
        }
    }
}

impl ExportService {
    /// Notes as UTF-8 text. Available as soon as an image is loaded.
    pub fn text(&self, project: &Project) -> Option<Artifact> {
        project.image.as_ref()?;
        let text = render_notes(&project.general_note, &project.annotations());
        Some(Artifact {
            file_name: self.notes_file_name.clone(),
            mime: "text/plain",
            bytes: text.into_bytes(),
        })
    }

    /// Photo with the overlay flattened onto it, as JPEG.
    pub fn image(&self, project: &Project, overlay: Option<&RgbaImage>) -> Result<Artifact, ExportError> {
        let base = project.image.as_ref().ok_or(ExportError::NoProject)?;
        let overlay = overlay.ok_or(ExportError::NoOverlay)?;

        let flattened = media::composite(&base.bitmap, overlay)?;
        let bytes = encode_jpeg(&flattened, self.jpeg_quality)?;
        log::debug!(
            "Encoded {}x{} export ({} bytes, quality {})",
            flattened.width(),
            flattened.height(),
            bytes.len(),
            self.jpeg_quality
        );

        Ok(Artifact {
            file_name: self.image_file_name.clone(),
            mime: "image/jpeg",
            bytes,
        })
    }

    /// Build both artifacts. A failure of one does not affect the other.
    pub fn export(&self, project: &Project, overlay: Option<&RgbaImage>) -> Exports {
        let exports = Exports {
            text: self.text(project),
            image: self.image(project, overlay),
        };
        if let Err(e) = &exports.image {
            log::error!("Image export failed: {}", e);
        }
        exports
    }
}
