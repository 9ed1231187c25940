// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! Session state machine.
//!
//! [`reduce`] is the single entry point for every user event: it takes the
//! prior state and an event and returns the next state together with the
//! persistence effects the store must carry out. It never touches the UI or
//! the filesystem, and a failed event returns an error without producing a
//! state, so the prior one stays in force.

use crate::error::SessionError;
use crate::io::media;
use crate::io::serialization::Snapshot;
use crate::models::project::{Project, ProjectImage, SessionKey};
use crate::models::shape::{parse_shapes, RawShape, Shape};
use std::fmt;
use std::sync::Arc;

/// Identity the drawing surface is initialized under.
///
/// Changes when the image changes and on every reset, and at no other time.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct WidgetKey {
    image: Option<SessionKey>,
    generation: u64,
}

impl WidgetKey {
    pub fn new(image: Option<SessionKey>, generation: u64) -> Self {
        Self { image, generation }
    }
}

impl fmt::Display for WidgetKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.image {
            Some(key) => write!(f, "canvas-{}-{}", self.generation, key),
            None => write!(f, "canvas-{}-empty", self.generation),
        }
    }
}

/// Whether the surface must drop its content and load the seed drawing.
///
/// True only when the key differs from the one the surface was last
/// initialized with, i.e. the image changed or a reset happened.
pub fn should_reseed(current: &WidgetKey, last: Option<&WidgetKey>) -> bool {
    last != Some(current)
}

/// Image bytes from the upload widget.
#[derive(Debug, Clone)]
pub struct Upload {
    pub bytes: Vec<u8>,
    /// Stable id assigned by the host, if it has one
    pub token: Option<String>,
}

impl Upload {
    pub fn new(bytes: Vec<u8>) -> Self {
        Self { bytes, token: None }
    }

    pub fn with_token(mut self, token: impl Into<String>) -> Self {
        self.token = Some(token.into());
        self
    }

    fn key(&self) -> SessionKey {
        match &self.token {
            Some(token) => SessionKey::from_token(token.clone()),
            None => SessionKey::from_bytes(&self.bytes),
        }
    }
}

/// Something the user did.
#[derive(Debug, Clone)]
pub enum Event {
    /// A file was picked in the upload widget
    ImageUploaded(Upload),
    /// The drawing surface reported its complete shape list
    ShapesReported(Vec<RawShape>),
    GeneralNoteEdited(String),
    SelectionNoteEdited { index: usize, text: String },
    /// Discard the whole project
    Reset,
}

/// Persistence work requested by a transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Effect {
    /// Store the current image bytes
    PersistImage,
    /// Store the current shape list
    PersistDrawing,
    /// Delete image and drawing from the snapshot
    ClearSnapshot,
}

/// Complete state of one session.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SessionState {
    project: Project,
    /// Drawing the surface starts from; never updated from surface reports
    seed: Option<Arc<[Shape]>>,
    /// Bumped on reset so the surface reinitializes even for the same image
    generation: u64,
}

impl SessionState {
    /// Rebuild a session from a stored snapshot.
    ///
    /// An image that no longer decodes is dropped together with its drawing.
    pub fn restore(snapshot: Snapshot) -> Self {
        let image = snapshot.image.and_then(|bytes| match media::load(&bytes) {
            Ok(bitmap) => Some(ProjectImage {
                key: SessionKey::from_bytes(&bytes),
                bitmap: Arc::new(bitmap),
                bytes: Arc::from(bytes),
            }),
            Err(e) => {
                log::warn!("Stored image could not be restored: {}", e);
                None
            }
        });
        let Some(image) = image else {
            return Self::default();
        };

        let seed: Option<Arc<[Shape]>> = snapshot.drawing.map(|raw| parse_shapes(&raw).into());
        log::info!(
            "Restored project image {} ({}x{}) with {} shapes",
            image.key,
            image.width(),
            image.height(),
            seed.as_ref().map_or(0, |s| s.len())
        );
        Self {
            project: Project {
                image: Some(image),
                shapes: seed.as_deref().map(<[Shape]>::to_vec).unwrap_or_default(),
                ..Default::default()
            },
            seed,
            generation: 0,
        }
    }

    pub fn project(&self) -> &Project {
        &self.project
    }

    pub fn seed(&self) -> Option<&Arc<[Shape]>> {
        self.seed.as_ref()
    }

    pub fn widget_key(&self) -> WidgetKey {
        WidgetKey::new(
            self.project.image.as_ref().map(|image| image.key.clone()),
            self.generation,
        )
    }
}

/// Result of applying one event.
#[derive(Debug, Clone)]
pub struct Transition {
    pub state: SessionState,
    pub effects: Vec<Effect>,
}

impl Transition {
    fn unchanged(prior: &SessionState) -> Self {
        Self {
            state: prior.clone(),
            effects: Vec::new(),
        }
    }
}

/// Apply one event to the prior state.
pub fn reduce(prior: &SessionState, event: Event) -> Result<Transition, SessionError> {
    match event {
        Event::ImageUploaded(upload) => {
            let key = upload.key();
            let current = prior.project.image.as_ref().map(|image| &image.key);
            if current == Some(&key) {
                return Ok(Transition::unchanged(prior));
            }

            let bitmap = media::load(&upload.bytes)?;
            log::info!(
                "Loaded image {} ({}x{})",
                key,
                bitmap.width(),
                bitmap.height()
            );

            let mut state = prior.clone();
            state.project.image = Some(ProjectImage {
                key,
                bitmap: Arc::new(bitmap),
                bytes: Arc::from(upload.bytes),
            });
            // The surface starts over for a new image; so does the drawing.
            state.project.shapes.clear();
            state.seed = None;
            Ok(Transition {
                state,
                effects: vec![Effect::PersistImage, Effect::PersistDrawing],
            })
        }

        Event::ShapesReported(raw) => {
            if prior.project.image.is_none() {
                log::trace!("Ignoring {} shapes reported without an image", raw.len());
                return Ok(Transition::unchanged(prior));
            }

            let shapes = parse_shapes(&raw);
            if shapes == prior.project.shapes {
                return Ok(Transition::unchanged(prior));
            }

            log::debug!(
                "Shape list changed: {} -> {} shapes",
                prior.project.shapes.len(),
                shapes.len()
            );
            let mut state = prior.clone();
            state.project.shapes = shapes;
            Ok(Transition {
                state,
                effects: vec![Effect::PersistDrawing],
            })
        }

        Event::GeneralNoteEdited(text) => {
            let mut state = prior.clone();
            state.project.general_note = text;
            Ok(Transition {
                state,
                effects: Vec::new(),
            })
        }

        Event::SelectionNoteEdited { index, text } => {
            let mut state = prior.clone();
            state.project.notes.set(index, text);
            Ok(Transition {
                state,
                effects: Vec::new(),
            })
        }

        Event::Reset => {
            log::info!("Project reset");
            Ok(Transition {
                state: SessionState {
                    generation: prior.generation + 1,
                    ..Default::default()
                },
                effects: vec![Effect::ClearSnapshot],
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::DecodeError;
    use image::{DynamicImage, ImageFormat, RgbaImage};
    use std::io::Cursor;

    fn png(width: u32, height: u32) -> Vec<u8> {
        let mut bytes = Vec::new();
        DynamicImage::ImageRgba8(RgbaImage::new(width, height))
            .write_to(&mut Cursor::new(&mut bytes), ImageFormat::Png)
            .unwrap();
        bytes
    }

    fn raw_rect(left: f32, top: f32) -> RawShape {
        RawShape {
            kind: Some("rect".to_string()),
            left: Some(left),
            top: Some(top),
            width: Some(30.0),
            height: Some(20.0),
            stroke: Some("#007AFF".to_string()),
            stroke_width: Some(2.0),
            fill: Some("rgba(0, 122, 255, 0.1)".to_string()),
            ..Default::default()
        }
    }

    fn apply(state: &SessionState, event: Event) -> SessionState {
        reduce(state, event).unwrap().state
    }

    fn with_image() -> SessionState {
        apply(
            &SessionState::default(),
            Event::ImageUploaded(Upload::new(png(800, 600))),
        )
    }

    #[test]
    fn test_should_reseed() {
        let a = WidgetKey::new(Some(SessionKey::from_token("a")), 0);
        let b = WidgetKey::new(Some(SessionKey::from_token("b")), 0);
        assert!(should_reseed(&a, None));
        assert!(!should_reseed(&a, Some(&a)));
        assert!(should_reseed(&b, Some(&a)));
        assert!(should_reseed(&WidgetKey::new(Some(SessionKey::from_token("a")), 1), Some(&a)));
    }

    #[test]
    fn test_upload_creates_project() {
        let transition = reduce(
            &SessionState::default(),
            Event::ImageUploaded(Upload::new(png(800, 600))),
        )
        .unwrap();
        let image = transition.state.project().image.as_ref().unwrap();
        assert_eq!((image.width(), image.height()), (800, 600));
        assert_eq!(
            transition.effects,
            vec![Effect::PersistImage, Effect::PersistDrawing]
        );
    }

    #[test]
    fn test_same_upload_is_noop() {
        let state = with_image();
        let state = apply(&state, Event::ShapesReported(vec![raw_rect(1.0, 1.0)]));

        let transition = reduce(&state, Event::ImageUploaded(Upload::new(png(800, 600)))).unwrap();
        assert_eq!(transition.state, state);
        assert!(transition.effects.is_empty());
    }

    #[test]
    fn test_token_identifies_upload() {
        let state = apply(
            &SessionState::default(),
            Event::ImageUploaded(Upload::new(png(10, 10)).with_token("file-1")),
        );
        // Same token, different bytes: still the same upload, nothing is decoded.
        let transition = reduce(
            &state,
            Event::ImageUploaded(Upload::new(b"garbage".to_vec()).with_token("file-1")),
        )
        .unwrap();
        assert!(transition.effects.is_empty());
    }

    #[test]
    fn test_new_image_changes_widget_key_and_clears_drawing() {
        let state = with_image();
        let state = apply(&state, Event::ShapesReported(vec![raw_rect(1.0, 1.0)]));
        let state = apply(&state, Event::GeneralNoteEdited("keep me".to_string()));
        let before = state.widget_key();

        let state = apply(&state, Event::ImageUploaded(Upload::new(png(64, 48))));
        assert_ne!(state.widget_key(), before);
        assert!(state.project().shapes.is_empty());
        assert!(state.seed().is_none());
        assert_eq!(state.project().general_note, "keep me");
    }

    #[test]
    fn test_corrupt_upload_leaves_state_untouched() {
        let state = with_image();
        let state = apply(&state, Event::ShapesReported(vec![raw_rect(5.0, 5.0)]));
        let state = apply(&state, Event::GeneralNoteEdited("notes".to_string()));

        let result = reduce(&state, Event::ImageUploaded(Upload::new(b"\x89PNG broken".to_vec())));
        assert!(matches!(result, Err(SessionError::Decode(_))));

        let fresh = reduce(
            &SessionState::default(),
            Event::ImageUploaded(Upload::new(b"not an image".to_vec())),
        );
        assert!(matches!(
            fresh,
            Err(SessionError::Decode(DecodeError::UnsupportedFormat))
        ));
    }

    #[test]
    fn test_refresh_is_idempotent() {
        let shapes = vec![raw_rect(10.0, 50.0), raw_rect(5.0, 20.0)];
        let state = with_image();
        let state = apply(&state, Event::ShapesReported(shapes.clone()));
        let state = apply(&state, Event::SelectionNoteEdited { index: 0, text: "a".to_string() });

        let once = reduce(&state, Event::ShapesReported(shapes.clone())).unwrap();
        let twice = reduce(&once.state, Event::ShapesReported(shapes)).unwrap();
        assert_eq!(once.state, state);
        assert_eq!(twice.state, state);
        assert!(once.effects.is_empty() && twice.effects.is_empty());
        assert_eq!(
            once.state.project().annotations(),
            twice.state.project().annotations()
        );
    }

    #[test]
    fn test_unchanged_shape_report_has_no_effects() {
        let state = with_image();
        let shapes = vec![raw_rect(10.0, 50.0)];
        let first = reduce(&state, Event::ShapesReported(shapes.clone())).unwrap();
        assert_eq!(first.effects, vec![Effect::PersistDrawing]);

        let second = reduce(&first.state, Event::ShapesReported(shapes)).unwrap();
        assert!(second.effects.is_empty());
    }

    #[test]
    fn test_shape_reports_never_touch_seed() {
        let state = with_image();
        let state = apply(&state, Event::ShapesReported(vec![raw_rect(1.0, 2.0)]));
        assert!(state.seed().is_none());
        assert_eq!(state.project().shapes.len(), 1);
    }

    #[test]
    fn test_text_edits_keep_image_and_drawing() {
        let state = with_image();
        let state = apply(&state, Event::ShapesReported(vec![raw_rect(1.0, 2.0)]));
        let key = state.widget_key();

        let edited = apply(&state, Event::GeneralNoteEdited("typing".to_string()));
        let edited = apply(&edited, Event::SelectionNoteEdited { index: 0, text: "box".to_string() });
        assert_eq!(edited.widget_key(), key);
        assert_eq!(edited.project().shapes, state.project().shapes);
        assert_eq!(edited.project().image, state.project().image);
        assert_eq!(edited.project().annotations()[0].note, "box");
    }

    #[test]
    fn test_malformed_shapes_are_skipped() {
        let state = with_image();
        let broken = RawShape {
            kind: Some("rect".to_string()),
            ..Default::default()
        };
        let state = apply(&state, Event::ShapesReported(vec![broken, raw_rect(3.0, 4.0)]));
        assert_eq!(state.project().annotations().len(), 1);
    }

    #[test]
    fn test_shapes_without_image_are_ignored() {
        let transition = reduce(
            &SessionState::default(),
            Event::ShapesReported(vec![raw_rect(1.0, 1.0)]),
        )
        .unwrap();
        assert!(transition.state.project().shapes.is_empty());
        assert!(transition.effects.is_empty());
    }

    #[test]
    fn test_scenario_second_drawn_rectangle_is_note_one() {
        let state = with_image();
        let state = apply(
            &state,
            Event::ShapesReported(vec![raw_rect(10.0, 50.0), raw_rect(5.0, 20.0)]),
        );
        let annotations = state.project().annotations();
        assert_eq!(annotations.len(), 2);
        assert_eq!((annotations[0].rect.top, annotations[0].rect.left), (20.0, 5.0));
        assert_eq!((annotations[1].rect.top, annotations[1].rect.left), (50.0, 10.0));
    }

    #[test]
    fn test_reset_clears_everything() {
        let state = with_image();
        let state = apply(&state, Event::ShapesReported(vec![raw_rect(1.0, 1.0)]));
        let state = apply(&state, Event::GeneralNoteEdited("g".to_string()));
        let state = apply(&state, Event::SelectionNoteEdited { index: 0, text: "s".to_string() });
        let key = state.widget_key();

        let transition = reduce(&state, Event::Reset).unwrap();
        assert_eq!(transition.effects, vec![Effect::ClearSnapshot]);
        let project = transition.state.project();
        assert!(project.is_empty());
        assert!(project.image.is_none());
        assert!(project.shapes.is_empty());
        assert!(project.annotations().is_empty());
        assert!(transition.state.seed().is_none());
        assert_ne!(transition.state.widget_key(), key);
    }

    #[test]
    fn test_reupload_after_reset_gets_fresh_surface() {
        let bytes = png(20, 20);
        let state = apply(&SessionState::default(), Event::ImageUploaded(Upload::new(bytes.clone())));
        let key = state.widget_key();
        let state = apply(&state, Event::Reset);
        let state = apply(&state, Event::ImageUploaded(Upload::new(bytes)));
        assert_ne!(state.widget_key(), key);
    }

    #[test]
    fn test_restore_from_snapshot() {
        let snapshot = Snapshot {
            drawing: Some(vec![raw_rect(1.0, 1.0), RawShape::default()]),
            image: Some(png(30, 20)),
        };
        let state = SessionState::restore(snapshot);
        assert_eq!(state.project().shapes.len(), 1);
        assert_eq!(state.seed().map(|s| s.len()), Some(1));
        assert_eq!(state.project().image.as_ref().map(|i| i.width()), Some(30));
    }

    #[test]
    fn test_restore_without_usable_image_is_empty() {
        let state = SessionState::restore(Snapshot {
            drawing: Some(vec![raw_rect(1.0, 1.0)]),
            image: Some(b"corrupt".to_vec()),
        });
        assert_eq!(state, SessionState::default());
        assert_eq!(SessionState::restore(Snapshot::default()), SessionState::default());
    }
}
