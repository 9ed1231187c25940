// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! Session store.
//!
//! Owns the current [`SessionState`] and the snapshot backend, and applies
//! events through [`reduce`]. Reset clears the snapshot before the in-memory
//! state, so a failed deletion leaves the whole project in place.

use super::state::{reduce, Effect, Event, SessionState, Transition};
use crate::error::SessionError;
use crate::io::serialization::SnapshotStore;
use crate::models::annotation::Annotation;
use crate::models::project::Project;
use crate::models::tool::Brush;
use crate::render::{DrawingSurface, RenderSpec, SurfaceOutput};

pub struct SessionStore {
    state: SessionState,
    snapshots: Box<dyn SnapshotStore>,
}

impl SessionStore {
    /// Open a session, restoring whatever the snapshot holds.
    pub fn open(snapshots: Box<dyn SnapshotStore>) -> Self {
        let state = match snapshots.load() {
            Ok(snapshot) => SessionState::restore(snapshot),
            Err(e) => {
                log::warn!("Starting without snapshot: {}", e);
                SessionState::default()
            }
        };
        Self { state, snapshots }
    }

    pub fn state(&self) -> &SessionState {
        &self.state
    }

    pub fn project(&self) -> &Project {
        self.state.project()
    }

    pub fn annotations(&self) -> Vec<Annotation> {
        self.state.project().annotations()
    }

    /// Apply one event. On error the session is unchanged.
    pub fn dispatch(&mut self, event: Event) -> Result<(), SessionError> {
        let Transition { state, effects } = reduce(&self.state, event)?;

        if effects.contains(&Effect::ClearSnapshot) {
            self.snapshots.clear()?;
        }
        self.state = state;

        for effect in effects {
            self.persist(effect);
        }
        Ok(())
    }

    /// Write-through of committed changes. The session keeps working when
    /// the backend fails, only the snapshot falls behind.
    fn persist(&mut self, effect: Effect) {
        let project = self.state.project();
        let result = match effect {
            Effect::PersistImage => match &project.image {
                Some(image) => self.snapshots.save_image(&image.bytes),
                None => Ok(()),
            },
            Effect::PersistDrawing => self.snapshots.save_drawing(&project.shapes),
            Effect::ClearSnapshot => Ok(()),
        };
        if let Err(e) = result {
            log::warn!("Failed to persist {:?}: {}", effect, e);
        }
    }

    /// Instructions for the drawing surface in the current state.
    pub fn render_spec(&self, brush: Brush) -> RenderSpec {
        RenderSpec {
            brush,
            background: self
                .state
                .project()
                .image
                .as_ref()
                .map(|image| image.bitmap.clone()),
            seed_drawing: self.state.seed().cloned(),
            widget_key: self.state.widget_key(),
        }
    }

    /// One refresh cycle: render the surface and commit the shapes it reports.
    pub fn refresh(
        &mut self,
        surface: &mut dyn DrawingSurface,
        brush: Brush,
    ) -> Result<SurfaceOutput, SessionError> {
        let spec = self.render_spec(brush);
        let output = surface.render(&spec);
        self.dispatch(Event::ShapesReported(output.shapes.clone()))?;
        Ok(output)
    }
}
