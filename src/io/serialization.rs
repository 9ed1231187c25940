// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! Project snapshot persistence.
//!
//! A snapshot is the drawing (as a JSON document of surface objects) plus the
//! photo exactly as uploaded. Where it lives is decided by configuration: on
//! disk under `<dir>/<project>/`, or only in memory for the current session.
//! The session store depends on the [`SnapshotStore`] capability and never on
//! a particular backend.

use crate::config::Persistence;
use crate::error::StoreError;
use crate::models::shape::{RawShape, Shape};
use serde::{Deserialize, Serialize};
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

/// File holding the drawing document.
pub const DRAWING_FILE: &str = "canvas_state.json";

/// File holding the uploaded image bytes.
pub const IMAGE_FILE: &str = "project_image";

/// Serialized drawing: the surface's object list.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DrawingDocument {
    pub objects: Vec<RawShape>,
}

/// Export a drawing to its JSON document.
pub fn drawing_to_json(shapes: &[Shape]) -> Result<String, StoreError> {
    let document = DrawingDocument {
        objects: shapes.iter().map(Shape::to_raw).collect(),
    };
    Ok(serde_json::to_string_pretty(&document)?)
}

/// Import a drawing from its JSON document.
///
/// Entries are returned unvalidated; the session skips the unusable ones.
pub fn drawing_from_json(json: &str) -> Result<Vec<RawShape>, StoreError> {
    let document: DrawingDocument = serde_json::from_str(json)?;
    Ok(document.objects)
}

/// Content recovered from a snapshot.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Snapshot {
    pub drawing: Option<Vec<RawShape>>,
    pub image: Option<Vec<u8>>,
}

/// Storage for the project snapshot.
pub trait SnapshotStore {
    /// Read whatever the store holds. Missing parts are `None`.
    fn load(&self) -> Result<Snapshot, StoreError>;

    /// Replace the stored image bytes.
    fn save_image(&mut self, bytes: &[u8]) -> Result<(), StoreError>;

    /// Replace the stored drawing.
    fn save_drawing(&mut self, shapes: &[Shape]) -> Result<(), StoreError>;

    /// Remove image and drawing together. On error nothing was removed.
    fn clear(&mut self) -> Result<(), StoreError>;
}

/// Open the store selected by configuration.
pub fn open_store(persistence: &Persistence, project: &str) -> Box<dyn SnapshotStore> {
    match persistence {
        Persistence::Ephemeral => {
            log::info!("Snapshots kept in memory for this session only");
            Box::new(EphemeralStore::default())
        }
        Persistence::Disk { dir } => {
            let store = DiskStore::new(dir, project);
            log::info!("Snapshots stored in {}", store.root().display());
            Box::new(store)
        }
    }
}

/// Snapshot kept in memory; lost when the application exits.
#[derive(Debug, Default)]
pub struct EphemeralStore {
    snapshot: Snapshot,
}

impl SnapshotStore for EphemeralStore {
    fn load(&self) -> Result<Snapshot, StoreError> {
        Ok(self.snapshot.clone())
    }

    fn save_image(&mut self, bytes: &[u8]) -> Result<(), StoreError> {
        self.snapshot.image = Some(bytes.to_vec());
        Ok(())
    }

    fn save_drawing(&mut self, shapes: &[Shape]) -> Result<(), StoreError> {
        self.snapshot.drawing = Some(shapes.iter().map(Shape::to_raw).collect());
        Ok(())
    }

    fn clear(&mut self) -> Result<(), StoreError> {
        self.snapshot = Snapshot::default();
        Ok(())
    }
}

/// Snapshot stored in a per-project directory.
#[derive(Debug, Clone)]
pub struct DiskStore {
    root: PathBuf,
}

impl DiskStore {
    pub fn new(dir: impl AsRef<Path>, project: &str) -> Self {
        Self {
            root: dir.as_ref().join(project),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Write through a temporary file so a crash never leaves half a file.
    fn write_atomic(&self, name: &str, bytes: &[u8]) -> Result<(), StoreError> {
        fs::create_dir_all(&self.root).map_err(|e| StoreError::io(&self.root, e))?;
        let final_path = self.root.join(name);
        let tmp_path = self.root.join(format!("{name}.tmp"));

        fs::write(&tmp_path, bytes).map_err(|e| StoreError::io(&tmp_path, e))?;
        match fs::rename(&tmp_path, &final_path) {
            Ok(()) => Ok(()),
            Err(rename_err) if final_path.exists() => {
                fs::remove_file(&final_path).map_err(|e| StoreError::io(&final_path, e))?;
                fs::rename(&tmp_path, &final_path).map_err(|_| StoreError::io(&final_path, rename_err))
            }
            Err(rename_err) => Err(StoreError::io(&final_path, rename_err)),
        }
    }

    fn read_optional(path: &Path) -> Result<Option<Vec<u8>>, StoreError> {
        match fs::read(path) {
            Ok(bytes) => Ok(Some(bytes)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(StoreError::io(path, e)),
        }
    }
}

impl DiskStore {
    /// First free trash name next to the project directory. Leftovers from
    /// an earlier failed delete are skipped, not reused.
    fn trash_path(&self) -> PathBuf {
        let name = self
            .root
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        let pid = std::process::id();
        (0u32..)
            .map(|n| self.root.with_file_name(format!(".{name}.trash-{pid}-{n}")))
            .find(|candidate| !candidate.exists())
            .unwrap_or_else(|| self.root.with_file_name(format!(".{name}.trash-{pid}")))
    }
}

impl SnapshotStore for DiskStore {
    fn load(&self) -> Result<Snapshot, StoreError> {
        let drawing_path = self.root.join(DRAWING_FILE);
        let drawing = match Self::read_optional(&drawing_path)? {
            Some(bytes) => {
                match std::str::from_utf8(&bytes)
                    .map_err(|e| e.to_string())
                    .and_then(|json| drawing_from_json(json).map_err(|e| e.to_string()))
                {
                    Ok(objects) => Some(objects),
                    Err(e) => {
                        log::warn!("Ignoring unreadable drawing {}: {}", drawing_path.display(), e);
                        None
                    }
                }
            }
            None => None,
        };
        let image = Self::read_optional(&self.root.join(IMAGE_FILE))?;

        Ok(Snapshot { drawing, image })
    }

    fn save_image(&mut self, bytes: &[u8]) -> Result<(), StoreError> {
        self.write_atomic(IMAGE_FILE, bytes)
    }

    fn save_drawing(&mut self, shapes: &[Shape]) -> Result<(), StoreError> {
        let json = drawing_to_json(shapes)?;
        self.write_atomic(DRAWING_FILE, json.as_bytes())
    }

    fn clear(&mut self) -> Result<(), StoreError> {
        if !self.root.exists() {
            return Ok(());
        }

        // Renaming the directory away removes both files in one step.
        let trash = self.trash_path();
        fs::rename(&self.root, &trash).map_err(|e| StoreError::io(&self.root, e))?;

        if let Err(e) = fs::remove_dir_all(&trash) {
            log::warn!("Failed to delete {}: {}", trash.display(), e);
        }
        log::info!("Cleared snapshot {}", self.root.display());
        Ok(())
    }
}
