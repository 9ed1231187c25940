// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! Configuration file support.
//!
//! Settings are read from a YAML file (`photonote.yaml` by default). Every
//! field is optional; a missing file means all defaults.

use crate::error::ConfigError;
use crate::io::export::ExportService;
use serde::{Deserialize, Serialize};
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

/// Config file looked up in the working directory.
pub const DEFAULT_CONFIG_FILE: &str = "photonote.yaml";

/// Log level setting for the application.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Error,
    Warn,
    #[default]
    Info,
    Debug,
    Trace,
}

impl LogLevel {
    /// Convert to log crate's LevelFilter.
    pub fn to_level_filter(self) -> log::LevelFilter {
        match self {
            LogLevel::Error => log::LevelFilter::Error,
            LogLevel::Warn => log::LevelFilter::Warn,
            LogLevel::Info => log::LevelFilter::Info,
            LogLevel::Debug => log::LevelFilter::Debug,
            LogLevel::Trace => log::LevelFilter::Trace,
        }
    }
}

/// Where project snapshots are kept.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(tag = "mode", rename_all = "lowercase")]
pub enum Persistence {
    /// In memory, gone when the application exits
    #[default]
    Ephemeral,
    /// Under `<dir>/<project>/`, survives restarts
    Disk {
        #[serde(default = "default_snapshot_dir")]
        dir: PathBuf,
    },
}

fn default_snapshot_dir() -> PathBuf {
    PathBuf::from(".photonote")
}

/// Export section of the config.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExportConfig {
    /// JPEG quality, 1 to 100
    #[serde(default = "default_jpeg_quality")]
    pub jpeg_quality: u8,

    #[serde(default = "default_notes_file_name")]
    pub notes_file_name: String,

    #[serde(default = "default_image_file_name")]
    pub image_file_name: String,
}

fn default_jpeg_quality() -> u8 {
    90
}

fn default_notes_file_name() -> String {
    "project_notes.txt".to_string()
}

fn default_image_file_name() -> String {
    "annotated_image.jpg".to_string()
}

impl Default for ExportConfig {
    fn default() -> Self {
        Self {
            jpeg_quality: default_jpeg_quality(),
            notes_file_name: default_notes_file_name(),
            image_file_name: default_image_file_name(),
        }
    }
}

/// Application configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AppConfig {
    /// Snapshot key; one project per name
    #[serde(default = "default_project")]
    pub project: String,

    #[serde(default)]
    pub persistence: Persistence,

    #[serde(default)]
    pub export: ExportConfig,

    #[serde(default)]
    pub log_level: LogLevel,
}

fn default_project() -> String {
    "default".to_string()
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            project: default_project(),
            persistence: Persistence::default(),
            export: ExportConfig::default(),
            log_level: LogLevel::default(),
        }
    }
}

impl AppConfig {
    /// Parse and validate a YAML document.
    pub fn from_yaml(text: &str) -> Result<Self, ConfigError> {
        // An empty file deserializes as YAML null, not as an empty mapping.
        let config: AppConfig = if text.trim().is_empty() {
            AppConfig::default()
        } else {
            serde_yaml::from_str(text)?
        };
        config.validate()?;
        Ok(config)
    }

    /// Load the config file, falling back to defaults when it does not exist.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        match std::fs::read_to_string(path) {
            Ok(text) => Self::from_yaml(&text),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(Self::default()),
            Err(source) => Err(ConfigError::Io {
                path: path.to_path_buf(),
                source,
            }),
        }
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if !(1..=100).contains(&self.export.jpeg_quality) {
            return Err(ConfigError::Invalid {
                field: "export.jpeg_quality",
                message: format!("{} is not between 1 and 100", self.export.jpeg_quality),
            });
        }

        let project = self.project.trim();
        if project.is_empty()
            || project == "."
            || project == ".."
            || project.contains(['/', '\\'])
        {
            return Err(ConfigError::Invalid {
                field: "project",
                message: format!("'{}' cannot be used as a directory name", self.project),
            });
        }

        for (field, name) in [
            ("export.notes_file_name", &self.export.notes_file_name),
            ("export.image_file_name", &self.export.image_file_name),
        ] {
            if name.trim().is_empty() {
                return Err(ConfigError::Invalid {
                    field,
                    message: "file name is empty".to_string(),
                });
            }
        }
        Ok(())
    }

    pub fn export_service(&self) -> ExportService {
        ExportService {
            notes_file_name: self.export.notes_file_name.clone(),
            image_file_name: self.export.image_file_name.clone(),
            jpeg_quality: self.export.jpeg_quality,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_document_gives_defaults() {
        let config = AppConfig::from_yaml("").unwrap();
        assert_eq!(config, AppConfig::default());
        assert_eq!(config.persistence, Persistence::Ephemeral);
        assert_eq!(config.export.jpeg_quality, 90);
    }

    #[test]
    fn test_disk_persistence() {
        let config = AppConfig::from_yaml(
            "project: kitchen\npersistence:\n  mode: disk\n  dir: /tmp/notes\nlog_level: debug\n",
        )
        .unwrap();
        assert_eq!(config.project, "kitchen");
        assert_eq!(
            config.persistence,
            Persistence::Disk {
                dir: PathBuf::from("/tmp/notes")
            }
        );
        assert_eq!(config.log_level.to_level_filter(), log::LevelFilter::Debug);
    }

    #[test]
    fn test_disk_persistence_default_dir() {
        let config = AppConfig::from_yaml("persistence:\n  mode: disk\n").unwrap();
        assert_eq!(
            config.persistence,
            Persistence::Disk {
                dir: PathBuf::from(".photonote")
            }
        );
    }

    #[test]
    fn test_rejects_bad_quality() {
        let err = AppConfig::from_yaml("export:\n  jpeg_quality: 0\n").unwrap_err();
        assert!(matches!(
            err,
            ConfigError::Invalid {
                field: "export.jpeg_quality",
                ..
            }
        ));
    }

    #[test]
    fn test_rejects_path_like_project() {
        assert!(AppConfig::from_yaml("project: ../elsewhere\n").is_err());
        assert!(AppConfig::from_yaml("project: ''\n").is_err());
    }

    #[test]
    fn test_rejects_unknown_mode() {
        assert!(matches!(
            AppConfig::from_yaml("persistence:\n  mode: cloud\n"),
            Err(ConfigError::Yaml(_))
        ));
    }

    #[test]
    fn test_missing_file_gives_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = AppConfig::load(&dir.path().join("absent.yaml")).unwrap();
        assert_eq!(config, AppConfig::default());
    }

    #[test]
    fn test_export_service_from_config() {
        let config = AppConfig::from_yaml("export:\n  jpeg_quality: 75\n").unwrap();
        let service = config.export_service();
        assert_eq!(service.jpeg_quality, 75);
        assert_eq!(service.image_file_name, "annotated_image.jpg");
    }
}
