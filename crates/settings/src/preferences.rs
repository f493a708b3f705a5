use std::cell::RefCell;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::rc::Rc;

use rustfavorites_groups::{SortOrder, StorageLocation, StorageSelector};
use serde::{Deserialize, Serialize};
use thiserror::Error;

const PREFERENCES_VERSION: u32 = 1;

/// Default file name, stored next to the favorites document.
pub const PREFERENCES_FILE: &str = "preferences.json";

#[derive(Debug, Error)]
pub enum PreferencesError {
    #[error("failed to read preferences {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("failed to parse preferences {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("failed to serialize preferences {path}: {source}")]
    Serialize {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("failed to write preferences {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("failed to prepare directory {path}: {source}")]
    CreateDir {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Preferences {
    #[serde(default = "default_version")]
    pub version: u32,
    #[serde(default)]
    pub storage_location: StorageLocation,
    #[serde(default)]
    pub sort_order: SortOrder,
    #[serde(default = "default_open_limit")]
    pub open_all_files_limit: u32,
    #[serde(default = "default_true")]
    pub confirm_delete: bool,
    #[serde(default = "default_true")]
    pub enable_drag_and_drop: bool,
    #[serde(default = "default_true")]
    pub show_file_icons: bool,
}

fn default_version() -> u32 {
    PREFERENCES_VERSION
}

fn default_open_limit() -> u32 {
    10
}

fn default_true() -> bool {
    true
}

impl Default for Preferences {
    fn default() -> Self {
        Self {
            version: PREFERENCES_VERSION,
            storage_location: StorageLocation::default(),
            sort_order: SortOrder::default(),
            open_all_files_limit: default_open_limit(),
            confirm_delete: true,
            enable_drag_and_drop: true,
            show_file_icons: true,
        }
    }
}

impl Preferences {
    pub fn sanitize(&mut self) {
        if self.version == 0 {
            self.version = PREFERENCES_VERSION;
        }
        if self.open_all_files_limit == 0 {
            self.open_all_files_limit = default_open_limit();
        }
        self.open_all_files_limit = self.open_all_files_limit.clamp(1, 200);
    }
}

#[derive(Debug)]
pub struct PreferencesStore {
    path: PathBuf,
    data: Preferences,
}

impl PreferencesStore {
    pub fn new(path: impl Into<PathBuf>, preferences: Preferences) -> Self {
        Self {
            path: path.into(),
            data: preferences,
        }
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, PreferencesError> {
        let path = path.as_ref().to_path_buf();
        if !path.exists() {
            let mut data = Preferences::default();
            data.sanitize();
            return Ok(Self { path, data });
        }

        let contents = fs::read_to_string(&path).map_err(|source| PreferencesError::Read {
            path: path.clone(),
            source,
        })?;
        let mut data: Preferences =
            serde_json::from_str(&contents).map_err(|source| PreferencesError::Parse {
                path: path.clone(),
                source,
            })?;
        data.sanitize();
        Ok(Self { path, data })
    }

    pub fn preferences(&self) -> &Preferences {
        &self.data
    }

    pub fn update<F>(&mut self, mut op: F) -> Result<(), PreferencesError>
    where
        F: FnMut(&mut Preferences),
    {
        op(&mut self.data);
        self.data.sanitize();
        self.save()
    }

    pub fn overwrite(&mut self, preferences: Preferences) -> Result<(), PreferencesError> {
        self.data = preferences;
        self.data.sanitize();
        self.save()
    }

    pub fn save(&self) -> Result<(), PreferencesError> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent).map_err(|source| PreferencesError::CreateDir {
                path: parent.to_path_buf(),
                source,
            })?;
        }
        let payload = serde_json::to_string_pretty(&self.data).map_err(|source| {
            PreferencesError::Serialize {
                path: self.path.clone(),
                source,
            }
        })?;

        let tmp_path = self.path.with_extension("tmp");
        fs::write(&tmp_path, payload.as_bytes()).map_err(|source| PreferencesError::Write {
            path: tmp_path.clone(),
            source,
        })?;
        fs::rename(&tmp_path, &self.path).map_err(|source| PreferencesError::Write {
            path: self.path.clone(),
            source,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

/// Shared handle over the live preferences, consulted by the core at call
/// time so a backend or ordering change applies to the very next operation.
/// 偏好設定的共享握把；核心於每次呼叫時查詢，設定變更即刻生效。
#[derive(Debug, Clone, Default)]
pub struct SharedPreferences(Rc<RefCell<Preferences>>);

impl SharedPreferences {
    pub fn new(preferences: Preferences) -> Self {
        Self(Rc::new(RefCell::new(preferences)))
    }

    pub fn get(&self) -> Preferences {
        self.0.borrow().clone()
    }

    pub fn sort_order(&self) -> SortOrder {
        self.0.borrow().sort_order
    }

    pub fn replace(&self, preferences: Preferences) {
        *self.0.borrow_mut() = preferences;
    }

    pub fn update<F>(&self, op: F)
    where
        F: FnOnce(&mut Preferences),
    {
        let mut prefs = self.0.borrow_mut();
        op(&mut prefs);
        prefs.sanitize();
    }
}

impl StorageSelector for SharedPreferences {
    fn storage_location(&self) -> StorageLocation {
        self.0.borrow().storage_location
    }
}
