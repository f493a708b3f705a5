use std::collections::BTreeMap;
use std::fs;
use std::io;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use thiserror::Error;
use tracing::warn;

use crate::model::{ForestDocument, StorageLocation};
use crate::util::write_atomic;

/// Directory holding project-scoped tooling state, created on demand.
/// 專案層級工具狀態目錄，需要時建立。
pub const PROJECT_STATE_DIR: &str = ".rustfavorites";
/// Well-known document file inside [`PROJECT_STATE_DIR`].
const PROJECT_FILE: &str = "favorites.json";
/// File backing the global key/value state store.
const GLOBAL_STATE_FILE: &str = "global-state.json";
/// Fixed key the forest document occupies in the global store.
const GLOBAL_KEY: &str = "favorites.data";

/// Supplies the storage backend at call time, so a mid-session configuration
/// change takes effect on the very next load/save.
/// 於呼叫當下決定儲存後端，設定變更即刻生效。
pub trait StorageSelector {
    fn storage_location(&self) -> StorageLocation;
}

impl StorageSelector for StorageLocation {
    fn storage_location(&self) -> StorageLocation {
        *self
    }
}

/// Errors raised while persisting the forest document.
/// 持久化森林文件時可能發生的錯誤。
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("favorites storage IO error: {0}")]
    Io(#[from] io::Error),
    #[error("invalid favorites payload: {0}")]
    Invalid(String),
}

/// Loads and saves the whole forest document through one of two
/// interchangeable backends: a pretty-printed JSON file in the project's
/// tooling directory, or a fixed key in a global key/value state file.
/// 透過兩種可互換後端載入與儲存整份森林文件：
/// 專案工具目錄中的 JSON 檔，或全域 key/value 狀態檔中的固定鍵。
#[derive(Debug)]
pub struct GroupStorage {
    project_root: PathBuf,
    global_dir: PathBuf,
}

impl GroupStorage {
    pub fn new(project_root: impl AsRef<Path>, global_dir: impl AsRef<Path>) -> Self {
        Self {
            project_root: project_root.as_ref().to_path_buf(),
            global_dir: global_dir.as_ref().to_path_buf(),
        }
    }

    /// Path of the project-scoped document file.
    /// 專案層級文件檔案的路徑。
    pub fn project_file(&self) -> PathBuf {
        self.project_root.join(PROJECT_STATE_DIR).join(PROJECT_FILE)
    }

    /// Path of the global key/value state file.
    /// 全域狀態檔案的路徑。
    pub fn global_state_file(&self) -> PathBuf {
        self.global_dir.join(GLOBAL_STATE_FILE)
    }

    /// Loads the document from the selected backend. A missing backend yields
    /// the empty default document; a malformed payload is logged and also
    /// falls back to the default, never an error.
    /// 從選定後端載入文件；檔案缺失或格式損毀都回退為空白預設文件。
    pub fn load(&self, location: StorageLocation) -> ForestDocument {
        match location {
            StorageLocation::Project => self.load_project(),
            StorageLocation::Global => self.load_global(),
        }
    }

    /// Overwrites the selected backend with the whole document.
    /// 以整份文件覆寫選定後端。
    pub fn save(&self, location: StorageLocation, document: &ForestDocument) -> Result<(), StorageError> {
        match location {
            StorageLocation::Project => self.save_project(document),
            StorageLocation::Global => self.save_global(document),
        }
    }

    fn load_project(&self) -> ForestDocument {
        let path = self.project_file();
        match fs::read_to_string(&path) {
            Ok(contents) => match serde_json::from_str(&contents) {
                Ok(document) => document,
                Err(err) => {
                    warn!(path = %path.display(), error = %err, "favorites file is malformed, starting empty");
                    ForestDocument::default()
                }
            },
            Err(err) if err.kind() == ErrorKind::NotFound => ForestDocument::default(),
            Err(err) => {
                warn!(path = %path.display(), error = %err, "favorites file is unreadable, starting empty");
                ForestDocument::default()
            }
        }
    }

    fn save_project(&self, document: &ForestDocument) -> Result<(), StorageError> {
        let payload = serde_json::to_vec_pretty(document)
            .map_err(|err| StorageError::Invalid(err.to_string()))?;
        write_atomic(&self.project_file(), &payload)?;
        Ok(())
    }

    fn load_global(&self) -> ForestDocument {
        let state = self.read_global_state();
        match state.get(GLOBAL_KEY) {
            Some(value) => match serde_json::from_value(value.clone()) {
                Ok(document) => document,
                Err(err) => {
                    warn!(key = GLOBAL_KEY, error = %err, "global favorites entry is malformed, starting empty");
                    ForestDocument::default()
                }
            },
            None => ForestDocument::default(),
        }
    }

    fn save_global(&self, document: &ForestDocument) -> Result<(), StorageError> {
        let mut state = self.read_global_state();
        let value = serde_json::to_value(document)
            .map_err(|err| StorageError::Invalid(err.to_string()))?;
        state.insert(GLOBAL_KEY.to_string(), value);
        let payload = serde_json::to_vec_pretty(&state)
            .map_err(|err| StorageError::Invalid(err.to_string()))?;
        write_atomic(&self.global_state_file(), &payload)?;
        Ok(())
    }

    // Other tools may park their own keys in the state file, so a corrupt
    // payload is reported before being rebuilt.
    fn read_global_state(&self) -> BTreeMap<String, serde_json::Value> {
        let path = self.global_state_file();
        match fs::read_to_string(&path) {
            Ok(contents) => match serde_json::from_str(&contents) {
                Ok(state) => state,
                Err(err) => {
                    warn!(path = %path.display(), error = %err, "global state file is malformed, rebuilding");
                    BTreeMap::new()
                }
            },
            Err(err) if err.kind() == ErrorKind::NotFound => BTreeMap::new(),
            Err(err) => {
                warn!(path = %path.display(), error = %err, "global state file is unreadable, rebuilding");
                BTreeMap::new()
            }
        }
    }
}
