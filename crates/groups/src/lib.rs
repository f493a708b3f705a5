//! Hierarchical favorites-group store for RustFavorites: the in-memory forest
//! of groups, its mutation engine, dual persistence backends and the portable
//! import/export codec.
//! RustFavorites 的階層式最愛群組儲存核心：記憶體中的群組森林、變更引擎、
//! 雙持久化後端與可攜式匯入匯出編解碼。

mod util;

pub mod codec;
pub mod forest;
pub mod id;
pub mod model;
pub mod order;
pub mod storage;
pub mod store;

pub use codec::{export, merge_documents, parse_import, FormatError, ImportPolicy, ImportReport};
pub use id::{FileRefId, FolderRefId, GroupId};
pub use model::{
    FileRef, FolderRef, ForestDocument, Group, GroupPatch, ItemKind, SortOrder, StorageLocation,
    DOCUMENT_VERSION,
};
pub use order::{sorted_files, sorted_folders, sorted_groups};
pub use storage::{GroupStorage, StorageError, StorageSelector, PROJECT_STATE_DIR};
pub use store::{validate_group_name, GroupStore, GroupStoreError, MAX_GROUP_NAME_LEN};
pub use util::now_millis;
