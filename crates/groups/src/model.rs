use serde::{Deserialize, Serialize};

use crate::id::{FileRefId, FolderRefId, GroupId};
use crate::util::now_millis;

/// Version tag written into fresh documents; carried through opaquely otherwise.
/// 新文件預設的版本標記；既有文件的版本原樣保留。
pub const DOCUMENT_VERSION: &str = "1.0.0";

/// A file reference kept inside a group. The relative path is the uniqueness
/// key within that group.
/// 群組內的檔案參照；相對路徑是群組內的唯一鍵。
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct FileRef {
    pub id: FileRefId,
    pub relative_path: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    pub added_at: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sort_index: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub line_number: Option<u32>,
}

impl FileRef {
    pub fn new(relative_path: impl Into<String>, label: Option<String>) -> Self {
        Self {
            id: FileRefId::new(),
            relative_path: relative_path.into(),
            label,
            added_at: now_millis(),
            sort_index: None,
            line_number: None,
        }
    }

    /// Display name shown for the file: the label override, or the final path
    /// segment.
    /// 顯示名稱：標籤覆寫或路徑的最後一段。
    pub fn display_name(&self) -> &str {
        match &self.label {
            Some(label) => label,
            None => final_segment(&self.relative_path),
        }
    }
}

/// A folder reference kept inside a group. Contents are never stored; they are
/// listed live from the filesystem by an external collaborator.
/// 群組內的資料夾參照；內容不儲存，由外部協作者即時列出。
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct FolderRef {
    pub id: FolderRefId,
    pub relative_path: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    pub added_at: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sort_index: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expanded: Option<bool>,
}

impl FolderRef {
    pub fn new(relative_path: impl Into<String>, label: Option<String>) -> Self {
        Self {
            id: FolderRefId::new(),
            relative_path: relative_path.into(),
            label,
            added_at: now_millis(),
            sort_index: None,
            expanded: Some(true),
        }
    }

    pub fn display_name(&self) -> &str {
        match &self.label {
            Some(label) => label,
            None => final_segment(&self.relative_path),
        }
    }
}

/// A named node of the forest, owning its file references, folder references
/// and subgroups. `parent_id` is a lookup key, never an ownership edge.
/// 森林中的具名節點，擁有檔案、資料夾參照與子群組；`parent_id` 僅作查詢鍵。
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Group {
    pub id: GroupId,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default)]
    pub files: Vec<FileRef>,
    #[serde(default)]
    pub folders: Vec<FolderRef>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub subgroups: Vec<Group>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent_id: Option<GroupId>,
    pub created_at: i64,
    pub updated_at: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sort_index: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_expanded: Option<bool>,
}

impl Group {
    /// Creates an empty group with both timestamps stamped to now.
    /// 建立空群組，兩個時間戳記皆設為現在。
    pub fn new(
        name: impl Into<String>,
        description: Option<String>,
        parent_id: Option<GroupId>,
    ) -> Self {
        let now = now_millis();
        Self {
            id: GroupId::new(),
            name: name.into(),
            description,
            files: Vec::new(),
            folders: Vec::new(),
            subgroups: Vec::new(),
            parent_id,
            created_at: now,
            updated_at: now,
            color: None,
            sort_index: None,
            is_expanded: Some(true),
        }
    }

    /// Number of direct children of every kind (files + folders + subgroups).
    /// 直接子項目總數（檔案＋資料夾＋子群組）。
    pub fn item_count(&self) -> usize {
        self.files.len() + self.folders.len() + self.subgroups.len()
    }

    pub fn touch(&mut self) {
        self.updated_at = now_millis();
    }
}

/// The exact shape persisted to disk and exchanged on import/export.
/// 持久化與匯入匯出時交換的完整文件形狀。
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ForestDocument {
    pub version: String,
    pub groups: Vec<Group>,
}

impl Default for ForestDocument {
    fn default() -> Self {
        Self {
            version: DOCUMENT_VERSION.to_string(),
            groups: Vec::new(),
        }
    }
}

/// Shallow patch applied to a group by `update_group`; absent fields keep
/// their current value.
/// `update_group` 套用的淺層補丁；未提供的欄位保持原值。
#[derive(Debug, Clone, Default)]
pub struct GroupPatch {
    pub name: Option<String>,
    pub description: Option<String>,
    pub color: Option<String>,
    pub sort_index: Option<usize>,
    pub is_expanded: Option<bool>,
}

/// Presentation ordering mode for sibling lists.
/// 兄弟清單的呈現排序模式。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum SortOrder {
    Alphabetical,
    Custom,
    Recent,
    DateCreated,
}

impl Default for SortOrder {
    fn default() -> Self {
        SortOrder::DateCreated
    }
}

/// Which persistence backend holds the forest document.
/// 森林文件所在的持久化後端。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StorageLocation {
    Project,
    Global,
}

impl Default for StorageLocation {
    fn default() -> Self {
        StorageLocation::Project
    }
}

/// Explicit discriminant for reorder/move dispatch.
/// 重新排序與搬移時使用的明確類型判別。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ItemKind {
    File,
    Folder,
    Subgroup,
}

fn final_segment(relative_path: &str) -> &str {
    relative_path
        .rsplit(['/', '\\'])
        .next()
        .unwrap_or(relative_path)
}
