use thiserror::Error;
use tracing::error;

use crate::codec::{self, FormatError, ImportPolicy, ImportReport};
use crate::forest;
use crate::id::{FileRefId, FolderRefId, GroupId};
use crate::model::{FileRef, FolderRef, ForestDocument, Group, GroupPatch, ItemKind};
use crate::storage::{GroupStorage, StorageError, StorageSelector};

/// Longest accepted group name, in characters.
/// 群組名稱的字元數上限。
pub const MAX_GROUP_NAME_LEN: usize = 50;

/// Validation/resolution failures surfaced by the mutation engine. These are
/// reported to the user as notices and never propagate as panics.
/// 變更引擎的驗證與解析錯誤；以訊息呈現給使用者，不會拋出 panic。
#[derive(Debug, Error, PartialEq, Eq)]
pub enum GroupStoreError {
    #[error("invalid group name: {0}")]
    InvalidName(String),
    #[error("group {0} not found")]
    NotFound(String),
}

/// Checks the group naming rule: 1 to 50 characters drawn from letters,
/// digits, space, hyphen and underscore. Reused by UI input validators.
/// 檢查群組命名規則；UI 輸入驗證亦重複使用。
pub fn validate_group_name(name: &str) -> Result<(), GroupStoreError> {
    if name.is_empty() {
        return Err(GroupStoreError::InvalidName(
            "group name is required".to_string(),
        ));
    }
    if name.chars().count() > MAX_GROUP_NAME_LEN {
        return Err(GroupStoreError::InvalidName(format!(
            "group name must be at most {MAX_GROUP_NAME_LEN} characters"
        )));
    }
    if !name
        .chars()
        .all(|c| c.is_alphanumeric() || matches!(c, ' ' | '-' | '_'))
    {
        return Err(GroupStoreError::InvalidName(
            "group name can only contain letters, numbers, spaces, hyphens and underscores"
                .to_string(),
        ));
    }
    Ok(())
}

enum MovedItem {
    File(FileRef),
    Folder(FolderRef),
    Subgroup(Group),
}

/// The authoritative group store: owns the in-memory forest document and
/// applies every mutation synchronously, flushing the whole document to the
/// configured backend before the caller observes completion. A flush failure
/// is logged and remembered but never rolls the mutation back.
/// 群組儲存器：持有記憶體中的森林文件，所有變更同步執行並於返回前
/// 將整份文件寫入後端；寫入失敗會記錄但不回滾。
pub struct GroupStore {
    storage: GroupStorage,
    selector: Box<dyn StorageSelector>,
    document: ForestDocument,
    last_save_error: Option<StorageError>,
}

impl GroupStore {
    /// Opens the store, loading the document once from the currently selected
    /// backend.
    /// 開啟儲存器，從目前選定的後端載入一次文件。
    pub fn open(storage: GroupStorage, selector: Box<dyn StorageSelector>) -> Self {
        let document = storage.load(selector.storage_location());
        Self {
            storage,
            selector,
            document,
            last_save_error: None,
        }
    }

    pub fn document(&self) -> &ForestDocument {
        &self.document
    }

    /// Ordered top-level groups, in stored (not presentation) order.
    /// 依儲存順序回傳頂層群組。
    pub fn top_level(&self) -> &[Group] {
        &self.document.groups
    }

    pub fn find_group(&self, id: &GroupId) -> Option<&Group> {
        forest::find_group(&self.document.groups, id)
    }

    pub fn flatten(&self) -> Vec<(&Group, usize)> {
        forest::flatten(&self.document.groups)
    }

    pub fn is_file_in_any_group(&self, relative_path: &str) -> bool {
        forest::is_file_in_any_group(&self.document.groups, relative_path)
    }

    pub fn groups_containing_file(&self, relative_path: &str) -> Vec<&Group> {
        forest::groups_containing_file(&self.document.groups, relative_path)
    }

    /// Swaps the whole top-level list, e.g. after an import.
    /// 整批替換頂層清單（例如匯入之後）。
    pub fn replace_top_level(&mut self, groups: Vec<Group>) {
        self.document.groups = groups;
        self.flush();
    }

    /// The error of the most recent failed flush, if any; taking it clears
    /// it. The command layer turns this into a user-facing notice.
    /// 取出最近一次寫入失敗的錯誤（取出後清除），由指令層轉為通知。
    pub fn take_last_save_error(&mut self) -> Option<StorageError> {
        self.last_save_error.take()
    }

    /// Creates a group, top-level or under `parent_id`, stamping both
    /// timestamps to now. Returns a snapshot of the created group.
    /// 建立群組（頂層或掛在 `parent_id` 之下），回傳建立結果的快照。
    pub fn create_group(
        &mut self,
        name: &str,
        description: Option<String>,
        parent_id: Option<&GroupId>,
    ) -> Result<Group, GroupStoreError> {
        validate_group_name(name)?;

        let group = Group::new(name, description, parent_id.cloned());
        let created = group.clone();

        match parent_id {
            Some(parent_id) => {
                let parent = forest::find_group_mut(&mut self.document.groups, parent_id)
                    .ok_or_else(|| GroupStoreError::NotFound(parent_id.to_string()))?;
                parent.subgroups.push(group);
                parent.touch();
            }
            None => self.document.groups.push(group),
        }

        self.flush();
        Ok(created)
    }

    /// Shallow-merges the patch into the group found anywhere in the forest,
    /// always refreshing `updated_at`.
    /// 將補丁淺層合併進森林中任意位置的群組，並更新 `updated_at`。
    pub fn update_group(&mut self, id: &GroupId, patch: GroupPatch) -> bool {
        let Some(group) = forest::find_group_mut(&mut self.document.groups, id) else {
            return false;
        };
        if let Some(name) = patch.name {
            group.name = name;
        }
        if let Some(description) = patch.description {
            group.description = Some(description);
        }
        if let Some(color) = patch.color {
            group.color = Some(color);
        }
        if let Some(sort_index) = patch.sort_index {
            group.sort_index = Some(sort_index);
        }
        if let Some(is_expanded) = patch.is_expanded {
            group.is_expanded = Some(is_expanded);
        }
        group.touch();
        self.flush();
        true
    }

    /// Deletes the group and its entire subtree from wherever it lives.
    /// 刪除群組及其整個子樹。
    pub fn delete_group(&mut self, id: &GroupId) -> bool {
        if forest::remove_group(&mut self.document.groups, id).is_none() {
            return false;
        }
        self.flush();
        true
    }

    /// Appends a file reference; a duplicate relative path in the same group
    /// is rejected without touching anything.
    /// 附加檔案參照；同群組內路徑重複則拒絕。
    pub fn add_file_to_group(
        &mut self,
        group_id: &GroupId,
        relative_path: &str,
        label: Option<String>,
    ) -> bool {
        let Some(group) = forest::find_group_mut(&mut self.document.groups, group_id) else {
            return false;
        };
        if group.files.iter().any(|f| f.relative_path == relative_path) {
            return false;
        }
        group.files.push(FileRef::new(relative_path, label));
        group.touch();
        self.flush();
        true
    }

    pub fn remove_file_from_group(&mut self, group_id: &GroupId, file_id: &FileRefId) -> bool {
        let Some(group) = forest::find_group_mut(&mut self.document.groups, group_id) else {
            return false;
        };
        let Some(index) = group.files.iter().position(|f| f.id == *file_id) else {
            return false;
        };
        group.files.remove(index);
        group.touch();
        self.flush();
        true
    }

    /// Sweeps the path out of every top-level group's direct file list,
    /// returning how many references were removed. Subgroups are deliberately
    /// left untouched (baseline behavior, recorded as a known limitation).
    /// 從所有頂層群組的直接檔案清單移除該路徑；子群組刻意不處理。
    pub fn remove_file_everywhere(&mut self, relative_path: &str) -> usize {
        let mut removed = 0;
        for group in &mut self.document.groups {
            if let Some(index) = group
                .files
                .iter()
                .position(|f| f.relative_path == relative_path)
            {
                group.files.remove(index);
                group.touch();
                removed += 1;
            }
        }
        self.flush();
        removed
    }

    /// Appends a folder reference; duplicates by relative path are rejected
    /// independently of the file list.
    /// 附加資料夾參照；與檔案清單獨立地以相對路徑去重。
    pub fn add_folder_to_group(
        &mut self,
        group_id: &GroupId,
        relative_path: &str,
        label: Option<String>,
    ) -> bool {
        let Some(group) = forest::find_group_mut(&mut self.document.groups, group_id) else {
            return false;
        };
        if group
            .folders
            .iter()
            .any(|f| f.relative_path == relative_path)
        {
            return false;
        }
        group.folders.push(FolderRef::new(relative_path, label));
        group.touch();
        self.flush();
        true
    }

    pub fn remove_folder_from_group(
        &mut self,
        group_id: &GroupId,
        folder_id: &FolderRefId,
    ) -> bool {
        let Some(group) = forest::find_group_mut(&mut self.document.groups, group_id) else {
            return false;
        };
        let Some(index) = group.folders.iter().position(|f| f.id == *folder_id) else {
            return false;
        };
        group.folders.remove(index);
        group.touch();
        self.flush();
        true
    }

    /// Records the 1-based line to jump to when the file is opened.
    /// 記錄開啟檔案時要跳至的行號（從 1 起算）。
    pub fn update_file_line_number(
        &mut self,
        group_id: &GroupId,
        file_id: &FileRefId,
        line_number: u32,
    ) -> bool {
        let Some(group) = forest::find_group_mut(&mut self.document.groups, group_id) else {
            return false;
        };
        let Some(file) = group.files.iter_mut().find(|f| f.id == *file_id) else {
            return false;
        };
        file.line_number = Some(line_number);
        group.touch();
        self.flush();
        true
    }

    /// Persists a folder's expand/collapse UI state.
    /// 持久化資料夾的展開／收合狀態。
    pub fn set_folder_expanded(
        &mut self,
        group_id: &GroupId,
        folder_id: &FolderRefId,
        expanded: bool,
    ) -> bool {
        let Some(group) = forest::find_group_mut(&mut self.document.groups, group_id) else {
            return false;
        };
        let Some(folder) = group.folders.iter_mut().find(|f| f.id == *folder_id) else {
            return false;
        };
        folder.expanded = Some(expanded);
        group.touch();
        self.flush();
        true
    }

    /// Moves an item to `new_index` within its sibling list of the given
    /// kind, then rewrites every sibling's sort index to its position.
    /// Returns false when the item is missing or the index is unchanged or
    /// out of range.
    /// 在同類兄弟清單內搬移項目並重寫所有 sort index；
    /// 項目不存在、索引未變或越界時回傳 false。
    pub fn reorder_items(
        &mut self,
        group_id: &GroupId,
        item_id: &str,
        new_index: usize,
        kind: ItemKind,
    ) -> bool {
        let Some(group) = forest::find_group_mut(&mut self.document.groups, group_id) else {
            return false;
        };
        let moved = match kind {
            ItemKind::File => reorder_in(&mut group.files, item_id, new_index),
            ItemKind::Folder => reorder_in(&mut group.folders, item_id, new_index),
            ItemKind::Subgroup => reorder_in(&mut group.subgroups, item_id, new_index),
        };
        if !moved {
            return false;
        }
        group.touch();
        self.flush();
        true
    }

    /// Same algorithm applied to the top-level group array.
    /// 相同演算法套用於頂層群組陣列。
    pub fn reorder_top_level_groups(&mut self, group_id: &GroupId, new_index: usize) -> bool {
        if !reorder_in(&mut self.document.groups, group_id.as_str(), new_index) {
            return false;
        }
        self.flush();
        true
    }

    /// Moves an item from one group's sibling list to the end of another's.
    /// Subgroup moves also rewrite the moved group's `parent_id` and are
    /// rejected when the target sits inside the moved subtree, keeping the
    /// forest acyclic.
    /// 將項目自來源群組移到目標群組清單尾端；子群組搬移會改寫 `parent_id`，
    /// 且目標位於被搬移子樹內時拒絕，維持森林無環。
    pub fn move_between_groups(
        &mut self,
        source_id: &GroupId,
        target_id: &GroupId,
        item_id: &str,
        kind: ItemKind,
    ) -> bool {
        if source_id == target_id {
            return false;
        }
        if forest::find_group(&self.document.groups, target_id).is_none() {
            return false;
        }
        {
            let Some(source) = forest::find_group(&self.document.groups, source_id) else {
                return false;
            };
            if let ItemKind::Subgroup = kind {
                let Some(moved) = source
                    .subgroups
                    .iter()
                    .find(|g| g.id.as_str() == item_id)
                else {
                    return false;
                };
                if forest::subtree_contains(moved, target_id) {
                    return false;
                }
            }
        }

        let Some(source) = forest::find_group_mut(&mut self.document.groups, source_id) else {
            return false;
        };
        let item = match kind {
            ItemKind::File => {
                let Some(index) = source.files.iter().position(|f| f.id.as_str() == item_id)
                else {
                    return false;
                };
                MovedItem::File(source.files.remove(index))
            }
            ItemKind::Folder => {
                let Some(index) = source
                    .folders
                    .iter()
                    .position(|f| f.id.as_str() == item_id)
                else {
                    return false;
                };
                MovedItem::Folder(source.folders.remove(index))
            }
            ItemKind::Subgroup => {
                let Some(index) = source
                    .subgroups
                    .iter()
                    .position(|g| g.id.as_str() == item_id)
                else {
                    return false;
                };
                MovedItem::Subgroup(source.subgroups.remove(index))
            }
        };
        source.touch();

        // Target resolution cannot fail here: it exists and, for subgroup
        // moves, provably lives outside the removed subtree.
        match forest::find_group_mut(&mut self.document.groups, target_id) {
            Some(target) => {
                match item {
                    MovedItem::File(file) => target.files.push(file),
                    MovedItem::Folder(folder) => target.folders.push(folder),
                    MovedItem::Subgroup(mut subgroup) => {
                        subgroup.parent_id = Some(target_id.clone());
                        target.subgroups.push(subgroup);
                    }
                }
                target.touch();
            }
            None => return false,
        }

        self.flush();
        true
    }

    /// Applies a structurally valid imported document under the chosen
    /// policy, then flushes.
    /// 依選定策略套用匯入文件並寫入後端。
    pub fn import(&mut self, imported: ForestDocument, policy: ImportPolicy) -> ImportReport {
        let report = match policy {
            ImportPolicy::Replace => {
                let groups = imported.groups.len();
                self.document = imported;
                ImportReport::Replaced { groups }
            }
            ImportPolicy::Merge => codec::merge_documents(&mut self.document, imported),
        };
        self.flush();
        report
    }

    /// Parses and applies import bytes in one step; a malformed payload
    /// leaves the store untouched.
    /// 一次完成解析與套用；格式不符時儲存內容不變。
    pub fn import_bytes(
        &mut self,
        bytes: &[u8],
        policy: ImportPolicy,
    ) -> Result<ImportReport, FormatError> {
        let imported = codec::parse_import(bytes)?;
        Ok(self.import(imported, policy))
    }

    pub fn export(&self) -> Result<Vec<u8>, FormatError> {
        codec::export(&self.document)
    }

    fn flush(&mut self) {
        let location = self.selector.storage_location();
        if let Err(err) = self.storage.save(location, &self.document) {
            error!(error = %err, "failed to persist favorites; in-memory state is kept");
            self.last_save_error = Some(err);
        }
    }
}

trait SiblingItem {
    fn key(&self) -> &str;
    fn assign_sort_index(&mut self, index: usize);
}

impl SiblingItem for FileRef {
    fn key(&self) -> &str {
        self.id.as_str()
    }
    fn assign_sort_index(&mut self, index: usize) {
        self.sort_index = Some(index);
    }
}

impl SiblingItem for FolderRef {
    fn key(&self) -> &str {
        self.id.as_str()
    }
    fn assign_sort_index(&mut self, index: usize) {
        self.sort_index = Some(index);
    }
}

impl SiblingItem for Group {
    fn key(&self) -> &str {
        self.id.as_str()
    }
    fn assign_sort_index(&mut self, index: usize) {
        self.sort_index = Some(index);
    }
}

// `new_index == len` is accepted as "end"; anything further out is invalid.
fn reorder_in<T: SiblingItem>(items: &mut Vec<T>, item_id: &str, new_index: usize) -> bool {
    let Some(old_index) = items.iter().position(|item| item.key() == item_id) else {
        return false;
    };
    if old_index == new_index || new_index > items.len() {
        return false;
    }
    let item = items.remove(old_index);
    let insert_at = new_index.min(items.len());
    items.insert(insert_at, item);
    for (index, item) in items.iter_mut().enumerate() {
        item.assign_sort_index(index);
    }
    true
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::StorageLocation;
    use tempfile::{tempdir, TempDir};

    fn open_store() -> (TempDir, GroupStore) {
        let dir = tempdir().unwrap();
        let storage = GroupStorage::new(dir.path(), dir.path().join("global"));
        let store = GroupStore::open(storage, Box::new(StorageLocation::Project));
        (dir, store)
    }

    #[test]
    fn created_group_is_empty_and_resolvable() {
        let (_dir, mut store) = open_store();
        let created = store.create_group("Sales", None, None).unwrap();

        let found = store.find_group(&created.id).unwrap();
        assert!(found.files.is_empty());
        assert!(found.folders.is_empty());
        assert_eq!(found.created_at, found.updated_at);
    }

    #[test]
    fn create_rejects_bad_names() {
        let (_dir, mut store) = open_store();
        assert!(matches!(
            store.create_group("", None, None),
            Err(GroupStoreError::InvalidName(_))
        ));
        assert!(matches!(
            store.create_group("bad/name", None, None),
            Err(GroupStoreError::InvalidName(_))
        ));
        let long = "x".repeat(51);
        assert!(matches!(
            store.create_group(&long, None, None),
            Err(GroupStoreError::InvalidName(_))
        ));
        assert!(store.create_group("ok name_1-2", None, None).is_ok());
    }

    #[test]
    fn create_subgroup_requires_existing_parent() {
        let (_dir, mut store) = open_store();
        let missing = GroupId::from_string("missing");
        assert!(matches!(
            store.create_group("Child", None, Some(&missing)),
            Err(GroupStoreError::NotFound(_))
        ));

        let parent = store.create_group("Parent", None, None).unwrap();
        let child = store
            .create_group("Child", None, Some(&parent.id))
            .unwrap();
        assert_eq!(child.parent_id, Some(parent.id.clone()));
        assert_eq!(store.find_group(&parent.id).unwrap().subgroups.len(), 1);
    }

    #[test]
    fn update_group_reaches_nested_subgroups() {
        let (_dir, mut store) = open_store();
        let parent = store.create_group("Parent", None, None).unwrap();
        let child = store
            .create_group("Child", None, Some(&parent.id))
            .unwrap();

        let patch = GroupPatch {
            name: Some("Renamed".into()),
            ..GroupPatch::default()
        };
        assert!(store.update_group(&child.id, patch));
        assert_eq!(store.find_group(&child.id).unwrap().name, "Renamed");
        assert!(!store.update_group(&GroupId::from_string("nope"), GroupPatch::default()));
    }

    #[test]
    fn duplicate_file_path_is_rejected() {
        let (_dir, mut store) = open_store();
        let group = store.create_group("A", None, None).unwrap();
        assert!(store.add_file_to_group(&group.id, "src/x.ts", None));
        assert!(!store.add_file_to_group(&group.id, "src/x.ts", None));
        assert_eq!(store.find_group(&group.id).unwrap().files.len(), 1);
    }

    #[test]
    fn folder_paths_dedup_independently_of_files() {
        let (_dir, mut store) = open_store();
        let group = store.create_group("A", None, None).unwrap();
        assert!(store.add_file_to_group(&group.id, "src", None));
        assert!(store.add_folder_to_group(&group.id, "src", None));
        assert!(!store.add_folder_to_group(&group.id, "src", None));
    }

    #[test]
    fn reorder_rewrites_dense_sort_indices() {
        let (_dir, mut store) = open_store();
        let group = store.create_group("A", None, None).unwrap();
        store.add_file_to_group(&group.id, "x.ts", None);
        store.add_file_to_group(&group.id, "y.ts", None);

        let y_id = store.find_group(&group.id).unwrap().files[1].id.clone();
        assert!(store.reorder_items(&group.id, y_id.as_str(), 0, ItemKind::File));

        let files = &store.find_group(&group.id).unwrap().files;
        let paths: Vec<&str> = files.iter().map(|f| f.relative_path.as_str()).collect();
        assert_eq!(paths, vec!["y.ts", "x.ts"]);
        let indices: Vec<Option<usize>> = files.iter().map(|f| f.sort_index).collect();
        assert_eq!(indices, vec![Some(0), Some(1)]);
    }

    #[test]
    fn reorder_rejects_noop_and_out_of_range() {
        let (_dir, mut store) = open_store();
        let group = store.create_group("A", None, None).unwrap();
        store.add_file_to_group(&group.id, "x.ts", None);
        store.add_file_to_group(&group.id, "y.ts", None);
        let x_id = store.find_group(&group.id).unwrap().files[0].id.clone();

        assert!(!store.reorder_items(&group.id, x_id.as_str(), 0, ItemKind::File));
        assert!(!store.reorder_items(&group.id, x_id.as_str(), 3, ItemKind::File));
        assert!(!store.reorder_items(&group.id, "unknown", 1, ItemKind::File));
        // new_index == len is accepted as "move to end".
        assert!(store.reorder_items(&group.id, x_id.as_str(), 2, ItemKind::File));
        let files = &store.find_group(&group.id).unwrap().files;
        assert_eq!(files[1].id, x_id);
    }

    #[test]
    fn reorder_preserves_relative_order_of_untouched_items() {
        let (_dir, mut store) = open_store();
        let group = store.create_group("A", None, None).unwrap();
        for path in ["a.ts", "b.ts", "c.ts", "d.ts"] {
            store.add_file_to_group(&group.id, path, None);
        }
        let d_id = store.find_group(&group.id).unwrap().files[3].id.clone();
        assert!(store.reorder_items(&group.id, d_id.as_str(), 1, ItemKind::File));

        let paths: Vec<&str> = store
            .find_group(&group.id)
            .unwrap()
            .files
            .iter()
            .map(|f| f.relative_path.as_str())
            .collect();
        assert_eq!(paths, vec!["a.ts", "d.ts", "b.ts", "c.ts"]);
    }

    #[test]
    fn top_level_reorder_uses_the_same_algorithm() {
        let (_dir, mut store) = open_store();
        let a = store.create_group("A", None, None).unwrap();
        let _b = store.create_group("B", None, None).unwrap();
        let _c = store.create_group("C", None, None).unwrap();

        assert!(store.reorder_top_level_groups(&a.id, 2));
        let names: Vec<&str> = store.top_level().iter().map(|g| g.name.as_str()).collect();
        assert_eq!(names, vec!["B", "C", "A"]);
        let indices: Vec<Option<usize>> =
            store.top_level().iter().map(|g| g.sort_index).collect();
        assert_eq!(indices, vec![Some(0), Some(1), Some(2)]);
    }

    #[test]
    fn move_file_conserves_total_count() {
        let (_dir, mut store) = open_store();
        let a = store.create_group("A", None, None).unwrap();
        let b = store.create_group("B", None, None).unwrap();
        store.add_file_to_group(&a.id, "z.ts", None);
        let file_id = store.find_group(&a.id).unwrap().files[0].id.clone();

        assert!(store.move_between_groups(&a.id, &b.id, file_id.as_str(), ItemKind::File));
        assert_eq!(store.find_group(&a.id).unwrap().files.len(), 0);
        let b_files = &store.find_group(&b.id).unwrap().files;
        assert_eq!(b_files.len(), 1);
        assert_eq!(b_files[0].relative_path, "z.ts");
    }

    #[test]
    fn move_subgroup_rewrites_parent_id() {
        let (_dir, mut store) = open_store();
        let a = store.create_group("A", None, None).unwrap();
        let b = store.create_group("B", None, None).unwrap();
        let sub = store.create_group("Sub", None, Some(&a.id)).unwrap();

        assert!(store.move_between_groups(&a.id, &b.id, sub.id.as_str(), ItemKind::Subgroup));
        let moved = store.find_group(&sub.id).unwrap();
        assert_eq!(moved.parent_id, Some(b.id.clone()));
        assert!(store.find_group(&a.id).unwrap().subgroups.is_empty());
    }

    #[test]
    fn move_into_own_descendant_is_rejected() {
        let (_dir, mut store) = open_store();
        let root = store.create_group("Root", None, None).unwrap();
        let mid = store.create_group("Mid", None, Some(&root.id)).unwrap();
        let leaf = store.create_group("Leaf", None, Some(&mid.id)).unwrap();

        // Moving Mid (which contains Leaf) under Leaf would create a cycle.
        assert!(!store.move_between_groups(&root.id, &leaf.id, mid.id.as_str(), ItemKind::Subgroup));
        assert_eq!(store.find_group(&root.id).unwrap().subgroups.len(), 1);
    }

    #[test]
    fn move_rejects_same_group_and_unknown_groups() {
        let (_dir, mut store) = open_store();
        let a = store.create_group("A", None, None).unwrap();
        store.add_file_to_group(&a.id, "x.ts", None);
        let file_id = store.find_group(&a.id).unwrap().files[0].id.clone();
        let missing = GroupId::from_string("missing");

        assert!(!store.move_between_groups(&a.id, &a.id, file_id.as_str(), ItemKind::File));
        assert!(!store.move_between_groups(&a.id, &missing, file_id.as_str(), ItemKind::File));
        assert!(!store.move_between_groups(&missing, &a.id, file_id.as_str(), ItemKind::File));
    }

    #[test]
    fn delete_group_takes_the_subtree_with_it() {
        let (_dir, mut store) = open_store();
        let a = store.create_group("A", None, None).unwrap();
        let a1 = store.create_group("A1", None, Some(&a.id)).unwrap();

        assert!(store.delete_group(&a.id));
        assert!(store.find_group(&a.id).is_none());
        assert!(store.find_group(&a1.id).is_none());
        assert!(!store.delete_group(&a.id));
    }

    #[test]
    fn remove_file_everywhere_skips_subgroups() {
        let (_dir, mut store) = open_store();
        let a = store.create_group("A", None, None).unwrap();
        let b = store.create_group("B", None, None).unwrap();
        let sub = store.create_group("Sub", None, Some(&a.id)).unwrap();
        store.add_file_to_group(&a.id, "gone.ts", None);
        store.add_file_to_group(&b.id, "gone.ts", None);
        store.add_file_to_group(&sub.id, "gone.ts", None);

        assert_eq!(store.remove_file_everywhere("gone.ts"), 2);
        assert!(store.find_group(&a.id).unwrap().files.is_empty());
        assert!(store.find_group(&b.id).unwrap().files.is_empty());
        // Baseline sweep does not recurse into subgroups.
        assert_eq!(store.find_group(&sub.id).unwrap().files.len(), 1);
    }

    #[test]
    fn folder_removal_and_expansion_state() {
        let (_dir, mut store) = open_store();
        let a = store.create_group("A", None, None).unwrap();
        store.add_folder_to_group(&a.id, "src", None);
        let folder_id = store.find_group(&a.id).unwrap().folders[0].id.clone();

        let before = store.find_group(&a.id).unwrap().updated_at;
        std::thread::sleep(std::time::Duration::from_millis(5));
        assert!(store.set_folder_expanded(&a.id, &folder_id, false));
        let group = store.find_group(&a.id).unwrap();
        assert_eq!(group.folders[0].expanded, Some(false));
        // Toggling a direct child refreshes the owning group's timestamp.
        assert!(group.updated_at > before);

        assert!(store.remove_folder_from_group(&a.id, &folder_id));
        assert!(store.find_group(&a.id).unwrap().folders.is_empty());
        assert!(!store.remove_folder_from_group(&a.id, &folder_id));
    }

    #[test]
    fn line_number_updates_round_trip() {
        let (_dir, mut store) = open_store();
        let a = store.create_group("A", None, None).unwrap();
        store.add_file_to_group(&a.id, "x.ts", None);
        let file_id = store.find_group(&a.id).unwrap().files[0].id.clone();

        assert!(store.update_file_line_number(&a.id, &file_id, 42));
        assert_eq!(
            store.find_group(&a.id).unwrap().files[0].line_number,
            Some(42)
        );
    }

    #[test]
    fn mutations_flush_to_the_backend() {
        let (dir, mut store) = open_store();
        store.create_group("Persisted", None, None).unwrap();

        let storage = GroupStorage::new(dir.path(), dir.path().join("global"));
        let reopened = GroupStore::open(storage, Box::new(StorageLocation::Project));
        assert_eq!(reopened.top_level().len(), 1);
        assert_eq!(reopened.top_level()[0].name, "Persisted");
    }

    #[test]
    fn export_then_replace_import_is_idempotent() {
        let (_dir, mut store) = open_store();
        let a = store.create_group("A", None, None).unwrap();
        store.add_file_to_group(&a.id, "x.ts", None);
        store.create_group("Sub", None, Some(&a.id)).unwrap();

        let before = store.document().clone();
        let bytes = store.export().unwrap();
        let report = store.import_bytes(&bytes, ImportPolicy::Replace).unwrap();
        assert_eq!(report, ImportReport::Replaced { groups: 1 });
        assert_eq!(store.document(), &before);
    }

    #[test]
    fn malformed_import_leaves_the_store_unchanged() {
        let (_dir, mut store) = open_store();
        store.create_group("Keep", None, None).unwrap();
        let before = store.document().clone();

        let err = store.import_bytes(b"{\"groups\": []}", ImportPolicy::Replace);
        assert!(err.is_err());
        assert_eq!(store.document(), &before);
    }

    #[test]
    fn merge_import_skips_colliding_names() {
        let (_dir, mut store) = open_store();
        store.create_group("Shared", None, None).unwrap();

        let mut incoming = ForestDocument::default();
        incoming.groups.push(Group::new("Shared", None, None));
        incoming.groups.push(Group::new("Fresh", None, None));

        let report = store.import(incoming, ImportPolicy::Merge);
        assert_eq!(
            report,
            ImportReport::Merged {
                appended: 1,
                skipped: 1
            }
        );
        let names: Vec<&str> = store.top_level().iter().map(|g| g.name.as_str()).collect();
        assert_eq!(names, vec!["Shared", "Fresh"]);
    }
}
