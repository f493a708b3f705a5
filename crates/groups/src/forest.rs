//! Read-side queries over the group forest. Everything here is shape-only;
//! business validation lives in the mutation engine.
//! 群組森林的唯讀查詢；僅處理結構，業務驗證由變更引擎負責。

use crate::id::GroupId;
use crate::model::Group;

/// Finds a group anywhere in the forest, depth-first: the given list first,
/// then each group's subgroups recursively. This is the identity-resolution
/// primitive every mutation relies on.
/// 以深度優先方式在整個森林中尋找群組；所有變更操作都依賴此原語。
pub fn find_group<'a>(groups: &'a [Group], id: &GroupId) -> Option<&'a Group> {
    for group in groups {
        if group.id == *id {
            return Some(group);
        }
        if let Some(found) = find_group(&group.subgroups, id) {
            return Some(found);
        }
    }
    None
}

/// Mutable counterpart of [`find_group`].
/// [`find_group`] 的可變版本。
pub fn find_group_mut<'a>(groups: &'a mut [Group], id: &GroupId) -> Option<&'a mut Group> {
    for group in groups {
        if group.id == *id {
            return Some(group);
        }
        if let Some(found) = find_group_mut(&mut group.subgroups, id) {
            return Some(found);
        }
    }
    None
}

/// Detaches a group (and its entire subtree) from wherever it lives, returning
/// the removed subtree.
/// 從森林任意位置拆下群組（含整個子樹）並回傳。
pub fn remove_group(groups: &mut Vec<Group>, id: &GroupId) -> Option<Group> {
    if let Some(index) = groups.iter().position(|group| group.id == *id) {
        return Some(groups.remove(index));
    }
    for group in groups {
        if let Some(removed) = remove_group(&mut group.subgroups, id) {
            group.touch();
            return Some(removed);
        }
    }
    None
}

/// Whether `id` names this group or any group inside its subtree. Used to
/// reject moves that would place a group under its own descendant.
/// 判斷 `id` 是否位於該群組的子樹內（含自身）；用於拒絕環狀搬移。
pub fn subtree_contains(group: &Group, id: &GroupId) -> bool {
    if group.id == *id {
        return true;
    }
    group
        .subgroups
        .iter()
        .any(|subgroup| subtree_contains(subgroup, id))
}

/// Flattens the forest into (group, nesting level) pairs in depth-first
/// order, for pickers and flat listings.
/// 將森林攤平為（群組、層級）序列，供選單與平面列表使用。
pub fn flatten(groups: &[Group]) -> Vec<(&Group, usize)> {
    let mut result = Vec::new();
    flatten_into(groups, 0, &mut result);
    result
}

fn flatten_into<'a>(groups: &'a [Group], level: usize, out: &mut Vec<(&'a Group, usize)>) {
    for group in groups {
        out.push((group, level));
        flatten_into(&group.subgroups, level + 1, out);
    }
}

/// Whether any top-level group's direct file list contains the path.
/// 是否有任一頂層群組的直接檔案清單包含此路徑。
pub fn is_file_in_any_group(groups: &[Group], relative_path: &str) -> bool {
    groups
        .iter()
        .any(|group| group.files.iter().any(|f| f.relative_path == relative_path))
}

/// Top-level groups whose direct file list contains the path.
/// 直接檔案清單包含此路徑的頂層群組。
pub fn groups_containing_file<'a>(groups: &'a [Group], relative_path: &str) -> Vec<&'a Group> {
    groups
        .iter()
        .filter(|group| group.files.iter().any(|f| f.relative_path == relative_path))
        .collect()
}
