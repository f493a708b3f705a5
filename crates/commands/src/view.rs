//! Tree-view node model: a pure projection of the forest into display nodes,
//! ordered by the active sort mode. Folder contents are resolved live through
//! the [`DirectoryLister`] and never persisted.
//! 樹狀檢視節點模型：依排序模式將森林投影為顯示節點；資料夾內容即時解析。

use rustfavorites_groups::{
    sorted_files, sorted_folders, sorted_groups, FileRefId, FolderRefId, Group, GroupId, SortOrder,
};
use tracing::warn;

use crate::interact::DirectoryLister;

/// One node in the favorites tree. Every variant carries enough identity to
/// route a command back to the store without re-walking the forest.
/// 樹中的單一節點；每種節點都帶有足以回溯至儲存器的識別資訊。
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TreeNode {
    /// A top-level group.
    Group {
        id: GroupId,
        label: String,
        description: Option<String>,
        item_count: usize,
        expanded: bool,
    },
    /// A nested group; rendered like a group but reordered within its parent.
    Subgroup {
        id: GroupId,
        parent_id: GroupId,
        label: String,
        item_count: usize,
        expanded: bool,
    },
    /// A pinned file reference.
    File {
        id: FileRefId,
        group_id: GroupId,
        label: String,
        relative_path: String,
        line_number: Option<u32>,
        can_move: bool,
    },
    /// A pinned folder reference; children come from the lister.
    Folder {
        id: FolderRefId,
        group_id: GroupId,
        label: String,
        relative_path: String,
        expanded: bool,
    },
    /// A file inside a pinned folder. Not movable: it is a live listing, not
    /// a stored reference.
    /// 釘選資料夾內的檔案；為即時列出的內容，不可搬移。
    FolderEntry {
        group_id: GroupId,
        label: String,
        relative_path: String,
        is_dir: bool,
    },
}

/// Root nodes: the top-level groups in presentation order.
/// 根節點：依呈現順序排列的頂層群組。
pub fn root_nodes(groups: &[Group], order: SortOrder) -> Vec<TreeNode> {
    sorted_groups(groups, order)
        .into_iter()
        .map(|group| TreeNode::Group {
            id: group.id.clone(),
            label: group.name.clone(),
            description: group.description.clone(),
            item_count: group.item_count(),
            expanded: group.is_expanded.unwrap_or(true),
        })
        .collect()
}

/// Children of a group node: subgroups first, then folders, then files, each
/// list sorted by the active mode.
/// 群組節點的子項：子群組、資料夾、檔案依序排列，各自依排序模式排序。
pub fn group_children(group: &Group, order: SortOrder) -> Vec<TreeNode> {
    let mut nodes = Vec::with_capacity(group.item_count());

    for subgroup in sorted_groups(&group.subgroups, order) {
        nodes.push(TreeNode::Subgroup {
            id: subgroup.id.clone(),
            parent_id: group.id.clone(),
            label: subgroup.name.clone(),
            item_count: subgroup.item_count(),
            expanded: subgroup.is_expanded.unwrap_or(true),
        });
    }
    for folder in sorted_folders(&group.folders, order) {
        nodes.push(TreeNode::Folder {
            id: folder.id.clone(),
            group_id: group.id.clone(),
            label: folder.display_name().to_string(),
            relative_path: folder.relative_path.clone(),
            expanded: folder.expanded.unwrap_or(true),
        });
    }
    for file in sorted_files(&group.files, order) {
        nodes.push(TreeNode::File {
            id: file.id.clone(),
            group_id: group.id.clone(),
            label: file.display_name().to_string(),
            relative_path: file.relative_path.clone(),
            line_number: file.line_number,
            can_move: true,
        });
    }
    nodes
}

/// Children of a folder node, resolved live. An unreadable folder collapses
/// to an empty list after a warning.
/// 資料夾節點的子項，即時解析；無法讀取時記錄警告並回傳空清單。
pub fn folder_children(
    group_id: &GroupId,
    relative_path: &str,
    lister: &dyn DirectoryLister,
) -> Vec<TreeNode> {
    let entries = match lister.list(relative_path) {
        Ok(entries) => entries,
        Err(err) => {
            warn!(folder = %relative_path, error = %err, "failed to list pinned folder");
            return Vec::new();
        }
    };
    entries
        .into_iter()
        .map(|entry| TreeNode::FolderEntry {
            group_id: group_id.clone(),
            label: entry.name,
            relative_path: entry.relative_path,
            is_dir: entry.is_dir,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::interact::DirEntry;
    use std::io;

    fn group_with_items() -> Group {
        let mut group = Group::new("Root", None, None);
        group.subgroups.push(Group::new(
            "Nested",
            None,
            Some(group.id.clone()),
        ));
        group
            .folders
            .push(rustfavorites_groups::FolderRef::new("src", None));
        group
            .files
            .push(rustfavorites_groups::FileRef::new("b.rs", None));
        group
            .files
            .push(rustfavorites_groups::FileRef::new("a.rs", None));
        group
    }

    #[test]
    fn children_are_grouped_subgroups_then_folders_then_files() {
        let group = group_with_items();
        let nodes = group_children(&group, SortOrder::Alphabetical);

        assert!(matches!(nodes[0], TreeNode::Subgroup { .. }));
        assert!(matches!(nodes[1], TreeNode::Folder { .. }));
        match (&nodes[2], &nodes[3]) {
            (TreeNode::File { label: first, .. }, TreeNode::File { label: second, .. }) => {
                assert_eq!(first, "a.rs");
                assert_eq!(second, "b.rs");
            }
            other => panic!("unexpected tail: {other:?}"),
        }
    }

    #[test]
    fn folder_entries_are_not_movable_and_survive_lister_errors() {
        struct Failing;
        impl DirectoryLister for Failing {
            fn list(&self, _: &str) -> io::Result<Vec<DirEntry>> {
                Err(io::Error::new(io::ErrorKind::PermissionDenied, "nope"))
            }
        }
        struct Fixed;
        impl DirectoryLister for Fixed {
            fn list(&self, _: &str) -> io::Result<Vec<DirEntry>> {
                Ok(vec![DirEntry {
                    name: "lib.rs".into(),
                    relative_path: "src/lib.rs".into(),
                    is_dir: false,
                }])
            }
        }

        let group = group_with_items();
        assert!(folder_children(&group.id, "src", &Failing).is_empty());

        let nodes = folder_children(&group.id, "src", &Fixed);
        assert_eq!(nodes.len(), 1);
        assert!(matches!(
            &nodes[0],
            TreeNode::FolderEntry { is_dir: false, .. }
        ));
    }

    #[test]
    fn root_nodes_follow_presentation_order() {
        let mut first = Group::new("Zebra", None, None);
        let second = Group::new("Apple", None, None);
        first.is_expanded = Some(false);

        let nodes = root_nodes(&[first, second], SortOrder::Alphabetical);
        match &nodes[0] {
            TreeNode::Group { label, .. } => assert_eq!(label, "Apple"),
            other => panic!("unexpected root: {other:?}"),
        }
        match &nodes[1] {
            TreeNode::Group { expanded, .. } => assert!(!expanded),
            other => panic!("unexpected root: {other:?}"),
        }
    }
}
