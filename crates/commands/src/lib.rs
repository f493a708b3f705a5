//! Command pipelines and the tree-view projection sitting between the group
//! store and a host surface (CLI, editor tree, palette).
//! 位於群組儲存器與宿主介面之間的指令管線與樹狀投影層。

pub mod flows;
pub mod interact;
pub mod view;

pub use flows::{
    add_file_flow, add_folder_flow, create_group_flow, delete_group_flow, edit_line_number_flow,
    file_deleted, import_flow, move_top_level_group, open_all_plan, remove_file_flow,
    rename_group_flow, MoveDirection, OpenPlan,
};
pub use interact::{DirEntry, DirectoryLister, Interaction, Notifier, PickOption, Validator};
pub use view::{folder_children, group_children, root_nodes, TreeNode};
