//! Prompt-then-mutate command pipelines. Each flow is a sequence of prompt
//! suspension points with cancellation at every step; the mutation itself is
//! a single synchronous call into the group store.
//! 先提示後變更的指令管線；每一步皆可取消，變更本身為單一同步呼叫。

use std::path::Path;

use rustfavorites_groups::{
    validate_group_name, FileRefId, Group, GroupId, GroupPatch, GroupStore, ImportPolicy,
    ImportReport, SortOrder,
};
use rustfavorites_settings::{Preferences, SharedPreferences};
use tracing::warn;

use crate::interact::{DirectoryLister, Interaction, Notifier, PickOption};

/// Direction for the move-up/move-down palette commands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MoveDirection {
    Up,
    Down,
}

/// Files a bulk-open would touch, capped at the configured limit.
/// 批次開啟將觸及的檔案，受設定上限限制。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OpenPlan {
    /// Paths to actually open, at most `limit` of them.
    pub paths: Vec<String>,
    /// How many files the group holds in total.
    pub requested: usize,
    pub limit: usize,
}

/// Creates a group (or subgroup under `parent_id`) after prompting for a name
/// and optional description. Dismissing either prompt aborts with no change.
/// 建立群組（或子群組）；名稱與描述提示任一被取消即中止。
pub fn create_group_flow(
    store: &mut GroupStore,
    ui: &mut dyn Interaction,
    notifier: &mut dyn Notifier,
    parent_id: Option<&GroupId>,
) -> Option<Group> {
    let name = ui.prompt_text("Enter group name", None, &name_rule_validator)?;
    let description = ui
        .prompt_text("Enter group description (optional)", None, &accept_any)
        .filter(|text| !text.is_empty());

    match store.create_group(&name, description, parent_id) {
        Ok(group) => {
            notifier.info(&format!("Group '{}' created", group.name));
            report_save_error(store, notifier);
            Some(group)
        }
        Err(err) => {
            notifier.error(&err.to_string());
            None
        }
    }
}

/// Renames a group. The validator enforces the naming rule and rejects a name
/// already used by another top-level group; the uniqueness check races an
/// interleaved create (accepted weak-consistency window).
/// 重新命名群組；唯一性檢查與並行建立之間存在已接受的弱一致視窗。
pub fn rename_group_flow(
    store: &mut GroupStore,
    ui: &mut dyn Interaction,
    notifier: &mut dyn Notifier,
    group_id: &GroupId,
) -> bool {
    let Some(group) = store.find_group(group_id) else {
        notifier.error("Group not found");
        return false;
    };
    let current_name = group.name.clone();
    let taken: Vec<String> = store
        .top_level()
        .iter()
        .filter(|g| g.id != *group_id)
        .map(|g| g.name.clone())
        .collect();

    let validator = move |value: &str| -> Option<String> {
        if let Some(message) = name_rule_validator(value) {
            return Some(message);
        }
        if taken.iter().any(|name| name == value) {
            return Some("A group with this name already exists".to_string());
        }
        None
    };

    let Some(new_name) = ui.prompt_text("Enter new group name", Some(&current_name), &validator)
    else {
        return false;
    };
    if new_name == current_name {
        return false;
    }

    let patch = GroupPatch {
        name: Some(new_name.clone()),
        ..GroupPatch::default()
    };
    if store.update_group(group_id, patch) {
        notifier.info(&format!("Group renamed to '{new_name}'"));
        report_save_error(store, notifier);
        true
    } else {
        notifier.error("Group not found");
        false
    }
}

/// Deletes a group, asking for confirmation first when the preferences
/// require it. The message calls out a populated subtree.
/// 刪除群組；依偏好設定先行確認，子樹非空時訊息會提醒。
pub fn delete_group_flow(
    store: &mut GroupStore,
    prefs: &Preferences,
    ui: &mut dyn Interaction,
    notifier: &mut dyn Notifier,
    group_id: &GroupId,
) -> bool {
    let Some(group) = store.find_group(group_id) else {
        notifier.error("Group not found");
        return false;
    };
    let name = group.name.clone();
    let has_subgroups = !group.subgroups.is_empty();

    if prefs.confirm_delete {
        let message = if has_subgroups {
            format!("Delete group '{name}' and all its subgroups?")
        } else {
            format!("Delete group '{name}'?")
        };
        if !ui.confirm(&message) {
            return false;
        }
    }

    if store.delete_group(group_id) {
        notifier.info(&format!("Group '{name}' deleted"));
        report_save_error(store, notifier);
        true
    } else {
        false
    }
}

/// Adds a file to a group chosen from a flattened picker. With no groups yet,
/// offers to create one first and adds the file to it.
/// 將檔案加入選定群組；尚無群組時先詢問是否建立。
pub fn add_file_flow(
    store: &mut GroupStore,
    ui: &mut dyn Interaction,
    notifier: &mut dyn Notifier,
    relative_path: &str,
) -> bool {
    if store.top_level().is_empty() {
        if !ui.confirm("No groups found. Would you like to create one?") {
            return false;
        }
        let Some(group) = create_group_flow(store, ui, notifier, None) else {
            return false;
        };
        let added = store.add_file_to_group(&group.id, relative_path, None);
        report_save_error(store, notifier);
        return added;
    }

    let Some(group_id) = pick_group(store, ui, "Select a group to add the file to") else {
        return false;
    };
    let group_name = group_name_of(store, &group_id);

    if store.add_file_to_group(&group_id, relative_path, None) {
        notifier.info(&format!("Added to group '{group_name}'"));
        report_save_error(store, notifier);
        true
    } else {
        notifier.info(&format!("File already exists in group '{group_name}'"));
        false
    }
}

/// Folder counterpart of [`add_file_flow`].
/// [`add_file_flow`] 的資料夾版本。
pub fn add_folder_flow(
    store: &mut GroupStore,
    ui: &mut dyn Interaction,
    notifier: &mut dyn Notifier,
    relative_path: &str,
) -> bool {
    if store.top_level().is_empty() {
        if !ui.confirm("No groups found. Would you like to create one?") {
            return false;
        }
        let Some(group) = create_group_flow(store, ui, notifier, None) else {
            return false;
        };
        let added = store.add_folder_to_group(&group.id, relative_path, None);
        report_save_error(store, notifier);
        return added;
    }

    let Some(group_id) = pick_group(store, ui, "Select a group to add the folder to") else {
        return false;
    };
    let group_name = group_name_of(store, &group_id);

    if store.add_folder_to_group(&group_id, relative_path, None) {
        notifier.info(&format!("Added folder to group '{group_name}'"));
        report_save_error(store, notifier);
        true
    } else {
        notifier.info(&format!("Folder already exists in group '{group_name}'"));
        false
    }
}

/// Removes a file reference, naming both the file and the group in the
/// notice.
/// 移除檔案參照，通知訊息同時點名檔案與群組。
pub fn remove_file_flow(
    store: &mut GroupStore,
    notifier: &mut dyn Notifier,
    group_id: &GroupId,
    file_id: &FileRefId,
) -> bool {
    let Some(group) = store.find_group(group_id) else {
        return false;
    };
    let group_name = group.name.clone();
    let file_name = group
        .files
        .iter()
        .find(|f| f.id == *file_id)
        .map(|f| f.display_name().to_string());
    let Some(file_name) = file_name else {
        return false;
    };

    if store.remove_file_from_group(group_id, file_id) {
        notifier.info(&format!("Removed '{file_name}' from '{group_name}'"));
        report_save_error(store, notifier);
        true
    } else {
        false
    }
}

/// Prompts for the 1-based line to jump to when the file opens.
/// 提示輸入開檔時跳至的行號（從 1 起算）。
pub fn edit_line_number_flow(
    store: &mut GroupStore,
    ui: &mut dyn Interaction,
    notifier: &mut dyn Notifier,
    group_id: &GroupId,
    file_id: &FileRefId,
) -> bool {
    let current = store
        .find_group(group_id)
        .and_then(|g| g.files.iter().find(|f| f.id == *file_id))
        .and_then(|f| f.line_number)
        .unwrap_or(1);

    let Some(input) = ui.prompt_text(
        "Enter line number to jump to when opening this file",
        Some(&current.to_string()),
        &line_number_validator,
    ) else {
        return false;
    };
    let Ok(line_number) = input.trim().parse::<u32>() else {
        return false;
    };

    if store.update_file_line_number(group_id, file_id, line_number) {
        notifier.info(&format!("Line number set to {line_number}"));
        report_save_error(store, notifier);
        true
    } else {
        false
    }
}

/// Parses import bytes and applies them under a user-picked policy. A
/// malformed document aborts with an error notice and no partial change.
/// 解析匯入內容並依使用者選擇的策略套用；格式不符時完整中止。
pub fn import_flow(
    store: &mut GroupStore,
    ui: &mut dyn Interaction,
    notifier: &mut dyn Notifier,
    bytes: &[u8],
) -> bool {
    let imported = match rustfavorites_groups::parse_import(bytes) {
        Ok(document) => document,
        Err(err) => {
            notifier.error(&format!("Import failed: {err}"));
            return false;
        }
    };

    let options = [
        PickOption::new("Replace existing groups"),
        PickOption::new("Merge with existing groups"),
    ];
    let policy = match ui.pick("How should the imported data be handled?", &options) {
        Some(0) => ImportPolicy::Replace,
        Some(1) => ImportPolicy::Merge,
        _ => return false,
    };

    match store.import(imported, policy) {
        ImportReport::Replaced { groups } => {
            notifier.info(&format!("Imported {groups} groups (existing groups replaced)"));
        }
        ImportReport::Merged { appended, skipped } => {
            notifier.info(&format!(
                "Merge complete: {appended} groups added, {skipped} skipped"
            ));
        }
    }
    report_save_error(store, notifier);
    true
}

/// Consumes an external "file deleted" event: relativizes the absolute path
/// against the project root and sweeps it from every top-level group.
/// 處理外部檔案刪除事件：相對化路徑後自所有頂層群組移除。
pub fn file_deleted(
    store: &mut GroupStore,
    notifier: &mut dyn Notifier,
    project_root: &Path,
    absolute_path: &Path,
) -> usize {
    let Ok(relative) = absolute_path.strip_prefix(project_root) else {
        return 0;
    };
    let relative = relative.to_string_lossy().replace('\\', "/");
    let removed = store.remove_file_everywhere(&relative);
    if removed > 0 {
        notifier.info(&format!(
            "Removed '{relative}' from {removed} group(s) after deletion"
        ));
        report_save_error(store, notifier);
    }
    removed
}

/// Moves a top-level group one slot up or down in stored order, switching
/// the persisted ordering mode to custom first so the move stays visible.
/// 將頂層群組上移或下移一格；必要時先切換為自訂排序以確保變動可見。
pub fn move_top_level_group(
    store: &mut GroupStore,
    prefs: &SharedPreferences,
    notifier: &mut dyn Notifier,
    group_id: &GroupId,
    direction: MoveDirection,
) -> bool {
    let Some(group) = store.find_group(group_id) else {
        return false;
    };
    if group.parent_id.is_some() {
        notifier.info("Only top-level groups can be reordered");
        return false;
    }
    let Some(index) = store.top_level().iter().position(|g| g.id == *group_id) else {
        return false;
    };

    let new_index = match direction {
        MoveDirection::Up => {
            if index == 0 {
                notifier.info("Group is already at the top");
                return false;
            }
            index - 1
        }
        MoveDirection::Down => {
            if index + 1 >= store.top_level().len() {
                notifier.info("Group is already at the bottom");
                return false;
            }
            index + 1
        }
    };

    if prefs.sort_order() != SortOrder::Custom {
        prefs.update(|p| p.sort_order = SortOrder::Custom);
        notifier.info("Sort order changed to \"custom\" to allow manual reordering");
    }

    let moved = store.reorder_top_level_groups(group_id, new_index);
    if moved {
        report_save_error(store, notifier);
    }
    moved
}

/// Plans a bulk open: the group's direct files, folder contents listed live
/// (non-recursive), and subgroup files gathered recursively, capped at the
/// configured limit.
/// 規劃批次開啟：直接檔案、即時列出的資料夾內容（不遞迴）與子群組檔案
/// （遞迴），受設定上限限制。
pub fn open_all_plan(
    store: &GroupStore,
    prefs: &Preferences,
    lister: &dyn DirectoryLister,
    group_id: &GroupId,
) -> Option<OpenPlan> {
    let group = store.find_group(group_id)?;
    let mut paths = Vec::new();
    collect_group_files(group, lister, &mut paths);

    let limit = prefs.open_all_files_limit as usize;
    let requested = paths.len();
    paths.truncate(limit);
    Some(OpenPlan {
        paths,
        requested,
        limit,
    })
}

fn collect_group_files(group: &Group, lister: &dyn DirectoryLister, out: &mut Vec<String>) {
    for file in &group.files {
        out.push(file.relative_path.clone());
    }
    for folder in &group.folders {
        match lister.list(&folder.relative_path) {
            Ok(entries) => {
                out.extend(
                    entries
                        .into_iter()
                        .filter(|entry| !entry.is_dir)
                        .map(|entry| entry.relative_path),
                );
            }
            Err(err) => {
                warn!(folder = %folder.relative_path, error = %err, "skipping unreadable folder");
            }
        }
    }
    for subgroup in &group.subgroups {
        collect_group_files(subgroup, lister, out);
    }
}

/// Group picker over the flattened forest, labels indented by nesting level.
/// 以攤平的森林呈現群組選單，標籤依層級縮排。
fn pick_group(store: &GroupStore, ui: &mut dyn Interaction, placeholder: &str) -> Option<GroupId> {
    let flat = store.flatten();
    let options: Vec<PickOption> = flat
        .iter()
        .map(|(group, level)| PickOption {
            label: format!("{}{}", "  ".repeat(*level), group.name),
            description: Some(format!(
                "{} items",
                group.files.len() + group.folders.len()
            )),
            detail: group.description.clone(),
        })
        .collect();

    let index = ui.pick(placeholder, &options)?;
    flat.get(index).map(|(group, _)| group.id.clone())
}

fn group_name_of(store: &GroupStore, group_id: &GroupId) -> String {
    store
        .find_group(group_id)
        .map(|g| g.name.clone())
        .unwrap_or_default()
}

fn name_rule_validator(value: &str) -> Option<String> {
    validate_group_name(value).err().map(|err| err.to_string())
}

fn accept_any(_: &str) -> Option<String> {
    None
}

fn line_number_validator(value: &str) -> Option<String> {
    match value.trim().parse::<u32>() {
        Ok(n) if n >= 1 => None,
        _ => Some("Please enter a valid line number (must be >= 1)".to_string()),
    }
}

fn report_save_error(store: &mut GroupStore, notifier: &mut dyn Notifier) {
    if let Some(err) = store.take_last_save_error() {
        notifier.error(&format!("Failed to save favorites: {err}"));
    }
}
