use std::env;
use std::fs;
use std::io::{self, Write};
use std::path::PathBuf;

use anyhow::{anyhow, bail, Context, Result};
use clap::{Args, Parser, Subcommand, ValueEnum};
use rustfavorites_groups::{
    sorted_files, sorted_folders, sorted_groups, validate_group_name, FileRefId, FolderRefId,
    Group, GroupId, GroupPatch, GroupStorage, GroupStore, ImportPolicy, ImportReport, ItemKind,
    SortOrder, StorageLocation, PROJECT_STATE_DIR,
};
use rustfavorites_settings::{Preferences, PreferencesStore, PREFERENCES_FILE};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(
    name = "rustfavorites-cli",
    about = "Utility commands for RustFavorites group stores",
    author,
    version
)]
struct Cli {
    /// 指定專案根目錄；預設為目前目錄。 / Project root (defaults to the current directory).
    #[arg(long, global = true, value_name = "PATH")]
    project: Option<PathBuf>,

    /// 全域儲存目錄；預設為家目錄下的 .rustfavorites。 / Global storage directory (defaults to .rustfavorites under the home directory).
    #[arg(long, global = true, value_name = "PATH")]
    global_dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// 管理最愛群組（建立/改名/刪除/列出）。 / Manage favorite groups (create/rename/delete/list).
    #[command(subcommand)]
    Group(GroupCommand),
    /// 管理群組內的檔案參照。 / Manage file references within a group.
    #[command(subcommand)]
    File(FileCommand),
    /// 管理群組內的資料夾參照。 / Manage folder references within a group.
    #[command(subcommand)]
    Folder(FolderCommand),
    /// 調整項目在同類清單內的位置。 / Reorder an item within its sibling list.
    Reorder(ReorderArgs),
    /// 調整頂層群組的位置。 / Reorder a top-level group.
    ReorderGroup(ReorderGroupArgs),
    /// 在群組之間搬移項目。 / Move an item between groups.
    Move(MoveArgs),
    /// 匯出最愛文件為 JSON。 / Export the favorites document as JSON.
    Export(ExportArgs),
    /// 自 JSON 匯入最愛文件。 / Import a favorites document from JSON.
    Import(ImportArgs),
    /// 讀取或更新偏好設定。 / Read or update preferences.
    #[command(subcommand)]
    Config(ConfigCommand),
}

#[derive(Subcommand)]
enum GroupCommand {
    /// 建立群組，可選擇掛在父群組下。 / Create a group, optionally under a parent.
    Create {
        name: String,
        /// 群組描述。 / Group description.
        #[arg(long)]
        description: Option<String>,
        /// 父群組（ID 或唯一名稱）。 / Parent group (id or unique name).
        #[arg(long)]
        parent: Option<String>,
    },
    /// 重新命名群組。 / Rename a group.
    Rename { group: String, name: String },
    /// 刪除群組及其子樹。 / Delete a group and its subtree.
    Delete { group: String },
    /// 以樹狀列出所有群組與其內容。 / List all groups and their contents as a tree.
    List {
        /// 覆寫偏好設定中的排序模式。 / Override the configured sort order.
        #[arg(long)]
        order: Option<OrderChoice>,
    },
}

#[derive(Subcommand)]
enum FileCommand {
    /// 將檔案加入群組。 / Add a file to a group.
    Add {
        group: String,
        path: String,
        /// 顯示用別名。 / Display label.
        #[arg(long)]
        label: Option<String>,
        /// 開啟時跳至的行號（從 1 起算）。 / Line to jump to when opening (1-based).
        #[arg(long, value_parser = clap::value_parser!(u32).range(1..))]
        line: Option<u32>,
    },
    /// 自群組移除檔案參照。 / Remove a file reference from a group.
    Remove { group: String, file: String },
    /// 自所有頂層群組移除該路徑。 / Remove the path from every top-level group.
    Sweep { path: String },
}

#[derive(Subcommand)]
enum FolderCommand {
    /// 將資料夾加入群組。 / Add a folder to a group.
    Add {
        group: String,
        path: String,
        /// 顯示用別名。 / Display label.
        #[arg(long)]
        label: Option<String>,
    },
    /// 自群組移除資料夾參照。 / Remove a folder reference from a group.
    Remove { group: String, folder: String },
}

#[derive(Args)]
struct ReorderArgs {
    group: String,
    item: String,
    index: usize,
    /// 項目種類。 / Kind of the item.
    #[arg(long, value_enum)]
    kind: KindChoice,
}

#[derive(Args)]
struct ReorderGroupArgs {
    group: String,
    index: usize,
}

#[derive(Args)]
struct MoveArgs {
    source: String,
    target: String,
    item: String,
    /// 項目種類。 / Kind of the item.
    #[arg(long, value_enum)]
    kind: KindChoice,
}

#[derive(Args)]
struct ExportArgs {
    /// 輸出檔案；省略時寫到標準輸出。 / Output file; stdout when omitted.
    #[arg(long)]
    output: Option<PathBuf>,
}

#[derive(Args)]
struct ImportArgs {
    input: PathBuf,
    /// 匯入策略。 / Import policy.
    #[arg(long, value_enum, default_value_t = PolicyChoice::Merge)]
    policy: PolicyChoice,
}

#[derive(Subcommand)]
enum ConfigCommand {
    /// 印出目前偏好設定。 / Print the current preferences.
    Get,
    /// 更新單一偏好設定。 / Update a single preference.
    Set { key: String, value: String },
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum KindChoice {
    File,
    Folder,
    Subgroup,
}

impl From<KindChoice> for ItemKind {
    fn from(choice: KindChoice) -> Self {
        match choice {
            KindChoice::File => ItemKind::File,
            KindChoice::Folder => ItemKind::Folder,
            KindChoice::Subgroup => ItemKind::Subgroup,
        }
    }
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum OrderChoice {
    Alphabetical,
    Custom,
    Recent,
    #[value(name = "date-created", alias = "datecreated")]
    DateCreated,
}

impl From<OrderChoice> for SortOrder {
    fn from(choice: OrderChoice) -> Self {
        match choice {
            OrderChoice::Alphabetical => SortOrder::Alphabetical,
            OrderChoice::Custom => SortOrder::Custom,
            OrderChoice::Recent => SortOrder::Recent,
            OrderChoice::DateCreated => SortOrder::DateCreated,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
enum PolicyChoice {
    Replace,
    Merge,
}

impl From<PolicyChoice> for ImportPolicy {
    fn from(choice: PolicyChoice) -> Self {
        match choice {
            PolicyChoice::Replace => ImportPolicy::Replace,
            PolicyChoice::Merge => ImportPolicy::Merge,
        }
    }
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(io::stderr)
        .init();

    let cli = Cli::parse();

    let project_root = match &cli.project {
        Some(path) => path.clone(),
        None => env::current_dir().context("failed to resolve the current directory")?,
    };
    let global_dir = match &cli.global_dir {
        Some(path) => path.clone(),
        None => {
            let home = env::var_os("HOME")
                .map(PathBuf::from)
                .ok_or_else(|| anyhow!("HOME is not set; pass --global-dir explicitly"))?;
            home.join(PROJECT_STATE_DIR)
        }
    };

    let mut prefs_store = PreferencesStore::load(global_dir.join(PREFERENCES_FILE))
        .context("failed to load preferences")?;

    if let Commands::Config(command) = &cli.command {
        return run_config(command, &mut prefs_store);
    }

    let storage = GroupStorage::new(&project_root, &global_dir);
    let location = prefs_store.preferences().storage_location;
    let mut store = GroupStore::open(storage, Box::new(location));

    match cli.command {
        Commands::Group(command) => run_group(command, &mut store, prefs_store.preferences())?,
        Commands::File(command) => run_file(command, &mut store)?,
        Commands::Folder(command) => run_folder(command, &mut store)?,
        Commands::Reorder(args) => {
            let group = resolve_group(&store, &args.group)?;
            if !store.reorder_items(&group, &args.item, args.index, args.kind.into()) {
                bail!("reorder refused: item not found or index out of range");
            }
            println!("reordered");
        }
        Commands::ReorderGroup(args) => {
            let group = resolve_group(&store, &args.group)?;
            if !store.reorder_top_level_groups(&group, args.index) {
                bail!("reorder refused: group not found or index out of range");
            }
            println!("reordered");
        }
        Commands::Move(args) => {
            let source = resolve_group(&store, &args.source)?;
            let target = resolve_group(&store, &args.target)?;
            if !store.move_between_groups(&source, &target, &args.item, args.kind.into()) {
                bail!("move refused: item not found or target inside the moved subtree");
            }
            println!("moved");
        }
        Commands::Export(args) => {
            let bytes = store.export().context("failed to serialize favorites")?;
            match args.output {
                Some(path) => {
                    fs::write(&path, &bytes)
                        .with_context(|| format!("failed to write {}", path.display()))?;
                    println!("exported to {}", path.display());
                }
                None => io::stdout().write_all(&bytes)?,
            }
        }
        Commands::Import(args) => {
            let bytes = fs::read(&args.input)
                .with_context(|| format!("failed to read {}", args.input.display()))?;
            let report = store
                .import_bytes(&bytes, args.policy.into())
                .context("import rejected")?;
            match report {
                ImportReport::Replaced { groups } => {
                    println!("imported {groups} groups (existing groups replaced)");
                }
                ImportReport::Merged { appended, skipped } => {
                    println!("merged: {appended} groups added, {skipped} skipped");
                }
            }
        }
        Commands::Config(_) => unreachable!("handled above"),
    }

    if let Some(err) = store.take_last_save_error() {
        bail!("favorites were updated in memory but could not be saved: {err}");
    }
    Ok(())
}

fn run_group(command: GroupCommand, store: &mut GroupStore, prefs: &Preferences) -> Result<()> {
    match command {
        GroupCommand::Create {
            name,
            description,
            parent,
        } => {
            validate_group_name(&name).map_err(|err| anyhow!(err.to_string()))?;
            let parent_id = parent
                .as_deref()
                .map(|ident| resolve_group(store, ident))
                .transpose()?;
            let group = store
                .create_group(&name, description, parent_id.as_ref())
                .map_err(|err| anyhow!(err.to_string()))?;
            println!("created group '{}' ({})", group.name, group.id);
        }
        GroupCommand::Rename { group, name } => {
            let id = resolve_group(store, &group)?;
            validate_group_name(&name).map_err(|err| anyhow!(err.to_string()))?;
            let patch = GroupPatch {
                name: Some(name.clone()),
                ..GroupPatch::default()
            };
            if !store.update_group(&id, patch) {
                bail!("group not found: {group}");
            }
            println!("renamed to '{name}'");
        }
        GroupCommand::Delete { group } => {
            let id = resolve_group(store, &group)?;
            if !store.delete_group(&id) {
                bail!("group not found: {group}");
            }
            println!("deleted");
        }
        GroupCommand::List { order } => {
            let order = order.map(SortOrder::from).unwrap_or(prefs.sort_order);
            for group in sorted_groups(store.top_level(), order) {
                print_group(group, order, 0);
            }
        }
    }
    Ok(())
}

fn run_file(command: FileCommand, store: &mut GroupStore) -> Result<()> {
    match command {
        FileCommand::Add {
            group,
            path,
            label,
            line,
        } => {
            let id = resolve_group(store, &group)?;
            if !store.add_file_to_group(&id, &path, label) {
                bail!("'{path}' is already in that group");
            }
            if let Some(line) = line {
                let file_id = find_file_by_path(store, &id, &path)?;
                store.update_file_line_number(&id, &file_id, line);
            }
            println!("added '{path}'");
        }
        FileCommand::Remove { group, file } => {
            let id = resolve_group(store, &group)?;
            let file_id = resolve_file(store, &id, &file)?;
            if !store.remove_file_from_group(&id, &file_id) {
                bail!("file not found: {file}");
            }
            println!("removed");
        }
        FileCommand::Sweep { path } => {
            let removed = store.remove_file_everywhere(&path);
            println!("removed '{path}' from {removed} group(s)");
        }
    }
    Ok(())
}

fn run_folder(command: FolderCommand, store: &mut GroupStore) -> Result<()> {
    match command {
        FolderCommand::Add { group, path, label } => {
            let id = resolve_group(store, &group)?;
            if !store.add_folder_to_group(&id, &path, label) {
                bail!("'{path}' is already in that group");
            }
            println!("added folder '{path}'");
        }
        FolderCommand::Remove { group, folder } => {
            let id = resolve_group(store, &group)?;
            let folder_id = resolve_folder(store, &id, &folder)?;
            if !store.remove_folder_from_group(&id, &folder_id) {
                bail!("folder not found: {folder}");
            }
            println!("removed");
        }
    }
    Ok(())
}

fn run_config(command: &ConfigCommand, prefs_store: &mut PreferencesStore) -> Result<()> {
    match command {
        ConfigCommand::Get => {
            let rendered = serde_json::to_string_pretty(prefs_store.preferences())
                .context("failed to render preferences")?;
            println!("{rendered}");
        }
        ConfigCommand::Set { key, value } => {
            apply_config(prefs_store, key, value)?;
            println!("updated {key}");
        }
    }
    Ok(())
}

fn apply_config(prefs_store: &mut PreferencesStore, key: &str, value: &str) -> Result<()> {
    let result = match key {
        "storage-location" => {
            let location = match value {
                "project" => StorageLocation::Project,
                "global" => StorageLocation::Global,
                other => bail!("unknown storage location '{other}' (project|global)"),
            };
            prefs_store.update(|p| p.storage_location = location)
        }
        "sort-order" => {
            let order = match value {
                "alphabetical" => SortOrder::Alphabetical,
                "custom" => SortOrder::Custom,
                "recent" => SortOrder::Recent,
                "date-created" | "datecreated" => SortOrder::DateCreated,
                other => bail!(
                    "unknown sort order '{other}' (alphabetical|custom|recent|date-created)"
                ),
            };
            prefs_store.update(|p| p.sort_order = order)
        }
        "open-all-files-limit" => {
            let limit: u32 = value
                .parse()
                .with_context(|| format!("'{value}' is not a number"))?;
            prefs_store.update(|p| p.open_all_files_limit = limit)
        }
        "confirm-delete" => {
            let flag = parse_bool(value)?;
            prefs_store.update(|p| p.confirm_delete = flag)
        }
        "enable-drag-and-drop" => {
            let flag = parse_bool(value)?;
            prefs_store.update(|p| p.enable_drag_and_drop = flag)
        }
        "show-file-icons" => {
            let flag = parse_bool(value)?;
            prefs_store.update(|p| p.show_file_icons = flag)
        }
        other => bail!("unknown preference key '{other}'"),
    };
    result.context("failed to save preferences")
}

fn parse_bool(value: &str) -> Result<bool> {
    match value {
        "true" | "yes" | "on" => Ok(true),
        "false" | "no" | "off" => Ok(false),
        other => bail!("'{other}' is not a boolean (true|false)"),
    }
}

/// Resolves a group argument as an exact id first, then as a unique name
/// anywhere in the forest.
/// 先以 ID 精確比對，否則以森林中唯一的名稱解析群組參數。
fn resolve_group(store: &GroupStore, ident: &str) -> Result<GroupId> {
    let flat = store.flatten();
    if let Some((group, _)) = flat.iter().find(|(g, _)| g.id.as_str() == ident) {
        return Ok(group.id.clone());
    }

    let matches: Vec<&Group> = flat
        .iter()
        .filter(|(g, _)| g.name == ident)
        .map(|(g, _)| *g)
        .collect();
    match matches.as_slice() {
        [] => bail!("no group matches '{ident}'"),
        [group] => Ok(group.id.clone()),
        _ => bail!("'{ident}' names more than one group; use its id"),
    }
}

fn resolve_file(store: &GroupStore, group_id: &GroupId, ident: &str) -> Result<FileRefId> {
    let group = store
        .find_group(group_id)
        .ok_or_else(|| anyhow!("group disappeared while resolving the file"))?;
    group
        .files
        .iter()
        .find(|f| f.id.as_str() == ident || f.relative_path == ident)
        .map(|f| f.id.clone())
        .ok_or_else(|| anyhow!("no file matches '{ident}' in that group"))
}

fn find_file_by_path(store: &GroupStore, group_id: &GroupId, path: &str) -> Result<FileRefId> {
    store
        .find_group(group_id)
        .and_then(|g| g.files.iter().find(|f| f.relative_path == path))
        .map(|f| f.id.clone())
        .ok_or_else(|| anyhow!("file '{path}' was not added"))
}

fn resolve_folder(store: &GroupStore, group_id: &GroupId, ident: &str) -> Result<FolderRefId> {
    let group = store
        .find_group(group_id)
        .ok_or_else(|| anyhow!("group disappeared while resolving the folder"))?;
    group
        .folders
        .iter()
        .find(|f| f.id.as_str() == ident || f.relative_path == ident)
        .map(|f| f.id.clone())
        .ok_or_else(|| anyhow!("no folder matches '{ident}' in that group"))
}

fn print_group(group: &Group, order: SortOrder, depth: usize) {
    let indent = "  ".repeat(depth);
    println!("{indent}{} ({})", group.name, group.id);
    for subgroup in sorted_groups(&group.subgroups, order) {
        print_group(subgroup, order, depth + 1);
    }
    for folder in sorted_folders(&group.folders, order) {
        println!("{indent}  [dir] {}", folder.relative_path);
    }
    for file in sorted_files(&group.files, order) {
        match file.line_number {
            Some(line) => println!("{indent}  {}:{line}", file.relative_path),
            None => println!("{indent}  {}", file.relative_path),
        }
    }
}
