//! Collaborator interfaces the command pipelines talk to. The real
//! implementations live in the host surface (tree UI, palette, dialogs);
//! tests drive the flows with scripted fakes.
//! 指令管線對外的協作者介面；實作位於宿主介面層，測試以腳本假件驅動。

use std::io;

/// Input validator: `None` accepts the value, `Some(message)` rejects it with
/// a user-visible reason.
/// 輸入驗證器：`None` 表示接受，`Some(message)` 表示拒絕並附原因。
pub type Validator<'a> = &'a dyn Fn(&str) -> Option<String>;

/// One labeled choice offered to the user.
/// 提供給使用者的單一選項。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PickOption {
    pub label: String,
    pub description: Option<String>,
    pub detail: Option<String>,
}

impl PickOption {
    pub fn new(label: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            description: None,
            detail: None,
        }
    }
}

/// User prompts. Every method may return `None`/dismissal, which aborts the
/// surrounding command with no partial mutation.
/// 使用者提示；任何一步被取消即中止整個指令，不留下部分變更。
pub trait Interaction {
    /// Prompts for text, re-asking until the validator accepts or the user
    /// dismisses the prompt.
    fn prompt_text(
        &mut self,
        prompt: &str,
        initial: Option<&str>,
        validate: Validator<'_>,
    ) -> Option<String>;

    /// Asks the user to pick one of the options, returning its index.
    fn pick(&mut self, placeholder: &str, options: &[PickOption]) -> Option<usize>;

    /// Yes/no confirmation; dismissal counts as "no".
    fn confirm(&mut self, message: &str) -> bool;
}

/// One-way notification sink for user-facing messages.
/// 單向的使用者訊息通道。
pub trait Notifier {
    fn info(&mut self, message: &str);
    fn warn(&mut self, message: &str);
    fn error(&mut self, message: &str);
}

/// A directory entry reported by the host filesystem collaborator.
/// 宿主檔案系統協作者回報的目錄項目。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DirEntry {
    pub name: String,
    pub relative_path: String,
    pub is_dir: bool,
}

/// Lists the entries of a folder, non-recursively, given its path relative to
/// the project root. Folder reference contents are resolved through this at
/// display time; they are never persisted.
/// 以專案根的相對路徑列出資料夾內容（不遞迴）；內容僅於顯示時解析。
pub trait DirectoryLister {
    fn list(&self, relative_path: &str) -> io::Result<Vec<DirEntry>>;
}
