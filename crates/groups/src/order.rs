//! Presentation ordering. A derived, non-persisted view: these functions
//! return freshly sorted vectors and never mutate stored order.
//! 呈現層排序；回傳新的排序結果，絕不改動儲存順序。

use crate::model::{FileRef, FolderRef, Group, SortOrder};

/// Items without an explicit sort index sort after every indexed sibling
/// under custom ordering.
/// 自訂排序下，沒有索引的項目排在所有已索引項目之後。
const UNINDEXED: usize = usize::MAX;

/// Sorts a sibling list of groups for presentation.
/// 排序群組兄弟清單以供呈現。
pub fn sorted_groups<'a>(groups: &'a [Group], order: SortOrder) -> Vec<&'a Group> {
    let mut sorted: Vec<&Group> = groups.iter().collect();
    match order {
        SortOrder::Alphabetical => {
            sorted.sort_by(|a, b| a.name.to_lowercase().cmp(&b.name.to_lowercase()));
        }
        SortOrder::Custom => {
            sorted.sort_by_key(|g| g.sort_index.unwrap_or(UNINDEXED));
        }
        SortOrder::Recent => {
            sorted.sort_by(|a, b| b.updated_at.cmp(&a.updated_at));
        }
        SortOrder::DateCreated => {
            sorted.sort_by_key(|g| g.created_at);
        }
    }
    sorted
}

/// Sorts a sibling list of file references for presentation.
/// 排序檔案參照兄弟清單以供呈現。
pub fn sorted_files<'a>(files: &'a [FileRef], order: SortOrder) -> Vec<&'a FileRef> {
    let mut sorted: Vec<&FileRef> = files.iter().collect();
    sort_refs(
        &mut sorted,
        order,
        |f| &f.relative_path,
        |f| f.sort_index,
        |f| f.added_at,
    );
    sorted
}

/// Sorts a sibling list of folder references for presentation.
/// 排序資料夾參照兄弟清單以供呈現。
pub fn sorted_folders<'a>(folders: &'a [FolderRef], order: SortOrder) -> Vec<&'a FolderRef> {
    let mut sorted: Vec<&FolderRef> = folders.iter().collect();
    sort_refs(
        &mut sorted,
        order,
        |f| &f.relative_path,
        |f| f.sort_index,
        |f| f.added_at,
    );
    sorted
}

fn sort_refs<T>(
    items: &mut [&T],
    order: SortOrder,
    path: impl Fn(&T) -> &str,
    sort_index: impl Fn(&T) -> Option<usize>,
    added_at: impl Fn(&T) -> i64,
) {
    match order {
        SortOrder::Alphabetical => {
            items.sort_by(|a, b| {
                let a_name = base_name(path(a)).to_lowercase();
                let b_name = base_name(path(b)).to_lowercase();
                a_name.cmp(&b_name)
            });
        }
        SortOrder::Custom => {
            items.sort_by_key(|item| sort_index(item).unwrap_or(UNINDEXED));
        }
        SortOrder::Recent => {
            items.sort_by(|a, b| added_at(b).cmp(&added_at(a)));
        }
        SortOrder::DateCreated => {
            items.sort_by_key(|item| added_at(item));
        }
    }
}

fn base_name(relative_path: &str) -> &str {
    relative_path
        .rsplit(['/', '\\'])
        .next()
        .unwrap_or(relative_path)
}
