//! Import/export codec for the portable forest document.
//! 森林文件匯入匯出編解碼。

use std::collections::HashSet;

use thiserror::Error;

use crate::model::ForestDocument;

/// Rejections for caller-supplied import payloads. A malformed document
/// aborts the whole import with no partial application.
/// 匯入文件的格式錯誤；格式不符時整個匯入中止，不做部分套用。
#[derive(Debug, Error)]
pub enum FormatError {
    #[error("import payload is not valid JSON: {0}")]
    Json(String),
    #[error("import document is missing a version tag")]
    MissingVersion,
    #[error("import document field 'groups' is not a list")]
    GroupsNotList,
    #[error("document could not be serialized: {0}")]
    Serialize(String),
}

/// What to do with a structurally valid imported document.
/// 結構合法的匯入文件要如何套用。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImportPolicy {
    /// Swap the entire in-memory document for the imported one.
    Replace,
    /// Append imported top-level groups whose name is not already taken;
    /// first-level name collision is the sole dedup key.
    Merge,
}

/// Summary of an applied import, for user-facing notices.
/// 匯入結果摘要，供通知訊息使用。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImportReport {
    Replaced { groups: usize },
    Merged { appended: usize, skipped: usize },
}

/// Serializes the live document to pretty-printed JSON bytes; the caller
/// decides where they go.
/// 將文件序列化為 JSON 位元組，寫到哪裡由呼叫端決定。
pub fn export(document: &ForestDocument) -> Result<Vec<u8>, FormatError> {
    serde_json::to_vec_pretty(document).map_err(|err| FormatError::Serialize(err.to_string()))
}

/// Parses caller-supplied bytes as a forest document. The version tag must be
/// a non-empty string and `groups` must be a list; ids inside the document
/// are preserved verbatim, never regenerated.
/// 解析匯入位元組；版本標記必須存在、`groups` 必須是列表，識別碼原樣保留。
pub fn parse_import(bytes: &[u8]) -> Result<ForestDocument, FormatError> {
    let value: serde_json::Value =
        serde_json::from_slice(bytes).map_err(|err| FormatError::Json(err.to_string()))?;

    match value.get("version").and_then(|v| v.as_str()) {
        Some(version) if !version.is_empty() => {}
        _ => return Err(FormatError::MissingVersion),
    }
    if !value.get("groups").map(|g| g.is_array()).unwrap_or(false) {
        return Err(FormatError::GroupsNotList);
    }

    serde_json::from_value(value).map_err(|err| FormatError::Json(err.to_string()))
}

/// Merges an imported document into the current one: each imported top-level
/// group is skipped when a top-level group of the same name already exists,
/// and appended verbatim (whole subtree included) otherwise.
/// 合併匯入：頂層名稱已存在則跳過，否則連同子樹整組附加。
pub fn merge_documents(current: &mut ForestDocument, imported: ForestDocument) -> ImportReport {
    // The dedup set is computed once against the pre-merge state, matching
    // the documented first-level-name-only semantics.
    let existing: HashSet<String> = current.groups.iter().map(|g| g.name.clone()).collect();

    let mut appended = 0;
    let mut skipped = 0;
    for group in imported.groups {
        if existing.contains(&group.name) {
            skipped += 1;
        } else {
            current.groups.push(group);
            appended += 1;
        }
    }
    ImportReport::Merged { appended, skipped }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Group, DOCUMENT_VERSION};

    fn document(names: &[&str]) -> ForestDocument {
        ForestDocument {
            version: DOCUMENT_VERSION.to_string(),
            groups: names.iter().map(|n| Group::new(*n, None, None)).collect(),
        }
    }

    #[test]
    fn export_then_parse_is_identity() {
        let mut doc = document(&["A"]);
        let mut child = Group::new("A1", None, Some(doc.groups[0].id.clone()));
        child.files.push(crate::model::FileRef::new("x.rs", None));
        doc.groups[0].subgroups.push(child);

        let bytes = export(&doc).unwrap();
        let parsed = parse_import(&bytes).unwrap();
        assert_eq!(parsed, doc);
    }

    #[test]
    fn missing_version_is_rejected() {
        let err = parse_import(b"{\"groups\": []}").unwrap_err();
        assert!(matches!(err, FormatError::MissingVersion));

        let err = parse_import(b"{\"version\": \"\", \"groups\": []}").unwrap_err();
        assert!(matches!(err, FormatError::MissingVersion));
    }

    #[test]
    fn non_list_groups_is_rejected() {
        let err = parse_import(b"{\"version\": \"1.0.0\", \"groups\": {}}").unwrap_err();
        assert!(matches!(err, FormatError::GroupsNotList));

        let err = parse_import(b"{\"version\": \"1.0.0\"}").unwrap_err();
        assert!(matches!(err, FormatError::GroupsNotList));
    }

    #[test]
    fn garbage_is_rejected_as_json_error() {
        assert!(matches!(
            parse_import(b"not json at all").unwrap_err(),
            FormatError::Json(_)
        ));
    }

    #[test]
    fn merge_skips_name_collisions_and_appends_the_rest() {
        let mut current = document(&["Sales", "Docs"]);
        let imported = document(&["Docs", "Auth"]);
        let imported_auth_id = imported.groups[1].id.clone();

        let report = merge_documents(&mut current, imported);
        assert_eq!(
            report,
            ImportReport::Merged {
                appended: 1,
                skipped: 1
            }
        );
        assert_eq!(current.groups.len(), 3);
        // Appended groups keep their ids verbatim.
        assert_eq!(current.groups[2].id, imported_auth_id);
    }

    #[test]
    fn merge_keeps_imported_subtrees_intact() {
        let mut current = document(&["Existing"]);
        let mut imported = document(&["Incoming"]);
        let child = Group::new("Child", None, Some(imported.groups[0].id.clone()));
        imported.groups[0].subgroups.push(child);

        merge_documents(&mut current, imported);
        assert_eq!(current.groups[1].subgroups.len(), 1);
        assert_eq!(current.groups[1].subgroups[0].name, "Child");
    }

    #[test]
    fn version_tag_is_carried_opaquely() {
        let bytes = b"{\"version\": \"custom-7\", \"groups\": []}";
        let parsed = parse_import(bytes).unwrap();
        assert_eq!(parsed.version, "custom-7");
    }
}
