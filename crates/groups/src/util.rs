use std::fs;
use std::io;
use std::path::Path;
use std::time::{SystemTime, UNIX_EPOCH};

/// Replaces the file at `path` without a torn-write window: the payload goes
/// to a `.tmp` sibling first and is renamed into place. Missing parent
/// directories are created.
/// 先寫入 `.tmp` 同層檔案再 rename 取代，避免寫入中斷造成半份文件；
/// 父目錄缺失時一併建立。
pub fn write_atomic(path: &Path, data: &[u8]) -> io::Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    let tmp_path = path.with_extension("tmp");
    fs::write(&tmp_path, data)?;
    fs::rename(&tmp_path, path)?;
    Ok(())
}

/// Epoch milliseconds, the timestamp unit used throughout the document.
/// Epoch 毫秒，文件中所有時間戳記的單位。
pub fn now_millis() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as i64)
        .unwrap_or_default()
}
