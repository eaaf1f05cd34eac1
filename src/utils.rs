use chrono::{DateTime, FixedOffset, Local};
use sqlx::SqlitePool;
use std::path::Path;
use tokio::fs;

pub(crate) async fn is_table_exists(
    pool: &SqlitePool,
    table_name: &str,
) -> Result<bool, sqlx::Error> {
    Ok(
        sqlx::query("SELECT name FROM sqlite_master WHERE type='table' AND name = ?")
            .bind(table_name)
            .fetch_optional(pool)
            .await?
            .is_some(),
    )
}

pub(crate) fn get_now() -> DateTime<FixedOffset> {
    let now = Local::now();
    now.with_timezone(now.offset())
}

/// Collapses whitespace runs, the way text reads in a browser.
pub(crate) fn clean_text(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Spaces become underscores so user input can go into file names.
pub(crate) fn file_safe(s: &str) -> String {
    s.trim().replace(' ', "_")
}

/// Whole-file overwrite through a sibling temp file, so a crash never leaves
/// a half-written file behind.
pub(crate) async fn write_atomic(path: &Path, contents: &[u8]) -> Result<(), std::io::Error> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent).await?;
        }
    }
    let mut tmp = path.as_os_str().to_owned();
    tmp.push(".tmp");
    fs::write(&tmp, contents).await?;
    fs::rename(&tmp, path).await
}
