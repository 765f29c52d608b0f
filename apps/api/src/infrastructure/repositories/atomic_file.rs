use std::path::Path;
use std::sync::atomic::{AtomicU64, Ordering};
use tokio::fs;

use crate::domain::repositories::StoreError;

static TEMP_COUNTER: AtomicU64 = AtomicU64::new(0);

/// Replaces `path` with `contents` via a sibling temp file and a rename.
///
/// Readers see either the previous file or the new one, never a partial
/// write, and concurrent writers cannot interleave their bytes.
pub(crate) async fn write_atomically(path: &Path, contents: &str) -> Result<(), StoreError> {
    let file_name = path
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_default();
    let temp_path = path.with_file_name(format!(
        "{}.{}.{}.tmp",
        file_name,
        std::process::id(),
        TEMP_COUNTER.fetch_add(1, Ordering::Relaxed)
    ));

    fs::write(&temp_path, contents)
        .await
        .map_err(|e| StoreError::io(&temp_path, e))?;

    if let Err(e) = fs::rename(&temp_path, path).await {
        let _ = fs::remove_file(&temp_path).await;
        return Err(StoreError::io(path, e));
    }

    Ok(())
}
