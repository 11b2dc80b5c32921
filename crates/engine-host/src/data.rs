//! Data directory lookup and history file resolution.

use std::path::{Path, PathBuf};

/// Directory name searched for by [`locate_data_dir`].
pub const DATA_DIR_NAME: &str = "data";

/// How many directories, starting at `start`, are searched.
const SEARCH_DEPTH: usize = 5;

/// Find the data directory for `start`.
///
/// Looks for a `data` directory in `start` and up to four of its ancestors;
/// when none exists the result is `<start>/data`, which may not exist yet.
pub async fn locate_data_dir(start: &Path) -> PathBuf {
    for dir in start.ancestors().take(SEARCH_DEPTH) {
        let candidate = dir.join(DATA_DIR_NAME);
        if is_dir(&candidate).await {
            return candidate;
        }
    }
    start.join(DATA_DIR_NAME)
}

/// Resolve the `file_path` a caller passed to `load_data_source`.
///
/// Empty or `all` selects the combined history: `history/all.feather` when
/// present, else the legacy `history.feather`. Any other value names a
/// period (`history/<name>.feather`) if such a file exists, and is otherwise
/// passed through untouched.
pub async fn resolve_data_file(data_dir: &Path, file_path: &str) -> String {
    let history = data_dir.join("history");

    let resolved = if file_path.is_empty() || file_path == "all" {
        let combined = history.join("all.feather");
        if exists(&combined).await {
            combined
        } else {
            data_dir.join("history.feather")
        }
    } else {
        let period = history.join(format!("{file_path}.feather"));
        if exists(&period).await {
            period
        } else {
            return file_path.to_string();
        }
    };

    resolved.to_string_lossy().into_owned()
}

async fn exists(path: &Path) -> bool {
    tokio::fs::try_exists(path).await.unwrap_or(false)
}

async fn is_dir(path: &Path) -> bool {
    tokio::fs::metadata(path)
        .await
        .map(|meta| meta.is_dir())
        .unwrap_or(false)
}
