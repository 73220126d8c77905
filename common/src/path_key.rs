//! パス正規化
//!
//! 索引への書き込み時と照会時で同じ関数を通し、
//! `./dir/a.fits` と `dir/../dir/a.fits` と絶対パスを同一視する。

use std::path::{Component, Path, PathBuf};

/// `root` を基準に `path` を正規化した絶対パスを返す
///
/// 1. 相対パスは `root` に連結（`root` 自体が相対ならカレントディレクトリに連結）
/// 2. `.` と `..` を字句的に畳み込む
/// 3. 実在すればシンボリックリンクを解決
pub fn canonical_path(root: &Path, path: &Path) -> PathBuf {
    let joined = if path.is_absolute() {
        path.to_path_buf()
    } else {
        absolute_root(root).join(path)
    };

    let normalized = normalize_lexically(&joined);
    std::fs::canonicalize(&normalized).unwrap_or(normalized)
}

/// 索引ディレクトリ自体の正規形
pub fn canonical_root(root: &Path) -> PathBuf {
    let normalized = normalize_lexically(&absolute_root(root));
    std::fs::canonicalize(&normalized).unwrap_or(normalized)
}

/// 索引に保存する形式（ディレクトリからの相対、`/` 区切り）
///
/// `root` の外にあるファイルは正規化済みの絶対パスのまま保存する。
pub fn stored_form(root: &Path, path: &Path) -> String {
    let canonical = canonical_path(root, path);
    let root = canonical_root(root);
    match canonical.strip_prefix(&root) {
        Ok(relative) => relative
            .components()
            .map(|c| c.as_os_str().to_string_lossy().into_owned())
            .collect::<Vec<_>>()
            .join("/"),
        Err(_) => canonical.to_string_lossy().into_owned(),
    }
}

fn absolute_root(root: &Path) -> PathBuf {
    if root.is_absolute() {
        root.to_path_buf()
    } else {
        std::env::current_dir()
            .map(|cwd| cwd.join(root))
            .unwrap_or_else(|_| root.to_path_buf())
    }
}

fn normalize_lexically(path: &Path) -> PathBuf {
    let mut out = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                if !out.pop() {
                    out.push(component.as_os_str());
                }
            }
            other => out.push(other.as_os_str()),
        }
    }
    out
}
