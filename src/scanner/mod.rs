pub mod fits_header;

pub use fits_header::{extract_metadata, HeaderKeys, PrimaryHeader};

use crate::error::{PhotometryError, Result};
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

#[derive(Debug, Clone)]
pub struct FitsFile {
    pub path: PathBuf,
    pub file_name: String,
}

const FITS_EXTENSIONS: &[&str] = &["fits", "fts", "fit"];

/// ディレクトリ直下のFITSファイルを列挙（ファイル名順）
pub fn scan_folder(folder: &Path) -> Result<Vec<FitsFile>> {
    if !folder.is_dir() {
        return Err(PhotometryError::FolderNotFound(folder.display().to_string()));
    }

    let mut files = Vec::new();

    for entry in WalkDir::new(folder)
        .min_depth(1)
        .max_depth(1)  // 直下のみ（再帰しない）
        .sort_by_file_name()
    {
        let entry = match entry {
            Ok(e) => e,
            Err(e) => {
                // 直下の列挙に失敗した場合はディレクトリ自体が読めない
                if e.depth() == 0 {
                    return Err(PhotometryError::Io(e.into()));
                }
                tracing::warn!("エントリを読めません: {}", e);
                continue;
            }
        };

        let path = entry.path();
        if !path.is_file() {
            continue;
        }

        if let Some(ext) = path.extension() {
            if is_fits_extension(&ext.to_string_lossy()) {
                let file_name = path
                    .file_name()
                    .map(|n| n.to_string_lossy().to_string())
                    .unwrap_or_default();

                files.push(FitsFile {
                    path: path.to_path_buf(),
                    file_name,
                });
            }
        }
    }

    Ok(files)
}

/// 拡張子がFITSか（大文字小文字を区別しない）
pub fn is_fits_extension(ext: &str) -> bool {
    FITS_EXTENSIONS.iter().any(|e| e.eq_ignore_ascii_case(ext))
}
