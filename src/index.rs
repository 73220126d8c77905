//! フレーム索引ファイル（index.csv）の構築・読み込み・保存
//!
//! - clean: ディレクトリを全走査して新規作成（RANはすべてFalse）
//! - incremental: 既存索引に無いファイルだけヘッダを読み、末尾に追加
//!
//! 保存は同じディレクトリの一時ファイルに書いてから置き換えるため、
//! 書き込み途中で落ちても中途半端な索引が読まれることはない。

use crate::error::{PhotometryError, Result};
use crate::scanner::{self, extract_metadata, FitsFile};
use photometry_common::path_key::stored_form;
use photometry_common::{FrameIndex, FrameRecord, INDEX_FILE_NAME};
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// 索引の構築モード
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BuildMode {
    /// 既存の行（RAN含む）を残し、新しいファイルだけ追加
    #[default]
    Incremental,
    /// 全ファイルを読み直して作り直す
    Clean,
}

/// 索引ファイルのパス
pub fn index_path(directory: &Path) -> PathBuf {
    directory.join(INDEX_FILE_NAME)
}

/// 空でない索引ファイルが存在するか
pub fn exists(directory: &Path) -> bool {
    std::fs::metadata(index_path(directory))
        .map(|m| m.is_file() && m.len() > 0)
        .unwrap_or(false)
}

/// 索引を読み込む
pub fn load(directory: &Path) -> Result<FrameIndex> {
    let path = index_path(directory);
    if !exists(directory) {
        return Err(PhotometryError::IndexMissing(path.display().to_string()));
    }

    let mut reader = csv::Reader::from_path(&path)?;
    let records = reader
        .deserialize::<FrameRecord>()
        .collect::<std::result::Result<Vec<_>, _>>()
        .map_err(|e| PhotometryError::IndexCorrupt {
            path: path.display().to_string(),
            reason: e.to_string(),
        })?;

    debug!("索引を読み込みました: {} ({}件)", path.display(), records.len());
    Ok(FrameIndex::with_records(directory, records))
}

/// 索引を保存（一時ファイル → 置き換え）
pub fn save(index: &FrameIndex) -> Result<()> {
    let directory = index.root();
    let mut temp = tempfile::Builder::new()
        .prefix(".index-")
        .suffix(".csv.tmp")
        .tempfile_in(directory)?;

    {
        let mut writer = csv::Writer::from_writer(temp.as_file_mut());
        for record in index.records() {
            writer.serialize(record)?;
        }
        if index.is_empty() {
            writer.write_record([
                "MJD", "IMAGETYP", "EXPOSURE", "FILEPATH", "WCS", "FILTER", "RAN",
            ])?;
        }
        writer.flush()?;
    }
    temp.as_file_mut().flush()?;
    temp.as_file().sync_all()?;

    temp.persist(index.file_path())
        .map_err(|e| PhotometryError::Io(e.error))?;
    Ok(())
}

/// 索引を構築して保存
pub fn build(directory: &Path, mode: BuildMode) -> Result<FrameIndex> {
    let files = scanner::scan_folder(directory)?;

    let mut index = match mode {
        BuildMode::Clean => FrameIndex::new(directory),
        BuildMode::Incremental => match load(directory) {
            Ok(existing) => existing,
            Err(PhotometryError::IndexMissing(_)) => {
                info!("索引がありません。新規作成します: {}", directory.display());
                FrameIndex::new(directory)
            }
            Err(e) => return Err(e),
        },
    };

    let new_files: Vec<&FitsFile> = files
        .iter()
        .filter(|f| {
            let known = index.contains(&f.path);
            if known {
                debug!("索引済みのためスキップ: {}", f.path.display());
            }
            !known
        })
        .collect();

    // cfitsio はスレッド安全なビルドとは限らないため逐次に読む
    let mut added = 0;
    for file in new_files {
        match extract_metadata(&file.path) {
            Ok(meta) => {
                let stored = stored_form(directory, &file.path);
                index.push(FrameRecord::from_metadata(stored, &meta));
                added += 1;
            }
            Err(e) => warn!("索引から除外: {}", e),
        }
    }

    save(&index)?;
    info!(
        "索引を保存しました: {} ({}件, 追加 {}件)",
        index.file_path().display(),
        index.len(),
        added
    );
    Ok(index)
}

/// 索引が無ければ clean で作成、あれば incremental で更新
pub fn ensure(directory: &Path) -> Result<FrameIndex> {
    if exists(directory) {
        build(directory, BuildMode::Incremental)
    } else {
        build(directory, BuildMode::Clean)
    }
}

/// 読み込み、無ければ clean で作成してもう一度読む
pub fn load_or_build(directory: &Path) -> Result<FrameIndex> {
    match load(directory) {
        Err(PhotometryError::IndexMissing(_)) => {
            info!("索引がありません。作成します: {}", directory.display());
            build(directory, BuildMode::Clean)?;
            load(directory)
        }
        other => other,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_load_missing_index() {
        let dir = tempdir().expect("Failed to create temp dir");
        assert!(matches!(load(dir.path()), Err(PhotometryError::IndexMissing(_))));
    }

    #[test]
    fn test_load_empty_index_file_is_missing() {
        let dir = tempdir().expect("Failed to create temp dir");
        std::fs::write(index_path(dir.path()), "").unwrap();
        assert!(matches!(load(dir.path()), Err(PhotometryError::IndexMissing(_))));
    }

    #[test]
    fn test_load_corrupt_index() {
        let dir = tempdir().expect("Failed to create temp dir");
        std::fs::write(
            index_path(dir.path()),
            "MJD,IMAGETYP,EXPOSURE,FILEPATH,WCS,FILTER,RAN\nnot-a-number,Light,1,a.fits,True,V,False\n",
        )
        .unwrap();
        assert!(matches!(
            load(dir.path()),
            Err(PhotometryError::IndexCorrupt { .. })
        ));
    }

    #[test]
    fn test_save_empty_index_writes_header_only() {
        let dir = tempdir().expect("Failed to create temp dir");
        save(&FrameIndex::new(dir.path())).unwrap();

        let text = std::fs::read_to_string(index_path(dir.path())).unwrap();
        assert_eq!(text.trim(), "MJD,IMAGETYP,EXPOSURE,FILEPATH,WCS,FILTER,RAN");
        let loaded = load(dir.path()).unwrap();
        assert!(loaded.is_empty());
    }

    #[test]
    fn test_build_on_missing_folder() {
        let result = build(Path::new("/nonexistent/folder"), BuildMode::Clean);
        assert!(matches!(result, Err(PhotometryError::FolderNotFound(_))));
    }
}
