//! 校正フレームライブラリ
//!
//! 以下の構成を前提とする:
//! ```text
//! calibrations/
//! ├── darks/   ダークフレーム + index.csv
//! └── flats/   フラットフレーム + index.csv
//! ```
//! 索引が無ければ作成してから照合する。読み込んだ索引は実行中キャッシュする。

use crate::error::Result;
use crate::index;
use photometry_common::{select_dark, select_flat, FrameIndex, FrameMetadata};
use std::cell::RefCell;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use tracing::info;

pub const DARKS_DIR: &str = "darks";
pub const FLATS_DIR: &str = "flats";

pub struct CalibrationLibrary {
    darks_dir: PathBuf,
    flats_dir: PathBuf,
    loaded: RefCell<HashMap<PathBuf, FrameIndex>>,
}

impl CalibrationLibrary {
    pub fn new(root: &Path) -> Self {
        Self::with_dirs(root.join(DARKS_DIR), root.join(FLATS_DIR))
    }

    pub fn with_dirs(darks_dir: PathBuf, flats_dir: PathBuf) -> Self {
        Self {
            darks_dir,
            flats_dir,
            loaded: RefCell::new(HashMap::new()),
        }
    }

    pub fn darks_dir(&self) -> &Path {
        &self.darks_dir
    }

    pub fn flats_dir(&self) -> &Path {
        &self.flats_dir
    }

    /// 露光時間が近く、観測日が最も近いダーク
    pub fn find_dark(&self, science: &FrameMetadata) -> Result<PathBuf> {
        self.with_index(&self.darks_dir, |index| {
            let row = select_dark(index.records(), science)?;
            Ok(index.absolute_path(row))
        })
    }

    /// FILTERが一致し、観測日が最も近いフラット
    pub fn find_flat(&self, science: &FrameMetadata) -> Result<PathBuf> {
        self.with_index(&self.flats_dir, |index| {
            let row = select_flat(index.records(), science)?;
            Ok(index.absolute_path(row))
        })
    }

    /// キャッシュを捨てる（校正ディレクトリを更新した後など）
    pub fn invalidate(&self) {
        self.loaded.borrow_mut().clear();
    }

    fn with_index<T>(
        &self,
        directory: &Path,
        f: impl FnOnce(&FrameIndex) -> Result<T>,
    ) -> Result<T> {
        if let Some(index) = self.loaded.borrow().get(directory) {
            return f(index);
        }

        let index = index::load_or_build(directory)?;
        info!(
            "校正フレーム索引: {} ({}件)",
            directory.display(),
            index.len()
        );
        let result = f(&index);
        self.loaded.borrow_mut().insert(directory.to_path_buf(), index);
        result
    }
}
