//! フレーム索引（メモリ上の表）
//!
//! 1ディレクトリにつき1つ。ディスクへの読み書きはCLI側の `index` モジュールが担当する。

use crate::path_key::canonical_path;
use crate::types::FrameRecord;
use std::collections::HashMap;
use std::path::{Path, PathBuf};

/// ディレクトリ内の索引ファイル名
pub const INDEX_FILE_NAME: &str = "index.csv";

#[derive(Debug, Clone, PartialEq)]
pub struct FrameIndex {
    /// 索引対象ディレクトリ
    root: PathBuf,
    records: Vec<FrameRecord>,
    /// 正規化済みの絶対パス → 行位置（同じパスが複数あれば先頭の行）
    keys: HashMap<PathBuf, usize>,
}

impl FrameIndex {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self::with_records(root, Vec::new())
    }

    pub fn with_records(root: impl Into<PathBuf>, records: Vec<FrameRecord>) -> Self {
        let mut index = Self {
            root: root.into(),
            records: Vec::with_capacity(records.len()),
            keys: HashMap::with_capacity(records.len()),
        };
        for record in records {
            index.push(record);
        }
        index
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// 索引ファイルのパス
    pub fn file_path(&self) -> PathBuf {
        self.root.join(INDEX_FILE_NAME)
    }

    pub fn records(&self) -> &[FrameRecord] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// 行のファイルパス（絶対・正規化済み）
    ///
    /// 旧ツールの索引はカレントディレクトリ基準の相対パス（`./calibrations/darks/x.fits`）を
    /// 保存しているため、索引基準で見つからなければそちらも試す。
    pub fn absolute_path(&self, record: &FrameRecord) -> PathBuf {
        let stored = Path::new(&record.path);
        let resolved = canonical_path(&self.root, stored);
        if stored.is_relative() && !resolved.exists() {
            let legacy = canonical_path(Path::new("."), stored);
            if legacy.exists() {
                return legacy;
            }
        }
        resolved
    }

    /// 照会パスと一致する行の位置
    ///
    /// 相対パスの照会はカレントディレクトリ基準で解釈する。
    /// 行側のパスは追加時に一度だけ正規化してある。
    pub fn position(&self, path: &Path) -> Option<usize> {
        let query = canonical_path(Path::new("."), path);
        self.keys.get(&query).copied()
    }

    pub fn contains(&self, path: &Path) -> bool {
        self.position(path).is_some()
    }

    /// 行を追加（重複チェックは呼び出し側）
    pub fn push(&mut self, record: FrameRecord) {
        let key = self.absolute_path(&record);
        self.keys.entry(key).or_insert(self.records.len());
        self.records.push(record);
    }

    pub(crate) fn record_mut(&mut self, position: usize) -> Option<&mut FrameRecord> {
        self.records.get_mut(position)
    }

    /// RAN=True の件数
    pub fn ran_count(&self) -> usize {
        self.records.iter().filter(|r| r.ran).count()
    }

    /// WCSを持つフレームの件数
    pub fn wcs_count(&self) -> usize {
        self.records
            .iter()
            .filter(|r| r.has_world_coordinate_system)
            .count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{ImageType, NO_FILTER};

    fn record(path: &str) -> FrameRecord {
        FrameRecord {
            modified_julian_date: 59000.0,
            image_type: ImageType::Light,
            exposure_seconds: 30.0,
            path: path.to_string(),
            has_world_coordinate_system: true,
            filter: NO_FILTER.to_string(),
            ran: false,
        }
    }

    #[test]
    fn test_position_matches_any_spelling() {
        let index = FrameIndex::with_records(
            "/nonexistent-root/star",
            vec![record("a.fits"), record("b.fits")],
        );

        assert_eq!(index.position(Path::new("/nonexistent-root/star/b.fits")), Some(1));
        assert_eq!(index.position(Path::new("/nonexistent-root/star/./a.fits")), Some(0));
        assert_eq!(index.position(Path::new("/nonexistent-root/other/a.fits")), None);
    }

    #[test]
    fn test_position_after_push() {
        let mut index = FrameIndex::new("/nonexistent-root/star");
        index.push(record("a.fits"));
        index.push(record("b.fits"));

        assert_eq!(index.position(Path::new("/nonexistent-root/star/b.fits")), Some(1));
        assert!(index.contains(Path::new("/nonexistent-root/star/x/../a.fits")));
        assert!(!index.contains(Path::new("/nonexistent-root/star/c.fits")));
    }

    #[test]
    fn test_duplicate_rows_resolve_to_first() {
        let index = FrameIndex::with_records(
            "/nonexistent-root/star",
            vec![record("a.fits"), record("./a.fits")],
        );
        assert_eq!(index.len(), 2);
        assert_eq!(index.position(Path::new("/nonexistent-root/star/a.fits")), Some(0));
    }

    #[test]
    fn test_lookup_scales_to_large_index() {
        let records: Vec<_> = (0..5000).map(|i| record(&format!("f{:05}.fits", i))).collect();
        let index = FrameIndex::with_records("/nonexistent-root/big", records);

        for i in (0..5000).step_by(7) {
            let query = PathBuf::from(format!("/nonexistent-root/big/f{:05}.fits", i));
            assert_eq!(index.position(&query), Some(i));
        }
    }

    #[test]
    fn test_counts() {
        let mut ran = record("a.fits");
        ran.ran = true;
        let mut no_wcs = record("b.fits");
        no_wcs.has_world_coordinate_system = false;

        let index = FrameIndex::with_records("/tmp", vec![ran, no_wcs]);
        assert_eq!(index.len(), 2);
        assert_eq!(index.ran_count(), 1);
        assert_eq!(index.wcs_count(), 1);
    }
}
