//! 実行済み管理
//!
//! 索引の RAN 列が「測光済み」の唯一の記録。
//! 更新は純粋な変換（新しい索引を返す）で、保存は呼び出し側が明示的に行う。

use crate::error::{Error, Result};
use crate::index::FrameIndex;
use crate::types::FrameRecord;
use std::path::Path;

/// パスに対応する行
pub fn find_record<'a>(index: &'a FrameIndex, path: &Path) -> Result<&'a FrameRecord> {
    index
        .position(path)
        .map(|i| &index.records()[i])
        .ok_or_else(|| not_indexed(index, path))
}

/// 測光済みか
pub fn is_ran(index: &FrameIndex, path: &Path) -> Result<bool> {
    find_record(index, path).map(|r| r.ran)
}

/// RAN=True にした索引を返す
///
/// 行が無い場合は `PathNotIndexed`。行の作成は索引構築側の責務なので、ここでは作らない。
pub fn mark_ran(mut index: FrameIndex, path: &Path) -> Result<FrameIndex> {
    let position = index
        .position(path)
        .ok_or_else(|| not_indexed(&index, path))?;
    if let Some(record) = index.record_mut(position) {
        record.ran = true;
    }
    Ok(index)
}

fn not_indexed(index: &FrameIndex, path: &Path) -> Error {
    Error::PathNotIndexed(format!(
        "{} (index: {})",
        path.display(),
        index.file_path().display()
    ))
}
