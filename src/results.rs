//! 測光結果テーブル（ターゲットごとの `MJD, Magnitude, Error`）
//!
//! 追記のみ。並べ替えはしない（処理順のまま）。

use crate::error::Result;
use photometry_common::ResultRecord;
use std::fs::OpenOptions;
use std::path::Path;

/// 1行追記（ファイルが無い・空ならヘッダも書く）
pub fn append(path: &Path, record: &ResultRecord) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)?;
    }

    let is_new = std::fs::metadata(path).map(|m| m.len() == 0).unwrap_or(true);
    let legacy_rows = if is_new { None } else { legacy_row_count(path)? };
    let file = OpenOptions::new().create(true).append(true).open(path)?;

    let mut writer = csv::WriterBuilder::new()
        .has_headers(is_new)
        .from_writer(file);
    match legacy_rows {
        // 旧形式は先頭に行番号列がある。数値の書式は新形式と同じ
        Some(row_number) => writer.serialize((
            row_number,
            record.modified_julian_date,
            record.magnitude,
            record.error_magnitude,
        ))?,
        None => writer.serialize(record)?,
    }
    writer.flush()?;
    Ok(())
}

/// 先頭列が無名（行番号列）なら既存の行数
fn legacy_row_count(path: &Path) -> Result<Option<usize>> {
    let mut reader = csv::Reader::from_path(path)?;
    let legacy = reader.headers()?.get(0).map(str::is_empty).unwrap_or(false);
    if !legacy {
        return Ok(None);
    }
    let mut count = 0;
    for row in reader.records() {
        row?;
        count += 1;
    }
    Ok(Some(count))
}

/// 全行を読み込む（旧形式の先頭行番号列は無視）
pub fn load(path: &Path) -> Result<Vec<ResultRecord>> {
    let mut reader = csv::Reader::from_path(path)?;
    let rows = reader
        .deserialize::<ResultRecord>()
        .collect::<std::result::Result<Vec<_>, _>>()?;
    Ok(rows)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn record(mjd: f64) -> ResultRecord {
        ResultRecord {
            modified_julian_date: mjd,
            magnitude: 12.0,
            error_magnitude: 0.02,
        }
    }

    #[test]
    fn test_append_keeps_insertion_order() {
        let dir = tempdir().expect("Failed to create temp dir");
        let path = dir.path().join("Output").join("star.csv");

        append(&path, &record(59002.0)).unwrap();
        append(&path, &record(59000.0)).unwrap();
        append(&path, &record(59001.0)).unwrap();

        let text = std::fs::read_to_string(&path).unwrap();
        assert_eq!(text.lines().next(), Some("MJD,Magnitude,Error"));
        assert_eq!(text.lines().nth(1), Some("59002.0,12.0,0.02"));
        assert_eq!(text.lines().count(), 4);

        let rows = load(&path).unwrap();
        let dates: Vec<f64> = rows.iter().map(|r| r.modified_julian_date).collect();
        assert_eq!(dates, vec![59002.0, 59000.0, 59001.0]);
    }

    #[test]
    fn test_load_legacy_table() {
        let dir = tempdir().expect("Failed to create temp dir");
        let path = dir.path().join("legacy.csv");
        std::fs::write(&path, ",MJD,Magnitude,Error\n0,59000.5,11.2,0.03\n").unwrap();

        let rows = load(&path).unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].magnitude, 11.2);

        append(&path, &record(59001.0)).unwrap();
        let text = std::fs::read_to_string(&path).unwrap();
        assert_eq!(text.lines().last(), Some("1,59001.0,12.0,0.02"));
        assert_eq!(load(&path).unwrap().len(), 2);
    }
}
