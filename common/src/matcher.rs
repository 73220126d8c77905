//! 校正フレーム照合ロジック
//!
//! 2段階: 物理条件で絞り込み → 観測日(MJD)が最も近い行を選ぶ。
//! - ダーク: 露光時間が相対5%以内
//! - フラット: FILTERが完全一致

use crate::error::{CalibrationKind, Error, Result};
use crate::types::{FrameMetadata, FrameRecord, ImageType};

/// ダーク照合の露光時間相対許容値
pub const EXPOSURE_REL_TOL: f64 = 0.05;

/// `|a - b| <= rel_tol * max(|a|, |b|)`
pub fn is_close(a: f64, b: f64, rel_tol: f64) -> bool {
    if a == b {
        return true;
    }
    (a - b).abs() <= rel_tol * a.abs().max(b.abs())
}

/// 露光時間が近く、観測日が最も近いダークを選ぶ
pub fn select_dark<'a>(rows: &'a [FrameRecord], science: &FrameMetadata) -> Result<&'a FrameRecord> {
    let candidates = rows.iter().filter(|r| {
        role_allows(&r.image_type, CalibrationKind::Dark)
            && is_close(science.exposure_seconds, r.exposure_seconds, EXPOSURE_REL_TOL)
    });

    nearest_by_date(candidates, science.modified_julian_date).ok_or_else(|| {
        Error::NoCalibrationFound {
            kind: CalibrationKind::Dark,
            reason: format!(
                "no dark within {}% of exposure {}s among {} rows",
                EXPOSURE_REL_TOL * 100.0,
                science.exposure_seconds,
                rows.len()
            ),
        }
    })
}

/// FILTERが一致し、観測日が最も近いフラットを選ぶ
pub fn select_flat<'a>(rows: &'a [FrameRecord], science: &FrameMetadata) -> Result<&'a FrameRecord> {
    let candidates = rows.iter().filter(|r| {
        role_allows(&r.image_type, CalibrationKind::Flat) && r.filter == science.filter
    });

    nearest_by_date(candidates, science.modified_julian_date).ok_or_else(|| {
        Error::NoCalibrationFound {
            kind: CalibrationKind::Flat,
            reason: format!(
                "no flat with filter '{}' among {} rows",
                science.filter,
                rows.len()
            ),
        }
    })
}

/// 別の役割が明示されている行（ライトや他方の校正フレーム）は除外。
/// 未知の IMAGETYP は対象に残す。
fn role_allows(image_type: &ImageType, kind: CalibrationKind) -> bool {
    match image_type {
        ImageType::Light => false,
        ImageType::DarkFrame => kind == CalibrationKind::Dark,
        ImageType::FlatField => kind == CalibrationKind::Flat,
        ImageType::Other(_) => true,
    }
}

/// 同距離の場合は先に現れた行
fn nearest_by_date<'a>(
    candidates: impl Iterator<Item = &'a FrameRecord>,
    target_mjd: f64,
) -> Option<&'a FrameRecord> {
    let mut best: Option<(&FrameRecord, f64)> = None;
    for row in candidates {
        let distance = (row.modified_julian_date - target_mjd).abs();
        if distance.is_nan() {
            continue;
        }
        match best {
            Some((_, d)) if d <= distance => {}
            _ => best = Some((row, distance)),
        }
    }
    best.map(|(row, _)| row)
}
