//! エラー型定義

use std::fmt;
use thiserror::Error;

/// 校正フレームの種類
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CalibrationKind {
    Dark,
    Flat,
}

impl fmt::Display for CalibrationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CalibrationKind::Dark => write!(f, "dark"),
            CalibrationKind::Flat => write!(f, "flat"),
        }
    }
}

/// 共通エラー型
#[derive(Error, Debug)]
pub enum Error {
    #[error("No {kind} calibration frame found: {reason}")]
    NoCalibrationFound {
        kind: CalibrationKind,
        reason: String,
    },

    #[error("Path not found in index: {0}")]
    PathNotIndexed(String),
}

/// Result型エイリアス
pub type Result<T> = std::result::Result<T, Error>;
