//! Photometry Common Library
//!
//! フレーム索引の型と、校正フレーム照合・実行済み管理の純粋ロジック

pub mod error;
pub mod index;
pub mod matcher;
pub mod path_key;
pub mod run_tracker;
pub mod types;

pub use error::{CalibrationKind, Error, Result};
pub use index::{FrameIndex, INDEX_FILE_NAME};
pub use matcher::{is_close, select_dark, select_flat, EXPOSURE_REL_TOL};
pub use run_tracker::{find_record, is_ran, mark_ran};
pub use types::{
    jd_to_mjd, FrameMetadata, FrameRecord, ImageType, ResultRecord, TargetEntry, MJD_OFFSET,
    NO_FILTER,
};
