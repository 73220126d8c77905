use thiserror::Error;

#[derive(Error, Debug)]
pub enum PhotometryError {
    #[error("設定エラー: {0}")]
    Config(String),

    #[error("ファイルが見つかりません: {0}")]
    FileNotFound(String),

    #[error("フォルダが見つかりません: {0}")]
    FolderNotFound(String),

    #[error("FITSヘッダ読み込みエラー: {path}: {reason}")]
    FitsHeader { path: String, reason: String },

    #[error("必須ヘッダキーがありません: {path}: {key}")]
    MetadataMissing { path: String, key: String },

    #[error("索引ファイルがありません: {0}")]
    IndexMissing(String),

    #[error("索引ファイルが不正: {path}: {reason}")]
    IndexCorrupt { path: String, reason: String },

    #[error("測光に失敗: {path}: {reason}")]
    PhotometryFailure { path: String, reason: String },

    #[error("測光がタイムアウト ({seconds}秒): {path}")]
    PhotometryTimeout { path: String, seconds: u64 },

    #[error("ターゲットリストが読み込めません: {0}")]
    TargetList(String),

    #[error("光度曲線の描画エラー: {0}")]
    Plot(String),

    #[error("JSON解析エラー: {0}")]
    JsonParse(#[from] serde_json::Error),

    #[error("CSVエラー: {0}")]
    Csv(#[from] csv::Error),

    #[error("IOエラー: {0}")]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Common(#[from] photometry_common::Error),
}

impl PhotometryError {
    /// フレーム単位でスキップすべきエラーか（ターゲット全体は継続）
    pub fn is_frame_level(&self) -> bool {
        matches!(
            self,
            PhotometryError::FitsHeader { .. }
                | PhotometryError::MetadataMissing { .. }
                | PhotometryError::PhotometryFailure { .. }
                | PhotometryError::PhotometryTimeout { .. }
                | PhotometryError::Common(photometry_common::Error::NoCalibrationFound { .. })
                | PhotometryError::Common(photometry_common::Error::PathNotIndexed(_))
        )
    }
}

pub type Result<T> = std::result::Result<T, PhotometryError>;
