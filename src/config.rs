use crate::error::{PhotometryError, Result};
use crate::photometry::EngineSettings;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// 校正フレームのルート（darks/ と flats/ を含む）
    pub calibration_path: PathBuf,
    /// 測光結果・光度曲線の出力先
    pub output_dir: PathBuf,
    /// 参照星ファイルの出力先
    pub reference_star_dir: PathBuf,
    /// ターゲットごとのFITSディレクトリの親
    pub star_dir: PathBuf,
    /// 測光エンジンの実行ファイル
    pub engine_program: String,
    /// エンジンに先頭で渡す引数
    pub engine_args: Vec<String>,
    /// 1フレームあたりの測光タイムアウト
    pub timeout_seconds: u64,
    pub use_bias: bool,
    pub console_print: bool,
    pub astrometry_api_key: Option<String>,
    pub astrometry_timeout_seconds: u64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            calibration_path: PathBuf::from("./calibrations"),
            output_dir: PathBuf::from("./Output"),
            reference_star_dir: PathBuf::from("./reference-stars"),
            star_dir: PathBuf::from("."),
            engine_program: "photometry-engine".into(),
            engine_args: Vec::new(),
            timeout_seconds: 600,
            use_bias: false,
            console_print: false,
            astrometry_api_key: None,
            astrometry_timeout_seconds: 100,
        }
    }
}

impl Config {
    pub fn load() -> Result<Self> {
        let config_path = Self::config_path()?;

        if config_path.exists() {
            let content = std::fs::read_to_string(&config_path)?;
            let config: Config = serde_json::from_str(&content)
                .map_err(|e| PhotometryError::Config(format!("{}: {}", config_path.display(), e)))?;
            Ok(config)
        } else {
            Ok(Self::default())
        }
    }

    pub fn save(&self) -> Result<()> {
        let config_path = Self::config_path()?;

        if let Some(parent) = config_path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let content = serde_json::to_string_pretty(self)?;
        std::fs::write(&config_path, content)?;
        Ok(())
    }

    pub fn config_path() -> Result<PathBuf> {
        let home = dirs::home_dir()
            .ok_or_else(|| PhotometryError::Config("ホームディレクトリが見つかりません".into()))?;
        Ok(home.join(".config").join("photometry").join("config.json"))
    }

    /// astrometry.net のAPIキー（環境変数を優先）
    pub fn astrometry_api_key(&self) -> Option<String> {
        std::env::var("ASTROMETRY_API_KEY")
            .ok()
            .filter(|k| !k.is_empty())
            .or_else(|| self.astrometry_api_key.clone())
    }

    pub fn set_api_key(&mut self, key: String) -> Result<()> {
        self.astrometry_api_key = Some(key);
        self.save()
    }

    /// 測光エンジンへ渡す設定
    pub fn engine_settings(&self) -> EngineSettings {
        EngineSettings {
            use_bias: self.use_bias,
            console_print: self.console_print,
            astrometry_api_key: self.astrometry_api_key(),
            astrometry_timeout_seconds: self.astrometry_timeout_seconds,
        }
    }
}
