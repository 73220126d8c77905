//! 外部コマンド版の測光エンジン
//!
//! `<program> <args...> --ra .. --dec .. --science .. --dark .. --bias "" --flat .. --settings <json>`
//! を実行し、標準出力のJSON（`{"magnitude", "error", "referenceStars"}`）を読む。

use super::{EngineSettings, PhotometryEngine, PhotometryOutput, PhotometryRequest};
use crate::error::{PhotometryError, Result};
use std::ffi::OsString;
use std::process::Stdio;
use tokio::process::Command;
use tracing::debug;

#[derive(Debug, Clone)]
pub struct CommandPhotometryEngine {
    program: String,
    args: Vec<String>,
    settings: EngineSettings,
}

impl CommandPhotometryEngine {
    pub fn new(program: impl Into<String>, args: Vec<String>, settings: EngineSettings) -> Self {
        Self {
            program: program.into(),
            args,
            settings,
        }
    }

    pub fn settings(&self) -> &EngineSettings {
        &self.settings
    }

    fn command_args(&self, request: &PhotometryRequest) -> Result<Vec<OsString>> {
        let settings = serde_json::to_string(&self.settings)?;
        let mut args: Vec<OsString> = self.args.iter().map(OsString::from).collect();
        args.extend([
            "--ra".into(),
            request.ra.to_string().into(),
            "--dec".into(),
            request.dec.to_string().into(),
            "--science".into(),
            request.science.as_os_str().to_owned(),
            "--dark".into(),
            request.dark.as_os_str().to_owned(),
            "--bias".into(),
            request.bias.as_os_str().to_owned(),
            "--flat".into(),
            request.flat.as_os_str().to_owned(),
            "--settings".into(),
            settings.into(),
        ]);
        Ok(args)
    }
}

impl PhotometryEngine for CommandPhotometryEngine {
    async fn run(&self, request: &PhotometryRequest) -> Result<PhotometryOutput> {
        let failure = |reason: String| PhotometryError::PhotometryFailure {
            path: request.science.display().to_string(),
            reason,
        };

        let args = self.command_args(request)?;
        debug!("測光エンジン実行: {} {:?}", self.program, args);

        // タイムアウトでfutureが破棄されたら子プロセスも終了させる
        let output = Command::new(&self.program)
            .args(&args)
            .stdin(Stdio::null())
            .kill_on_drop(true)
            .output()
            .await
            .map_err(|e| failure(format!("エンジン起動エラー ({}): {}", self.program, e)))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(failure(format!(
                "終了コード {:?}: {}",
                output.status.code(),
                stderr.trim()
            )));
        }

        let stdout = String::from_utf8_lossy(&output.stdout);
        parse_output(&stdout).map_err(failure)
    }
}

/// 標準出力から最後のJSONオブジェクトを取り出す（ログ行が混じることがある）
fn parse_output(stdout: &str) -> std::result::Result<PhotometryOutput, String> {
    let start = stdout
        .find('{')
        .ok_or_else(|| "エンジン出力にJSONがありません".to_string())?;
    let end = stdout
        .rfind('}')
        .ok_or_else(|| "エンジン出力にJSONがありません".to_string())?;
    if end < start {
        return Err("エンジン出力のJSONが不正です".to_string());
    }

    serde_json::from_str(&stdout[start..=end])
        .map_err(|e| format!("エンジン出力のJSONパースエラー: {}", e))
}
