use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "photometry")]
#[command(about = "FITSフレーム索引・校正フレーム照合・一括測光ツール", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// 詳細ログを出力
    #[arg(short, long, global = true)]
    pub verbose: bool,
}

#[derive(Subcommand)]
pub enum Commands {
    /// ディレクトリのFITS索引（index.csv）を作成・更新
    Index {
        /// FITSディレクトリ
        #[arg(required = true)]
        directory: PathBuf,

        /// 既存索引を捨てて作り直す（RANはすべてFalse）
        #[arg(long)]
        clean: bool,

        /// 索引の概要を表示
        #[arg(long)]
        show: bool,
    },

    /// 1ファイルを測光
    Run {
        /// 対象の赤経（度）
        #[arg(allow_negative_numbers = true)]
        ra: f64,

        /// 対象の赤緯（度）
        #[arg(allow_negative_numbers = true)]
        dec: f64,

        /// サイエンスフレーム
        file: PathBuf,

        /// ダークを指定（省略時は自動照合）
        #[arg(long)]
        dark: Option<PathBuf>,

        /// フラットを指定（省略時は自動照合）
        #[arg(long)]
        flat: Option<PathBuf>,

        /// 結果テーブルに保存し、索引のRANを更新
        #[arg(short, long)]
        save: bool,

        /// 結果テーブル（デフォルト: 出力先/<OBJECT>.csv）
        #[arg(short, long)]
        output_file: Option<PathBuf>,
    },

    /// 1ディレクトリの未処理フレームを一括測光
    Bulk {
        /// 対象の赤経（度）
        #[arg(allow_negative_numbers = true)]
        ra: f64,

        /// 対象の赤緯（度）
        #[arg(allow_negative_numbers = true)]
        dec: f64,

        /// FITSディレクトリ
        directory: PathBuf,

        /// WCSの無いフレームも処理する（位置天文解析を伴う）
        #[arg(long)]
        ignore_wcs: bool,

        /// 処理済みフレームも再処理する
        #[arg(long)]
        run_all: bool,

        /// 天体名（デフォルト: ディレクトリ名）
        #[arg(short, long)]
        name: Option<String>,
    },

    /// ターゲットリストの全天体を一括測光
    Targets {
        /// ターゲットリスト（Source_name, RA, Dec）
        #[arg(required = true)]
        list: PathBuf,

        /// 天体ディレクトリの親（デフォルト: 設定の star_dir）
        #[arg(long)]
        star_dir: Option<PathBuf>,

        /// WCSの無いフレームも処理する
        #[arg(long)]
        ignore_wcs: bool,

        /// 処理済みフレームも再処理する
        #[arg(long)]
        run_all: bool,
    },

    /// 結果テーブルから光度曲線を描画
    Plot {
        /// 結果テーブル（デフォルト: 出力先/output.csv）
        input: Option<PathBuf>,

        /// 出力PNG（デフォルト: 入力と同名の .png）
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// グラフのタイトル（デフォルト: 入力のファイル名）
        #[arg(short, long)]
        title: Option<String>,
    },

    /// 設定を表示/編集
    Config {
        /// astrometry.net のAPIキーを設定
        #[arg(long)]
        set_api_key: Option<String>,

        /// 設定を表示
        #[arg(long)]
        show: bool,
    },
}
