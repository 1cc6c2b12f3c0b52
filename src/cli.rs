use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "salon-opt")]
#[command(about = "教室割当最適化クライアント（Excel列検出→最適化→結果）", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// 詳細ログを出力
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// 接続先サーバー（設定ファイルより優先）
    #[arg(long, global = true)]
    pub server: Option<String>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// アップロード→列検出の確認→最適化を一括実行
    Run {
        /// Excelファイル (.xlsx / .xls)
        #[arg(required = true)]
        file: PathBuf,

        /// 最適化手法 (greedy/ml/genetic)
        #[arg(short, long)]
        method: Option<String>,

        /// マッピングを修正（例: --map Salon=Aula、未割当は --map Profesor=）
        #[arg(long = "map", value_name = "FIELD=COLUMN")]
        map: Vec<MappingEdit>,

        /// 信頼度が低くても確認せずに進める
        #[arg(short, long)]
        yes: bool,

        /// 履歴を表示しない
        #[arg(long)]
        no_history: bool,
    },

    /// アップロードして列検出結果だけを表示
    Detect {
        /// Excelファイル (.xlsx / .xls)
        #[arg(required = true)]
        file: PathBuf,

        /// JSONで出力
        #[arg(long)]
        json: bool,
    },

    /// 最適化履歴を表示
    History {
        /// 全件表示（デフォルトは最新5件）
        #[arg(long)]
        all: bool,

        /// JSONで出力
        #[arg(long)]
        json: bool,
    },

    /// 保存済みの最適化結果を表示
    Show {
        /// 結果ID
        #[arg(required = true)]
        id: String,
    },

    /// 設定を表示/編集
    Config {
        /// 接続先サーバーを設定
        #[arg(long)]
        set_server: Option<String>,

        /// 設定を表示
        #[arg(long)]
        show: bool,
    },
}

/// `FIELD=COLUMN` 形式のマッピング修正
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MappingEdit {
    pub field: String,
    pub column: Option<String>,
}

impl std::str::FromStr for MappingEdit {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (field, column) = s
            .split_once('=')
            .ok_or_else(|| format!("FIELD=COLUMN の形式で指定してください: {}", s))?;

        let field = field.trim();
        if field.is_empty() {
            return Err(format!("フィールド名が空です: {}", s));
        }

        let column = column.trim();
        Ok(MappingEdit {
            field: field.to_string(),
            column: (!column.is_empty()).then(|| column.to_string()),
        })
    }
}
