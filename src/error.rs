use thiserror::Error;

/// エラーの分類
///
/// 呼び出し側はこの分類でリトライ可否や表示方法を決める。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorClass {
    /// ローカルで検出できる入力不備（ファイル形式・サイズ、未知の手法、不正なマッピング）
    Validation,
    /// 状態遷移の前提条件違反
    Precondition,
    /// 通信失敗（構造化されたレスポンスなし）
    Network,
    /// サーバーが返した構造化エラー
    Server,
    /// 設定・ファイル入出力など
    Internal,
}

#[derive(Error, Debug)]
pub enum OptimizerError {
    #[error("ファイルが不正です: {0}")]
    InvalidFile(String),

    #[error("不明な最適化手法です: {0}（greedy / ml / genetic）")]
    UnknownMethod(String),

    #[error("マッピングが不正です: {0}")]
    InvalidMapping(String),

    #[error("サーバーがファイルを受け付けませんでした: {0}")]
    Rejected(String),

    #[error("前提条件エラー: {0}")]
    Precondition(String),

    #[error("処理中です（{0}）。完了までお待ちください")]
    Busy(&'static str),

    #[error("通信エラー: {0}")]
    Network(String),

    #[error("{0}")]
    Server(String),

    #[error("設定エラー: {0}")]
    Config(String),

    #[error("入力エラー: {0}")]
    Prompt(String),

    #[error("JSON解析エラー: {0}")]
    JsonParse(#[from] serde_json::Error),

    #[error("IOエラー: {0}")]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Common(#[from] salon_optimizer_common::Error),
}

impl OptimizerError {
    /// 共通ライブラリの入力検証エラーを、対応するバリアントへ振り分ける
    pub fn from_validation(e: salon_optimizer_common::Error) -> Self {
        use salon_optimizer_common::Error as CommonError;

        match e {
            CommonError::InvalidFile(msg) => OptimizerError::InvalidFile(msg),
            CommonError::UnknownMethod(method) => OptimizerError::UnknownMethod(method),
            CommonError::UnknownField(field) => {
                OptimizerError::InvalidMapping(format!("未知のフィールド: {}", field))
            }
            CommonError::UnknownColumn { field, column } => OptimizerError::InvalidMapping(
                format!("列 '{}' はスプレッドシートに存在しません（{}）", column, field),
            ),
            other => OptimizerError::Common(other),
        }
    }

    pub fn class(&self) -> ErrorClass {
        use salon_optimizer_common::Error as CommonError;

        match self {
            OptimizerError::InvalidFile(_)
            | OptimizerError::UnknownMethod(_)
            | OptimizerError::InvalidMapping(_)
            | OptimizerError::Rejected(_) => ErrorClass::Validation,
            OptimizerError::Precondition(_) | OptimizerError::Busy(_) => ErrorClass::Precondition,
            OptimizerError::Network(_) => ErrorClass::Network,
            OptimizerError::Server(_) => ErrorClass::Server,
            OptimizerError::Common(CommonError::Json(_)) => ErrorClass::Internal,
            OptimizerError::Common(_) => ErrorClass::Validation,
            OptimizerError::Config(_)
            | OptimizerError::Prompt(_)
            | OptimizerError::JsonParse(_)
            | OptimizerError::Io(_) => {
                ErrorClass::Internal
            }
        }
    }

    /// ユーザー操作で再試行できるか
    pub fn is_retryable(&self) -> bool {
        matches!(self.class(), ErrorClass::Network | ErrorClass::Server)
    }
}

impl From<reqwest::Error> for OptimizerError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_decode() {
            OptimizerError::Server(format!("レスポンスの解析に失敗しました: {}", e))
        } else {
            OptimizerError::Network(e.to_string())
        }
    }
}

pub type Result<T> = std::result::Result<T, OptimizerError>;
