//! エラー型定義

use thiserror::Error;

/// 共通エラー型
///
/// いずれもネットワークに出る前にローカルで検出できるもの。
#[derive(Error, Debug)]
pub enum Error {
    #[error("Invalid file: {0}")]
    InvalidFile(String),

    #[error("Unknown optimization method: {0}")]
    UnknownMethod(String),

    #[error("Unknown field: {0}")]
    UnknownField(String),

    #[error("Column '{column}' does not exist in the spreadsheet (field {field})")]
    UnknownColumn { field: String, column: String },

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Result型エイリアス
pub type Result<T> = std::result::Result<T, Error>;
