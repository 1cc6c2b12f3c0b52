//! 教室割当最適化クライアント
//!
//! Excelのアップロード、列検出結果の確認、最適化の起動、履歴参照を行う。
//! 純粋な型と変換は `salon_optimizer_common` にある。

pub mod cli;
pub mod client;
pub mod config;
pub mod error;
pub mod history;
pub mod render;
pub mod spreadsheet;
pub mod workflow;

pub use client::{HttpTransferClient, TransferClient};
pub use error::{ErrorClass, OptimizerError, Result};
pub use history::HistoryLoader;
pub use workflow::{Session, Stage};
