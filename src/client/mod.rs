//! サーバーとの通信
//!
//! 3つの操作（アップロード、最適化開始、履歴取得）を提供し、
//! 成功/失敗を `Result` に正規化する。ローカル状態は変更しない。

mod http;

pub use http::HttpTransferClient;

use crate::error::Result;
use salon_optimizer_common::{
    HistoryEntry, OptimizationRequest, OptimizationResultRef, UploadReceipt, UploadedFile,
};

/// 通信クライアント
///
/// ワークフローはこのトレイト越しに通信するため、テストでは差し替えられる。
/// 自動リトライは行わない（再試行はユーザー操作）。
#[allow(async_fn_in_trait)]
pub trait TransferClient {
    /// `POST /api/upload`: ファイルを送信し列検出結果を受け取る
    async fn upload(&self, file: &UploadedFile) -> Result<UploadReceipt>;

    /// `POST /api/optimize`: 最適化ジョブを1回だけ起動する
    async fn start_optimization(&self, request: &OptimizationRequest) -> Result<OptimizationResultRef>;

    /// `GET /api/history`: 新しい順の履歴
    async fn fetch_history(&self) -> Result<Vec<HistoryEntry>>;
}
