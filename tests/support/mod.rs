//! テスト用の通信クライアント
//!
//! 応答を事前に設定し、呼び出し回数と送信内容を記録する。

#![allow(dead_code)]

use salon_optimizer::{OptimizerError, Result, TransferClient};
use salon_optimizer_common::{
    DetectionResult, HistoryEntry, OptimizationRequest, OptimizationResultRef, UploadReceipt,
    UploadedFile,
};
use std::cell::{Cell, RefCell};

#[derive(Default)]
pub struct FakeClient {
    pub detection: DetectionResult,
    pub filepath: Option<String>,
    /// Some ならアップロードはこのメッセージでサーバーエラー
    pub upload_error: RefCell<Option<String>>,
    /// Some なら最適化はこのメッセージでサーバーエラー
    pub optimize_error: RefCell<Option<String>>,
    pub result_id: String,
    pub history: Vec<HistoryEntry>,
    pub history_fails: bool,

    pub upload_calls: Cell<usize>,
    pub optimize_calls: Cell<usize>,
    pub history_calls: Cell<usize>,
    pub sent_requests: RefCell<Vec<OptimizationRequest>>,
}

impl FakeClient {
    pub fn with_detection_json(json: &str) -> Self {
        Self {
            detection: serde_json::from_str(json).expect("検出結果JSONが不正"),
            filepath: Some("uploads/horario.xlsx".to_string()),
            result_id: "101".to_string(),
            ..Default::default()
        }
    }

    pub fn network_calls(&self) -> usize {
        self.upload_calls.get() + self.optimize_calls.get()
    }

    pub fn fail_upload(&self, message: &str) {
        *self.upload_error.borrow_mut() = Some(message.to_string());
    }

    pub fn fail_optimize(&self, message: &str) {
        *self.optimize_error.borrow_mut() = Some(message.to_string());
    }

    pub fn recover(&self) {
        *self.upload_error.borrow_mut() = None;
        *self.optimize_error.borrow_mut() = None;
    }
}

impl TransferClient for FakeClient {
    async fn upload(&self, _file: &UploadedFile) -> Result<UploadReceipt> {
        self.upload_calls.set(self.upload_calls.get() + 1);
        if let Some(message) = self.upload_error.borrow().clone() {
            return Err(OptimizerError::Server(message));
        }
        Ok(UploadReceipt {
            filename: None,
            filepath: self.filepath.clone(),
            detection: self.detection.clone(),
        })
    }

    async fn start_optimization(&self, request: &OptimizationRequest) -> Result<OptimizationResultRef> {
        self.optimize_calls.set(self.optimize_calls.get() + 1);
        self.sent_requests.borrow_mut().push(request.clone());
        if let Some(message) = self.optimize_error.borrow().clone() {
            return Err(OptimizerError::Server(message));
        }
        Ok(OptimizationResultRef {
            id: self.result_id.clone(),
        })
    }

    async fn fetch_history(&self) -> Result<Vec<HistoryEntry>> {
        self.history_calls.set(self.history_calls.get() + 1);
        if self.history_fails {
            return Err(OptimizerError::Network("connection refused".to_string()));
        }
        Ok(self.history.clone())
    }
}

/// 履歴エントリ（id は連番）
pub fn history_entries(count: usize) -> Vec<HistoryEntry> {
    (1..=count)
        .rev()
        .map(|i| {
            serde_json::from_value(serde_json::json!({
                "id": i,
                "filename": format!("horario_{}.xlsx", i),
                "timestamp": format!("2024-05-{:02} 09:00:00", i),
                "method": "greedy",
                "metrics": {"distancia": {"mejora_pct": i as f64 * 1.5}}
            }))
            .expect("履歴エントリの生成に失敗")
        })
        .collect()
}

pub fn spreadsheet(name: &str) -> UploadedFile {
    UploadedFile::new(name, b"PK\x03\x04".to_vec())
}
