//! reqwestによる実装

use super::TransferClient;
use crate::config::Config;
use crate::error::{OptimizerError, Result};
use reqwest::multipart::{Form, Part};
use reqwest::StatusCode;
use salon_optimizer_common::types::{HistoryResponse, OptimizeResponse, UploadResponse};
use salon_optimizer_common::{
    HistoryEntry, OptimizationRequest, OptimizationResultRef, UploadReceipt, UploadedFile,
};
use serde::de::DeserializeOwned;
use std::time::Duration;

const USER_AGENT: &str = concat!("salon-optimizer/", env!("CARGO_PKG_VERSION"));

/// HTTP通信クライアント
#[derive(Debug, Clone)]
pub struct HttpTransferClient {
    http: reqwest::Client,
    base_url: String,
}

impl HttpTransferClient {
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Result<Self> {
        let http = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .timeout(timeout)
            .build()
            .map_err(|e| OptimizerError::Config(format!("HTTPクライアントを作成できません: {}", e)))?;

        Ok(Self {
            http,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        })
    }

    pub fn from_config(config: &Config) -> Result<Self> {
        Self::new(config.server_url(), Duration::from_secs(config.timeout_seconds))
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// `GET /api/history/<id>`: 保存済みの最適化1件
    pub async fn fetch_optimization(&self, id: &str) -> Result<serde_json::Value> {
        let url = self.endpoint(&format!("/api/history/{}", id));
        tracing::debug!(%url, "最適化結果を取得");

        let response = self.http.get(&url).send().await?;
        let (status, body) = read_envelope::<serde_json::Value>(response).await?;

        match body {
            Some(mut value) if status.is_success() => {
                let optimization = value.get_mut("optimization").map(serde_json::Value::take);
                Ok(optimization.unwrap_or(value))
            }
            other => {
                let message = other
                    .as_ref()
                    .and_then(|v| v.get("error"))
                    .and_then(|e| e.as_str())
                    .map(str::to_string);
                Err(OptimizerError::Server(failure_message(status, message)))
            }
        }
    }
}

impl TransferClient for HttpTransferClient {
    async fn upload(&self, file: &UploadedFile) -> Result<UploadReceipt> {
        let url = self.endpoint("/api/upload");
        tracing::debug!(%url, file = %file.name, size = file.size, "ファイルを送信");

        let part = Part::bytes(file.content.clone())
            .file_name(file.name.clone())
            .mime_str(file.mime_type())?;
        let form = Form::new().part("file", part);

        let response = self.http.post(&url).multipart(form).send().await?;
        let (status, body) = read_envelope::<UploadResponse>(response).await?;
        let body = body.unwrap_or_default();

        if status.is_success() && body.success {
            let detection = body.detection.ok_or_else(|| {
                OptimizerError::Server("レスポンスに検出結果が含まれていません".into())
            })?;
            tracing::debug!(
                total_confidence = detection.total_confidence,
                fields = detection.mapping.len(),
                "列検出結果を受信"
            );
            return Ok(UploadReceipt {
                filename: body.filename,
                filepath: body.filepath,
                detection,
            });
        }

        let message = failure_message(status, body.error);
        if status.is_client_error() {
            Err(OptimizerError::Rejected(message))
        } else {
            Err(OptimizerError::Server(message))
        }
    }

    async fn start_optimization(&self, request: &OptimizationRequest) -> Result<OptimizationResultRef> {
        let url = self.endpoint("/api/optimize");
        tracing::debug!(%url, method = %request.method, filepath = %request.filepath, "最適化を開始");

        let response = self.http.post(&url).json(request).send().await?;
        let (status, body) = read_envelope::<OptimizeResponse>(response).await?;
        let body = body.unwrap_or_default();

        match body.result {
            Some(result) if status.is_success() && body.success => Ok(result),
            _ => Err(OptimizerError::Server(failure_message(status, body.error))),
        }
    }

    async fn fetch_history(&self) -> Result<Vec<HistoryEntry>> {
        let url = self.endpoint("/api/history");
        tracing::debug!(%url, "履歴を取得");

        let response = self.http.get(&url).send().await?;
        let (status, body) = read_envelope::<HistoryResponse>(response).await?;
        let body = body.unwrap_or_default();

        if status.is_success() && body.success {
            Ok(body.history)
        } else {
            Err(OptimizerError::Server(failure_message(status, body.error)))
        }
    }
}

/// ステータスとJSONボディを読む
///
/// 成功ステータスでボディがJSONとして読めない場合はサーバーエラー。
/// 失敗ステータスの場合は `error` だけでも拾えるように再解析する。
async fn read_envelope<T: DeserializeOwned>(
    response: reqwest::Response,
) -> Result<(StatusCode, Option<T>)> {
    let status = response.status();
    let bytes = response.bytes().await?;

    match serde_json::from_slice::<T>(&bytes) {
        Ok(body) => Ok((status, Some(body))),
        Err(e) if status.is_success() => Err(OptimizerError::Server(format!(
            "レスポンスの解析に失敗しました: {}",
            e
        ))),
        Err(_) => {
            tracing::debug!(%status, "エラーレスポンスが想定外の形式");
            Ok((status, None))
        }
    }
}

/// サーバーのエラーメッセージ、なければHTTPステータスから作る
fn failure_message(status: StatusCode, error: Option<String>) -> String {
    match error.filter(|e| !e.trim().is_empty()) {
        Some(message) => message,
        None if status.is_success() => "サーバーが処理の失敗を返しました".to_string(),
        None => format!("サーバーエラー (HTTP {})", status.as_u16()),
    }
}
