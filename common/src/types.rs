//! 通信で扱う型の定義
//!
//! - DetectionResult: 列検出サービスの出力
//! - OptimizationRequest: 最適化ジョブの起動要求
//! - OptimizationResultRef: 結果画面へ遷移するための不透明ID
//! - HistoryEntry: 過去の最適化実行
//!
//! フィールド名はサーバーAPIに合わせる（snake_case / スペイン語）。

use crate::confidence::deserialize_score;
use crate::mapping::{ColumnMapping, FieldConfidence};
use crate::schema::OptimizationMethod;
use serde::{Deserialize, Deserializer, Serialize};

/// 列検出結果
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DetectionResult {
    /// 全体信頼度 (0-100)
    #[serde(deserialize_with = "deserialize_score")]
    pub total_confidence: u8,

    pub mapping: ColumnMapping,

    /// フィールド別信頼度 (0-100)
    #[serde(default)]
    pub confidence: FieldConfidence,

    /// スプレッドシートの列名一覧
    #[serde(default)]
    pub columns: Vec<String>,

    /// 先頭数行のプレビュー
    #[serde(default)]
    pub preview: Vec<serde_json::Value>,

    #[serde(default)]
    pub total_rows: Option<u64>,
}

impl DetectionResult {
    /// フィールドの信頼度。値がなければ 0 とみなす
    pub fn confidence_for(&self, field: &str) -> u8 {
        self.confidence.get(field).unwrap_or(0)
    }
}

/// アップロード成功時にサーバーから受け取る内容
#[derive(Debug, Clone, Default, PartialEq)]
pub struct UploadReceipt {
    /// サーバー側で正規化されたファイル名
    pub filename: Option<String>,
    /// サーバー側の保存パス
    pub filepath: Option<String>,
    pub detection: DetectionResult,
}

/// 最適化要求（送信後は変更しない）
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OptimizationRequest {
    pub filepath: String,
    pub method: OptimizationMethod,
    pub column_mapping: ColumnMapping,
}

/// 最適化結果への参照
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OptimizationResultRef {
    #[serde(deserialize_with = "deserialize_opaque_id")]
    pub id: String,
}

/// 履歴の指標1項目
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MetricFigure {
    #[serde(default)]
    pub inicial: f64,
    #[serde(default)]
    pub optimizado: f64,
    #[serde(default)]
    pub mejora: f64,
    /// 改善率(%)
    pub mejora_pct: f64,
}

/// 履歴の指標
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct HistoryMetrics {
    /// 移動距離（必須）
    pub distancia: MetricFigure,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub invalidos: Option<MetricFigure>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub movimientos: Option<MetricFigure>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cambios_piso: Option<MetricFigure>,
}

/// 過去の最適化実行
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct HistoryEntry {
    #[serde(deserialize_with = "deserialize_opaque_id")]
    pub id: String,
    pub filename: String,
    /// ISO-8601 または `YYYY-MM-DD HH:MM:SS`
    pub timestamp: String,
    pub method: String,
    pub metrics: HistoryMetrics,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub elapsed_time: Option<f64>,
}

impl HistoryEntry {
    /// 距離の改善率(%)
    pub fn improvement_pct(&self) -> f64 {
        self.metrics.distancia.mejora_pct
    }
}

/// `POST /api/upload` のレスポンス
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UploadResponse {
    #[serde(default)]
    pub success: bool,
    #[serde(default)]
    pub filename: Option<String>,
    #[serde(default)]
    pub filepath: Option<String>,
    #[serde(default)]
    pub detection: Option<DetectionResult>,
    #[serde(default)]
    pub error: Option<String>,
}

/// `POST /api/optimize` のレスポンス
#[derive(Debug, Clone, Default, Deserialize)]
pub struct OptimizeResponse {
    #[serde(default)]
    pub success: bool,
    #[serde(default)]
    pub result: Option<OptimizationResultRef>,
    #[serde(default)]
    pub error: Option<String>,
}

/// `GET /api/history` のレスポンス
#[derive(Debug, Clone, Default, Deserialize)]
pub struct HistoryResponse {
    #[serde(default)]
    pub success: bool,
    #[serde(default)]
    pub history: Vec<HistoryEntry>,
    #[serde(default)]
    pub error: Option<String>,
}

/// 数値・文字列どちらのIDも文字列として受け取る
pub fn deserialize_opaque_id<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum RawId {
        Text(String),
        Number(serde_json::Number),
    }

    Ok(match RawId::deserialize(deserializer)? {
        RawId::Text(s) => s,
        RawId::Number(n) => n.to_string(),
    })
}
