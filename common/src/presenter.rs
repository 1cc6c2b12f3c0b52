//! 検出結果をレビュー用の構造に変換する
//!
//! 表示（テーブル、テキスト、JSON）は呼び出し側の責務。
//! ここでは信頼度区分まで確定させ、表示側で再計算しなくて済むようにする。

use crate::confidence::ConfidenceTier;
use crate::schema::{is_mandatory_field, REQUIRED_FIELDS};
use crate::types::DetectionResult;
use serde::Serialize;

/// 列の検出状態
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", content = "column", rename_all = "snake_case")]
pub enum DetectedColumn {
    Detected(String),
    NotDetected,
}

impl DetectedColumn {
    pub fn as_option(&self) -> Option<&str> {
        match self {
            DetectedColumn::Detected(c) => Some(c),
            DetectedColumn::NotDetected => None,
        }
    }

    pub fn label(&self) -> &str {
        match self {
            DetectedColumn::Detected(c) => c,
            DetectedColumn::NotDetected => "No detectado",
        }
    }
}

/// スコアと区分の組
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ScoredTier {
    pub score: u8,
    pub tier: ConfidenceTier,
}

impl ScoredTier {
    pub fn new(score: u8) -> Self {
        Self {
            score,
            tier: ConfidenceTier::classify(score),
        }
    }
}

/// レビュー表の1行
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReviewRow {
    pub field: String,
    pub column: DetectedColumn,
    pub confidence: ScoredTier,
    /// 最適化に必須のフィールドか
    pub mandatory: bool,
}

/// レビュー可能なマッピング
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReviewableMapping {
    pub total: ScoredTier,
    pub rows: Vec<ReviewRow>,
}

impl ReviewableMapping {
    /// 確認なしで先に進めない状態か
    ///
    /// 全体信頼度が High 未満、または必須フィールドが未検出の場合。
    pub fn needs_review(&self) -> bool {
        self.total.tier.needs_review() || !self.undetected_mandatory().is_empty()
    }

    pub fn undetected_mandatory(&self) -> Vec<&str> {
        self.rows
            .iter()
            .filter(|r| r.mandatory && r.column == DetectedColumn::NotDetected)
            .map(|r| r.field.as_str())
            .collect()
    }

    /// 指定区分の行
    pub fn rows_with_tier(&self, tier: ConfidenceTier) -> impl Iterator<Item = &ReviewRow> {
        self.rows.iter().filter(move |r| r.confidence.tier == tier)
    }
}

/// 検出結果をレビュー構造へ変換
///
/// 行の順序は必須フィールドの定義順。レスポンスに含まれない必須フィールドは
/// 「未検出・信頼度0」として並べ、スキーマ外のフィールドは受信順で末尾に置く。
pub fn present(detection: &DetectionResult) -> ReviewableMapping {
    let mut rows: Vec<ReviewRow> = REQUIRED_FIELDS
        .iter()
        .map(|field| build_row(detection, field))
        .collect();

    rows.extend(
        detection
            .mapping
            .fields()
            .filter(|field| !REQUIRED_FIELDS.contains(field))
            .map(|field| build_row(detection, field)),
    );

    ReviewableMapping {
        total: ScoredTier::new(detection.total_confidence),
        rows,
    }
}

fn build_row(detection: &DetectionResult, field: &str) -> ReviewRow {
    let column = match detection.mapping.column(field) {
        Some(c) => DetectedColumn::Detected(c.to_string()),
        None => DetectedColumn::NotDetected,
    };

    ReviewRow {
        field: field.to_string(),
        column,
        confidence: ScoredTier::new(detection.confidence_for(field)),
        mandatory: is_mandatory_field(field),
    }
}
