//! 信頼度の3段階分類
//!
//! 表示色とワークフロー上の確認要否の判断は、すべてここの分類を使う。
//! 全体信頼度とフィールド別信頼度で同じ閾値を使用する。

use serde::{Deserialize, Deserializer, Serialize};

/// High とみなす下限
pub const HIGH_THRESHOLD: u8 = 80;
/// Medium とみなす下限
pub const MEDIUM_THRESHOLD: u8 = 60;

/// 信頼度区分
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConfidenceTier {
    High,
    Medium,
    Low,
}

impl ConfidenceTier {
    /// スコア(0-100)を分類
    pub fn classify(score: u8) -> Self {
        if score >= HIGH_THRESHOLD {
            ConfidenceTier::High
        } else if score >= MEDIUM_THRESHOLD {
            ConfidenceTier::Medium
        } else {
            ConfidenceTier::Low
        }
    }

    /// 表示用バッジ名
    pub fn badge(&self) -> &'static str {
        match self {
            ConfidenceTier::High => "success",
            ConfidenceTier::Medium => "warning",
            ConfidenceTier::Low => "danger",
        }
    }

    /// 先に進む前にユーザー確認が必要か
    pub fn needs_review(&self) -> bool {
        !matches!(self, ConfidenceTier::High)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ConfidenceTier::High => "high",
            ConfidenceTier::Medium => "medium",
            ConfidenceTier::Low => "low",
        }
    }
}

impl std::fmt::Display for ConfidenceTier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// `ConfidenceTier::classify` の関数版
pub fn classify(score: u8) -> ConfidenceTier {
    ConfidenceTier::classify(score)
}

/// 任意のJSON数値を0-100の整数スコアに正規化
///
/// 検出サービスは全体信頼度を小数1桁で返す。切り捨てなので
/// `normalize_score(x) >= 80` と `x >= 80` は常に一致し、段階は変わらない。
pub fn normalize_score(value: f64) -> u8 {
    if value.is_nan() {
        return 0;
    }
    value.floor().clamp(0.0, 100.0) as u8
}

/// serde用: 数値（整数/小数）をスコアとして読み込む
pub fn deserialize_score<'de, D>(deserializer: D) -> Result<u8, D::Error>
where
    D: Deserializer<'de>,
{
    let value = f64::deserialize(deserializer)?;
    Ok(normalize_score(value))
}
