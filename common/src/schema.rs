//! 必須フィールドと最適化手法の定義
//!
//! 列検出サービスが返すマッピングのキーはここで定義した順序で扱う。

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// 必須フィールド（レビュー表示順）
pub const REQUIRED_FIELDS: &[&str] = &[
    "Grupo",
    "Materia",
    "Dia",
    "Hora",
    "Salon",
    "Profesor",
    "Tipo_Salon",
];

/// 最適化に欠かせないフィールド（Profesor / Tipo_Salon はサーバー側で補完される）
pub const MANDATORY_FIELDS: &[&str] = &["Grupo", "Materia", "Dia", "Hora", "Salon"];

pub fn is_required_field(field: &str) -> bool {
    REQUIRED_FIELDS.contains(&field)
}

pub fn is_mandatory_field(field: &str) -> bool {
    MANDATORY_FIELDS.contains(&field)
}

/// 最適化手法
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OptimizationMethod {
    /// 貪欲法 + 山登り（デフォルト）
    #[default]
    Greedy,
    /// 機械学習
    Ml,
    /// 遺伝的アルゴリズム
    Genetic,
}

impl OptimizationMethod {
    pub const ALL: [OptimizationMethod; 3] = [
        OptimizationMethod::Greedy,
        OptimizationMethod::Ml,
        OptimizationMethod::Genetic,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            OptimizationMethod::Greedy => "greedy",
            OptimizationMethod::Ml => "ml",
            OptimizationMethod::Genetic => "genetic",
        }
    }
}

impl FromStr for OptimizationMethod {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        OptimizationMethod::ALL
            .into_iter()
            .find(|m| m.as_str() == s.trim())
            .ok_or_else(|| Error::UnknownMethod(s.to_string()))
    }
}

impl fmt::Display for OptimizationMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
