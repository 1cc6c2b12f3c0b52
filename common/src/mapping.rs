//! フィールド→列マッピング
//!
//! JSONオブジェクトとして読み書きするが、キーの順序は受信順・挿入順を保つ。
//! 最適化リクエストの `column_mapping` に同じ順序でそのまま載せるため。

use crate::confidence::normalize_score;
use crate::error::{Error, Result};
use crate::schema::{is_required_field, MANDATORY_FIELDS};
use indexmap::IndexMap;
use serde::{Deserialize, Deserializer, Serialize};
use std::collections::HashMap;

/// 必須フィールド名 → 検出列名（未検出は None）
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ColumnMapping(IndexMap<String, Option<String>>);

impl ColumnMapping {
    pub fn new() -> Self {
        Self::default()
    }

    /// 追加。既存フィールドなら位置を保ったまま置き換える
    pub fn insert(&mut self, field: impl Into<String>, column: Option<String>) {
        self.0.insert(field.into(), column);
    }

    /// フィールドが含まれているか（未検出でも true）
    pub fn contains_field(&self, field: &str) -> bool {
        self.0.contains_key(field)
    }

    /// 割り当て済みの列名
    pub fn column(&self, field: &str) -> Option<&str> {
        self.0.get(field).and_then(|c| c.as_deref())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, Option<&str>)> {
        self.0.iter().map(|(f, c)| (f.as_str(), c.as_deref()))
    }

    pub fn fields(&self) -> impl Iterator<Item = &str> {
        self.0.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// 列が割り当てられていない最適化必須フィールド
    pub fn missing_mandatory(&self) -> Vec<&'static str> {
        MANDATORY_FIELDS
            .iter()
            .copied()
            .filter(|field| self.column(field).is_none())
            .collect()
    }

    /// ユーザーによる手動修正
    ///
    /// `known_columns` が空でなければ、列はその中に存在しなければならない。
    pub fn assign(
        &mut self,
        field: &str,
        column: Option<String>,
        known_columns: &[String],
    ) -> Result<()> {
        if !self.contains_field(field) && !is_required_field(field) {
            return Err(Error::UnknownField(field.to_string()));
        }

        if let Some(col) = &column {
            if !known_columns.is_empty() && !known_columns.iter().any(|c| c == col) {
                return Err(Error::UnknownColumn {
                    field: field.to_string(),
                    column: col.clone(),
                });
            }
        }

        self.insert(field, column);
        Ok(())
    }
}

impl<F, C> FromIterator<(F, Option<C>)> for ColumnMapping
where
    F: Into<String>,
    C: Into<String>,
{
    fn from_iter<I: IntoIterator<Item = (F, Option<C>)>>(iter: I) -> Self {
        Self(
            iter.into_iter()
                .map(|(field, column)| (field.into(), column.map(Into::into)))
                .collect(),
        )
    }
}

/// フィールド別信頼度（0-100）
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct FieldConfidence(HashMap<String, u8>);

impl FieldConfidence {
    pub fn get(&self, field: &str) -> Option<u8> {
        self.0.get(field).copied()
    }

    pub fn insert(&mut self, field: impl Into<String>, score: u8) {
        self.0.insert(field.into(), score.min(100));
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl<'de> Deserialize<'de> for FieldConfidence {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let raw = HashMap::<String, f64>::deserialize(deserializer)?;
        Ok(FieldConfidence(
            raw.into_iter()
                .map(|(field, score)| (field, normalize_score(score)))
                .collect(),
        ))
    }
}

impl<F: Into<String>> FromIterator<(F, u8)> for FieldConfidence {
    fn from_iter<I: IntoIterator<Item = (F, u8)>>(iter: I) -> Self {
        let mut confidence = FieldConfidence::default();
        for (field, score) in iter {
            confidence.insert(field, score);
        }
        confidence
    }
}
