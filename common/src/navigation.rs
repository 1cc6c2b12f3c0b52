//! 結果画面への遷移先

use crate::types::{HistoryEntry, OptimizationResultRef};
use std::fmt;
use url::form_urlencoded;

/// 結果画面のリンク（`<base>/results?id=<id>`）
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResultsLink {
    pub id: String,
}

impl ResultsLink {
    pub fn new(id: impl Into<String>) -> Self {
        Self { id: id.into() }
    }

    pub fn url(&self, base_url: &str) -> String {
        format!("{}{}", base_url.trim_end_matches('/'), self)
    }

    /// クエリ値としてエンコードしたID
    fn encoded_id(&self) -> String {
        form_urlencoded::byte_serialize(self.id.as_bytes()).collect()
    }
}

impl From<&OptimizationResultRef> for ResultsLink {
    fn from(result: &OptimizationResultRef) -> Self {
        Self::new(result.id.clone())
    }
}

impl From<&HistoryEntry> for ResultsLink {
    fn from(entry: &HistoryEntry) -> Self {
        Self::new(entry.id.clone())
    }
}

impl fmt::Display for ResultsLink {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "/results?id={}", self.encoded_id())
    }
}
