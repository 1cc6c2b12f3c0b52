//! 最適化履歴
//!
//! メインのワークフローとは独立した補助パネル。取得に失敗しても
//! 空の一覧とログだけで済ませ、ユーザーには通知しない。

use crate::client::TransferClient;
use chrono::{DateTime, NaiveDateTime};
use salon_optimizer_common::{HistoryEntry, ResultsLink};

/// 表示する件数
pub const HISTORY_DISPLAY_LIMIT: usize = 5;

/// 履歴の読み込みと保持（最後に取得したものが有効）
#[derive(Debug, Clone)]
pub struct HistoryLoader {
    limit: Option<usize>,
    entries: Vec<HistoryEntry>,
}

impl Default for HistoryLoader {
    fn default() -> Self {
        Self {
            limit: Some(HISTORY_DISPLAY_LIMIT),
            entries: Vec::new(),
        }
    }
}

impl HistoryLoader {
    pub fn new() -> Self {
        Self::default()
    }

    /// 件数制限なし
    pub fn unlimited() -> Self {
        Self {
            limit: None,
            entries: Vec::new(),
        }
    }

    /// 履歴を取得。受信順（新しい順）のまま先頭から制限件数まで
    pub async fn load<C: TransferClient>(&mut self, client: &C) -> &[HistoryEntry] {
        self.entries = match client.fetch_history().await {
            Ok(mut entries) => {
                if let Some(limit) = self.limit {
                    entries.truncate(limit);
                }
                tracing::debug!(count = entries.len(), "履歴を読み込み");
                entries
            }
            Err(e) => {
                tracing::warn!(error = %e, "履歴の取得に失敗");
                Vec::new()
            }
        };
        &self.entries
    }

    pub fn entries(&self) -> &[HistoryEntry] {
        &self.entries
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// 結果画面への遷移先
pub fn results_link(entry: &HistoryEntry) -> ResultsLink {
    ResultsLink::from(entry)
}

/// 一覧表示用の日付（例: 2/5/2024）。解釈できなければ元の文字列
pub fn date_label(timestamp: &str) -> String {
    parse_timestamp(timestamp)
        .map(|dt| dt.format("%-d/%-m/%Y").to_string())
        .unwrap_or_else(|| timestamp.to_string())
}

fn parse_timestamp(timestamp: &str) -> Option<NaiveDateTime> {
    let timestamp = timestamp.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(timestamp) {
        return Some(dt.naive_local());
    }

    ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"]
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(timestamp, fmt).ok())
}
