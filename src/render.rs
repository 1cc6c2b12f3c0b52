//! 端末向けの表示
//!
//! レビュー構造・履歴をテキストにするだけで、判定ロジックは持たない。

use crate::history::{date_label, results_link};
use salon_optimizer_common::{ConfidenceTier, HistoryEntry, ReviewableMapping};

fn tier_mark(tier: ConfidenceTier) -> &'static str {
    match tier {
        ConfidenceTier::High => "🟢",
        ConfidenceTier::Medium => "🟡",
        ConfidenceTier::Low => "🔴",
    }
}

/// 列検出結果の表
pub fn review_lines(review: &ReviewableMapping) -> Vec<String> {
    let mut lines = vec![format!(
        "{} 全体信頼度: {}% ({})",
        tier_mark(review.total.tier),
        review.total.score,
        review.total.tier
    )];

    let width = review
        .rows
        .iter()
        .map(|r| r.field.chars().count())
        .max()
        .unwrap_or(0);

    for row in &review.rows {
        lines.push(format!(
            "  {} {:<width$}  {:>3}%  {}{}",
            tier_mark(row.confidence.tier),
            row.field,
            row.confidence.score,
            row.column.label(),
            if row.mandatory { "" } else { "  (任意)" },
            width = width
        ));
    }

    lines
}

pub fn print_review(review: &ReviewableMapping) {
    for line in review_lines(review) {
        println!("{}", line);
    }
}

/// 履歴1件の表示
pub fn history_line(entry: &HistoryEntry, base_url: &str) -> String {
    format!(
        "  {}  {:.1}% ↓  {} - {}\n      {}",
        entry.filename,
        entry.improvement_pct(),
        date_label(&entry.timestamp),
        entry.method,
        results_link(entry).url(base_url)
    )
}

pub fn print_history(entries: &[HistoryEntry], base_url: &str) {
    if entries.is_empty() {
        println!("  （履歴はありません）");
        return;
    }
    for entry in entries {
        println!("{}", history_line(entry, base_url));
    }
}
