use serde::Serialize;

use crate::reliability::SupplierScoreRecord;

/// Ranked scoreboard handed to the UI.
/// `NoData` lets the page show a placeholder instead of an empty chart.
#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum ScoreBoard {
    Scored {
        top: Vec<SupplierScoreRecord>,
        bottom: Vec<SupplierScoreRecord>,
        all: Vec<SupplierScoreRecord>,
    },
    NoData,
}

/// Stable sort by order count, highest first
pub fn rank(mut records: Vec<SupplierScoreRecord>) -> Vec<SupplierScoreRecord> {
    records.sort_by(|a, b| b.order_count.cmp(&a.order_count));
    records
}

/// Top and bottom `n` of the ranked list.
///
/// bottom は単純に末尾 n 件。件数が n+1..=2n のときは top と重複しうる。
/// 件数が n 以下なら bottom は空。
pub fn build_scoreboard(records: Vec<SupplierScoreRecord>, n: usize) -> ScoreBoard {
    if records.is_empty() {
        return ScoreBoard::NoData;
    }

    let all = rank(records);
    let top = all.iter().take(n).cloned().collect();
    let bottom = if all.len() > n {
        all[all.len() - n..].to_vec()
    } else {
        Vec::new()
    };

    ScoreBoard::Scored { top, bottom, all }
}
