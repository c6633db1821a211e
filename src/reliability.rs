use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::error::Result;
use crate::store::OrderHistory;

/// Reliability Scorer
///
/// 発注量 (volume) と発注の密度 (consistency) の2軸で supplier を 0-100 点で評価する。
/// - volume: 10件ごとに1点、50点で頭打ち (500件)
/// - consistency: 1日あたり発注数 × 100、50点で頭打ち (0.5件/日)
const VOLUME_CAP: f64 = 50.0;
const CONSISTENCY_CAP: f64 = 50.0;
const SCORE_CAP: f64 = 100.0;
const ORDERS_PER_VOLUME_POINT: f64 = 10.0;
const CONSISTENCY_POINTS_PER_DAILY_ORDER: f64 = 100.0;

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct SupplierScoreRecord {
    pub supplier_name: String,
    pub order_count: u64,
    pub reliability_score: f64,
    pub avg_orders_per_day: f64,
}

/// Count and time bounds of one supplier's orders, built in a single pass
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct OrderSpan {
    pub count: u64,
    pub first: Option<DateTime<Utc>>,
    pub last: Option<DateTime<Utc>>,
}

impl OrderSpan {
    pub fn from_timestamps<I>(stamps: I) -> Self
    where
        I: IntoIterator<Item = DateTime<Utc>>,
    {
        stamps.into_iter().fold(Self::default(), |mut span, ts| {
            span.count += 1;
            span.first = Some(span.first.map_or(ts, |f| f.min(ts)));
            span.last = Some(span.last.map_or(ts, |l| l.max(ts)));
            span
        })
    }

    /// Whole days between the first and last order, floored to 1
    pub fn active_days(&self) -> i64 {
        let range = match (self.first, self.last) {
            (Some(first), Some(last)) => (last - first).num_days(),
            _ => 0,
        };
        range.max(1)
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Score {
    pub volume: f64,
    pub consistency: f64,
    pub reliability: f64,
    pub avg_orders_per_day: f64,
}

/// Unrounded score components for a span
pub fn score_span(span: &OrderSpan) -> Score {
    if span.count == 0 {
        return Score {
            volume: 0.0,
            consistency: 0.0,
            reliability: 0.0,
            avg_orders_per_day: 0.0,
        };
    }

    let count = span.count as f64;
    let avg_orders_per_day = count / span.active_days() as f64;
    let volume = (count / ORDERS_PER_VOLUME_POINT).min(VOLUME_CAP);
    let consistency = (avg_orders_per_day * CONSISTENCY_POINTS_PER_DAILY_ORDER).min(CONSISTENCY_CAP);
    let reliability = (volume + consistency).clamp(0.0, SCORE_CAP);

    Score {
        volume,
        consistency,
        reliability,
        avg_orders_per_day,
    }
}

/// Display record: score rounded to 1 decimal, daily rate to 2
pub fn score_record(supplier_name: &str, span: &OrderSpan) -> SupplierScoreRecord {
    let score = score_span(span);
    SupplierScoreRecord {
        supplier_name: supplier_name.to_string(),
        order_count: span.count,
        reliability_score: round_to(score.reliability, 1),
        avg_orders_per_day: round_to(score.avg_orders_per_day, 2),
    }
}

/// One record per supplier, in the history's supplier order.
/// Lookup failures abort the whole computation.
pub fn score_all<H: OrderHistory + ?Sized>(history: &H) -> Result<Vec<SupplierScoreRecord>> {
    history
        .supplier_names()
        .into_iter()
        .map(|(id, name)| {
            let span = OrderSpan::from_timestamps(history.order_timestamps(id)?);
            Ok(score_record(&name, &span))
        })
        .collect()
}

/// Halves go to the even neighbour: 0.125 → 0.12
fn round_to(value: f64, decimals: i32) -> f64 {
    let factor = 10f64.powi(decimals);
    (value * factor).round_ties_even() / factor
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};

    fn day0() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2017, 3, 1, 9, 30, 0).unwrap()
    }

    /// `count` orders spread evenly over `days` days
    fn spread(count: u64, days: i64) -> OrderSpan {
        let total = days * 86_400;
        let n = count as i64;
        OrderSpan::from_timestamps((0..n).map(|i| {
            let offset = if n > 1 { i * total / (n - 1) } else { 0 };
            day0() + Duration::seconds(offset)
        }))
    }

    #[test]
    fn test_no_orders_scores_zero() {
        let record = score_record("Idle", &OrderSpan::default());
        assert_eq!(record.order_count, 0);
        assert_eq!(record.reliability_score, 0.0);
        assert_eq!(record.avg_orders_per_day, 0.0);
    }

    #[test]
    fn test_same_day_orders() {
        let span = OrderSpan::from_timestamps(vec![day0(), day0(), day0()]);
        assert_eq!(span.active_days(), 1);
        let score = score_span(&span);
        assert_eq!(score.avg_orders_per_day, 3.0);
        assert_eq!(score.consistency, 50.0);
        assert!((score.volume - 0.3).abs() < 1e-9);
        assert_eq!(score_record("Burst", &span).reliability_score, 50.3);
    }

    #[test]
    fn test_single_order() {
        let span = OrderSpan::from_timestamps(vec![day0()]);
        assert_eq!(span.active_days(), 1);
        let record = score_record("Once", &span);
        assert_eq!(record.avg_orders_per_day, 1.0);
        assert_eq!(record.reliability_score, 50.1);
    }

    #[test]
    fn test_daily_rate_rounds_half_to_even() {
        // 2 orders over 16 days = 0.125/day
        let span = OrderSpan::from_timestamps(vec![day0(), day0() + Duration::days(16)]);
        let record = score_record("Sparse", &span);
        assert_eq!(record.avg_orders_per_day, 0.12);
        assert_eq!(record.reliability_score, 12.7);
        assert_eq!(round_to(0.375, 2), 0.38);
    }

    #[test]
    fn test_thousand_orders_over_hundred_days() {
        let span = spread(1000, 100);
        assert_eq!(span.active_days(), 100);
        let record = score_record("Steady", &span);
        assert_eq!(record.avg_orders_per_day, 10.0);
        assert_eq!(record.reliability_score, 100.0);
    }

    #[test]
    fn test_partial_day_span_truncates() {
        // 36 hours apart counts as one whole day
        let span = OrderSpan::from_timestamps(vec![day0(), day0() + Duration::hours(36)]);
        assert_eq!(span.active_days(), 1);
        let span = OrderSpan::from_timestamps(vec![day0(), day0() + Duration::hours(50)]);
        assert_eq!(span.active_days(), 2);
    }

    #[test]
    fn test_volume_cap_at_500() {
        // Long span keeps consistency tiny so volume dominates
        let below = score_span(&spread(499, 100_000));
        assert!((below.volume - 49.9).abs() < 1e-9);
        let at = score_span(&spread(500, 100_000));
        assert_eq!(at.volume, 50.0);
        let above = score_span(&spread(900, 100_000));
        assert_eq!(above.volume, 50.0);
    }

    #[test]
    fn test_consistency_cap_at_half_per_day() {
        let below = score_span(&spread(4, 10));
        assert!((below.consistency - 40.0).abs() < 1e-9);
        let at = score_span(&spread(5, 10));
        assert_eq!(at.consistency, 50.0);
        let above = score_span(&spread(9, 10));
        assert_eq!(above.consistency, 50.0);
    }

    #[test]
    fn test_burst_scores_below_dense_history() {
        // Same volume; the burst over a long quiet span loses consistency
        let sparse = score_span(&spread(20, 400));
        let dense = score_span(&spread(20, 20));
        assert!(sparse.reliability < dense.reliability);
    }

    #[test]
    fn test_score_always_bounded() {
        for count in [0u64, 1, 2, 7, 50, 499, 500, 501, 5_000, 100_000] {
            for days in [0i64, 1, 3, 30, 365, 10_000] {
                let r = score_record("x", &spread(count, days));
                assert!((0.0..=100.0).contains(&r.reliability_score), "{} {} -> {}", count, days, r.reliability_score);
                assert!(r.avg_orders_per_day >= 0.0);
            }
        }
    }

    #[test]
    fn test_span_ignores_input_order() {
        let a = OrderSpan::from_timestamps(vec![day0() + Duration::days(5), day0(), day0() + Duration::days(2)]);
        assert_eq!(a.first, Some(day0()));
        assert_eq!(a.last, Some(day0() + Duration::days(5)));
        assert_eq!(a.count, 3);
    }
}
