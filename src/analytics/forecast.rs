use std::collections::BTreeMap;

use chrono::{Days, NaiveDate};
use serde::Serialize;

use crate::model::Order;

/// z for a ~95% band
const BAND_Z: f64 = 1.96;

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct DailyPoint {
    pub date: NaiveDate,
    pub orders: u64,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct ForecastPoint {
    pub date: NaiveDate,
    pub yhat: f64,
    pub yhat_lower: f64,
    pub yhat_upper: f64,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum Forecast {
    Forecast {
        history: Vec<DailyPoint>,
        forecast: Vec<ForecastPoint>,
        slope: f64,
        intercept: f64,
    },
    NoData,
}

/// Orders per calendar day (UTC), with empty days between the first and last filled in as 0
pub fn daily_order_counts(orders: &[Order]) -> Vec<DailyPoint> {
    let mut by_day: BTreeMap<NaiveDate, u64> = BTreeMap::new();
    for order in orders {
        *by_day.entry(order.order_date.date_naive()).or_insert(0) += 1;
    }

    let (Some(&first), Some(&last)) = (by_day.keys().next(), by_day.keys().next_back()) else {
        return Vec::new();
    };

    first
        .iter_days()
        .take_while(|d| *d <= last)
        .map(|date| DailyPoint {
            date,
            orders: by_day.get(&date).copied().unwrap_or(0),
        })
        .collect()
}

/// Linear trend over daily order counts, projected `horizon_days` past the last day.
///
/// 最小二乗法で直線を当てはめ、残差の標準偏差から予測区間を出す。
/// 発注のある日が `min_history_days` (最低2) 未満なら NoData。
pub fn forecast_demand(orders: &[Order], horizon_days: u32, min_history_days: usize) -> Forecast {
    let history = daily_order_counts(orders);
    let active = history.iter().filter(|p| p.orders > 0).count();
    if active < min_history_days.max(2) {
        return Forecast::NoData;
    }

    let ys: Vec<f64> = history.iter().map(|p| p.orders as f64).collect();
    let (slope, intercept) = fit_line(&ys);

    let n = ys.len() as f64;
    let sse: f64 = ys
        .iter()
        .enumerate()
        .map(|(x, y)| {
            let r = y - (intercept + slope * x as f64);
            r * r
        })
        .sum();
    let band = BAND_Z * (sse / n).sqrt();

    let Some(last) = history.last().map(|p| p.date) else {
        return Forecast::NoData;
    };

    let forecast = (1..=horizon_days as u64)
        .filter_map(|step| {
            let date = last.checked_add_days(Days::new(step))?;
            let x = ys.len() as f64 - 1.0 + step as f64;
            let yhat = (intercept + slope * x).max(0.0);
            Some(ForecastPoint {
                date,
                yhat: round2(yhat),
                yhat_lower: round2((yhat - band).max(0.0)),
                yhat_upper: round2(yhat + band),
            })
        })
        .collect();

    Forecast::Forecast {
        history,
        forecast,
        slope: round2(slope),
        intercept: round2(intercept),
    }
}

/// Ordinary least squares over x = 0..n
fn fit_line(ys: &[f64]) -> (f64, f64) {
    let n = ys.len() as f64;
    let mean_x = (n - 1.0) / 2.0;
    let mean_y = ys.iter().sum::<f64>() / n;

    let (mut sxy, mut sxx) = (0.0, 0.0);
    for (x, y) in ys.iter().enumerate() {
        let dx = x as f64 - mean_x;
        sxy += dx * (y - mean_y);
        sxx += dx * dx;
    }

    let slope = if sxx > 0.0 { sxy / sxx } else { 0.0 };
    (slope, mean_y - slope * mean_x)
}

fn round2(v: f64) -> f64 {
    (v * 100.0).round() / 100.0
}
