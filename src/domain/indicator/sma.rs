//! Simple Moving Average.
//!
//! SMA(n)[i] = mean(C[i-n+1..=i]), trailing and unweighted.
//! Warmup: first (n-1) bars are undefined.
//!
//! Every window is summed afresh over its slice rather than kept as a running
//! sum, so SMA(n)[n-1] is exactly the mean of the first n closes and repeated
//! runs agree bit for bit.

use crate::domain::indicator::{IndicatorSeries, IndicatorType};
use crate::domain::price::PriceRecord;

pub fn calculate_sma(records: &[PriceRecord], period: usize) -> IndicatorSeries {
    let closes: Vec<f64> = records.iter().map(|r| r.close).collect();
    IndicatorSeries::from_values(
        IndicatorType::Sma(period),
        records,
        trailing_mean(&closes, period),
    )
}

/// Trailing mean of `values` over `period` points; `None` until the window
/// is full. A zero period is never full.
pub fn trailing_mean(values: &[f64], period: usize) -> Vec<Option<f64>> {
    (0..values.len())
        .map(|i| {
            if period == 0 || i + 1 < period {
                return None;
            }
            let window = &values[i + 1 - period..=i];
            Some(window.iter().sum::<f64>() / period as f64)
        })
        .collect()
}
