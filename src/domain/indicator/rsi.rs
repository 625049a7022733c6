//! RSI (Relative Strength Index) indicator implementation.
//!
//! Uses simple trailing means of gains and losses (not Wilder's smoothing):
//! - delta[i] = C[i] - C[i-1] for i >= 1
//! - gain = max(delta, 0), loss = max(-delta, 0)
//! - avg_gain / avg_loss: mean over the last n deltas
//!
//! Formula: RSI = 100 - (100 / (1 + avg_gain / avg_loss))
//! If avg_loss == 0: RSI = 100
//!
//! Warmup: first n bars are undefined (need n price changes).

use crate::domain::indicator::sma::trailing_mean;
use crate::domain::indicator::{IndicatorSeries, IndicatorType};
use crate::domain::price::PriceRecord;

pub fn calculate_rsi(records: &[PriceRecord], period: usize) -> IndicatorSeries {
    let closes: Vec<f64> = records.iter().map(|r| r.close).collect();
    IndicatorSeries::from_values(
        IndicatorType::Rsi(period),
        records,
        rsi_values(&closes, period),
    )
}

pub fn rsi_values(closes: &[f64], period: usize) -> Vec<Option<f64>> {
    if closes.is_empty() {
        return Vec::new();
    }

    let (gains, losses): (Vec<f64>, Vec<f64>) = closes
        .windows(2)
        .map(|w| {
            let change = w[1] - w[0];
            (change.max(0.0), (-change).max(0.0))
        })
        .unzip();

    let avg_gains = trailing_mean(&gains, period);
    let avg_losses = trailing_mean(&losses, period);

    // delta is undefined on the first bar
    std::iter::once(None)
        .chain(
            avg_gains
                .into_iter()
                .zip(avg_losses)
                .map(|(g, l)| Some(rsi_from_averages(g?, l?))),
        )
        .collect()
}

pub fn rsi_from_averages(avg_gain: f64, avg_loss: f64) -> f64 {
    if avg_loss == 0.0 {
        100.0
    } else {
        100.0 - (100.0 / (1.0 + avg_gain / avg_loss))
    }
}
