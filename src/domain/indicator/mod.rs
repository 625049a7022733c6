//! Technical indicator implementations.
//!
//! This module provides types for representing indicator values and series:
//! - `IndicatorPoint`: A single point in an indicator time series
//! - `IndicatorType`: Indicator identity + parameters (also the output column name)
//! - `IndicatorSeries`: A time series of indicator values
//!
//! A point whose lookback window is not yet satisfied carries `None`.

pub mod rsi;
pub mod sma;

use crate::domain::price::PriceRecord;
use chrono::NaiveDate;
use std::fmt;

pub const DEFAULT_RSI_PERIOD: usize = 14;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct IndicatorPoint {
    pub date: Option<NaiveDate>,
    pub value: Option<f64>,
}

impl IndicatorPoint {
    pub fn is_defined(&self) -> bool {
        self.value.is_some()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum IndicatorType {
    Sma(usize),
    Rsi(usize),
}

impl IndicatorType {
    /// Number of observations needed before the first defined value.
    pub fn lookback(&self) -> usize {
        match self {
            IndicatorType::Sma(period) => *period,
            IndicatorType::Rsi(period) => period + 1,
        }
    }
}

#[derive(Debug, Clone)]
pub struct IndicatorSeries {
    pub indicator_type: IndicatorType,
    pub values: Vec<IndicatorPoint>,
}

impl IndicatorSeries {
    pub(crate) fn from_values(
        indicator_type: IndicatorType,
        records: &[PriceRecord],
        values: Vec<Option<f64>>,
    ) -> Self {
        let values = records
            .iter()
            .zip(values)
            .map(|(r, value)| IndicatorPoint {
                date: r.date,
                value,
            })
            .collect();
        Self {
            indicator_type,
            values,
        }
    }

    pub fn defined_count(&self) -> usize {
        self.values.iter().filter(|p| p.is_defined()).count()
    }
}

/// Computes one indicator over a date-ordered slice of records.
pub fn calculate(records: &[PriceRecord], indicator_type: IndicatorType) -> IndicatorSeries {
    match indicator_type {
        IndicatorType::Sma(period) => sma::calculate_sma(records, period),
        IndicatorType::Rsi(period) => rsi::calculate_rsi(records, period),
    }
}

/// Column names follow the classic layout: `SMA_20`, `SMA_50`, and plain
/// `RSI` for the 14-period RSI.
impl fmt::Display for IndicatorType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            IndicatorType::Sma(period) => write!(f, "SMA_{}", period),
            IndicatorType::Rsi(DEFAULT_RSI_PERIOD) => write!(f, "RSI"),
            IndicatorType::Rsi(period) => write!(f, "RSI_{}", period),
        }
    }
}
