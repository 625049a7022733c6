#![allow(dead_code)]

use chrono::NaiveDate;
use pricewash::domain::error::PipelineError;
pub use pricewash::domain::price::{PriceRecord, PriceSeries};
pub use pricewash::domain::raw::{Column, RawBatch, RawRecord, RawValue};
use pricewash::ports::record_source::RecordSource;

pub struct MockSource {
    pub batch: Option<RawBatch>,
    pub reason: Option<String>,
}

impl MockSource {
    pub fn new(batch: RawBatch) -> Self {
        Self {
            batch: Some(batch),
            reason: None,
        }
    }

    pub fn not_tabular(reason: &str) -> Self {
        Self {
            batch: None,
            reason: Some(reason.to_string()),
        }
    }
}

impl RecordSource for MockSource {
    fn load(&self) -> Result<RawBatch, PipelineError> {
        match (&self.batch, &self.reason) {
            (Some(batch), _) => Ok(batch.clone()),
            (None, reason) => Err(PipelineError::NotTabular {
                reason: reason.clone().unwrap_or_default(),
            }),
        }
    }

    fn describe(&self) -> String {
        "mock".into()
    }
}

pub fn price_columns() -> Vec<Column> {
    vec![
        Column::Symbol,
        Column::Date,
        Column::Open,
        Column::High,
        Column::Low,
        Column::Close,
    ]
}

/// Raw row with prices around `close`; all four are missing when `None`.
pub fn raw_row(symbol: &str, date: &str, close: Option<f64>) -> RawRecord {
    RawRecord::new()
        .with(Column::Symbol, symbol)
        .with(Column::Date, date)
        .with(Column::Open, close.map(|c| c * 0.99))
        .with(Column::High, close.map(|c| c * 1.01))
        .with(Column::Low, close.map(|c| c * 0.98))
        .with(Column::Close, close)
}

pub fn raw_batch(rows: impl IntoIterator<Item = RawRecord>) -> RawBatch {
    RawBatch::new(price_columns()).with_rows(rows)
}

pub fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

pub fn generate_series(symbol: &str, start_date: &str, closes: &[f64]) -> PriceSeries {
    let start = NaiveDate::parse_from_str(start_date, "%Y-%m-%d").unwrap();
    let records = closes
        .iter()
        .enumerate()
        .map(|(i, &close)| PriceRecord {
            symbol: symbol.to_string(),
            date: Some(start + chrono::Duration::days(i as i64)),
            open: close,
            high: close + 1.0,
            low: (close - 1.0).max(0.0),
            close,
            volume: None,
        })
        .collect();
    PriceSeries::new(symbol, records)
}

pub fn generate_raw(symbol: &str, start_date: &str, closes: &[f64]) -> Vec<RawRecord> {
    let start = NaiveDate::parse_from_str(start_date, "%Y-%m-%d").unwrap();
    closes
        .iter()
        .enumerate()
        .map(|(i, &close)| {
            let d = start + chrono::Duration::days(i as i64);
            raw_row(symbol, &d.format("%Y-%m-%d").to_string(), Some(close))
        })
        .collect()
}
