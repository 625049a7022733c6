//! Validated price records and per-symbol series.

use crate::domain::raw::{Column, RawBatch, RawRecord};
use chrono::NaiveDate;

pub const DATE_FORMAT: &str = "%Y-%m-%d";

#[derive(Debug, Clone, PartialEq)]
pub struct PriceRecord {
    pub symbol: String,
    /// `None` only when the batch carried no date column.
    pub date: Option<NaiveDate>,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: Option<f64>,
}

impl PriceRecord {
    /// Raw form of the record, with the date rendered as `YYYY-MM-DD`.
    pub fn to_raw(&self) -> RawRecord {
        RawRecord::new()
            .with(Column::Symbol, self.symbol.as_str())
            .with(
                Column::Date,
                self.date.map(|d| d.format(DATE_FORMAT).to_string()),
            )
            .with(Column::Open, self.open)
            .with(Column::High, self.high)
            .with(Column::Low, self.low)
            .with(Column::Close, self.close)
            .with(Column::Volume, self.volume)
    }
}

/// Re-packs cleaned records as a raw batch carrying the given columns.
pub fn records_to_batch(records: &[PriceRecord], columns: &[Column]) -> RawBatch {
    RawBatch::new(columns.iter().copied()).with_rows(records.iter().map(|r| {
        let mut raw = r.to_raw();
        for column in Column::ALL {
            if !columns.contains(&column) {
                raw.set(column, None::<f64>);
            }
        }
        raw
    }))
}

/// One symbol's records, ascending by date.
#[derive(Debug, Clone, PartialEq)]
pub struct PriceSeries {
    pub symbol: String,
    pub records: Vec<PriceRecord>,
}

impl PriceSeries {
    /// Builds a series, stably sorting by date. Undated records keep their
    /// insertion order.
    pub fn new(symbol: impl Into<String>, mut records: Vec<PriceRecord>) -> Self {
        records.sort_by_key(|r| r.date);
        Self {
            symbol: symbol.into(),
            records,
        }
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// True when dates are strictly increasing (no repeated dates).
    pub fn is_strictly_ordered(&self) -> bool {
        self.records.windows(2).all(|w| w[0].date < w[1].date)
    }
}

/// Groups cleaned records by symbol. Symbols appear in order of first
/// occurrence; each series is sorted by date.
pub fn partition_by_symbol(records: Vec<PriceRecord>) -> Vec<PriceSeries> {
    let mut order: Vec<String> = Vec::new();
    let mut groups: std::collections::HashMap<String, Vec<PriceRecord>> =
        std::collections::HashMap::new();

    for record in records {
        if !groups.contains_key(&record.symbol) {
            order.push(record.symbol.clone());
        }
        groups.entry(record.symbol.clone()).or_default().push(record);
    }

    order
        .into_iter()
        .map(|symbol| {
            let records = groups.remove(&symbol).unwrap_or_default();
            PriceSeries::new(symbol, records)
        })
        .collect()
}
