//! Batch cleaning: dedupe, forward-fill, coercion and final row filter.
//!
//! Each step is a pure function returning a new collection. Malformed cells
//! never raise; they end up as missing values and the row is dropped in the
//! final filter. Only a structurally unusable batch is an error.

use crate::domain::error::PipelineError;
use crate::domain::price::{DATE_FORMAT, PriceRecord};
use crate::domain::raw::{Column, RawBatch, RawRecord, RawValue};
use chrono::{DateTime, NaiveDate, NaiveDateTime};
use std::collections::HashSet;
use tracing::debug;

pub const DEFAULT_DATE_FORMATS: [&str; 3] = [DATE_FORMAT, "%Y/%m/%d", "%Y%m%d"];

#[derive(Debug, Clone, PartialEq)]
pub struct CleanerConfig {
    /// chrono formats tried in order before falling back to RFC 3339.
    pub date_formats: Vec<String>,
}

impl Default for CleanerConfig {
    fn default() -> Self {
        Self {
            date_formats: DEFAULT_DATE_FORMATS.iter().map(|f| f.to_string()).collect(),
        }
    }
}

/// Counts gathered while cleaning one batch.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CleanReport {
    pub input_rows: usize,
    pub duplicates_removed: usize,
    pub cells_filled: usize,
    pub rows_dropped: usize,
    pub output_rows: usize,
}

#[derive(Debug, Clone, Default)]
pub struct Cleaner {
    config: CleanerConfig,
}

impl Cleaner {
    pub fn new(config: CleanerConfig) -> Self {
        Self { config }
    }

    pub fn clean(&self, batch: &RawBatch) -> Result<Vec<PriceRecord>, PipelineError> {
        self.clean_with_report(batch).map(|(records, _)| records)
    }

    pub fn clean_with_report(
        &self,
        batch: &RawBatch,
    ) -> Result<(Vec<PriceRecord>, CleanReport), PipelineError> {
        check_structure(batch)?;

        let unique = dedupe(batch.rows());
        let (filled, cells_filled) = forward_fill(&unique, batch.columns());

        let has_date = batch.has_column(Column::Date);
        let has_volume = batch.has_column(Column::Volume);
        let coerced: Vec<PriceRecord> = filled
            .iter()
            .filter_map(|row| self.to_price_record(row, has_date, has_volume))
            .collect();
        let coerced_len = coerced.len();
        // distinct raw rows can coerce to the same record ("1" vs "1.0")
        let records = dedupe_records(coerced);

        let report = CleanReport {
            input_rows: batch.len(),
            duplicates_removed: batch.len() - unique.len() + coerced_len - records.len(),
            cells_filled,
            rows_dropped: filled.len() - coerced_len,
            output_rows: records.len(),
        };
        debug!(
            input = report.input_rows,
            duplicates = report.duplicates_removed,
            filled = report.cells_filled,
            dropped = report.rows_dropped,
            "cleaned batch"
        );

        Ok((records, report))
    }

    /// Coerces one filled row. `None` means the row still has a missing or
    /// malformed value and is dropped.
    fn to_price_record(
        &self,
        row: &RawRecord,
        has_date: bool,
        has_volume: bool,
    ) -> Option<PriceRecord> {
        let symbol = coerce_symbol(row.get(Column::Symbol))?;
        let date = if has_date {
            Some(parse_date(row.get(Column::Date), &self.config.date_formats)?)
        } else {
            None
        };
        let volume = if has_volume {
            Some(coerce_price(row.get(Column::Volume))?)
        } else {
            None
        };

        Some(PriceRecord {
            symbol,
            date,
            open: coerce_price(row.get(Column::Open))?,
            high: coerce_price(row.get(Column::High))?,
            low: coerce_price(row.get(Column::Low))?,
            close: coerce_price(row.get(Column::Close))?,
            volume,
        })
    }
}

/// Cleans a batch with the default configuration.
pub fn clean(batch: &RawBatch) -> Result<Vec<PriceRecord>, PipelineError> {
    Cleaner::default().clean(batch)
}

pub fn check_structure(batch: &RawBatch) -> Result<(), PipelineError> {
    match Column::REQUIRED.iter().find(|c| !batch.has_column(**c)) {
        Some(column) => Err(PipelineError::MissingColumn {
            column: column.name().to_string(),
        }),
        None => Ok(()),
    }
}

/// Collapses fully identical rows, keeping the first occurrence.
pub fn dedupe(rows: &[RawRecord]) -> Vec<RawRecord> {
    let mut seen: HashSet<&RawRecord> = HashSet::with_capacity(rows.len());
    rows.iter()
        .filter(|row| seen.insert(*row))
        .cloned()
        .collect()
}

type RecordKey = (String, Option<NaiveDate>, [u64; 4], Option<u64>);

fn record_key(r: &PriceRecord) -> RecordKey {
    (
        r.symbol.clone(),
        r.date,
        [r.open, r.high, r.low, r.close].map(f64::to_bits),
        r.volume.map(f64::to_bits),
    )
}

/// Collapses identical coerced records, keeping the first occurrence.
pub fn dedupe_records(records: Vec<PriceRecord>) -> Vec<PriceRecord> {
    let mut seen: HashSet<RecordKey> = HashSet::with_capacity(records.len());
    records
        .into_iter()
        .filter(|r| seen.insert(record_key(r)))
        .collect()
}

/// Replaces each missing cell with the nearest preceding non-missing value of
/// the same column. Leading gaps stay missing. Returns the filled rows and the
/// number of cells filled.
pub fn forward_fill(rows: &[RawRecord], columns: &[Column]) -> (Vec<RawRecord>, usize) {
    let mut last: [Option<RawValue>; Column::COUNT] = Default::default();
    let mut filled = 0;

    let out = rows
        .iter()
        .map(|row| {
            let mut row = row.clone();
            for (slot, column) in Column::ALL.into_iter().enumerate() {
                if !columns.contains(&column) {
                    continue;
                }
                let value = row.get(column);
                if value.is_missing() {
                    if let Some(prev) = &last[slot] {
                        row.set(column, prev.clone());
                        filled += 1;
                    }
                } else {
                    last[slot] = Some(value.clone());
                }
            }
            row
        })
        .collect();

    (out, filled)
}

/// Non-negative finite number, or `None`.
pub fn coerce_price(value: &RawValue) -> Option<f64> {
    value.as_number().filter(|v| *v >= 0.0)
}

fn coerce_symbol(value: &RawValue) -> Option<String> {
    if value.is_missing() {
        return None;
    }
    let symbol = value.to_string().trim().to_string();
    (!symbol.is_empty()).then_some(symbol)
}

/// Parses a date cell with the given formats, then as a timestamp whose date
/// part is kept.
pub fn parse_date(value: &RawValue, formats: &[String]) -> Option<NaiveDate> {
    let text = value.as_text()?.trim();
    if text.is_empty() {
        return None;
    }
    formats
        .iter()
        .find_map(|f| NaiveDate::parse_from_str(text, f).ok())
        .or_else(|| DateTime::parse_from_rfc3339(text).ok().map(|dt| dt.date_naive()))
        .or_else(|| {
            NaiveDateTime::parse_from_str(text, "%Y-%m-%d %H:%M:%S")
                .ok()
                .map(|dt| dt.date())
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn price_columns() -> Vec<Column> {
        vec![
            Column::Symbol,
            Column::Date,
            Column::Open,
            Column::High,
            Column::Low,
            Column::Close,
        ]
    }

    fn row(symbol: &str, date: &str, close: Option<&str>) -> RawRecord {
        RawRecord::new()
            .with(Column::Symbol, symbol)
            .with(Column::Date, date)
            .with(Column::Open, close)
            .with(Column::High, close)
            .with(Column::Low, close)
            .with(Column::Close, close)
    }

    fn formats() -> Vec<String> {
        CleanerConfig::default().date_formats
    }

    #[test]
    fn exact_duplicates_collapse_to_first() {
        let rows = vec![
            row("AAPL", "2023-01-01", Some("1")),
            row("AAPL", "2023-01-02", Some("2")),
            row("AAPL", "2023-01-01", Some("1")),
        ];
        let unique = dedupe(&rows);
        assert_eq!(unique, vec![rows[0].clone(), rows[1].clone()]);
    }

    #[test]
    fn same_date_different_values_are_kept() {
        let rows = vec![
            row("AAPL", "2023-01-01", Some("1")),
            row("AAPL", "2023-01-01", Some("2")),
        ];
        assert_eq!(dedupe(&rows).len(), 2);
    }

    #[test]
    fn forward_fill_carries_last_value_per_column() {
        let rows = vec![
            row("AAPL", "2023-01-01", None),
            row("AAPL", "2023-01-02", Some("100")),
            row("AAPL", "2023-01-03", None),
        ];
        let (filled, count) = forward_fill(&rows, &price_columns());
        assert!(filled[0].get(Column::Close).is_missing());
        assert_eq!(filled[2].get(Column::Close).as_number(), Some(100.0));
        assert_eq!(count, 4);
    }

    #[test]
    fn forward_fill_skips_absent_columns() {
        let rows = vec![
            RawRecord::new().with(Column::Volume, 5.0),
            RawRecord::new(),
        ];
        let (filled, count) = forward_fill(&rows, &[Column::Symbol]);
        assert!(filled[1].get(Column::Volume).is_missing());
        assert_eq!(count, 0);
    }

    #[test]
    fn coerce_price_rejects_negative_and_text() {
        assert_eq!(coerce_price(&RawValue::from("12.5")), Some(12.5));
        assert_eq!(coerce_price(&RawValue::from(0.0)), Some(0.0));
        assert_eq!(coerce_price(&RawValue::from("-1")), None);
        assert_eq!(coerce_price(&RawValue::from("twelve")), None);
    }

    #[test]
    fn parse_date_accepts_configured_formats() {
        let expected = NaiveDate::from_ymd_opt(2023, 1, 2);
        assert_eq!(parse_date(&"2023-01-02".into(), &formats()), expected);
        assert_eq!(parse_date(&"2023/01/02".into(), &formats()), expected);
        assert_eq!(parse_date(&"20230102".into(), &formats()), expected);
        assert_eq!(
            parse_date(&"2023-01-02T15:30:00Z".into(), &formats()),
            expected
        );
        assert_eq!(
            parse_date(&"2023-01-02 09:30:00".into(), &formats()),
            expected
        );
    }

    #[test]
    fn parse_date_rejects_garbage() {
        assert_eq!(parse_date(&"yesterday".into(), &formats()), None);
        assert_eq!(parse_date(&"2023-02-30".into(), &formats()), None);
        assert_eq!(parse_date(&RawValue::from(20230102.0), &formats()), None);
        assert_eq!(parse_date(&RawValue::Missing, &formats()), None);
    }

    #[test]
    fn end_to_end_duplicate_and_leading_gap() {
        let batch = RawBatch::new(price_columns()).with_rows([
            row("AAPL", "2023-01-01", None),
            row("AAPL", "2023-01-02", Some("100")),
            row("AAPL", "2023-01-01", None),
        ]);
        let (records, report) = Cleaner::default().clean_with_report(&batch).unwrap();

        assert_eq!(records.len(), 1);
        assert_eq!(records[0].symbol, "AAPL");
        assert_eq!(records[0].date, NaiveDate::from_ymd_opt(2023, 1, 2));
        assert_eq!(records[0].close, 100.0);
        assert_eq!(report.duplicates_removed, 1);
        assert_eq!(report.rows_dropped, 1);
        assert_eq!(report.output_rows, 1);
    }

    #[test]
    fn unparseable_price_drops_row_and_poisons_fill() {
        let batch = RawBatch::new(price_columns()).with_rows([
            row("AAPL", "2023-01-01", Some("100")),
            row("AAPL", "2023-01-02", Some("n/a")),
            row("AAPL", "2023-01-03", None),
            row("AAPL", "2023-01-04", Some("103")),
        ]);
        let records = clean(&batch).unwrap();
        let closes: Vec<f64> = records.iter().map(|r| r.close).collect();
        assert_eq!(closes, vec![100.0, 103.0]);
    }

    #[test]
    fn equivalent_spellings_collapse_after_coercion() {
        let batch = RawBatch::new(price_columns()).with_rows([
            row("AAPL", "2023-01-01", Some("1")),
            row("AAPL", "2023-01-01", Some("1.0")),
            row("AAPL", "2023/01/01", Some("1")),
        ]);
        let (records, report) = Cleaner::default().clean_with_report(&batch).unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(report.duplicates_removed, 2);
        assert_eq!(report.rows_dropped, 0);
    }

    #[test]
    fn bad_date_drops_row() {
        let batch = RawBatch::new(price_columns()).with_rows([
            row("AAPL", "2023-01-01", Some("100")),
            row("AAPL", "not a date", Some("101")),
        ]);
        assert_eq!(clean(&batch).unwrap().len(), 1);
    }

    #[test]
    fn no_date_column_leaves_dates_empty() {
        let columns = vec![
            Column::Symbol,
            Column::Open,
            Column::High,
            Column::Low,
            Column::Close,
        ];
        let batch = RawBatch::new(columns).with_rows([RawRecord::new()
            .with(Column::Symbol, "AAPL")
            .with(Column::Open, 1.0)
            .with(Column::High, 1.0)
            .with(Column::Low, 1.0)
            .with(Column::Close, 1.0)]);
        let records = clean(&batch).unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].date, None);
    }

    #[test]
    fn volume_column_is_required_per_row_when_present() {
        let mut columns = price_columns();
        columns.push(Column::Volume);
        let batch = RawBatch::new(columns).with_rows([
            row("AAPL", "2023-01-01", Some("1")),
            row("AAPL", "2023-01-02", Some("2")).with(Column::Volume, "500"),
            row("AAPL", "2023-01-03", Some("3")),
        ]);
        let records = clean(&batch).unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].volume, Some(500.0));
        assert_eq!(records[1].volume, Some(500.0));
    }

    #[test]
    fn missing_required_column_is_structural() {
        let batch = RawBatch::new([Column::Symbol, Column::Date, Column::Close]);
        let err = clean(&batch).unwrap_err();
        assert!(matches!(err, PipelineError::MissingColumn { column } if column == "open"));
    }

    #[test]
    fn empty_batch_cleans_to_nothing() {
        let batch = RawBatch::new(price_columns());
        assert!(clean(&batch).unwrap().is_empty());
    }

    #[test]
    fn input_batch_is_untouched() {
        let batch = RawBatch::new(price_columns()).with_rows([
            row("AAPL", "2023-01-01", Some("1")),
            row("AAPL", "2023-01-02", None),
        ]);
        let before = batch.clone();
        let _ = clean(&batch).unwrap();
        assert_eq!(batch, before);
    }
}
