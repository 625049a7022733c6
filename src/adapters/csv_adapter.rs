//! CSV file sources and sink.

use crate::domain::engine::IndicatorRow;
use crate::domain::error::PipelineError;
use crate::domain::indicator::IndicatorType;
use crate::domain::price::{DATE_FORMAT, PriceRecord};
use crate::domain::raw::{Column, RawBatch, RawRecord};
use crate::ports::record_source::RecordSource;
use crate::ports::row_sink::RowSink;
use std::fs;
use std::io::{Read, Write};
use std::path::PathBuf;
use tracing::{info, warn};

/// Reads a header-led CSV into a raw batch. Header names are matched
/// case-insensitively; unknown columns are ignored and empty cells are missing.
pub fn read_batch<R: Read>(reader: R) -> Result<RawBatch, PipelineError> {
    let mut rdr = csv::ReaderBuilder::new()
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(reader);

    let headers = rdr.headers()?.clone();
    if headers.is_empty() || headers.iter().all(|h| h.is_empty()) {
        return Err(PipelineError::NotTabular {
            reason: "no header row".into(),
        });
    }

    let mapping: Vec<Option<Column>> = headers.iter().map(Column::from_name).collect();
    let mut batch = RawBatch::new(mapping.iter().flatten().copied());

    for result in rdr.records() {
        let record = result?;
        let mut row = RawRecord::new();
        for (field, column) in record.iter().zip(&mapping) {
            if let Some(column) = column {
                if !field.is_empty() {
                    row.set(*column, field);
                }
            }
        }
        batch.push(row);
    }

    Ok(batch)
}

pub struct CsvFileSource {
    path: PathBuf,
}

impl CsvFileSource {
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }
}

impl RecordSource for CsvFileSource {
    fn load(&self) -> Result<RawBatch, PipelineError> {
        let file = fs::File::open(&self.path)?;
        read_batch(file)
    }

    fn describe(&self) -> String {
        self.path.display().to_string()
    }
}

/// A directory of `<SYMBOL>.csv` files. Each file's rows are stamped with the
/// symbol taken from its name.
pub struct CsvDirSource {
    base_path: PathBuf,
    symbols: Vec<String>,
}

impl CsvDirSource {
    /// With no symbols, every `.csv` file in the directory is loaded.
    pub fn new(base_path: PathBuf, symbols: Vec<String>) -> Self {
        Self { base_path, symbols }
    }

    fn csv_path(&self, symbol: &str) -> PathBuf {
        self.base_path.join(format!("{}.csv", symbol))
    }

    pub fn list_symbols(&self) -> Result<Vec<String>, PipelineError> {
        let mut symbols = Vec::new();
        for entry in fs::read_dir(&self.base_path)? {
            let name = entry?.file_name();
            let name = name.to_string_lossy();
            if let Some(symbol) = name.strip_suffix(".csv") {
                symbols.push(symbol.to_string());
            }
        }
        symbols.sort();
        Ok(symbols)
    }

    fn load_symbol(&self, symbol: &str) -> Result<RawBatch, PipelineError> {
        let file = fs::File::open(self.csv_path(symbol))?;
        let batch = read_batch(file)?;

        let mut stamped = RawBatch::new(batch.columns().iter().copied());
        stamped.add_column(Column::Symbol);
        for row in batch.rows() {
            stamped.push(row.clone().with(Column::Symbol, symbol));
        }
        Ok(stamped)
    }
}

impl RecordSource for CsvDirSource {
    fn load(&self) -> Result<RawBatch, PipelineError> {
        let symbols = if self.symbols.is_empty() {
            self.list_symbols()?
        } else {
            self.symbols.clone()
        };

        let mut combined: Option<RawBatch> = None;
        for symbol in &symbols {
            match self.load_symbol(symbol) {
                Ok(batch) => {
                    info!(symbol = %symbol, rows = batch.len(), "loaded symbol");
                    match combined.as_mut() {
                        Some(all) => all.extend(batch),
                        None => combined = Some(batch),
                    }
                }
                Err(e) => warn!(symbol = %symbol, error = %e, "skipping symbol"),
            }
        }

        combined.ok_or_else(|| PipelineError::NoData {
            symbol: symbols.join(","),
        })
    }

    fn describe(&self) -> String {
        self.base_path.display().to_string()
    }
}

/// Writes cleaned records or annotated rows as CSV. Undefined indicator
/// values are written as the configured marker.
pub struct CsvRowSink<W: Write> {
    writer: csv::Writer<W>,
    undefined: String,
    precision: Option<usize>,
}

impl<W: Write> CsvRowSink<W> {
    pub fn new(inner: W, undefined: impl Into<String>, precision: Option<usize>) -> Self {
        Self {
            writer: csv::Writer::from_writer(inner),
            undefined: undefined.into(),
            precision,
        }
    }

    pub fn into_inner(self) -> Result<W, PipelineError> {
        self.writer
            .into_inner()
            .map_err(|e| PipelineError::Io(e.into_error()))
    }

    fn number(&self, value: f64) -> String {
        match self.precision {
            Some(p) => format!("{:.*}", p, value),
            None => value.to_string(),
        }
    }

    fn record_fields(&self, record: &PriceRecord, dated: bool, with_volume: bool) -> Vec<String> {
        let mut fields = vec![record.symbol.clone()];
        if dated {
            fields.push(
                record
                    .date
                    .map(|d| d.format(DATE_FORMAT).to_string())
                    .unwrap_or_default(),
            );
        }
        for price in [record.open, record.high, record.low, record.close] {
            fields.push(self.number(price));
        }
        if with_volume {
            fields.push(record.volume.map(|v| self.number(v)).unwrap_or_default());
        }
        fields
    }

    /// Required columns always; date and volume only when the input had them.
    fn header(dated: bool, with_volume: bool) -> Vec<String> {
        Column::ALL
            .into_iter()
            .filter(|c| match c {
                Column::Date => dated,
                Column::Volume => with_volume,
                _ => true,
            })
            .map(|c| c.name().to_string())
            .collect()
    }
}

fn layout(columns: &[Column]) -> (bool, bool) {
    (
        columns.contains(&Column::Date),
        columns.contains(&Column::Volume),
    )
}

impl<W: Write> RowSink for CsvRowSink<W> {
    fn write_records(
        &mut self,
        columns: &[Column],
        records: &[PriceRecord],
    ) -> Result<(), PipelineError> {
        let (dated, with_volume) = layout(columns);
        self.writer.write_record(Self::header(dated, with_volume))?;
        for record in records {
            let fields = self.record_fields(record, dated, with_volume);
            self.writer.write_record(&fields)?;
        }
        self.writer.flush()?;
        Ok(())
    }

    fn write_rows(
        &mut self,
        columns: &[Column],
        indicators: &[IndicatorType],
        rows: &[IndicatorRow],
    ) -> Result<(), PipelineError> {
        let (dated, with_volume) = layout(columns);
        let mut header = Self::header(dated, with_volume);
        header.extend(indicators.iter().map(|t| t.to_string()));
        self.writer.write_record(&header)?;

        for row in rows {
            let mut fields = self.record_fields(&row.record, dated, with_volume);
            for indicator in indicators {
                fields.push(match row.value(*indicator) {
                    Some(v) => self.number(v),
                    None => self.undefined.clone(),
                });
            }
            self.writer.write_record(&fields)?;
        }
        self.writer.flush()?;
        Ok(())
    }
}
