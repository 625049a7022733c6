//! End-to-end pipeline: source → cleaner → indicator engine.

use crate::domain::cleaner::{CleanReport, Cleaner};
use crate::domain::engine::{IndicatorEngine, IndicatorRow};
use crate::domain::error::PipelineError;
use crate::domain::price::PriceRecord;
use crate::domain::raw::Column;
use crate::ports::record_source::RecordSource;
use tracing::info;

/// Cleaned records together with the column set of the batch they came from.
#[derive(Debug, Clone, PartialEq)]
pub struct CleanedBatch {
    pub columns: Vec<Column>,
    pub records: Vec<PriceRecord>,
    pub report: CleanReport,
}

/// Annotated rows together with the column set of the source batch.
#[derive(Debug, Clone, PartialEq)]
pub struct AnnotatedBatch {
    pub columns: Vec<Column>,
    pub rows: Vec<IndicatorRow>,
}

#[derive(Debug, Clone, Default)]
pub struct Pipeline {
    cleaner: Cleaner,
    engine: IndicatorEngine,
    symbols: Vec<String>,
}

impl Pipeline {
    pub fn new(cleaner: Cleaner, engine: IndicatorEngine) -> Self {
        Self {
            cleaner,
            engine,
            symbols: Vec::new(),
        }
    }

    /// Keep only these symbols after cleaning. Empty keeps everything.
    pub fn with_symbols(mut self, symbols: Vec<String>) -> Self {
        self.symbols = symbols;
        self
    }

    pub fn engine(&self) -> &IndicatorEngine {
        &self.engine
    }

    pub fn clean(&self, source: &dyn RecordSource) -> Result<CleanedBatch, PipelineError> {
        let batch = source.load()?;
        let (mut records, report) = self.cleaner.clean_with_report(&batch)?;
        if !self.symbols.is_empty() {
            records.retain(|r| self.symbols.contains(&r.symbol));
        }

        info!(
            source = %source.describe(),
            input = report.input_rows,
            duplicates = report.duplicates_removed,
            dropped = report.rows_dropped,
            kept = records.len(),
            "cleaned"
        );
        Ok(CleanedBatch {
            columns: batch.columns().to_vec(),
            records,
            report,
        })
    }

    pub fn run(&self, source: &dyn RecordSource) -> Result<AnnotatedBatch, PipelineError> {
        let cleaned = self.clean(source)?;
        Ok(AnnotatedBatch {
            columns: cleaned.columns,
            rows: self.engine.annotate_batch(cleaned.records),
        })
    }
}
