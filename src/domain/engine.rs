//! Indicator engine: annotates a per-symbol price series with SMA and RSI.

use crate::domain::indicator::{self, DEFAULT_RSI_PERIOD, IndicatorSeries, IndicatorType};
use crate::domain::price::{PriceRecord, PriceSeries, partition_by_symbol};
use tracing::{debug, info};

pub const DEFAULT_SMA_PERIODS: [usize; 2] = [20, 50];

#[derive(Debug, Clone, PartialEq)]
pub struct EngineConfig {
    pub sma_periods: Vec<usize>,
    pub rsi_period: usize,
    /// Annotate symbols on the rayon pool when the `parallel` feature is on.
    pub parallel: bool,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            sma_periods: DEFAULT_SMA_PERIODS.to_vec(),
            rsi_period: DEFAULT_RSI_PERIOD,
            parallel: true,
        }
    }
}

/// A price record plus its indicator values, in engine column order.
#[derive(Debug, Clone, PartialEq)]
pub struct IndicatorRow {
    pub record: PriceRecord,
    pub values: Vec<(IndicatorType, Option<f64>)>,
}

impl IndicatorRow {
    /// `None` when the indicator is undefined for this row or not computed.
    pub fn value(&self, indicator_type: IndicatorType) -> Option<f64> {
        self.values
            .iter()
            .find(|(t, _)| *t == indicator_type)
            .and_then(|(_, v)| *v)
    }

    pub fn sma_20(&self) -> Option<f64> {
        self.value(IndicatorType::Sma(20))
    }

    pub fn sma_50(&self) -> Option<f64> {
        self.value(IndicatorType::Sma(50))
    }

    pub fn rsi(&self) -> Option<f64> {
        self.value(IndicatorType::Rsi(DEFAULT_RSI_PERIOD))
    }
}

#[derive(Debug, Clone)]
pub struct IndicatorEngine {
    indicators: Vec<IndicatorType>,
    #[cfg_attr(not(feature = "parallel"), allow(dead_code))]
    parallel: bool,
}

impl Default for IndicatorEngine {
    fn default() -> Self {
        Self::new(&EngineConfig::default())
    }
}

impl IndicatorEngine {
    pub fn new(config: &EngineConfig) -> Self {
        let mut indicators: Vec<IndicatorType> = config
            .sma_periods
            .iter()
            .map(|&p| IndicatorType::Sma(p))
            .collect();
        indicators.push(IndicatorType::Rsi(config.rsi_period));
        Self {
            indicators,
            parallel: config.parallel,
        }
    }

    /// Output columns, in order.
    pub fn indicators(&self) -> &[IndicatorType] {
        &self.indicators
    }

    /// Annotates one symbol's date-ordered series. Row order is preserved.
    pub fn annotate(&self, series: &PriceSeries) -> Vec<IndicatorRow> {
        let computed: Vec<IndicatorSeries> = self
            .indicators
            .iter()
            .map(|&t| indicator::calculate(&series.records, t))
            .collect();

        let dated = series.records.iter().all(|r| r.date.is_some());
        if dated && !series.is_strictly_ordered() {
            debug!(symbol = %series.symbol, "series has repeated dates");
        }
        for s in computed.iter().filter(|s| s.defined_count() == 0) {
            debug!(
                symbol = %series.symbol,
                indicator = %s.indicator_type,
                rows = series.len(),
                lookback = s.indicator_type.lookback(),
                "series shorter than lookback"
            );
        }

        series
            .records
            .iter()
            .enumerate()
            .map(|(i, record)| IndicatorRow {
                record: record.clone(),
                values: computed
                    .iter()
                    .map(|s| (s.indicator_type, s.values[i].value))
                    .collect(),
            })
            .collect()
    }

    /// Partitions cleaned records by symbol and annotates each series.
    /// Symbols come out in order of first appearance.
    pub fn annotate_batch(&self, records: Vec<PriceRecord>) -> Vec<IndicatorRow> {
        let partitions = partition_by_symbol(records);
        info!(symbols = partitions.len(), "annotating batch");

        let annotated = self.annotate_all(&partitions);
        annotated.into_iter().flatten().collect()
    }

    #[cfg(feature = "parallel")]
    fn annotate_all(&self, partitions: &[PriceSeries]) -> Vec<Vec<IndicatorRow>> {
        use rayon::prelude::*;

        if self.parallel {
            partitions.par_iter().map(|s| self.annotate(s)).collect()
        } else {
            partitions.iter().map(|s| self.annotate(s)).collect()
        }
    }

    #[cfg(not(feature = "parallel"))]
    fn annotate_all(&self, partitions: &[PriceSeries]) -> Vec<Vec<IndicatorRow>> {
        partitions.iter().map(|s| self.annotate(s)).collect()
    }
}
