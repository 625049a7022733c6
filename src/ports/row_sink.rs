//! Output port for cleaned records and annotated rows.

use crate::domain::engine::IndicatorRow;
use crate::domain::error::PipelineError;
use crate::domain::indicator::IndicatorType;
use crate::domain::price::PriceRecord;
use crate::domain::raw::Column;

/// `columns` is the column set of the batch the rows were cleaned from, so the
/// header does not depend on how many rows survived.
pub trait RowSink {
    fn write_records(
        &mut self,
        columns: &[Column],
        records: &[PriceRecord],
    ) -> Result<(), PipelineError>;

    fn write_rows(
        &mut self,
        columns: &[Column],
        indicators: &[IndicatorType],
        rows: &[IndicatorRow],
    ) -> Result<(), PipelineError>;
}
