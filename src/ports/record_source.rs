//! Record source port trait.
//!
//! A source stands in for the fetch layer: it turns whatever it reads into a
//! raw, record-shaped batch. Anything that cannot be read as records at all is
//! a structural error.

use crate::domain::error::PipelineError;
use crate::domain::raw::RawBatch;

pub trait RecordSource {
    fn load(&self) -> Result<RawBatch, PipelineError>;

    /// Human-readable origin, used in log lines.
    fn describe(&self) -> String;
}
