//! Port traits: where batches come from, where rows go, and config access.

pub mod config_port;
pub mod record_source;
pub mod row_sink;
