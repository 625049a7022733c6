//! Core domain types and logic.

pub mod cleaner;
pub mod config_validation;
pub mod engine;
pub mod error;
pub mod indicator;
pub mod pipeline;
pub mod price;
pub mod raw;
