//! Configuration validation.
//!
//! Validates every pipeline key before a run. All keys are optional; only
//! values that are present get checked.

use crate::domain::error::PipelineError;
use crate::ports::config_port::ConfigPort;
use chrono::format::{Item, StrftimeItems};
use std::collections::HashSet;

pub const MAX_FLOAT_PRECISION: usize = 17;

pub fn validate_pipeline_config(config: &dyn ConfigPort) -> Result<(), PipelineError> {
    validate_date_formats(config)?;
    validate_sma_periods(config)?;
    validate_rsi_period(config)?;
    validate_undefined_marker(config)?;
    validate_float_precision(config)?;
    validate_parallel(config)?;
    Ok(())
}

fn invalid(section: &str, key: &str, reason: impl Into<String>) -> PipelineError {
    PipelineError::ConfigInvalid {
        section: section.to_string(),
        key: key.to_string(),
        reason: reason.into(),
    }
}

fn parse_period(section: &str, key: &str, raw: &str) -> Result<usize, PipelineError> {
    match raw.trim().parse::<usize>() {
        Ok(0) | Err(_) => Err(invalid(
            section,
            key,
            format!("`{}` is not a positive integer", raw.trim()),
        )),
        Ok(n) => Ok(n),
    }
}

fn validate_date_formats(config: &dyn ConfigPort) -> Result<(), PipelineError> {
    let Some(formats) = config.get_list("cleaner", "date_formats") else {
        return Ok(());
    };
    if formats.is_empty() {
        return Err(invalid("cleaner", "date_formats", "at least one format is required"));
    }
    for format in &formats {
        if StrftimeItems::new(format).any(|item| matches!(item, Item::Error)) {
            return Err(invalid(
                "cleaner",
                "date_formats",
                format!("`{}` is not a valid date format", format),
            ));
        }
    }
    Ok(())
}

/// Parsed SMA periods; `None` when the key is absent.
pub fn sma_periods(config: &dyn ConfigPort) -> Result<Option<Vec<usize>>, PipelineError> {
    let Some(items) = config.get_list("indicators", "sma_periods") else {
        return Ok(None);
    };
    let mut seen = HashSet::new();
    let mut periods = Vec::with_capacity(items.len());
    for item in &items {
        let period = parse_period("indicators", "sma_periods", item)?;
        if !seen.insert(period) {
            return Err(invalid(
                "indicators",
                "sma_periods",
                format!("duplicate period {}", period),
            ));
        }
        periods.push(period);
    }
    Ok(Some(periods))
}

fn validate_sma_periods(config: &dyn ConfigPort) -> Result<(), PipelineError> {
    sma_periods(config).map(|_| ())
}

fn validate_rsi_period(config: &dyn ConfigPort) -> Result<(), PipelineError> {
    rsi_period(config).map(|_| ())
}

/// Parsed RSI period; `None` when the key is absent.
pub fn rsi_period(config: &dyn ConfigPort) -> Result<Option<usize>, PipelineError> {
    config
        .get_string("indicators", "rsi_period")
        .map(|raw| parse_period("indicators", "rsi_period", &raw))
        .transpose()
}

fn validate_parallel(config: &dyn ConfigPort) -> Result<(), PipelineError> {
    parallel(config).map(|_| ())
}

/// Parsed `[pipeline] parallel` flag; `None` when the key is absent.
pub fn parallel(config: &dyn ConfigPort) -> Result<Option<bool>, PipelineError> {
    config
        .get_bool("pipeline", "parallel")
        .map_err(|reason| invalid("pipeline", "parallel", reason))
}

fn validate_undefined_marker(config: &dyn ConfigPort) -> Result<(), PipelineError> {
    let Some(marker) = config.get_string("output", "undefined") else {
        return Ok(());
    };
    match marker.trim().parse::<f64>() {
        Ok(v) if v.is_finite() => Err(invalid(
            "output",
            "undefined",
            "marker must not read as a number",
        )),
        _ => Ok(()),
    }
}

fn validate_float_precision(config: &dyn ConfigPort) -> Result<(), PipelineError> {
    float_precision(config).map(|_| ())
}

/// Parsed output precision; `None` when the key is absent.
pub fn float_precision(config: &dyn ConfigPort) -> Result<Option<usize>, PipelineError> {
    let Some(raw) = config.get_string("output", "float_precision") else {
        return Ok(None);
    };
    match raw.trim().parse::<usize>() {
        Ok(p) if p <= MAX_FLOAT_PRECISION => Ok(Some(p)),
        _ => Err(invalid(
            "output",
            "float_precision",
            format!("must be an integer between 0 and {}", MAX_FLOAT_PRECISION),
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::file_config_adapter::FileConfigAdapter;

    fn make_config(content: &str) -> FileConfigAdapter {
        FileConfigAdapter::from_string(content).unwrap()
    }

    fn invalid_key(err: PipelineError) -> String {
        match err {
            PipelineError::ConfigInvalid { key, .. } => key,
            other => panic!("expected ConfigInvalid, got {other:?}"),
        }
    }

    #[test]
    fn empty_config_passes() {
        assert!(validate_pipeline_config(&FileConfigAdapter::empty()).is_ok());
    }

    #[test]
    fn valid_config_passes() {
        let config = make_config(
            r#"
[cleaner]
date_formats = %Y-%m-%d, %d/%m/%Y

[indicators]
sma_periods = 10, 20, 50
rsi_period = 9

[output]
undefined = NaN
float_precision = 6
"#,
        );
        assert!(validate_pipeline_config(&config).is_ok());
        assert_eq!(sma_periods(&config).unwrap(), Some(vec![10, 20, 50]));
    }

    #[test]
    fn zero_sma_period_fails() {
        let config = make_config("[indicators]\nsma_periods = 20, 0\n");
        let err = validate_pipeline_config(&config).unwrap_err();
        assert_eq!(invalid_key(err), "sma_periods");
    }

    #[test]
    fn duplicate_sma_period_fails() {
        let config = make_config("[indicators]\nsma_periods = 20, 50, 20\n");
        let err = validate_pipeline_config(&config).unwrap_err();
        assert!(err.to_string().contains("duplicate period 20"));
    }

    #[test]
    fn non_numeric_rsi_period_fails() {
        let config = make_config("[indicators]\nrsi_period = fourteen\n");
        let err = validate_pipeline_config(&config).unwrap_err();
        assert_eq!(invalid_key(err), "rsi_period");
    }

    #[test]
    fn numeric_undefined_marker_fails() {
        let config = make_config("[output]\nundefined = 0\n");
        let err = validate_pipeline_config(&config).unwrap_err();
        assert_eq!(invalid_key(err), "undefined");
    }

    #[test]
    fn nan_undefined_marker_passes() {
        let config = make_config("[output]\nundefined = NaN\n");
        assert!(validate_pipeline_config(&config).is_ok());
    }

    #[test]
    fn excessive_precision_fails() {
        let config = make_config("[output]\nfloat_precision = 40\n");
        let err = validate_pipeline_config(&config).unwrap_err();
        assert_eq!(invalid_key(err), "float_precision");
    }

    #[test]
    fn broken_date_format_fails() {
        let config = make_config("[cleaner]\ndate_formats = %Y-%m-%Q\n");
        let err = validate_pipeline_config(&config).unwrap_err();
        assert_eq!(invalid_key(err), "date_formats");
    }

    #[test]
    fn oversized_rsi_period_fails() {
        let config = make_config("[indicators]\nrsi_period = 99999999999999999999999\n");
        let err = validate_pipeline_config(&config).unwrap_err();
        assert_eq!(invalid_key(err), "rsi_period");
    }

    #[test]
    fn rsi_period_is_parsed_once() {
        let config = make_config("[indicators]\nrsi_period = 9\n");
        assert_eq!(rsi_period(&config).unwrap(), Some(9));
        assert_eq!(rsi_period(&FileConfigAdapter::empty()).unwrap(), None);
    }

    #[test]
    fn unknown_parallel_flag_fails() {
        let config = make_config("[pipeline]\nparallel = maybe\n");
        let err = validate_pipeline_config(&config).unwrap_err();
        assert_eq!(invalid_key(err), "parallel");
    }

    #[test]
    fn parallel_flag_spellings_parse() {
        let config = make_config("[pipeline]\nparallel = no\n");
        assert_eq!(parallel(&config).unwrap(), Some(false));
    }

    #[test]
    fn blank_date_formats_fail() {
        let config = make_config("[cleaner]\ndate_formats = ,\n");
        let err = validate_pipeline_config(&config).unwrap_err();
        assert_eq!(invalid_key(err), "date_formats");
    }
}
