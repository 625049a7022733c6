//! INI file configuration adapter.
//!
//! Every key is optional. A run without a config file uses an empty adapter,
//! so callers always see the defaults through the same `ConfigPort` calls.

use crate::domain::error::PipelineError;
use crate::ports::config_port::ConfigPort;
use configparser::ini::Ini;
use std::path::Path;

#[derive(Debug)]
pub struct FileConfigAdapter {
    ini: Ini,
    origin: String,
}

impl FileConfigAdapter {
    pub fn empty() -> Self {
        Self {
            ini: Ini::new(),
            origin: "<defaults>".into(),
        }
    }

    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, PipelineError> {
        let path = path.as_ref();
        let mut ini = Ini::new();
        ini.load(path).map_err(|reason| PipelineError::ConfigParse {
            file: path.display().to_string(),
            reason,
        })?;
        Ok(Self {
            ini,
            origin: path.display().to_string(),
        })
    }

    pub fn from_string(content: &str) -> Result<Self, PipelineError> {
        let mut ini = Ini::new();
        ini.read(content.to_string())
            .map_err(|reason| PipelineError::ConfigParse {
                file: "<string>".into(),
                reason,
            })?;
        Ok(Self {
            ini,
            origin: "<string>".into(),
        })
    }

    /// Where the settings came from, for log lines.
    pub fn origin(&self) -> &str {
        &self.origin
    }
}

impl ConfigPort for FileConfigAdapter {
    fn get_string(&self, section: &str, key: &str) -> Option<String> {
        self.ini.get(section, key)
    }

    /// Accepts the usual spellings (`true`/`yes`/`1` and their negatives).
    fn get_bool(&self, section: &str, key: &str) -> Result<Option<bool>, String> {
        self.ini.getboolcoerce(section, key)
    }
}
