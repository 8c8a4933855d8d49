//! INI file configuration adapter.

use crate::domain::error::ScreenerError;
use crate::ports::config_port::ConfigPort;
use configparser::ini::Ini;
use std::path::Path;

#[derive(Debug)]
pub struct FileConfigAdapter {
    config: Ini,
}

impl FileConfigAdapter {
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ScreenerError> {
        let path = path.as_ref();
        let mut config = Ini::new();
        config
            .load(path)
            .map_err(|reason| ScreenerError::ConfigParse {
                file: path.display().to_string(),
                reason,
            })?;
        Ok(Self { config })
    }

    /// No file: every key falls back to its default.
    pub fn empty() -> Self {
        Self { config: Ini::new() }
    }

    pub fn from_string(content: &str) -> Result<Self, String> {
        let mut config = Ini::new();
        config.read(content.to_string())?;
        Ok(Self { config })
    }

    /// Apply `section.key=value` overrides on top of the loaded file.
    pub fn apply_override(&mut self, assignment: &str) -> Result<(), ScreenerError> {
        let invalid = || ScreenerError::ConfigInvalid {
            section: "override".to_string(),
            key: assignment.to_string(),
            reason: "expected section.key=value".to_string(),
        };
        let (path, value) = assignment.split_once('=').ok_or_else(invalid)?;
        let (section, key) = path.trim().split_once('.').ok_or_else(invalid)?;
        if section.is_empty() || key.is_empty() {
            return Err(invalid());
        }
        self.config
            .set(section, key, Some(value.trim().to_string()));
        Ok(())
    }

    fn parse_bool(value: &str) -> Option<bool> {
        match value.to_lowercase().as_str() {
            "true" | "yes" | "1" => Some(true),
            "false" | "no" | "0" => Some(false),
            _ => None,
        }
    }
}

impl ConfigPort for FileConfigAdapter {
    fn get_string(&self, section: &str, key: &str) -> Option<String> {
        self.config.get(section, key)
    }

    fn get_int(&self, section: &str, key: &str, default: i64) -> i64 {
        self.config
            .getint(section, key)
            .ok()
            .flatten()
            .unwrap_or(default)
    }

    fn get_double(&self, section: &str, key: &str, default: f64) -> f64 {
        self.config
            .getfloat(section, key)
            .ok()
            .flatten()
            .unwrap_or(default)
    }

    fn get_bool(&self, section: &str, key: &str, default: bool) -> bool {
        self.config
            .get(section, key)
            .as_ref()
            .and_then(|v| Self::parse_bool(v))
            .unwrap_or(default)
    }

    fn section_entries(&self, section: &str) -> Vec<(String, String)> {
        let section = section.to_lowercase();
        let mut entries: Vec<(String, String)> = self
            .config
            .get_map_ref()
            .get(&section)
            .map(|keys| {
                keys.iter()
                    .filter_map(|(k, v)| v.as_ref().map(|v| (k.clone(), v.clone())))
                    .collect()
            })
            .unwrap_or_default();
        entries.sort();
        entries
    }
}
