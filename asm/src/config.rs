use std::{fs::File, io::BufReader, path::Path};

use serde::Deserialize;
use thiserror::Error;

use crate::object::DEFAULT_RECORD_LEN;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Cannot read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid config: {0}")]
    Yaml(#[from] serde_yaml::Error),
}

/// Assembler options, read from a YAML file. Missing keys keep their defaults.
///
/// ```yaml
/// record_len: 32
/// multiple_org: true
/// hex: false
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    /// Data bytes per S1 record and per hex-dump line.
    pub record_len: usize,
    /// Accept more than one `ORG`, each starting a new segment.
    pub multiple_org: bool,
    pub listing: bool,
    pub hex: bool,
    pub srec: bool,
    /// YAML map of labels and constants.
    pub symbols: bool,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            record_len: DEFAULT_RECORD_LEN,
            multiple_org: false,
            listing: true,
            hex: true,
            srec: true,
            symbols: false,
        }
    }
}

impl Config {
    pub fn from_yaml(text: &str) -> Result<Self, ConfigError> {
        Ok(serde_yaml::from_str(text)?)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let file = File::open(path)?;
        Ok(serde_yaml::from_reader(BufReader::new(file))?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let config = Config::default();
        assert_eq!(config.record_len, 16);
        assert!(!config.multiple_org);
        assert!(config.listing && config.hex && config.srec);
        assert!(!config.symbols);
    }

    #[test]
    fn partial_yaml_keeps_defaults() {
        let config = Config::from_yaml("record_len: 32\nmultiple_org: true\n").unwrap();
        assert_eq!(
            config,
            Config {
                record_len: 32,
                multiple_org: true,
                ..Config::default()
            }
        );
    }

    #[test]
    fn unknown_key_is_rejected() {
        assert!(matches!(
            Config::from_yaml("colour: always"),
            Err(ConfigError::Yaml(_))
        ));
    }

    #[test]
    fn missing_file() {
        assert!(matches!(
            Config::load("/nonexistent/hcasm.yaml"),
            Err(ConfigError::Io(_))
        ));
    }
}
