//! Code for loading program settings.
use crate::choropleth::DEFAULT_QUANTILES;
use crate::get_chargemap_config_dir;
use crate::input::read_toml;
use crate::log::DEFAULT_LOG_LEVEL;
use crate::pipeline::{AggregateOptions, DEFAULT_TOP_OPERATORS};
use anyhow::{Context, Result, ensure};
use documented::DocumentedFields;
use serde::{Deserialize, Serialize};
use std::fmt::Write;
use std::path::{Path, PathBuf};

const SETTINGS_FILE_NAME: &str = "settings.toml";

const DEFAULT_SETTINGS_FILE_HEADER: &str = "# This file contains the program settings for chargemap
";

/// Default log level for program
fn default_log_level() -> String {
    DEFAULT_LOG_LEVEL.to_string()
}

fn default_top_operators() -> usize {
    DEFAULT_TOP_OPERATORS
}

fn default_quantiles() -> Vec<f64> {
    DEFAULT_QUANTILES.to_vec()
}

/// Get the path to where the settings file will be read from
pub fn get_settings_file_path() -> PathBuf {
    let mut path = get_chargemap_config_dir();
    path.push(SETTINGS_FILE_NAME);

    path
}

/// Program settings from config file
#[derive(Debug, DocumentedFields, Serialize, Deserialize, PartialEq)]
pub struct Settings {
    /// The default program log level
    #[serde(default = "default_log_level")]
    pub log_level: String,
    /// Whether to overwrite output files by default
    #[serde(default)]
    pub overwrite: bool,
    /// The number of operators to include in the operator ranking
    #[serde(default = "default_top_operators")]
    pub top_operators: usize,
    /// Quantiles used to compute map bin edges (ascending, between 0 and 1)
    #[serde(default = "default_quantiles")]
    pub quantiles: Vec<f64>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
            overwrite: false,
            top_operators: default_top_operators(),
            quantiles: default_quantiles(),
        }
    }
}

impl Settings {
    /// Read the contents of the settings file from the config directory.
    ///
    /// If the file is not present, default values for settings will be used
    pub fn load() -> Result<Settings> {
        Self::load_from_path(&get_settings_file_path())
    }

    /// Read from the specified path, returning defaults if the file doesn't exist
    fn load_from_path(file_path: &Path) -> Result<Settings> {
        if !file_path.is_file() {
            return Ok(Settings::default());
        }

        let settings: Settings = read_toml(file_path)?;
        settings
            .validate()
            .with_context(|| format!("Invalid settings in {}", file_path.display()))?;

        Ok(settings)
    }

    /// Check that the settings are usable
    fn validate(&self) -> Result<()> {
        ensure!(
            self.quantiles.iter().all(|q| (0.0..=1.0).contains(q)),
            "Quantiles must be between 0 and 1"
        );
        ensure!(
            self.quantiles.windows(2).all(|w| w[0] < w[1]),
            "Quantiles must be in ascending order and unique"
        );

        Ok(())
    }

    /// Options for the aggregation pipeline
    pub fn aggregate_options(&self) -> AggregateOptions {
        AggregateOptions {
            top_operators: self.top_operators,
            quantiles: self.quantiles.clone(),
        }
    }

    /// The contents of the default settings file
    pub fn default_file_contents() -> String {
        // Settings object with default values set by serde
        let settings: Settings =
            toml::from_str("").expect("Cannot create settings from empty TOML file");

        // Convert to TOML
        let settings_raw = toml::to_string(&settings).expect("Could not convert settings to TOML");

        // Iterate through the generated TOML, commenting out lines and adding docs
        let mut out = DEFAULT_SETTINGS_FILE_HEADER.to_string();
        for line in settings_raw.split('\n') {
            if let Some(last) = line.find('=') {
                let field = line[..last].trim();

                // All fields should have doc comments
                let docs = Settings::get_field_docs(field).expect("Missing doc comment for field");
                for line in docs.split('\n') {
                    write!(&mut out, "\n# # {}\n", line.trim()).unwrap();
                }

                writeln!(&mut out, "# {}", line.trim()).unwrap();
            }
        }

        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixture::assert_error;
    use std::fs::File;
    use std::io::Write;
    use tempfile::tempdir;

    #[test]
    fn test_settings_load_from_path_no_file() {
        let dir = tempdir().unwrap();
        let file_path = dir.path().join(SETTINGS_FILE_NAME); // NB: doesn't exist
        assert_eq!(
            Settings::load_from_path(&file_path).unwrap(),
            Settings::default()
        );
    }

    #[test]
    fn test_settings_load_from_path() {
        let dir = tempdir().unwrap();
        let file_path = dir.path().join(SETTINGS_FILE_NAME);

        {
            let mut file = File::create(&file_path).unwrap();
            writeln!(file, "log_level = \"warn\"\ntop_operators = 5").unwrap();
        }

        assert_eq!(
            Settings::load_from_path(&file_path).unwrap(),
            Settings {
                log_level: "warn".to_string(),
                top_operators: 5,
                ..Settings::default()
            }
        );
    }

    #[test]
    fn test_settings_load_from_path_bad_quantiles() {
        let dir = tempdir().unwrap();
        let file_path = dir.path().join(SETTINGS_FILE_NAME);

        {
            let mut file = File::create(&file_path).unwrap();
            writeln!(file, "quantiles = [0.0, 0.75, 0.5]").unwrap();
        }

        let err = Settings::load_from_path(&file_path).unwrap_err();
        assert_eq!(
            err.root_cause().to_string(),
            "Quantiles must be in ascending order and unique"
        );
    }

    #[test]
    fn test_validate_out_of_range() {
        let settings = Settings {
            quantiles: vec![0.5, 1.5],
            ..Settings::default()
        };
        assert_error!(settings.validate(), "Quantiles must be between 0 and 1");
    }

    #[test]
    fn test_default_file_contents() {
        let contents = Settings::default_file_contents();
        assert!(contents.contains("# log_level = \"info\""));
        assert!(contents.contains("# # The number of operators"));
    }
}
