//! Club-level configuration loading.
//!
//! Reads `.leadmap.toml` when present; invalid weights degrade to defaults
//! with a warning rather than failing the whole load.

use std::fs;
use std::io::{BufReader, Read};
use std::path::Path;

use serde::{Deserialize, Serialize};

use super::scoring::ScoreWeights;
use super::thresholds::ScoreThresholds;

/// Default name of the club override file.
pub const CONFIG_FILE_NAME: &str = ".leadmap.toml";

/// Club-level score configuration: weights plus temperature thresholds.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ScoreConfig {
    #[serde(default)]
    pub weights: ScoreWeights,

    #[serde(default)]
    pub thresholds: ScoreThresholds,
}

/// Pure function to read config file contents
pub(crate) fn read_config_file(path: &Path) -> Result<String, std::io::Error> {
    let file = fs::File::open(path)?;
    let mut reader = BufReader::new(file);
    let mut contents = String::new();
    reader.read_to_string(&mut contents)?;
    Ok(contents)
}

/// Pure function to parse and validate config from a TOML string.
///
/// Invalid weights are repaired (warn + normalize or reset to defaults);
/// only unparseable TOML is an error.
pub fn parse_and_validate_config(contents: &str) -> Result<ScoreConfig, String> {
    let mut config = toml::from_str::<ScoreConfig>(contents)
        .map_err(|e| format!("failed to parse {}: {}", CONFIG_FILE_NAME, e))?;

    if let Err(e) = config.weights.validate() {
        log::warn!("invalid score weights: {}. Normalizing.", e);
        config.weights.normalize();
        if config.weights.validate().is_err() {
            log::warn!("score weights not repairable, using defaults");
            config.weights = ScoreWeights::default();
        }
    }
    if let Err(e) = config.thresholds.validate() {
        log::warn!("invalid temperature thresholds: {}. Using defaults.", e);
        config.thresholds = ScoreThresholds::default();
    }

    Ok(config)
}

/// Load configuration from a path, falling back to defaults when the file
/// is missing or unparseable.
pub fn load_config(path: &Path) -> ScoreConfig {
    let contents = match read_config_file(path) {
        Ok(contents) => contents,
        Err(e) => {
            if e.kind() != std::io::ErrorKind::NotFound {
                log::warn!("could not read {}: {}. Using defaults.", path.display(), e);
            }
            return ScoreConfig::default();
        }
    };

    match parse_and_validate_config(&contents) {
        Ok(config) => {
            log::debug!("loaded score config from {}", path.display());
            config
        }
        Err(e) => {
            log::warn!("{}. Using defaults.", e);
            ScoreConfig::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn empty_toml_yields_defaults() {
        let config = parse_and_validate_config("").unwrap();
        assert_eq!(config, ScoreConfig::default());
    }

    #[test]
    fn partial_override_is_merged_over_defaults() {
        let config = parse_and_validate_config(
            "[thresholds]\ncold = 25.0\n\n[weights]\ncontacts_max = 10.0\n",
        )
        .unwrap();
        assert!((config.thresholds.cold - 25.0).abs() < 1e-9);
        assert!((config.thresholds.warm - 66.0).abs() < 1e-9);
        assert!(config.weights.validate().is_ok());
    }

    #[test]
    fn invalid_weight_sum_is_normalized() {
        let config = parse_and_validate_config("[weights]\ndeal_max = 50.0\n").unwrap();
        assert!(config.weights.validate().is_ok());
    }

    #[test]
    fn negative_sub_factor_weight_falls_back_to_defaults() {
        // Sums to 1.0, so only the range check catches it. Normalizing
        // cannot repair a negative share, so the whole weight set resets.
        let config = parse_and_validate_config(
            "[weights.deal]\nvalue_weight = -0.5\nprobability_weight = 1.0\npriority_weight = 0.5\n",
        )
        .unwrap();
        assert_eq!(config.weights, ScoreWeights::default());
    }

    #[test]
    fn invalid_thresholds_fall_back_to_defaults() {
        let config =
            parse_and_validate_config("[thresholds]\ncold = 90.0\nwarm = 10.0\n").unwrap();
        assert_eq!(config.thresholds, ScoreThresholds::default());
    }

    #[test]
    fn garbage_toml_is_an_error() {
        assert!(parse_and_validate_config("not [ valid").is_err());
    }

    #[test]
    fn load_config_reads_file_and_defaults_on_missing() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[thresholds]\ncold = 20.0\nwarm = 70.0").unwrap();
        let config = load_config(file.path());
        assert!((config.thresholds.warm - 70.0).abs() < 1e-9);

        let missing = load_config(Path::new("/nonexistent/.leadmap.toml"));
        assert_eq!(missing, ScoreConfig::default());
    }
}
