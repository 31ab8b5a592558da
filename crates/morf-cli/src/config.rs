use anyhow::{Context, Result};
use morf_core::LearnerConfig;
use morf_search::SearchConfig;
use morf_server::ServerConfig;
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::debug;

/// Contents of a `morf.toml` file. Every section is optional.
///
/// ```toml
/// [learner]
/// data-dir = "runs/estimator"
/// task = 1
///
/// [learner.training]
/// learning-rate = 0.001
///
/// [search]
/// max-simulation = 10
///
/// [server]
/// port = 9996
/// ```
#[derive(Deserialize, Serialize, Debug, Default, Clone, PartialEq)]
#[serde(deny_unknown_fields, rename_all = "kebab-case", default)]
pub struct MorfConfig {
    pub learner: LearnerConfig,
    pub search: SearchConfig,
    pub server: ServerConfig,
}

impl MorfConfig {
    pub fn from_toml(content: &str) -> Result<Self> {
        Ok(toml::from_str(content)?)
    }

    /// Reads the config file, or the defaults when no file is given.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let Some(path) = path else {
            debug!("no config file given, using defaults");
            return Ok(Self::default());
        };
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("reading config file {}", path.display()))?;
        let config = Self::from_toml(&content)
            .with_context(|| format!("parsing config file {}", path.display()))?;
        debug!("loaded config from {}: {:?}", path.display(), config);
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use morf_core::FeatureKind;
    use std::path::PathBuf;

    #[test]
    fn test_empty_file_gives_defaults() {
        assert_eq!(MorfConfig::from_toml("").unwrap(), MorfConfig::default());
        assert_eq!(MorfConfig::default().server.port, 9996);
        assert_eq!(MorfConfig::default().search.max_simulation, 10);
        assert_eq!(MorfConfig::default().learner.training.batch_size, 32);
    }

    #[test]
    fn test_partial_sections() {
        let config = MorfConfig::from_toml(
            r#"
            [learner]
            data-dir = "runs/estimator"
            task = 2
            feature = "point"

            [learner.model]
            point-dims = [32, 64]

            [search]
            python = "/usr/bin/python3"
            "#,
        )
        .unwrap();
        assert_eq!(config.learner.data_dir, PathBuf::from("runs/estimator"));
        assert_eq!(config.learner.task, 2);
        assert_eq!(config.learner.feature, FeatureKind::Point);
        assert_eq!(config.learner.model.point_dims, vec![32, 64]);
        assert_eq!(config.learner.model.head_dims, vec![128, 64]);
        assert_eq!(config.search.python, "/usr/bin/python3");
        assert_eq!(config.search.queue, "short");
    }

    #[test]
    fn test_unknown_kinds_and_keys_are_rejected() {
        assert!(MorfConfig::from_toml("[learner]\nfeature = \"graph\"\n").is_err());
        assert!(MorfConfig::from_toml("[learner]\nproperty = \"density\"\n").is_err());
        assert!(MorfConfig::from_toml("[learner]\nepochs = 3\n").is_err());
        assert!(MorfConfig::from_toml("[scheduler]\n").is_err());
    }
}
