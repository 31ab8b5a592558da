use crate::kinds::{FeatureKind, PropertyKind};
use crate::model::PointNetConfig;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Batches never hold more linkers than this unless configured otherwise.
pub const DEFAULT_BATCH_SIZE: usize = 32;

#[derive(Deserialize, Serialize, Debug, Clone, PartialEq)]
#[serde(deny_unknown_fields, rename_all = "kebab-case", default)]
pub struct ModelConfig {
    /// Widths of the shared per-point MLP.
    pub point_dims: Vec<usize>,
    /// Widths of the hidden layers of the regression head.
    pub head_dims: Vec<usize>,
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            point_dims: vec![64, 128, 256],
            head_dims: vec![128, 64],
        }
    }
}

#[derive(Deserialize, Serialize, Debug, Clone, PartialEq)]
#[serde(deny_unknown_fields, rename_all = "kebab-case", default)]
pub struct TrainingConfig {
    pub batch_size: usize,
    pub learning_rate: f64,
    pub weight_decay: f64,
    /// Seed for batch sampling; random when unset.
    pub seed: Option<u64>,
}

impl Default for TrainingConfig {
    fn default() -> Self {
        Self {
            batch_size: DEFAULT_BATCH_SIZE,
            learning_rate: 1e-3,
            weight_decay: 0.01,
            seed: None,
        }
    }
}

#[derive(Deserialize, Serialize, Debug, Clone, PartialEq)]
#[serde(deny_unknown_fields, rename_all = "kebab-case", default)]
pub struct LearnerConfig {
    /// Run directory holding `feature/` and `property/`.
    pub data_dir: PathBuf,
    /// Number of property values predicted per linker.
    pub task: usize,
    pub feature: FeatureKind,
    pub property: PropertyKind,
    /// Values per point in the feature arrays.
    pub in_channels: usize,
    pub model: ModelConfig,
    pub training: TrainingConfig,
}

impl Default for LearnerConfig {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from("."),
            task: 1,
            feature: FeatureKind::default(),
            property: PropertyKind::default(),
            in_channels: 3,
            model: ModelConfig::default(),
            training: TrainingConfig::default(),
        }
    }
}

impl LearnerConfig {
    pub fn new(data_dir: impl Into<PathBuf>, task: usize) -> Self {
        Self {
            data_dir: data_dir.into(),
            task,
            ..Default::default()
        }
    }

    pub fn point_net(&self) -> PointNetConfig {
        PointNetConfig {
            in_channels: self.in_channels,
            point_dims: self.model.point_dims.clone(),
            head_dims: self.model.head_dims.clone(),
            task: self.task,
        }
    }
}
