pub mod compute;
pub mod predict;
pub mod serve;
pub mod submit;
pub mod train;

use crate::config::MorfConfig;
use morf_core::Learner;
use std::path::PathBuf;

/// Builds the learner described by the config, optionally restoring weights.
pub(crate) fn load_learner(
    config: &MorfConfig,
    cpu: bool,
    weights: Option<PathBuf>,
) -> anyhow::Result<Learner> {
    let device = morf_core::device(cpu)?;
    let mut learner = Learner::new(config.learner.clone(), device)?;
    if let Some(weights) = weights {
        learner.load(weights)?;
    }
    Ok(learner)
}
