use crate::config::MorfConfig;
use std::path::PathBuf;

pub fn execute(
    config: &MorfConfig,
    cpu: bool,
    linkers: &[String],
    weights: Option<PathBuf>,
    possible: bool,
) -> anyhow::Result<()> {
    if weights.is_none() {
        tracing::warn!("no weights given; predictions come from an untrained network");
    }
    let learner = super::load_learner(config, cpu, weights)?;
    for linker in linkers {
        let estimate = if possible {
            learner.predict_possible(linker)?
        } else {
            learner.predict(linker)?
        };
        let values: Vec<String> = estimate.iter().map(|v| v.to_string()).collect();
        println!("{} {}", linker, values.join(" "));
    }
    Ok(())
}
