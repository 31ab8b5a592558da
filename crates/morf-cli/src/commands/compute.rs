use crate::cli::ComputeTarget;
use crate::config::MorfConfig;
use morf_search::Computation;

pub fn execute(config: &MorfConfig, target: ComputeTarget) -> anyhow::Result<()> {
    let computation = Computation::open(
        &config.learner.data_dir,
        &config.search.learn_dir,
        config.learner.feature,
        config.learner.property,
        config.search.python.clone(),
    )?;
    match target {
        ComputeTarget::Feature { ids, possible } => {
            for id in &ids {
                computation.calculate_feature(id, possible)?;
                println!("{id}");
            }
        }
        ComputeTarget::Property { ids } => {
            for id in &ids {
                let value = computation.calculate_property(id)?;
                println!("{id} {value}");
            }
        }
    }
    Ok(())
}
