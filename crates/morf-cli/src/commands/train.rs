use crate::cli::TrainArgs;
use crate::config::MorfConfig;
use anyhow::bail;
use morf_core::data;
use serde::Serialize;
use tracing::info;

#[derive(Serialize)]
struct TrainReport<'a> {
    linkers: &'a [String],
    steps: usize,
    losses: &'a [f32],
    final_mse: f32,
}

pub fn execute(config: &MorfConfig, cpu: bool, args: TrainArgs) -> anyhow::Result<()> {
    let mut learner = super::load_learner(config, cpu, args.weights)?;

    let linkers = if args.linkers.is_empty() {
        let dir = data::property_dir(&config.learner.data_dir, config.learner.property);
        data::scan_linkers(&dir)?
    } else {
        args.linkers
    };
    if linkers.is_empty() {
        bail!(
            "no linkers with {} properties under {}",
            config.learner.property,
            config.learner.data_dir.display()
        );
    }
    for linker in &linkers {
        learner.add_data(linker)?;
    }
    info!("training on {} linkers for {} steps", linkers.len(), args.steps);

    let losses = learner.train(args.steps)?;
    let final_mse = learner.evaluate()?;
    learner.save(&args.output)?;
    println!("final mse {final_mse:.6}, weights written to {}", args.output.display());

    if let Some(path) = args.report {
        let report = TrainReport {
            linkers: &linkers,
            steps: args.steps,
            losses: &losses,
            final_mse,
        };
        std::fs::write(&path, serde_json::to_string_pretty(&report)?)?;
        info!("report written to {}", path.display());
    }
    Ok(())
}
