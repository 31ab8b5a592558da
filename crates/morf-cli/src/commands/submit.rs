use crate::cli::SubmitArgs;
use crate::config::MorfConfig;
use anyhow::{bail, Context};
use morf_core::Learner;
use morf_search::{CommandSubmitter, Computation, JobBuffer};
use rand::Rng;
use std::fs::OpenOptions;
use std::path::Path;
use std::time::Duration;
use tracing::info;

/// A line of the jobs file.
#[derive(Debug, Clone, PartialEq)]
pub struct JobLine {
    pub linker: String,
    pub priority: Option<f64>,
}

/// Parses `<linker> [priority]` lines; blank lines and `#` comments are
/// skipped.
pub fn parse_jobs(content: &str) -> anyhow::Result<Vec<JobLine>> {
    let mut jobs = Vec::new();
    for (number, line) in content.lines().enumerate() {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        let mut fields = line.split_whitespace();
        let linker = fields.next().map(str::to_string).unwrap_or_default();
        let priority = fields
            .next()
            .map(|p| p.parse::<f64>())
            .transpose()
            .with_context(|| format!("line {}: bad priority", number + 1))?;
        if fields.next().is_some() {
            bail!("line {}: expected `<linker> [priority]`", number + 1);
        }
        jobs.push(JobLine { linker, priority });
    }
    Ok(jobs)
}

/// Negated predicted stiffness, so the stiffest candidate is submitted first.
fn estimated_priority(learner: &Learner, linker: &str) -> anyhow::Result<f64> {
    let estimate = learner.predict(linker)?;
    let mean = estimate.iter().sum::<f32>() / estimate.len().max(1) as f32;
    Ok(-(mean as f64))
}

pub fn execute(config: &MorfConfig, cpu: bool, args: SubmitArgs) -> anyhow::Result<()> {
    let content = std::fs::read_to_string(&args.jobs)
        .with_context(|| format!("reading jobs file {}", args.jobs.display()))?;
    let jobs = parse_jobs(&content)?;
    if jobs.is_empty() {
        bail!("no jobs in {}", args.jobs.display());
    }

    let learner = match args.weights {
        Some(weights) => Some(super::load_learner(config, cpu, Some(weights))?),
        None => None,
    };

    let run_dir: &Path = &config.learner.data_dir;
    let computation = Computation::open(
        run_dir,
        &config.search.learn_dir,
        config.learner.feature,
        config.learner.property,
        config.search.python.clone(),
    )?;
    let submitter = CommandSubmitter::new(
        config.search.submit_program.clone(),
        config.search.queue.clone(),
        run_dir,
    );
    let max_simulation = args.max_simulation.unwrap_or(config.search.max_simulation);
    let mut buffer = JobBuffer::new(submitter, max_simulation);

    let mut rng = rand::thread_rng();
    for job in jobs {
        let priority = match (job.priority, &learner) {
            (Some(priority), _) => priority,
            (None, Some(learner)) => estimated_priority(learner, &job.linker)?,
            (None, None) => rng.gen::<f64>(),
        };
        buffer.add(job.linker, priority);
    }
    buffer.mark_all_submitted();
    info!("{} jobs queued, {} at a time", buffer.queued(), max_simulation);

    let mut sink = OpenOptions::new()
        .create(true)
        .append(true)
        .open(&args.output)
        .with_context(|| format!("opening {}", args.output.display()))?;
    buffer.run_to_completion(
        &computation,
        &mut sink,
        Duration::from_millis(config.search.poll_interval_ms),
    )?;
    println!("all jobs finished, properties in {}", args.output.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_jobs() {
        let jobs = parse_jobs("# linker priority\n0001 0.5\n\n0002\n  0003   -1e-2 \n").unwrap();
        assert_eq!(
            jobs,
            vec![
                JobLine {
                    linker: "0001".into(),
                    priority: Some(0.5)
                },
                JobLine {
                    linker: "0002".into(),
                    priority: None
                },
                JobLine {
                    linker: "0003".into(),
                    priority: Some(-0.01)
                },
            ]
        );
    }

    #[test]
    fn test_parse_jobs_rejects_garbage() {
        assert!(parse_jobs("0001 high\n").is_err());
        assert!(parse_jobs("0001 0.5 extra\n").is_err());
    }
}
