use super::commands;
use crate::config::MorfConfig;
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;
use tracing::debug;

#[derive(Parser, Debug)]
#[command(
    author,
    version,
    about = "Learn and predict MOF linker stiffness from point-cloud features",
    long_about = None
)]
#[command(propagate_version = true)]
pub struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Increase verbosity level (-v for INFO, -vv for DEBUG, -vvv for TRACE)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress all log output except for errors
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Write logs to a file in addition to stderr
    #[arg(long, global = true, value_name = "PATH")]
    pub log_file: Option<PathBuf>,

    /// Configuration file in TOML format
    #[arg(short, long, global = true, value_name = "PATH")]
    config: Option<PathBuf>,

    /// Run directory, overriding `learner.data-dir`
    #[arg(short, long, global = true, value_name = "PATH")]
    data_dir: Option<PathBuf>,

    /// Stay on the CPU even when a GPU is available
    #[arg(long, global = true)]
    cpu: bool,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Predict the property of one or more linkers.
    Predict {
        /// Linker names (feature file stems).
        #[arg(required = true)]
        linkers: Vec<String>,
        /// Network weights written by `train`.
        #[arg(short, long, value_name = "PATH")]
        weights: Option<PathBuf>,
        /// Read features of candidate linkers from `possible/`.
        #[arg(long)]
        possible: bool,
    },
    /// Fit the network on linkers with known properties.
    Train(TrainArgs),
    /// Serve a learner over TCP.
    Serve {
        #[arg(long)]
        host: Option<String>,
        #[arg(short, long)]
        port: Option<u16>,
        #[arg(short, long, value_name = "PATH")]
        weights: Option<PathBuf>,
    },
    /// Run the helper scripts that compute features or properties.
    Compute {
        #[command(subcommand)]
        target: ComputeTarget,
    },
    /// Submit deformation simulations and collect the resulting properties.
    Submit(SubmitArgs),
}

#[derive(Args, Debug)]
pub struct TrainArgs {
    /// Linkers to train on; defaults to every linker with a property file.
    #[arg(long, num_args = 1..)]
    pub linkers: Vec<String>,
    /// Number of optimisation steps.
    #[arg(short, long, default_value_t = 100)]
    pub steps: usize,
    /// Where to write the trained weights.
    #[arg(short, long, value_name = "PATH", default_value = "weights.safetensors")]
    pub output: PathBuf,
    /// Start from these weights instead of a fresh network.
    #[arg(short, long, value_name = "PATH")]
    pub weights: Option<PathBuf>,
    /// Write the losses as JSON.
    #[arg(long, value_name = "PATH")]
    pub report: Option<PathBuf>,
}

#[derive(Subcommand, Debug)]
pub enum ComputeTarget {
    /// Compute features from `data/linker<id>.lmpdat`.
    Feature {
        #[arg(required = true)]
        ids: Vec<String>,
        /// Use `data/possible/` and write to `feature/<kind>/possible/`.
        #[arg(long)]
        possible: bool,
    },
    /// Compute properties from finished deformation simulations.
    Property {
        #[arg(required = true)]
        ids: Vec<String>,
    },
}

#[derive(Args, Debug)]
pub struct SubmitArgs {
    /// File with one `<linker> [priority]` per line.
    #[arg(required = true, value_name = "PATH")]
    pub jobs: PathBuf,
    /// Where to append `<linker> <property>` lines.
    #[arg(short, long, value_name = "PATH", default_value = "properties.txt")]
    pub output: PathBuf,
    /// Rank linkers without a priority by predicted stiffness, stiffest first.
    #[arg(short, long, value_name = "PATH")]
    pub weights: Option<PathBuf>,
    /// Override `search.max-simulation`.
    #[arg(long)]
    pub max_simulation: Option<usize>,
}

impl Cli {
    pub fn execute(self) -> anyhow::Result<()> {
        let mut config = MorfConfig::load(self.config.as_deref())?;
        if let Some(data_dir) = self.data_dir {
            config.learner.data_dir = data_dir;
        }
        debug!("running {:?}", self.command);

        match self.command {
            Commands::Predict {
                linkers,
                weights,
                possible,
            } => commands::predict::execute(&config, self.cpu, &linkers, weights, possible),
            Commands::Train(args) => commands::train::execute(&config, self.cpu, args),
            Commands::Serve {
                host,
                port,
                weights,
            } => {
                if let Some(host) = host {
                    config.server.host = host;
                }
                if let Some(port) = port {
                    config.server.port = port;
                }
                commands::serve::execute(&config, self.cpu, weights)
            }
            Commands::Compute { target } => commands::compute::execute(&config, target),
            Commands::Submit(args) => commands::submit::execute(&config, self.cpu, args),
        }
    }
}
