use serde::{Deserialize, Serialize};
use std::path::PathBuf;

pub const DEFAULT_MAX_SIMULATION: usize = 10;
pub const DEFAULT_SUBMIT_PROGRAM: &str = "submit_lammps_linker_deform_remote";

#[derive(Deserialize, Serialize, Debug, Clone, PartialEq)]
#[serde(deny_unknown_fields, rename_all = "kebab-case", default)]
pub struct SearchConfig {
    /// Directory holding `computation/` with the helper scripts.
    pub learn_dir: PathBuf,
    /// Interpreter used for the helper scripts.
    pub python: String,
    /// Simulations allowed to run at once.
    pub max_simulation: usize,
    pub submit_program: String,
    pub queue: String,
    /// Pause between polls for finished simulations.
    pub poll_interval_ms: u64,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            learn_dir: PathBuf::from("morfLearn"),
            python: "python3".to_string(),
            max_simulation: DEFAULT_MAX_SIMULATION,
            submit_program: DEFAULT_SUBMIT_PROGRAM.to_string(),
            queue: "short".to_string(),
            poll_interval_ms: 5000,
        }
    }
}
