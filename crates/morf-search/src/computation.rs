//! Feature and property computation through the helper scripts.
//!
//! The scripts live in `<learn_dir>/computation/` and are called as
//! `<python> <script> <input> <output dir>`.
use crate::error::{Error, Result};
use morf_core::data::{self, POSSIBLE_DIR};
use morf_core::{FeatureKind, PropertyKind};
use std::fs;
use std::path::{Path, PathBuf};
use std::process::{Command, Output};
use tracing::{debug, info};

pub fn lmpdat_name(linker_id: &str) -> String {
    format!("linker{linker_id}.lmpdat")
}

#[derive(Debug, Clone)]
pub struct Computation {
    data_dir: PathBuf,
    script_dir: PathBuf,
    feature_dir: PathBuf,
    property_dir: PathBuf,
    feature: FeatureKind,
    property: PropertyKind,
    python: String,
}

impl Computation {
    /// Starts a fresh run: the feature and property directories of `run_dir`
    /// are removed and created again.
    pub fn new(
        run_dir: &Path,
        learn_dir: &Path,
        feature: FeatureKind,
        property: PropertyKind,
        python: impl Into<String>,
    ) -> Result<Self> {
        let computation = Self::layout(run_dir, learn_dir, feature, property, python)?;
        for dir in [&computation.feature_dir, &computation.property_dir] {
            if dir.exists() {
                fs::remove_dir_all(dir)?;
            }
            fs::create_dir_all(dir)?;
        }
        info!("reset {} and {}", computation.feature_dir.display(), computation.property_dir.display());
        Ok(computation)
    }

    /// Continues an existing run, keeping whatever was computed already.
    pub fn open(
        run_dir: &Path,
        learn_dir: &Path,
        feature: FeatureKind,
        property: PropertyKind,
        python: impl Into<String>,
    ) -> Result<Self> {
        let computation = Self::layout(run_dir, learn_dir, feature, property, python)?;
        fs::create_dir_all(&computation.feature_dir)?;
        fs::create_dir_all(&computation.property_dir)?;
        Ok(computation)
    }

    /// Scripts run inside the learn dir, so every path handed to them is made
    /// absolute first.
    fn layout(
        run_dir: &Path,
        learn_dir: &Path,
        feature: FeatureKind,
        property: PropertyKind,
        python: impl Into<String>,
    ) -> Result<Self> {
        let run_dir = std::path::absolute(run_dir)?;
        let learn_dir = std::path::absolute(learn_dir)?;
        Ok(Self {
            data_dir: run_dir.join("data"),
            script_dir: learn_dir.join("computation"),
            feature_dir: data::feature_dir(&run_dir, feature),
            property_dir: data::property_dir(&run_dir, property),
            feature,
            property,
            python: python.into(),
        })
    }

    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }

    pub fn feature_dir(&self) -> &Path {
        &self.feature_dir
    }

    pub fn property_dir(&self) -> &Path {
        &self.property_dir
    }

    pub fn lmpdat_path(&self, linker_id: &str, is_possible: bool) -> PathBuf {
        let dir = if is_possible {
            self.data_dir.join(POSSIBLE_DIR)
        } else {
            self.data_dir.clone()
        };
        dir.join(lmpdat_name(linker_id))
    }

    /// Averaged force output written by the deformation simulation. Its
    /// presence means the simulation finished.
    pub fn simulation_output(&self, linker_id: &str) -> PathBuf {
        self.data_dir
            .join(format!("linker{linker_id}_deformation"))
            .join(format!("linker{linker_id}-ave-force.d"))
    }

    pub fn is_simulated(&self, linker_id: &str) -> bool {
        self.simulation_output(linker_id).is_file()
    }

    /// Runs the feature script on `data/[possible/]linker<id>.lmpdat`.
    pub fn calculate_feature(&self, linker_id: &str, is_possible: bool) -> Result<()> {
        let input = self.lmpdat_path(linker_id, is_possible);
        let output_dir = if is_possible {
            self.feature_dir.join(POSSIBLE_DIR)
        } else {
            self.feature_dir.clone()
        };
        fs::create_dir_all(&output_dir)?;
        self.run_script(self.feature.script(), &input, &output_dir)?;
        debug!("{} feature computed for linker {}", self.feature, linker_id);
        Ok(())
    }

    /// Runs the property script on the simulation output and returns what it
    /// printed.
    pub fn calculate_property(&self, linker_id: &str) -> Result<String> {
        let input = self.simulation_output(linker_id);
        let output = self.run_script(self.property.script(), &input, &self.property_dir)?;
        let value = String::from_utf8_lossy(&output.stdout).trim().to_string();
        debug!("{} of linker {}: {}", self.property, linker_id, value);
        Ok(value)
    }

    fn run_script(&self, script: &str, input: &Path, output_dir: &Path) -> Result<Output> {
        if !input.is_file() {
            return Err(Error::MissingFile {
                path: input.to_path_buf(),
            });
        }
        let output = Command::new(&self.python)
            .arg(script)
            .arg(input)
            .arg(output_dir)
            .current_dir(&self.script_dir)
            .output()
            .map_err(|source| Error::Spawn {
                program: self.python.clone(),
                source,
            })?;
        if !output.status.success() {
            return Err(Error::Script {
                script: script.to_string(),
                status: output.status.to_string(),
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }
        Ok(output)
    }
}
