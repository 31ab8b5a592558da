//! Learner
//!
//! Wraps a [`PointNet`] together with the linkers collected so far. The search
//! side asks it for predictions on new linkers and feeds it simulated ones as
//! they finish.
use crate::config::LearnerConfig;
use crate::data::{self, DataSet, Sample};
use crate::error::{Error, Result};
use crate::model::PointNet;
use candle_core::{DType, Device, Module, Tensor};
use candle_nn::{AdamW, Optimizer, ParamsAdamW, VarBuilder, VarMap};
use ndarray::ArrayD;
use rand::rngs::StdRng;
use rand::SeedableRng;
use serde::Serialize;
use std::path::Path;
use tracing::{debug, info};

/// Outcome of one optimisation step.
#[derive(Debug, Clone, Serialize)]
pub struct FitReport {
    pub keys: Vec<String>,
    pub feature_shape: Vec<usize>,
    pub property_shape: Vec<usize>,
    pub loss: f32,
}

pub struct Learner {
    config: LearnerConfig,
    device: Device,
    varmap: VarMap,
    model: PointNet,
    optimizer: AdamW,
    data_set: DataSet,
    rng: StdRng,
}

impl Learner {
    pub fn new(config: LearnerConfig, device: Device) -> Result<Self> {
        if config.task == 0 {
            return Err(Error::Config("task must be at least 1".to_string()));
        }
        if config.in_channels == 0 {
            return Err(Error::Config("in-channels must be at least 1".to_string()));
        }
        let varmap = VarMap::new();
        let vb = VarBuilder::from_varmap(&varmap, DType::F32, &device);
        let model = PointNet::new(&config.point_net(), vb)?;
        let params = ParamsAdamW {
            lr: config.training.learning_rate,
            weight_decay: config.training.weight_decay,
            ..Default::default()
        };
        let optimizer = AdamW::new(varmap.all_vars(), params)?;
        let rng = match config.training.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        debug!(
            "learner for {}/{} on {}, task {}",
            config.feature,
            config.property,
            config.data_dir.display(),
            config.task
        );

        Ok(Self {
            config,
            device,
            varmap,
            model,
            optimizer,
            data_set: DataSet::new(),
            rng,
        })
    }

    pub fn config(&self) -> &LearnerConfig {
        &self.config
    }

    pub fn device(&self) -> &Device {
        &self.device
    }

    pub fn data_set(&self) -> &DataSet {
        &self.data_set
    }

    pub fn len(&self) -> usize {
        self.data_set.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data_set.is_empty()
    }

    fn load_feature(&self, linker: &str, path: &Path) -> Result<ArrayD<f32>> {
        let feature = data::load_array(path)?;
        if feature.ndim() != 2 {
            return Err(Error::Rank {
                expected: 2,
                found: feature.ndim(),
            });
        }
        if feature.shape()[1] != self.config.in_channels {
            return Err(Error::ShapeMismatch {
                linker: linker.to_string(),
                expected: vec![feature.shape()[0], self.config.in_channels],
                found: feature.shape().to_vec(),
            });
        }
        Ok(feature)
    }

    fn predict_path(&self, linker: &str, path: &Path) -> Result<Vec<f32>> {
        let feature = self.load_feature(linker, path)?;
        let xs = data::array_to_tensor(&feature, &self.device)?.unsqueeze(0)?;
        let estimate = self.model.forward(&xs)?.squeeze(0)?;
        Ok(estimate.to_device(&Device::Cpu)?.to_vec1::<f32>()?)
    }

    /// Predicts the property of a linker from its stored feature.
    pub fn predict(&self, linker: &str) -> Result<Vec<f32>> {
        let path = data::feature_path(&self.config.data_dir, self.config.feature, linker);
        self.predict_path(linker, &path)
    }

    /// Predicts a candidate linker whose feature lives under `possible/`.
    pub fn predict_possible(&self, linker: &str) -> Result<Vec<f32>> {
        let path = data::possible_feature_path(&self.config.data_dir, self.config.feature, linker);
        self.predict_path(linker, &path)
    }

    /// Loads the feature and property of a linker into the data set and
    /// returns the new size of the data set.
    pub fn add_data(&mut self, linker: &str) -> Result<usize> {
        let dir = &self.config.data_dir;
        let feature = self.load_feature(
            linker,
            &data::feature_path(dir, self.config.feature, linker),
        )?;
        let property = data::load_array(&data::property_path(dir, self.config.property, linker))?;
        if property.len() != self.config.task {
            return Err(Error::ShapeMismatch {
                linker: linker.to_string(),
                expected: vec![self.config.task],
                found: property.shape().to_vec(),
            });
        }
        let size = self.data_set.insert(linker, Sample { feature, property });
        info!("added linker {} ({} in data set)", linker, size);
        Ok(size)
    }

    /// Draws a batch of at most `batch-size` linkers and takes one AdamW step
    /// on the mean squared error.
    pub fn fit_model(&mut self) -> Result<FitReport> {
        let batch = self.data_set.sample_batch(
            self.config.training.batch_size,
            &mut self.rng,
            &self.device,
        )?;
        let prediction = self.model.forward(&batch.features)?;
        let loss = candle_nn::loss::mse(&prediction, &batch.properties)?;
        self.optimizer.backward_step(&loss)?;
        let loss = loss.to_scalar::<f32>()?;
        debug!("fit on {} linkers, loss {:.6}", batch.keys.len(), loss);

        Ok(FitReport {
            feature_shape: batch.features.dims().to_vec(),
            property_shape: batch.properties.dims().to_vec(),
            keys: batch.keys,
            loss,
        })
    }

    /// Runs `steps` calls of [`Learner::fit_model`] and returns their losses.
    pub fn train(&mut self, steps: usize) -> Result<Vec<f32>> {
        let mut losses = Vec::with_capacity(steps);
        for step in 0..steps {
            let report = self.fit_model()?;
            if step % 10 == 0 || step + 1 == steps {
                info!("step {:>5}  loss {:.6}", step, report.loss);
            }
            losses.push(report.loss);
        }
        Ok(losses)
    }

    /// Mean squared error over every linker in the data set.
    pub fn evaluate(&self) -> Result<f32> {
        let keys: Vec<String> = self.data_set.names().map(String::from).collect();
        let batch = self.data_set.stack(keys, &self.device)?;
        let prediction = self.model.forward(&batch.features)?;
        let loss: Tensor = candle_nn::loss::mse(&prediction, &batch.properties)?;
        Ok(loss.to_scalar::<f32>()?)
    }

    /// Saves the network weights as safetensors.
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        self.varmap.save(path.as_ref())?;
        info!("saved weights to {}", path.as_ref().display());
        Ok(())
    }

    /// Loads network weights written by [`Learner::save`].
    pub fn load<P: AsRef<Path>>(&mut self, path: P) -> Result<()> {
        let path = path.as_ref();
        if !path.is_file() {
            return Err(Error::MissingFile {
                path: path.to_path_buf(),
            });
        }
        self.varmap.load(path)?;
        info!("loaded weights from {}", path.display());
        Ok(())
    }
}
