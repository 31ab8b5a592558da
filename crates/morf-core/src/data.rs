//! Linker data on disk and in memory.
//!
//! Every linker has one feature file and, once simulated, one property file:
//!
//! ```text
//! <data_dir>/feature/<feature>/<linker>.npy
//! <data_dir>/property/<property>/<linker>.npy
//! ```
use crate::error::{Error, Result};
use crate::kinds::{FeatureKind, PropertyKind};
use candle_core::{Device, Tensor};
use ndarray::ArrayD;
use ndarray_npy::{read_npy, ReadNpyError};
use rand::seq::index;
use rand::Rng;
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, trace};

pub const POSSIBLE_DIR: &str = "possible";

pub fn feature_dir(data_dir: &Path, feature: FeatureKind) -> PathBuf {
    data_dir.join("feature").join(feature.as_str())
}

pub fn property_dir(data_dir: &Path, property: PropertyKind) -> PathBuf {
    data_dir.join("property").join(property.as_str())
}

pub fn feature_path(data_dir: &Path, feature: FeatureKind, linker: &str) -> PathBuf {
    feature_dir(data_dir, feature).join(format!("{linker}.npy"))
}

/// Feature of a candidate linker that has not been committed to the run.
pub fn possible_feature_path(data_dir: &Path, feature: FeatureKind, linker: &str) -> PathBuf {
    feature_dir(data_dir, feature)
        .join(POSSIBLE_DIR)
        .join(format!("{linker}.npy"))
}

pub fn property_path(data_dir: &Path, property: PropertyKind, linker: &str) -> PathBuf {
    property_dir(data_dir, property).join(format!("{linker}.npy"))
}

/// Reads an `.npy` file stored as `f32` or `f64`.
pub fn load_array(path: &Path) -> Result<ArrayD<f32>> {
    if !path.is_file() {
        return Err(Error::MissingFile {
            path: path.to_path_buf(),
        });
    }
    match read_npy::<_, ArrayD<f32>>(path) {
        Ok(array) => Ok(array),
        Err(ReadNpyError::WrongDescriptor(_)) => {
            trace!("{} is not f32, retrying as f64", path.display());
            let array: ArrayD<f64> = read_npy(path).map_err(|source| Error::Npy {
                path: path.to_path_buf(),
                source,
            })?;
            Ok(array.mapv(|v| v as f32))
        }
        Err(source) => Err(Error::Npy {
            path: path.to_path_buf(),
            source,
        }),
    }
}

pub fn array_to_tensor(array: &ArrayD<f32>, device: &Device) -> Result<Tensor> {
    let data: Vec<f32> = array.iter().copied().collect();
    Ok(Tensor::from_vec(data, array.shape(), device)?)
}

/// Linker names (file stems of `*.npy`) in a directory, sorted.
pub fn scan_linkers(dir: &Path) -> Result<Vec<String>> {
    let mut names = Vec::new();
    for entry in fs::read_dir(dir)? {
        let path = entry?.path();
        if path.is_file() && path.extension().is_some_and(|ext| ext == "npy") {
            if let Some(stem) = path.file_stem() {
                names.push(stem.to_string_lossy().into_owned());
            }
        }
    }
    names.sort();
    Ok(names)
}

#[derive(Debug, Clone)]
pub struct Sample {
    pub feature: ArrayD<f32>,
    pub property: ArrayD<f32>,
}

/// A stacked training batch.
#[derive(Debug)]
pub struct Batch {
    pub keys: Vec<String>,
    /// `[batch, points, channels]`
    pub features: Tensor,
    /// `[batch, task]`
    pub properties: Tensor,
}

/// Samples keyed by linker name. Re-adding a linker replaces it.
#[derive(Debug, Default, Clone)]
pub struct DataSet {
    samples: BTreeMap<String, Sample>,
}

impl DataSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, linker: impl Into<String>, sample: Sample) -> usize {
        self.samples.insert(linker.into(), sample);
        self.samples.len()
    }

    pub fn get(&self, linker: &str) -> Option<&Sample> {
        self.samples.get(linker)
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.samples.keys().map(String::as_str)
    }

    /// Draws up to `max_batch` distinct linkers and stacks their arrays.
    pub fn sample_batch<R: Rng + ?Sized>(
        &self,
        max_batch: usize,
        rng: &mut R,
        device: &Device,
    ) -> Result<Batch> {
        if self.samples.is_empty() {
            return Err(Error::EmptyDataSet);
        }
        let size = self.samples.len().min(max_batch.max(1));
        let names: Vec<&String> = self.samples.keys().collect();
        let keys: Vec<String> = index::sample(rng, names.len(), size)
            .into_iter()
            .map(|i| names[i].clone())
            .collect();
        debug!("sampled batch of {} from {} linkers", size, names.len());
        self.stack(keys, device)
    }

    /// Stacks the named samples; every feature must share one shape and
    /// every property one length.
    pub fn stack(&self, keys: Vec<String>, device: &Device) -> Result<Batch> {
        let first = keys
            .first()
            .and_then(|key| self.samples.get(key))
            .ok_or(Error::EmptyDataSet)?;
        let feature_shape = first.feature.shape().to_vec();
        let property_len = first.property.len();

        let mut features = Vec::with_capacity(keys.len() * first.feature.len());
        let mut properties = Vec::with_capacity(keys.len() * property_len);
        for key in &keys {
            let sample = self
                .samples
                .get(key)
                .ok_or_else(|| Error::UnknownLinker(key.clone()))?;
            if sample.feature.shape() != feature_shape.as_slice() {
                return Err(Error::ShapeMismatch {
                    linker: key.clone(),
                    expected: feature_shape,
                    found: sample.feature.shape().to_vec(),
                });
            }
            if sample.property.len() != property_len {
                return Err(Error::ShapeMismatch {
                    linker: key.clone(),
                    expected: vec![property_len],
                    found: vec![sample.property.len()],
                });
            }
            features.extend(sample.feature.iter().copied());
            properties.extend(sample.property.iter().copied());
        }

        let mut batch_shape = vec![keys.len()];
        batch_shape.extend_from_slice(&feature_shape);
        let features = Tensor::from_vec(features, batch_shape, device)?;
        let properties = Tensor::from_vec(properties, (keys.len(), property_len), device)?;
        Ok(Batch {
            keys,
            features,
            properties,
        })
    }
}
