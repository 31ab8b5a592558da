//! morf-test-data
//!
//! A module to provide linker datasets for use in testing.
//!
//! The datasets are represented as `TestDataSet` objects which describe a
//! handful of synthetic linkers and write them, in the on-disk layout the
//! learner expects, into a temporary run directory.
use ndarray::{Array, ArrayD, IxDyn};
use ndarray_npy::write_npy;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use tempfile::{Builder, TempDir};

/// Element type used when writing arrays.
///
/// numpy defaults to `float64`, so most fixtures are written that way.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Precision {
    F32,
    F64,
}

#[derive(Debug, Clone)]
pub struct TestLinker {
    pub name: String,
    pub points: usize,
    /// Property values; an empty vec writes no property file, one value is
    /// written as a 0-d array.
    pub property: Vec<f64>,
    /// Also write the feature under `feature/<kind>/possible/`.
    pub possible: bool,
}

#[derive(Debug)]
/// Test Data Set
///
/// Example usage:
///
/// ```ignore
/// // returns (data_dir, _tempdir_handle).
/// // _handle ensures the directory remains in scope
/// use morf_test_data::TestDataSet;
/// let (data_dir, _temp) = TestDataSet::linkers_01().create_temp().unwrap();
/// ```
pub struct TestDataSet {
    pub feature: &'static str,
    pub property: &'static str,
    pub channels: usize,
    pub precision: Precision,
    pub linkers: Vec<TestLinker>,
}

fn linker(name: &str, points: usize, property: &[f64]) -> TestLinker {
    TestLinker {
        name: name.to_string(),
        points,
        property: property.to_vec(),
        possible: false,
    }
}

impl TestDataSet {
    /// Four linkers, 16 points each, scalar stiffness.
    pub fn linkers_01() -> Self {
        let mut linkers = vec![
            linker("0001", 16, &[1.5]),
            linker("0002", 16, &[2.0]),
            linker("0003", 16, &[0.75]),
            linker("0004", 16, &[3.25]),
        ];
        linkers[3].possible = true;
        Self {
            feature: "point",
            property: "stiff",
            channels: 3,
            precision: Precision::F64,
            linkers,
        }
    }

    /// Forty linkers so that a batch is capped at 32.
    pub fn linkers_02() -> Self {
        let linkers = (0..40)
            .map(|i| linker(&format!("{:04}", i), 8, &[0.1 * i as f64]))
            .collect();
        Self {
            feature: "point",
            property: "stiff",
            channels: 3,
            precision: Precision::F32,
            linkers,
        }
    }

    /// Two-valued property per linker.
    pub fn vector_property_01() -> Self {
        let linkers = vec![
            linker("a", 12, &[1.0, -1.0]),
            linker("b", 12, &[0.5, 0.25]),
            linker("c", 12, &[2.0, 0.0]),
        ];
        Self {
            feature: "point",
            property: "stiff",
            channels: 3,
            precision: Precision::F64,
            linkers,
        }
    }

    /// Linkers whose point clouds differ in size and cannot be batched.
    pub fn ragged_01() -> Self {
        let linkers = vec![linker("short", 6, &[1.0]), linker("long", 10, &[2.0])];
        Self {
            feature: "point",
            property: "stiff",
            channels: 3,
            precision: Precision::F64,
            linkers,
        }
    }

    /// Features present, properties missing.
    pub fn unlabelled_01() -> Self {
        let linkers = vec![linker("x1", 8, &[]), linker("x2", 8, &[])];
        Self {
            feature: "point",
            property: "stiff",
            channels: 3,
            precision: Precision::F64,
            linkers,
        }
    }

    pub fn names(&self) -> Vec<String> {
        self.linkers.iter().map(|l| l.name.clone()).collect()
    }

    /// Deterministic point cloud for a linker.
    pub fn point_cloud(&self, index: usize, points: usize) -> ArrayD<f64> {
        let channels = self.channels;
        Array::from_shape_fn(IxDyn(&[points, channels]), |ix| {
            let (p, c) = (ix[0] as f64, ix[1] as f64);
            ((index as f64 + 1.0) * 0.37 + p * 0.11 + c * 0.53).sin()
        })
    }

    /// Writes the dataset below `root`.
    pub fn write_to(&self, root: &Path) -> io::Result<()> {
        let feature_dir = root.join("feature").join(self.feature);
        let property_dir = root.join("property").join(self.property);
        fs::create_dir_all(&feature_dir)?;
        fs::create_dir_all(&property_dir)?;

        for (index, linker) in self.linkers.iter().enumerate() {
            let cloud = self.point_cloud(index, linker.points);
            let file = format!("{}.npy", linker.name);
            self.write_array(&feature_dir.join(&file), &cloud)?;
            if linker.possible {
                let possible = feature_dir.join("possible");
                fs::create_dir_all(&possible)?;
                self.write_array(&possible.join(&file), &cloud)?;
            }
            match linker.property.len() {
                0 => {}
                1 => {
                    let value = ArrayD::from_elem(IxDyn(&[]), linker.property[0]);
                    self.write_array(&property_dir.join(&file), &value)?;
                }
                n => {
                    let value = Array::from_shape_vec(IxDyn(&[n]), linker.property.clone())
                        .map_err(io::Error::other)?;
                    self.write_array(&property_dir.join(&file), &value)?;
                }
            }
        }
        Ok(())
    }

    fn write_array(&self, path: &Path, array: &ArrayD<f64>) -> io::Result<()> {
        match self.precision {
            Precision::F64 => write_npy(path, array).map_err(io::Error::other),
            Precision::F32 => {
                let array = array.mapv(|v| v as f32);
                write_npy(path, &array).map_err(io::Error::other)
            }
        }
    }

    pub fn create_temp(&self) -> io::Result<(PathBuf, TempDir)> {
        let temp = Builder::new().prefix("morf-run").tempdir()?;
        self.write_to(temp.path())?;
        let path = temp.path().to_path_buf();
        Ok((path, temp))
    }
}
