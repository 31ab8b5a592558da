//! morf-core
//!
//! Stiffness learning for MOF linkers.
//!
//! - `.npy` feature/property loading in the run directory layout
//! - a PointNet regressor on candle
//! - the [`Learner`] that predicts, collects training data and fits the model
//!
//! ```shell
//! cargo test -p morf-core
//! cargo test -p morf-core --features metal
//! ```
use candle_core::utils::{cuda_is_available, metal_is_available};
use candle_core::Device;
use tracing::info;

pub use config::{LearnerConfig, ModelConfig, TrainingConfig, DEFAULT_BATCH_SIZE};
pub use data::{Batch, DataSet, Sample};
pub use error::{Error, Result};
pub use kinds::{FeatureKind, PropertyKind};
pub use learner::{FitReport, Learner};
pub use model::{PointNet, PointNetConfig};

pub mod config;
pub mod data;
pub mod error;
pub mod kinds;
pub mod learner;
pub mod model;

pub fn device(cpu: bool) -> Result<Device> {
    if cpu {
        info!("Using CPU");
        Ok(Device::Cpu)
    } else if cuda_is_available() {
        info!("Using GPU");
        Ok(Device::new_cuda(0)?)
    } else if metal_is_available() {
        info!("Using GPU");
        Ok(Device::new_metal(0)?)
    } else {
        #[cfg(all(target_os = "macos", target_arch = "aarch64"))]
        {
            info!("Using CPU, to run on GPU(metal), build with `--features metal`");
        }
        #[cfg(not(all(target_os = "macos", target_arch = "aarch64")))]
        {
            info!("Using CPU, to run on GPU, build with `--features cuda`");
        }
        Ok(Device::Cpu)
    }
}
