//! PointNet regressor
//!
//! A shared per-point MLP lifts every point of the cloud, a max-pool over the
//! points gives a permutation invariant global descriptor, and a small MLP
//! head regresses the property values from it.
//!
//! Reference: Qi et al., "PointNet: Deep Learning on Point Sets for 3D
//! Classification and Segmentation" (2017). The input/feature transform
//! networks of the paper are not used.
use candle_core::{Module, Result, Tensor};
use candle_nn::{linear, Linear, VarBuilder};

#[derive(Debug, Clone, PartialEq)]
pub struct PointNetConfig {
    pub in_channels: usize,
    pub point_dims: Vec<usize>,
    pub head_dims: Vec<usize>,
    /// Output width.
    pub task: usize,
}

pub struct PointNet {
    point_mlp: Vec<Linear>,
    head: Vec<Linear>,
    output: Linear,
    config: PointNetConfig,
}

impl PointNet {
    pub fn new(config: &PointNetConfig, vb: VarBuilder) -> Result<Self> {
        let mut width = config.in_channels;

        let mut point_mlp = Vec::with_capacity(config.point_dims.len());
        for (idx, &dim) in config.point_dims.iter().enumerate() {
            point_mlp.push(linear(width, dim, vb.pp(format!("point_mlp.{idx}")))?);
            width = dim;
        }

        let mut head = Vec::with_capacity(config.head_dims.len());
        for (idx, &dim) in config.head_dims.iter().enumerate() {
            head.push(linear(width, dim, vb.pp(format!("head.{idx}")))?);
            width = dim;
        }
        let output = linear(width, config.task, vb.pp("output"))?;

        Ok(Self {
            point_mlp,
            head,
            output,
            config: config.clone(),
        })
    }

    pub fn config(&self) -> &PointNetConfig {
        &self.config
    }

    /// Global descriptor `[B, point_dims.last()]` of a batch of clouds `[B, N, C]`.
    pub fn encode(&self, xs: &Tensor) -> Result<Tensor> {
        let (_batch, _points, _channels) = xs.dims3()?;
        let mut x = xs.clone();
        for layer in &self.point_mlp {
            x = layer.forward(&x)?.relu()?;
        }
        x.max(1)
    }
}

impl Module for PointNet {
    /// `[B, N, C]` -> `[B, task]`
    fn forward(&self, xs: &Tensor) -> Result<Tensor> {
        let mut x = self.encode(xs)?;
        for layer in &self.head {
            x = layer.forward(&x)?.relu()?;
        }
        self.output.forward(&x)
    }
}
