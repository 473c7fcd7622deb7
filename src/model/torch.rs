use std::path::Path;
use tch::{kind::Kind, CModule, Device, Tensor};

use super::{check_len, Predictor};
use crate::error::ModelError;

/// TorchScript regression module returning one value per row.
pub struct TorchModel {
    model: CModule,
    device: Device,
    in_dim: usize,
    path: String,
}

impl TorchModel {
    pub fn load(path: &Path, in_dim: usize) -> Result<Self, ModelError> {
        let device = Device::Cpu;

        let model = CModule::load_on_device(path, device)?;

        // Probe output shape with a dummy forward; expect a single value for [1, in_dim]
        let dummy = Tensor::zeros([1, in_dim as i64], (Kind::Float, device));
        let t = model.forward_ts(&[dummy])?;
        if t.numel() != 1 {
            return Err(ModelError::Malformed(format!(
                "expected one output value, got shape {:?}",
                t.size()
            )));
        }

        Ok(Self {
            model,
            device,
            in_dim,
            path: path.display().to_string(),
        })
    }
}

impl Predictor for TorchModel {
    fn predict(&self, x: &[f32]) -> Result<f32, ModelError> {
        check_len(x, self.in_dim)?;

        let input = Tensor::from_slice(x)
            .reshape([1, self.in_dim as i64])
            .to_device(self.device);

        let t = self.model.forward_ts(&[input])?;
        let price = t.to_kind(Kind::Double).reshape([-1]).double_value(&[0]);
        Ok(price as f32)
    }

    fn input_dim(&self) -> Option<usize> {
        Some(self.in_dim)
    }

    fn describe(&self) -> String {
        format!("torchscript {} (in_dim={})", self.path, self.in_dim)
    }
}
