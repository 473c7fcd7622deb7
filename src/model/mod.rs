//! Regression model backends behind one [`Predictor`] seam.

use std::path::Path;

use crate::error::ModelError;

#[cfg(feature = "torch")]
pub mod torch;
pub mod xgboost;

pub use xgboost::XgbModel;

/// A loaded, read-only regression model. One vector in, one price out.
pub trait Predictor: Send + Sync {
    fn predict(&self, x: &[f32]) -> Result<f32, ModelError>;

    /// Input width the artifact declares, when it declares one.
    fn input_dim(&self) -> Option<usize>;

    /// Feature names embedded in the artifact, if any.
    fn feature_names(&self) -> Option<&[String]> {
        None
    }

    fn describe(&self) -> String;
}

/// Load a model artifact, picking the backend from the file extension.
///
/// `in_dim` is the schema width; backends use it to validate or probe the
/// artifact.
pub fn load(path: impl AsRef<Path>, in_dim: usize) -> Result<Box<dyn Predictor>, ModelError> {
    let path = path.as_ref();
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_ascii_lowercase)
        .unwrap_or_default();

    match ext.as_str() {
        "json" => {
            let model = XgbModel::load(path)?;
            if let Some(dim) = model.input_dim() {
                if dim != in_dim {
                    return Err(ModelError::FeatureLength {
                        got: in_dim,
                        expected: dim,
                    });
                }
            }
            Ok(Box::new(model))
        }
        "pt" | "ts" | "torchscript" => load_torch(path, in_dim),
        other => Err(ModelError::Unsupported(format!(
            "no backend for model file extension {:?} ({})",
            other,
            path.display()
        ))),
    }
}

#[cfg(feature = "torch")]
fn load_torch(path: &Path, in_dim: usize) -> Result<Box<dyn Predictor>, ModelError> {
    Ok(Box::new(torch::TorchModel::load(path, in_dim)?))
}

#[cfg(not(feature = "torch"))]
fn load_torch(path: &Path, _in_dim: usize) -> Result<Box<dyn Predictor>, ModelError> {
    Err(ModelError::Unsupported(format!(
        "{} is a TorchScript module; rebuild with the `torch` feature",
        path.display()
    )))
}

pub(crate) fn check_len(x: &[f32], expected: usize) -> Result<(), ModelError> {
    if x.len() != expected {
        return Err(ModelError::FeatureLength {
            got: x.len(),
            expected,
        });
    }
    Ok(())
}
