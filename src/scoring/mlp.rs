use std::path::Path;

use candle_core::{DType, Device, Tensor};
use candle_nn::{BatchNorm, Dropout, Linear, ModuleT, VarBuilder};
use tracing::info;

use super::error::{InferenceError, ScoringError};
use super::scorer::RiskScorer;

const HIDDEN_1: usize = 512;
const HIDDEN_2: usize = 256;
const DROPOUT: f32 = 0.3;

/// Feed-forward risk head over a flattened embedding.
///
/// `Linear(in, 512) → BatchNorm → ReLU → Dropout → Linear(512, 256) → BatchNorm → ReLU →
/// Dropout → Linear(256, 1)`, evaluated in inference mode. Weights are a safetensors export of
/// a `layers` sequential (`layers.0`, `layers.1`, `layers.4`, `layers.5`, `layers.8`).
pub struct MlpScorer {
    fc1: Linear,
    bn1: BatchNorm,
    fc2: Linear,
    bn2: BatchNorm,
    out: Linear,
    dropout: Dropout,
    in_len: usize,
    device: Device,
}

impl std::fmt::Debug for MlpScorer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MlpScorer")
            .field("in_len", &self.in_len)
            .field("device", &format!("{:?}", self.device))
            .finish()
    }
}

impl MlpScorer {
    pub const ARCHITECTURE: &'static str = "embedding_mlp_1d";

    /// Loads weights for an input of `in_len` scalars.
    pub fn load(weights_path: &Path, in_len: usize, device: &Device) -> Result<Self, ScoringError> {
        if !weights_path.is_file() {
            return Err(ScoringError::WeightsNotFound {
                path: weights_path.to_path_buf(),
            });
        }

        // SAFETY: the file is memory-mapped read-only and not modified while loaded.
        let vb = unsafe {
            VarBuilder::from_mmaped_safetensors(&[weights_path], DType::F32, device)?
        };
        let scorer = Self::from_var_builder(vb.pp("layers"), in_len, device)?;

        info!(
            weights = %weights_path.display(),
            in_len,
            "Loaded MLP scorer"
        );
        Ok(scorer)
    }

    /// Builds the network from an already-scoped var builder.
    pub fn from_var_builder(
        vb: VarBuilder,
        in_len: usize,
        device: &Device,
    ) -> Result<Self, ScoringError> {
        Ok(Self {
            fc1: candle_nn::linear(in_len, HIDDEN_1, vb.pp("0"))?,
            bn1: candle_nn::batch_norm(HIDDEN_1, candle_nn::BatchNormConfig::default(), vb.pp("1"))?,
            fc2: candle_nn::linear(HIDDEN_1, HIDDEN_2, vb.pp("4"))?,
            bn2: candle_nn::batch_norm(HIDDEN_2, candle_nn::BatchNormConfig::default(), vb.pp("5"))?,
            out: candle_nn::linear(HIDDEN_2, 1, vb.pp("8"))?,
            dropout: Dropout::new(DROPOUT),
            in_len,
            device: device.clone(),
        })
    }

    pub fn in_len(&self) -> usize {
        self.in_len
    }

    fn forward_tensor(&self, xs: &Tensor) -> candle_core::Result<Tensor> {
        let xs = xs.apply(&self.fc1)?;
        let xs = self.bn1.forward_t(&xs, false)?.relu()?;
        let xs = self.dropout.forward_t(&xs, false)?;
        let xs = xs.apply(&self.fc2)?;
        let xs = self.bn2.forward_t(&xs, false)?.relu()?;
        let xs = self.dropout.forward_t(&xs, false)?;
        xs.apply(&self.out)
    }
}

impl RiskScorer for MlpScorer {
    fn forward(&self, input: &[f32], _shape: &[usize]) -> Result<f32, InferenceError> {
        if input.len() != self.in_len {
            return Err(InferenceError::ShapeMismatch {
                expected: vec![self.in_len],
                actual: vec![input.len()],
            });
        }

        let xs = Tensor::from_slice(input, (1, self.in_len), &self.device)?;
        let logit = self.forward_tensor(&xs)?.flatten_all()?.to_vec1::<f32>()?;

        logit
            .first()
            .copied()
            .ok_or_else(|| InferenceError::ForwardFailed {
                reason: "model returned an empty output".to_string(),
            })
    }

    fn architecture(&self) -> &str {
        Self::ARCHITECTURE
    }
}
