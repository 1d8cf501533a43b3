use std::path::Path;

use candle_core::{DType, Device, Module, Tensor};
use candle_nn::{
    BatchNorm, Conv1d, Conv1dConfig, Conv2d, Conv2dConfig, Dropout, Linear, ModuleT, VarBuilder,
};
use tracing::info;

use super::error::{InferenceError, ScoringError};
use super::scorer::RiskScorer;

const CHANNELS: [usize; 3] = [32, 64, 128];
const DROPOUT: f32 = 0.3;

/// Two halving pools run before the last convolution, so the pooled axis needs this many cells.
const MIN_POOLED_LEN: usize = 4;

// `features` sequential indices shared by both networks.
const CONV_1: &str = "0";
const BN_1: &str = "1";
const CONV_2: &str = "4";
const BN_2: &str = "5";
const CONV_3: &str = "8";
const CLASSIFIER_OUT: &str = "2";

fn load_var_builder<'a>(
    weights_path: &Path,
    device: &Device,
) -> Result<VarBuilder<'a>, ScoringError> {
    if !weights_path.is_file() {
        return Err(ScoringError::WeightsNotFound {
            path: weights_path.to_path_buf(),
        });
    }
    // SAFETY: the file is memory-mapped read-only and not modified while loaded.
    Ok(unsafe { VarBuilder::from_mmaped_safetensors(&[weights_path], DType::F32, device)? })
}

fn first_logit(out: &Tensor) -> Result<f32, InferenceError> {
    out.flatten_all()?
        .to_vec1::<f32>()?
        .first()
        .copied()
        .ok_or_else(|| InferenceError::ForwardFailed {
            reason: "model returned an empty output".to_string(),
        })
}

/// `Flatten → Dropout → Linear(128, 1)` head.
#[derive(Debug)]
struct Classifier {
    dropout: Dropout,
    out: Linear,
}

impl Classifier {
    fn new(vb: VarBuilder) -> candle_core::Result<Self> {
        Ok(Self {
            dropout: Dropout::new(DROPOUT),
            out: candle_nn::linear(CHANNELS[2], 1, vb.pp(CLASSIFIER_OUT))?,
        })
    }

    fn forward(&self, pooled: &Tensor) -> candle_core::Result<Tensor> {
        self.dropout.forward_t(pooled, false)?.apply(&self.out)
    }
}

/// 1-D convolutional risk head over a flat embedding treated as a one-channel sequence.
///
/// `features`: `Conv1d(1, 32, 5, pad 2) → BatchNorm → ReLU → MaxPool(2) → Conv1d(32, 64, 5, pad 2)
/// → BatchNorm → ReLU → MaxPool(2) → Conv1d(64, 128, 3, pad 1) → ReLU → global max`.
/// `classifier`: `Dropout → Linear(128, 1)`.
pub struct CnnScorer {
    conv1: Conv1d,
    bn1: BatchNorm,
    conv2: Conv1d,
    bn2: BatchNorm,
    conv3: Conv1d,
    classifier: Classifier,
    in_len: usize,
    device: Device,
}

impl std::fmt::Debug for CnnScorer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CnnScorer")
            .field("in_len", &self.in_len)
            .field("device", &format!("{:?}", self.device))
            .finish()
    }
}

impl CnnScorer {
    pub const ARCHITECTURE: &'static str = "embedding_cnn";

    pub fn load(weights_path: &Path, in_len: usize, device: &Device) -> Result<Self, ScoringError> {
        let vb = load_var_builder(weights_path, device)?;
        let scorer = Self::from_var_builder(vb, in_len, device)?;
        info!(weights = %weights_path.display(), in_len, "Loaded 1-D CNN scorer");
        Ok(scorer)
    }

    /// Builds the network from a var builder holding `features.*` and `classifier.*`.
    pub fn from_var_builder(
        vb: VarBuilder,
        in_len: usize,
        device: &Device,
    ) -> Result<Self, ScoringError> {
        if in_len < MIN_POOLED_LEN {
            return Err(ScoringError::InvalidInputShape {
                shape: vec![in_len],
            });
        }

        let features = vb.pp("features");
        let conv = |in_c, out_c, kernel, padding, idx| {
            let config = Conv1dConfig {
                padding,
                ..Default::default()
            };
            candle_nn::conv1d(in_c, out_c, kernel, config, features.pp(idx))
        };
        let bn_config = candle_nn::BatchNormConfig::default();

        Ok(Self {
            conv1: conv(1, CHANNELS[0], 5, 2, CONV_1)?,
            bn1: candle_nn::batch_norm(CHANNELS[0], bn_config, features.pp(BN_1))?,
            conv2: conv(CHANNELS[0], CHANNELS[1], 5, 2, CONV_2)?,
            bn2: candle_nn::batch_norm(CHANNELS[1], bn_config, features.pp(BN_2))?,
            conv3: conv(CHANNELS[1], CHANNELS[2], 3, 1, CONV_3)?,
            classifier: Classifier::new(vb.pp("classifier"))?,
            in_len,
            device: device.clone(),
        })
    }

    pub fn in_len(&self) -> usize {
        self.in_len
    }

    /// `[B, C, L] → [B, C, L / 2]`.
    fn halve(xs: &Tensor) -> candle_core::Result<Tensor> {
        xs.unsqueeze(2)?.max_pool2d((1, 2))?.squeeze(2)
    }

    fn forward_tensor(&self, xs: &Tensor) -> candle_core::Result<Tensor> {
        let xs = xs.apply(&self.conv1)?;
        let xs = Self::halve(&self.bn1.forward_t(&xs, false)?.relu()?)?;
        let xs = xs.apply(&self.conv2)?;
        let xs = Self::halve(&self.bn2.forward_t(&xs, false)?.relu()?)?;
        let pooled = xs.apply(&self.conv3)?.relu()?.max(2)?;
        self.classifier.forward(&pooled)
    }
}

impl RiskScorer for CnnScorer {
    fn forward(&self, input: &[f32], _shape: &[usize]) -> Result<f32, InferenceError> {
        if input.len() != self.in_len {
            return Err(InferenceError::ShapeMismatch {
                expected: vec![self.in_len],
                actual: vec![input.len()],
            });
        }

        let xs = Tensor::from_slice(input, (1, 1, self.in_len), &self.device)?;
        first_logit(&self.forward_tensor(&xs)?)
    }

    fn architecture(&self) -> &str {
        Self::ARCHITECTURE
    }
}

/// 2-D convolution with a rectangular kernel and per-axis zero padding.
#[derive(Debug)]
struct PaddedConv2d {
    weight: Tensor,
    bias: Tensor,
    padding: (usize, usize),
}

impl PaddedConv2d {
    fn new(
        in_c: usize,
        out_c: usize,
        kernel: (usize, usize),
        padding: (usize, usize),
        vb: VarBuilder,
    ) -> candle_core::Result<Self> {
        Ok(Self {
            weight: vb.get((out_c, in_c, kernel.0, kernel.1), "weight")?,
            bias: vb.get(out_c, "bias")?.reshape((1, out_c, 1, 1))?,
            padding,
        })
    }
}

impl Module for PaddedConv2d {
    fn forward(&self, xs: &Tensor) -> candle_core::Result<Tensor> {
        let (pad_h, pad_w) = self.padding;
        xs.pad_with_zeros(2, pad_h, pad_h)?
            .pad_with_zeros(3, pad_w, pad_w)?
            .conv2d(&self.weight, 0, 1, 1, 1)?
            .broadcast_add(&self.bias)
    }
}

/// 2-D convolutional risk head over a `[rows, cols]` embedding matrix (one row per feature).
///
/// `features`: `Conv2d(1, 32, (3, 5), pad (1, 2)) → BatchNorm → ReLU → MaxPool((1, 2)) →
/// Conv2d(32, 64, (3, 5), pad (1, 2)) → BatchNorm → ReLU → MaxPool((1, 2)) →
/// Conv2d(64, 128, 3, pad 1) → ReLU → global max`. `classifier`: `Dropout → Linear(128, 1)`.
/// Pooling only shrinks the column axis.
pub struct Cnn2dScorer {
    conv1: PaddedConv2d,
    bn1: BatchNorm,
    conv2: PaddedConv2d,
    bn2: BatchNorm,
    conv3: Conv2d,
    classifier: Classifier,
    rows: usize,
    cols: usize,
    device: Device,
}

impl std::fmt::Debug for Cnn2dScorer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Cnn2dScorer")
            .field("rows", &self.rows)
            .field("cols", &self.cols)
            .field("device", &format!("{:?}", self.device))
            .finish()
    }
}

impl Cnn2dScorer {
    pub const ARCHITECTURE: &'static str = "embedding_cnn_2d";

    pub fn load(
        weights_path: &Path,
        input_shape: &[usize],
        device: &Device,
    ) -> Result<Self, ScoringError> {
        let vb = load_var_builder(weights_path, device)?;
        let scorer = Self::from_var_builder(vb, input_shape, device)?;
        info!(
            weights = %weights_path.display(),
            rows = scorer.rows,
            cols = scorer.cols,
            "Loaded 2-D CNN scorer"
        );
        Ok(scorer)
    }

    /// Builds the network for a `[rows, cols]` input.
    pub fn from_var_builder(
        vb: VarBuilder,
        input_shape: &[usize],
        device: &Device,
    ) -> Result<Self, ScoringError> {
        let &[rows, cols] = input_shape else {
            return Err(ScoringError::InvalidInputShape {
                shape: input_shape.to_vec(),
            });
        };
        if rows == 0 || cols < MIN_POOLED_LEN {
            return Err(ScoringError::InvalidInputShape {
                shape: input_shape.to_vec(),
            });
        }

        let features = vb.pp("features");
        let bn_config = candle_nn::BatchNormConfig::default();
        let conv3_config = Conv2dConfig {
            padding: 1,
            ..Default::default()
        };

        Ok(Self {
            conv1: PaddedConv2d::new(1, CHANNELS[0], (3, 5), (1, 2), features.pp(CONV_1))?,
            bn1: candle_nn::batch_norm(CHANNELS[0], bn_config, features.pp(BN_1))?,
            conv2: PaddedConv2d::new(
                CHANNELS[0],
                CHANNELS[1],
                (3, 5),
                (1, 2),
                features.pp(CONV_2),
            )?,
            bn2: candle_nn::batch_norm(CHANNELS[1], bn_config, features.pp(BN_2))?,
            conv3: candle_nn::conv2d(
                CHANNELS[1],
                CHANNELS[2],
                3,
                conv3_config,
                features.pp(CONV_3),
            )?,
            classifier: Classifier::new(vb.pp("classifier"))?,
            rows,
            cols,
            device: device.clone(),
        })
    }

    pub fn input_shape(&self) -> [usize; 2] {
        [self.rows, self.cols]
    }

    fn forward_tensor(&self, xs: &Tensor) -> candle_core::Result<Tensor> {
        let xs = xs.apply(&self.conv1)?;
        let xs = self.bn1.forward_t(&xs, false)?.relu()?.max_pool2d((1, 2))?;
        let xs = xs.apply(&self.conv2)?;
        let xs = self.bn2.forward_t(&xs, false)?.relu()?.max_pool2d((1, 2))?;
        let pooled = xs.apply(&self.conv3)?.relu()?.flatten_from(2)?.max(2)?;
        self.classifier.forward(&pooled)
    }
}

impl RiskScorer for Cnn2dScorer {
    fn forward(&self, input: &[f32], _shape: &[usize]) -> Result<f32, InferenceError> {
        if input.len() != self.rows * self.cols {
            return Err(InferenceError::ShapeMismatch {
                expected: vec![self.rows, self.cols],
                actual: vec![input.len()],
            });
        }

        let xs = Tensor::from_slice(input, (1, 1, self.rows, self.cols), &self.device)?;
        first_logit(&self.forward_tensor(&xs)?)
    }

    fn architecture(&self) -> &str {
        Self::ARCHITECTURE
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    /// Zero convolutions and an identity batch norm, so the logit is
    /// `relu(conv3 bias) · classifier weight + classifier bias`.
    fn weights(
        conv_kernels: [&[usize]; 3],
        conv3_bias: f32,
        head_weight: f32,
        head_bias: f32,
    ) -> HashMap<String, Tensor> {
        let device = Device::Cpu;
        let zeros = |shape: &[usize]| Tensor::zeros(shape, DType::F32, &device).unwrap();
        let full = |value: f32, shape: &[usize]| Tensor::full(value, shape, &device).unwrap();
        let mut tensors = HashMap::new();

        let in_channels = [1, CHANNELS[0], CHANNELS[1]];
        for (i, idx) in [CONV_1, CONV_2, CONV_3].into_iter().enumerate() {
            let mut shape = vec![CHANNELS[i], in_channels[i]];
            shape.extend_from_slice(conv_kernels[i]);
            tensors.insert(format!("features.{idx}.weight"), zeros(&shape));
            let bias = if idx == CONV_3 { conv3_bias } else { 0.0 };
            tensors.insert(format!("features.{idx}.bias"), full(bias, &[CHANNELS[i]]));
        }
        for (idx, width) in [(BN_1, CHANNELS[0]), (BN_2, CHANNELS[1])] {
            tensors.insert(format!("features.{idx}.weight"), full(1.0, &[width]));
            tensors.insert(format!("features.{idx}.bias"), zeros(&[width]));
            tensors.insert(format!("features.{idx}.running_mean"), zeros(&[width]));
            tensors.insert(format!("features.{idx}.running_var"), full(1.0, &[width]));
        }
        tensors.insert(
            "classifier.2.weight".to_string(),
            full(head_weight, &[1, CHANNELS[2]]),
        );
        tensors.insert("classifier.2.bias".to_string(), full(head_bias, &[1]));
        tensors
    }

    fn cnn_1d(in_len: usize, conv3_bias: f32, head_weight: f32, head_bias: f32) -> CnnScorer {
        let tensors = weights([&[5], &[5], &[3]], conv3_bias, head_weight, head_bias);
        let vb = VarBuilder::from_tensors(tensors, DType::F32, &Device::Cpu);
        CnnScorer::from_var_builder(vb, in_len, &Device::Cpu).unwrap()
    }

    fn cnn_2d(shape: &[usize], conv3_bias: f32, head_weight: f32, head_bias: f32) -> Cnn2dScorer {
        let tensors = weights([&[3, 5], &[3, 5], &[3, 3]], conv3_bias, head_weight, head_bias);
        let vb = VarBuilder::from_tensors(tensors, DType::F32, &Device::Cpu);
        Cnn2dScorer::from_var_builder(vb, shape, &Device::Cpu).unwrap()
    }

    #[test]
    fn test_cnn_returns_head_bias_for_zero_weights() {
        let cnn = cnn_1d(16, 0.0, 0.0, -0.75);
        let logit = cnn.forward(&[0.4; 16], &[16]).unwrap();
        assert!((logit + 0.75).abs() < 1e-5);
        assert_eq!(cnn.architecture(), "embedding_cnn");
    }

    #[test]
    fn test_cnn_pools_all_channels_into_head() {
        // Every one of the 128 channels carries 1.0 after the global max.
        let cnn = cnn_1d(10, 1.0, 1.0, 0.5);
        let logit = cnn.forward(&[0.0; 10], &[10]).unwrap();
        assert!((logit - 128.5).abs() < 1e-3);
    }

    #[test]
    fn test_cnn_rejects_wrong_length_and_short_inputs() {
        let cnn = cnn_1d(8, 0.0, 0.0, 0.0);
        assert!(matches!(
            cnn.forward(&[0.0; 7], &[7]),
            Err(InferenceError::ShapeMismatch { .. })
        ));

        let tensors = weights([&[5], &[5], &[3]], 0.0, 0.0, 0.0);
        let vb = VarBuilder::from_tensors(tensors, DType::F32, &Device::Cpu);
        assert!(matches!(
            CnnScorer::from_var_builder(vb, 3, &Device::Cpu),
            Err(ScoringError::InvalidInputShape { .. })
        ));
    }

    #[test]
    fn test_cnn_2d_returns_head_bias_for_zero_weights() {
        let cnn = cnn_2d(&[3, 12], 0.0, 0.0, 2.0);
        let logit = cnn.forward(&[0.1; 36], &[3, 12]).unwrap();
        assert!((logit - 2.0).abs() < 1e-5);
        assert_eq!(cnn.architecture(), "embedding_cnn_2d");
        assert_eq!(cnn.input_shape(), [3, 12]);
    }

    #[test]
    fn test_cnn_2d_pools_all_channels_into_head() {
        let cnn = cnn_2d(&[9, 8], 1.0, 0.5, 0.0);
        let logit = cnn.forward(&[0.0; 72], &[9, 8]).unwrap();
        assert!((logit - 64.0).abs() < 1e-3);
    }

    #[test]
    fn test_cnn_2d_requires_matrix_input() {
        for shape in [&[36][..], &[0, 12], &[3, 2], &[2, 3, 6]] {
            let tensors = weights([&[3, 5], &[3, 5], &[3, 3]], 0.0, 0.0, 0.0);
            let vb = VarBuilder::from_tensors(tensors, DType::F32, &Device::Cpu);
            assert!(matches!(
                Cnn2dScorer::from_var_builder(vb, shape, &Device::Cpu),
                Err(ScoringError::InvalidInputShape { .. })
            ));
        }

        let cnn = cnn_2d(&[3, 12], 0.0, 0.0, 0.0);
        assert!(matches!(
            cnn.forward(&[0.0; 35], &[35]),
            Err(InferenceError::ShapeMismatch { .. })
        ));
    }

    #[test]
    fn test_missing_tensors_fail_to_load() {
        let empty = VarBuilder::from_tensors(HashMap::new(), DType::F32, &Device::Cpu);
        assert!(matches!(
            CnnScorer::from_var_builder(empty, 16, &Device::Cpu),
            Err(ScoringError::LoadFailed { .. })
        ));
        let empty = VarBuilder::from_tensors(HashMap::new(), DType::F32, &Device::Cpu);
        assert!(matches!(
            Cnn2dScorer::from_var_builder(empty, &[3, 12], &Device::Cpu),
            Err(ScoringError::LoadFailed { .. })
        ));
    }

    #[test]
    fn test_load_missing_file() {
        let path = Path::new("/nonexistent/cnn.safetensors");
        assert!(matches!(
            CnnScorer::load(path, 16, &Device::Cpu),
            Err(ScoringError::WeightsNotFound { .. })
        ));
        assert!(matches!(
            Cnn2dScorer::load(path, &[3, 12], &Device::Cpu),
            Err(ScoringError::WeightsNotFound { .. })
        ));
    }
}
