//! Text encoders: the opaque string → vector collaborator of the assembler.
//!
//! Use [`TextEncoderConfig::stub`] for tests/examples without model files.

/// Text encoder configuration.
pub mod config;


pub use config::{TEXT_EMBEDDING_DIM, TEXT_MAX_SEQ_LEN, TextEncoderConfig};

use std::sync::Arc;

use candle_core::{Device, Tensor};
use tokenizers::Tokenizer;
use tracing::{debug, info, warn};

use crate::embedding::bert::BertSentenceModel;
use crate::embedding::device::select_device;
use crate::embedding::error::EmbeddingError;
use crate::embedding::utils::{l2_normalize, load_batch_tokenizer};

/// Batched, deterministic string → fixed-width vector encoder.
pub trait TextEncoder: Send + Sync {
    /// Width of every vector returned by [`encode`](Self::encode).
    fn dimension(&self) -> usize;

    /// Encodes `texts` in one batch, optionally L2-normalizing each output.
    fn encode(&self, texts: &[&str], normalize: bool) -> Result<Vec<Vec<f32>>, EmbeddingError>;

    /// Returns `true` for encoders that do not run a real model.
    fn is_stub(&self) -> bool {
        false
    }
}

enum EncoderBackend {
    Model {
        model: BertSentenceModel,
        tokenizer: Arc<Tokenizer>,
        device: Device,
    },
    Stub,
}

/// BERT sentence encoder (supports stub mode).
pub struct BertTextEncoder {
    backend: EncoderBackend,
    config: TextEncoderConfig,
    dim: usize,
}

impl std::fmt::Debug for BertTextEncoder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BertTextEncoder")
            .field(
                "backend",
                &match &self.backend {
                    EncoderBackend::Model { device, .. } => format!("Model({:?})", device),
                    EncoderBackend::Stub => "Stub".to_string(),
                },
            )
            .field("dim", &self.dim)
            .field("max_seq_len", &self.config.max_seq_len)
            .finish()
    }
}

impl BertTextEncoder {
    /// Loads the encoder from a config (stub mode is supported).
    pub fn load(config: TextEncoderConfig) -> Result<Self, EmbeddingError> {
        config.validate()?;

        if config.testing_stub {
            warn!(
                dim = config.embedding_dim,
                "Text encoder running in STUB mode (testing only)"
            );
            return Ok(Self {
                backend: EncoderBackend::Stub,
                dim: config.embedding_dim,
                config,
            });
        }

        let device = select_device();
        debug!(?device, "Selected compute device for text encoder");

        let model = BertSentenceModel::load(&config.model_dir, &device).map_err(|e| {
            EmbeddingError::ModelLoadFailed {
                reason: format!("Failed to load BERT model: {}", e),
            }
        })?;

        let tokenizer = load_batch_tokenizer(&config.model_dir, config.max_seq_len).map_err(
            |e| EmbeddingError::TokenizationFailed {
                reason: format!("Failed to load tokenizer: {}", e),
            },
        )?;

        let dim = model.hidden_size();
        info!(
            model_dir = %config.model_dir.display(),
            dim,
            max_seq_len = config.max_seq_len,
            "Text encoder loaded"
        );

        Ok(Self {
            backend: EncoderBackend::Model {
                model,
                tokenizer: Arc::new(tokenizer),
                device,
            },
            dim,
            config,
        })
    }

    /// Shorthand for a stub encoder with the default width.
    pub fn stub() -> Self {
        Self {
            backend: EncoderBackend::Stub,
            dim: TEXT_EMBEDDING_DIM,
            config: TextEncoderConfig::stub(),
        }
    }

    fn encode_with_model(
        &self,
        texts: &[&str],
        model: &BertSentenceModel,
        tokenizer: &Tokenizer,
        device: &Device,
    ) -> Result<Vec<Vec<f32>>, EmbeddingError> {
        let encodings = tokenizer
            .encode_batch(texts.to_vec(), true)
            .map_err(|e| EmbeddingError::TokenizationFailed {
                reason: e.to_string(),
            })?;

        let batch = encodings.len();
        let seq_len = encodings.first().map(|e| e.get_ids().len()).unwrap_or(0);
        if seq_len == 0 {
            return Ok(vec![vec![0.0; self.dim]; batch]);
        }

        let mut ids = Vec::with_capacity(batch * seq_len);
        let mut type_ids = Vec::with_capacity(batch * seq_len);
        let mut mask = Vec::with_capacity(batch * seq_len);
        for encoding in &encodings {
            ids.extend_from_slice(encoding.get_ids());
            type_ids.extend_from_slice(encoding.get_type_ids());
            mask.extend_from_slice(encoding.get_attention_mask());
        }

        debug!(batch, seq_len, "Encoding text batch (transformer forward pass)");

        let ids = Tensor::from_vec(ids, (batch, seq_len), device)?;
        let type_ids = Tensor::from_vec(type_ids, (batch, seq_len), device)?;
        let mask = Tensor::from_vec(mask, (batch, seq_len), device)?;

        let pooled = model
            .forward(&ids, &type_ids, &mask)
            .map_err(|e| EmbeddingError::InferenceFailed {
                reason: format!("Transformer forward pass failed: {}", e),
            })?;

        Ok(pooled.to_vec2::<f32>()?)
    }

    fn encode_stub(&self, text: &str) -> Vec<f32> {
        use std::hash::{DefaultHasher, Hash, Hasher};

        let mut hasher = DefaultHasher::new();
        text.hash(&mut hasher);
        let mut state = hasher.finish();

        (0..self.dim)
            .map(|_| {
                state = state.wrapping_mul(6364136223846793005).wrapping_add(1);
                ((state >> 32) as f32 / u32::MAX as f32) * 2.0 - 1.0
            })
            .collect()
    }

    /// Returns the encoder configuration.
    pub fn config(&self) -> &TextEncoderConfig {
        &self.config
    }
}

impl TextEncoder for BertTextEncoder {
    fn dimension(&self) -> usize {
        self.dim
    }

    fn encode(&self, texts: &[&str], normalize: bool) -> Result<Vec<Vec<f32>>, EmbeddingError> {
        if texts.is_empty() {
            return Ok(vec![]);
        }

        let mut vectors = match &self.backend {
            EncoderBackend::Model {
                model,
                tokenizer,
                device,
            } => self.encode_with_model(texts, model, tokenizer, device)?,
            EncoderBackend::Stub => texts.iter().map(|t| self.encode_stub(t)).collect(),
        };

        if normalize {
            vectors.iter_mut().for_each(|v| l2_normalize(v));
        }

        Ok(vectors)
    }

    fn is_stub(&self) -> bool {
        matches!(self.backend, EncoderBackend::Stub)
    }
}
