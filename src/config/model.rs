//! JSON model configuration.
//!
//! ```json
//! {
//!   "active_model": "mlp_v1",
//!   "active_explanation_strategy": "counterfactual",
//!   "service": {
//!     "version": "1.0.0",
//!     "risk_categories": [{"code": 0, "upper_bound": 0.5}, {"code": 1, "upper_bound": 1.0}]
//!   },
//!   "models": {
//!     "mlp_v1": {
//!       "architecture": "embedding_mlp_1d",
//!       "weights_path": "models/mlp_v1.safetensors",
//!       "input_shape": [2944],
//!       "feature_bounds": {"age": [18, 100]},
//!       "baseline_values_path": "baselines/mlp_v1.json",
//!       "embedding": {"strategy": "hybrid_1d", "feature_order": ["age", "occupation"]}
//!     }
//!   }
//! }
//! ```
//!
//! Relative paths resolve against the directory holding the config file.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::config::ConfigError;
use crate::constants::{DEFAULT_DICE_SEED, DEFAULT_EXPLANATION_TYPE, DEFAULT_NUMERIC_DIM};
use crate::embedding::{AssemblerSettings, EmbeddingStrategy, FeatureBounds, FeatureMap};
use crate::scoring::RiskCategory;

fn default_explanation_type() -> String {
    DEFAULT_EXPLANATION_TYPE.to_string()
}

fn default_numeric_dim() -> usize {
    DEFAULT_NUMERIC_DIM
}

fn default_dice_seed() -> u64 {
    DEFAULT_DICE_SEED
}

/// Top-level model configuration file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    pub active_model: String,
    #[serde(default = "default_explanation_type")]
    pub active_explanation_strategy: String,
    pub service: ServiceConfig,
    pub models: BTreeMap<String, ModelConfig>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServiceConfig {
    pub version: String,
    pub risk_categories: Vec<RiskCategory>,
    /// Worker threads for counterfactual trials; `0` runs them on the calling thread.
    #[serde(default)]
    pub explain_parallelism: usize,
}

/// One deployable model.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelConfig {
    /// Scorer registry key (e.g. `embedding_mlp_1d`).
    pub architecture: String,
    #[serde(default)]
    pub weights_path: Option<PathBuf>,
    pub input_shape: Vec<usize>,
    #[serde(default)]
    pub feature_bounds: FeatureBounds,
    #[serde(default)]
    pub baseline_values: Option<FeatureMap>,
    #[serde(default)]
    pub baseline_values_path: Option<PathBuf>,
    pub embedding: EmbeddingConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmbeddingConfig {
    pub strategy: EmbeddingStrategy,
    #[serde(default = "default_numeric_dim")]
    pub numeric_dim: usize,
    #[serde(default = "default_dice_seed")]
    pub dice_seed: u64,
    pub feature_order: Vec<String>,
}

impl AppConfig {
    /// Reads and parses `path`, resolving relative model paths against its directory.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path).map_err(|source| ConfigError::ReadFailed {
            path: path.to_path_buf(),
            source,
        })?;
        let mut config: Self =
            serde_json::from_str(&raw).map_err(|source| ConfigError::ParseFailed {
                path: path.to_path_buf(),
                source,
            })?;

        let base_dir = path.parent().unwrap_or_else(|| Path::new("."));
        config.resolve_paths(base_dir);
        config.validate()?;

        debug!(
            path = %path.display(),
            models = config.models.len(),
            active_model = %config.active_model,
            "Loaded model config"
        );
        Ok(config)
    }

    /// Parses a config from a JSON string; relative paths resolve against `base_dir`.
    pub fn from_json(json: &str, base_dir: &Path) -> Result<Self, ConfigError> {
        let mut config: Self =
            serde_json::from_str(json).map_err(|source| ConfigError::ParseFailed {
                path: base_dir.to_path_buf(),
                source,
            })?;
        config.resolve_paths(base_dir);
        config.validate()?;
        Ok(config)
    }

    /// Picks the model to serve: `override_id` if given, otherwise `active_model`.
    pub fn active<'a>(
        &'a self,
        override_id: Option<&'a str>,
    ) -> Result<(&'a str, &'a ModelConfig), ConfigError> {
        let id = override_id.unwrap_or(&self.active_model);
        self.models
            .get(id)
            .map(|model| (id, model))
            .ok_or_else(|| ConfigError::UnknownModel {
                id: id.to_string(),
                available: self.models.keys().cloned().collect(),
            })
    }

    fn resolve_paths(&mut self, base_dir: &Path) {
        for model in self.models.values_mut() {
            if let Some(p) = model.weights_path.take() {
                model.weights_path = Some(resolve(base_dir, p));
            }
            if let Some(p) = model.baseline_values_path.take() {
                model.baseline_values_path = Some(resolve(base_dir, p));
            }
        }
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.models.is_empty() {
            return Err(ConfigError::InvalidModelConfig {
                reason: "no models declared".to_string(),
            });
        }
        if self.service.risk_categories.is_empty() {
            return Err(ConfigError::InvalidModelConfig {
                reason: "risk_categories cannot be empty".to_string(),
            });
        }
        for (id, model) in &self.models {
            if model.input_shape.is_empty() || model.input_shape.contains(&0) {
                return Err(ConfigError::InvalidModelConfig {
                    reason: format!(
                        "model '{id}' has invalid input_shape {:?}",
                        model.input_shape
                    ),
                });
            }
            if model.embedding.feature_order.is_empty() {
                return Err(ConfigError::InvalidModelConfig {
                    reason: format!("model '{id}' has an empty feature_order"),
                });
            }
        }
        Ok(())
    }
}

fn resolve(base_dir: &Path, path: PathBuf) -> PathBuf {
    if path.is_absolute() {
        path
    } else {
        base_dir.join(path)
    }
}

impl ModelConfig {
    /// Assembler settings derived from this model.
    pub fn assembler_settings(&self) -> AssemblerSettings {
        AssemblerSettings {
            strategy: self.embedding.strategy,
            feature_order: self.embedding.feature_order.clone(),
            feature_bounds: self.feature_bounds.clone(),
            numeric_dim: self.embedding.numeric_dim,
            dice_seed: self.embedding.dice_seed,
            input_shape: self.input_shape.clone(),
        }
    }

    /// Baseline raw values: inline `baseline_values` win over `baseline_values_path`.
    pub fn baselines(&self, model_id: &str) -> Result<FeatureMap, ConfigError> {
        if let Some(ref values) = self.baseline_values {
            return Ok(values.clone());
        }

        let path = self
            .baseline_values_path
            .as_ref()
            .ok_or_else(|| ConfigError::NoBaselineSource {
                model: model_id.to_string(),
            })?;

        let raw = std::fs::read_to_string(path).map_err(|source| ConfigError::ReadFailed {
            path: path.clone(),
            source,
        })?;
        serde_json::from_str(&raw).map_err(|source| ConfigError::ParseFailed {
            path: path.clone(),
            source,
        })
    }
}
