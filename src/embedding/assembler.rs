use std::collections::BTreeMap;
use std::sync::Arc;

use tracing::{debug, warn};

use crate::constants::{DEFAULT_DICE_SEED, DEFAULT_NUMERIC_DIM};
use crate::dice::DiceEncoder;
use crate::embedding::error::EmbeddingError;
use crate::embedding::features::{FeatureMap, numeric_value, text_repr};
use crate::embedding::layout::{
    Embedding, EmbeddingLayout, EmbeddingStrategy, FeatureBounds, FeatureKind, FeatureSpace,
};
use crate::embedding::text::TextEncoder;

/// Everything the assembler needs from the model configuration.
#[derive(Debug, Clone)]
pub struct AssemblerSettings {
    pub strategy: EmbeddingStrategy,
    /// Expected feature names (order is irrelevant; canonical order is derived).
    pub feature_order: Vec<String>,
    pub feature_bounds: FeatureBounds,
    pub numeric_dim: usize,
    pub dice_seed: u64,
    /// Declared model input shape.
    pub input_shape: Vec<usize>,
}

impl AssemblerSettings {
    /// Hybrid settings with the default DICE width and seed.
    pub fn hybrid(
        feature_order: Vec<String>,
        feature_bounds: FeatureBounds,
        input_shape: Vec<usize>,
    ) -> Self {
        Self {
            strategy: EmbeddingStrategy::Hybrid1d,
            feature_order,
            feature_bounds,
            numeric_dim: DEFAULT_NUMERIC_DIM,
            dice_seed: DEFAULT_DICE_SEED,
            input_shape,
        }
    }
}

/// Turns a raw feature mapping into the fixed-shape model input.
///
/// Built once per model; validates the layout against the declared `input_shape` eagerly
/// and again on every call to [`embed`](Self::embed).
pub struct EmbeddingAssembler {
    encoder: Arc<dyn TextEncoder>,
    strategy: EmbeddingStrategy,
    space: FeatureSpace,
    layout: EmbeddingLayout,
    dice: BTreeMap<String, DiceEncoder>,
    input_shape: Vec<usize>,
}

impl std::fmt::Debug for EmbeddingAssembler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EmbeddingAssembler")
            .field("strategy", &self.strategy)
            .field("text_features", &self.space.text().len())
            .field("numeric_features", &self.space.numeric().len())
            .field("text_dim", &self.encoder.dimension())
            .field("input_shape", &self.input_shape)
            .finish()
    }
}

impl EmbeddingAssembler {
    pub fn new(
        encoder: Arc<dyn TextEncoder>,
        settings: AssemblerSettings,
    ) -> Result<Self, EmbeddingError> {
        let text_dim = encoder.dimension();

        let (space, layout) = match settings.strategy {
            EmbeddingStrategy::ValueOnly => {
                let space = FeatureSpace::all_text(settings.feature_order);
                let layout = EmbeddingLayout::rows(&space, text_dim);
                (space, layout)
            }
            EmbeddingStrategy::Hybrid1d => {
                let space =
                    FeatureSpace::partition(settings.feature_order, &settings.feature_bounds);
                let layout = EmbeddingLayout::flat(&space, text_dim, settings.numeric_dim);
                (space, layout)
            }
            EmbeddingStrategy::KeyValue => {
                return Err(EmbeddingError::StrategyNotImplemented {
                    strategy: settings.strategy.to_string(),
                });
            }
        };

        let mut dice = BTreeMap::new();
        for name in space.numeric() {
            let (min, max) = settings.feature_bounds[name];
            let encoder = DiceEncoder::new(settings.numeric_dim, min, max, settings.dice_seed)
                .map_err(|source| EmbeddingError::InvalidNumericEncoder {
                    feature: name.clone(),
                    source,
                })?;
            dice.insert(name.clone(), encoder);
        }

        if layout.shape() != settings.input_shape.as_slice() {
            return Err(EmbeddingError::ConfigMismatch {
                text_features: space.text().len(),
                text_dim,
                numeric_features: space.numeric().len(),
                numeric_dim: settings.numeric_dim,
                expected: layout.shape().to_vec(),
                declared: settings.input_shape,
            });
        }

        debug!(
            strategy = %settings.strategy,
            text_features = space.text().len(),
            numeric_features = space.numeric().len(),
            shape = ?layout.shape(),
            "Embedding assembler ready"
        );

        Ok(Self {
            encoder,
            strategy: settings.strategy,
            space,
            layout,
            dice,
            input_shape: settings.input_shape,
        })
    }

    /// Validates `features` and assembles the model input.
    pub fn embed(&self, features: &FeatureMap) -> Result<Embedding, EmbeddingError> {
        self.validate(features)?;

        let values = match self.strategy {
            EmbeddingStrategy::ValueOnly => self.encode_text(self.space.text(), features, false)?,
            EmbeddingStrategy::Hybrid1d => {
                let mut values = self.encode_text(self.space.text(), features, true)?;
                for name in self.space.numeric() {
                    values.extend(self.encode_numeric(name, &features[name.as_str()])?);
                }
                values
            }
            EmbeddingStrategy::KeyValue => {
                return Err(EmbeddingError::StrategyNotImplemented {
                    strategy: self.strategy.to_string(),
                });
            }
        };

        let expected: usize = self.input_shape.iter().product();
        let actual = values.len();
        Embedding::new(values, self.input_shape.clone())
            .ok_or(EmbeddingError::OutputLengthMismatch { expected, actual })
    }

    /// Encodes one feature's value into its slice, exactly as [`embed`](Self::embed) would.
    pub fn encode_feature(
        &self,
        name: &str,
        value: &serde_json::Value,
    ) -> Result<Vec<f32>, EmbeddingError> {
        match self.space.kind_of(name) {
            Some(FeatureKind::Text) => {
                let text = text_repr(value).ok_or_else(|| EmbeddingError::Unstringifiable {
                    keys: vec![name.to_string()],
                })?;
                let normalize = self.strategy == EmbeddingStrategy::Hybrid1d;
                let mut vectors = self.encode_batch(&[text.as_str()], normalize)?;
                Ok(vectors.pop().unwrap_or_default())
            }
            Some(FeatureKind::Numeric) => self.encode_numeric(name, value),
            None => Err(EmbeddingError::UnknownFeature {
                feature: name.to_string(),
            }),
        }
    }

    fn validate(&self, features: &FeatureMap) -> Result<(), EmbeddingError> {
        if features.is_empty() {
            return Err(EmbeddingError::EmptyInput);
        }

        let mut nulls: Vec<String> = features
            .iter()
            .filter(|(_, v)| v.is_null())
            .map(|(k, _)| k.clone())
            .collect();
        if !nulls.is_empty() {
            nulls.sort();
            return Err(EmbeddingError::NullValues { keys: nulls });
        }

        // Extra keys are never rendered, so only expected features must have a text form.
        let mut unstringifiable: Vec<String> = features
            .iter()
            .filter(|(k, v)| self.space.contains(k) && text_repr(v).is_none())
            .map(|(k, _)| k.clone())
            .collect();
        if !unstringifiable.is_empty() {
            unstringifiable.sort();
            return Err(EmbeddingError::Unstringifiable {
                keys: unstringifiable,
            });
        }

        let missing: Vec<String> = self
            .space
            .names()
            .filter(|name| !features.contains_key(*name))
            .map(str::to_string)
            .collect();
        if !missing.is_empty() {
            return Err(EmbeddingError::MissingFeatures { missing });
        }

        let extra: Vec<&str> = features
            .keys()
            .map(String::as_str)
            .filter(|k| !self.space.contains(k))
            .collect();
        if !extra.is_empty() {
            warn!(?extra, "Ignoring unexpected feature keys");
        }

        Ok(())
    }

    fn encode_text(
        &self,
        names: &[String],
        features: &FeatureMap,
        normalize: bool,
    ) -> Result<Vec<f32>, EmbeddingError> {
        let texts: Vec<String> = names
            .iter()
            .filter_map(|name| text_repr(&features[name.as_str()]))
            .collect();
        let refs: Vec<&str> = texts.iter().map(String::as_str).collect();

        Ok(self.encode_batch(&refs, normalize)?.concat())
    }

    fn encode_batch(
        &self,
        texts: &[&str],
        normalize: bool,
    ) -> Result<Vec<Vec<f32>>, EmbeddingError> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }

        let dim = self.encoder.dimension();
        let vectors = self.encoder.encode(texts, normalize)?;

        if vectors.len() != texts.len() || vectors.iter().any(|v| v.len() != dim) {
            return Err(EmbeddingError::EncoderOutputMismatch {
                expected: texts.len(),
                actual: vectors.len(),
                dim,
                width: vectors
                    .iter()
                    .map(Vec::len)
                    .find(|w| *w != dim)
                    .unwrap_or(dim),
            });
        }

        Ok(vectors)
    }

    fn encode_numeric(
        &self,
        name: &str,
        value: &serde_json::Value,
    ) -> Result<Vec<f32>, EmbeddingError> {
        let encoder = self
            .dice
            .get(name)
            .ok_or_else(|| EmbeddingError::UnknownFeature {
                feature: name.to_string(),
            })?;
        let x = numeric_value(value).ok_or_else(|| EmbeddingError::NonNumeric {
            feature: name.to_string(),
            value: value.to_string(),
        })?;
        Ok(encoder.make_vector(x))
    }

    pub fn strategy(&self) -> EmbeddingStrategy {
        self.strategy
    }

    pub fn space(&self) -> &FeatureSpace {
        &self.space
    }

    pub fn layout(&self) -> &EmbeddingLayout {
        &self.layout
    }

    pub fn input_shape(&self) -> &[usize] {
        &self.input_shape
    }

    pub fn text_dim(&self) -> usize {
        self.encoder.dimension()
    }

    /// Numeric encoder for `name`, if it is a bounded feature.
    pub fn dice_encoder(&self, name: &str) -> Option<&DiceEncoder> {
        self.dice.get(name)
    }
}
