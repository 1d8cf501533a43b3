use tracing::{debug, error};

use crate::embedding::{EmbeddingAssembler, FeatureMap, FeatureSlice};

use super::error::ExplainError;

/// One pre-encoded reference slice per expected feature, in canonical slice order.
#[derive(Debug, Clone)]
pub struct BaselineProfile {
    entries: Vec<(FeatureSlice, Vec<f32>)>,
    values: FeatureMap,
}

impl BaselineProfile {
    /// Encodes every baseline exactly as live input would be encoded.
    ///
    /// Every feature the assembler expects must have a baseline; extra keys are ignored.
    pub fn build(
        assembler: &EmbeddingAssembler,
        baselines: &FeatureMap,
    ) -> Result<Self, ExplainError> {
        let missing: Vec<String> = assembler
            .space()
            .names()
            .filter(|name| !baselines.contains_key(*name))
            .map(str::to_string)
            .collect();
        if !missing.is_empty() {
            error!(?missing, "Missing baseline values for features");
            return Err(ExplainError::MissingBaselines { missing });
        }

        let mut entries = Vec::with_capacity(assembler.layout().slices().len());
        let mut values = FeatureMap::new();
        for slice in assembler.layout().slices() {
            let value = &baselines[slice.name.as_str()];
            let encoded = assembler.encode_feature(&slice.name, value).map_err(|source| {
                ExplainError::BaselineEncoding {
                    feature: slice.name.clone(),
                    source,
                }
            })?;
            if encoded.len() != slice.width() {
                return Err(ExplainError::SliceOutOfBounds {
                    feature: slice.name.clone(),
                });
            }
            values.insert(slice.name.clone(), value.clone());
            entries.push((slice.clone(), encoded));
        }

        debug!(features = entries.len(), "Baseline profile ready");
        Ok(Self { entries, values })
    }

    /// `(slice, baseline vector)` pairs in canonical order.
    pub fn entries(&self) -> &[(FeatureSlice, Vec<f32>)] {
        &self.entries
    }

    /// Raw baseline values for the expected features.
    pub fn values(&self) -> &FeatureMap {
        &self.values
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
