use std::collections::{BTreeMap, BTreeSet};
use std::ops::Range;

use serde::{Deserialize, Serialize};

/// Inclusive `[min, max]` range per bounded-numeric feature.
pub type FeatureBounds = BTreeMap<String, (f64, f64)>;

/// How raw features are turned into the model input.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EmbeddingStrategy {
    /// Every value is encoded as text; one row per feature (`[N, text_dim]`).
    ValueOnly,
    /// Normalized text vectors followed by DICE vectors, flattened (`[total]`).
    #[serde(rename = "hybrid_1d")]
    Hybrid1d,
    /// Declared but not implemented.
    KeyValue,
}

impl EmbeddingStrategy {
    pub fn as_str(&self) -> &'static str {
        match self {
            EmbeddingStrategy::ValueOnly => "value_only",
            EmbeddingStrategy::Hybrid1d => "hybrid_1d",
            EmbeddingStrategy::KeyValue => "key_value",
        }
    }
}

impl std::fmt::Display for EmbeddingStrategy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Which encoder produces a feature's slice.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FeatureKind {
    Text,
    Numeric,
}

/// The expected feature names, partitioned and in canonical order.
///
/// A name is numeric iff it has bounds. Each partition is sorted lexicographically and
/// duplicates collapse.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FeatureSpace {
    text: Vec<String>,
    numeric: Vec<String>,
}

impl FeatureSpace {
    /// Partitions `names` by presence in `bounds`.
    pub fn partition<I, S>(names: I, bounds: &FeatureBounds) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut text = BTreeSet::new();
        let mut numeric = BTreeSet::new();
        for name in names {
            let name = name.into();
            if bounds.contains_key(&name) {
                numeric.insert(name);
            } else {
                text.insert(name);
            }
        }
        Self {
            text: text.into_iter().collect(),
            numeric: numeric.into_iter().collect(),
        }
    }

    /// Treats every name as textual.
    pub fn all_text<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::partition(names, &FeatureBounds::new())
    }

    pub fn text(&self) -> &[String] {
        &self.text
    }

    pub fn numeric(&self) -> &[String] {
        &self.numeric
    }

    /// All names: textual first, then numeric.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.text.iter().chain(&self.numeric).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.text.len() + self.numeric.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn contains(&self, name: &str) -> bool {
        self.text.binary_search_by(|n| n.as_str().cmp(name)).is_ok()
            || self.numeric.binary_search_by(|n| n.as_str().cmp(name)).is_ok()
    }

    pub fn kind_of(&self, name: &str) -> Option<FeatureKind> {
        if self.text.binary_search_by(|n| n.as_str().cmp(name)).is_ok() {
            Some(FeatureKind::Text)
        } else if self.numeric.binary_search_by(|n| n.as_str().cmp(name)).is_ok() {
            Some(FeatureKind::Numeric)
        } else {
            None
        }
    }
}

/// Half-open index range of the flattened embedding owned by one feature.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FeatureSlice {
    pub name: String,
    pub kind: FeatureKind,
    pub start: usize,
    pub end: usize,
}

impl FeatureSlice {
    pub fn range(&self) -> Range<usize> {
        self.start..self.end
    }

    pub fn width(&self) -> usize {
        self.end - self.start
    }
}

/// Slice assignment plus the tensor shape of the assembled embedding.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EmbeddingLayout {
    slices: Vec<FeatureSlice>,
    shape: Vec<usize>,
}

impl EmbeddingLayout {
    /// Flat layout: text slices of `text_dim`, then numeric slices of `numeric_dim`.
    pub fn flat(space: &FeatureSpace, text_dim: usize, numeric_dim: usize) -> Self {
        let mut slices = Vec::with_capacity(space.len());
        let mut offset = 0;
        let widths = space
            .text()
            .iter()
            .map(|n| (n, FeatureKind::Text, text_dim))
            .chain(
                space
                    .numeric()
                    .iter()
                    .map(|n| (n, FeatureKind::Numeric, numeric_dim)),
            );
        for (name, kind, width) in widths {
            slices.push(FeatureSlice {
                name: name.clone(),
                kind,
                start: offset,
                end: offset + width,
            });
            offset += width;
        }
        Self {
            slices,
            shape: vec![offset],
        }
    }

    /// Row layout: one `text_dim`-wide row per feature, shape `[N, text_dim]`.
    pub fn rows(space: &FeatureSpace, text_dim: usize) -> Self {
        let slices = space
            .names()
            .enumerate()
            .map(|(i, name)| FeatureSlice {
                name: name.to_string(),
                kind: FeatureKind::Text,
                start: i * text_dim,
                end: (i + 1) * text_dim,
            })
            .collect();
        Self {
            slices,
            shape: vec![space.len(), text_dim],
        }
    }

    pub fn slices(&self) -> &[FeatureSlice] {
        &self.slices
    }

    pub fn slice(&self, name: &str) -> Option<&FeatureSlice> {
        self.slices.iter().find(|s| s.name == name)
    }

    pub fn shape(&self) -> &[usize] {
        &self.shape
    }

    /// Number of scalars in the flattened embedding.
    pub fn total(&self) -> usize {
        self.shape.iter().product()
    }
}

/// An assembled model input: flattened values plus their tensor shape.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Embedding {
    values: Vec<f32>,
    shape: Vec<usize>,
}

impl Embedding {
    /// Wraps `values`; returns `None` if the shape does not cover them exactly.
    pub fn new(values: Vec<f32>, shape: Vec<usize>) -> Option<Self> {
        (shape.iter().product::<usize>() == values.len()).then_some(Self { values, shape })
    }

    pub fn values(&self) -> &[f32] {
        &self.values
    }

    pub fn shape(&self) -> &[usize] {
        &self.shape
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn into_values(self) -> Vec<f32> {
        self.values
    }

    /// Copy of `self` with `slice` overwritten by `replacement`.
    ///
    /// `replacement.len()` must equal the slice width and the slice must lie inside the
    /// embedding; otherwise `None`.
    pub fn with_slice(&self, slice: &FeatureSlice, replacement: &[f32]) -> Option<Self> {
        if replacement.len() != slice.width() || slice.end > self.values.len() {
            return None;
        }
        let mut values = self.values.clone();
        values[slice.range()].copy_from_slice(replacement);
        Some(Self {
            values,
            shape: self.shape.clone(),
        })
    }
}
