//! Feature embedding: raw feature mappings to fixed-shape model inputs.
//!
//! - [`assembler`] validates inputs and concatenates text and DICE vectors.
//! - [`text`] provides the text encoder trait and its BERT implementation.
//! - [`layout`] fixes the canonical feature order and slice assignment.

/// Raw feature mapping to model input.
pub mod assembler;
/// Sentence-transformers BERT model with mean pooling.
pub mod bert;
/// Device selection (CPU / Metal / CUDA).
pub mod device;
mod error;
/// Raw value coercion.
pub mod features;
/// Feature space, slices and the assembled embedding.
pub mod layout;
/// Text encoders.
pub mod text;
/// Tokenizer loading and vector helpers.
pub mod utils;


pub use assembler::{AssemblerSettings, EmbeddingAssembler};
pub use error::EmbeddingError;
pub use features::FeatureMap;
pub use layout::{
    Embedding, EmbeddingLayout, EmbeddingStrategy, FeatureBounds, FeatureKind, FeatureSlice,
    FeatureSpace,
};
pub use text::{BertTextEncoder, TEXT_EMBEDDING_DIM, TextEncoder, TextEncoderConfig};
