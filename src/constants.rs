//! Cross-cutting, shared constants.
//!
//! # Layout Invariants
//!
//! The assembled embedding layout is derived from the text-encoder width, the DICE width and
//! the model's declared `input_shape`; the assembler refuses to build when they disagree.

/// Default output width of the sentence encoder (MiniLM-class BERT models).
pub const DEFAULT_TEXT_DIM: usize = 384;

/// Default DICE vector width per numeric feature.
pub const DEFAULT_NUMERIC_DIM: usize = 32;

/// Seed used to derive every DICE basis. Shared so bases are reproducible across features.
pub const DEFAULT_DICE_SEED: u64 = 13;

/// Smallest DICE dimension that still carries an angle.
pub const MIN_DICE_DIM: usize = 2;

/// Max tokens fed to the sentence encoder.
pub const DEFAULT_MAX_SEQ_LEN: usize = 256;

/// Decimal places kept on the reported risk score.
pub const RISK_SCORE_DECIMALS: i32 = 4;

/// Explanation type reported when the config does not name one.
pub const DEFAULT_EXPLANATION_TYPE: &str = "counterfactual";

/// Note attached when no single feature substitution clears the risk.
pub const NO_SINGLE_DRIVER_NOTE: &str = "No single feature could reduce outcome to low risk. \
     Multiple factors are contributing to this prediction being high risk";
