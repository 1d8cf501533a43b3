use std::sync::atomic::{AtomicUsize, Ordering};

use super::error::InferenceError;
use super::scorer::RiskScorer;

type ScoreFn = dyn Fn(&[f32]) -> Result<f32, InferenceError> + Send + Sync;

/// Closure-backed scorer that counts forward passes.
pub struct FnScorer {
    f: Box<ScoreFn>,
    calls: AtomicUsize,
}

impl std::fmt::Debug for FnScorer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FnScorer")
            .field("calls", &self.calls())
            .finish()
    }
}

impl FnScorer {
    /// Wraps a closure returning a logit.
    pub fn new<F>(f: F) -> Self
    where
        F: Fn(&[f32]) -> f32 + Send + Sync + 'static,
    {
        Self::fallible(move |input| Ok(f(input)))
    }

    pub fn fallible<F>(f: F) -> Self
    where
        F: Fn(&[f32]) -> Result<f32, InferenceError> + Send + Sync + 'static,
    {
        Self {
            f: Box::new(f),
            calls: AtomicUsize::new(0),
        }
    }

    /// Always returns `logit`.
    pub fn constant(logit: f32) -> Self {
        Self::new(move |_| logit)
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn reset(&self) {
        self.calls.store(0, Ordering::SeqCst);
    }
}

impl RiskScorer for FnScorer {
    fn forward(&self, input: &[f32], _shape: &[usize]) -> Result<f32, InferenceError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        (self.f)(input)
    }

    fn architecture(&self) -> &str {
        "mock"
    }
}
