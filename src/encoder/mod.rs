//! Encoder seam for externally supplied models
//!
//! The evaluation pass does not load or own any model weights; callers hand
//! in anything that maps an input tensor to a `[n, d]` feature tensor.

use anyhow::Result;
use candle_core::Tensor;

/// A model (or closure) mapping a batch of inputs to feature vectors.
///
/// The video encoder receives pre-extracted embeddings `[b, ...]`; the text
/// encoder receives token ids `[n, context_length]`. Both must return a
/// two-dimensional `[n, d]` tensor with matching `d`. Forward passes are
/// inference-only; implementations must not update parameters.
pub trait Encoder {
    /// Forward pass producing feature vectors
    fn forward(&self, input: &Tensor) -> Result<Tensor>;
}

impl<F> Encoder for F
where
    F: Fn(&Tensor) -> Result<Tensor>,
{
    fn forward(&self, input: &Tensor) -> Result<Tensor> {
        self(input)
    }
}
