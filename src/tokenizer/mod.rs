//! Fixed-length caption tokenization
//!
//! Wraps a HuggingFace tokenizer so every caption maps to the same number of
//! token ids (CLIP-style fixed context window), which keeps caption batches
//! rectangular regardless of caption length.

use anyhow::Result;
use candle_core::{Device, Tensor};
use std::path::Path;
use tokenizers::{PaddingParams, PaddingStrategy, Tokenizer, TruncationParams};

/// Default context window, matching the CLIP tokenizer convention.
pub const DEFAULT_CONTEXT_LENGTH: usize = 77;

/// Caption tokenizer producing fixed-length token sequences
pub struct CaptionTokenizer {
    tokenizer: Tokenizer,
    context_length: usize,
}

impl CaptionTokenizer {
    /// Load tokenizer from a tokenizer.json file
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let tokenizer = Tokenizer::from_file(path.as_ref())
            .map_err(|e| anyhow::anyhow!("Failed to load tokenizer: {}", e))?;

        Ok(Self {
            tokenizer,
            context_length: DEFAULT_CONTEXT_LENGTH,
        })
    }

    /// Wrap an already-constructed tokenizer
    pub fn from_tokenizer(tokenizer: Tokenizer) -> Self {
        Self {
            tokenizer,
            context_length: DEFAULT_CONTEXT_LENGTH,
        }
    }

    /// Set the fixed context window length
    pub fn with_context_length(mut self, context_length: usize) -> Self {
        self.context_length = context_length;
        self
    }

    /// Get the fixed context window length
    pub fn context_length(&self) -> usize {
        self.context_length
    }

    /// Get vocabulary size
    pub fn vocab_size(&self) -> usize {
        self.tokenizer.get_vocab_size(true)
    }

    /// Encode a batch of captions to fixed-length token sequences
    ///
    /// Every sequence is padded (or truncated) to `context_length`, so the
    /// result is always rectangular. Encoding an empty caption list is an
    /// error: it would produce a zero-row token tensor downstream.
    pub fn encode_batch(&self, captions: &[String]) -> Result<TokenBatch> {
        if captions.is_empty() {
            anyhow::bail!("Cannot tokenize an empty caption list");
        }

        // Configure fixed-length padding
        let mut tokenizer = self.tokenizer.clone();
        tokenizer.with_padding(Some(PaddingParams {
            strategy: PaddingStrategy::Fixed(self.context_length),
            ..Default::default()
        }));

        // Configure truncation to the same window
        tokenizer
            .with_truncation(Some(TruncationParams {
                max_length: self.context_length,
                ..Default::default()
            }))
            .map_err(|e| anyhow::anyhow!("Failed to set truncation: {}", e))?;

        let encodings = tokenizer
            .encode_batch(captions.to_vec(), true)
            .map_err(|e| anyhow::anyhow!("Batch tokenization failed: {}", e))?;

        let n_sequences = encodings.len();
        let mut input_ids = Vec::with_capacity(n_sequences * self.context_length);
        for encoding in &encodings {
            input_ids.extend(encoding.get_ids());
        }

        Ok(TokenBatch {
            input_ids,
            n_sequences,
            context_length: self.context_length,
        })
    }

    /// Encode captions straight to a token tensor on the given device
    pub fn encode_to_tensor(&self, captions: &[String], device: &Device) -> Result<Tensor> {
        self.encode_batch(captions)?.to_tensor(device)
    }
}

/// A batch of fixed-length token sequences
#[derive(Debug, Clone)]
pub struct TokenBatch {
    /// Flattened token IDs [n_sequences * context_length]
    pub input_ids: Vec<u32>,
    /// Number of sequences in the batch
    pub n_sequences: usize,
    /// Tokens per sequence (after padding/truncation)
    pub context_length: usize,
}

impl TokenBatch {
    /// Convert to a U32 tensor of shape [n_sequences, context_length]
    pub fn to_tensor(&self, device: &Device) -> Result<Tensor> {
        Ok(Tensor::from_vec(
            self.input_ids.clone(),
            (self.n_sequences, self.context_length),
            device,
        )?)
    }
}
