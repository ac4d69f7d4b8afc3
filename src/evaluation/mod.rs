//! Evaluation pipeline
//!
//! Feature extraction over a batched data source followed by retrieval
//! metric computation. `evaluate` composes the two stages; each is also
//! usable on its own.

pub mod extraction;
pub mod metrics;

pub use extraction::extract_features;
pub use metrics::{
    get_metrics, DirectionMetrics, RetrievalMetrics, DEFAULT_LOGIT_SCALE, EXPECTED_CAPTIONS,
};

use anyhow::Result;
use candle_core::Device;

use crate::data::Batch;
use crate::encoder::Encoder;
use crate::tokenizer::CaptionTokenizer;

/// Run the full multicaption retrieval evaluation
///
/// Drains `batches`, extracts video and text features with the supplied
/// encoders, and reduces them to rank statistics and R@{1,5,10} in both
/// directions. Single-threaded and synchronous; each invocation is
/// independent and inputs are not mutated.
pub fn evaluate<I>(
    batches: I,
    video_encoder: &dyn Encoder,
    text_encoder: &dyn Encoder,
    tokenizer: &CaptionTokenizer,
    device: &Device,
    logit_scale: f64,
    captions_per_item: usize,
) -> Result<RetrievalMetrics>
where
    I: IntoIterator<Item = Batch>,
{
    let (video_features, text_features) =
        extract_features(batches, video_encoder, text_encoder, tokenizer, device)?;

    get_metrics(&video_features, &text_features, logit_scale, captions_per_item)
}
