//! Feature extraction pass
//!
//! Drains a batched data source once: tokenizes each batch's captions, runs
//! the video encoder on the pre-extracted embeddings and the text encoder on
//! the token ids, and accumulates detached outputs on host memory so device
//! memory stays flat across batches.

use anyhow::Result;
use candle_core::{DType, Device, Tensor};

use crate::data::Batch;
use crate::encoder::Encoder;
use crate::tokenizer::CaptionTokenizer;

/// Run both encoders over every batch and concatenate the results
///
/// Returns `(video_features, text_features)` on the CPU, in data-source
/// iteration order. The data source is fully drained; callers must not pass
/// an infinite iterator. Fails on a batch with no caption-bearing metadata
/// and on an empty data source, and propagates all encoder and device
/// errors unchanged.
pub fn extract_features<I>(
    batches: I,
    video_encoder: &dyn Encoder,
    text_encoder: &dyn Encoder,
    tokenizer: &CaptionTokenizer,
    device: &Device,
) -> Result<(Tensor, Tensor)>
where
    I: IntoIterator<Item = Batch>,
{
    let mut all_video_features = Vec::new();
    let mut all_text_features = Vec::new();

    for (i, batch) in batches.into_iter().enumerate() {
        let captions = batch.captions();
        if captions.is_empty() {
            anyhow::bail!("Batch {} has no caption-bearing metadata field", i);
        }

        let tokens = tokenizer.encode_to_tensor(&captions, device)?;
        let embeddings = batch.embeddings.to_device(device)?;

        let video_features = video_encoder.forward(&embeddings)?;
        let text_features = text_encoder.forward(&tokens)?.to_dtype(DType::F32)?;

        all_video_features.push(video_features.detach().to_device(&Device::Cpu)?);
        all_text_features.push(text_features.detach().to_device(&Device::Cpu)?);

        if (i + 1) % 50 == 0 {
            tracing::info!("Extracted features for {} batches", i + 1);
        }
    }

    if all_video_features.is_empty() {
        anyhow::bail!("Data source produced no batches");
    }

    let video_features = Tensor::cat(&all_video_features, 0)?;
    let text_features = Tensor::cat(&all_text_features, 0)?;

    tracing::info!(
        "Extracted {} video and {} text feature vectors",
        video_features.dim(0)?,
        text_features.dim(0)?
    );

    Ok((video_features, text_features))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tokenizer::tests::word_level_tokenizer;

    fn identity_encoder() -> impl Encoder {
        |input: &Tensor| -> Result<Tensor> { Ok(input.clone()) }
    }

    /// Text encoder mapping each sequence to a one-hot vector selected by
    /// its first token id.
    fn first_token_encoder(dim: usize) -> impl Encoder {
        move |input: &Tensor| -> Result<Tensor> {
            let ids: Vec<Vec<u32>> = input.to_vec2()?;
            let mut features = vec![0.0f32; ids.len() * dim];
            for (row, seq) in ids.iter().enumerate() {
                features[row * dim + seq[0] as usize % dim] = 1.0;
            }
            Ok(Tensor::from_vec(features, (ids.len(), dim), &Device::Cpu)?)
        }
    }

    fn batch(embedding: Vec<f32>, dim: usize, captions: Vec<&str>) -> Batch {
        let embeddings = Tensor::from_vec(embedding, (1, dim), &Device::Cpu).unwrap();
        Batch::new(embeddings)
            .with_meta("caption", captions.into_iter().map(String::from).collect())
    }

    #[test]
    fn test_extraction_shapes_and_order() {
        let tokenizer =
            CaptionTokenizer::from_tokenizer(word_level_tokenizer()).with_context_length(4);

        let batches = vec![
            batch(vec![1.0, 0.0], 2, vec!["a cat", "a dog"]),
            batch(vec![0.0, 1.0], 2, vec!["the cat", "the dog"]),
        ];

        let video_encoder = identity_encoder();
        let text_encoder = first_token_encoder(2);
        let (video, text) = extract_features(
            batches,
            &video_encoder,
            &text_encoder,
            &tokenizer,
            &Device::Cpu,
        )
        .unwrap();

        assert_eq!(video.dims(), &[2, 2]);
        assert_eq!(text.dims(), &[4, 2]);

        // Batch order preserved: first video row is the first embedding
        let rows: Vec<Vec<f32>> = video.to_vec2().unwrap();
        assert_eq!(rows[0], vec![1.0, 0.0]);
        assert_eq!(rows[1], vec![0.0, 1.0]);
    }

    #[test]
    fn test_batch_without_captions_fails() {
        let tokenizer = CaptionTokenizer::from_tokenizer(word_level_tokenizer());

        let embeddings = Tensor::zeros((1, 2), DType::F32, &Device::Cpu).unwrap();
        let batches = vec![Batch::new(embeddings).with_meta("video_id", vec!["v0".to_string()])];

        let video_encoder = identity_encoder();
        let text_encoder = first_token_encoder(2);
        let result = extract_features(
            batches,
            &video_encoder,
            &text_encoder,
            &tokenizer,
            &Device::Cpu,
        );

        assert!(result.is_err());
    }

    #[test]
    fn test_empty_data_source_fails() {
        let tokenizer = CaptionTokenizer::from_tokenizer(word_level_tokenizer());

        let video_encoder = identity_encoder();
        let text_encoder = first_token_encoder(2);
        let result = extract_features(
            Vec::new(),
            &video_encoder,
            &text_encoder,
            &tokenizer,
            &Device::Cpu,
        );

        assert!(result.is_err());
    }

    #[test]
    fn test_text_features_cast_to_f32() {
        let tokenizer =
            CaptionTokenizer::from_tokenizer(word_level_tokenizer()).with_context_length(4);

        // Encoder emitting F64 output; extraction must cast it down
        let f64_encoder = |input: &Tensor| -> Result<Tensor> {
            let (n, _) = input.dims2()?;
            Ok(Tensor::zeros((n, 2), DType::F64, &Device::Cpu)?)
        };

        let batches = vec![batch(vec![1.0, 0.0], 2, vec!["a cat"])];
        let video_encoder = identity_encoder();
        let (_, text) = extract_features(
            batches,
            &video_encoder,
            &f64_encoder,
            &tokenizer,
            &Device::Cpu,
        )
        .unwrap();

        assert_eq!(text.dtype(), DType::F32);
    }
}
