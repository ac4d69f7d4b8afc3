//! Retrieval metric computation
//!
//! Turns a set of video features and a set of caption features into rank
//! statistics (mean/median rank) and R@{1,5,10} for both retrieval
//! directions. Captions are aggregated per video by averaging each
//! contiguous block of `captions_per_item` similarity columns.
//!
//! Precondition: caption block `j` must belong to video row `j` (candidate
//! ordering matches row ordering). The shape validation enforces the
//! structural part of this; the ordering itself is the caller's contract.

use anyhow::{Context, Result};
use candle_core::{DType, Device, Tensor};
use serde::Serialize;
use std::collections::BTreeMap;
use std::io::Write;

/// Similarity scaling used by the standard CLIP-style setup.
pub const DEFAULT_LOGIT_SCALE: f64 = 100.0;

/// Conventional caption count per video in the multicaption benchmark.
pub const EXPECTED_CAPTIONS: usize = 20;

/// Rank statistics and recall for one retrieval direction
#[derive(Debug, Clone, Serialize)]
pub struct DirectionMetrics {
    /// Average 1-indexed rank of the correct match
    pub mean_rank: f64,
    /// Floored median 1-indexed rank of the correct match
    pub median_rank: f64,
    /// Fraction of items whose correct match is ranked first
    pub r_at_1: f64,
    /// Fraction of items whose correct match is in the top 5
    pub r_at_5: f64,
    /// Fraction of items whose correct match is in the top 10
    pub r_at_10: f64,
}

impl DirectionMetrics {
    /// Derive metrics from 0-indexed ranks of the correct match.
    ///
    /// `ranks` must be non-empty; `get_metrics` validates this upstream.
    fn from_ranks(ranks: &[usize]) -> Self {
        let n = ranks.len() as f64;
        let recall_at = |k: usize| ranks.iter().filter(|&&r| r < k).count() as f64 / n;

        Self {
            mean_rank: ranks.iter().sum::<usize>() as f64 / n + 1.0,
            median_rank: median(ranks).floor() + 1.0,
            r_at_1: recall_at(1),
            r_at_5: recall_at(5),
            r_at_10: recall_at(10),
        }
    }
}

/// Full evaluation result for both retrieval directions
#[derive(Debug, Clone, Serialize)]
pub struct RetrievalMetrics {
    /// Video query, caption candidates
    pub video_to_text: DirectionMetrics,
    /// Caption query, video candidates
    pub text_to_video: DirectionMetrics,
    /// Number of videos evaluated
    pub num_videos: usize,
    /// Captions aggregated per video
    pub captions_per_item: usize,
}

impl RetrievalMetrics {
    /// Flatten into the ten conventional `{direction}_{metric}` keys
    pub fn to_map(&self) -> BTreeMap<String, f64> {
        let mut map = BTreeMap::new();
        for (name, direction) in [
            ("video_to_text", &self.video_to_text),
            ("text_to_video", &self.text_to_video),
        ] {
            map.insert(format!("{}_mean_rank", name), direction.mean_rank);
            map.insert(format!("{}_median_rank", name), direction.median_rank);
            map.insert(format!("{}_R@1", name), direction.r_at_1);
            map.insert(format!("{}_R@5", name), direction.r_at_5);
            map.insert(format!("{}_R@10", name), direction.r_at_10);
        }
        map
    }

    /// Output as JSON line to stdout
    pub fn print_json(&self) {
        if let Ok(json) = serde_json::to_string(self) {
            println!("{}", json);
            let _ = std::io::stdout().flush();
        }
    }
}

impl std::fmt::Display for RetrievalMetrics {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(
            f,
            "Retrieval metrics ({} videos, {} captions each):",
            self.num_videos, self.captions_per_item
        )?;
        for (name, d) in [
            ("video_to_text", &self.video_to_text),
            ("text_to_video", &self.text_to_video),
        ] {
            writeln!(f, "  {}:", name)?;
            writeln!(f, "    mean_rank:   {:.4}", d.mean_rank)?;
            writeln!(f, "    median_rank: {:.0}", d.median_rank)?;
            writeln!(f, "    R@1:  {:.4}", d.r_at_1)?;
            writeln!(f, "    R@5:  {:.4}", d.r_at_5)?;
            writeln!(f, "    R@10: {:.4}", d.r_at_10)?;
        }
        Ok(())
    }
}

/// Compute retrieval metrics from extracted features
///
/// `video_features` is `[videos, dim]`, `text_features` is
/// `[videos * captions_per_item, dim]` with each video's captions contiguous
/// and in row order. The similarity matrix is scaled by `logit_scale`, then
/// each video's caption columns are averaged into one candidate column.
///
/// Rows are ranked by descending aggregated score; the order of equal scores
/// is unspecified.
pub fn get_metrics(
    video_features: &Tensor,
    text_features: &Tensor,
    logit_scale: f64,
    captions_per_item: usize,
) -> Result<RetrievalMetrics> {
    if captions_per_item == 0 {
        anyhow::bail!("captions_per_item must be positive");
    }

    let (num_videos, video_dim) = video_features
        .dims2()
        .context("Video features must be a [videos, dim] tensor")?;
    let (num_texts, text_dim) = text_features
        .dims2()
        .context("Text features must be a [captions, dim] tensor")?;

    if num_videos == 0 {
        anyhow::bail!("Cannot compute retrieval metrics over zero videos");
    }
    if video_dim != text_dim {
        anyhow::bail!(
            "Encoder feature dimensions differ: video {} vs text {}",
            video_dim,
            text_dim
        );
    }
    if num_texts != num_videos * captions_per_item {
        anyhow::bail!(
            "Expected {} caption features ({} videos x {} captions each), found {}",
            num_videos * captions_per_item,
            num_videos,
            captions_per_item,
            num_texts
        );
    }

    let video = video_features.to_dtype(DType::F32)?;
    let text = text_features.to_dtype(DType::F32)?;

    // [videos, videos * captions_per_item], detached and on host
    let logits = (video.matmul(&text.t()?)? * logit_scale)?
        .detach()
        .to_device(&Device::Cpu)?;
    let logits: Vec<Vec<f32>> = logits.to_vec2()?;

    let video_to_text = aggregate_caption_blocks(&logits, captions_per_item);
    let text_to_video = transpose(&video_to_text);

    Ok(RetrievalMetrics {
        video_to_text: DirectionMetrics::from_ranks(&diagonal_ranks(&video_to_text)),
        text_to_video: DirectionMetrics::from_ranks(&diagonal_ranks(&text_to_video)),
        num_videos,
        captions_per_item,
    })
}

/// Average each contiguous block of `captions_per_item` columns into one
/// candidate column, yielding a square [videos, videos] matrix.
fn aggregate_caption_blocks(logits: &[Vec<f32>], captions_per_item: usize) -> Vec<Vec<f32>> {
    let n = logits.len();
    (0..n)
        .map(|i| {
            (0..n)
                .map(|j| {
                    let block = &logits[i][j * captions_per_item..(j + 1) * captions_per_item];
                    block.iter().sum::<f32>() / captions_per_item as f32
                })
                .collect()
        })
        .collect()
}

fn transpose(matrix: &[Vec<f32>]) -> Vec<Vec<f32>> {
    let n = matrix.len();
    (0..n)
        .map(|j| (0..n).map(|i| matrix[i][j]).collect())
        .collect()
}

/// 0-indexed rank of the diagonal entry in each row, under descending sort.
fn diagonal_ranks(matrix: &[Vec<f32>]) -> Vec<usize> {
    matrix
        .iter()
        .enumerate()
        .map(|(i, row)| {
            let mut indexed: Vec<(usize, f32)> =
                row.iter().cloned().enumerate().collect();
            indexed.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(std::cmp::Ordering::Equal));
            indexed
                .iter()
                .position(|(idx, _)| *idx == i)
                .unwrap_or(indexed.len())
        })
        .collect()
}

/// Median of 0-indexed ranks; midpoint average for an even count.
fn median(ranks: &[usize]) -> f64 {
    let mut sorted = ranks.to_vec();
    sorted.sort_unstable();
    let mid = sorted.len() / 2;
    if sorted.len() % 2 == 0 {
        (sorted[mid - 1] + sorted[mid]) as f64 / 2.0
    } else {
        sorted[mid] as f64
    }
}
