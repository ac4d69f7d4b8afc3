//! Command-line interface
//!
//! Provides commands for computing retrieval metrics over pre-extracted
//! feature files and inspecting available compute devices.

use anyhow::{Context, Result};

use crate::data::load_features;
use crate::device;
use crate::evaluation::get_metrics;

/// Execute the eval command
///
/// Loads video and text feature tensors from safetensors files and prints
/// the retrieval metrics, either human-readable or as a JSON line.
pub fn eval(
    video_features: String,
    text_features: String,
    video_tensor: Option<String>,
    text_tensor: Option<String>,
    captions_per_item: usize,
    logit_scale: f64,
    json: bool,
) -> Result<()> {
    tracing::info!("Starting retrieval evaluation");
    tracing::info!("  Video features: {}", video_features);
    tracing::info!("  Text features: {}", text_features);
    tracing::info!("  Captions per item: {}", captions_per_item);
    tracing::info!("  Logit scale: {}", logit_scale);

    let video = load_features(&video_features, video_tensor.as_deref())
        .context("Failed to load video features")?;
    let text = load_features(&text_features, text_tensor.as_deref())
        .context("Failed to load text features")?;

    tracing::info!(
        "Loaded {:?} video features and {:?} text features",
        video.dims(),
        text.dims()
    );

    let metrics = get_metrics(&video, &text, logit_scale, captions_per_item)?;

    if json {
        metrics.print_json();
    } else {
        print!("{}", metrics);
    }

    Ok(())
}

/// Execute the devices command
pub fn devices() -> Result<()> {
    device::print_available_devices();
    Ok(())
}
