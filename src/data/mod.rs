//! Batch records and feature-file loading
//!
//! A `Batch` is what the external data-loading collaborator produces per
//! iteration: a tensor of pre-extracted embeddings plus caption-bearing
//! metadata fields.

use anyhow::{Context, Result};
use candle_core::{Device, Tensor};
use std::path::Path;

/// One batch from the data source
///
/// Metadata fields keep their insertion order; captions are collected from
/// every field whose name contains `"caption"`, field order first, then
/// within-field order.
#[derive(Debug, Clone)]
pub struct Batch {
    /// Pre-extracted embeddings [batch_size, ...]
    pub embeddings: Tensor,
    meta: Vec<(String, Vec<String>)>,
}

impl Batch {
    /// Create a batch from an embeddings tensor
    pub fn new(embeddings: Tensor) -> Self {
        Self {
            embeddings,
            meta: Vec::new(),
        }
    }

    /// Attach a metadata field (builder style)
    pub fn with_meta(mut self, key: impl Into<String>, values: Vec<String>) -> Self {
        self.meta.push((key.into(), values));
        self
    }

    /// Iterate all metadata fields in insertion order
    pub fn meta(&self) -> impl Iterator<Item = (&str, &[String])> {
        self.meta.iter().map(|(k, v)| (k.as_str(), v.as_slice()))
    }

    /// Collect all caption strings from caption-bearing metadata fields
    pub fn captions(&self) -> Vec<String> {
        self.meta
            .iter()
            .filter(|(k, _)| k.contains("caption"))
            .flat_map(|(_, v)| v.iter().cloned())
            .collect()
    }
}

/// Load a feature tensor from a safetensors file
///
/// When `tensor_name` is given, that entry is loaded; otherwise the file
/// must contain exactly one tensor.
pub fn load_features(path: impl AsRef<Path>, tensor_name: Option<&str>) -> Result<Tensor> {
    let path = path.as_ref();
    let mut tensors = candle_core::safetensors::load(path, &Device::Cpu)
        .with_context(|| format!("Failed to load features from {:?}", path))?;

    match tensor_name {
        Some(name) => tensors
            .remove(name)
            .ok_or_else(|| anyhow::anyhow!("Tensor '{}' not found in {:?}", name, path)),
        None => {
            if tensors.len() != 1 {
                let mut names: Vec<_> = tensors.keys().cloned().collect();
                names.sort();
                anyhow::bail!(
                    "Expected exactly one tensor in {:?}, found {}: {:?} (use --video-tensor/--text-tensor to pick one)",
                    path,
                    tensors.len(),
                    names
                );
            }
            tensors
                .into_values()
                .next()
                .ok_or_else(|| anyhow::anyhow!("Feature file {:?} is empty", path))
        }
    }
}
