//! # mcret
//!
//! Multicaption video-text retrieval evaluation.
//!
//! ## Overview
//!
//! mcret evaluates paired video/text encoder models on datasets where each
//! video carries a fixed number of candidate captions (20 in the standard
//! setup). It runs in two stages:
//!
//! - Feature extraction: iterate a batched data source, tokenize captions,
//!   run both encoders, and accumulate features on host memory
//! - Metric computation: scaled similarity matrix, per-video caption
//!   aggregation, diagonal ranking, and mean/median rank + R@{1,5,10} in
//!   both retrieval directions
//!
//! ## Architecture
//!
//! - `data` - Batch records and feature-file loading
//! - `device` - Compute device selection (CPU/CUDA/Metal)
//! - `encoder` - Encoder trait for externally supplied models
//! - `tokenizer` - Fixed-length caption tokenization
//! - `evaluation` - Feature extraction and metric computation
//! - `cli` - Command-line interface

pub mod cli;
pub mod data;
pub mod device;
pub mod encoder;
pub mod evaluation;
pub mod tokenizer;

// Re-export commonly used types
pub use anyhow::{Error, Result};
