//! # Layerpool Core
//!
//! Turns a text into a fixed-length sentence embedding with a pretrained
//! BERT encoder: tokenize, run one forward pass that keeps every hidden
//! state, average hidden states over the token axis, and persist the result.
//!
//! ## Modules
//!
//! - [`embedding`] - Asset loading, tokenizer, config and the BERT encoder
//! - [`device`] - Accelerator/CPU selection
//! - [`pooling`] - Layer selection, concatenation and token averaging
//! - [`processing`] - `SentenceEmbedder` pipeline tying the steps together
//! - [`storage`] - Saving and reloading embeddings as safetensors
//! - [`config`] - Default constants
//! - [`error`] - Error types

pub mod config;
pub mod device;
pub mod embedding;
pub mod error;
pub mod pooling;
pub mod processing;
pub mod storage;

#[cfg(test)]
pub(crate) mod test_utils;
