//! Traits for embedding operations.
//!
//! This module defines the core abstractions for asset loading and model
//! configuration. These traits allow different implementations to be swapped
//! without changing dependent code.

use super::types::{HiddenStates, TokenizedText};
use crate::error::{AssetError, EmbeddingError};
use async_trait::async_trait;

/// Trait for loading the files of a pretrained model.
///
/// A pretrained model is three artifacts: the Hugging Face `config.json`,
/// the serialized tokenizer, and safetensors weights.
///
/// # Examples
///
/// ```ignore
/// struct InMemoryAssets { config: Vec<u8>, tokenizer: Vec<u8>, model: Vec<u8> }
///
/// #[async_trait(?Send)]
/// impl AssetLoader for InMemoryAssets {
///     async fn load_config_bytes(&self) -> Result<Vec<u8>, AssetError> {
///         Ok(self.config.clone())
///     }
///     // ...
/// }
/// ```
#[async_trait(?Send)]
pub trait AssetLoader: Send + Sync {
    /// Load the model configuration as raw bytes (JSON format).
    async fn load_config_bytes(&self) -> Result<Vec<u8>, AssetError>;

    /// Load tokenizer configuration as raw bytes (JSON format).
    async fn load_tokenizer_bytes(&self) -> Result<Vec<u8>, AssetError>;

    /// Load model weights as raw bytes (safetensors format).
    async fn load_model_bytes(&self) -> Result<Vec<u8>, AssetError>;
}

/// Trait for models that expose every hidden state of a forward pass.
///
/// # Examples
///
/// ```ignore
/// let encoder: Box<dyn HiddenStateEncoder> = Box::new(BertEncoder::from_bytes(...)?);
///
/// let hidden = encoder.encode(&tokenized)?;
/// assert_eq!(hidden.len(), encoder.hidden_state_count());
/// ```
pub trait HiddenStateEncoder: Send + Sync {
    /// Returns the maximum number of position embeddings (sequence length).
    fn max_position_embeddings(&self) -> usize;

    /// Returns the width of a single hidden state.
    fn hidden_size(&self) -> usize;

    /// Returns the number of hidden states `encode` produces.
    fn hidden_state_count(&self) -> usize;

    /// Runs one forward pass over a single tokenized sequence.
    fn encode(&self, tokenized: &TokenizedText) -> Result<HiddenStates, EmbeddingError>;
}

/// Trait for embedding model configurations.
pub trait ModelConfig: Clone + Send + Sync {
    /// Returns the model identifier (e.g., "bert-base-uncased").
    fn model_id(&self) -> &str;

    /// Returns the width of a single hidden state.
    fn embedding_dim(&self) -> usize;

    /// Returns the maximum sequence length the model can handle.
    fn max_sequence_length(&self) -> usize;

    /// Returns how many hidden states a forward pass produces
    /// (embedding output plus one per encoder layer).
    fn hidden_state_count(&self) -> usize;
}
