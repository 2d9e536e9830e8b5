//! Tokenization utilities for text processing.
//!
//! This module provides the `TokenizerHandle` type for managing HuggingFace
//! tokenizers with proper truncation configuration.

use super::types::TokenizedText;
use crate::error::EmbeddingError;
use tokenizers::tokenizer::{Tokenizer, TruncationDirection, TruncationParams, TruncationStrategy};

/// Handle for a configured tokenizer.
///
/// Wraps a HuggingFace tokenizer with truncation settings.
///
/// # Examples
///
/// ```ignore
/// let tokenizer_bytes = std::fs::read("tokenizer.json")?;
/// let handle = TokenizerHandle::from_bytes(tokenizer_bytes, 512)?;
///
/// let encoded = handle.encode("Here is the sentence I want embeddings for.")?;
/// println!("{:?}", encoded.tokens); // ["[CLS]", "here", ..., "[SEP]"]
/// ```
#[derive(Clone)]
pub struct TokenizerHandle {
    tokenizer: Tokenizer,
    max_length: usize,
}

impl TokenizerHandle {
    /// Creates a tokenizer from JSON bytes with truncation configured.
    ///
    /// # Arguments
    ///
    /// * `tokenizer_bytes` - Serialized tokenizer JSON bytes
    /// * `max_length` - Maximum sequence length for truncation
    ///
    /// # Errors
    ///
    /// Returns `EmbeddingError::TokenizerUnavailable` if initialization fails.
    pub fn from_bytes(tokenizer_bytes: Vec<u8>, max_length: usize) -> Result<Self, EmbeddingError> {
        let mut tokenizer = Tokenizer::from_bytes(tokenizer_bytes).map_err(|e| {
            EmbeddingError::TokenizerUnavailable(format!("Failed to deserialize tokenizer: {}", e))
        })?;

        configure_truncation(&mut tokenizer, max_length)?;

        Ok(Self {
            tokenizer,
            max_length,
        })
    }

    /// Returns the configured maximum length.
    pub fn max_length(&self) -> usize {
        self.max_length
    }

    /// Tokenizes text into token IDs, including special tokens (CLS, SEP).
    ///
    /// # Errors
    ///
    /// Returns `EmbeddingError::TokenizationFailed` if encoding fails.
    pub fn tokenize(&self, text: &str) -> Result<Vec<u32>, EmbeddingError> {
        self.encode(text).map(|t| t.ids)
    }

    /// Encodes text into ids, token strings and segment ids.
    ///
    /// Special tokens are inserted by the tokenizer's post-processor.
    pub fn encode(&self, text: &str) -> Result<TokenizedText, EmbeddingError> {
        let encoding = self
            .tokenizer
            .encode(text, true)
            .map_err(|e| EmbeddingError::TokenizationFailed(format!("Encoding failed: {}", e)))?;

        if encoding.get_ids().is_empty() {
            return Err(EmbeddingError::TokenizationFailed(
                "Tokenizer returned no tokens".to_string(),
            ));
        }

        Ok(TokenizedText {
            ids: encoding.get_ids().to_vec(),
            tokens: encoding.get_tokens().to_vec(),
            type_ids: encoding.get_type_ids().to_vec(),
        })
    }

    /// Returns the vocabulary size, including added tokens.
    pub fn vocab_size(&self) -> usize {
        self.tokenizer.get_vocab_size(true)
    }

    pub fn token_to_id(&self, token: &str) -> Option<u32> {
        self.tokenizer.token_to_id(token)
    }

    pub fn id_to_token(&self, id: u32) -> Option<String> {
        self.tokenizer.id_to_token(id)
    }
}

/// Configures tokenizer with truncation settings.
fn configure_truncation(
    tokenizer: &mut Tokenizer,
    max_length: usize,
) -> Result<(), EmbeddingError> {
    tokenizer
        .with_truncation(Some(TruncationParams {
            max_length,
            stride: 0,
            strategy: TruncationStrategy::OnlyFirst,
            direction: TruncationDirection::Right,
        }))
        .map_err(|e| {
            EmbeddingError::InvalidConfig(format!(
                "Failed to configure tokenizer truncation: {}",
                e
            ))
        })?;

    Ok(())
}
