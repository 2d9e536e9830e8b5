//! Error types for layerpool-core.
//!
//! This module defines error types that are used across the core library,
//! including asset loading, tokenization, inference, pooling and tensor
//! storage errors.

use thiserror::Error;

/// Errors that can occur during embedding operations.
#[derive(Debug, Clone, Error)]
pub enum EmbeddingError {
    /// Failed to load model from bytes
    #[error("Failed to load model: {0}")]
    ModelLoad(String),
    /// Failed to create tensor during inference
    #[error("Failed to create tensor: {0}")]
    TensorCreation(String),
    /// Forward pass through the model failed
    #[error("Inference failed: {0}")]
    InferenceFailed(String),
    /// Failed to tokenize text
    #[error("Tokenization failed: {0}")]
    TokenizationFailed(String),
    /// Invalid configuration
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
    /// Tokenizer not available or initialization failed
    #[error("Tokenizer unavailable: {0}")]
    TokenizerUnavailable(String),
    /// Hidden-state reduction failed
    #[error("Pooling failed: {0}")]
    PoolingFailed(String),
}

/// Errors that can occur during asset loading.
#[derive(Debug, Clone, Error)]
pub enum AssetError {
    /// Failed to load asset from source
    #[error("Failed to load asset: {0}")]
    LoadFailed(String),
    /// Asset not found at expected location
    #[error("Asset not found: {0}")]
    NotFound(String),
    /// Asset data is invalid or corrupted
    #[error("Invalid asset data: {0}")]
    InvalidData(String),
}

/// Errors that can occur while writing or reading a serialized tensor.
#[derive(Debug, Clone, Error)]
pub enum StorageError {
    #[error("IO error: {0}")]
    Io(String),
    #[error("Serialization error: {0}")]
    Serialization(String),
    #[error("Tensor '{0}' not found in file")]
    MissingTensor(String),
}

// Conversion implementations for error chaining

impl From<AssetError> for EmbeddingError {
    fn from(err: AssetError) -> Self {
        EmbeddingError::ModelLoad(err.to_string())
    }
}

impl From<std::io::Error> for StorageError {
    fn from(err: std::io::Error) -> Self {
        StorageError::Io(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_asset_error_becomes_model_load() {
        let err: EmbeddingError = AssetError::NotFound("config.json".to_string()).into();
        assert!(matches!(err, EmbeddingError::ModelLoad(_)));
        assert!(err.to_string().contains("config.json"));
    }

    #[test]
    fn test_io_error_becomes_storage_io() {
        let io = std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied");
        let err: StorageError = io.into();
        assert!(matches!(err, StorageError::Io(ref msg) if msg.contains("denied")));
    }
}
