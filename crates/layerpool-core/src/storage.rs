//! Persisting sentence embeddings.
//!
//! Each embedding is written as a safetensors file holding exactly one
//! tensor under [`EMBEDDING_TENSOR_KEY`]. The format is Candle's native
//! tensor serialization, so a saved file can be reloaded onto any device.

use crate::config::EMBEDDING_TENSOR_KEY;
use crate::device::to_cpu;
use crate::error::StorageError;
use candle_core::{Device, Tensor};
use std::collections::HashMap;
use std::path::Path;
use tracing::{debug, info};

/// Writes `tensor` to `path`, creating parent directories as needed.
///
/// The tensor is copied to the CPU first so accelerator-resident tensors
/// serialize the same way as host tensors.
///
/// # Errors
///
/// Returns `StorageError::Io` if the directory cannot be created or
/// `StorageError::Serialization` if writing fails.
pub fn save_embedding(path: &Path, tensor: &Tensor) -> Result<(), StorageError> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }

    let host = to_cpu(tensor).map_err(|e| StorageError::Serialization(e.to_string()))?;
    let tensors = HashMap::from([(EMBEDDING_TENSOR_KEY.to_string(), host)]);

    candle_core::safetensors::save(&tensors, path).map_err(|e| {
        StorageError::Serialization(format!("Failed to write {}: {}", path.display(), e))
    })?;

    info!(
        "Saved embedding {:?} to {}",
        tensor.dims(),
        path.display()
    );
    Ok(())
}

/// Reads an embedding written by [`save_embedding`] onto `device`.
///
/// # Errors
///
/// Returns `StorageError::Io` for a missing file,
/// `StorageError::Serialization` for a corrupt one, and
/// `StorageError::MissingTensor` if the file lacks the embedding key.
pub fn load_embedding(path: &Path, device: &Device) -> Result<Tensor, StorageError> {
    if !path.exists() {
        return Err(StorageError::Io(format!(
            "Embedding file not found: {}",
            path.display()
        )));
    }

    let mut tensors = candle_core::safetensors::load(path, device).map_err(|e| {
        StorageError::Serialization(format!("Failed to read {}: {}", path.display(), e))
    })?;

    let tensor = tensors
        .remove(EMBEDDING_TENSOR_KEY)
        .ok_or_else(|| StorageError::MissingTensor(EMBEDDING_TENSOR_KEY.to_string()))?;

    debug!("Loaded embedding {:?} from {}", tensor.dims(), path.display());
    Ok(tensor)
}
