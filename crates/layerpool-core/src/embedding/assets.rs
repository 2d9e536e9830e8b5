//! Filesystem asset loading for pretrained models.
//!
//! A model directory follows the Hugging Face layout:
//!
//! ```text
//! bert-base-uncased/
//!   config.json
//!   tokenizer.json
//!   model.safetensors
//! ```

use super::traits::AssetLoader;
use crate::config::{CONFIG_FILENAME, MODEL_FILENAME, TOKENIZER_FILENAME};
use crate::error::AssetError;
use async_trait::async_trait;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Loads model assets from a local directory.
#[derive(Clone, Debug)]
pub struct FileAssetLoader {
    model_dir: PathBuf,
}

impl FileAssetLoader {
    pub fn new(model_dir: impl Into<PathBuf>) -> Self {
        Self {
            model_dir: model_dir.into(),
        }
    }

    pub fn model_dir(&self) -> &Path {
        &self.model_dir
    }

    /// Returns true if all three model files are present.
    pub fn is_complete(&self) -> bool {
        [CONFIG_FILENAME, TOKENIZER_FILENAME, MODEL_FILENAME]
            .iter()
            .all(|name| self.model_dir.join(name).is_file())
    }

    async fn read(&self, filename: &str) -> Result<Vec<u8>, AssetError> {
        let path = self.model_dir.join(filename);
        debug!("Reading asset {}", path.display());

        let bytes = tokio::fs::read(&path).await.map_err(|e| match e.kind() {
            std::io::ErrorKind::NotFound => AssetError::NotFound(path.display().to_string()),
            _ => AssetError::LoadFailed(format!("{}: {}", path.display(), e)),
        })?;

        if bytes.is_empty() {
            return Err(AssetError::InvalidData(format!(
                "{} is empty",
                path.display()
            )));
        }
        Ok(bytes)
    }
}

#[async_trait(?Send)]
impl AssetLoader for FileAssetLoader {
    async fn load_config_bytes(&self) -> Result<Vec<u8>, AssetError> {
        self.read(CONFIG_FILENAME).await
    }

    async fn load_tokenizer_bytes(&self) -> Result<Vec<u8>, AssetError> {
        self.read(TOKENIZER_FILENAME).await
    }

    async fn load_model_bytes(&self) -> Result<Vec<u8>, AssetError> {
        self.read(MODEL_FILENAME).await
    }
}
