//! Text-to-embedding pipeline.
//!
//! `SentenceEmbedder` owns a tokenizer and an encoder placed on a device,
//! and turns one text into hidden states or a pooled sentence vector.

use crate::device::{select_device, DevicePreference, DeviceType};
use crate::embedding::{
    AssetLoader, BertConfig, BertEncoder, HiddenStateEncoder, HiddenStates, SentenceEmbedding,
    TokenizedText, TokenizerHandle,
};
use crate::error::EmbeddingError;
use crate::pooling::{l2_normalize, pool, token_vectors, PoolingStrategy};
use candle_core::{Device, Tensor};
use tracing::{debug, info, warn};

/// Tokenizer + encoder for single-sentence embedding.
///
/// # Example
///
/// ```ignore
/// use layerpool_core::embedding::FileAssetLoader;
/// use layerpool_core::processing::SentenceEmbedder;
///
/// let loader = FileAssetLoader::new("assets/models/bert-base-uncased");
/// let embedder = SentenceEmbedder::from_loader(&loader, DevicePreference::Auto).await?;
///
/// let embedding = embedder.embed("Here is the sentence I want embeddings for.",
///     PoolingStrategy::Layer(-2), false)?;
/// assert_eq!(embedding.dim(), 768);
/// ```
pub struct SentenceEmbedder {
    tokenizer: TokenizerHandle,
    encoder: Box<dyn HiddenStateEncoder>,
    device: Device,
}

impl SentenceEmbedder {
    /// Creates a pipeline from already loaded parts.
    ///
    /// # Arguments
    ///
    /// * `tokenizer` - Tokenizer matching the encoder's vocabulary
    /// * `encoder` - Encoder whose weights already live on `device`
    /// * `device` - Device the encoder runs on
    pub fn new(
        tokenizer: TokenizerHandle,
        encoder: Box<dyn HiddenStateEncoder>,
        device: Device,
    ) -> Self {
        Self {
            tokenizer,
            encoder,
            device,
        }
    }

    /// Loads config, tokenizer and weights, then places the model on a device.
    ///
    /// The tokenizer truncates at the model's `max_position_embeddings`.
    ///
    /// # Errors
    ///
    /// Returns `EmbeddingError::ModelLoad` if an asset is missing or the
    /// weights do not match the config.
    pub async fn from_loader<L>(
        loader: &L,
        preference: DevicePreference,
    ) -> Result<Self, EmbeddingError>
    where
        L: AssetLoader + ?Sized,
    {
        info!("Loading pretrained model");

        let config = BertConfig::from_json_bytes(&loader.load_config_bytes().await?)?;
        let tokenizer = TokenizerHandle::from_bytes(
            loader.load_tokenizer_bytes().await?,
            config.max_position_embeddings,
        )?;

        if tokenizer.vocab_size() != config.vocab_size {
            warn!(
                "Tokenizer vocabulary ({}) differs from model vocabulary ({})",
                tokenizer.vocab_size(),
                config.vocab_size
            );
        }

        let model_bytes = loader.load_model_bytes().await?;
        let device = select_device(preference);
        let encoder = BertEncoder::from_bytes(model_bytes, config, &device)?;

        info!("Model loaded on {}", DeviceType::of(&device));
        Ok(Self::new(tokenizer, Box::new(encoder), device))
    }

    pub fn tokenizer(&self) -> &TokenizerHandle {
        &self.tokenizer
    }

    pub fn encoder(&self) -> &dyn HiddenStateEncoder {
        self.encoder.as_ref()
    }

    pub fn device(&self) -> &Device {
        &self.device
    }

    pub fn device_type(&self) -> DeviceType {
        DeviceType::of(&self.device)
    }

    /// Tokenizes `text` and runs one forward pass.
    pub fn hidden_states(&self, text: &str) -> Result<(TokenizedText, HiddenStates), EmbeddingError> {
        let tokenized = self.tokenizer.encode(text)?;
        debug!("Tokenized into {} tokens", tokenized.len());

        let hidden = self.encoder.encode(&tokenized)?;
        Ok((tokenized, hidden))
    }

    /// Computes a sentence embedding for `text`.
    ///
    /// # Arguments
    ///
    /// * `text` - Input text
    /// * `strategy` - How hidden states are combined before averaging
    /// * `normalize` - Scale the result to unit length
    pub fn embed(
        &self,
        text: &str,
        strategy: PoolingStrategy,
        normalize: bool,
    ) -> Result<SentenceEmbedding, EmbeddingError> {
        let (tokenized, hidden) = self.hidden_states(text)?;
        self.pool_hidden(tokenized, &hidden, strategy, normalize)
    }

    /// Pools hidden states computed by [`Self::hidden_states`].
    pub fn pool_hidden(
        &self,
        tokenized: TokenizedText,
        hidden: &HiddenStates,
        strategy: PoolingStrategy,
        normalize: bool,
    ) -> Result<SentenceEmbedding, EmbeddingError> {
        let pooled = pool(hidden, strategy)?;
        let vector = if normalize { l2_normalize(&pooled)? } else { pooled };

        debug!("Pooled {} into {} values", strategy, vector.elem_count());
        Ok(SentenceEmbedding {
            tokens: tokenized.tokens,
            strategy,
            normalized: normalize,
            vector,
        })
    }

    /// Contextual vectors for every token of `text`, `[seq_len, dim]`.
    pub fn token_embeddings(
        &self,
        text: &str,
        strategy: PoolingStrategy,
    ) -> Result<(TokenizedText, Tensor), EmbeddingError> {
        let (tokenized, hidden) = self.hidden_states(text)?;
        let vectors = token_vectors(&hidden, strategy)?;
        Ok((tokenized, vectors))
    }
}
