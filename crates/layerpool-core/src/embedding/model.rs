//! BERT encoder that exposes every hidden state.
//!
//! Candle's stock BERT only returns the final layer. Sentence-embedding
//! recipes that average the second-to-last layer or concatenate the last
//! four need the whole collection, so this module assembles the same
//! architecture from `candle-nn` layers and records the output of the
//! embedding layer and of each encoder layer.
//!
//! Weight names follow Hugging Face checkpoints, with or without the
//! `bert.` prefix, and accept both `weight/bias` and legacy `gamma/beta`
//! LayerNorm parameters.

use super::config::{BertConfig, HiddenAct};
use super::traits::HiddenStateEncoder;
use super::types::{HiddenStates, TokenizedText};
use crate::error::EmbeddingError;
use candle_core::{DType, Device, Module, Tensor};
use candle_nn::{embedding, linear, Embedding, LayerNorm, Linear, VarBuilder};
use tracing::{debug, info};

/// Loads a LayerNorm stored either as `weight/bias` or `gamma/beta`.
fn layer_norm(size: usize, eps: f64, vb: VarBuilder) -> candle_core::Result<LayerNorm> {
    if vb.contains_tensor("gamma") {
        let weight = vb.get(size, "gamma")?;
        let bias = vb.get(size, "beta")?;
        return Ok(LayerNorm::new(weight, bias, eps));
    }
    candle_nn::layer_norm(size, eps, vb)
}

struct BertEmbeddings {
    word_embeddings: Embedding,
    position_embeddings: Embedding,
    token_type_embeddings: Embedding,
    layer_norm: LayerNorm,
}

impl BertEmbeddings {
    fn load(vb: VarBuilder, config: &BertConfig) -> candle_core::Result<Self> {
        Ok(Self {
            word_embeddings: embedding(
                config.vocab_size,
                config.hidden_size,
                vb.pp("word_embeddings"),
            )?,
            position_embeddings: embedding(
                config.max_position_embeddings,
                config.hidden_size,
                vb.pp("position_embeddings"),
            )?,
            token_type_embeddings: embedding(
                config.type_vocab_size,
                config.hidden_size,
                vb.pp("token_type_embeddings"),
            )?,
            layer_norm: layer_norm(config.hidden_size, config.layer_norm_eps, vb.pp("LayerNorm"))?,
        })
    }

    /// `[batch, seq_len]` ids -> `[batch, seq_len, hidden]`
    fn forward(&self, input_ids: &Tensor, token_type_ids: &Tensor) -> candle_core::Result<Tensor> {
        let (_batch, seq_len) = input_ids.dims2()?;
        let position_ids = Tensor::arange(0u32, seq_len as u32, input_ids.device())?.unsqueeze(0)?;

        let words = self.word_embeddings.forward(input_ids)?;
        let token_types = self.token_type_embeddings.forward(token_type_ids)?;
        let positions = self.position_embeddings.forward(&position_ids)?;

        let summed = (words + token_types)?.broadcast_add(&positions)?;
        self.layer_norm.forward(&summed)
    }
}

struct SelfAttention {
    query: Linear,
    key: Linear,
    value: Linear,
    output: Linear,
    layer_norm: LayerNorm,
    num_heads: usize,
    head_dim: usize,
}

impl SelfAttention {
    fn load(vb: VarBuilder, config: &BertConfig) -> candle_core::Result<Self> {
        let hidden = config.hidden_size;
        let self_vb = vb.pp("self");
        let output_vb = vb.pp("output");
        Ok(Self {
            query: linear(hidden, hidden, self_vb.pp("query"))?,
            key: linear(hidden, hidden, self_vb.pp("key"))?,
            value: linear(hidden, hidden, self_vb.pp("value"))?,
            output: linear(hidden, hidden, output_vb.pp("dense"))?,
            layer_norm: layer_norm(hidden, config.layer_norm_eps, output_vb.pp("LayerNorm"))?,
            num_heads: config.num_attention_heads,
            head_dim: config.head_dim(),
        })
    }

    /// `[batch, seq, hidden]` -> `[batch, heads, seq, head_dim]`
    fn split_heads(&self, x: &Tensor) -> candle_core::Result<Tensor> {
        let (batch, seq_len, _) = x.dims3()?;
        x.reshape((batch, seq_len, self.num_heads, self.head_dim))?
            .transpose(1, 2)?
            .contiguous()
    }

    fn forward(&self, hidden_states: &Tensor) -> candle_core::Result<Tensor> {
        let (batch, seq_len, hidden) = hidden_states.dims3()?;

        let query = self.split_heads(&self.query.forward(hidden_states)?)?;
        let key = self.split_heads(&self.key.forward(hidden_states)?)?;
        let value = self.split_heads(&self.value.forward(hidden_states)?)?;

        // Single unpadded sequence: every position attends to every other,
        // so no attention mask is applied.
        let scores = (query.matmul(&key.t()?)? / (self.head_dim as f64).sqrt())?;
        let probs = candle_nn::ops::softmax_last_dim(&scores)?;

        let context = probs
            .matmul(&value)?
            .transpose(1, 2)?
            .contiguous()?
            .reshape((batch, seq_len, hidden))?;

        let projected = self.output.forward(&context)?;
        self.layer_norm.forward(&(projected + hidden_states)?)
    }
}

struct FeedForward {
    intermediate: Linear,
    output: Linear,
    layer_norm: LayerNorm,
    activation: HiddenAct,
}

impl FeedForward {
    fn load(vb: VarBuilder, config: &BertConfig) -> candle_core::Result<Self> {
        let output_vb = vb.pp("output");
        Ok(Self {
            intermediate: linear(
                config.hidden_size,
                config.intermediate_size,
                vb.pp("intermediate").pp("dense"),
            )?,
            output: linear(
                config.intermediate_size,
                config.hidden_size,
                output_vb.pp("dense"),
            )?,
            layer_norm: layer_norm(
                config.hidden_size,
                config.layer_norm_eps,
                output_vb.pp("LayerNorm"),
            )?,
            activation: config.hidden_act,
        })
    }

    fn forward(&self, hidden_states: &Tensor) -> candle_core::Result<Tensor> {
        let intermediate = self.intermediate.forward(hidden_states)?;
        let activated = match self.activation {
            HiddenAct::Gelu => intermediate.gelu_erf()?,
            HiddenAct::GeluApproximate => intermediate.gelu()?,
            HiddenAct::Relu => intermediate.relu()?,
        };
        let projected = self.output.forward(&activated)?;
        self.layer_norm.forward(&(projected + hidden_states)?)
    }
}

struct BertLayer {
    attention: SelfAttention,
    feed_forward: FeedForward,
}

impl BertLayer {
    fn load(vb: VarBuilder, config: &BertConfig) -> candle_core::Result<Self> {
        Ok(Self {
            attention: SelfAttention::load(vb.pp("attention"), config)?,
            feed_forward: FeedForward::load(vb, config)?,
        })
    }

    fn forward(&self, hidden_states: &Tensor) -> candle_core::Result<Tensor> {
        let attended = self.attention.forward(hidden_states)?;
        self.feed_forward.forward(&attended)
    }
}

/// BERT encoder returning the full hidden-state collection.
///
/// # Architecture
///
/// - Embeddings: word + position + token type, then LayerNorm
/// - `num_hidden_layers` post-norm transformer layers
/// - No pooler head: sentence vectors are derived from hidden states
///
/// # Examples
///
/// ```ignore
/// let config = BertConfig::from_json_bytes(&std::fs::read("config.json")?)?;
/// let model_bytes = std::fs::read("model.safetensors")?;
/// let encoder = BertEncoder::from_bytes(model_bytes, config, &Device::Cpu)?;
///
/// let hidden = encoder.encode(&tokenizer.encode("hello world")?)?;
/// assert_eq!(hidden.len(), 13); // embeddings + 12 layers
/// ```
pub struct BertEncoder {
    embeddings: BertEmbeddings,
    layers: Vec<BertLayer>,
    config: BertConfig,
    device: Device,
}

impl BertEncoder {
    /// Builds the encoder from a `VarBuilder`.
    ///
    /// Checkpoints exported from `BertModel` store weights at the root,
    /// those exported from task heads (`BertForMaskedLM`, ...) under `bert.`.
    ///
    /// # Errors
    ///
    /// Returns `EmbeddingError::ModelLoad` if a weight is missing or has the
    /// wrong shape, or `EmbeddingError::InvalidConfig` for a bad config.
    pub fn load(vb: VarBuilder, config: &BertConfig) -> Result<Self, EmbeddingError> {
        config.validate()?;

        let vb = if !vb.contains_tensor("embeddings.word_embeddings.weight")
            && vb.contains_tensor("bert.embeddings.word_embeddings.weight")
        {
            debug!("Weights use 'bert.' prefix");
            vb.pp("bert")
        } else {
            vb
        };
        let device = vb.device().clone();

        let embeddings = BertEmbeddings::load(vb.pp("embeddings"), config).map_err(|e| {
            EmbeddingError::ModelLoad(format!("Failed to load embeddings: {}", e))
        })?;

        let layers_vb = vb.pp("encoder").pp("layer");
        let layers = (0..config.num_hidden_layers)
            .map(|index| {
                BertLayer::load(layers_vb.pp(index), config).map_err(|e| {
                    EmbeddingError::ModelLoad(format!("Failed to load layer {}: {}", index, e))
                })
            })
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self {
            embeddings,
            layers,
            config: config.clone(),
            device,
        })
    }

    /// Creates an encoder from safetensors bytes on `device`.
    ///
    /// # Errors
    ///
    /// Returns `EmbeddingError::ModelLoad` if initialization fails.
    pub fn from_bytes(
        model_bytes: Vec<u8>,
        config: BertConfig,
        device: &Device,
    ) -> Result<Self, EmbeddingError> {
        info!("Loading encoder '{}'", config.model_id);
        info!(
            "Model bytes length: {} bytes ({:.2}MB)",
            model_bytes.len(),
            model_bytes.len() as f64 / 1_000_000.0
        );
        info!(
            "Config: {}d hidden, {} layers, {} heads",
            config.hidden_size, config.num_hidden_layers, config.num_attention_heads
        );

        // Validate safetensors header
        if model_bytes.len() < 8 {
            return Err(EmbeddingError::ModelLoad(
                "Model file too small".to_string(),
            ));
        }

        let vb = VarBuilder::from_buffered_safetensors(model_bytes, Self::select_dtype(device), device)
            .map_err(|e| {
                EmbeddingError::ModelLoad(format!("Failed to create VarBuilder: {}", e))
            })?;

        let encoder = Self::load(vb, &config)?;
        info!("Encoder created successfully");
        Ok(encoder)
    }

    /// Selects the data type for model weights.
    ///
    /// F32 everywhere: checkpoints stored as F16 are widened at load time so
    /// pooled vectors compare exactly across devices.
    pub fn select_dtype(_device: &Device) -> DType {
        DType::F32
    }

    pub fn config(&self) -> &BertConfig {
        &self.config
    }

    pub fn device(&self) -> &Device {
        &self.device
    }

    /// Runs the forward pass, keeping every intermediate hidden state.
    ///
    /// # Arguments
    ///
    /// * `input_ids` - `[batch, seq_len]` u32 token ids
    /// * `token_type_ids` - `[batch, seq_len]` u32 segment ids
    pub fn forward(
        &self,
        input_ids: &Tensor,
        token_type_ids: &Tensor,
    ) -> Result<HiddenStates, EmbeddingError> {
        let mut states = Vec::with_capacity(self.layers.len() + 1);

        let mut hidden = self
            .embeddings
            .forward(input_ids, token_type_ids)
            .map_err(|e| EmbeddingError::InferenceFailed(format!("Embedding layer failed: {}", e)))?;
        states.push(hidden.clone());

        for (index, layer) in self.layers.iter().enumerate() {
            hidden = layer.forward(&hidden).map_err(|e| {
                EmbeddingError::InferenceFailed(format!("Encoder layer {} failed: {}", index, e))
            })?;
            states.push(hidden.clone());
        }

        HiddenStates::new(states)
    }

    /// Builds `[1, seq_len]` id tensors on the model's device.
    fn input_tensors(&self, tokenized: &TokenizedText) -> Result<(Tensor, Tensor), EmbeddingError> {
        let seq_len = tokenized.len();
        let input_ids = Tensor::from_slice(&tokenized.ids, (1, seq_len), &self.device)
            .map_err(|e| EmbeddingError::TensorCreation(format!("Failed to create tensor: {}", e)))?;
        let token_type_ids = Tensor::from_slice(&tokenized.type_ids, (1, seq_len), &self.device)
            .map_err(|e| EmbeddingError::TensorCreation(format!("Failed to create tensor: {}", e)))?;
        Ok((input_ids, token_type_ids))
    }
}

impl HiddenStateEncoder for BertEncoder {
    fn max_position_embeddings(&self) -> usize {
        self.config.max_position_embeddings
    }

    fn hidden_size(&self) -> usize {
        self.config.hidden_size
    }

    fn hidden_state_count(&self) -> usize {
        self.layers.len() + 1
    }

    fn encode(&self, tokenized: &TokenizedText) -> Result<HiddenStates, EmbeddingError> {
        if tokenized.is_empty() {
            return Err(EmbeddingError::TokenizationFailed(
                "Cannot encode an empty token sequence".to_string(),
            ));
        }
        if tokenized.len() > self.config.max_position_embeddings {
            return Err(EmbeddingError::InvalidConfig(format!(
                "Sequence of {} tokens exceeds max_position_embeddings {}",
                tokenized.len(),
                self.config.max_position_embeddings
            )));
        }
        if tokenized.ids.iter().any(|&id| id as usize >= self.config.vocab_size) {
            return Err(EmbeddingError::InvalidConfig(format!(
                "Token id outside vocabulary of {}",
                self.config.vocab_size
            )));
        }

        let (input_ids, token_type_ids) = self.input_tensors(tokenized)?;
        let hidden = self.forward(&input_ids, &token_type_ids)?;
        debug!(
            "Forward pass produced {} hidden states of shape {:?}",
            hidden.len(),
            hidden.shape()
        );
        Ok(hidden)
    }
}
