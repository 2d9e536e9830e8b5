//! Configuration for BERT encoder models.
//!
//! `BertConfig` mirrors the Hugging Face `config.json` of BERT checkpoints.
//! Missing fields fall back to the values of `bert-base-uncased`.

use super::traits::ModelConfig;
use crate::config::{
    BERT_BASE_HIDDEN_SIZE, BERT_BASE_MAX_POSITIONS, BERT_BASE_NUM_LAYERS, DEFAULT_MODEL_ID,
};
use crate::error::EmbeddingError;
use serde::{Deserialize, Serialize};

/// Activation used between the intermediate and output projections.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HiddenAct {
    /// Exact (erf-based) GELU, used by the original BERT checkpoints
    Gelu,
    /// Tanh approximation of GELU
    #[serde(alias = "gelu_new", alias = "gelu_pytorch_tanh")]
    GeluApproximate,
    Relu,
}

/// Configuration for BERT encoder models.
///
/// # Examples
///
/// ```ignore
/// let bytes = std::fs::read("config.json")?;
/// let config = BertConfig::from_json_bytes(&bytes)?;
/// assert_eq!(config.hidden_state_count(), config.num_hidden_layers + 1);
/// ```
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct BertConfig {
    /// Model identifier from `_name_or_path`, `bert-base-uncased` when absent.
    #[serde(default = "default_model_id", rename = "_name_or_path")]
    pub model_id: String,

    #[serde(default = "default_model_type")]
    pub model_type: String,

    #[serde(default = "default_vocab_size")]
    pub vocab_size: usize,

    /// Hidden dimension size (width of every hidden state)
    #[serde(default = "default_hidden_size")]
    pub hidden_size: usize,

    /// Number of transformer layers
    #[serde(default = "default_num_layers")]
    pub num_hidden_layers: usize,

    /// Number of attention heads per layer
    #[serde(default = "default_num_heads")]
    pub num_attention_heads: usize,

    /// Intermediate (FFN) dimension size
    #[serde(default = "default_intermediate_size")]
    pub intermediate_size: usize,

    #[serde(default = "default_hidden_act")]
    pub hidden_act: HiddenAct,

    /// Maximum position embeddings (sequence length limit)
    #[serde(default = "default_max_positions")]
    pub max_position_embeddings: usize,

    #[serde(default = "default_type_vocab_size")]
    pub type_vocab_size: usize,

    #[serde(default = "default_layer_norm_eps")]
    pub layer_norm_eps: f64,
}

fn default_model_id() -> String {
    DEFAULT_MODEL_ID.to_string()
}

fn default_model_type() -> String {
    "bert".to_string()
}

fn default_vocab_size() -> usize {
    30522
}

fn default_hidden_size() -> usize {
    BERT_BASE_HIDDEN_SIZE
}

fn default_num_layers() -> usize {
    BERT_BASE_NUM_LAYERS
}

fn default_num_heads() -> usize {
    12
}

fn default_intermediate_size() -> usize {
    3072
}

fn default_hidden_act() -> HiddenAct {
    HiddenAct::Gelu
}

fn default_max_positions() -> usize {
    BERT_BASE_MAX_POSITIONS
}

fn default_type_vocab_size() -> usize {
    2
}

fn default_layer_norm_eps() -> f64 {
    1e-12
}

impl Default for BertConfig {
    fn default() -> Self {
        // bert-base-uncased
        Self {
            model_id: default_model_id(),
            model_type: default_model_type(),
            vocab_size: default_vocab_size(),
            hidden_size: default_hidden_size(),
            num_hidden_layers: default_num_layers(),
            num_attention_heads: default_num_heads(),
            intermediate_size: default_intermediate_size(),
            hidden_act: default_hidden_act(),
            max_position_embeddings: default_max_positions(),
            type_vocab_size: default_type_vocab_size(),
            layer_norm_eps: default_layer_norm_eps(),
        }
    }
}

impl ModelConfig for BertConfig {
    fn model_id(&self) -> &str {
        &self.model_id
    }

    fn embedding_dim(&self) -> usize {
        self.hidden_size
    }

    fn max_sequence_length(&self) -> usize {
        self.max_position_embeddings
    }

    fn hidden_state_count(&self) -> usize {
        self.num_hidden_layers + 1
    }
}

impl BertConfig {
    /// Creates a new configuration with custom parameters.
    ///
    /// # Arguments
    ///
    /// * `model_id` - Model identifier string
    /// * `vocab_size` - Tokenizer vocabulary size
    /// * `hidden_size` - Hidden state width
    /// * `num_layers` - Number of transformer layers
    /// * `num_heads` - Number of attention heads per layer
    /// * `max_positions` - Maximum sequence length
    pub fn new(
        model_id: String,
        vocab_size: usize,
        hidden_size: usize,
        num_layers: usize,
        num_heads: usize,
        max_positions: usize,
    ) -> Self {
        Self {
            model_id,
            vocab_size,
            hidden_size,
            num_hidden_layers: num_layers,
            num_attention_heads: num_heads,
            intermediate_size: hidden_size * 4, // Standard transformer ratio
            max_position_embeddings: max_positions,
            ..Self::default()
        }
    }

    /// Parses and validates a Hugging Face `config.json`.
    pub fn from_json_bytes(bytes: &[u8]) -> Result<Self, EmbeddingError> {
        let config: Self = serde_json::from_slice(bytes).map_err(|e| {
            EmbeddingError::InvalidConfig(format!("Failed to parse config.json: {}", e))
        })?;
        config.validate()?;
        Ok(config)
    }

    /// Width of a single attention head.
    pub fn head_dim(&self) -> usize {
        self.hidden_size / self.num_attention_heads
    }

    /// Rejects configurations the encoder cannot be built from.
    pub fn validate(&self) -> Result<(), EmbeddingError> {
        if self.model_type != "bert" {
            return Err(EmbeddingError::InvalidConfig(format!(
                "Unsupported model_type '{}', expected 'bert'",
                self.model_type
            )));
        }
        if self.num_hidden_layers == 0 {
            return Err(EmbeddingError::InvalidConfig(
                "num_hidden_layers must be at least 1".to_string(),
            ));
        }
        if self.num_attention_heads == 0 || self.hidden_size % self.num_attention_heads != 0 {
            return Err(EmbeddingError::InvalidConfig(format!(
                "hidden_size {} is not divisible by num_attention_heads {}",
                self.hidden_size, self.num_attention_heads
            )));
        }
        if self.max_position_embeddings == 0 || self.vocab_size == 0 {
            return Err(EmbeddingError::InvalidConfig(
                "vocab_size and max_position_embeddings must be non-zero".to_string(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = BertConfig::default();
        assert_eq!(config.embedding_dim(), 768);
        assert_eq!(config.max_sequence_length(), 512);
        assert_eq!(config.hidden_state_count(), 13);
        assert_eq!(config.head_dim(), 64);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_custom_config() {
        let config = BertConfig::new("test-model".to_string(), 100, 256, 2, 4, 64);
        assert_eq!(config.hidden_size, 256);
        assert_eq!(config.num_hidden_layers, 2);
        assert_eq!(config.num_attention_heads, 4);
        assert_eq!(config.max_position_embeddings, 64);
        assert_eq!(config.intermediate_size, 1024); // 256 * 4
        assert_eq!(config.hidden_act, HiddenAct::Gelu);
    }

    #[test]
    fn test_parse_hugging_face_config() {
        let json = br#"{
            "architectures": ["BertForMaskedLM"],
            "attention_probs_dropout_prob": 0.1,
            "hidden_act": "gelu",
            "hidden_size": 768,
            "layer_norm_eps": 1e-12,
            "max_position_embeddings": 512,
            "model_type": "bert",
            "num_attention_heads": 12,
            "num_hidden_layers": 12,
            "pad_token_id": 0,
            "type_vocab_size": 2,
            "vocab_size": 30522
        }"#;
        let config = BertConfig::from_json_bytes(json).unwrap();
        assert_eq!(config.vocab_size, 30522);
        assert_eq!(config.intermediate_size, 3072);
        assert_eq!(config.model_id, "bert-base-uncased");
    }

    #[test]
    fn test_model_id_from_name_or_path() {
        let json = br#"{"_name_or_path": "bert-large-cased", "pad_token_id": 0}"#;
        let config = BertConfig::from_json_bytes(json).unwrap();
        assert_eq!(config.model_id, "bert-large-cased");
        assert_eq!(config.model_id(), "bert-large-cased");
    }

    #[test]
    fn test_parse_approximate_gelu_alias() {
        let json = br#"{"hidden_act": "gelu_new"}"#;
        let config = BertConfig::from_json_bytes(json).unwrap();
        assert_eq!(config.hidden_act, HiddenAct::GeluApproximate);
    }

    #[test]
    fn test_rejects_other_architectures() {
        let json = br#"{"model_type": "roberta"}"#;
        let err = BertConfig::from_json_bytes(json).unwrap_err();
        assert!(matches!(err, EmbeddingError::InvalidConfig(_)));
    }

    #[test]
    fn test_rejects_indivisible_heads() {
        let config = BertConfig::new("bad".to_string(), 100, 100, 2, 3, 64);
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_rejects_malformed_json() {
        let err = BertConfig::from_json_bytes(b"{not json").unwrap_err();
        assert!(err.to_string().contains("config.json"));
    }
}
