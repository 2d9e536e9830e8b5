//! Pretrained model loading, tokenization and the forward pass.
//!
//! ## Core Traits
//!
//! - [`AssetLoader`] - Loading `config.json`, `tokenizer.json` and weights
//! - [`HiddenStateEncoder`] - Forward pass returning every hidden state
//! - [`ModelConfig`] - Model configuration parameters
//!
//! ## Implementations
//!
//! - [`FileAssetLoader`] - Reads a Hugging Face model directory
//! - [`BertConfig`] - Parsed `config.json`
//! - [`BertEncoder`] - BERT encoder using Candle
//! - [`TokenizerHandle`] - Wrapper for HuggingFace tokenizers
//!
//! ## Example
//!
//! ```ignore
//! use layerpool_core::embedding::{BertConfig, BertEncoder, HiddenStateEncoder, TokenizerHandle};
//!
//! let config = BertConfig::from_json_bytes(&std::fs::read("config.json")?)?;
//! let tokenizer = TokenizerHandle::from_bytes(std::fs::read("tokenizer.json")?, 512)?;
//! let encoder = BertEncoder::from_bytes(std::fs::read("model.safetensors")?, config, &device)?;
//!
//! let hidden = encoder.encode(&tokenizer.encode("Hello, world!")?)?;
//! println!("{} hidden states of shape {:?}", hidden.len(), hidden.shape());
//! ```

mod traits;

pub mod assets;
pub mod config;
pub mod model;
pub mod tokenizer;
pub mod types;

// Re-export traits
pub use traits::{AssetLoader, HiddenStateEncoder, ModelConfig};

pub use assets::FileAssetLoader;
pub use config::{BertConfig, HiddenAct};
pub use model::BertEncoder;
pub use tokenizer::TokenizerHandle;
pub use types::{HiddenStates, SentenceEmbedding, TokenizedText};
