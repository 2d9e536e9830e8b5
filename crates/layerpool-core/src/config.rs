//! Default configuration constants.
//!
//! Values shared by the library, the CLI, tests and benchmarks so that the
//! walkthrough defaults live in one place.
//!
//! # Usage
//!
//! ```
//! use layerpool_core::config::{
//!     BERT_BASE_HIDDEN_SIZE, BERT_BASE_NUM_LAYERS, DEFAULT_POOLED_LAYERS, DEFAULT_SENTENCE_LAYER,
//! };
//!
//! // Concatenating the last four layers of bert-base gives a 3072-d vector
//! let concat_dim = BERT_BASE_HIDDEN_SIZE * DEFAULT_POOLED_LAYERS;
//! assert_eq!(concat_dim, 3072);
//!
//! // Layer -2 is the last-but-one of the 13 hidden states
//! assert_eq!((BERT_BASE_NUM_LAYERS + 1) as isize + DEFAULT_SENTENCE_LAYER, 11);
//! ```

// =============================================================================
// Pretrained Model
// =============================================================================

/// Identifier of the checkpoint the defaults describe.
pub const DEFAULT_MODEL_ID: &str = "bert-base-uncased";

/// Hidden size of `bert-base-uncased`.
pub const BERT_BASE_HIDDEN_SIZE: usize = 768;

/// Encoder layers in `bert-base-uncased`.
///
/// The hidden-state collection holds one more entry (the embedding output).
pub const BERT_BASE_NUM_LAYERS: usize = 12;

/// Maximum sequence length of `bert-base-uncased`.
pub const BERT_BASE_MAX_POSITIONS: usize = 512;

// =============================================================================
// Model Directory Layout
// =============================================================================

/// Hugging Face model configuration file.
pub const CONFIG_FILENAME: &str = "config.json";

/// Serialized `tokenizers` tokenizer.
pub const TOKENIZER_FILENAME: &str = "tokenizer.json";

/// Model weights.
pub const MODEL_FILENAME: &str = "model.safetensors";

// =============================================================================
// Pooling and Output
// =============================================================================

/// Number of trailing layers combined by the multi-layer strategies.
pub const DEFAULT_POOLED_LAYERS: usize = 4;

/// Hidden-state index used for the default sentence vector (second-to-last).
pub const DEFAULT_SENTENCE_LAYER: isize = -2;

/// Key under which a sentence embedding is stored in its safetensors file.
pub const EMBEDDING_TENSOR_KEY: &str = "embedding";

/// Text embedded when none is supplied.
pub const DEFAULT_TEXT: &str = "Here is the sentence I want embeddings for.";

