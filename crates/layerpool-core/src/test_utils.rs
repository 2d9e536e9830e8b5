//! Test utilities for layerpool-core.
//!
//! Shared helpers for unit tests: a fixture WordPiece tokenizer and a tiny
//! randomly initialised encoder. Only compiled when running tests.

use crate::config::{CONFIG_FILENAME, MODEL_FILENAME, TOKENIZER_FILENAME};
use crate::embedding::{BertConfig, BertEncoder, TokenizerHandle};
use candle_core::{DType, Device};
use candle_nn::{VarBuilder, VarMap};
use once_cell::sync::OnceCell;
use std::path::Path;

/// Path to the fixture tokenizer relative to CARGO_MANIFEST_DIR.
pub const TOKENIZER_PATH: &str = concat!(
    env!("CARGO_MANIFEST_DIR"),
    "/tests/fixtures/tokenizer.json"
);

/// Loads the raw fixture tokenizer bytes (cached).
///
/// # Panics
///
/// Panics if the tokenizer file cannot be read. A missing fixture should
/// fail loudly.
pub fn tokenizer_bytes() -> Vec<u8> {
    static BYTES: OnceCell<Vec<u8>> = OnceCell::new();

    BYTES
        .get_or_init(|| std::fs::read(TOKENIZER_PATH).expect("Failed to read tokenizer fixture"))
        .clone()
}

/// Creates a TokenizerHandle configured with the specified max_length.
pub fn create_test_tokenizer_handle(max_length: usize) -> TokenizerHandle {
    TokenizerHandle::from_bytes(tokenizer_bytes(), max_length)
        .expect("Failed to create TokenizerHandle")
}

/// Four-layer encoder sized to the fixture vocabulary.
pub fn tiny_config() -> BertConfig {
    let vocab_size = create_test_tokenizer_handle(32).vocab_size();
    BertConfig::new("tiny-bert".to_string(), vocab_size, 16, 4, 4, 32)
}

/// Builds an encoder with random weights. The `VarMap` owns the weights and
/// can be saved to safetensors.
pub fn random_encoder(config: &BertConfig) -> (BertEncoder, VarMap) {
    let varmap = VarMap::new();
    let vb = VarBuilder::from_varmap(&varmap, DType::F32, &Device::Cpu);
    let encoder = BertEncoder::load(vb, config).expect("Failed to build random encoder");
    (encoder, varmap)
}

/// Writes `config.json`, `tokenizer.json` and `model.safetensors` for a
/// random tiny encoder into `dir`.
pub fn write_model_dir(dir: &Path) -> BertConfig {
    let config = tiny_config();
    let (_encoder, varmap) = random_encoder(&config);

    varmap
        .save(dir.join(MODEL_FILENAME))
        .expect("Failed to save weights");
    std::fs::write(
        dir.join(CONFIG_FILENAME),
        serde_json::to_vec_pretty(&config).expect("Failed to serialize config"),
    )
    .expect("Failed to write config");
    std::fs::write(dir.join(TOKENIZER_FILENAME), tokenizer_bytes())
        .expect("Failed to write tokenizer");

    config
}
