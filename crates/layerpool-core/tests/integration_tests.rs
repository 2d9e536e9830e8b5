//! End-to-end tests for the complete walkthrough.
//!
//! These tests exercise the full workflow against a tiny randomly
//! initialised BERT written to a temporary model directory:
//! assets → tokenizer → encoder → hidden states → pooling → storage.
//!
//! Run with: `cargo test -p layerpool-core --test integration_tests`

use candle_core::{DType, Device, Tensor};
use candle_nn::{VarBuilder, VarMap};
use layerpool_core::config::{
    CONFIG_FILENAME, DEFAULT_TEXT, MODEL_FILENAME, TOKENIZER_FILENAME,
};
use layerpool_core::device::DevicePreference;
use layerpool_core::embedding::{
    BertConfig, BertEncoder, FileAssetLoader, HiddenStateEncoder, TokenizerHandle,
};
use layerpool_core::pooling::{pool, PoolingStrategy};
use layerpool_core::processing::SentenceEmbedder;
use layerpool_core::storage::{load_embedding, save_embedding};
use std::collections::HashMap;
use std::path::Path;
use tempfile::TempDir;

// ============================================================================
// Test Fixtures
// ============================================================================

const TOKENIZER_FIXTURE: &str = concat!(env!("CARGO_MANIFEST_DIR"), "/tests/fixtures/tokenizer.json");

fn tokenizer_bytes() -> Vec<u8> {
    std::fs::read(TOKENIZER_FIXTURE).expect("Failed to read tokenizer fixture")
}

fn tiny_config() -> BertConfig {
    let tokenizer = TokenizerHandle::from_bytes(tokenizer_bytes(), 64).unwrap();
    BertConfig::new("tiny-bert".to_string(), tokenizer.vocab_size(), 24, 4, 4, 64)
}

/// Random weights in a VarMap plus the encoder built from them.
fn random_weights(config: &BertConfig) -> (BertEncoder, VarMap) {
    let varmap = VarMap::new();
    let vb = VarBuilder::from_varmap(&varmap, DType::F32, &Device::Cpu);
    let encoder = BertEncoder::load(vb, config).expect("Failed to build encoder");
    (encoder, varmap)
}

fn varmap_tensors(varmap: &VarMap) -> HashMap<String, Tensor> {
    varmap
        .data()
        .lock()
        .unwrap()
        .iter()
        .map(|(name, var)| (name.clone(), var.as_tensor().clone()))
        .collect()
}

fn write_model_dir(dir: &Path, config: &BertConfig, tensors: &HashMap<String, Tensor>) {
    candle_core::safetensors::save(tensors, dir.join(MODEL_FILENAME)).unwrap();
    std::fs::write(dir.join(CONFIG_FILENAME), serde_json::to_vec(config).unwrap()).unwrap();
    std::fs::write(dir.join(TOKENIZER_FILENAME), tokenizer_bytes()).unwrap();
}

fn to_vec(t: &Tensor) -> Vec<f32> {
    t.flatten_all().unwrap().to_vec1::<f32>().unwrap()
}

fn assert_close(a: &[f32], b: &[f32]) {
    assert_eq!(a.len(), b.len());
    for (x, y) in a.iter().zip(b) {
        assert!((x - y).abs() < 1e-5, "{} != {}", x, y);
    }
}

// ============================================================================
// Walkthrough
// ============================================================================

#[tokio::test]
async fn test_walkthrough_end_to_end() {
    let dir = TempDir::new().unwrap();
    let config = tiny_config();
    let (_encoder, varmap) = random_weights(&config);
    write_model_dir(dir.path(), &config, &varmap_tensors(&varmap));

    // Load tokenizer + model
    let loader = FileAssetLoader::new(dir.path());
    let embedder = SentenceEmbedder::from_loader(&loader, DevicePreference::Auto)
        .await
        .expect("Failed to load pipeline");

    // Tokenize + forward pass
    let (tokenized, hidden) = embedder.hidden_states(DEFAULT_TEXT).unwrap();
    assert_eq!(tokenized.tokens[0], "[CLS]");
    assert_eq!(hidden.len(), config.num_hidden_layers + 1);
    assert_eq!(hidden.shape(), (1, tokenized.len(), config.hidden_size));

    // Sentence vector from the second-to-last layer
    let sentence = embedder
        .pool_hidden(tokenized.clone(), &hidden, PoolingStrategy::Layer(-2), false)
        .unwrap();
    assert_eq!(sentence.dim(), config.hidden_size);

    // Concatenate the last four layers before averaging
    let concat = embedder
        .pool_hidden(tokenized, &hidden, PoolingStrategy::ConcatLast(4), false)
        .unwrap();
    assert_eq!(concat.dim(), 4 * config.hidden_size);

    // Save + reload
    let out = dir.path().join("out/sentence_embedding.safetensors");
    save_embedding(&out, &sentence.vector).unwrap();
    let reloaded = load_embedding(&out, embedder.device()).unwrap();
    assert_eq!(to_vec(&reloaded), sentence.to_vec().unwrap());
}

#[test]
fn test_last_layer_mean_matches_direct_computation() {
    let config = tiny_config();
    let (encoder, _varmap) = random_weights(&config);
    let tokenizer = TokenizerHandle::from_bytes(tokenizer_bytes(), 64).unwrap();

    let hidden = encoder.encode(&tokenizer.encode("the river bank").unwrap()).unwrap();
    let pooled = pool(&hidden, PoolingStrategy::Layer(-1)).unwrap();
    let direct = hidden.last_hidden_state().mean(1).unwrap();

    assert_close(&to_vec(&pooled), &to_vec(&direct));
}

#[test]
fn test_concat_blocks_match_individual_layers() {
    let config = tiny_config();
    let (encoder, _varmap) = random_weights(&config);
    let tokenizer = TokenizerHandle::from_bytes(tokenizer_bytes(), 64).unwrap();
    let hidden = encoder.encode(&tokenizer.encode(DEFAULT_TEXT).unwrap()).unwrap();

    let concat = to_vec(&pool(&hidden, PoolingStrategy::ConcatLast(4)).unwrap());
    let h = config.hidden_size;
    for (block, index) in (-4isize..0).enumerate() {
        let single = to_vec(&pool(&hidden, PoolingStrategy::Layer(index)).unwrap());
        assert_close(&concat[block * h..(block + 1) * h], &single);
    }
}

// ============================================================================
// Checkpoint Naming Variants
// ============================================================================

/// Renames weights the way task-head checkpoints with legacy LayerNorm
/// parameters store them: `bert.` prefix and `gamma`/`beta`.
fn legacy_names(tensors: HashMap<String, Tensor>) -> HashMap<String, Tensor> {
    tensors
        .into_iter()
        .map(|(name, tensor)| {
            let name = if name.contains("LayerNorm.") {
                name.replace("LayerNorm.weight", "LayerNorm.gamma")
                    .replace("LayerNorm.bias", "LayerNorm.beta")
            } else {
                name
            };
            (format!("bert.{}", name), tensor)
        })
        .collect()
}

#[test]
fn test_prefixed_legacy_checkpoint_matches_original() {
    let dir = TempDir::new().unwrap();
    let config = tiny_config();
    let (encoder, varmap) = random_weights(&config);
    write_model_dir(dir.path(), &config, &legacy_names(varmap_tensors(&varmap)));

    let bytes = std::fs::read(dir.path().join(MODEL_FILENAME)).unwrap();
    let reloaded = BertEncoder::from_bytes(bytes, config.clone(), &Device::Cpu)
        .expect("Prefixed checkpoint should load");

    let tokenizer = TokenizerHandle::from_bytes(tokenizer_bytes(), 64).unwrap();
    let input = tokenizer.encode(DEFAULT_TEXT).unwrap();
    let a = encoder.encode(&input).unwrap();
    let b = reloaded.encode(&input).unwrap();

    for (x, y) in a.iter().zip(b.iter()) {
        assert_close(&to_vec(x), &to_vec(y));
    }
}

#[test]
fn test_checkpoint_with_wrong_shape_fails() {
    let config = tiny_config();
    let (_encoder, varmap) = random_weights(&config);
    let dir = TempDir::new().unwrap();
    write_model_dir(dir.path(), &config, &varmap_tensors(&varmap));

    let mut wider = config.clone();
    wider.hidden_size = 32;
    wider.intermediate_size = 128;
    let bytes = std::fs::read(dir.path().join(MODEL_FILENAME)).unwrap();
    assert!(BertEncoder::from_bytes(bytes, wider, &Device::Cpu).is_err());
}
