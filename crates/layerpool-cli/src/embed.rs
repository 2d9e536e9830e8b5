//! Embed command implementation.
//!
//! Runs the walkthrough for one text and saves the sentence vector.

use crate::config;
use crate::output::{EmbeddingReport, PREVIEW_LEN};
use anyhow::{bail, Context, Result};
use layerpool_core::device::DevicePreference;
use layerpool_core::embedding::FileAssetLoader;
use layerpool_core::pooling::PoolingStrategy;
use layerpool_core::processing::SentenceEmbedder;
use layerpool_core::storage::{load_embedding, save_embedding};
use std::path::PathBuf;
use tracing::info;

/// Options collected from the command line.
#[derive(Debug, Clone)]
pub struct EmbedOptions {
    pub text: String,
    pub model_dir: Option<PathBuf>,
    pub strategy: PoolingStrategy,
    pub normalize: bool,
    pub device: DevicePreference,
    pub output: Option<PathBuf>,
}

/// Embeds one text and round-trips the result through disk.
///
/// This function:
/// 1. Locates and loads the tokenizer and pretrained model
/// 2. Tokenizes the text and runs one forward pass keeping every hidden state
/// 3. Pools the hidden states into a sentence vector
/// 4. Saves the vector, reloads it and checks the copy is identical
///
/// # Returns
///
/// A report of everything observed along the way.
pub async fn execute_embed(options: &EmbedOptions) -> Result<EmbeddingReport> {
    // 1. Load tokenizer + model
    let model_dir = config::find_model_dir(options.model_dir.as_ref())?;
    info!("Using model directory: {}", model_dir.display());

    let loader = FileAssetLoader::new(&model_dir);
    let embedder = SentenceEmbedder::from_loader(&loader, options.device)
        .await
        .with_context(|| format!("Failed to load model from {}", model_dir.display()))?;

    // 2. Tokenize + forward pass
    let (tokenized, hidden) = embedder
        .hidden_states(&options.text)
        .context("Forward pass failed")?;
    let (batch, seq_len, hidden_size) = hidden.shape();
    info!(
        "{} hidden states of shape [{}, {}, {}]",
        hidden.len(),
        batch,
        seq_len,
        hidden_size
    );

    // 3. Pool
    let embedding = embedder
        .pool_hidden(tokenized.clone(), &hidden, options.strategy, options.normalize)
        .with_context(|| format!("Failed to pool hidden states with {}", options.strategy))?;
    let values = embedding
        .to_vec()
        .context("Failed to read sentence embedding")?;

    // 4. Save + reload
    let output_path = config::output_path(options.output.as_ref())?;
    save_embedding(&output_path, &embedding.vector)
        .with_context(|| format!("Failed to save embedding to {}", output_path.display()))?;

    let reloaded = load_embedding(&output_path, embedder.device())
        .with_context(|| format!("Failed to reload {}", output_path.display()))?;
    let reloaded_values = reloaded
        .flatten_all()
        .and_then(|t| t.to_vec1::<f32>())
        .context("Failed to read reloaded embedding")?;

    if reloaded.dims() != embedding.vector.dims() || reloaded_values != values {
        bail!(
            "Reloaded embedding from {} does not match the saved one",
            output_path.display()
        );
    }
    info!("Reload verified");

    Ok(EmbeddingReport {
        text: options.text.clone(),
        model_dir,
        device: embedder.device_type(),
        tokens: tokenized.tokens,
        token_ids: tokenized.ids,
        hidden_state_count: hidden.len(),
        hidden_state_shape: [batch, seq_len, hidden_size],
        strategy: options.strategy.to_string(),
        normalized: options.normalize,
        dim: values.len(),
        preview: values.iter().take(PREVIEW_LEN).copied().collect(),
        output_path,
        verified: true,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::output::format_json;
    use candle_core::{DType, Device};
    use candle_nn::{VarBuilder, VarMap};
    use layerpool_core::config::{CONFIG_FILENAME, DEFAULT_TEXT, MODEL_FILENAME, TOKENIZER_FILENAME};
    use layerpool_core::embedding::{BertConfig, BertEncoder, TokenizerHandle};
    use std::path::Path;
    use tempfile::TempDir;

    const TOKENIZER_FIXTURE: &str = concat!(
        env!("CARGO_MANIFEST_DIR"),
        "/../layerpool-core/tests/fixtures/tokenizer.json"
    );

    /// Writes a randomly initialised three-layer model into `dir`.
    fn write_tiny_model(dir: &Path) -> BertConfig {
        let tokenizer_bytes = std::fs::read(TOKENIZER_FIXTURE).unwrap();
        let vocab_size = TokenizerHandle::from_bytes(tokenizer_bytes.clone(), 64)
            .unwrap()
            .vocab_size();
        let config = BertConfig::new("tiny-bert".to_string(), vocab_size, 16, 3, 4, 64);

        let varmap = VarMap::new();
        let vb = VarBuilder::from_varmap(&varmap, DType::F32, &Device::Cpu);
        BertEncoder::load(vb, &config).unwrap();

        varmap.save(dir.join(MODEL_FILENAME)).unwrap();
        std::fs::write(dir.join(CONFIG_FILENAME), serde_json::to_vec(&config).unwrap()).unwrap();
        std::fs::write(dir.join(TOKENIZER_FILENAME), tokenizer_bytes).unwrap();
        config
    }

    fn options(model_dir: &Path, output: PathBuf, strategy: PoolingStrategy) -> EmbedOptions {
        EmbedOptions {
            text: DEFAULT_TEXT.to_string(),
            model_dir: Some(model_dir.to_path_buf()),
            strategy,
            normalize: false,
            device: DevicePreference::Cpu,
            output: Some(output),
        }
    }

    #[tokio::test]
    async fn test_embed_saves_and_verifies_concat() {
        let model_dir = TempDir::new().unwrap();
        let out_dir = TempDir::new().unwrap();
        let config = write_tiny_model(model_dir.path());
        let output = out_dir.path().join("nested/sentence_embedding.safetensors");

        let report = execute_embed(&options(
            model_dir.path(),
            output.clone(),
            PoolingStrategy::ConcatLast(4),
        ))
        .await
        .unwrap();

        assert!(output.exists());
        assert_eq!(report.output_path, output);
        assert!(report.verified);
        assert_eq!(report.dim, 4 * config.hidden_size);
        assert_eq!(report.hidden_state_count, config.num_hidden_layers + 1);
        assert_eq!(
            report.hidden_state_shape,
            [1, report.tokens.len(), config.hidden_size]
        );
        assert_eq!(report.tokens.first().map(String::as_str), Some("[CLS]"));
        assert_eq!(report.tokens.len(), report.token_ids.len());
        assert_eq!(report.preview.len(), PREVIEW_LEN);
        assert_eq!(report.strategy, "concat:4");

        let json: serde_json::Value = serde_json::from_str(&format_json(&report)).unwrap();
        assert_eq!(json["dim"], 4 * config.hidden_size);
        assert_eq!(json["device"], "cpu");
        assert_eq!(json["verified"], true);
    }

    #[tokio::test]
    async fn test_saved_file_holds_reported_values() {
        let model_dir = TempDir::new().unwrap();
        let out_dir = TempDir::new().unwrap();
        let config = write_tiny_model(model_dir.path());
        let output = out_dir.path().join("layer.safetensors");

        let report = execute_embed(&options(model_dir.path(), output.clone(), PoolingStrategy::default()))
            .await
            .unwrap();
        assert_eq!(report.dim, config.hidden_size);

        let saved = load_embedding(&output, &Device::Cpu)
            .unwrap()
            .to_vec1::<f32>()
            .unwrap();
        assert_eq!(saved.len(), config.hidden_size);
        assert_eq!(&saved[..PREVIEW_LEN], report.preview.as_slice());
    }

    #[tokio::test]
    async fn test_missing_model_dir_fails_before_writing() {
        let dir = TempDir::new().unwrap();
        let output = dir.path().join("out.safetensors");
        let options = EmbedOptions {
            text: "hello".to_string(),
            model_dir: Some(dir.path().join("no-model")),
            strategy: PoolingStrategy::default(),
            normalize: false,
            device: DevicePreference::Cpu,
            output: Some(output.clone()),
        };

        assert!(execute_embed(&options).await.is_err());
        assert!(!output.exists());
    }
}
