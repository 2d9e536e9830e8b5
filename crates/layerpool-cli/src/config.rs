//! Configuration and path resolution for the CLI.
//!
//! Handles finding the pretrained model directory and the output location
//! across different environments:
//! - Custom: `--model-dir` flag or environment variable
//! - Development: workspace assets directory
//! - Distribution: relative to executable

use anyhow::{anyhow, Result};
use directories::ProjectDirs;
use layerpool_core::config::DEFAULT_MODEL_ID;
use layerpool_core::embedding::FileAssetLoader;
use std::path::{Path, PathBuf};

/// Environment variable for custom model directory
pub const MODEL_DIR_ENV: &str = "LAYERPOOL_MODEL_DIR";

/// File name of the saved sentence embedding
const OUTPUT_FILENAME: &str = "sentence_embedding.safetensors";

fn is_model_dir(path: &Path) -> bool {
    FileAssetLoader::new(path).is_complete()
}

/// Lists candidate model directories in search order.
///
/// 1. `--model-dir` flag
/// 2. `$LAYERPOOL_MODEL_DIR` environment variable
/// 3. Workspace `assets/models/bert-base-uncased/` (development)
/// 4. Executable-relative `../assets/models/bert-base-uncased/` and
///    `assets/models/bert-base-uncased/` (bundled distribution)
pub fn candidate_model_dirs(custom: Option<&Path>, env_dir: Option<&str>) -> Vec<PathBuf> {
    let mut candidates = Vec::new();

    if let Some(dir) = custom {
        candidates.push(dir.to_path_buf());
    }
    if let Some(dir) = env_dir {
        candidates.push(PathBuf::from(dir));
    }

    // CARGO_MANIFEST_DIR points to crates/layerpool-cli
    if let Some(root) = Path::new(env!("CARGO_MANIFEST_DIR"))
        .parent()
        .and_then(|p| p.parent())
    {
        candidates.push(root.join("assets/models").join(DEFAULT_MODEL_ID));
    }

    if let Ok(exe) = std::env::current_exe() {
        if let Some(exe_dir) = exe.parent() {
            candidates.push(exe_dir.join("../assets/models").join(DEFAULT_MODEL_ID));
            candidates.push(exe_dir.join("assets/models").join(DEFAULT_MODEL_ID));
        }
    }

    candidates
}

/// Finds a directory holding `config.json`, `tokenizer.json` and
/// `model.safetensors`.
///
/// An explicit `--model-dir` must be complete; it is never silently
/// replaced by a fallback location.
pub fn find_model_dir(custom: Option<&PathBuf>) -> Result<PathBuf> {
    if let Some(dir) = custom {
        if is_model_dir(dir) {
            return Ok(dir.clone());
        }
        return Err(anyhow!(
            "Model directory {} is missing config.json, tokenizer.json or model.safetensors",
            dir.display()
        ));
    }

    let env_dir = std::env::var(MODEL_DIR_ENV).ok();
    let candidates = candidate_model_dirs(None, env_dir.as_deref());

    if let Some(found) = candidates.iter().find(|p| is_model_dir(p)) {
        return Ok(found.clone());
    }

    Err(anyhow!(
        "Model files not found. Download {} (config.json, tokenizer.json, model.safetensors) \
         and pass --model-dir or set ${}.\n\
         Searched locations:\n{}",
        DEFAULT_MODEL_ID,
        MODEL_DIR_ENV,
        candidates
            .iter()
            .map(|p| format!("  - {}", p.display()))
            .collect::<Vec<_>>()
            .join("\n")
    ))
}

/// Returns the data directory.
///
/// - macOS: `~/Library/Application Support/dev.layerpool.Layerpool/`
/// - Linux: `~/.local/share/layerpool/`
/// - Windows: `%APPDATA%\layerpool\Layerpool\data\`
pub fn get_data_dir() -> Result<PathBuf> {
    ProjectDirs::from("dev", "layerpool", "Layerpool")
        .map(|dirs| dirs.data_dir().to_path_buf())
        .ok_or_else(|| anyhow!("Could not determine data directory"))
}

/// Returns where the sentence embedding is written.
pub fn output_path(custom: Option<&PathBuf>) -> Result<PathBuf> {
    match custom {
        Some(path) => Ok(path.clone()),
        None => Ok(get_data_dir()?.join(OUTPUT_FILENAME)),
    }
}
