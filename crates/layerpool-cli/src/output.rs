//! Output formatting for the walkthrough report.
//!
//! Supports both human-readable terminal output and JSON for scripting.

use layerpool_core::device::DeviceType;
use serde::Serialize;
use std::path::PathBuf;

/// Number of leading embedding values shown in the report
pub const PREVIEW_LEN: usize = 5;

/// Everything the walkthrough observed, in report order.
#[derive(Debug, Serialize)]
pub struct EmbeddingReport {
    pub text: String,
    pub model_dir: PathBuf,
    pub device: DeviceType,
    pub tokens: Vec<String>,
    pub token_ids: Vec<u32>,
    /// Embedding output plus one entry per encoder layer
    pub hidden_state_count: usize,
    /// `[batch, tokens, hidden]` of every hidden state
    pub hidden_state_shape: [usize; 3],
    /// Strategy as accepted by `--strategy`
    pub strategy: String,
    pub normalized: bool,
    pub dim: usize,
    pub preview: Vec<f32>,
    pub output_path: PathBuf,
    /// Reloaded tensor matched the saved one exactly
    pub verified: bool,
}

/// Formats the report as JSON.
pub fn format_json(report: &EmbeddingReport) -> String {
    serde_json::to_string_pretty(report).unwrap_or_else(|_| "{}".to_string())
}

/// Formats the report for human-readable terminal output.
pub fn format_human(report: &EmbeddingReport) -> String {
    let [batch, seq, hidden] = report.hidden_state_shape;
    let mut output = String::new();

    output.push_str(&format!("Text: \"{}\"\n", report.text));
    output.push_str(&format!(
        "Model: {} (on {})\n\n",
        report.model_dir.display(),
        report.device
    ));

    output.push_str(&format!("Tokens ({}):\n", report.tokens.len()));
    for (token, id) in report.tokens.iter().zip(&report.token_ids) {
        output.push_str(&format!("   {:<12} {:>6}\n", token, id));
    }
    output.push('\n');

    output.push_str(&format!(
        "Hidden states: {} x [{}, {}, {}]\n",
        report.hidden_state_count, batch, seq, hidden
    ));
    output.push_str(&format!(
        "Sentence embedding ({}{}): {} values\n",
        report.strategy,
        if report.normalized { ", normalized" } else { "" },
        report.dim
    ));
    output.push_str(&format!("   {}\n\n", format_preview(&report.preview, report.dim)));

    output.push_str(&format!(
        "Saved to {} ({})",
        report.output_path.display(),
        if report.verified {
            "reload verified"
        } else {
            "reload mismatch"
        }
    ));

    output
}

/// Renders leading values as `[a, b, ...]`.
fn format_preview(values: &[f32], total: usize) -> String {
    let shown = values
        .iter()
        .map(|v| format!("{:.4}", v))
        .collect::<Vec<_>>()
        .join(", ");
    if total > values.len() {
        format!("[{}, ...]", shown)
    } else {
        format!("[{}]", shown)
    }
}
