//! Reducing hidden states to fixed-length vectors.
//!
//! A forward pass yields one `[1, seq_len, hidden]` tensor per layer. A
//! sentence vector is obtained in two steps:
//!
//! 1. **Layer reduction** picks one hidden state, or combines the last `n`
//!    by concatenating them along the feature axis or summing them.
//! 2. **Token reduction** averages the result over the token axis.
//!
//! Skipping step 2 gives contextual per-token vectors instead.
//!
//! | Strategy        | Token vector | Sentence vector |
//! |-----------------|--------------|-----------------|
//! | `layer:-2`      | `hidden`     | `hidden`        |
//! | `concat:4`      | `4 * hidden` | `4 * hidden`    |
//! | `sum:4`         | `hidden`     | `hidden`        |

use crate::config::{DEFAULT_POOLED_LAYERS, DEFAULT_SENTENCE_LAYER};
use crate::embedding::HiddenStates;
use crate::error::EmbeddingError;
use candle_core::Tensor;
use serde::{Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

/// How hidden states are combined before averaging over tokens.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PoolingStrategy {
    /// A single hidden state; negative indices count from the last layer
    Layer(isize),
    /// The last `n` hidden states concatenated along the feature axis
    ConcatLast(usize),
    /// Element-wise sum of the last `n` hidden states
    SumLast(usize),
}

impl Default for PoolingStrategy {
    fn default() -> Self {
        PoolingStrategy::Layer(DEFAULT_SENTENCE_LAYER)
    }
}

impl PoolingStrategy {
    /// The multi-layer concatenation recipe (last four layers).
    pub fn concat_default() -> Self {
        PoolingStrategy::ConcatLast(DEFAULT_POOLED_LAYERS)
    }

    /// Length of the pooled vector for a given hidden size.
    pub fn output_dim(&self, hidden_size: usize) -> usize {
        match self {
            PoolingStrategy::ConcatLast(n) => n * hidden_size,
            PoolingStrategy::Layer(_) | PoolingStrategy::SumLast(_) => hidden_size,
        }
    }
}

impl fmt::Display for PoolingStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PoolingStrategy::Layer(index) => write!(f, "layer:{}", index),
            PoolingStrategy::ConcatLast(n) => write!(f, "concat:{}", n),
            PoolingStrategy::SumLast(n) => write!(f, "sum:{}", n),
        }
    }
}

impl FromStr for PoolingStrategy {
    type Err = EmbeddingError;

    /// Parses `layer:<index>`, `concat:<n>` or `sum:<n>`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || {
            EmbeddingError::InvalidConfig(format!(
                "Invalid pooling strategy '{}', expected layer:<index>, concat:<n> or sum:<n>",
                s
            ))
        };

        let (kind, arg) = s.trim().split_once(':').ok_or_else(invalid)?;
        match kind.to_ascii_lowercase().as_str() {
            "layer" => arg.parse().map(PoolingStrategy::Layer).map_err(|_| invalid()),
            "concat" => match arg.parse() {
                Ok(n) if n > 0 => Ok(PoolingStrategy::ConcatLast(n)),
                _ => Err(invalid()),
            },
            "sum" => match arg.parse() {
                Ok(n) if n > 0 => Ok(PoolingStrategy::SumLast(n)),
                _ => Err(invalid()),
            },
            _ => Err(invalid()),
        }
    }
}

impl Serialize for PoolingStrategy {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

fn pooling_err(op: &str) -> impl Fn(candle_core::Error) -> EmbeddingError + '_ {
    move |e| EmbeddingError::PoolingFailed(format!("Failed to {}: {}", op, e))
}

/// Applies the layer reduction: `[1, seq_len, output_dim]`.
pub fn reduce_layers(
    hidden: &HiddenStates,
    strategy: PoolingStrategy,
) -> Result<Tensor, EmbeddingError> {
    match strategy {
        PoolingStrategy::Layer(index) => Ok(hidden.layer(index)?.clone()),
        PoolingStrategy::ConcatLast(n) => {
            let layers = hidden.last(n)?;
            Tensor::cat(layers, 2).map_err(pooling_err("concatenate layers"))
        }
        PoolingStrategy::SumLast(n) => {
            let layers = hidden.last(n)?;
            let mut sum = layers[0].clone();
            for layer in &layers[1..] {
                sum = (sum + layer).map_err(pooling_err("sum layers"))?;
            }
            Ok(sum)
        }
    }
}

/// Averages a `[1, seq_len, dim]` tensor over its token axis into `[dim]`.
pub fn mean_over_tokens(embeddings: &Tensor) -> Result<Tensor, EmbeddingError> {
    let (_n_sentence, n_tokens, _dim) = embeddings.dims3().map_err(pooling_err("get dims"))?;
    if n_tokens == 0 {
        return Err(EmbeddingError::PoolingFailed(
            "Cannot average zero tokens".to_string(),
        ));
    }

    embeddings
        .sum(1)
        .map_err(pooling_err("sum"))?
        .affine(1.0 / n_tokens as f64, 0.0)
        .map_err(pooling_err("affine"))?
        .squeeze(0)
        .map_err(pooling_err("squeeze"))
}

/// Sentence vector: layer reduction followed by a mean over tokens.
pub fn pool(hidden: &HiddenStates, strategy: PoolingStrategy) -> Result<Tensor, EmbeddingError> {
    mean_over_tokens(&reduce_layers(hidden, strategy)?)
}

/// Per-token vectors: layer reduction only, `[seq_len, output_dim]`.
pub fn token_vectors(
    hidden: &HiddenStates,
    strategy: PoolingStrategy,
) -> Result<Tensor, EmbeddingError> {
    reduce_layers(hidden, strategy)?
        .squeeze(0)
        .map_err(pooling_err("squeeze"))
}

/// Scales a rank-1 tensor to unit length. Zero vectors are returned unchanged.
pub fn l2_normalize(v: &Tensor) -> Result<Tensor, EmbeddingError> {
    let norm = v
        .sqr()
        .map_err(pooling_err("square"))?
        .sum_all()
        .map_err(pooling_err("sum"))?
        .sqrt()
        .map_err(pooling_err("sqrt"))?
        .to_scalar::<f32>()
        .map_err(pooling_err("read norm"))?;

    if norm == 0.0 {
        return Ok(v.clone());
    }
    v.affine(1.0 / norm as f64, 0.0).map_err(pooling_err("normalize"))
}

/// Cosine similarity of two equal-length vectors, 0.0 if either is zero.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> Result<f32, EmbeddingError> {
    if a.len() != b.len() {
        return Err(EmbeddingError::PoolingFailed(format!(
            "Vector lengths differ: {} vs {}",
            a.len(),
            b.len()
        )));
    }

    let dot: f32 = a.iter().zip(b).map(|(x, y)| x * y).sum();
    let norm_a = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b = b.iter().map(|x| x * x).sum::<f32>().sqrt();
    if norm_a == 0.0 || norm_b == 0.0 {
        return Ok(0.0);
    }
    Ok(dot / (norm_a * norm_b))
}
