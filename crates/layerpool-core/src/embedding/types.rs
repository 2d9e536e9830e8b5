//! Types produced by tokenization, the forward pass and pooling.

use crate::error::EmbeddingError;
use crate::pooling::PoolingStrategy;
use candle_core::Tensor;

/// Output of tokenizing a single text.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TokenizedText {
    /// Token IDs, including special tokens
    pub ids: Vec<u32>,
    /// Token strings aligned with `ids`
    pub tokens: Vec<String>,
    /// Segment IDs aligned with `ids` (all zero for a single sentence)
    pub type_ids: Vec<u32>,
}

impl TokenizedText {
    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }
}

/// Every hidden state of one forward pass.
///
/// Index 0 is the embedding-layer output, index `i` the output of encoder
/// layer `i`. Each tensor is shaped `[batch, seq_len, hidden_size]`.
#[derive(Clone, Debug)]
pub struct HiddenStates {
    states: Vec<Tensor>,
}

impl HiddenStates {
    /// Wraps a collection of hidden states.
    ///
    /// # Errors
    ///
    /// Returns `EmbeddingError::InferenceFailed` if the collection is empty,
    /// a tensor is not rank 3, or shapes differ between layers.
    pub fn new(states: Vec<Tensor>) -> Result<Self, EmbeddingError> {
        let first = states.first().ok_or_else(|| {
            EmbeddingError::InferenceFailed("Forward pass produced no hidden states".to_string())
        })?;
        let expected = first.dims3().map_err(|e| {
            EmbeddingError::InferenceFailed(format!("Hidden state is not rank 3: {}", e))
        })?;

        for (index, state) in states.iter().enumerate().skip(1) {
            let dims = state.dims3().map_err(|e| {
                EmbeddingError::InferenceFailed(format!(
                    "Hidden state {} is not rank 3: {}",
                    index, e
                ))
            })?;
            if dims != expected {
                return Err(EmbeddingError::InferenceFailed(format!(
                    "Hidden state {} has shape {:?}, expected {:?}",
                    index, dims, expected
                )));
            }
        }

        Ok(Self { states })
    }

    /// Number of hidden states (encoder layers + 1).
    pub fn len(&self) -> usize {
        self.states.len()
    }

    pub fn is_empty(&self) -> bool {
        self.states.is_empty()
    }

    /// `(batch, seq_len, hidden_size)` shared by every hidden state.
    pub fn shape(&self) -> (usize, usize, usize) {
        // Checked in `new`
        self.states[0].dims3().unwrap_or((0, 0, 0))
    }

    /// Number of tokens in the sequence.
    pub fn seq_len(&self) -> usize {
        self.shape().1
    }

    /// Width of each hidden state.
    pub fn hidden_size(&self) -> usize {
        self.shape().2
    }

    /// Resolves a possibly negative layer index (`-1` is the last layer).
    pub fn resolve_index(&self, index: isize) -> Result<usize, EmbeddingError> {
        let len = self.states.len() as isize;
        let resolved = if index < 0 { len + index } else { index };
        if resolved < 0 || resolved >= len {
            return Err(EmbeddingError::InvalidConfig(format!(
                "Layer index {} out of range for {} hidden states",
                index, len
            )));
        }
        Ok(resolved as usize)
    }

    /// Returns the hidden state at `index`, counting from the end when negative.
    pub fn layer(&self, index: isize) -> Result<&Tensor, EmbeddingError> {
        let resolved = self.resolve_index(index)?;
        Ok(&self.states[resolved])
    }

    /// Returns the last `n` hidden states in layer order.
    pub fn last(&self, n: usize) -> Result<&[Tensor], EmbeddingError> {
        if n == 0 || n > self.states.len() {
            return Err(EmbeddingError::InvalidConfig(format!(
                "Cannot take the last {} of {} hidden states",
                n,
                self.states.len()
            )));
        }
        Ok(&self.states[self.states.len() - n..])
    }

    /// Output of the final encoder layer.
    pub fn last_hidden_state(&self) -> &Tensor {
        &self.states[self.states.len() - 1]
    }

    pub fn iter(&self) -> impl Iterator<Item = &Tensor> {
        self.states.iter()
    }

    pub fn into_inner(self) -> Vec<Tensor> {
        self.states
    }
}

/// A sentence embedding together with what produced it.
#[derive(Clone, Debug)]
pub struct SentenceEmbedding {
    /// Token strings the vector summarizes
    pub tokens: Vec<String>,
    /// Reduction applied to the hidden states
    pub strategy: PoolingStrategy,
    /// Whether the vector was L2 normalized
    pub normalized: bool,
    /// Rank-1 tensor of length `dim()`
    pub vector: Tensor,
}

impl SentenceEmbedding {
    /// Length of the embedding vector.
    pub fn dim(&self) -> usize {
        self.vector.elem_count()
    }

    /// Copies the vector to host memory.
    pub fn to_vec(&self) -> Result<Vec<f32>, EmbeddingError> {
        self.vector.flatten_all().and_then(|t| t.to_vec1::<f32>()).map_err(|e| {
            EmbeddingError::InferenceFailed(format!("Failed to convert to vec: {}", e))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use candle_core::{DType, Device};

    fn states(count: usize, seq_len: usize, hidden: usize) -> HiddenStates {
        let states = (0..count)
            .map(|i| {
                Tensor::full(i as f32, (1, seq_len, hidden), &Device::Cpu).unwrap()
            })
            .collect();
        HiddenStates::new(states).unwrap()
    }

    #[test]
    fn test_shape_and_len() {
        let hs = states(5, 7, 8);
        assert_eq!(hs.len(), 5);
        assert_eq!(hs.shape(), (1, 7, 8));
        assert_eq!(hs.seq_len(), 7);
        assert_eq!(hs.hidden_size(), 8);
    }

    #[test]
    fn test_negative_indexing() {
        let hs = states(5, 3, 4);
        let last = hs.layer(-1).unwrap().flatten_all().unwrap().to_vec1::<f32>().unwrap();
        assert!(last.iter().all(|&v| v == 4.0));

        let second_to_last = hs.layer(-2).unwrap();
        assert_eq!(
            second_to_last.flatten_all().unwrap().to_vec1::<f32>().unwrap()[0],
            3.0
        );
        assert_eq!(hs.resolve_index(0).unwrap(), 0);
        assert_eq!(hs.resolve_index(-5).unwrap(), 0);
    }

    #[test]
    fn test_index_out_of_range() {
        let hs = states(3, 2, 2);
        assert!(matches!(hs.layer(3), Err(EmbeddingError::InvalidConfig(_))));
        assert!(matches!(hs.layer(-4), Err(EmbeddingError::InvalidConfig(_))));
    }

    #[test]
    fn test_last_n() {
        let hs = states(5, 2, 2);
        assert_eq!(hs.last(4).unwrap().len(), 4);
        assert!(hs.last(0).is_err());
        assert!(hs.last(6).is_err());
    }

    #[test]
    fn test_rejects_mismatched_shapes() {
        let a = Tensor::zeros((1, 3, 4), DType::F32, &Device::Cpu).unwrap();
        let b = Tensor::zeros((1, 3, 5), DType::F32, &Device::Cpu).unwrap();
        assert!(HiddenStates::new(vec![a, b]).is_err());
        assert!(HiddenStates::new(vec![]).is_err());
    }
}
