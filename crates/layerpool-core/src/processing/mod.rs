//! Single-text processing pipeline.
//!
//! The `SentenceEmbedder` runs the walkthrough for one text:
//! 1. **Tokenization**: WordPiece ids with `[CLS]`/`[SEP]` added
//! 2. **Forward pass**: every hidden state of the encoder
//! 3. **Pooling**: layer reduction then a mean over tokens
//!
//! # Example
//!
//! ```ignore
//! use layerpool_core::processing::SentenceEmbedder;
//! use layerpool_core::pooling::PoolingStrategy;
//!
//! let embedding = embedder.embed("some text", PoolingStrategy::ConcatLast(4), false)?;
//! println!("{} values", embedding.dim());
//! ```

mod pipeline;

pub use pipeline::SentenceEmbedder;
