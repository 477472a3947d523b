//! Text processing shared by corpus preparation and inference.
//!
//! Every path that turns raw text into tokens goes through `normalizer`,
//! so a prefix typed at inference time matches the keys learned from the corpus.

/// Language tags, sentence cleaning, word normalization and tokenization.
pub mod normalizer;

/// Seeded shuffle and train/validation/test partitioning.
pub mod splitter;

/// Corpus filtering applied before splitting.
pub mod corpus;

pub use normalizer::{EOS, Language};
