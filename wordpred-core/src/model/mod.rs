//! Top-level module for word prediction.
//!
//! This module provides:
//! - The multi-order backoff model (`BackoffModel`) and its count tables
//! - Capability traits for the external sequence model and classifier
//! - Fusion of sequence-model and backoff suggestions
//! - Category vocabularies and category-aware reranking
//! - A prediction facade (`Predictor`) and top-1 evaluation

/// Multi-order n-gram backoff model.
///
/// Handles sequence ingestion, parallel construction, merging,
/// longest-context-first candidate retrieval and persistence.
pub mod backoff_model;

/// Internal count table for a single context key.
///
/// Tracks next-word counts in first-insertion order.
mod context_table;

/// Sequence model and classifier capabilities, plus an n-gram continuation model.
pub mod sequence;

/// Merges sequence-model and backoff candidates across prefix variants.
pub mod fusion;

/// Fixed per-language category vocabularies.
pub mod vocabulary;

/// Reorders suggestions using a predicted category.
pub mod rerank;

/// Normalize → fuse → rerank in one call.
pub mod predictor;

/// Single-word hybrid prediction and top-1 accuracy.
pub mod evaluation;

pub use backoff_model::{BackoffModel, Candidate};
pub use predictor::{Prediction, Predictor};
pub use sequence::{Classifier, NgramContinuation, SequenceModel};
